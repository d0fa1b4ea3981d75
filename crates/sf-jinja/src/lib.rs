//! sf-jinja - Templating layer for snow
//!
//! Three environments share one set of custom filters:
//! - the CLI environment used for client-side SQL variables (`&{ name }`,
//!   logic blocks disabled),
//! - a file environment for `snow render template` (standard syntax),
//! - a package-script environment rooted at the project directory.
//!
//! All of them treat undefined variables as errors.

pub mod environment;
pub mod error;
pub mod filters;
pub mod snowsql;

pub use environment::{render_cli, render_file, PackageScriptRenderer, TemplateEnvironment};
pub use error::{JinjaError, JinjaResult};
pub use snowsql::transpile_snowsql_templates;
