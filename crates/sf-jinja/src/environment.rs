//! Template environments for snow

use crate::error::{JinjaError, JinjaResult};
use crate::filters;
use minijinja::syntax::SyntaxConfig;
use minijinja::{path_loader, Environment, UndefinedBehavior};
use serde::Serialize;
use std::path::Path;

/// Block delimiters that cannot occur in real SQL, which disables `{% %}` logic
const DISABLED_BLOCK_START: &str = "<%___snow_block_syntax_disabled___";
const DISABLED_BLOCK_END: &str = "___snow_block_syntax_disabled___%>";

/// Name client-side rendered strings are reported under
const INLINE_TEMPLATE_NAME: &str = "<string>";

/// A configured minijinja environment
pub struct TemplateEnvironment<'a> {
    env: Environment<'a>,
}

impl<'a> TemplateEnvironment<'a> {
    fn strict() -> Environment<'a> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        filters::register(&mut env);
        env
    }

    /// Environment for client-side SQL variables.
    ///
    /// Variables use `&{ name }`; comments keep `{# #}`; logic blocks are
    /// disabled so server-side `{% %}` and `{{ }}` text passes through.
    pub fn cli() -> JinjaResult<Self> {
        let mut env = Self::strict();
        let syntax = SyntaxConfig::builder()
            .block_delimiters(DISABLED_BLOCK_START, DISABLED_BLOCK_END)
            .variable_delimiters("&{", "}")
            .comment_delimiters("{#", "#}")
            .build()
            .map_err(|e| JinjaError::RenderError(e.to_string()))?;
        env.set_syntax(syntax);
        Ok(Self { env })
    }

    /// Environment loading templates from `dir` with standard syntax
    pub fn with_loader(dir: &Path) -> Self {
        let mut env = Self::strict();
        env.set_loader(path_loader(dir));
        Self { env }
    }

    /// Render an inline template string
    pub fn render_str<S: Serialize>(&self, content: &str, ctx: S) -> JinjaResult<String> {
        self.env
            .render_str(content, ctx)
            .map_err(|e| JinjaError::from_template(INLINE_TEMPLATE_NAME, e))
    }

    /// Render a template the loader resolves by `name`
    pub fn render_template<S: Serialize>(&self, name: &str, ctx: S) -> JinjaResult<String> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| JinjaError::from_template(name, e))?;
        template
            .render(ctx)
            .map_err(|e| JinjaError::from_template(name, e))
    }
}

/// Render `content` with the CLI environment and `data`
pub fn render_cli<S: Serialize>(content: &str, data: S) -> JinjaResult<String> {
    TemplateEnvironment::cli()?.render_str(content, data)
}

/// Render a template file; includes resolve relative to its directory
pub fn render_file<S: Serialize>(template_path: &Path, data: S) -> JinjaResult<String> {
    let name = template_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| JinjaError::TemplateNotFound {
            name: template_path.display().to_string(),
        })?;
    let dir = template_path.parent().unwrap_or_else(|| Path::new("."));
    TemplateEnvironment::with_loader(dir).render_template(name, data)
}

/// Renders package scripts relative to a project root.
///
/// Scripts see a single variable, `package_name`.
pub struct PackageScriptRenderer {
    env: TemplateEnvironment<'static>,
}

impl PackageScriptRenderer {
    /// Create a renderer resolving script paths against `project_root`
    pub fn new(project_root: &Path) -> Self {
        Self {
            env: TemplateEnvironment::with_loader(project_root),
        }
    }

    /// Render one script
    pub fn render(&self, relpath: &str, package_name: &str) -> JinjaResult<String> {
        log::debug!("Rendering package script: {}", relpath);
        self.env
            .render_template(relpath, minijinja::context! { package_name => package_name })
    }
}

#[cfg(test)]
#[path = "environment_test.rs"]
mod tests;
