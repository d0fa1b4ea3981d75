//! sf-deploy - Deployment engines for snow
//!
//! The native application engine compares the local deploy root with the
//! package stage, uploads the difference and then creates, upgrades or
//! recreates the application. Destructive steps are gated by a [`Policy`].

pub mod artifacts;
pub mod diff;
pub mod error;
pub mod nativeapp;
pub mod policy;
pub mod stage;
pub mod streamlit;

pub use diff::DiffResult;
pub use error::{DeployError, DeployResult};
pub use nativeapp::package::ApplicationPackageProcessor;
pub use nativeapp::run::{DeployMode, RunProcessor};
pub use nativeapp::teardown::TeardownProcessor;
pub use nativeapp::NativeAppManager;
pub use policy::{AllowAlwaysPolicy, AskAlwaysPolicy, DenyAlwaysPolicy, Policy};
pub use streamlit::StreamlitDeployer;
