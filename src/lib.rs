//! # DDEV Platform.sh
//!
//! Translates a Platform.sh project (`.platform.app.yaml`,
//! `.platform/services.yaml`, `.platform/routes.yaml`) into DDEV configuration
//! so the project runs locally with a Platform.sh-like runtime environment.
//!
//! The [`orchestrator`] drives a run; every other module is a single stage
//! concern that can be used on its own.

pub mod config;
pub mod constants;
pub mod ddev;
pub mod encoding;
pub mod error;
pub mod file_ops;
pub mod mapping;
pub mod orchestrator;
pub mod platform;
pub mod process;
pub mod report;
pub mod validation;

pub use config::DdevEnvironment;
pub use error::{PlatformshError, ValidationIssue};
pub use orchestrator::{
    inspect_relationships, inspect_routes, Orchestrator, RunOptions, RunSummary,
    ServiceContainerMode, Stage, StageFailure,
};
pub use process::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use report::Reporter;
