//! # Platform.sh Configuration
//!
//! Reading and modelling of the Platform.sh project files.
//!
//! - `.platform.app.yaml` (required)
//! - `.platform/services.yaml` (optional, empty when absent)
//! - `.platform/routes.yaml` (optional, empty when absent)
//! - `.environment` (optional runtime script, copied verbatim)

pub mod loader;
pub mod types;

pub use loader::{load_project, load_yaml_file, PlatformProject, ProjectFiles};
pub use types::{
    scalar_to_string, AppConfig, Extension, Relationship, RelationshipTarget, RouteSpec,
    ServiceDefinition, ServiceSpec,
};
