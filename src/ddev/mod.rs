//! # DDEV Output
//!
//! Everything the translator produces for DDEV.
//!
//! - [`config`]: `config.platformsh.yaml`
//! - [`compose`]: `docker-compose.platformsh-services.yaml`
//! - [`dockerfile`]: `web-build/Dockerfile.platformsh`
//! - [`project_files`]: framework specific files in the application tree
//! - [`commands`]: calls to the `ddev` CLI
//! - [`yaml`]: the text renderer shared by the YAML outputs

pub mod commands;
pub mod compose;
pub mod config;
pub mod dockerfile;
pub mod project_files;
pub mod yaml;

pub use commands::{current_database_version, install_addon};
pub use compose::render_compose_services;
pub use config::{build_ddev_config, DdevConfig, HookStep, PlatformVariables};
pub use dockerfile::render_dockerfile;
pub use yaml::YamlNode;
