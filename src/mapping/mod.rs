//! # Mapping
//!
//! Lookup tables from Platform.sh service types to their DDEV equivalents.
//!
//! - [`database`]: database services, one of which becomes DDEV's primary database
//! - [`service`]: caches and search engines provided by DDEV add-ons
//! - [`compat`]: check an existing DDEV database against the configured one

pub mod compat;
pub mod database;
pub mod service;

pub use compat::{check_compatibility, CompatibilityResult};
pub use database::{resolve_databases, DatabaseMapping, ResolvedDatabase};
pub use service::{
    required_addons, resolve_services, ResolvedService, ServiceMapping, ServiceResolution,
};
