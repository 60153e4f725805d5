//! # Service Mapping
//!
//! Resolves non-database services to the DDEV add-ons that provide them.

use crate::error::ValidationIssue;
use crate::mapping::database;
use crate::platform::{Relationship, ServiceDefinition};
use indexmap::IndexSet;

/// One row of the service lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceMapping {
    pub platform_type: &'static str,
    /// `ddev add-on get` identifier
    pub addon: &'static str,
    pub port: u16,
    pub scheme: &'static str,
    /// Container name the add-on creates, used as host in relationships
    pub hostname: &'static str,
    /// Image used when containers are emitted as a compose file
    pub image: &'static str,
    pub default_version: &'static str,
}

/// Supported Platform.sh service types
pub static SERVICE_MAPPINGS: [ServiceMapping; 5] = [
    ServiceMapping {
        platform_type: "redis",
        addon: "ddev/ddev-redis",
        port: 6379,
        scheme: "redis",
        hostname: "redis",
        image: "redis",
        default_version: "6",
    },
    ServiceMapping {
        platform_type: "redis-persistent",
        addon: "ddev/ddev-redis",
        port: 6379,
        scheme: "redis",
        hostname: "redis",
        image: "redis",
        default_version: "6",
    },
    ServiceMapping {
        platform_type: "memcached",
        addon: "ddev/ddev-memcached",
        port: 11211,
        scheme: "memcached",
        hostname: "memcached",
        image: "memcached",
        default_version: "1.6",
    },
    ServiceMapping {
        platform_type: "elasticsearch",
        addon: "ddev/ddev-elasticsearch",
        port: 9200,
        scheme: "http",
        hostname: "elasticsearch",
        image: "elasticsearch",
        default_version: "7.17.14",
    },
    ServiceMapping {
        platform_type: "opensearch",
        addon: "ddev/ddev-elasticsearch",
        port: 9200,
        scheme: "http",
        hostname: "elasticsearch",
        image: "opensearchproject/opensearch",
        default_version: "2",
    },
];

/// Look up the part of `service_type` before `:` in the service table
#[must_use]
pub fn classify(service_type: &str) -> Option<&'static ServiceMapping> {
    let base = service_type.split(':').next().unwrap_or(service_type).trim();
    SERVICE_MAPPINGS.iter().find(|m| m.platform_type == base)
}

/// Comma separated list of supported service types for error messages
#[must_use]
pub fn supported_types() -> String {
    SERVICE_MAPPINGS
        .iter()
        .map(|m| m.platform_type)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A relationship resolved to a DDEV add-on service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
    pub relationship: String,
    pub service_name: String,
    pub platform_type: String,
    /// Declared version, `None` when the type string has none
    pub platform_version: Option<String>,
    pub mapping: &'static ServiceMapping,
}

impl ResolvedService {
    /// `redis:6.0`, or just `redis` when no version was declared
    #[must_use]
    pub fn platform_type_version(&self) -> String {
        match &self.platform_version {
            Some(version) => format!("{}:{version}", self.platform_type),
            None => self.platform_type.clone(),
        }
    }

    /// Image tag for compose output
    #[must_use]
    pub fn image_version(&self) -> &str {
        self.platform_version
            .as_deref()
            .unwrap_or(self.mapping.default_version)
    }
}

/// Result of walking relationships for non-database services
#[derive(Debug, Clone, Default)]
pub struct ServiceResolution {
    pub services: Vec<ResolvedService>,
    pub issues: Vec<ValidationIssue>,
}

impl ServiceResolution {
    /// Deduplicated add-on identifiers in first-seen order
    #[must_use]
    pub fn required_addons(&self) -> Vec<String> {
        required_addons(&self.services)
    }
}

/// Resolve every relationship that targets a non-database service
///
/// Relationships to services missing from services.yaml are skipped here;
/// schema validation reports them. Unknown service types become
/// `UnsupportedServiceType` issues.
#[must_use]
pub fn resolve_services(
    relationships: &[Relationship],
    services: &[ServiceDefinition],
) -> ServiceResolution {
    let mut resolution = ServiceResolution::default();

    for rel in relationships {
        let Some(service) = services.iter().find(|s| s.name == rel.service_name) else {
            continue;
        };
        if database::classify(&service.service_type).is_some() {
            continue;
        }

        match classify(&service.service_type) {
            Some(mapping) => resolution.services.push(ResolvedService {
                relationship: rel.name.clone(),
                service_name: service.name.clone(),
                platform_type: service.service_type.clone(),
                platform_version: service.version.clone(),
                mapping,
            }),
            None => resolution
                .issues
                .push(ValidationIssue::UnsupportedServiceType {
                    relationship: rel.name.clone(),
                    service_type: service.service_type.clone(),
                    supported: supported_types(),
                }),
        }
    }

    resolution
}

/// Deduplicated add-on identifiers implied by `services`
#[must_use]
pub fn required_addons(services: &[ResolvedService]) -> Vec<String> {
    services
        .iter()
        .map(|s| s.mapping.addon.to_string())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}
