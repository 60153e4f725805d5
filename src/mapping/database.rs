//! # Database Mapping
//!
//! Classifies Platform.sh services as databases and resolves the DDEV
//! database type, version, port and scheme for each.

use crate::constants::{
    DEFAULT_DATABASE_RELATIONSHIP, DEFAULT_DATABASE_TYPE, DEFAULT_DATABASE_VERSION,
};
use crate::platform::{Relationship, ServiceDefinition};
use anyhow::{Context, Result};
use regex::Regex;

/// One row of the database lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseMapping {
    pub platform_type: &'static str,
    pub ddev_type: &'static str,
    pub default_version: &'static str,
    pub port: u16,
    pub scheme: &'static str,
}

/// Supported Platform.sh database types
pub static DATABASE_MAPPINGS: [DatabaseMapping; 5] = [
    DatabaseMapping {
        platform_type: "mysql",
        ddev_type: "mysql",
        default_version: "8.0",
        port: 3306,
        scheme: "mysql",
    },
    DatabaseMapping {
        platform_type: "mariadb",
        ddev_type: "mariadb",
        default_version: "10.4",
        port: 3306,
        scheme: "mysql",
    },
    DatabaseMapping {
        platform_type: "oracle-mysql",
        ddev_type: "mysql",
        default_version: "8.0",
        port: 3306,
        scheme: "mysql",
    },
    DatabaseMapping {
        platform_type: "postgresql",
        ddev_type: "postgres",
        default_version: "13",
        port: 5432,
        scheme: "pgsql",
    },
    DatabaseMapping {
        platform_type: "postgres",
        ddev_type: "postgres",
        default_version: "13",
        port: 5432,
        scheme: "pgsql",
    },
];

/// Look up the part of `service_type` before `:` in the database table
#[must_use]
pub fn classify(service_type: &str) -> Option<&'static DatabaseMapping> {
    let base = service_type.split(':').next().unwrap_or(service_type).trim();
    DATABASE_MAPPINGS.iter().find(|m| m.platform_type == base)
}

/// A relationship resolved to a database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDatabase {
    pub relationship: String,
    pub service_name: String,
    pub platform_type: String,
    pub platform_version: String,
    pub ddev_type: String,
    pub ddev_version: String,
    pub port: u16,
    pub scheme: String,
}

impl ResolvedDatabase {
    fn from_mapping(
        relationship: &str,
        service_name: &str,
        mapping: &DatabaseMapping,
        version: Option<&str>,
    ) -> Self {
        let version = version.unwrap_or(mapping.default_version);
        Self {
            relationship: relationship.to_string(),
            service_name: service_name.to_string(),
            platform_type: mapping.platform_type.to_string(),
            platform_version: version.to_string(),
            ddev_type: mapping.ddev_type.to_string(),
            ddev_version: version.to_string(),
            port: mapping.port,
            scheme: mapping.scheme.to_string(),
        }
    }

    /// `mariadb:10.4` as DDEV names it
    #[must_use]
    pub fn ddev_type_version(&self) -> String {
        format!("{}:{}", self.ddev_type, self.ddev_version)
    }

    /// `oracle-mysql:8.0` as Platform.sh names it
    #[must_use]
    pub fn platform_type_version(&self) -> String {
        format!("{}:{}", self.platform_type, self.platform_version)
    }
}

/// The database DDEV gets when the project declares none
#[must_use]
pub fn default_database() -> ResolvedDatabase {
    let mapping = classify(DEFAULT_DATABASE_TYPE).unwrap_or(&DATABASE_MAPPINGS[1]);
    ResolvedDatabase::from_mapping(
        DEFAULT_DATABASE_RELATIONSHIP,
        DEFAULT_DATABASE_RELATIONSHIP,
        mapping,
        Some(DEFAULT_DATABASE_VERSION),
    )
}

/// Resolve every relationship that targets a database service
///
/// Relationship order is preserved and the first entry is the primary
/// database. When nothing resolves, the default MariaDB entry is returned.
#[must_use]
pub fn resolve_databases(
    relationships: &[Relationship],
    services: &[ServiceDefinition],
) -> Vec<ResolvedDatabase> {
    let mut databases: Vec<ResolvedDatabase> = relationships
        .iter()
        .filter_map(|rel| {
            let service = services.iter().find(|s| s.name == rel.service_name)?;
            let mapping = classify(&service.service_type)?;
            Some(ResolvedDatabase::from_mapping(
                &rel.name,
                &service.name,
                mapping,
                service.version.as_deref(),
            ))
        })
        .collect();

    if databases.is_empty() {
        databases.push(default_database());
    }
    databases
}

/// Advisory check that a version looks like one DDEV can provision
///
/// Unknown database types are accepted.
pub fn is_valid_version(platform_type: &str, version: &str) -> Result<bool> {
    let pattern = match platform_type {
        "mysql" | "oracle-mysql" => r"^[5-9]\.[0-9]$",
        "mariadb" => r"^10\.[0-9]+$",
        "postgres" | "postgresql" => r"^(1[0-9]|9\.[0-9])$",
        _ => return Ok(true),
    };
    let re = Regex::new(pattern)
        .with_context(|| format!("Invalid version pattern for {platform_type}"))?;
    Ok(re.is_match(version))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(name: &str, service: &str) -> Relationship {
        Relationship {
            name: name.to_string(),
            service_name: service.to_string(),
        }
    }

    mod classify {
        use super::*;

        #[test]
        fn test_known_types() {
            assert_eq!(classify("mariadb:10.4").unwrap().ddev_type, "mariadb");
            assert_eq!(classify("oracle-mysql:8.0").unwrap().ddev_type, "mysql");
            assert_eq!(classify("mysql").unwrap().ddev_type, "mysql");
            assert_eq!(classify("postgresql:12").unwrap().port, 5432);
        }

        #[test]
        fn test_non_database_is_none() {
            assert!(classify("redis:6.0").is_none());
            assert!(classify("").is_none());
        }
    }

    mod resolve_databases {
        use super::*;

        #[test]
        fn test_each_table_entry_maps_deterministically() {
            let cases = [
                ("mysql:8.0", "mysql", "8.0", 3306, "mysql"),
                ("mariadb:10.4", "mariadb", "10.4", 3306, "mysql"),
                ("oracle-mysql:8.0", "mysql", "8.0", 3306, "mysql"),
                ("postgresql:13", "postgres", "13", 5432, "pgsql"),
                ("postgres:14", "postgres", "14", 5432, "pgsql"),
            ];

            for (type_string, ddev_type, ddev_version, port, scheme) in cases {
                let services = vec![ServiceDefinition::parse("db", type_string)];
                let dbs = resolve_databases(&[rel("database", "db")], &services);
                assert_eq!(dbs.len(), 1, "{type_string}");
                assert_eq!(dbs[0].ddev_type, ddev_type, "{type_string}");
                assert_eq!(dbs[0].ddev_version, ddev_version, "{type_string}");
                assert_eq!(dbs[0].port, port, "{type_string}");
                assert_eq!(dbs[0].scheme, scheme, "{type_string}");
            }
        }

        #[test]
        fn test_missing_version_uses_table_default() {
            let services = vec![ServiceDefinition::parse("db", "postgresql")];
            let dbs = resolve_databases(&[rel("database", "db")], &services);
            assert_eq!(dbs[0].ddev_version, "13");
            assert_eq!(dbs[0].platform_type_version(), "postgresql:13");
        }

        #[test]
        fn test_no_services_synthesizes_default() {
            let dbs = resolve_databases(&[], &[]);
            assert_eq!(dbs.len(), 1);
            assert_eq!(dbs[0].ddev_type_version(), "mariadb:10.4");
            assert_eq!(dbs[0], default_database());
        }

        #[test]
        fn test_first_declared_database_is_primary() {
            let services = vec![
                ServiceDefinition::parse("reports", "postgresql:12"),
                ServiceDefinition::parse("main", "mariadb:10.6"),
                ServiceDefinition::parse("cache", "redis:6.0"),
            ];
            let rels = [
                rel("cache", "cache"),
                rel("legacy", "reports"),
                rel("database", "main"),
            ];
            let dbs = resolve_databases(&rels, &services);
            assert_eq!(dbs.len(), 2);
            assert_eq!(dbs[0].relationship, "legacy");
            assert_eq!(dbs[1].relationship, "database");
        }

        #[test]
        fn test_dangling_relationship_is_skipped() {
            let dbs = resolve_databases(&[rel("database", "missing")], &[]);
            assert_eq!(dbs, vec![default_database()]);
        }
    }

    mod is_valid_version {
        use super::*;

        #[test]
        fn test_patterns() {
            assert!(is_valid_version("mysql", "8.0").unwrap());
            assert!(!is_valid_version("mysql", "10.5").unwrap());
            assert!(is_valid_version("mariadb", "10.11").unwrap());
            assert!(!is_valid_version("mariadb", "11.0").unwrap());
            assert!(is_valid_version("postgresql", "15").unwrap());
            assert!(is_valid_version("postgres", "9.6").unwrap());
            assert!(!is_valid_version("postgres", "8").unwrap());
            assert!(is_valid_version("redis", "anything").unwrap());
        }
    }
}
