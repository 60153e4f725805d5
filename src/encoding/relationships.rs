//! # PLATFORM_RELATIONSHIPS
//!
//! Builds the relationship objects Platform.sh applications read at runtime
//! and encodes them as base64 JSON.
//!
//! Inside DDEV every database lives in the `db` container with `db`/`db`
//! credentials, so the network fields are fixed placeholders. Add-on services
//! are reached through the container name the add-on creates.

use crate::constants::{DDEV_DB_CREDENTIAL, DDEV_DB_HOST, RELATIONSHIP_CLUSTER, RELATIONSHIP_IP};
use crate::mapping::{ResolvedDatabase, ResolvedService};
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Relationship name to its entries, in declaration order
pub type Relationships = IndexMap<String, Vec<RelationshipEntry>>;

/// Query part of a database relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseQuery {
    pub is_master: bool,
}

/// Relationship entry for the primary or an additional database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseRelationshipEntry {
    pub username: String,
    pub scheme: String,
    pub service: String,
    pub fragment: Option<String>,
    pub ip: String,
    pub hostname: String,
    pub public: bool,
    pub cluster: String,
    pub host: String,
    pub rel: String,
    pub query: DatabaseQuery,
    pub path: String,
    pub password: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub port: u16,
    pub host_mapped: bool,
}

impl From<&ResolvedDatabase> for DatabaseRelationshipEntry {
    fn from(db: &ResolvedDatabase) -> Self {
        let rel = if db.scheme == "pgsql" { "pgsql" } else { "mysql" };
        Self {
            username: DDEV_DB_CREDENTIAL.to_string(),
            scheme: db.scheme.clone(),
            service: db.service_name.clone(),
            fragment: None,
            ip: RELATIONSHIP_IP.to_string(),
            hostname: DDEV_DB_HOST.to_string(),
            public: false,
            cluster: RELATIONSHIP_CLUSTER.to_string(),
            host: DDEV_DB_HOST.to_string(),
            rel: rel.to_string(),
            query: DatabaseQuery { is_master: true },
            path: DDEV_DB_CREDENTIAL.to_string(),
            password: DDEV_DB_CREDENTIAL.to_string(),
            service_type: db.platform_type_version(),
            port: db.port,
            host_mapped: false,
        }
    }
}

/// Relationship entry for a cache or search service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRelationshipEntry {
    pub username: Option<String>,
    pub scheme: String,
    pub service: String,
    pub fragment: Option<String>,
    pub ip: String,
    pub hostname: String,
    pub public: bool,
    pub cluster: String,
    pub host: String,
    pub rel: String,
    pub query: serde_json::Map<String, serde_json::Value>,
    pub path: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "type")]
    pub service_type: String,
    pub port: u16,
    pub host_mapped: bool,
}

impl From<&ResolvedService> for ServiceRelationshipEntry {
    fn from(svc: &ResolvedService) -> Self {
        Self {
            username: None,
            scheme: svc.mapping.scheme.to_string(),
            service: svc.service_name.clone(),
            fragment: None,
            ip: RELATIONSHIP_IP.to_string(),
            hostname: svc.mapping.hostname.to_string(),
            public: false,
            cluster: RELATIONSHIP_CLUSTER.to_string(),
            host: svc.mapping.hostname.to_string(),
            rel: svc.mapping.hostname.to_string(),
            query: serde_json::Map::new(),
            path: None,
            password: None,
            service_type: svc.platform_type_version(),
            port: svc.mapping.port,
            host_mapped: false,
        }
    }
}

/// Either entry kind; decoding tries the database shape first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipEntry {
    Database(DatabaseRelationshipEntry),
    Service(ServiceRelationshipEntry),
}

impl RelationshipEntry {
    #[must_use]
    pub fn service_type(&self) -> &str {
        match self {
            RelationshipEntry::Database(e) => &e.service_type,
            RelationshipEntry::Service(e) => &e.service_type,
        }
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        match self {
            RelationshipEntry::Database(e) => &e.scheme,
            RelationshipEntry::Service(e) => &e.scheme,
        }
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        match self {
            RelationshipEntry::Database(e) => e.port,
            RelationshipEntry::Service(e) => e.port,
        }
    }
}

/// Merge database and service entries keyed by relationship name
///
/// Databases come first. A service sharing a relationship name with a
/// database replaces it in place.
#[must_use]
pub fn build_relationships(
    databases: &[ResolvedDatabase],
    services: &[ResolvedService],
) -> Relationships {
    let mut relationships = Relationships::new();
    for db in databases {
        relationships.insert(
            db.relationship.clone(),
            vec![RelationshipEntry::Database(db.into())],
        );
    }
    for svc in services {
        relationships.insert(
            svc.relationship.clone(),
            vec![RelationshipEntry::Service(svc.into())],
        );
    }
    relationships
}

/// base64(JSON) of the merged relationships
pub fn encode_relationships(
    databases: &[ResolvedDatabase],
    services: &[ResolvedService],
) -> Result<String> {
    let relationships = build_relationships(databases, services);
    let json =
        serde_json::to_string(&relationships).context("Failed to serialize relationships")?;
    Ok(STANDARD.encode(json))
}

/// Reverse of [`encode_relationships`]
pub fn decode_relationships(blob: &str) -> Result<Relationships> {
    let bytes = STANDARD
        .decode(blob.trim())
        .context("PLATFORM_RELATIONSHIPS is not valid base64")?;
    serde_json::from_slice(&bytes).context("PLATFORM_RELATIONSHIPS is not valid relationship JSON")
}
