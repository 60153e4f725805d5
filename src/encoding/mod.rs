//! # Encoding
//!
//! The base64 JSON blobs and tokens injected into the web container so that
//! application code sees a Platform.sh-like runtime.

pub mod entropy;
pub mod relationships;
pub mod routes;

pub use entropy::generate_project_entropy;
pub use relationships::{
    build_relationships, decode_relationships, encode_relationships, DatabaseRelationshipEntry,
    RelationshipEntry, Relationships, ServiceRelationshipEntry,
};
pub use routes::{build_routes, decode_routes, encode_routes, RouteEntry, Routes};
