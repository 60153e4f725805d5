//! # PLATFORM_ROUTES
//!
//! Builds the route objects Platform.sh applications read at runtime.

use crate::platform::RouteSpec;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Resolved URL to its route entry, in routes.yaml order
pub type Routes = IndexMap<String, RouteEntry>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub primary: bool,
    /// Empty ids are `null`, never `""`
    pub id: Option<String>,
    pub production_url: String,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub upstream: String,
    #[serde(rename = "type")]
    pub route_type: String,
    pub original_url: String,
}

impl RouteEntry {
    fn from_spec(pattern: &str, spec: &RouteSpec) -> Self {
        Self {
            primary: true,
            id: spec.id.clone().filter(|id| !id.is_empty()),
            production_url: spec.production_url.clone().unwrap_or_default(),
            attributes: serde_json::Map::new(),
            upstream: spec
                .upstream
                .clone()
                .or_else(|| spec.to.clone())
                .unwrap_or_default(),
            route_type: spec.route_type.clone().unwrap_or_default(),
            original_url: pattern.to_string(),
        }
    }
}

/// Replace the `{default}` and `{all}` placeholders with the DDEV host
#[must_use]
pub fn expand_pattern(pattern: &str, primary_host: &str) -> String {
    pattern
        .replace("{default}", primary_host)
        .replace("{all}", primary_host)
}

#[must_use]
pub fn build_routes(routes: &IndexMap<String, RouteSpec>, primary_host: &str) -> Routes {
    routes
        .iter()
        .map(|(pattern, spec)| {
            (
                expand_pattern(pattern, primary_host),
                RouteEntry::from_spec(pattern, spec),
            )
        })
        .collect()
}

/// base64(JSON) of the routes
pub fn encode_routes(routes: &IndexMap<String, RouteSpec>, primary_host: &str) -> Result<String> {
    let json = serde_json::to_string(&build_routes(routes, primary_host))
        .context("Failed to serialize routes")?;
    Ok(STANDARD.encode(json))
}

/// Reverse of [`encode_routes`]
pub fn decode_routes(blob: &str) -> Result<Routes> {
    let bytes = STANDARD
        .decode(blob.trim())
        .context("PLATFORM_ROUTES is not valid base64")?;
    serde_json::from_slice(&bytes).context("PLATFORM_ROUTES is not valid route JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes_from(yaml: &str) -> IndexMap<String, RouteSpec> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_empty_id_encodes_as_null() {
        let routes = routes_from("\"https://{default}/\":\n  type: upstream\n  upstream: app:http\n  id: ''\n");
        let blob = encode_routes(&routes, "shop.ddev.site").unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&STANDARD.decode(blob).unwrap()).unwrap();
        let entry = &json["https://shop.ddev.site/"];
        assert!(entry["id"].is_null());
        assert_eq!(entry["primary"], true);
        assert_eq!(entry["attributes"], serde_json::json!({}));
        assert_eq!(entry["upstream"], "app:http");
        assert_eq!(entry["original_url"], "https://{default}/");
    }

    #[test]
    fn test_redirect_route_falls_back_to_target() {
        let routes = routes_from(
            "\"https://www.{default}/\":\n  type: redirect\n  to: \"https://{default}/\"\n",
        );
        let built = build_routes(&routes, "shop.ddev.site");
        let entry = &built["https://www.shop.ddev.site/"];
        assert_eq!(entry.route_type, "redirect");
        assert_eq!(entry.upstream, "https://{default}/");
        assert_eq!(entry.production_url, "");
    }

    #[test]
    fn test_round_trip() {
        let routes = routes_from(
            "\"https://{default}/\":\n  type: upstream\n  upstream: app:http\n  id: main\n\"http://{all}/\":\n  type: redirect\n  to: \"https://{default}/\"\n",
        );
        let blob = encode_routes(&routes, "shop.ddev.site").unwrap();
        let decoded = decode_routes(&blob).unwrap();
        assert_eq!(decoded, build_routes(&routes, "shop.ddev.site"));
        assert_eq!(decoded.get_index(0).unwrap().1.id.as_deref(), Some("main"));
    }

    #[test]
    fn test_no_routes_encode_to_empty_object() {
        let blob = encode_routes(&IndexMap::new(), "shop.ddev.site").unwrap();
        assert_eq!(blob, STANDARD.encode("{}"));
    }
}
