//! # Types
//!
//! Data structures for the Platform.sh configuration files.
//!
//! Only the fields the translation reads are modelled; everything else in the
//! files is ignored. Mappings use [`IndexMap`] because Platform.sh treats
//! declaration order as significant.

use indexmap::IndexMap;
use serde::Deserialize;

/// `.platform.app.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Runtime, e.g. `php:8.1`
    #[serde(default, rename = "type")]
    pub app_type: Option<String>,
    #[serde(default)]
    pub relationships: IndexMap<String, Option<RelationshipTarget>>,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub dependencies: Dependencies,
    #[serde(default)]
    pub build: Build,
    #[serde(default)]
    pub hooks: Hooks,
    #[serde(default)]
    pub runtime: Runtime,
    #[serde(default)]
    pub web: Web,
}

/// Right-hand side of a relationship declaration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RelationshipTarget {
    /// `database: "db:mysql"` or `database: "db"`
    Short(String),
    /// `database: { service: db, endpoint: mysql }`
    Long {
        #[serde(default)]
        service: Option<String>,
        #[serde(default)]
        endpoint: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Variables {
    #[serde(default)]
    pub env: IndexMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dependencies {
    #[serde(default)]
    pub php: IndexMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub python3: IndexMap<String, serde_yaml::Value>,
}

impl Dependencies {
    /// PHP packages as `(package, constraint)` pairs
    ///
    /// Accepts both the flat form and the `require:` form of `dependencies.php`.
    #[must_use]
    pub fn php_packages(&self) -> Vec<(String, String)> {
        if let Some(serde_yaml::Value::Mapping(require)) = self.php.get("require") {
            return require
                .iter()
                .filter_map(|(k, v)| Some((k.as_str()?.to_string(), scalar_to_string(v))))
                .collect();
        }

        self.php
            .iter()
            .filter(|(_, v)| !v.is_mapping() && !v.is_sequence())
            .map(|(k, v)| (k.clone(), scalar_to_string(v)))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Build {
    #[serde(default)]
    pub flavor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hooks {
    #[serde(default)]
    pub build: Option<String>,
    #[serde(default)]
    pub deploy: Option<String>,
    #[serde(default)]
    pub post_deploy: Option<String>,
}

impl Hooks {
    /// Build, deploy and post_deploy scripts in execution order, skipping blanks
    pub fn scripts(&self) -> impl Iterator<Item = &str> {
        [&self.build, &self.deploy, &self.post_deploy]
            .into_iter()
            .filter_map(|hook| hook.as_deref())
            .filter(|script| !script.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Runtime {
    #[serde(default)]
    pub extensions: Vec<Extension>,
}

impl Runtime {
    pub fn extension_names(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(Extension::name)
    }

    #[must_use]
    pub fn has_extension(&self, name: &str) -> bool {
        self.extension_names().any(|ext| ext == name)
    }
}

/// A runtime extension, either `redis` or `{ name: blackfire, configuration: ... }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Extension {
    Name(String),
    Configured { name: String },
}

impl Extension {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Extension::Name(name) | Extension::Configured { name } => name,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Web {
    #[serde(default)]
    pub locations: IndexMap<String, Location>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub root: Option<String>,
}

/// One entry of `.platform/services.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceSpec {
    /// Type string such as `mariadb:10.4`
    #[serde(default, rename = "type")]
    pub service_type: String,
}

/// One entry of `.platform/routes.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteSpec {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub production_url: Option<String>,
    #[serde(default)]
    pub upstream: Option<String>,
    /// Redirect target, used when `upstream` is absent
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default, rename = "type")]
    pub route_type: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
}

/// A service declared in services.yaml, with its type string split on `:`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub name: String,
    pub service_type: String,
    /// `None` when the type string carries no version
    pub version: Option<String>,
}

impl ServiceDefinition {
    #[must_use]
    pub fn parse(name: &str, type_string: &str) -> Self {
        let (service_type, version) = match type_string.split_once(':') {
            Some((t, v)) if !v.is_empty() => (t, Some(v.to_string())),
            Some((t, _)) => (t, None),
            None => (type_string, None),
        };
        Self {
            name: name.to_string(),
            service_type: service_type.trim().to_string(),
            version,
        }
    }
}

/// A named pointer from the application to a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub name: String,
    pub service_name: String,
}

impl Relationship {
    /// Build from a relationship declaration; a missing target means the
    /// service has the relationship's own name
    #[must_use]
    pub fn from_target(name: &str, target: Option<&RelationshipTarget>) -> Self {
        let service_name = match target {
            Some(RelationshipTarget::Short(value)) => value
                .split(':')
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or(name)
                .to_string(),
            Some(RelationshipTarget::Long {
                service: Some(service),
                ..
            }) => service.clone(),
            Some(RelationshipTarget::Long { service: None, .. }) | None => name.to_string(),
        };
        Self {
            name: name.to_string(),
            service_name,
        }
    }
}

/// Render a YAML scalar the way it would appear in a shell assignment
#[must_use]
pub fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
