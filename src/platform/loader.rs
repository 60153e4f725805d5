//! # Loader
//!
//! Reads the three Platform.sh files from their fixed locations and parses them.
//!
//! Reading and parsing are separate steps so the orchestrator can report a
//! missing app config on its own and batch every parse problem together.

use crate::constants::{
    APP_CONFIG_FILE, ENVIRONMENT_SCRIPT_FILE, ROUTES_CONFIG_FILE, SERVICES_CONFIG_FILE,
};
use crate::error::{PlatformshError, ValidationIssue};
use crate::platform::types::{AppConfig, Relationship, RouteSpec, ServiceSpec};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Raw contents of the Platform.sh files
#[derive(Debug, Clone)]
pub struct ProjectFiles {
    pub root: PathBuf,
    pub app: String,
    pub services: Option<String>,
    pub routes: Option<String>,
    pub environment_script: Option<PathBuf>,
}

impl ProjectFiles {
    /// Read the files below `root`
    ///
    /// Fails with `MissingFile` when `.platform.app.yaml` does not exist and
    /// with a batched `Validation` error when any present file is unreadable.
    pub fn read(root: &Path) -> Result<Self, PlatformshError> {
        let mut issues = Vec::new();

        let app_path = root.join(APP_CONFIG_FILE);
        let app = match std::fs::read_to_string(&app_path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PlatformshError::MissingFile { path: app_path });
            }
            Err(e) => {
                issues.push(unreadable(APP_CONFIG_FILE, &e));
                None
            }
        };

        let services = read_optional(
            &root.join(SERVICES_CONFIG_FILE),
            SERVICES_CONFIG_FILE,
            &mut issues,
        );
        let routes = read_optional(&root.join(ROUTES_CONFIG_FILE), ROUTES_CONFIG_FILE, &mut issues);

        if !issues.is_empty() {
            return Err(PlatformshError::Validation(issues));
        }

        let environment_script = Some(root.join(ENVIRONMENT_SCRIPT_FILE)).filter(|p| p.is_file());

        Ok(Self {
            root: root.to_path_buf(),
            app: app.unwrap_or_default(),
            services,
            routes,
            environment_script,
        })
    }

    /// Parse every file, collecting all YAML problems before failing
    pub fn parse(&self) -> Result<PlatformProject, PlatformshError> {
        let mut issues = Vec::new();

        let app_value = parse_value(&self.app, APP_CONFIG_FILE, &mut issues);
        let app_is_empty = app_value.as_ref().is_none_or(is_empty_value);
        let app: AppConfig = convert(app_value, APP_CONFIG_FILE, &mut issues);

        let services_value = self
            .services
            .as_deref()
            .and_then(|content| parse_value(content, SERVICES_CONFIG_FILE, &mut issues));
        let services: IndexMap<String, ServiceSpec> =
            convert(services_value, SERVICES_CONFIG_FILE, &mut issues);

        let routes_value = self
            .routes
            .as_deref()
            .and_then(|content| parse_value(content, ROUTES_CONFIG_FILE, &mut issues));
        let routes: IndexMap<String, RouteSpec> =
            convert(routes_value, ROUTES_CONFIG_FILE, &mut issues);

        if !issues.is_empty() {
            return Err(PlatformshError::Validation(issues));
        }

        debug!(
            services = services.len(),
            routes = routes.len(),
            relationships = app.relationships.len(),
            "Parsed Platform.sh configuration"
        );

        Ok(PlatformProject {
            root: self.root.clone(),
            app,
            services,
            routes,
            environment_script: self.environment_script.clone(),
            app_is_empty,
        })
    }
}

/// Parsed Platform.sh project
#[derive(Debug, Clone, Default)]
pub struct PlatformProject {
    pub root: PathBuf,
    pub app: AppConfig,
    pub services: IndexMap<String, ServiceSpec>,
    pub routes: IndexMap<String, RouteSpec>,
    pub environment_script: Option<PathBuf>,
    pub app_is_empty: bool,
}

impl PlatformProject {
    /// Relationships in declaration order
    #[must_use]
    pub fn relationships(&self) -> Vec<Relationship> {
        self.app
            .relationships
            .iter()
            .map(|(name, target)| Relationship::from_target(name, target.as_ref()))
            .collect()
    }

    /// Application type for messages, `unknown` when absent
    #[must_use]
    pub fn app_type(&self) -> &str {
        self.app.app_type.as_deref().unwrap_or("unknown")
    }

    /// Only PHP runtimes can be translated
    #[must_use]
    pub fn is_php(&self) -> bool {
        self.app
            .app_type
            .as_deref()
            .is_some_and(|t| t.starts_with("php"))
    }
}

/// Read and parse the project below `root` in one step
pub fn load_project(root: &Path) -> Result<PlatformProject, PlatformshError> {
    ProjectFiles::read(root)?.parse()
}

/// Parse a single YAML file, surfacing malformed YAML as `Parse`
///
/// Empty and comment-only files yield `None`.
pub fn load_yaml_file(path: &Path) -> Result<Option<serde_yaml::Value>, PlatformshError> {
    let content = std::fs::read_to_string(path).map_err(|source| PlatformshError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|source| PlatformshError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(value).filter(|v| !v.is_null()))
}

fn read_optional(path: &Path, label: &str, issues: &mut Vec<ValidationIssue>) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Optional file not present: {}", path.display());
            None
        }
        Err(e) => {
            issues.push(unreadable(label, &e));
            None
        }
    }
}

fn unreadable(label: &str, err: &std::io::Error) -> ValidationIssue {
    ValidationIssue::Unreadable {
        path: label.to_string(),
        reason: err.to_string(),
    }
}

fn parse_value(
    content: &str,
    label: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<serde_yaml::Value> {
    match serde_yaml::from_str::<serde_yaml::Value>(content) {
        Ok(serde_yaml::Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            issues.push(ValidationIssue::Parse {
                path: label.to_string(),
                reason: e.to_string(),
            });
            None
        }
    }
}

fn convert<T>(value: Option<serde_yaml::Value>, label: &str, issues: &mut Vec<ValidationIssue>) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(value) = value else {
        return T::default();
    };
    serde_yaml::from_value(value).unwrap_or_else(|e| {
        issues.push(ValidationIssue::Parse {
            path: label.to_string(),
            reason: e.to_string(),
        });
        T::default()
    })
}

fn is_empty_value(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Null => true,
        serde_yaml::Value::Mapping(m) => m.is_empty(),
        _ => false,
    }
}
