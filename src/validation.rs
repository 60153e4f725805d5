//! # Validation
//!
//! Schema checks that run after the Platform.sh files parsed successfully,
//! plus non-fatal warnings.

use crate::constants::APP_CONFIG_FILE;
use crate::error::ValidationIssue;
use crate::mapping::database::is_valid_version;
use crate::mapping::{resolve_services, ResolvedDatabase};
use crate::platform::{PlatformProject, ServiceDefinition};
use regex::Regex;
use std::sync::LazyLock;

static SHELL_VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)")
        .expect("Failed to compile shell variable regex - this should never happen")
});

/// Every schema problem in the project, in file order
#[must_use]
pub fn validate_schema(project: &PlatformProject) -> Vec<ValidationIssue> {
    if project.app_is_empty {
        return vec![ValidationIssue::EmptyAppConfig];
    }

    let mut issues = Vec::new();
    if project.app.app_type.is_none() {
        issues.push(ValidationIssue::MissingField("type"));
    }

    let relationships = project.relationships();
    for rel in &relationships {
        if !project.services.contains_key(&rel.service_name) {
            issues.push(ValidationIssue::UnknownService {
                relationship: rel.name.clone(),
                service: rel.service_name.clone(),
            });
        }
    }

    let services = service_definitions(project);
    issues.extend(resolve_services(&relationships, &services).issues);
    issues
}

/// All services declared in services.yaml
#[must_use]
pub fn service_definitions(project: &PlatformProject) -> Vec<ServiceDefinition> {
    project
        .services
        .iter()
        .map(|(name, spec)| ServiceDefinition::parse(name, &spec.service_type))
        .collect()
}

/// Non-fatal findings worth showing to the user
#[must_use]
pub fn collect_warnings(project: &PlatformProject, databases: &[ResolvedDatabase]) -> Vec<String> {
    let mut warnings = Vec::new();

    if !project.app_is_empty && project.app.name.is_none() {
        warnings.push(format!(
            "No application name in {APP_CONFIG_FILE}; Platform.sh requires one to deploy"
        ));
    }

    for db in databases {
        match is_valid_version(&db.platform_type, &db.platform_version) {
            Ok(true) => {}
            Ok(false) => warnings.push(format!(
                "Potentially unsupported database version: {}",
                db.platform_type_version()
            )),
            Err(e) => warnings.push(format!(
                "Could not check database version {}: {e}",
                db.platform_type_version()
            )),
        }
    }

    if databases.len() > 1 {
        warnings.push(
            "DDEV currently supports only one database service. Additional databases will be available through relationships but not as separate DDEV services."
                .to_string(),
        );
    }

    let mut seen = Vec::new();
    for script in project.app.hooks.scripts() {
        for capture in SHELL_VARIABLE.captures_iter(script) {
            let name = &capture[1];
            if !name.starts_with("PLATFORM_") && !seen.iter().any(|s| s == name) {
                seen.push(name.to_string());
                warnings.push(format!(
                    "Hook references ${{{name}}}, which is not a Platform.sh variable; make sure it is set in the DDEV web environment"
                ));
            }
        }
    }

    warnings
}
