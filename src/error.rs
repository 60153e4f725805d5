//! # Errors
//!
//! Error taxonomy for the Platform.sh to DDEV translation.
//!
//! Validation problems are batched into [`PlatformshError::Validation`] so a
//! user sees every problem at once. Database mismatches and refused writes are
//! single-cause aborts. Each variant maps to one process exit code.

use crate::constants::{
    EXIT_DATABASE_MISMATCH, EXIT_MISSING_FILE, EXIT_UNCAUGHT, EXIT_UNSUPPORTED_APP,
    EXIT_VALIDATION, EXIT_WRITE_REFUSED,
};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for a translation run
#[derive(Debug, Error)]
pub enum PlatformshError {
    #[error("Missing required file: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration validation failed with {} errors", .0.len())]
    Validation(Vec<ValidationIssue>),

    #[error("Unsupported application type '{0}': only PHP applications can be translated")]
    UnsupportedAppType(String),

    #[error("Existing database {found} does not match the configured database {expected}")]
    DatabaseVersionMismatch {
        expected: String,
        found: String,
        message: String,
    },

    #[error(
        "Refusing to overwrite {}: the file does not carry the #ddev-generated marker",
        path.display()
    )]
    DestructiveWriteRefused { path: PathBuf },

    #[error("Failed to install add-on {addon}: {output}")]
    AddonInstall { addon: String, output: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PlatformshError {
    /// Process exit code for this failure
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            PlatformshError::MissingFile { .. } => EXIT_MISSING_FILE,
            PlatformshError::Parse { .. } | PlatformshError::Validation(_) => EXIT_VALIDATION,
            PlatformshError::UnsupportedAppType(_) => EXIT_UNSUPPORTED_APP,
            PlatformshError::DatabaseVersionMismatch { .. } => EXIT_DATABASE_MISMATCH,
            PlatformshError::DestructiveWriteRefused { .. } => EXIT_WRITE_REFUSED,
            // Add-on failures never abort a run; reaching exit means something else went wrong
            PlatformshError::Io { .. }
            | PlatformshError::AddonInstall { .. }
            | PlatformshError::Internal(_) => EXIT_UNCAUGHT,
        }
    }

    /// Single-cause aborts that the reporter logs at CRITICAL
    #[must_use]
    pub fn is_critical(&self) -> bool {
        matches!(
            self.exit_code(),
            EXIT_DATABASE_MISMATCH | EXIT_WRITE_REFUSED | EXIT_UNCAUGHT
        )
    }

    /// Get remediation guidance for this error
    #[must_use]
    pub fn remediation(&self) -> Vec<String> {
        match self {
            PlatformshError::MissingFile { .. } => vec![
                "Verify .platform.app.yaml exists in the project root".to_string(),
                "Run the command from the project root or pass --app-root".to_string(),
            ],
            PlatformshError::Parse { .. } | PlatformshError::Validation(_) => vec![
                "Check .platform.app.yaml, .platform/services.yaml and .platform/routes.yaml syntax"
                    .to_string(),
                "Verify every relationship points at a service declared in services.yaml"
                    .to_string(),
            ],
            PlatformshError::UnsupportedAppType(_) => vec![
                "Only php:<version> application types are supported".to_string(),
            ],
            PlatformshError::DatabaseVersionMismatch { expected, .. } => vec![
                "Use 'ddev delete' to remove the existing database and retry".to_string(),
                format!("Try 'ddev debug migrate-database {expected}'"),
                "Pass --force-db-reset to continue anyway".to_string(),
            ],
            PlatformshError::DestructiveWriteRefused { path } => vec![
                format!(
                    "Remove {} or add a '#ddev-generated' line to allow regeneration",
                    path.display()
                ),
            ],
            PlatformshError::AddonInstall { addon, .. } => {
                vec![format!("Install it manually with 'ddev add-on get {addon}'")]
            }
            PlatformshError::Io { .. } => vec![
                "Check file permissions in the .ddev directory".to_string(),
                "Ensure DDEV has write access to the project directory".to_string(),
            ],
            PlatformshError::Internal(_) => vec![
                "Enable debug mode: export DDEV_PLATFORMSH_DEBUG=1".to_string(),
                "Report issues: https://github.com/ddev/ddev-platformsh/issues".to_string(),
            ],
        }
    }
}

/// A single problem found while validating the Platform.sh files
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("Cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Invalid YAML in {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Platform.sh application configuration is empty or invalid")]
    EmptyAppConfig,

    #[error("Missing required field: {0} in .platform.app.yaml")]
    MissingField(&'static str),

    #[error("Relationship '{relationship}' references unknown service '{service}'")]
    UnknownService {
        relationship: String,
        service: String,
    },

    #[error(
        "Unsupported service type '{service_type}' for relationship '{relationship}'. Supported types: {supported}"
    )]
    UnsupportedServiceType {
        relationship: String,
        service_type: String,
        supported: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_abort_reason() {
        let errors = [
            PlatformshError::MissingFile {
                path: PathBuf::from(".platform.app.yaml"),
            },
            PlatformshError::Validation(vec![ValidationIssue::EmptyAppConfig]),
            PlatformshError::DatabaseVersionMismatch {
                expected: "mariadb:10.4".to_string(),
                found: "mysql:8.0".to_string(),
                message: String::new(),
            },
            PlatformshError::DestructiveWriteRefused {
                path: PathBuf::from("config.platformsh.yaml"),
            },
            PlatformshError::Internal(anyhow::anyhow!("boom")),
            PlatformshError::UnsupportedAppType("nodejs:18".to_string()),
        ];

        let codes: Vec<i32> = errors.iter().map(PlatformshError::exit_code).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5, 6]);

        let critical: Vec<bool> = errors.iter().map(PlatformshError::is_critical).collect();
        assert_eq!(critical, vec![false, false, true, true, true, false]);
    }

    #[test]
    fn test_validation_error_counts_issues() {
        let err = PlatformshError::Validation(vec![
            ValidationIssue::MissingField("type"),
            ValidationIssue::EmptyAppConfig,
        ]);
        assert_eq!(
            err.to_string(),
            "Configuration validation failed with 2 errors"
        );
    }

    #[test]
    fn test_mismatch_remediation_names_expected_version() {
        let err = PlatformshError::DatabaseVersionMismatch {
            expected: "postgres:13".to_string(),
            found: "mariadb:10.4".to_string(),
            message: String::new(),
        };
        assert!(err
            .remediation()
            .iter()
            .any(|hint| hint.contains("ddev debug migrate-database postgres:13")));
    }
}
