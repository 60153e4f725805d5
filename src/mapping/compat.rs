//! # Database Compatibility
//!
//! Compares the database already provisioned for a DDEV project with the one
//! the Platform.sh configuration asks for.

use regex::Regex;
use std::sync::LazyLock;

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;]*m")
        .expect("Failed to compile ANSI escape regex - this should never happen")
});

/// Outcome of a compatibility check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityResult {
    pub compatible: bool,
    /// `type:version` the configuration expects
    pub expected_version: String,
    /// Cleaned `type:version` of the existing database, if any
    pub current_version: Option<String>,
    /// User guidance, empty when compatible
    pub message: String,
}

/// Remove terminal color sequences from tool output
#[must_use]
pub fn strip_ansi(input: &str) -> String {
    ANSI_ESCAPE.replace_all(input, "").into_owned()
}

/// Check an existing database against the expected type and version
///
/// With no current version (fresh project) the result is always compatible.
#[must_use]
pub fn check_compatibility(
    current: Option<&str>,
    expected_type: &str,
    expected_version: &str,
) -> CompatibilityResult {
    let expected = format!("{expected_type}:{expected_version}");

    let Some(current) = current.map(strip_ansi).map(|c| c.trim().to_string()) else {
        return CompatibilityResult {
            compatible: true,
            expected_version: expected,
            current_version: None,
            message: String::new(),
        };
    };

    if current.is_empty() || current == expected {
        return CompatibilityResult {
            compatible: true,
            expected_version: expected,
            current_version: Some(current).filter(|c| !c.is_empty()),
            message: String::new(),
        };
    }

    let message = format!(
        "There is an existing database in this project that doesn't match the upstream database type.\n\
         Expected: {expected}, Found: {current}\n\
         Please use 'ddev delete' to delete the existing database and retry, or try \
         'ddev debug migrate-database {expected}' to migrate the database."
    );

    CompatibilityResult {
        compatible: false,
        expected_version: expected,
        current_version: Some(current),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_current_version_is_compatible() {
        let result = check_compatibility(None, "mariadb", "10.4");
        assert!(result.compatible);
        assert_eq!(result.expected_version, "mariadb:10.4");
        assert!(result.message.is_empty());
    }

    #[test]
    fn test_matching_version_is_compatible() {
        assert!(check_compatibility(Some("mysql:10.5"), "mysql", "10.5").compatible);
    }

    #[test]
    fn test_mismatch_names_both_versions() {
        let result = check_compatibility(Some("postgres:13"), "mysql", "10.5");
        assert!(!result.compatible);
        assert!(result.message.contains("postgres:13"));
        assert!(result.message.contains("mysql:10.5"));
        assert!(result.message.contains("ddev delete"));
    }

    #[test]
    fn test_color_codes_are_ignored() {
        let result = check_compatibility(Some("\x1b[32mmariadb:10.4\x1b[0m\n"), "mariadb", "10.4");
        assert!(result.compatible);
        assert_eq!(result.current_version.as_deref(), Some("mariadb:10.4"));
    }
}
