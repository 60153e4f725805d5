//! # DDEV Environment
//!
//! Project settings read from the environment variables DDEV exports to
//! add-on install actions.

use crate::constants::{DEFAULT_DOCROOT, PLATFORM_CACHE_DIR_PREFIX};

/// Settings DDEV provides about the project being configured
///
/// All settings have sensible defaults so the translator can also run
/// outside a DDEV action (for example from tests or by hand).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdevEnvironment {
    /// Project name (`DDEV_PROJECT`)
    pub project: String,
    /// Docroot DDEV currently uses (`DDEV_DOCROOT`)
    pub docroot: String,
    /// DDEV project type, e.g. `php`, `laravel`, `drupal10` (`DDEV_PROJECT_TYPE`)
    pub project_type: String,
    /// Project root inside the web container (`DDEV_APPROOT`)
    pub approot: String,
    /// Primary URL of the site (`DDEV_PRIMARY_URL`)
    pub primary_url: String,
    /// Site name used in container names (`DDEV_SITENAME`)
    pub sitename: String,
    /// Debug mode (`DDEV_PLATFORMSH_DEBUG` or `PLATFORMSH_DEBUG`)
    pub debug: bool,
}

impl Default for DdevEnvironment {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl DdevEnvironment {
    /// Load settings from process environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let project = non_empty("DDEV_PROJECT").unwrap_or_default();
        let primary_url = non_empty("DDEV_PRIMARY_URL")
            .unwrap_or_else(|| format!("https://{project}.ddev.site"));
        let sitename = non_empty("DDEV_SITENAME").unwrap_or_else(|| project.clone());

        Self {
            docroot: non_empty("DDEV_DOCROOT").unwrap_or_else(|| DEFAULT_DOCROOT.to_string()),
            project_type: non_empty("DDEV_PROJECT_TYPE").unwrap_or_else(|| "php".to_string()),
            approot: non_empty("DDEV_APPROOT").unwrap_or_else(|| "/var/www/html".to_string()),
            debug: non_empty("DDEV_PLATFORMSH_DEBUG").is_some()
                || non_empty("PLATFORMSH_DEBUG").is_some(),
            project,
            primary_url,
            sitename,
        }
    }

    /// Host part of the primary URL, e.g. `mysite.ddev.site`
    #[must_use]
    pub fn primary_host(&self) -> &str {
        let without_scheme = self
            .primary_url
            .split_once("://")
            .map_or(self.primary_url.as_str(), |(_, rest)| rest);
        without_scheme
            .split(['/', '?', '#'])
            .next()
            .unwrap_or(without_scheme)
    }

    /// Per-project cache directory exposed as `PLATFORM_CACHE_DIR`
    #[must_use]
    pub fn cache_dir(&self) -> String {
        format!("{PLATFORM_CACHE_DIR_PREFIX}/{}", self.project)
    }
}
