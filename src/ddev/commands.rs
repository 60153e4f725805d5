//! # DDEV CLI
//!
//! The `ddev` invocations the translator depends on.

use crate::error::PlatformshError;
use crate::mapping::compat::strip_ansi;
use crate::process::CommandRunner;
use std::path::Path;
use tracing::{debug, warn};

/// Database type and version of the existing DDEV volume, e.g. `mariadb:10.4`
///
/// Returns `None` for a fresh project and whenever the command fails or gives
/// no usable answer.
pub fn current_database_version(runner: &dyn CommandRunner, app_root: &Path) -> Option<String> {
    let output = match runner.run("ddev", &["debug", "get-volume-db-version"], Some(app_root)) {
        Ok(output) => output,
        Err(e) => {
            debug!("Could not query existing database version: {e:#}");
            return None;
        }
    };

    if !output.success {
        debug!("ddev debug get-volume-db-version failed: {}", output.combined());
        return None;
    }

    let version = strip_ansi(&output.stdout).trim().to_string();
    if version.is_empty() || version.contains("No database") {
        return None;
    }
    Some(version)
}

/// Install a DDEV add-on with `ddev add-on get`
pub fn install_addon(
    runner: &dyn CommandRunner,
    addon: &str,
    app_root: &Path,
) -> Result<(), PlatformshError> {
    let output = runner
        .run("ddev", &["add-on", "get", addon], Some(app_root))
        .map_err(|e| PlatformshError::AddonInstall {
            addon: addon.to_string(),
            output: format!("{e:#}"),
        })?;

    if output.success {
        return Ok(());
    }

    let combined = output.combined();
    warn!("ddev add-on get {} failed: {}", addon, combined);
    Err(PlatformshError::AddonInstall {
        addon: addon.to_string(),
        output: combined.chars().take(200).collect(),
    })
}
