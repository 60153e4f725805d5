//! # Web Image Build
//!
//! Renders `web-build/Dockerfile.platformsh` for global Composer packages
//! listed under `dependencies.php`.

use crate::constants::GENERATED_MARKER;
use std::fmt::Write as _;

/// Dockerfile content, or `None` when only Composer itself is listed
#[must_use]
pub fn render_dockerfile(packages: &[(String, String)]) -> Option<String> {
    let globals: Vec<&(String, String)> = packages
        .iter()
        .filter(|(name, _)| name != "composer/composer")
        .collect();
    if globals.is_empty() {
        return None;
    }

    let mut content = format!("{GENERATED_MARKER}\nRUN ln -sf /var/www/html /app\n");
    content.push_str("\n# Install PHP dependencies from Platform.sh configuration\n");
    content.push_str("ENV COMPOSER_HOME=/usr/local/composer\n");
    content.push_str(
        "RUN echo \"export PATH=${PATH}:${COMPOSER_HOME}/vendor/bin\" >/etc/bashrc/composerpath.bashrc\n",
    );
    for (name, version) in globals {
        let constraint = match version.trim() {
            "" | "*" => String::new(),
            v => format!(":{v}"),
        };
        let _ = writeln!(content, "RUN composer global require {name}{constraint}");
    }
    Some(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkgs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_only_composer_needs_no_dockerfile() {
        assert!(render_dockerfile(&pkgs(&[("composer/composer", "^2")])).is_none());
        assert!(render_dockerfile(&[]).is_none());
    }

    #[test]
    fn test_global_requires() {
        let content = render_dockerfile(&pkgs(&[
            ("composer/composer", "^2"),
            ("drush/drush", "*"),
            ("platformsh/client", "2.x-dev"),
        ]))
        .unwrap();

        assert!(content.starts_with("#ddev-generated\nRUN ln -sf /var/www/html /app\n"));
        assert!(content.contains("ENV COMPOSER_HOME=/usr/local/composer\n"));
        assert!(content.contains("RUN composer global require drush/drush\n"));
        assert!(content.contains("RUN composer global require platformsh/client:2.x-dev\n"));
        assert!(!content.contains("composer/composer"));
    }
}
