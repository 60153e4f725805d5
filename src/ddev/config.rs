//! # DDEV Config
//!
//! Builds `config.platformsh.yaml`, the DDEV override config derived from the
//! Platform.sh application.

use crate::config::DdevEnvironment;
use crate::constants::{
    DEFAULT_COMPOSER_VERSION, DEFAULT_PHP_VERSION, GENERATED_DESCRIPTION, GENERATED_MARKER,
    PLATFORM_APP_DIR, PLATFORM_TREE_ID, PLATFORM_VARIABLES_EMPTY,
};
use crate::ddev::yaml::{render, YamlNode};
use crate::mapping::ResolvedDatabase;
use crate::platform::{scalar_to_string, PlatformProject};
use regex::Regex;
use std::sync::LazyLock;

static BLANK_LINE_RUNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\n+").expect("Failed to compile blank line regex - this should never happen")
});

/// Extensions DDEV provides differently or not at all as apt packages
const EXCLUDED_EXTENSIONS: [&str; 3] = ["blackfire", "pdo_pgsql", "sodium"];

const SSH_CERT_STEP: &str =
    r#"[ ! -z "${PLATFORMSH_CLI_TOKEN:-}" ] && (platform ssh-cert:load -y || true)"#;
const CACHE_DIR_STEP: &str = "mkdir -p ${PLATFORM_CACHE_DIR} || true";

/// One `hooks.post-start` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookStep {
    Exec(String),
    Composer(String),
}

impl HookStep {
    fn to_node(&self) -> YamlNode {
        match self {
            HookStep::Exec(cmd) => YamlNode::map([("exec", YamlNode::plain(cmd))]),
            HookStep::Composer(cmd) => YamlNode::map([("composer", YamlNode::plain(cmd))]),
        }
    }
}

/// The `database:` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSection {
    pub db_type: String,
    pub version: String,
}

/// Encoded values computed before the config is assembled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformVariables {
    pub relationships: String,
    pub routes: String,
    pub entropy: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdevConfig {
    pub php_version: String,
    pub composer_version: String,
    pub database: DatabaseSection,
    pub docroot: String,
    pub webimage_extra_packages: Vec<String>,
    /// `(KEY, VALUE)` pairs rendered as `KEY=VALUE`
    pub web_environment: Vec<(String, String)>,
    pub post_start: Vec<HookStep>,
}

impl DdevConfig {
    /// Value of a `web_environment` entry
    #[must_use]
    pub fn env(&self, key: &str) -> Option<&str> {
        self.web_environment
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn to_yaml_node(&self) -> YamlNode {
        let mut pairs = vec![
            ("disable_settings_management".to_string(), YamlNode::Bool(true)),
            ("php_version".to_string(), YamlNode::plain(&self.php_version)),
            (
                "composer_version".to_string(),
                YamlNode::quoted(&self.composer_version),
            ),
            (
                "database".to_string(),
                YamlNode::map([
                    ("type", YamlNode::plain(&self.database.db_type)),
                    ("version", YamlNode::quoted(&self.database.version)),
                ]),
            ),
            ("docroot".to_string(), YamlNode::plain(&self.docroot)),
        ];

        if !self.webimage_extra_packages.is_empty() {
            pairs.push((
                "webimage_extra_packages".to_string(),
                YamlNode::Seq(
                    self.webimage_extra_packages
                        .iter()
                        .map(YamlNode::plain)
                        .collect(),
                ),
            ));
        }

        pairs.push((
            "web_environment".to_string(),
            YamlNode::Seq(
                self.web_environment
                    .iter()
                    .map(|(k, v)| YamlNode::plain(format!("{k}={v}")))
                    .collect(),
            ),
        ));

        if !self.post_start.is_empty() {
            pairs.push((
                "hooks".to_string(),
                YamlNode::map([(
                    "post-start",
                    YamlNode::Seq(self.post_start.iter().map(HookStep::to_node).collect()),
                )]),
            ));
        }

        YamlNode::Map(pairs)
    }

    /// Full file content including the generated marker header
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{GENERATED_MARKER}\n{GENERATED_DESCRIPTION}\n{}",
            render(&self.to_yaml_node())
        )
    }
}

/// PHP version from the app type, `php:8.2` → `8.2`
#[must_use]
pub fn php_version(project: &PlatformProject) -> String {
    project
        .app
        .app_type
        .as_deref()
        .and_then(|t| t.strip_prefix("php:"))
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_PHP_VERSION)
        .to_string()
}

/// Composer major version from `dependencies.php["composer/composer"]`
#[must_use]
pub fn composer_version(project: &PlatformProject) -> String {
    project
        .app
        .dependencies
        .php_packages()
        .into_iter()
        .find(|(name, _)| name == "composer/composer")
        .map(|(_, version)| version.replace('^', ""))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_COMPOSER_VERSION.to_string())
}

/// Docroot from `web.locations["/"].root`, else DDEV's docroot
#[must_use]
pub fn docroot(project: &PlatformProject, env: &DdevEnvironment) -> String {
    project
        .app
        .web
        .locations
        .get("/")
        .and_then(|location| location.root.clone())
        .filter(|root| !root.is_empty())
        .unwrap_or_else(|| env.docroot.clone())
}

/// Extra apt packages for runtime extensions and python dependencies
#[must_use]
pub fn extra_packages(project: &PlatformProject, php_version: &str) -> Vec<String> {
    let runtime = &project.app.runtime;
    let mut packages = Vec::new();

    if !runtime.extensions.is_empty() {
        packages.push("figlet".to_string());
        packages.extend(
            runtime
                .extension_names()
                .filter(|ext| !EXCLUDED_EXTENSIONS.contains(ext))
                .map(|ext| format!("php{php_version}-{ext}")),
        );
        if runtime.has_extension("sodium") {
            packages.push("php-sodium".to_string());
        }
    }

    if !project.app.dependencies.python3.is_empty() {
        packages.push("python3-pip".to_string());
    }

    packages
}

/// Trim a hook script and collapse runs of empty lines
#[must_use]
pub fn normalize_hook(script: &str) -> String {
    BLANK_LINE_RUNS.replace_all(script.trim(), "\n").into_owned()
}

/// `hooks.post-start` steps; empty when the app defines no hook work
#[must_use]
pub fn post_start_hooks(project: &PlatformProject) -> Vec<HookStep> {
    let app = &project.app;
    let mut steps = Vec::new();

    if app.build.flavor.as_deref() == Some("composer") {
        steps.push(HookStep::Composer("install".to_string()));
    }
    steps.extend(app.hooks.scripts().map(|s| HookStep::Exec(normalize_hook(s))));
    if app.runtime.has_extension("blackfire") {
        steps.push(HookStep::Exec("phpenmod blackfire".to_string()));
    }

    if steps.is_empty() {
        return steps;
    }

    let mut hooks = vec![
        HookStep::Exec(CACHE_DIR_STEP.to_string()),
        HookStep::Exec(SSH_CERT_STEP.to_string()),
    ];
    hooks.extend(steps);
    hooks
}

/// `web_environment` pairs in the order Platform.sh applications expect
#[must_use]
pub fn web_environment(
    project: &PlatformProject,
    env: &DdevEnvironment,
    variables: &PlatformVariables,
) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = [
        ("PLATFORM_RELATIONSHIPS", variables.relationships.clone()),
        ("PLATFORM_APP_DIR", PLATFORM_APP_DIR.to_string()),
        ("PLATFORM_PROJECT_ENTROPY", variables.entropy.clone()),
        ("PLATFORM_TREE_ID", PLATFORM_TREE_ID.to_string()),
        ("PLATFORM_CACHE_DIR", env.cache_dir()),
        ("PLATFORM_ROUTES", variables.routes.clone()),
        ("PLATFORM_VARIABLES", PLATFORM_VARIABLES_EMPTY.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    pairs.extend(
        project
            .app
            .variables
            .env
            .iter()
            .map(|(k, v)| (k.clone(), scalar_to_string(v))),
    );
    pairs
}

/// Assemble the DDEV config for the primary database
#[must_use]
pub fn build_ddev_config(
    project: &PlatformProject,
    env: &DdevEnvironment,
    primary_database: &ResolvedDatabase,
    variables: &PlatformVariables,
) -> DdevConfig {
    let php_version = php_version(project);
    DdevConfig {
        composer_version: composer_version(project),
        database: DatabaseSection {
            db_type: primary_database.ddev_type.clone(),
            version: primary_database.ddev_version.clone(),
        },
        docroot: docroot(project, env),
        webimage_extra_packages: extra_packages(project, &php_version),
        web_environment: web_environment(project, env, variables),
        post_start: post_start_hooks(project),
        php_version,
    }
}
