//! # Orchestrator
//!
//! Runs a translation as a fixed sequence of stages:
//!
//! ```text
//! Load → ValidateFiles → ValidateSchema → CheckAppType → CheckDbCompatibility
//!      → ResolveAddons → InstallAddons → GenerateConfig → WriteConfig → Summarize
//! ```
//!
//! Each stage either advances or aborts the run with a [`StageFailure`] whose
//! exit code identifies the reason. Add-on installation failures are warnings.

use crate::config::DdevEnvironment;
use crate::constants::{
    COMPOSE_SERVICES_FILE, DDEV_CONFIG_FILE, DOCKERFILE_FILE, ENTRYPOINT_ENVIRONMENT_FILE,
};
use crate::ddev::project_files::laravel_env;
use crate::ddev::{
    build_ddev_config, current_database_version, install_addon, render_compose_services,
    render_dockerfile, DdevConfig, PlatformVariables,
};
use crate::encoding::{
    build_relationships, build_routes, encode_relationships, encode_routes,
    generate_project_entropy, Relationships, Routes,
};
use crate::error::PlatformshError;
use crate::file_ops::FileWriter;
use crate::mapping::{
    check_compatibility, resolve_databases, resolve_services, ResolvedDatabase, ServiceResolution,
};
use crate::platform::{load_project, PlatformProject, ProjectFiles};
use crate::process::CommandRunner;
use crate::report::Reporter;
use crate::validation::{collect_warnings, service_definitions, validate_schema};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    ValidateFiles,
    ValidateSchema,
    CheckAppType,
    CheckDbCompatibility,
    ResolveAddons,
    InstallAddons,
    GenerateConfig,
    WriteConfig,
    Summarize,
}

impl Stage {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Stage::Load => "Loading Platform.sh configuration",
            Stage::ValidateFiles => "Validating configuration files",
            Stage::ValidateSchema => "Validating configuration schema",
            Stage::CheckAppType => "Checking application type",
            Stage::CheckDbCompatibility => "Checking database compatibility",
            Stage::ResolveAddons => "Resolving DDEV add-ons",
            Stage::InstallAddons => "Installing DDEV add-ons",
            Stage::GenerateConfig => "Generating DDEV configuration",
            Stage::WriteConfig => "Writing DDEV configuration",
            Stage::Summarize => "Summarizing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How non-database services are provided
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceContainerMode {
    /// Install the matching DDEV add-ons
    #[default]
    Addons,
    /// Write docker-compose.platformsh-services.yaml
    Compose,
}

/// Options for one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub app_root: PathBuf,
    pub ddev_dir: PathBuf,
    pub dry_run: bool,
    pub force_db_reset: bool,
    pub skip_addons: bool,
    /// Overrides the `ddev debug get-volume-db-version` lookup
    pub current_db_version: Option<String>,
    pub service_containers: ServiceContainerMode,
}

impl RunOptions {
    /// Defaults for a project at `app_root` with its `.ddev` directory
    #[must_use]
    pub fn new(app_root: &Path) -> Self {
        Self {
            app_root: app_root.to_path_buf(),
            ddev_dir: app_root.join(".ddev"),
            dry_run: false,
            force_db_reset: false,
            skip_addons: false,
            current_db_version: None,
            service_containers: ServiceContainerMode::Addons,
        }
    }
}

/// A run that stopped at a stage
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub error: PlatformshError,
}

impl StageFailure {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.error.exit_code()
    }
}

/// What a successful run did
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub app_type: String,
    pub php_version: String,
    pub database: String,
    pub addons_installed: Vec<String>,
    pub addons_failed: Vec<String>,
    pub env_var_count: usize,
    pub hook_count: usize,
    pub files_written: Vec<PathBuf>,
    pub warnings: Vec<String>,
    pub dry_run: bool,
}

/// Resolved databases and services for a parsed project
#[derive(Debug, Clone)]
pub struct Translation {
    /// Never empty; the first entry is the primary database
    pub databases: Vec<ResolvedDatabase>,
    pub services: ServiceResolution,
}

impl Translation {
    #[must_use]
    pub fn from_project(project: &PlatformProject) -> Self {
        let relationships = project.relationships();
        let definitions = service_definitions(project);
        Self {
            databases: resolve_databases(&relationships, &definitions),
            services: resolve_services(&relationships, &definitions),
        }
    }

    #[must_use]
    pub fn primary_database(&self) -> &ResolvedDatabase {
        &self.databases[0]
    }

    #[must_use]
    pub fn relationships(&self) -> Relationships {
        build_relationships(&self.databases, &self.services.services)
    }
}

/// Relationships the project would expose, without writing anything
pub fn inspect_relationships(app_root: &Path) -> Result<Relationships, PlatformshError> {
    let project = load_project(app_root)?;
    Ok(Translation::from_project(&project).relationships())
}

/// Routes the project would expose, without writing anything
pub fn inspect_routes(app_root: &Path, env: &DdevEnvironment) -> Result<Routes, PlatformshError> {
    let project = load_project(app_root)?;
    Ok(build_routes(&project.routes, env.primary_host()))
}

/// Generated file contents, before anything is written
#[derive(Debug, Clone)]
struct GeneratedFiles {
    config: DdevConfig,
    rendered_config: String,
    compose: Option<String>,
    dockerfile: Option<String>,
}

pub struct Orchestrator<'a> {
    options: RunOptions,
    env: DdevEnvironment,
    runner: &'a dyn CommandRunner,
    reporter: &'a mut Reporter,
}

impl fmt::Debug for Orchestrator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("options", &self.options)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        options: RunOptions,
        env: DdevEnvironment,
        runner: &'a dyn CommandRunner,
        reporter: &'a mut Reporter,
    ) -> Self {
        Self {
            options,
            env,
            runner,
            reporter,
        }
    }

    fn stage<T>(
        &mut self,
        stage: Stage,
        f: impl FnOnce(&mut Self) -> Result<T, PlatformshError>,
    ) -> Result<T, StageFailure> {
        debug!(stage = ?stage, "Entering stage");
        self.reporter.start_operation(stage.label());
        match f(self) {
            Ok(value) => {
                self.reporter.complete_operation(stage.label());
                Ok(value)
            }
            Err(error) => {
                if error.is_critical() {
                    self.reporter.abort_operation(stage.label(), &error.to_string());
                } else {
                    self.reporter.fail_operation(stage.label(), &error.to_string());
                }
                if let PlatformshError::Validation(issues) = &error {
                    for issue in issues {
                        self.reporter.error(&format!("  - {issue}"));
                    }
                }
                Err(StageFailure { stage, error })
            }
        }
    }

    /// Run every stage in order
    pub fn run(&mut self) -> Result<RunSummary, StageFailure> {
        let app_root = self.options.app_root.clone();
        let mut summary = RunSummary {
            dry_run: self.options.dry_run,
            ..RunSummary::default()
        };

        let files = self.stage(Stage::Load, |_| ProjectFiles::read(&app_root))?;
        let project = self.stage(Stage::ValidateFiles, |_| files.parse())?;

        let translation = self.stage(Stage::ValidateSchema, |this| {
            let issues = validate_schema(&project);
            if !issues.is_empty() {
                return Err(PlatformshError::Validation(issues));
            }
            let translation = Translation::from_project(&project);
            for warning in collect_warnings(&project, &translation.databases) {
                this.reporter.warning(&warning);
                summary.warnings.push(warning);
            }
            Ok(translation)
        })?;

        self.stage(Stage::CheckAppType, |_| {
            if project.is_php() {
                Ok(())
            } else {
                Err(PlatformshError::UnsupportedAppType(project.app_type().to_string()))
            }
        })?;
        summary.app_type = project.app_type().to_string();

        let primary = translation.primary_database().clone();
        summary.database = primary.ddev_type_version();
        self.stage(Stage::CheckDbCompatibility, |this| {
            this.check_database(&primary, &mut summary.warnings)
        })?;

        let addons = self.stage(Stage::ResolveAddons, |this| {
            let addons = match this.options.service_containers {
                ServiceContainerMode::Addons => translation.services.required_addons(),
                ServiceContainerMode::Compose => Vec::new(),
            };
            if addons.is_empty() {
                this.reporter.info("No additional DDEV add-ons required");
            }
            Ok(addons)
        })?;

        self.stage(Stage::InstallAddons, |this| {
            this.install_addons(&addons, &mut summary);
            Ok(())
        })?;

        let generated = self.stage(Stage::GenerateConfig, |this| {
            this.generate(&project, &translation)
        })?;
        summary.php_version = generated.config.php_version.clone();
        summary.env_var_count = generated.config.web_environment.len();
        summary.hook_count = generated.config.post_start.len();

        summary.files_written = self.stage(Stage::WriteConfig, |this| {
            this.write(&project, &generated)
        })?;

        self.stage(Stage::Summarize, |this| {
            this.print_summary(&summary);
            Ok(())
        })?;

        info!(app_root = %app_root.display(), "Platform.sh translation completed");
        Ok(summary)
    }

    fn check_database(
        &mut self,
        primary: &ResolvedDatabase,
        warnings: &mut Vec<String>,
    ) -> Result<(), PlatformshError> {
        let current = self
            .options
            .current_db_version
            .clone()
            .or_else(|| current_database_version(self.runner, &self.options.app_root));

        let result = check_compatibility(
            current.as_deref(),
            &primary.ddev_type,
            &primary.ddev_version,
        );
        if result.compatible {
            self.reporter
                .info(&format!("Database compatible: {}", result.expected_version));
            return Ok(());
        }

        if self.options.force_db_reset {
            let warning = format!(
                "Continuing despite database mismatch (--force-db-reset): {}",
                result.message
            );
            self.reporter.warning(&warning);
            warnings.push(warning);
            return Ok(());
        }

        Err(PlatformshError::DatabaseVersionMismatch {
            expected: result.expected_version,
            found: result.current_version.unwrap_or_default(),
            message: result.message,
        })
    }

    fn install_addons(&mut self, addons: &[String], summary: &mut RunSummary) {
        if addons.is_empty() {
            return;
        }
        if self.options.skip_addons {
            self.reporter
                .info(&format!("Skipping add-on installation: {}", addons.join(", ")));
            return;
        }
        if self.options.dry_run {
            for addon in addons {
                self.reporter
                    .info(&format!("[DRY RUN] Would run 'ddev add-on get {addon}'"));
            }
            return;
        }

        for addon in addons {
            self.reporter.info(&format!("📦 Installing {addon}..."));
            match install_addon(self.runner, addon, &self.options.app_root) {
                Ok(()) => {
                    self.reporter.info(&format!("{addon} installed successfully"));
                    summary.addons_installed.push(addon.clone());
                }
                Err(e) => {
                    let warning = format!("{addon} installation may have issues: {e}");
                    self.reporter.warning(&warning);
                    summary.warnings.push(warning);
                    summary.addons_failed.push(addon.clone());
                }
            }
        }
    }

    fn generate(
        &mut self,
        project: &PlatformProject,
        translation: &Translation,
    ) -> Result<GeneratedFiles, PlatformshError> {
        let services = &translation.services.services;
        let variables = PlatformVariables {
            relationships: encode_relationships(&translation.databases, services)?,
            routes: encode_routes(&project.routes, self.env.primary_host())?,
            entropy: generate_project_entropy(),
        };

        let config = build_ddev_config(
            project,
            &self.env,
            translation.primary_database(),
            &variables,
        );
        let compose = match self.options.service_containers {
            ServiceContainerMode::Compose => render_compose_services(services),
            ServiceContainerMode::Addons => None,
        };
        let dockerfile = render_dockerfile(&project.app.dependencies.php_packages());

        self.reporter.info(&format!("PHP version: {}", config.php_version));
        self.reporter
            .info(&format!("Composer version: {}", config.composer_version));
        self.reporter.info(&format!(
            "Database: {}:{}",
            config.database.db_type, config.database.version
        ));
        self.reporter.info(&format!("Document root: {}", config.docroot));

        Ok(GeneratedFiles {
            rendered_config: config.render(),
            config,
            compose,
            dockerfile,
        })
    }

    fn write(
        &mut self,
        project: &PlatformProject,
        generated: &GeneratedFiles,
    ) -> Result<Vec<PathBuf>, PlatformshError> {
        let ddev_dir = self.options.ddev_dir.clone();
        let mut targets = vec![(
            ddev_dir.join(DDEV_CONFIG_FILE),
            generated.rendered_config.as_str(),
        )];
        if let Some(compose) = &generated.compose {
            targets.push((ddev_dir.join(COMPOSE_SERVICES_FILE), compose.as_str()));
        }
        if let Some(dockerfile) = &generated.dockerfile {
            targets.push((ddev_dir.join(DOCKERFILE_FILE), dockerfile.as_str()));
        }

        // Check every guarded target before touching any of them
        for (path, _) in &targets {
            FileWriter::ensure_overwritable(path)?;
        }

        let mut writer = FileWriter::new(self.options.dry_run);
        let result = self.write_all(&mut writer, project, &targets);
        if let Err(e) = result {
            let restored = writer.restore_all();
            if !restored.is_empty() {
                self.reporter.warning(&format!(
                    "Restored {} file(s) from backup after a failed write",
                    restored.len()
                ));
            }
            return Err(e);
        }

        for (path, backup) in writer.backups() {
            self.reporter.debug(&format!(
                "Backup of {} kept at {}",
                path.display(),
                backup.display()
            ));
        }
        Ok(writer.written().to_vec())
    }

    fn write_all(
        &mut self,
        writer: &mut FileWriter,
        project: &PlatformProject,
        targets: &[(PathBuf, &str)],
    ) -> Result<(), PlatformshError> {
        for (path, content) in targets {
            if let Some(parent) = path.parent() {
                writer.ensure_dir(parent)?;
            }
            writer.write_with_backup(path, content)?;
            self.reporter.info(&format!(
                "{} written ({} bytes)",
                path.display(),
                content.len()
            ));
        }

        if let Some(script) = &project.environment_script {
            let destination = self.options.ddev_dir.join(ENTRYPOINT_ENVIRONMENT_FILE);
            if let Some(parent) = destination.parent() {
                writer.ensure_dir(parent)?;
            }
            writer.copy_file(script, &destination)?;
            self.reporter
                .info("🌍 Platform.sh .environment file copied to web-entrypoint.d/");
        }

        let app_root = self.options.app_root.clone();
        if self.env.project_type == "laravel" {
            let example = app_root.join(".env.example");
            let dotenv = app_root.join(".env");
            if example.is_file() && !dotenv.exists() {
                let content = std::fs::read_to_string(&example).map_err(|source| {
                    PlatformshError::Io {
                        path: example.clone(),
                        source,
                    }
                })?;
                writer.write_atomic(&dotenv, &laravel_env(&content, &self.env.primary_url))?;
                self.reporter.info("Laravel .env file created from .env.example");
            }
        }

        if app_root.join("drush").is_dir() && !app_root.join(".drush").is_dir() {
            writer.ensure_dir(&app_root.join(".drush"))?;
            self.reporter.info("🔷 Created .drush directory for Drupal");
        }

        for action in writer.planned() {
            debug!("Planned: {}", action);
        }
        Ok(())
    }

    fn print_summary(&mut self, summary: &RunSummary) {
        let reporter = &mut *self.reporter;
        reporter.print("");
        if summary.dry_run {
            reporter.print("🧪 Dry run: no files were changed");
        }
        reporter.print("🎉 Platform.sh to DDEV configuration completed successfully!");
        reporter.print("");
        reporter.print("📋 Summary:");
        reporter.print(&format!("   • Application: {}", summary.app_type));
        reporter.print(&format!("   • PHP version: {}", summary.php_version));
        reporter.print(&format!("   • Database: {}", summary.database));
        reporter.print(&format!(
            "   • Services: {} add-ons installed",
            summary.addons_installed.len()
        ));
        if !summary.addons_failed.is_empty() {
            reporter.print(&format!(
                "   • Add-ons to install manually: {}",
                summary.addons_failed.join(", ")
            ));
        }
        reporter.print(&format!(
            "   • Environment variables: {}",
            summary.env_var_count
        ));
        reporter.print(&format!(
            "   • Hooks: {} post-start actions",
            summary.hook_count
        ));
        for path in &summary.files_written {
            reporter.print(&format!("   • Wrote {}", path.display()));
        }
        reporter.print("");
        reporter.print("✨ Next steps:");
        reporter.print("   1. Run 'ddev start' to apply the new configuration");
        reporter.print("   2. Run 'ddev launch' to open your application");
        reporter.print("   3. Use 'ddev exec env | grep PLATFORM' to see Platform.sh variables");
    }
}
