//! # Error Handling Tests
//!
//! Verifies that each failure stops the run at the right stage, with the
//! right exit code, and without damaging files the user owns.

mod common;

use common::{capturing_reporter, ddev_env, php_mariadb_project, write, RecordingRunner};
use ddev_platformsh::constants::{
    EXIT_DATABASE_MISMATCH, EXIT_MISSING_FILE, EXIT_UNSUPPORTED_APP, EXIT_VALIDATION,
    EXIT_WRITE_REFUSED,
};
use ddev_platformsh::file_ops::FileWriter;
use ddev_platformsh::{
    Orchestrator, PlatformshError, RunOptions, RunSummary, Stage, StageFailure, ValidationIssue,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn run_with(options: RunOptions, runner: &RecordingRunner) -> Result<RunSummary, StageFailure> {
    let (mut reporter, _, _) = capturing_reporter();
    Orchestrator::new(options, ddev_env(), runner, &mut reporter).run()
}

fn run(root: &Path) -> Result<RunSummary, StageFailure> {
    run_with(RunOptions::new(root), &RecordingRunner::new())
}

mod missing_and_invalid_input {
    use super::*;

    #[test]
    fn test_missing_app_config() {
        let dir = TempDir::new().unwrap();
        let failure = run(dir.path()).unwrap_err();

        assert_eq!(failure.stage, Stage::Load);
        assert_eq!(failure.exit_code(), EXIT_MISSING_FILE);
        assert!(!dir.path().join(".ddev").exists());
    }

    #[test]
    fn test_malformed_yaml_is_a_validation_failure() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".platform.app.yaml", "name: app\ntype: [unclosed\n");

        let failure = run(dir.path()).unwrap_err();
        assert_eq!(failure.stage, Stage::ValidateFiles);
        assert_eq!(failure.exit_code(), EXIT_VALIDATION);
    }

    #[test]
    fn test_missing_service_reported_exactly_once() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            ".platform.app.yaml",
            "name: app\ntype: 'php:8.1'\nrelationships:\n  database: 'db:mysql'\n",
        );

        let failure = run(dir.path()).unwrap_err();
        assert_eq!(failure.stage, Stage::ValidateSchema);
        assert_eq!(failure.exit_code(), EXIT_VALIDATION);
        match failure.error {
            PlatformshError::Validation(issues) => assert_eq!(
                issues,
                vec![ValidationIssue::UnknownService {
                    relationship: "database".to_string(),
                    service: "db".to_string(),
                }]
            ),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_all_schema_problems_batched() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            ".platform.app.yaml",
            "relationships:\n  queue: 'mq:rabbitmq'\n",
        );
        write(dir.path(), ".platform/services.yaml", "mq:\n  type: 'rabbitmq:3.9'\n");

        let (mut reporter, _, err) = capturing_reporter();
        let runner = RecordingRunner::new();
        let failure =
            Orchestrator::new(RunOptions::new(dir.path()), ddev_env(), &runner, &mut reporter)
                .run()
                .unwrap_err();
        assert!(err.text().contains("❌ Failed: Validating configuration schema"));
        let PlatformshError::Validation(issues) = failure.error else {
            panic!("expected validation error");
        };
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0], ValidationIssue::MissingField("type"));
    }

    #[test]
    fn test_non_php_application_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".platform.app.yaml", "name: app\ntype: 'nodejs:18'\n");

        let failure = run(dir.path()).unwrap_err();
        assert_eq!(failure.stage, Stage::CheckAppType);
        assert_eq!(failure.exit_code(), EXIT_UNSUPPORTED_APP);
        assert!(matches!(
            failure.error,
            PlatformshError::UnsupportedAppType(ref t) if t == "nodejs:18"
        ));
    }
}

mod database_compatibility {
    use super::*;

    #[test]
    fn test_mismatch_aborts_before_writing() {
        let dir = TempDir::new().unwrap();
        php_mariadb_project(dir.path());
        let runner = RecordingRunner::new().reply(
            "debug get-volume-db-version",
            true,
            "\u{1b}[32mmysql:8.0\u{1b}[0m\n",
        );

        let failure = run_with(RunOptions::new(dir.path()), &runner).unwrap_err();
        assert_eq!(failure.stage, Stage::CheckDbCompatibility);
        assert_eq!(failure.exit_code(), EXIT_DATABASE_MISMATCH);
        match &failure.error {
            PlatformshError::DatabaseVersionMismatch {
                expected,
                found,
                message,
            } => {
                assert_eq!(expected, "mariadb:10.4");
                assert_eq!(found, "mysql:8.0");
                assert!(message.contains("ddev debug migrate-database mariadb:10.4"));
            }
            other => panic!("expected database mismatch, got {other:?}"),
        }
        assert!(!dir.path().join(".ddev/config.platformsh.yaml").exists());
    }

    #[test]
    fn test_force_db_reset_continues_with_warning() {
        let dir = TempDir::new().unwrap();
        php_mariadb_project(dir.path());
        let mut options = RunOptions::new(dir.path());
        options.force_db_reset = true;
        options.current_db_version = Some("postgres:14".to_string());

        let runner = RecordingRunner::new();
        let summary = run_with(options, &runner).unwrap();

        assert!(summary.warnings.iter().any(|w| w.contains("--force-db-reset")));
        assert!(runner.calls().iter().all(|c| !c.contains("get-volume-db-version")));
        assert!(dir.path().join(".ddev/config.platformsh.yaml").exists());
    }

    #[test]
    fn test_matching_database_passes() {
        let dir = TempDir::new().unwrap();
        php_mariadb_project(dir.path());
        let mut options = RunOptions::new(dir.path());
        options.current_db_version = Some("mariadb:10.4".to_string());

        assert!(run_with(options, &RecordingRunner::new()).is_ok());
    }
}

mod destructive_writes {
    use super::*;

    #[test]
    fn test_user_owned_config_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        php_mariadb_project(dir.path());
        write(dir.path(), ".ddev/config.platformsh.yaml", "php_version: \"7.4\"\n");

        let failure = run(dir.path()).unwrap_err();
        assert_eq!(failure.stage, Stage::WriteConfig);
        assert_eq!(failure.exit_code(), EXIT_WRITE_REFUSED);
        assert_eq!(
            fs::read_to_string(dir.path().join(".ddev/config.platformsh.yaml")).unwrap(),
            "php_version: \"7.4\"\n"
        );
    }

    #[test]
    fn test_refused_write_logged_as_critical() {
        let dir = TempDir::new().unwrap();
        php_mariadb_project(dir.path());
        write(dir.path(), ".ddev/config.platformsh.yaml", "php_version: \"7.4\"\n");

        let (mut reporter, _, err) = capturing_reporter();
        let runner = RecordingRunner::new();
        let failure =
            Orchestrator::new(RunOptions::new(dir.path()), ddev_env(), &runner, &mut reporter)
                .run()
                .unwrap_err();

        assert_eq!(failure.stage, Stage::WriteConfig);
        assert!(err.text().contains("🚨 Aborted: Writing DDEV configuration"));
        assert!(reporter
            .troubleshooting_report()
            .contains("1. [CRITICAL] Aborted: Writing DDEV configuration"));
    }

    #[test]
    fn test_guard_checked_before_any_write() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            ".platform.app.yaml",
            "name: app\ntype: 'php:8.1'\ndependencies:\n  php:\n    drush/drush: '^11'\n",
        );
        write(dir.path(), ".ddev/config.platformsh.yaml", "#ddev-generated\nold: true\n");
        write(dir.path(), ".ddev/web-build/Dockerfile.platformsh", "FROM custom\n");

        let failure = run(dir.path()).unwrap_err();
        assert_eq!(failure.exit_code(), EXIT_WRITE_REFUSED);
        assert_eq!(
            fs::read_to_string(dir.path().join(".ddev/config.platformsh.yaml")).unwrap(),
            "#ddev-generated\nold: true\n"
        );
    }

    #[test]
    fn test_interrupted_write_leaves_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.platformsh.yaml");
        fs::write(&path, "#ddev-generated\nprevious\n").unwrap();

        let staged =
            ddev_platformsh::file_ops::StagedWrite::new(&path, "#ddev-generated\nnext\n", 0o644)
                .unwrap();
        drop(staged);

        assert_eq!(fs::read_to_string(&path).unwrap(), "#ddev-generated\nprevious\n");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_failed_run_restores_backups() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a.yaml");
        let second = dir.path().join("missing-dir/b.yaml");
        fs::write(&first, "#ddev-generated\nold\n").unwrap();

        let mut writer = FileWriter::new(false);
        writer.write_with_backup(&first, "#ddev-generated\nnew\n").unwrap();
        assert!(writer.write_with_backup(&second, "x").is_err());

        assert_eq!(writer.restore_all(), vec![first.clone()]);
        assert_eq!(fs::read_to_string(&first).unwrap(), "#ddev-generated\nold\n");
    }
}

#[test]
fn test_every_error_has_remediation() {
    let errors = [
        PlatformshError::MissingFile {
            path: ".platform.app.yaml".into(),
        },
        PlatformshError::UnsupportedAppType("nodejs:18".to_string()),
        PlatformshError::DestructiveWriteRefused {
            path: ".ddev/config.platformsh.yaml".into(),
        },
    ];
    for error in errors {
        assert!(!error.remediation().is_empty(), "{error}");
    }
}
