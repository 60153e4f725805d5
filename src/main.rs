//! # platformsh-configure
//!
//! Command-line entry point run by the DDEV add-on's install action.
//!
//! ## Usage
//!
//! ```bash
//! # Translate the project in the current directory
//! platformsh-configure
//!
//! # Show what would change without writing anything
//! platformsh-configure configure --dry-run
//!
//! # Print the PLATFORM_RELATIONSHIPS value the project would get
//! platformsh-configure relationships
//!
//! # Decode a PLATFORM_ROUTES value copied from a container
//! platformsh-configure routes --blob "$PLATFORM_ROUTES"
//!
//! # Remove backups left by earlier runs
//! platformsh-configure cleanup-backups
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use ddev_platformsh::constants::{EXIT_SUCCESS, EXIT_UNCAUGHT};
use ddev_platformsh::encoding::{decode_relationships, decode_routes};
use ddev_platformsh::file_ops::remove_backups;
use ddev_platformsh::{
    inspect_relationships, inspect_routes, DdevEnvironment, Orchestrator, Reporter, RunOptions,
    ServiceContainerMode, SystemCommandRunner,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

/// Platform.sh to DDEV configuration translator
#[derive(Parser, Debug)]
#[command(name = "platformsh-configure")]
#[command(
    about = "Translate Platform.sh configuration into DDEV configuration",
    version,
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("BUILD_GIT_HASH"),
        ", built ",
        env!("BUILD_DATETIME"),
        ")"
    ),
    after_help = "\
Generated files (in the .ddev directory):
  config.platformsh.yaml
  docker-compose.platformsh-services.yaml (with --service-containers compose)
  web-build/Dockerfile.platformsh (when PHP composer packages are declared)
  web-entrypoint.d/environment.sh (when .environment exists)
"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Project root containing .platform.app.yaml
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    app_root: PathBuf,

    /// DDEV directory (defaults to <app-root>/.ddev)
    #[arg(long, global = true, value_name = "DIR")]
    ddev_dir: Option<PathBuf>,

    /// Verbose output and a debug log file in /tmp
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate the project and write DDEV configuration (default)
    Configure(ConfigureArgs),

    /// Print the PLATFORM_RELATIONSHIPS value as JSON
    Relationships {
        /// Decode this base64 value instead of reading the project
        #[arg(long, value_name = "BASE64")]
        blob: Option<String>,
    },

    /// Print the PLATFORM_ROUTES value as JSON
    Routes {
        /// Decode this base64 value instead of reading the project
        #[arg(long, value_name = "BASE64")]
        blob: Option<String>,
    },

    /// Remove backup files left by earlier runs
    CleanupBackups {
        /// List the backups without deleting them
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Debug, Default)]
struct ConfigureArgs {
    /// Report planned changes without touching the file system
    #[arg(long)]
    dry_run: bool,

    /// Continue even if the existing database does not match
    #[arg(long)]
    force_db_reset: bool,

    /// Do not run 'ddev add-on get'
    #[arg(long)]
    skip_addons: bool,

    /// Existing database as TYPE:VERSION instead of asking ddev
    #[arg(long, value_name = "TYPE:VERSION")]
    current_db_version: Option<String>,

    /// How caches and search services are provided
    #[arg(long, value_enum, default_value_t = ServiceContainerMode::Addons)]
    service_containers: ServiceContainerMode,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let env = DdevEnvironment::from_env();
    let debug = cli.debug || env.debug;
    let log_file = init_tracing(debug);

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Configure(ConfigureArgs::default()));
    let result = match command {
        Commands::Configure(args) => {
            configure(&cli.app_root, cli.ddev_dir, args, env, debug, log_file.clone())
        }
        Commands::Relationships { blob } => print_relationships(&cli.app_root, blob.as_deref()),
        Commands::Routes { blob } => print_routes(&cli.app_root, &env, blob.as_deref()),
        Commands::CleanupBackups { dry_run } => {
            let ddev_dir = cli.ddev_dir.unwrap_or_else(|| cli.app_root.join(".ddev"));
            cleanup_backups(&ddev_dir, dry_run)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            let mut reporter = Reporter::new(debug).with_log_file(log_file);
            eprint!("{}", reporter.uncaught(&e));
            exit_code(EXIT_UNCAUGHT)
        }
    }
}

/// Initialize tracing
///
/// In debug mode events go to a dated file in /tmp. Otherwise events only go
/// to stderr when `RUST_LOG` is set, so normal output stays clean.
fn init_tracing(debug: bool) -> Option<PathBuf> {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "ddev_platformsh=debug,platformsh_configure=debug".into())
    };

    if debug {
        let path = PathBuf::from(format!(
            "/tmp/ddev-platformsh-debug-{}.log",
            Local::now().format("%Y-%m-%d")
        ));
        match File::options().create(true).append(true).open(&path) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter())
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
                return Some(path);
            }
            Err(e) => eprintln!("⚠️  Could not open debug log {}: {e}", path.display()),
        }
    }

    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
    None
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn configure(
    app_root: &Path,
    ddev_dir: Option<PathBuf>,
    args: ConfigureArgs,
    env: DdevEnvironment,
    debug: bool,
    log_file: Option<PathBuf>,
) -> Result<ExitCode> {
    let mut options = RunOptions::new(app_root);
    if let Some(dir) = ddev_dir {
        options.ddev_dir = dir;
    }
    options.dry_run = args.dry_run;
    options.force_db_reset = args.force_db_reset;
    options.skip_addons = args.skip_addons;
    options.current_db_version = args.current_db_version;
    options.service_containers = args.service_containers;

    let mut reporter = Reporter::new(debug).with_log_file(log_file);
    reporter.print("🚀 Platform.sh to DDEV translation");
    if options.dry_run {
        reporter.print("🧪 Dry run mode: no files will be changed");
    }

    let runner = SystemCommandRunner;
    let result = Orchestrator::new(options, env, &runner, &mut reporter).run();

    match result {
        Ok(_) => Ok(exit_code(EXIT_SUCCESS)),
        Err(failure) => {
            let remediation = failure.error.remediation();
            if !remediation.is_empty() {
                eprintln!();
                eprintln!("💡 How to fix:");
                for step in remediation {
                    eprintln!("   - {step}");
                }
            }
            eprintln!();
            eprint!("{}", reporter.troubleshooting_report());
            Ok(exit_code(failure.exit_code()))
        }
    }
}

fn print_relationships(app_root: &Path, blob: Option<&str>) -> Result<ExitCode> {
    let relationships = match blob {
        Some(blob) => decode_relationships(blob)?,
        None => inspect_relationships(app_root)?,
    };
    let json =
        serde_json::to_string_pretty(&relationships).context("Failed to serialize relationships")?;
    println!("{json}");
    Ok(exit_code(EXIT_SUCCESS))
}

fn print_routes(app_root: &Path, env: &DdevEnvironment, blob: Option<&str>) -> Result<ExitCode> {
    let routes = match blob {
        Some(blob) => decode_routes(blob)?,
        None => inspect_routes(app_root, env)?,
    };
    let json = serde_json::to_string_pretty(&routes).context("Failed to serialize routes")?;
    println!("{json}");
    Ok(exit_code(EXIT_SUCCESS))
}

fn cleanup_backups(ddev_dir: &Path, dry_run: bool) -> Result<ExitCode> {
    let backups = remove_backups(ddev_dir, dry_run)?;
    if backups.is_empty() {
        println!("✅ No backup files found in {}", ddev_dir.display());
        return Ok(exit_code(EXIT_SUCCESS));
    }

    let verb = if dry_run { "Would remove" } else { "Removed" };
    for backup in &backups {
        println!("🗑️  {verb} {}", backup.display());
    }
    println!("✅ {verb} {} backup file(s)", backups.len());
    Ok(exit_code(EXIT_SUCCESS))
}
