//! # External Processes
//!
//! Thin interface over the external CLIs the translator calls (`ddev`).
//!
//! Components receive a [`CommandRunner`] instead of spawning processes
//! themselves so tests can substitute a recording fake.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stdout and stderr joined, for error messages
    #[must_use]
    pub fn combined(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }
}

/// Runs a program to completion and captures its output
pub trait CommandRunner {
    /// Fails only when the program cannot be started; a non-zero exit is
    /// reported through [`CommandOutput::success`]
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput>;
}

/// Spawns real processes with [`std::process::Command`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput> {
        debug!("Running {} {}", program, args.join(" "));

        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .with_context(|| format!("Failed to execute {program}"))?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
