//! Shared fixtures for the integration tests
//!
//! Provides a recording fake for the `ddev` CLI, helpers that lay out a
//! Platform.sh project in a temp directory, and a capturing reporter.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use anyhow::Result;
use ddev_platformsh::{CommandOutput, CommandRunner, DdevEnvironment, Reporter};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

/// Fake `ddev` that records every call and answers from a script
#[derive(Default)]
pub struct RecordingRunner {
    /// Replies keyed by the joined argument list, e.g. `debug get-volume-db-version`
    replies: HashMap<String, CommandOutput>,
    pub calls: RefCell<Vec<String>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, args: &str, success: bool, stdout: &str) -> Self {
        self.replies.insert(
            args.to_string(),
            CommandOutput {
                success,
                code: Some(if success { 0 } else { 1 }),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, program: &str, args: &[&str], _cwd: Option<&Path>) -> Result<CommandOutput> {
        let joined = args.join(" ");
        self.calls.borrow_mut().push(format!("{program} {joined}"));
        Ok(self.replies.get(&joined).cloned().unwrap_or(CommandOutput {
            success: true,
            code: Some(0),
            ..CommandOutput::default()
        }))
    }
}

/// Write `content` to `root/rel`, creating parent directories
pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A minimal PHP project with one MariaDB relationship
pub fn php_mariadb_project(root: &Path) {
    write(
        root,
        ".platform.app.yaml",
        "name: app\ntype: 'php:8.1'\nrelationships:\n  database: 'db:mysql'\n",
    );
    write(root, ".platform/services.yaml", "db:\n  type: 'mariadb:10.4'\n");
}

pub fn ddev_env() -> DdevEnvironment {
    DdevEnvironment::from_lookup(|key| match key {
        "DDEV_PROJECT" => Some("mysite".to_string()),
        "DDEV_PRIMARY_URL" => Some("https://mysite.ddev.site".to_string()),
        "DDEV_DOCROOT" => Some("web".to_string()),
        _ => None,
    })
}

/// In-memory sink that can be read back after the reporter is done
#[derive(Clone, Default)]
pub struct Buffer(Rc<RefCell<Vec<u8>>>);

impl Buffer {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reporter writing into buffers: (reporter, stdout, stderr)
pub fn capturing_reporter() -> (Reporter, Buffer, Buffer) {
    let out = Buffer::default();
    let err = Buffer::default();
    let reporter = Reporter::with_sinks(false, Box::new(out.clone()), Box::new(err.clone()));
    (reporter, out, err)
}

/// `KEY=VALUE` entries of `web_environment` in a rendered config
pub fn web_environment(config_yaml: &str) -> Vec<(String, String)> {
    let value: serde_yaml::Value = serde_yaml::from_str(config_yaml).unwrap();
    value["web_environment"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter_map(|entry| entry.as_str())
        .filter_map(|entry| entry.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn env_value(config_yaml: &str, key: &str) -> Option<String> {
    web_environment(config_yaml)
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}
