//! # Reporter
//!
//! User-facing progress output for a translation run.
//!
//! The reporter is passed explicitly to every stage. It prints emoji-tagged
//! lines (errors to stderr, everything else to stdout), keeps every entry for
//! the troubleshooting report, and mirrors each entry as a `tracing` event.
//! Sinks are injectable so tests can capture output.

use chrono::{DateTime, Local};
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            Level::Debug => "🐛",
            Level::Info => "ℹ️",
            Level::Warning => "⚠️",
            Level::Error => "❌",
            Level::Critical => "🚨",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A recorded message
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    /// Message with `{key}` placeholders already filled in
    pub message: String,
    pub context: Vec<(String, String)>,
}

/// Explicit logging handle for one run
pub struct Reporter {
    debug: bool,
    min_level: Level,
    entries: Vec<LogEntry>,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    log_file: Option<PathBuf>,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("debug", &self.debug)
            .field("min_level", &self.min_level)
            .field("entries", &self.entries.len())
            .field("log_file", &self.log_file)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    /// Reporter printing to the process stdout and stderr
    #[must_use]
    pub fn new(debug: bool) -> Self {
        Self::with_sinks(debug, Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Reporter printing to the given sinks
    #[must_use]
    pub fn with_sinks(debug: bool, out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self {
            debug,
            min_level: if debug { Level::Debug } else { Level::Info },
            entries: Vec::new(),
            out,
            err,
            log_file: None,
        }
    }

    /// Record where the debug log is written, for the troubleshooting report
    #[must_use]
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    pub fn debug(&mut self, message: &str) {
        self.log(Level::Debug, message, &[]);
    }

    pub fn info(&mut self, message: &str) {
        self.log(Level::Info, message, &[]);
    }

    pub fn warning(&mut self, message: &str) {
        self.log(Level::Warning, message, &[]);
    }

    pub fn error(&mut self, message: &str) {
        self.log(Level::Error, message, &[]);
    }

    pub fn critical(&mut self, message: &str) {
        self.log(Level::Critical, message, &[]);
    }

    /// Record and print a message, filling `{key}` placeholders from `context`
    pub fn log(&mut self, level: Level, message: &str, context: &[(&str, &str)]) {
        if level < self.min_level {
            return;
        }

        let message = interpolate(message, context);
        let entry = LogEntry {
            timestamp: Local::now(),
            level,
            message,
            context: context
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        };

        mirror(&entry);

        let mut line = format!("{} {}", level.emoji(), entry.message);
        if self.debug {
            line = format!(
                "[{}] {}: {line}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                level.name()
            );
            if !context.is_empty() {
                let map: serde_json::Map<String, serde_json::Value> = entry
                    .context
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                line.push(' ');
                line.push_str(&serde_json::Value::Object(map).to_string());
            }
        }

        let sink = if level >= Level::Error {
            &mut self.err
        } else {
            &mut self.out
        };
        let _ = writeln!(sink, "{line}");

        self.entries.push(entry);
    }

    /// Print a line without recording it, for summaries and reports
    pub fn print(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }

    pub fn start_operation(&mut self, operation: &str) {
        self.log(Level::Info, "🚀 Starting: {operation}", &[("operation", operation)]);
    }

    pub fn complete_operation(&mut self, operation: &str) {
        self.log(Level::Info, "✅ Completed: {operation}", &[("operation", operation)]);
    }

    pub fn fail_operation(&mut self, operation: &str, reason: &str) {
        self.log(
            Level::Error,
            "Failed: {operation} - {reason}",
            &[("operation", operation), ("reason", reason)],
        );
    }

    pub fn abort_operation(&mut self, operation: &str, reason: &str) {
        self.log(
            Level::Critical,
            "Aborted: {operation} - {reason}",
            &[("operation", operation), ("reason", reason)],
        );
    }

    /// Record an error that escaped every stage and build the report for it
    pub fn uncaught(&mut self, error: &anyhow::Error) -> String {
        self.critical(&format!("Error: {error:#}"));
        self.troubleshooting_report()
    }

    /// ERROR and CRITICAL entries
    pub fn errors(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| e.level >= Level::Error)
    }

    /// Summary of every error with suggested solutions
    #[must_use]
    pub fn troubleshooting_report(&self) -> String {
        let errors: Vec<&LogEntry> = self.errors().collect();
        if errors.is_empty() {
            return "✅ No errors detected in the translation process.\n".to_string();
        }

        let mut report = String::from("🔍 Troubleshooting Report\n========================\n\n");
        report.push_str("Errors encountered during Platform.sh to DDEV translation:\n\n");

        for (i, entry) in errors.iter().enumerate() {
            report.push_str(&format!("{}. [{}] {}\n", i + 1, entry.level, entry.message));
            let solutions = suggested_solutions(&entry.message);
            if !solutions.is_empty() {
                report.push_str("   💡 Suggested solutions:\n");
                for solution in solutions {
                    report.push_str(&format!("      - {solution}\n"));
                }
            }
            report.push('\n');
        }

        report.push_str("Debug Information:\n");
        report.push_str(&format!(
            "- Debug mode: {}\n",
            if self.debug { "enabled" } else { "disabled" }
        ));
        report.push_str(&format!("- Log level: {}\n", self.min_level));
        report.push_str(&format!("- Total log entries: {}\n", self.entries.len()));
        if let Some(path) = &self.log_file {
            report.push_str(&format!("- Debug log file: {}\n", path.display()));
        }
        report
    }
}

fn interpolate(message: &str, context: &[(&str, &str)]) -> String {
    context
        .iter()
        .fold(message.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{key}}}"), value)
        })
}

fn mirror(entry: &LogEntry) {
    match entry.level {
        Level::Debug => tracing::debug!("{}", entry.message),
        Level::Info => tracing::info!("{}", entry.message),
        Level::Warning => tracing::warn!("{}", entry.message),
        Level::Error | Level::Critical => tracing::error!("{}", entry.message),
    }
}

/// Hints for common error messages
#[must_use]
pub fn suggested_solutions(message: &str) -> Vec<&'static str> {
    let lower = message.to_lowercase();
    let mut solutions = Vec::new();

    if lower.contains("platform.app.yaml")
        || lower.contains("configuration file")
        || lower.contains("yaml")
    {
        solutions.extend([
            "Verify .platform.app.yaml exists in project root",
            "Check .platform/services.yaml and .platform/routes.yaml files",
            "Ensure YAML files have valid syntax",
        ]);
    }
    if lower.contains("database") {
        solutions.extend([
            "Use 'ddev delete' to remove existing database",
            "Try 'ddev debug migrate-database' to migrate database",
            "Check Platform.sh database configuration",
        ]);
    }
    if lower.contains("service") || lower.contains("add-on") {
        solutions.extend([
            "Verify service is supported (redis, elasticsearch, memcached)",
            "Check service version compatibility",
            "Ensure DDEV add-on installation succeeded",
        ]);
    }
    if lower.contains("permission") || lower.contains("write") || lower.contains("overwrite") {
        solutions.extend([
            "Check file permissions in .ddev directory",
            "Ensure DDEV has write access to project directory",
        ]);
    }
    solutions
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Buffer(Rc<RefCell<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    fn reporter(debug: bool) -> (Reporter, Buffer, Buffer) {
        let out = Buffer::default();
        let err = Buffer::default();
        let reporter = Reporter::with_sinks(debug, Box::new(out.clone()), Box::new(err.clone()));
        (reporter, out, err)
    }

    #[test]
    fn test_errors_go_to_stderr() {
        let (mut r, out, err) = reporter(false);
        r.info("hello");
        r.error("broken");

        assert_eq!(out.text(), "ℹ️ hello\n");
        assert_eq!(err.text(), "❌ broken\n");
    }

    #[test]
    fn test_debug_filtered_unless_debug_mode() {
        let (mut quiet, out, _) = reporter(false);
        quiet.debug("details");
        assert!(out.text().is_empty());
        assert!(quiet
            .troubleshooting_report()
            .contains("- Total log entries: 0"));

        let (mut loud, out, _) = reporter(true);
        loud.log(Level::Debug, "value {x}", &[("x", "42")]);
        let text = out.text();
        assert!(text.contains("DEBUG: 🐛 value 42"));
        assert!(text.contains(r#"{"x":"42"}"#));
    }

    #[test]
    fn test_operations_interpolate() {
        let (mut r, out, err) = reporter(false);
        r.start_operation("Load");
        r.fail_operation("Load", "missing file");

        assert!(out.text().contains("🚀 Starting: Load"));
        assert!(err.text().contains("Failed: Load - missing file"));
        assert_eq!(r.errors().next().map(|e| e.level), Some(Level::Error));
    }

    #[test]
    fn test_aborted_operation_is_critical() {
        let (mut r, _, err) = reporter(false);
        r.abort_operation("Write config", "Refusing to overwrite config");

        assert!(err.text().contains("🚨 Aborted: Write config - Refusing to overwrite config"));
        assert!(r
            .troubleshooting_report()
            .contains("1. [CRITICAL] Aborted: Write config"));
    }

    #[test]
    fn test_uncaught_error_produces_report() {
        let (mut r, _, err) = reporter(false);
        let error = anyhow::anyhow!("invalid base64").context("Failed to decode routes");
        let report = r.uncaught(&error);

        assert!(err.text().contains("🚨 Error: Failed to decode routes: invalid base64"));
        assert!(report.contains("1. [CRITICAL] Error: Failed to decode routes: invalid base64"));
        assert!(report.contains("Debug Information:"));
    }

    #[test]
    fn test_troubleshooting_report() {
        let (mut r, _, _) = reporter(false);
        assert!(r.troubleshooting_report().contains("No errors detected"));

        r.info("fine");
        r.critical("Existing database mariadb:10.4 does not match");
        let report = r.troubleshooting_report();

        assert!(report.contains("1. [CRITICAL] Existing database mariadb:10.4 does not match"));
        assert!(report.contains("ddev delete"));
        assert!(report.contains("- Total log entries: 2"));
        assert!(report.contains("- Debug mode: disabled"));
    }

    #[test]
    fn test_suggested_solutions_by_pattern() {
        assert!(suggested_solutions("nothing relevant").is_empty());
        assert_eq!(suggested_solutions("Unsupported service type").len(), 3);
        assert!(suggested_solutions("Refusing to overwrite config")
            .contains(&"Check file permissions in .ddev directory"));
    }
}
