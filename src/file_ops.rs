//! # File Operations
//!
//! Atomic writes, timestamped backups and rollback for generated files.
//!
//! A [`FileWriter`] owns the dry-run flag and the ledger of backups taken
//! during one run. Every write goes through a temp file in the destination
//! directory that is renamed over the target, so a reader never observes a
//! partially written file.

use crate::constants::{GENERATED_FILE_MODE, GENERATED_MARKER};
use crate::error::PlatformshError;
use chrono::Local;
use indexmap::IndexMap;
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Suffix format for backup files, `<file>.backup.2024-05-01_13-45-09`
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

static BACKUP_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.backup\.\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2}$")
        .expect("Failed to compile backup suffix regex - this should never happen")
});

fn io_error(path: &Path, source: std::io::Error) -> PlatformshError {
    PlatformshError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Content written to a temp file next to its destination, not yet visible
///
/// Dropping a staged write without [`StagedWrite::commit`] removes the temp
/// file and leaves the destination untouched.
#[derive(Debug)]
pub struct StagedWrite {
    temp: NamedTempFile,
    destination: PathBuf,
}

impl StagedWrite {
    /// Write `content` to a temp file in the destination's directory
    pub fn new(destination: &Path, content: &str, mode: u32) -> Result<Self, PlatformshError> {
        let dir = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| io_error(destination, e))?;
        temp.write_all(content.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| io_error(destination, e))?;
        set_mode(temp.path(), mode).map_err(|e| io_error(destination, e))?;

        Ok(Self {
            temp,
            destination: destination.to_path_buf(),
        })
    }

    /// Path of the temp file holding the staged content
    #[must_use]
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Rename the temp file over the destination
    pub fn commit(self) -> Result<(), PlatformshError> {
        let destination = self.destination;
        self.temp
            .persist(&destination)
            .map_err(|e| io_error(&destination, e.error))?;
        Ok(())
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

/// Writes generated files, honouring dry-run and keeping a backup ledger
#[derive(Debug, Default)]
pub struct FileWriter {
    dry_run: bool,
    /// Original file to its backup, for files backed up in this run
    backups: IndexMap<PathBuf, PathBuf>,
    written: Vec<PathBuf>,
    planned: Vec<String>,
}

impl FileWriter {
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Files written (or, in dry-run mode, that would have been written)
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Mutations skipped because of dry-run mode
    #[must_use]
    pub fn planned(&self) -> &[String] {
        &self.planned
    }

    /// Backups taken in this run
    #[must_use]
    pub fn backups(&self) -> &IndexMap<PathBuf, PathBuf> {
        &self.backups
    }

    fn plan(&mut self, action: String) {
        info!("[DRY RUN] {}", action);
        self.planned.push(action);
    }

    /// Atomically replace `path` with `content`
    pub fn write_atomic(&mut self, path: &Path, content: &str) -> Result<(), PlatformshError> {
        if self.dry_run {
            self.plan(format!(
                "Would write {} ({} bytes)",
                path.display(),
                content.len()
            ));
            self.written.push(path.to_path_buf());
            return Ok(());
        }

        StagedWrite::new(path, content, GENERATED_FILE_MODE)?.commit()?;
        debug!("Wrote {} ({} bytes)", path.display(), content.len());
        self.written.push(path.to_path_buf());
        Ok(())
    }

    /// Back up an existing `path`, then write it atomically
    ///
    /// Returns the backup path when one was taken.
    pub fn write_with_backup(
        &mut self,
        path: &Path,
        content: &str,
    ) -> Result<Option<PathBuf>, PlatformshError> {
        let backup = if path.exists() {
            let backup = self.create_backup(path)?;
            self.backups.insert(path.to_path_buf(), backup.clone());
            Some(backup)
        } else {
            None
        };
        self.write_atomic(path, content)?;
        Ok(backup)
    }

    /// Copy `path` to `<path>.backup.<timestamp>`
    pub fn create_backup(&mut self, path: &Path) -> Result<PathBuf, PlatformshError> {
        let mut name = path.as_os_str().to_os_string();
        name.push(format!(
            ".backup.{}",
            Local::now().format(BACKUP_TIMESTAMP_FORMAT)
        ));
        let backup = PathBuf::from(name);

        if self.dry_run {
            self.plan(format!(
                "Would create backup: {} -> {}",
                path.display(),
                backup.display()
            ));
            return Ok(backup);
        }

        fs::copy(path, &backup).map_err(|e| io_error(path, e))?;
        debug!("Backed up {} to {}", path.display(), backup.display());
        Ok(backup)
    }

    /// Put back the backup taken for `path` in this run and delete it
    ///
    /// Returns `false` when no backup was taken for `path`.
    pub fn restore_from_backup(&mut self, path: &Path) -> Result<bool, PlatformshError> {
        let Some(backup) = self.backups.get(path).cloned() else {
            return Ok(false);
        };

        if self.dry_run {
            self.plan(format!(
                "Would restore: {} -> {}",
                backup.display(),
                path.display()
            ));
            return Ok(true);
        }

        let content = fs::read_to_string(&backup).map_err(|e| io_error(&backup, e))?;
        StagedWrite::new(path, &content, GENERATED_FILE_MODE)?.commit()?;
        fs::remove_file(&backup).map_err(|e| io_error(&backup, e))?;
        self.backups.shift_remove(path);
        info!("Restored {} from backup", path.display());
        Ok(true)
    }

    /// Restore every backup taken in this run, newest first
    ///
    /// Failures are logged; the paths restored successfully are returned.
    pub fn restore_all(&mut self) -> Vec<PathBuf> {
        let originals: Vec<PathBuf> = self.backups.keys().rev().cloned().collect();
        originals
            .into_iter()
            .filter(|original| match self.restore_from_backup(original) {
                Ok(restored) => restored,
                Err(e) => {
                    warn!("Failed to restore {}: {}", original.display(), e);
                    false
                }
            })
            .collect()
    }

    /// Delete the backups taken in this run
    pub fn cleanup_backups(&mut self) -> usize {
        let mut removed = 0;
        for (original, backup) in self.backups.drain(..) {
            if self.dry_run {
                continue;
            }
            match fs::remove_file(&backup) {
                Ok(()) => removed += 1,
                Err(e) => warn!(
                    "Failed to remove backup of {}: {}",
                    original.display(),
                    e
                ),
            }
        }
        removed
    }

    /// Copy a file byte for byte, atomically at the destination
    pub fn copy_file(&mut self, from: &Path, to: &Path) -> Result<(), PlatformshError> {
        if self.dry_run {
            self.plan(format!("Would copy {} -> {}", from.display(), to.display()));
            self.written.push(to.to_path_buf());
            return Ok(());
        }

        let content = fs::read_to_string(from).map_err(|e| io_error(from, e))?;
        let mode = source_mode(from).unwrap_or(GENERATED_FILE_MODE);
        StagedWrite::new(to, &content, mode)?.commit()?;
        self.written.push(to.to_path_buf());
        Ok(())
    }

    /// Create `dir` and its parents
    pub fn ensure_dir(&mut self, dir: &Path) -> Result<(), PlatformshError> {
        if dir.is_dir() {
            return Ok(());
        }
        if self.dry_run {
            self.plan(format!("Would create directory {}", dir.display()));
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|e| io_error(dir, e))
    }

    /// Refuse to touch an existing file that lacks the generated marker
    pub fn ensure_overwritable(path: &Path) -> Result<(), PlatformshError> {
        match fs::read_to_string(path) {
            Ok(content) if content.contains(GENERATED_MARKER) => Ok(()),
            Ok(_) => Err(PlatformshError::DestructiveWriteRefused {
                path: path.to_path_buf(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(path, e)),
        }
    }
}

#[cfg(unix)]
fn source_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).ok().map(|m| m.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn source_mode(_path: &Path) -> Option<u32> {
    None
}

/// Backup files left below `dir` by earlier runs
#[must_use]
pub fn find_backups(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .max_depth(3)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| BACKUP_SUFFIX.is_match(&entry.file_name().to_string_lossy()))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Delete backup files below `dir`, returning what was (or would be) removed
pub fn remove_backups(dir: &Path, dry_run: bool) -> Result<Vec<PathBuf>, PlatformshError> {
    let backups = find_backups(dir);
    if !dry_run {
        for backup in &backups {
            fs::remove_file(backup).map_err(|e| io_error(backup, e))?;
        }
    }
    Ok(backups)
}
