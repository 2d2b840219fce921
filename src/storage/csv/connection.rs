//! Filesystem connection for the CSV/YAML store.
//!
//! Holds the data directory and hands out file paths to the
//! repositories. Constructed once per process and shared by `Arc`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Connection handle to the file-backed record store.
#[derive(Debug, Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

impl CsvConnection {
    /// Open (creating if needed) the data directory. Failure here is a
    /// configuration problem the caller must fix; nothing retries it.
    pub fn new<P: Into<PathBuf>>(base_directory: P) -> Result<Self> {
        let base_directory = base_directory.into();
        fs::create_dir_all(&base_directory)
            .with_context(|| format!("failed to create data directory {:?}", base_directory))?;
        info!("Opened data directory: {:?}", base_directory);
        Ok(Self { base_directory })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn children_file(&self) -> PathBuf {
        self.base_directory.join("children.csv")
    }

    pub fn guardians_file(&self) -> PathBuf {
        self.base_directory.join("guardians.csv")
    }

    pub fn links_file(&self) -> PathBuf {
        self.base_directory.join("child_guardians.csv")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_directory.join("settings.yaml")
    }

    /// Attendance is partitioned per service date, one file per weekly
    /// occurrence.
    pub fn attendance_file(&self, service_date: NaiveDate) -> PathBuf {
        self.base_directory
            .join("attendance")
            .join(format!("{}.csv", service_date.format("%Y-%m-%d")))
    }

    pub fn attendance_directory(&self) -> PathBuf {
        self.base_directory.join("attendance")
    }

    /// Atomic write via temp file and rename, so a crash mid-write never
    /// leaves a half-written table behind.
    pub fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {:?}", parent))?;
        }
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, contents)
            .with_context(|| format!("failed to write {:?}", temp_path))?;
        fs::rename(&temp_path, path)
            .with_context(|| format!("failed to move {:?} into place", temp_path))?;
        Ok(())
    }
}
