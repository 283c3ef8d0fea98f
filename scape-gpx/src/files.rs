//! GPX file manager
//!
//! Owns the directory that recordings are saved to and imported files are
//! moved into.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::error::{Error, Result};

const GPX_EXTENSION: &str = "gpx";

#[derive(Debug, Clone)]
pub struct GpxFileManager {
    directory: PathBuf,
}

impl GpxFileManager {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// `.gpx` files in the directory, sorted by filename
    ///
    /// A missing directory has no files.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        if !self.directory.exists() {
            debug!("GPX directory {} does not exist yet", self.directory.display());
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.is_file() && is_gpx(&path) {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Move `source` into the directory, keeping its filename
    pub fn import(&self, source: &Path) -> Result<PathBuf> {
        let file_name = source.file_name().ok_or_else(|| {
            Error::InvalidDocument(format!("{} has no filename", source.display()))
        })?;

        fs::create_dir_all(&self.directory)?;
        let destination = self.directory.join(file_name);

        if let Err(e) = fs::rename(source, &destination) {
            error!("Failed to import {}: {}", source.display(), e);
            return Err(e.into());
        }

        info!("Imported GPX file {}", destination.display());
        Ok(destination)
    }

    /// Write `content` as `<filename>.gpx`
    ///
    /// The content lands in a temporary file first, so a reader never sees a
    /// partial document.
    pub fn create(&self, content: &str, filename: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.directory)?;

        let destination = self.directory.join(format!("{}.{}", filename, GPX_EXTENSION));
        let temporary = self.directory.join(format!(".{}.{}.tmp", filename, GPX_EXTENSION));

        fs::write(&temporary, content)?;
        if let Err(e) = fs::rename(&temporary, &destination) {
            error!("Failed to save {}: {}", destination.display(), e);
            let _ = fs::remove_file(&temporary);
            return Err(e.into());
        }

        debug!("Saved GPX file {}", destination.display());
        Ok(destination)
    }

    pub fn remove(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        debug!("Removed GPX file {}", path.display());
        Ok(())
    }
}

fn is_gpx(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(GPX_EXTENSION))
}
