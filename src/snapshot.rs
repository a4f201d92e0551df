//! Saved copies of fetched booking pages.
//!
//! The final timetable page is kept as `result.html` and a rejected wizard
//! page as `error.html`, so a failed or surprising run can be inspected (or
//! re-read with `passtider parse`) afterwards.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use crate::config::OutputConfig;
use crate::error::{FilesystemError, PasstiderError};

/// File name of the saved timetable page.
pub const RESULT_FILE: &str = "result.html";

/// File name of the saved rejection page.
pub const ERROR_FILE: &str = "error.html";

/// Writes page snapshots into one directory.
///
/// A disabled store accepts every call and writes nothing.
#[derive(Debug)]
pub struct SnapshotStore {
    root: Utf8PathBuf,
    dir: Option<Dir>,
}

impl SnapshotStore {
    /// Open the configured snapshot directory, creating it when needed.
    ///
    /// # Errors
    ///
    /// Returns `FilesystemError::IoError` when the directory cannot be
    /// created or opened.
    pub fn open(config: &OutputConfig) -> Result<Self, PasstiderError> {
        if !config.save_snapshots {
            return Ok(Self::disabled());
        }
        let root = config.snapshot_dir.clone();
        let dir = Dir::create_ambient_dir_all(&root, ambient_authority())
            .and_then(|()| Dir::open_ambient_dir(&root, ambient_authority()))
            .map_err(|error| io_error(&root, &error))?;
        Ok(Self {
            root,
            dir: Some(dir),
        })
    }

    /// A store that never touches the filesystem.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            root: Utf8PathBuf::new(),
            dir: None,
        }
    }

    /// Returns whether snapshots are written.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Save the timetable page, returning where it went.
    ///
    /// # Errors
    ///
    /// Returns `FilesystemError::IoError` when the file cannot be written.
    pub fn save_result(&self, html: &str) -> Result<Option<Utf8PathBuf>, PasstiderError> {
        self.save(RESULT_FILE, html)
    }

    /// Save a rejected wizard page, returning where it went.
    ///
    /// # Errors
    ///
    /// Returns `FilesystemError::IoError` when the file cannot be written.
    pub fn save_error(&self, html: &str) -> Result<Option<Utf8PathBuf>, PasstiderError> {
        self.save(ERROR_FILE, html)
    }

    /// Remove an `error.html` left behind by an earlier run.
    ///
    /// # Errors
    ///
    /// Returns `FilesystemError::IoError` when an existing file cannot be
    /// removed. A missing file is not an error.
    pub fn clear_error(&self) -> Result<(), PasstiderError> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        match dir.remove_file(ERROR_FILE) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(&self.root.join(ERROR_FILE), &error)),
        }
    }

    fn save(&self, file_name: &str, html: &str) -> Result<Option<Utf8PathBuf>, PasstiderError> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };
        let path = self.root.join(file_name);
        dir.write(file_name, html)
            .map_err(|error| io_error(&path, &error))?;
        tracing::debug!(%path, "saved page snapshot");
        Ok(Some(path))
    }
}

/// Read a saved page back, for example to summarise it again offline.
///
/// # Errors
///
/// Returns `FilesystemError::NotFound` when the file does not exist and
/// `FilesystemError::IoError` when it cannot be read as UTF-8 text.
pub fn read_page(path: &Utf8Path) -> Result<String, PasstiderError> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| FilesystemError::NotFound {
        path: path.as_std_path().to_path_buf(),
    })?;
    Dir::open_ambient_dir(parent, ambient_authority())
        .and_then(|dir| dir.read_to_string(file_name))
        .map_err(|error| {
            if error.kind() == io::ErrorKind::NotFound {
                PasstiderError::from(FilesystemError::NotFound {
                    path: path.as_std_path().to_path_buf(),
                })
            } else {
                io_error(path, &error)
            }
        })
}

fn io_error(path: &Utf8Path, error: &io::Error) -> PasstiderError {
    PasstiderError::from(FilesystemError::IoError {
        path: path.as_std_path().to_path_buf(),
        message: error.to_string(),
    })
}
