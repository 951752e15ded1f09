//! Storage root preparation shared by the daemon and its components.

use std::fmt;
use std::fs::DirBuilder;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Root directory under which backend components persist their data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    path: Utf8PathBuf,
}

impl StorageRoot {
    /// Wraps the supplied path.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The wrapped directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Resolves a path relative to the storage root.
    #[must_use]
    pub fn join(&self, relative: impl AsRef<Utf8Path>) -> Utf8PathBuf {
        self.path.join(relative)
    }

    /// Ensures the directory exists with restrictive permissions.
    ///
    /// # Errors
    ///
    /// Returns [`StoragePreparationError::CreateDirectory`] when the directory
    /// cannot be created, or [`StoragePreparationError::NotADirectory`] when
    /// the path exists but is something else.
    pub fn prepare(&self) -> Result<(), StoragePreparationError> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        if let Err(source) = builder.create(self.path.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(StoragePreparationError::CreateDirectory {
                path: self.path.clone(),
                source,
            });
        }

        if !self.path.is_dir() {
            return Err(StoragePreparationError::NotADirectory {
                path: self.path.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for StorageRoot {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.path.as_str())
    }
}

/// Errors raised while preparing the storage root.
#[derive(Debug, Error)]
pub enum StoragePreparationError {
    /// Creating the directory failed.
    #[error("failed to create storage root '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The configured path exists but is not a directory.
    #[error("storage root '{path}' is not a directory")]
    NotADirectory {
        /// Offending path.
        path: Utf8PathBuf,
    },
}
