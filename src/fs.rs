use crate::errors::CoreError;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Filesystem abstraction boundary for the browser core.
///
/// Listing, deletion and preference persistence all go through this trait so
/// tests can substitute failing or recording backends.
pub trait FileSystem: Send + Sync {
    /// Returns true when path exists (symlink-aware).
    fn exists(&self, path: &Path) -> bool;

    /// Reads file metadata.
    fn metadata(&self, path: &Path) -> crate::Result<Metadata>;

    /// Reads symlink metadata.
    fn symlink_metadata(&self, path: &Path) -> crate::Result<Metadata>;

    /// Lists directory children as concrete paths.
    fn list_dir(&self, path: &Path) -> crate::Result<Vec<PathBuf>>;

    /// Removes a file.
    fn remove_file(&self, path: &Path) -> crate::Result<()>;

    /// Removes a directory and everything below it.
    fn remove_dir_all(&self, path: &Path) -> crate::Result<()>;

    /// Reads UTF-8 text.
    fn read_to_string(&self, path: &Path) -> crate::Result<String>;

    /// Writes UTF-8 text.
    fn write_to_string(&self, path: &Path, content: &str) -> crate::Result<()>;

    /// Creates a directory and all missing parent directories.
    fn create_dir_all(&self, path: &Path) -> crate::Result<()>;
}

/// Default filesystem implementation backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn metadata(&self, path: &Path) -> crate::Result<Metadata> {
        fs::metadata(path).map_err(|err| CoreError::io(path, err))
    }

    fn symlink_metadata(&self, path: &Path) -> crate::Result<Metadata> {
        fs::symlink_metadata(path).map_err(|err| CoreError::io(path, err))
    }

    fn list_dir(&self, path: &Path) -> crate::Result<Vec<PathBuf>> {
        fs::read_dir(path)
            .map_err(|err| CoreError::io(path, err))?
            .map(|entry| entry.map(|v| v.path()))
            .collect::<Result<Vec<PathBuf>, io::Error>>()
            .map_err(|err| CoreError::io(path, err))
    }

    fn remove_file(&self, path: &Path) -> crate::Result<()> {
        fs::remove_file(path).map_err(|err| CoreError::io(path, err))
    }

    fn remove_dir_all(&self, path: &Path) -> crate::Result<()> {
        fs::remove_dir_all(path).map_err(|err| CoreError::io(path, err))
    }

    fn read_to_string(&self, path: &Path) -> crate::Result<String> {
        fs::read_to_string(path).map_err(|err| CoreError::io(path, err))
    }

    fn write_to_string(&self, path: &Path, content: &str) -> crate::Result<()> {
        fs::write(path, content).map_err(|err| CoreError::io(path, err))
    }

    fn create_dir_all(&self, path: &Path) -> crate::Result<()> {
        fs::create_dir_all(path).map_err(|err| CoreError::io(path, err))
    }
}

impl<T: FileSystem + ?Sized> FileSystem for Arc<T> {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn metadata(&self, path: &Path) -> crate::Result<Metadata> {
        (**self).metadata(path)
    }

    fn symlink_metadata(&self, path: &Path) -> crate::Result<Metadata> {
        (**self).symlink_metadata(path)
    }

    fn list_dir(&self, path: &Path) -> crate::Result<Vec<PathBuf>> {
        (**self).list_dir(path)
    }

    fn remove_file(&self, path: &Path) -> crate::Result<()> {
        (**self).remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> crate::Result<()> {
        (**self).remove_dir_all(path)
    }

    fn read_to_string(&self, path: &Path) -> crate::Result<String> {
        (**self).read_to_string(path)
    }

    fn write_to_string(&self, path: &Path, content: &str) -> crate::Result<()> {
        (**self).write_to_string(path, content)
    }

    fn create_dir_all(&self, path: &Path) -> crate::Result<()> {
        (**self).create_dir_all(path)
    }
}

/// Irreversibly removes `path`, file or directory.
///
/// A path that is already gone counts as deleted. Symlinks are removed
/// themselves, never followed.
pub fn delete_path(fs: &dyn FileSystem, path: &Path) -> crate::Result<()> {
    let is_dir = match fs.symlink_metadata(path) {
        Ok(meta) => meta.is_dir(),
        Err(CoreError::Io(_, err)) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(CoreError::Io(_, err)) => return Err(CoreError::DeletionFailed(path.to_path_buf(), err)),
        Err(other) => return Err(other),
    };
    let removed = if is_dir {
        fs.remove_dir_all(path)
    } else {
        fs.remove_file(path)
    };

    match removed {
        Ok(()) => Ok(()),
        Err(CoreError::Io(_, err)) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(CoreError::Io(_, err)) => Err(CoreError::DeletionFailed(path.to_path_buf(), err)),
        Err(other) => Err(other),
    }
}
