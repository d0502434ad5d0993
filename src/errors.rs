use std::{io, path::PathBuf};

/// Message shown to the user when a directory cannot be read for lack of rights.
pub const PERMISSION_DENIED_MESSAGE: &str = "Permission denied: cannot read directory!";

/// Shared error type used by the browser core and its front-ends.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    /// File system I/O failure.
    #[error("I/O error while accessing {0}")]
    Io(PathBuf, #[source] io::Error),

    /// The directory exists but the process may not read it.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The directory is missing or could not be enumerated.
    #[error("cannot read directory {0}")]
    DirectoryUnreadable(PathBuf, #[source] io::Error),

    /// One path of a deletion batch could not be removed.
    #[error("failed to delete {0}")]
    DeletionFailed(PathBuf, #[source] io::Error),

    /// A deletion timer was requested with no Tokio runtime to run it on.
    #[error("no Tokio runtime available to schedule deletion")]
    NoRuntime,

    /// The configuration file or an override could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The preference file could not be read or written.
    #[error("preference store error: {0}")]
    Preferences(String),
}

impl CoreError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn preferences(message: impl Into<String>) -> Self {
        Self::Preferences(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, error: io::Error) -> Self {
        Self::Io(path.into(), error)
    }

    /// Classifies a failure to enumerate `path`.
    pub fn from_listing(path: impl Into<PathBuf>, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.into()),
            _ => Self::DirectoryUnreadable(path.into(), error),
        }
    }

    /// Underlying I/O error kind, when there is one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io(_, err) | Self::DirectoryUnreadable(_, err) | Self::DeletionFailed(_, err) => {
                Some(err.kind())
            }
            Self::PermissionDenied(_) => Some(io::ErrorKind::PermissionDenied),
            _ => None,
        }
    }

    /// Human readable text placed in an error browse state.
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied(_) => PERMISSION_DENIED_MESSAGE.to_string(),
            Self::DirectoryUnreadable(path, _) => {
                format!("Cannot read directory: {}", path.display())
            }
            other => other.to_string(),
        }
    }
}

/// Shared result alias for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_errors_are_classified_by_kind() {
        let denied = CoreError::from_listing(
            "/comics",
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(denied, CoreError::PermissionDenied(_)));
        assert_eq!(denied.user_message(), PERMISSION_DENIED_MESSAGE);

        let missing = CoreError::from_listing("/comics", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing, CoreError::DirectoryUnreadable(_, _)));
        assert_eq!(missing.user_message(), "Cannot read directory: /comics");
        assert_eq!(missing.io_kind(), Some(io::ErrorKind::NotFound));
    }
}
