use chrono::{DateTime, Utc};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// What a listed path is on disk.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "dir",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A comic file or a directory that may contain comics.
///
/// Two entries are the same entry when their paths are equal; the remaining
/// fields are a snapshot taken when the listing was produced.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
    pub size_bytes: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn new(path: PathBuf, kind: EntryKind) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            kind,
            size_bytes: None,
            modified: None,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), EntryKind::File)
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), EntryKind::Directory)
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Entry {}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// Values remembered from the previous session, handed to the UI on start.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct LastSession {
    pub root_dir: String,
    pub last_comic_path: String,
    pub last_page: u32,
}

impl LastSession {
    /// Builds a session from stored strings; an unparsable page becomes 0.
    pub fn from_stored(root_dir: String, last_comic_path: String, last_page: &str) -> Self {
        Self {
            root_dir,
            last_comic_path,
            last_page: last_page.trim().parse().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BrowsePhase {
    Uninitialized(LastSession),
    Loading { dir: PathBuf },
    Ready { dir: PathBuf, entries: Vec<Entry> },
    Error { message: String },
}

/// Observable state of the browser.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BrowseState {
    pub initialized: bool,
    pub phase: BrowsePhase,
}

impl BrowseState {
    pub fn uninitialized(session: LastSession, initialized: bool) -> Self {
        Self {
            initialized,
            phase: BrowsePhase::Uninitialized(session),
        }
    }

    pub fn loading(dir: PathBuf) -> Self {
        Self {
            initialized: true,
            phase: BrowsePhase::Loading { dir },
        }
    }

    pub fn ready(dir: PathBuf, entries: Vec<Entry>) -> Self {
        Self {
            initialized: true,
            phase: BrowsePhase::Ready { dir, entries },
        }
    }

    pub fn error(message: impl Into<String>, initialized: bool) -> Self {
        Self {
            initialized,
            phase: BrowsePhase::Error {
                message: message.into(),
            },
        }
    }

    /// Entries of a `Ready` state.
    pub fn entries(&self) -> Option<&[Entry]> {
        match &self.phase {
            BrowsePhase::Ready { entries, .. } => Some(entries),
            _ => None,
        }
    }

    /// Directory being loaded or shown, if any.
    pub fn dir(&self) -> Option<&Path> {
        match &self.phase {
            BrowsePhase::Loading { dir } | BrowsePhase::Ready { dir, .. } => Some(dir),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, BrowsePhase::Ready { .. })
    }
}

impl Default for BrowseState {
    fn default() -> Self {
        Self::uninitialized(LastSession::default(), false)
    }
}

/// Outcome of deleting one pending batch.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FlushReport {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn entries_are_identified_by_path() {
        let a = Entry::file("/comics/a.cbz").with_size(10);
        let b = Entry::file("/comics/a.cbz").with_size(20);
        assert_eq!(a, b);
        assert_eq!(a.name, "a.cbz");

        let set: HashSet<Entry> = [a, b, Entry::directory("/comics/series")].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn last_page_falls_back_to_zero() {
        let session = LastSession::from_stored("/comics".into(), String::new(), "abc");
        assert_eq!(session.last_page, 0);
        let session = LastSession::from_stored("/comics".into(), String::new(), " 12 ");
        assert_eq!(session.last_page, 12);
    }
}
