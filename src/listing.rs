use crate::config::BrowserConfig;
use crate::errors::CoreError;
use crate::fs::FileSystem;
use crate::helpers::{has_comic_extension, is_hidden, to_utc};
use crate::models::{Entry, EntryKind};
use std::path::Path;

/// Produces the comic entries of one directory.
pub trait DirectoryListing: Send + Sync {
    /// Lists `dir` in a stable order. Fails with `PermissionDenied` or
    /// `DirectoryUnreadable` when the directory cannot be enumerated.
    fn list(&self, dir: &Path) -> crate::Result<Vec<Entry>>;
}

/// Lists sub-directories and comic archives, directories first.
pub struct ComicDirectoryListing<F: FileSystem> {
    fs: F,
    extensions: Vec<String>,
    show_hidden: bool,
}

impl<F: FileSystem> ComicDirectoryListing<F> {
    pub fn new(fs: F, config: &BrowserConfig) -> Self {
        Self {
            fs,
            extensions: config.comic_extensions.clone(),
            show_hidden: config.show_hidden,
        }
    }

    fn entry_for(&self, path: &Path) -> Option<Entry> {
        if !self.show_hidden && is_hidden(path) {
            return None;
        }
        // Entries that vanish between read_dir and stat are skipped.
        let meta = self.fs.metadata(path).ok()?;
        let entry = if meta.is_dir() {
            Entry::directory(path)
        } else if meta.is_file() && has_comic_extension(path, &self.extensions) {
            Entry::file(path).with_size(meta.len())
        } else {
            return None;
        };
        Some(match meta.modified() {
            Ok(time) => entry.with_modified(to_utc(time)),
            Err(_) => entry,
        })
    }
}

impl<F: FileSystem> DirectoryListing for ComicDirectoryListing<F> {
    fn list(&self, dir: &Path) -> crate::Result<Vec<Entry>> {
        let children = self.fs.list_dir(dir).map_err(|err| match err {
            CoreError::Io(path, io_err) => CoreError::from_listing(path, io_err),
            other => other,
        })?;

        let mut entries: Vec<Entry> = children.iter().filter_map(|p| self.entry_for(p)).collect();
        entries.sort_by(|a, b| {
            let rank = |e: &Entry| match e.kind {
                EntryKind::Directory => 0,
                EntryKind::File => 1,
            };
            rank(a)
                .cmp(&rank(b))
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::RealFileSystem;
    use tempfile::TempDir;

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn lists_directories_first_then_comics_by_name() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.cbz", "A.cbr", "notes.txt", ".hidden.cbz"] {
            std::fs::write(tmp.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(tmp.path().join("zeta")).unwrap();
        std::fs::create_dir(tmp.path().join("Alpha")).unwrap();

        let listing = ComicDirectoryListing::new(RealFileSystem, &BrowserConfig::default());
        let entries = listing.list(tmp.path()).unwrap();

        assert_eq!(names(&entries), vec!["Alpha", "zeta", "A.cbr", "b.cbz"]);
        assert!(entries[0].is_dir());
        assert_eq!(entries[3].size_bytes, Some(1));
        assert!(entries[3].modified.is_some());
    }

    #[test]
    fn show_hidden_includes_dot_entries() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(".hidden.cbz"), b"x").unwrap();
        let config = BrowserConfig {
            show_hidden: true,
            ..BrowserConfig::default()
        };
        let entries = ComicDirectoryListing::new(RealFileSystem, &config).list(tmp.path()).unwrap();
        assert_eq!(names(&entries), vec![".hidden.cbz"]);
    }

    #[test]
    fn missing_directory_is_unreadable() {
        let tmp = TempDir::new().unwrap();
        let listing = ComicDirectoryListing::new(RealFileSystem, &BrowserConfig::default());
        let err = listing.list(&tmp.path().join("gone")).unwrap_err();
        assert!(matches!(err, CoreError::DirectoryUnreadable(_, _)));
    }
}
