use crate::errors::CoreError;
use crate::fs::FileSystem;
use crate::helpers::sanitize_user_path;
use log::warn;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

pub const PREF_ROOT_DIR: &str = "root_dir";
pub const PREF_LAST_COMIC_PATH: &str = "last_comic_path";
pub const PREF_CURRENT_PAGE_LAST_COMIC: &str = "current_page_last_comic";

struct Backing {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl Backing {
    fn persist(&self) -> crate::Result<()> {
        let content =
            toml::to_string(&self.values).map_err(|err| CoreError::preferences(err.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.create_dir_all(parent)?;
        }
        self.fs.write_to_string(&self.path, &content)
    }
}

/// String key-value store persisted as a flat TOML table.
///
/// Reads and writes before `init` are tolerated: they log a warning, `get`
/// answers with the default and `set` is dropped.
#[derive(Default)]
pub struct Preferences {
    backing: RwLock<Option<Backing>>,
}

impl Preferences {
    pub fn uninitialized() -> Self {
        Self::default()
    }

    pub fn open(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> crate::Result<Self> {
        let prefs = Self::default();
        prefs.init(fs, path)?;
        Ok(prefs)
    }

    /// Binds the store to `path`, loading it when the file exists.
    pub fn init(&self, fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> crate::Result<()> {
        let path = path.into();
        let values = if fs.exists(&path) {
            let content = fs.read_to_string(&path)?;
            toml::from_str(&content)
                .map_err(|err| CoreError::preferences(format!("{}: {err}", path.display())))?
        } else {
            BTreeMap::new()
        };
        *self.backing.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Backing { fs, path, values });
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.backing.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn get(&self, key: &str, default: &str) -> String {
        let guard = self.backing.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(backing) => backing.values.get(key).cloned().unwrap_or_else(|| default.to_string()),
            None => {
                warn!("Preferences.get({key}) with preferences not initialized");
                default.to_string()
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut guard = self.backing.write().unwrap_or_else(PoisonError::into_inner);
        let Some(backing) = guard.as_mut() else {
            warn!("Preferences.set({key}) with preferences not initialized");
            return;
        };
        backing.values.insert(key.to_string(), value.to_string());
        if let Err(err) = backing.persist() {
            warn!(
                "could not save preferences to {}: {err}",
                sanitize_user_path(&backing.path)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::RealFileSystem;
    use tempfile::TempDir;

    #[test]
    fn uninitialized_store_returns_defaults() {
        let prefs = Preferences::uninitialized();
        assert_eq!(prefs.get(PREF_ROOT_DIR, "/fallback"), "/fallback");
        prefs.set(PREF_ROOT_DIR, "/comics");
        assert_eq!(prefs.get(PREF_ROOT_DIR, ""), "");
        assert!(!prefs.is_initialized());
    }

    #[test]
    fn values_survive_reopening() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("conf").join("prefs.toml");
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

        let prefs = Preferences::open(Arc::clone(&fs), &path).unwrap();
        assert_eq!(prefs.get(PREF_CURRENT_PAGE_LAST_COMIC, "0"), "0");
        prefs.set(PREF_ROOT_DIR, "/comics");
        prefs.set(PREF_CURRENT_PAGE_LAST_COMIC, "17");

        let reopened = Preferences::open(fs, &path).unwrap();
        assert_eq!(reopened.get(PREF_ROOT_DIR, ""), "/comics");
        assert_eq!(reopened.get(PREF_CURRENT_PAGE_LAST_COMIC, "0"), "17");
    }

    #[test]
    fn corrupt_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.toml");
        std::fs::write(&path, "root_dir = [").unwrap();
        let err = Preferences::open(Arc::new(RealFileSystem), &path).err().unwrap();
        assert!(matches!(err, CoreError::Preferences(_)));
    }
}
