use crate::errors::CoreError;
use crate::fs::FileSystem;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Delay between a soft delete and the irreversible deletion.
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 4000;

/// Overrides `grace_period_ms`.
pub const GRACE_PERIOD_ENV: &str = "KOMIK_GRACE_PERIOD_MS";

/// Overrides `preferences_file`.
pub const PREFERENCES_FILE_ENV: &str = "KOMIK_PREFERENCES_FILE";

/// Extensions recognized as comic archives.
pub const DEFAULT_COMIC_EXTENSIONS: [&str; 7] = ["cbz", "cbr", "cb7", "cbt", "zip", "rar", "pdf"];

/// Browser settings, usually read from a TOML file.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct BrowserConfig {
    pub grace_period_ms: u64,
    pub comic_extensions: Vec<String>,
    pub show_hidden: bool,
    pub preferences_file: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
            comic_extensions: DEFAULT_COMIC_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            show_hidden: false,
            preferences_file: None,
        }
    }
}

impl BrowserConfig {
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(content).map_err(|err| CoreError::config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(fs: &dyn FileSystem, path: &Path) -> crate::Result<Self> {
        let content = fs.read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|err| CoreError::config(format!("{}: {err}", path.display())))
    }

    /// Applies `KOMIK_*` environment variables on top of the file values.
    pub fn apply_env_overrides(self) -> crate::Result<Self> {
        self.apply_overrides(
            env::var(GRACE_PERIOD_ENV).ok(),
            env::var_os(PREFERENCES_FILE_ENV).map(PathBuf::from),
        )
    }

    fn apply_overrides(
        mut self,
        grace_period: Option<String>,
        preferences_file: Option<PathBuf>,
    ) -> crate::Result<Self> {
        if let Some(raw) = grace_period {
            self.grace_period_ms = raw
                .trim()
                .parse()
                .map_err(|_| CoreError::config(format!("{GRACE_PERIOD_ENV} is not a number: {raw}")))?;
        }
        if let Some(path) = preferences_file {
            self.preferences_file = Some(path);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.comic_extensions.is_empty() {
            return Err(CoreError::config("comic_extensions must not be empty"));
        }
        if self.comic_extensions.iter().any(|e| e.is_empty() || e.starts_with('.')) {
            return Err(CoreError::config("comic_extensions are bare extensions like \"cbz\""));
        }
        Ok(())
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_four_second_grace_period() {
        let config = BrowserConfig::default();
        assert_eq!(config.grace_period(), Duration::from_millis(4000));
        assert!(config.comic_extensions.iter().any(|e| e == "cbz"));
        assert!(!config.show_hidden);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = BrowserConfig::from_toml_str("show_hidden = true\n").unwrap();
        assert!(config.show_hidden);
        assert_eq!(config.grace_period_ms, DEFAULT_GRACE_PERIOD_MS);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(BrowserConfig::from_toml_str("comic_extensions = []").is_err());
        assert!(BrowserConfig::from_toml_str("comic_extensions = [\".cbz\"]").is_err());
        assert!(BrowserConfig::from_toml_str("grace_period_ms = \"soon\"").is_err());
    }

    #[test]
    fn overrides_replace_file_values() {
        let config = BrowserConfig::default()
            .apply_overrides(Some("250".into()), Some(PathBuf::from("/tmp/prefs.toml")))
            .unwrap();
        assert_eq!(config.grace_period(), Duration::from_millis(250));
        assert_eq!(config.preferences_file, Some(PathBuf::from("/tmp/prefs.toml")));

        assert!(BrowserConfig::default().apply_overrides(Some("x".into()), None).is_err());
    }
}
