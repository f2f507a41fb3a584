use directories::ProjectDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use crate::error::ConfigError;

const QUALIFIER: &str = "net.roblillack";
const ORGANIZATION: &str = "Lawmark";
const APPLICATION: &str = "lawmark";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Marker written before highlighted text in plain-text output
    pub highlight_open: String,
    /// Marker written after highlighted text in plain-text output
    pub highlight_close: String,
    /// Merge neighbouring runs of the same state after each action
    pub coalesce_runs: bool,
    /// Law shown when a file holds more than one
    pub default_law: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            highlight_open: "[[".to_string(),
            highlight_close: "]]".to_string(),
            coalesce_runs: false,
            default_law: 0,
        }
    }
}

pub fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl Config {
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read the config at `path`; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents, path),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Config::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Like `load`, but reports problems and falls back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Config::default();
        };
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!("{err}; using defaults");
                Config::default()
            }
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the config as TOML, creating missing parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source: io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let contents = self.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, contents).map_err(io_error)?;
        info!("wrote config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_toml("coalesce_runs = true\n", Path::new("x.toml")).unwrap();
        assert!(config.coalesce_runs);
        assert_eq!(config.highlight_open, "[[");
        assert_eq!(config.default_law, 0);
    }

    #[test]
    fn test_malformed_config() {
        let err = Config::from_toml("coalesce_runs = 3", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("lawmark-test-missing/config.toml");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("lawmark-config-{}", std::process::id()));
        let path = dir.join(CONFIG_FILE_NAME);
        let config = Config {
            highlight_open: "«".into(),
            highlight_close: "»".into(),
            coalesce_runs: true,
            default_law: 2,
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            config.to_toml().unwrap()
        );
        let _ = fs::remove_dir_all(dir);
    }
}
