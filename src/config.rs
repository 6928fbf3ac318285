//! `livecalc.toml` loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use livecalc_core::{EvalOptions, RefreshOptions};
use serde::Deserialize;

use crate::error::ConfigError;

/// Largest `decimals` value the number formatter accepts.
const MAX_DECIMALS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub debounce_ms: u64,
    pub decimals: u32,
    pub error_color: String,
    /// Extra Rhai function files, loaded after `default.rhai`.
    pub functions: Vec<PathBuf>,
    pub preserve_formatting: bool,
}

impl Default for Config {
    fn default() -> Self {
        let refresh = RefreshOptions::default();
        Config {
            debounce_ms: refresh.debounce.as_millis() as u64,
            decimals: refresh.eval.decimals,
            error_color: refresh.eval.error_color,
            functions: Vec::new(),
            preserve_formatting: refresh.preserve_formatting,
        }
    }
}

impl Config {
    /// Load from `path`; `Ok(None)` when there is no such file.
    pub fn load_from_path(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate(path)?;
        Ok(Some(config))
    }

    /// Load the explicitly requested file, or the user's config file if it
    /// exists, or the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_path(path)?
                .ok_or_else(|| ConfigError::NotFound(path.to_path_buf()));
        }
        match config_path() {
            Some(path) => Ok(Self::load_from_path(&path)?.unwrap_or_default()),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                field: "debounce_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.decimals > MAX_DECIMALS {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                field: "decimals",
                message: format!("must be at most {}", MAX_DECIMALS),
            });
        }
        Ok(())
    }

    pub fn refresh_options(&self) -> RefreshOptions {
        RefreshOptions {
            debounce: Duration::from_millis(self.debounce_ms),
            eval: EvalOptions {
                decimals: self.decimals,
                error_color: self.error_color.clone(),
            },
            preserve_formatting: self.preserve_formatting,
        }
    }
}

pub(crate) fn config_dir() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "livecalc")?;
    Some(proj.config_dir().to_path_buf())
}

fn config_path() -> Option<PathBuf> {
    let mut path = config_dir()?;
    path.push("livecalc.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livecalc.toml");
        assert_eq!(Config::load_from_path(&path).unwrap(), None);
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = write_config("decimals = 2\nerror_color = \"#c00\"\n");
        let config = Config::load_from_path(file.path()).unwrap().unwrap();
        assert_eq!(config.decimals, 2);
        assert_eq!(config.error_color, "#c00");
        assert_eq!(config.debounce_ms, 300);
        assert!(config.preserve_formatting);

        let options = config.refresh_options();
        assert_eq!(options.debounce, Duration::from_millis(300));
        assert_eq!(options.eval.decimals, 2);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let file = write_config("debounce = 10\n");
        let err = Config::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let file = write_config("debounce_ms = 0\n");
        assert!(matches!(
            Config::load_from_path(file.path()),
            Err(ConfigError::Invalid { field: "debounce_ms", .. })
        ));
        let file = write_config("decimals = 20\n");
        assert!(matches!(
            Config::load_from_path(file.path()),
            Err(ConfigError::Invalid { field: "decimals", .. })
        ));
    }

    #[test]
    fn functions_list_is_read() {
        let file = write_config("functions = [\"a.rhai\", \"/tmp/b.rhai\"]\n");
        let config = Config::load_from_path(file.path()).unwrap().unwrap();
        assert_eq!(
            config.functions,
            vec![PathBuf::from("a.rhai"), PathBuf::from("/tmp/b.rhai")]
        );
    }
}
