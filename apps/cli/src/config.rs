use std::{
    io,
    path::{Path, PathBuf},
};

use analysis::{default_roster, RosterEntry, CHART_LEN, RECENT_LEN};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const CONFIG_DIR_NAME: &str = "pitstops";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Stops listed under "recent activity".
    pub recent_len: usize,
    /// Stops plotted in the bar chart.
    pub chart_len: usize,
    pub roster: Vec<RosterEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { recent_len: RECENT_LEN, chart_len: CHART_LEN, roster: default_roster() }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs_next::config_dir()?.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads `explicit` if given (it must exist), else the per-user file if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: AppConfig = serde_json::from_reader(io::BufReader::new(file))
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        debug!(path = %path.display(), "config loaded");
        Ok(config.sanitized())
    }

    fn sanitized(mut self) -> Self {
        if self.recent_len == 0 {
            warn!("recent_len must be positive, using {RECENT_LEN}");
            self.recent_len = RECENT_LEN;
        }
        if self.chart_len == 0 {
            warn!("chart_len must be positive, using {CHART_LEN}");
            self.chart_len = CHART_LEN;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{ "chart_len": 6 }}"#).unwrap();
        let cfg = AppConfig::load(Some(f.path())).unwrap();
        assert_eq!(cfg.chart_len, 6);
        assert_eq!(cfg.recent_len, RECENT_LEN);
        assert_eq!(cfg.roster.len(), 5);
    }

    #[test]
    fn zero_lengths_fall_back() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{ "recent_len": 0, "chart_len": 0, "roster": [] }}"#).unwrap();
        let cfg = AppConfig::from_file(f.path()).unwrap();
        assert_eq!((cfg.recent_len, cfg.chart_len), (RECENT_LEN, CHART_LEN));
        assert!(cfg.roster.is_empty());
    }

    #[test]
    fn missing_or_broken_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(AppConfig::load(Some(missing.as_path())), Err(ConfigError::Io { .. })));

        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        assert!(matches!(AppConfig::from_file(f.path()), Err(ConfigError::Parse { .. })));
    }
}
