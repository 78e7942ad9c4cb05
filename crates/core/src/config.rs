//! Environment-driven configuration

use std::path::PathBuf;

const DATA_DIR_VAR: &str = "TASKDECK_DATA_DIR";
const FALLBACK_VAR: &str = "TASKDECK_FALLBACK";
const LOG_VAR: &str = "TASKDECK_LOG";

const DEFAULT_DATA_DIR: &str = ".taskdeck-data";
const DEFAULT_LOG_FILTER: &str = "taskdeck=info,taskdeck_core=info";

/// Where the fallback store keeps its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    /// JSON files next to the primary store
    File,
    /// Process memory only; nothing survives a restart
    Memory,
}

impl Default for FallbackKind {
    fn default() -> Self {
        Self::File
    }
}

impl std::str::FromStr for FallbackKind {
    type Err = crate::Error;

    fn from_str(raw: &str) -> crate::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown fallback store kind: {}",
                other
            ))),
        }
    }
}

/// Runtime configuration for a task board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root directory holding the `primary/` and `fallback/` stores
    pub data_dir: PathBuf,
    /// Backing used for the fallback store
    pub fallback: FallbackKind,
    /// `tracing_subscriber::EnvFilter` directive used by the binary
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            fallback: FallbackKind::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Config {
    /// Build a configuration from `TASKDECK_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: env_string(DATA_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            fallback: env_string(FALLBACK_VAR)
                .and_then(|raw| match raw.parse() {
                    Ok(kind) => Some(kind),
                    Err(err) => {
                        tracing::warn!("Ignoring {}: {}", FALLBACK_VAR, err);
                        None
                    }
                })
                .unwrap_or(defaults.fallback),
            log_filter: env_string(LOG_VAR).unwrap_or(defaults.log_filter),
        }
    }

    /// Override the data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn primary_dir(&self) -> PathBuf {
        self.data_dir.join("primary")
    }

    pub fn fallback_dir(&self) -> PathBuf {
        self.data_dir.join("fallback")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fallback_kind() {
        assert_eq!("file".parse::<FallbackKind>().unwrap(), FallbackKind::File);
        assert_eq!(" Memory ".parse::<FallbackKind>().unwrap(), FallbackKind::Memory);
        assert!("sqlite".parse::<FallbackKind>().is_err());
    }

    #[test]
    fn test_store_dirs_live_under_data_dir() {
        let config = Config::default().with_data_dir("/tmp/deck");
        assert_eq!(config.primary_dir(), PathBuf::from("/tmp/deck/primary"));
        assert_eq!(config.fallback_dir(), PathBuf::from("/tmp/deck/fallback"));
        assert_eq!(config.fallback, FallbackKind::File);
    }
}
