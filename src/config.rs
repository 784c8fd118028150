use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{RefreshOptions, ViewError, ViewResult};

pub(crate) const DEFAULT_CONFIG_FILE: &str = "racecard.json";
pub(crate) const DEFAULT_DATA_URL: &str = "http://localhost:3000";
pub(crate) const DEFAULT_UPDATE_URL: &str = "http://localhost:5000/api/update/race";
pub(crate) const DEFAULT_LOG_DIR: &str = ".racecard/logs";
pub(crate) const DEFAULT_BIND: &str = "127.0.0.1";
pub(crate) const DEFAULT_PORT: u16 = 8080;

/// On-disk config. Every field is optional; unset fields keep the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub(crate) struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) update_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) log_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) refresh: Option<RefreshOptions>,
}

/// Overrides taken from command-line flags; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConfigOverrides {
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) data_url: Option<String>,
    pub(crate) data_dir: Option<PathBuf>,
    pub(crate) update_url: Option<String>,
    pub(crate) bind: Option<String>,
    pub(crate) port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct ViewerConfig {
    pub(crate) data_url: String,
    pub(crate) data_dir: Option<PathBuf>,
    pub(crate) update_url: String,
    pub(crate) log_dir: PathBuf,
    /// No client-side timeout unless set.
    pub(crate) timeout_ms: Option<u64>,
    pub(crate) bind: String,
    pub(crate) port: u16,
    pub(crate) refresh: RefreshOptions,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            data_dir: None,
            update_url: DEFAULT_UPDATE_URL.to_string(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            timeout_ms: None,
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            refresh: RefreshOptions::default(),
        }
    }
}

pub(crate) fn env_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl ViewerConfig {
    pub(crate) fn merge_file(&mut self, file: FileConfig) {
        if let Some(value) = file.data_url {
            self.data_url = value;
        }
        if let Some(value) = file.data_dir {
            self.data_dir = Some(value);
        }
        if let Some(value) = file.update_url {
            self.update_url = value;
        }
        if let Some(value) = file.log_dir {
            self.log_dir = value;
        }
        if let Some(value) = file.timeout_ms {
            self.timeout_ms = Some(value);
        }
        if let Some(value) = file.bind {
            self.bind = value;
        }
        if let Some(value) = file.port {
            self.port = value;
        }
        if let Some(value) = file.refresh {
            self.refresh = value;
        }
    }

    /// Applies `RACECARD_*` variables through `lookup` (normally [`env_optional`]).
    pub(crate) fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ViewResult<()> {
        if let Some(value) = lookup("RACECARD_DATA_URL") {
            self.data_url = value;
        }
        if let Some(value) = lookup("RACECARD_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("RACECARD_UPDATE_URL") {
            self.update_url = value;
        }
        if let Some(value) = lookup("RACECARD_LOG_DIR") {
            self.log_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("RACECARD_TIMEOUT_MS") {
            let ms = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ViewError::Config(format!("Invalid RACECARD_TIMEOUT_MS: {value}")))?;
            self.timeout_ms = Some(ms);
        }
        Ok(())
    }

    pub(crate) fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(value) = &overrides.data_url {
            self.data_url = value.clone();
            // An explicit URL beats a directory picked up from file or env.
            if overrides.data_dir.is_none() {
                self.data_dir = None;
            }
        }
        if let Some(value) = &overrides.data_dir {
            self.data_dir = Some(value.clone());
        }
        if let Some(value) = &overrides.update_url {
            self.update_url = value.clone();
        }
        if let Some(value) = &overrides.bind {
            self.bind = value.clone();
        }
        if let Some(value) = overrides.port {
            self.port = value;
        }
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

pub(crate) fn config_file_path(overrides: &ConfigOverrides) -> PathBuf {
    overrides
        .config_path
        .clone()
        .or_else(|| env_optional("RACECARD_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// A missing file means defaults; a malformed one is reported and ignored.
pub(crate) fn load_file_config(path: &Path) -> FileConfig {
    match std::fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data).unwrap_or_else(|err| {
            eprintln!("ignoring malformed config {}: {err}", path.display());
            FileConfig::default()
        }),
        Err(_) => FileConfig::default(),
    }
}

pub(crate) fn save_file_config(path: &Path, config: &FileConfig) -> ViewResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Defaults, then the config file, then the environment, then flags.
pub(crate) fn resolve_config(overrides: &ConfigOverrides) -> ViewResult<ViewerConfig> {
    let mut config = ViewerConfig::default();
    config.merge_file(load_file_config(&config_file_path(overrides)));
    config.apply_env(env_optional)?;
    config.apply_overrides(overrides);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_config_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("racecard_test");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(format!("config_{}_{name}.json", std::process::id()))
    }

    #[test]
    fn defaults_point_at_local_services() {
        let config = ViewerConfig::default();
        assert_eq!(config.update_url, "http://localhost:5000/api/update/race");
        assert!(config.timeout().is_none());
        assert!(config.refresh.all_venues);
    }

    #[test]
    fn layers_apply_in_order() {
        let mut config = ViewerConfig::default();
        config.merge_file(FileConfig {
            data_url: Some("http://file".into()),
            update_url: Some("http://file/update".into()),
            port: Some(9000),
            ..FileConfig::default()
        });
        let env: HashMap<&str, &str> = [("RACECARD_UPDATE_URL", "http://env/update"), ("RACECARD_TIMEOUT_MS", "1500")]
            .into_iter()
            .collect();
        config
            .apply_env(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        config.apply_overrides(&ConfigOverrides {
            port: Some(9100),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.data_url, "http://file");
        assert_eq!(config.update_url, "http://env/update");
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.port, 9100);
    }

    #[test]
    fn invalid_timeout_is_a_config_error() {
        let mut config = ViewerConfig::default();
        let result = config.apply_env(|name| (name == "RACECARD_TIMEOUT_MS").then(|| "soon".to_string()));
        assert!(matches!(result, Err(ViewError::Config(_))));
    }

    #[test]
    fn flag_data_url_clears_inherited_dir() {
        let mut config = ViewerConfig {
            data_dir: Some(PathBuf::from("public")),
            ..ViewerConfig::default()
        };
        config.apply_overrides(&ConfigOverrides {
            data_url: Some("http://example".into()),
            ..ConfigOverrides::default()
        });
        assert!(config.data_dir.is_none());
        assert_eq!(config.data_url, "http://example");
    }

    #[test]
    fn save_and_load_round_trip_and_malformed_fallback() {
        let path = temp_config_path("roundtrip");
        let _ = std::fs::remove_file(&path);
        assert_eq!(load_file_config(&path), FileConfig::default());

        let file = FileConfig {
            data_dir: Some(PathBuf::from("public")),
            refresh: Some(RefreshOptions {
                target: Some("sunday".into()),
                ..RefreshOptions::default()
            }),
            ..FileConfig::default()
        };
        save_file_config(&path, &file).unwrap();
        assert_eq!(load_file_config(&path), file);

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_file_config(&path), FileConfig::default());
        std::fs::remove_file(&path).ok();
    }
}
