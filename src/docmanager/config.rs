use crate::error::{DocManagerError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "config.json";

/// Keys accepted by [`DocManagerConfig::get`] and [`DocManagerConfig::set`].
pub const CONFIG_KEYS: &[&str] = &[
    "verbosity",
    "jobs",
    "queryformat",
    "default_output",
    "stop_on_error",
];

/// User configuration, stored as JSON in the user config directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocManagerConfig {
    /// Baseline log verbosity, combined with `-v` on the command line
    #[serde(default)]
    pub verbosity: u8,

    /// Number of files loaded in parallel
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Template used by `analyze` when `-qf` is not given
    #[serde(default)]
    pub queryformat: Option<String>,

    /// Placeholder for properties that are missing in `analyze`
    #[serde(default)]
    pub default_output: Option<String>,

    /// Abort a batch on the first file that fails to load
    #[serde(default)]
    pub stop_on_error: bool,
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Default for DocManagerConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            jobs: default_jobs(),
            queryformat: None,
            default_output: None,
            stop_on_error: false,
        }
    }
}

impl DocManagerConfig {
    /// Default location of the config file, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "docmanager", "docmanager")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
    }

    /// Load config from `path`, or return defaults if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| DocManagerError::from_io(e, path))?;
        let config: DocManagerConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| DocManagerError::from_io(e, dir))?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| DocManagerError::from_io(e, path))?;
        Ok(())
    }

    /// Display value of `key`; unset optional values show as an empty string.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "verbosity" => Some(self.verbosity.to_string()),
            "jobs" => Some(self.jobs.to_string()),
            "queryformat" => Some(self.queryformat.clone().unwrap_or_default()),
            "default_output" => Some(self.default_output.clone().unwrap_or_default()),
            "stop_on_error" => Some(self.stop_on_error.to_string()),
            _ => None,
        }
    }

    /// Sets `key` from its string form. An empty value clears optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid =
            || DocManagerError::InvalidInput(format!("Invalid value for {}: {:?}", key, value));
        match key {
            "verbosity" => self.verbosity = value.parse().map_err(|_| invalid())?,
            "jobs" => {
                let jobs: usize = value.parse().map_err(|_| invalid())?;
                if jobs == 0 {
                    return Err(invalid());
                }
                self.jobs = jobs;
            }
            "queryformat" => self.queryformat = non_empty(value),
            "default_output" => self.default_output = non_empty(value),
            "stop_on_error" => {
                self.stop_on_error = match value {
                    "true" | "yes" | "1" => true,
                    "false" | "no" | "0" => false,
                    _ => return Err(invalid()),
                }
            }
            _ => return Err(DocManagerError::ConfigKey(key.to_string())),
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DocManagerConfig::default();
        assert_eq!(config.verbosity, 0);
        assert!(config.jobs >= 1);
        assert!(!config.stop_on_error);
        assert_eq!(config.queryformat, None);
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = DocManagerConfig::load(dir.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config, DocManagerConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);

        let mut config = DocManagerConfig::default();
        config.set("queryformat", "{os.file} {status}").unwrap();
        config.set("jobs", "3").unwrap();
        config.save(&path).unwrap();

        let loaded = DocManagerConfig::load(&path).unwrap();
        assert_eq!(loaded.queryformat.as_deref(), Some("{os.file} {status}"));
        assert_eq!(loaded.jobs, 3);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, r#"{"stop_on_error": true}"#).unwrap();

        let loaded = DocManagerConfig::load(&path).unwrap();
        assert!(loaded.stop_on_error);
        assert_eq!(loaded.verbosity, 0);
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            DocManagerConfig::load(&path),
            Err(DocManagerError::Serialization(_))
        ));
    }

    #[test]
    fn test_get_and_set_keys() {
        let mut config = DocManagerConfig::default();
        config.set("stop_on_error", "yes").unwrap();
        assert_eq!(config.get("stop_on_error").as_deref(), Some("true"));

        config.set("default_output", "-").unwrap();
        assert_eq!(config.get("default_output").as_deref(), Some("-"));
        config.set("default_output", "").unwrap();
        assert_eq!(config.default_output, None);

        assert!(config.get("nope").is_none());
        assert!(matches!(
            config.set("nope", "1"),
            Err(DocManagerError::ConfigKey(_))
        ));
        assert!(matches!(
            config.set("jobs", "0"),
            Err(DocManagerError::InvalidInput(_))
        ));
        assert!(matches!(
            config.set("verbosity", "loud"),
            Err(DocManagerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_every_key_is_readable() {
        let config = DocManagerConfig::default();
        for key in CONFIG_KEYS {
            assert!(config.get(key).is_some(), "{}", key);
        }
    }
}
