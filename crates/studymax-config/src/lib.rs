use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for studymax
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub attachments: AttachmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: u32,

    /// Database file; the platform data directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Allow only one task and one document per class title
    #[serde(default)]
    pub unique_class_reference: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            path: None,
            unique_class_reference: false,
        }
    }
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_name() -> String {
    "studyMax".to_string()
}

fn default_version() -> u32 {
    2
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing the defaults there if it does not exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            config
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.name.trim().is_empty() {
            anyhow::bail!("storage.name must not be empty");
        }
        if self.storage.version == 0 {
            anyhow::bail!("storage.version must be at least 1");
        }
        if self.attachments.max_file_size == 0 {
            anyhow::bail!("attachments.max_file_size must be greater than 0");
        }
        Ok(())
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "studymax", "studymax") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.studymax/config.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.name, "studyMax");
        assert_eq!(config.storage.version, 2);
        assert!(config.storage.path.is_none());
        assert!(!config.storage.unique_class_reference);
        assert_eq!(config.attachments.max_file_size, 10_485_760);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.storage.name, config.storage.name);
        assert_eq!(parsed.storage.version, config.storage.version);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [storage]
            unique_class_reference = true
            path = "/tmp/elsewhere.db"
            "#,
        )
        .unwrap();
        assert!(parsed.storage.unique_class_reference);
        assert_eq!(parsed.storage.path, Some(PathBuf::from("/tmp/elsewhere.db")));
        assert_eq!(parsed.storage.version, 2);
        assert_eq!(parsed.attachments.max_file_size, 10_485_760);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.storage.name, "studyMax");

        std::fs::write(&path, "[storage]\nversion = 3\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().storage.version, 3);
    }

    #[test]
    fn test_zero_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\nversion = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
