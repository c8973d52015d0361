//! Web server configuration

use cukerun_dispatcher::DispatcherConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// HTTP listen address
    pub listen: SocketAddr,

    /// Directory scanned for `*.feature` files
    pub features_dir: PathBuf,

    /// How runs are launched
    pub dispatcher: DispatcherConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            features_dir: PathBuf::from("src/features"),
            dispatcher: DispatcherConfig::default(),
        }
    }
}

impl WebConfig {
    /// Load configuration from file, falling back to defaults if it is missing
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.dispatcher.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = WebConfig::load(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.listen.port(), 3000);
        assert_eq!(config.features_dir, PathBuf::from("src/features"));
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cukerun.toml");
        std::fs::write(
            &path,
            r#"
listen = "0.0.0.0:8080"

[dispatcher]
command = ["yarn", "cucumber-js"]
working_dir = "/srv/tests"

[dispatcher.env]
BASE_URL = "https://example.test"
"#,
        )
        .unwrap();

        let config = WebConfig::load(&path).unwrap();
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.dispatcher.program(), Some("yarn"));
        assert_eq!(config.dispatcher.format, "json");
        assert_eq!(
            config.dispatcher.env.get("BASE_URL").map(String::as_str),
            Some("https://example.test")
        );
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cukerun.toml");
        std::fs::write(&path, "[dispatcher]\ncommand = []\n").unwrap();

        let err = WebConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/cukerun.toml");
        let mut config = WebConfig::default();
        config.features_dir = PathBuf::from("features");
        config.save(&path).unwrap();

        let loaded = WebConfig::load(&path).unwrap();
        assert_eq!(loaded.features_dir, PathBuf::from("features"));
        assert_eq!(loaded.dispatcher, config.dispatcher);
    }
}
