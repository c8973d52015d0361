//! Dispatcher configuration

use cukerun_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// How the test tool is invoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Program followed by its leading arguments
    pub command: Vec<String>,

    /// Feature files to run
    pub feature_glob: String,

    /// Value passed to `--format`
    pub format: String,

    /// Modules loaded with `--require-module`
    pub require_module: Vec<String>,

    /// Step and support code loaded with `--require`
    pub require: Vec<String>,

    /// Working directory for the spawned process (None = inherit)
    pub working_dir: Option<PathBuf>,

    /// Extra environment variables for the spawned process
    pub env: BTreeMap<String, String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            command: vec!["npx".to_string(), "cucumber-js".to_string()],
            feature_glob: "src/features/**/*.feature".to_string(),
            format: "json".to_string(),
            require_module: vec!["ts-node/register".to_string()],
            require: vec![
                "src/steps/*.ts".to_string(),
                "src/support/*.ts".to_string(),
            ],
            working_dir: None,
            env: BTreeMap::new(),
        }
    }
}

impl DispatcherConfig {
    /// Config for an arbitrary program with no cucumber-specific prefix.
    pub fn for_command<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    /// Reject settings that could never produce a runnable command
    pub fn validate(&self) -> Result<()> {
        match self.program() {
            Some(program) if !program.trim().is_empty() => {}
            _ => return Err(Error::InvalidConfig("command must name a program".to_string())),
        }
        if self.format.trim().is_empty() {
            return Err(Error::InvalidConfig("format must not be empty".to_string()));
        }
        if self.feature_glob.trim().is_empty() {
            return Err(Error::InvalidConfig("feature_glob must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatcher_config_default() {
        let config = DispatcherConfig::default();
        assert_eq!(config.program(), Some("npx"));
        assert_eq!(config.format, "json");
        assert_eq!(config.require.len(), 2);
        assert!(config.working_dir.is_none());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: DispatcherConfig =
            serde_json::from_str(r#"{ "command": ["yarn", "cucumber-js"] }"#).unwrap();
        assert_eq!(config.program(), Some("yarn"));
        assert_eq!(config.feature_glob, "src/features/**/*.feature");
    }

    #[test]
    fn test_validate() {
        assert!(DispatcherConfig::default().validate().is_ok());

        let empty = DispatcherConfig::for_command(Vec::<String>::new());
        assert!(matches!(empty.validate(), Err(Error::InvalidConfig(_))));

        let blank = DispatcherConfig::for_command([" "]);
        assert!(matches!(blank.validate(), Err(Error::InvalidConfig(_))));

        let mut no_format = DispatcherConfig::default();
        no_format.format.clear();
        let err = no_format.validate().unwrap_err();
        assert!(err.to_string().contains("format"));
    }
}
