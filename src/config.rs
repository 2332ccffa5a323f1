use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::git::DEFAULT_BRANCH_PREFIX;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub backmerge: BackmergeConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkspaceConfig {
    /// Repository to operate on (default: the current directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Git executable name or path
    #[serde(default = "default_git_program")]
    pub program: String,
    /// Remote used for fetch, pull and branch-name collision checks
    #[serde(default = "default_remote")]
    pub remote: String,
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: default_git_program(),
            remote: default_remote(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackmergeConfig {
    /// Generated branches are named `<branch_prefix>/DD-MM-YYYY`
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
    /// Commits per page when a request does not give a limit (default: 10)
    #[serde(default = "default_commit_page_size")]
    pub commit_page_size: usize,
    /// How far back the CLI looks when ordering commits picked from a source branch
    #[serde(default = "default_history_scan_limit")]
    pub history_scan_limit: usize,
}

fn default_branch_prefix() -> String {
    DEFAULT_BRANCH_PREFIX.to_string()
}

fn default_commit_page_size() -> usize {
    10
}

fn default_history_scan_limit() -> usize {
    500
}

impl Default for BackmergeConfig {
    fn default() -> Self {
        Self {
            branch_prefix: default_branch_prefix(),
            commit_page_size: default_commit_page_size(),
            history_scan_limit: default_history_scan_limit(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    7010
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether the bridge and server log to a file (false = stderr)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,

    /// Log directory, relative paths resolve against the current directory
    #[serde(default = "default_log_directory")]
    pub directory: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

fn default_log_directory() -> String {
    ".backmerge/logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
            directory: default_log_directory(),
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".backmerge/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so backmerge works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        // Project config in .backmerge/
        let project_config = Self::project_config_path();
        if project_config.exists() {
            builder = builder.add_source(config::File::from(project_config));
        }

        // User config in ~/.config/backmerge/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("backmerge").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with BACKMERGE__ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("BACKMERGE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Render the configuration as TOML, the format of the config files
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    /// Get absolute path to the logs directory
    pub fn logs_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.logging.directory);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Directory the workspace is resolved from
    pub fn workspace_start(&self) -> Option<PathBuf> {
        match &self.workspace.path {
            Some(path) => Some(path.clone()),
            None => std::env::current_dir().ok(),
        }
    }

    /// `host:port` for the HTTP server
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.git.program, "git");
        assert_eq!(config.git.remote, "origin");
        assert_eq!(config.backmerge.branch_prefix, "backmerge");
        assert_eq!(config.backmerge.commit_page_size, 10);
        assert!(config.workspace.path.is_none());
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("override.toml");
        std::fs::write(
            &path,
            "[git]\nremote = \"upstream\"\n\n[backmerge]\nbranch_prefix = \"integration\"\n",
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();

        assert_eq!(config.git.remote, "upstream");
        assert_eq!(config.backmerge.branch_prefix, "integration");
        // Untouched sections keep their defaults
        assert_eq!(config.backmerge.commit_page_size, 10);
        assert_eq!(config.git.program, "git");
    }

    #[test]
    fn test_workspace_path_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("workspace.toml");
        std::fs::write(&path, "[workspace]\npath = \"/srv/repo\"\n").unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.workspace_start(), Some(PathBuf::from("/srv/repo")));
    }

    #[test]
    fn test_logs_path_relative_to_cwd() {
        let config = Config::default();
        let logs = config.logs_path();
        assert!(logs.is_absolute() || logs.ends_with(".backmerge/logs"));
        assert!(logs.ends_with("logs"));
    }

    #[test]
    fn test_logs_path_absolute_kept() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.logging.directory = temp_dir.path().to_string_lossy().to_string();
        assert_eq!(config.logs_path(), temp_dir.path());
    }

    #[test]
    fn test_toml_round_trips_through_loader() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.backmerge.commit_page_size = 25;
        config.api.port = 9100;

        let path = temp_dir.path().join("rendered.toml");
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.backmerge.commit_page_size, 25);
        assert_eq!(loaded.api.port, 9100);
    }

    #[test]
    fn test_api_address() {
        let mut config = Config::default();
        config.api.port = 9000;
        assert_eq!(config.api_address(), "127.0.0.1:9000");
    }
}
