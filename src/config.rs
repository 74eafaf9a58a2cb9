use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::relocator::RelocatorConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    discord_bot_token: String,
    /// Channel watched for the ping-reply gesture.
    origin_channel_id: u64,
    /// Forum channel that receives relocated requests.
    support_forum_id: u64,
    authorized_role_id: u64,
    /// Channel or thread receiving relocation logs and error reports.
    log_channel_id: u64,
    /// Mirror of the operator console (tracing output) into a channel.
    ops_channel_id: Option<u64>,
    #[serde(default = "default_project_name")]
    project_name: String,
    #[serde(default = "default_docs_url")]
    docs_url: String,
    #[serde(default = "default_max_attachment_mb")]
    max_attachment_mb: u64,
    /// Directory for log files. Defaults to current directory.
    data_dir: Option<String>,
}

fn default_project_name() -> String {
    "Coolify".to_string()
}

fn default_docs_url() -> String {
    "https://coolify.io/docs/".to_string()
}

fn default_max_attachment_mb() -> u64 {
    25
}

pub struct Config {
    pub discord_bot_token: String,
    pub origin_channel_id: u64,
    pub support_forum_id: u64,
    pub authorized_role_id: u64,
    pub log_channel_id: u64,
    pub ops_channel_id: Option<u64>,
    pub project_name: String,
    pub docs_url: String,
    pub max_attachment_mb: u64,
    /// Directory for log files.
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        if file.discord_bot_token.is_empty() {
            return Err(ConfigError::Validation("discord_bot_token is required".into()));
        }
        // Discord tokens are three dot-separated base64 segments
        let token_parts: Vec<&str> = file.discord_bot_token.split('.').collect();
        if token_parts.len() != 3 || token_parts.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::Validation(
                "discord_bot_token appears invalid (expected three dot-separated segments)".into(),
            ));
        }

        for (name, id) in [
            ("origin_channel_id", file.origin_channel_id),
            ("support_forum_id", file.support_forum_id),
            ("authorized_role_id", file.authorized_role_id),
            ("log_channel_id", file.log_channel_id),
        ] {
            if id == 0 {
                return Err(ConfigError::Validation(format!("{name} must be a non-zero id")));
            }
        }
        if file.ops_channel_id == Some(0) {
            return Err(ConfigError::Validation("ops_channel_id must be a non-zero id".into()));
        }
        if file.max_attachment_mb == 0 {
            return Err(ConfigError::Validation("max_attachment_mb must be at least 1".into()));
        }

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            discord_bot_token: file.discord_bot_token,
            origin_channel_id: file.origin_channel_id,
            support_forum_id: file.support_forum_id,
            authorized_role_id: file.authorized_role_id,
            log_channel_id: file.log_channel_id,
            ops_channel_id: file.ops_channel_id,
            project_name: file.project_name,
            docs_url: file.docs_url,
            max_attachment_mb: file.max_attachment_mb,
            data_dir,
        })
    }

    /// Identifiers and texts the relocator needs, detached from startup-only settings.
    pub fn relocator_config(&self) -> RelocatorConfig {
        RelocatorConfig {
            origin_channel_id: self.origin_channel_id,
            support_forum_id: self.support_forum_id,
            authorized_role_id: self.authorized_role_id,
            log_channel_id: self.log_channel_id,
            project_name: self.project_name.clone(),
            docs_url: self.docs_url.clone(),
            max_attachment_bytes: self.max_attachment_mb * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TOKEN: &str = "MTIzNDU2Nzg5.GhIjKl.abcdefghijklmnop";

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    fn config_json(token: &str, origin: u64) -> String {
        format!(
            r#"{{
                "discord_bot_token": "{token}",
                "origin_channel_id": {origin},
                "support_forum_id": 20,
                "authorized_role_id": 30,
                "log_channel_id": 40
            }}"#
        )
    }

    #[test]
    fn test_valid_config() {
        let file = write_config(&config_json(TOKEN, 10));
        let config = Config::load(file.path()).expect("should load valid config");
        assert_eq!(config.origin_channel_id, 10);
        assert_eq!(config.support_forum_id, 20);
        assert_eq!(config.authorized_role_id, 30);
        assert_eq!(config.log_channel_id, 40);
        assert_eq!(config.ops_channel_id, None);
        assert_eq!(config.project_name, "Coolify");
        assert_eq!(config.max_attachment_mb, 25);
        assert_eq!(config.data_dir, PathBuf::from("."));
    }

    #[test]
    fn test_relocator_config_carries_ids() {
        let file = write_config(&config_json(TOKEN, 10));
        let config = Config::load(file.path()).unwrap();
        let relocator = config.relocator_config();
        assert_eq!(relocator.origin_channel_id, 10);
        assert_eq!(relocator.support_forum_id, 20);
        assert_eq!(relocator.max_attachment_bytes, 25 * 1024 * 1024);
        assert_eq!(relocator.docs_url, "https://coolify.io/docs/");
    }

    #[test]
    fn test_empty_token() {
        let file = write_config(&config_json("", 10));
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("discord_bot_token"));
    }

    #[test]
    fn test_invalid_token_format() {
        let file = write_config(&config_json("not-a-token", 10));
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_invalid_token_empty_segment() {
        let file = write_config(&config_json("abc..def", 10));
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_zero_channel_id() {
        let file = write_config(&config_json(TOKEN, 0));
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("origin_channel_id"));
    }

    #[test]
    fn test_missing_role_id() {
        let file = write_config(&format!(
            r#"{{
                "discord_bot_token": "{TOKEN}",
                "origin_channel_id": 1,
                "support_forum_id": 2,
                "log_channel_id": 4
            }}"#
        ));
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }

    #[test]
    fn test_optional_overrides() {
        let file = write_config(&format!(
            r#"{{
                "discord_bot_token": "{TOKEN}",
                "origin_channel_id": 1,
                "support_forum_id": 2,
                "authorized_role_id": 3,
                "log_channel_id": 4,
                "ops_channel_id": 5,
                "project_name": "Acme",
                "docs_url": "https://acme.test/docs",
                "max_attachment_mb": 8,
                "data_dir": "/tmp/postmover"
            }}"#
        ));
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.ops_channel_id, Some(5));
        assert_eq!(config.project_name, "Acme");
        assert_eq!(config.docs_url, "https://acme.test/docs");
        assert_eq!(config.max_attachment_mb, 8);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/postmover"));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(Config::load("/nonexistent/path/config.json"));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }
}
