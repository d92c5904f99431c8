use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

use crate::client::EndpointStrategy;
use crate::splitter::SplitMode;

const DEFAULT_SCHEMA_FILE: &str = "schema.sql";
const DEFAULT_RPC_FUNCTION: &str = "sql_exec";
const DEFAULT_SQL_FIELD: &str = "query";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_PREVIEW_WIDTH: usize = 60;
const DEFAULT_LOG_LEVEL: &str = "warn";
const DEFAULT_LOG_DIR: &str = "./logs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub base_url: String,
    pub service_key: String,
    pub api_key: String,
    pub schema_path: PathBuf,
    pub endpoint: EndpointStrategy,
    pub sql_field: String,
    pub timeout: Duration,
    pub split_mode: SplitMode,
    pub preview_width: usize,
    pub log_level: String,
    pub file_logs: bool,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let base_url = normalize_base_url(&base_url)?;

        let service_key = get("SUPABASE_SERVICE_ROLE_KEY")
            .ok_or(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))?;
        let api_key = get("SUPABASE_API_KEY").unwrap_or_else(|| service_key.clone());

        let endpoint = match get("DEPLOY_ENDPOINT").as_deref() {
            None | Some("rpc") => EndpointStrategy::Rpc {
                function: get("DEPLOY_RPC_FUNCTION")
                    .unwrap_or_else(|| DEFAULT_RPC_FUNCTION.to_string()),
            },
            Some("rest") => EndpointStrategy::Rest,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "DEPLOY_ENDPOINT",
                    value: other.to_string(),
                })
            }
        };

        let split_mode = match get("SQL_SPLIT_MODE").as_deref() {
            None | Some("line") => SplitMode::Line,
            Some("quoted") => SplitMode::Quoted,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "SQL_SPLIT_MODE",
                    value: other.to_string(),
                })
            }
        };

        let timeout_ms = parse_or(get("DEPLOY_TIMEOUT_MS"), "DEPLOY_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?;
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "DEPLOY_TIMEOUT_MS",
                value: "0".to_string(),
            });
        }
        let preview_width = parse_or(get("PREVIEW_WIDTH"), "PREVIEW_WIDTH", DEFAULT_PREVIEW_WIDTH)?;

        Ok(Self {
            base_url,
            service_key,
            api_key,
            schema_path: get("SCHEMA_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCHEMA_FILE)),
            endpoint,
            sql_field: get("DEPLOY_SQL_FIELD").unwrap_or_else(|| DEFAULT_SQL_FIELD.to_string()),
            timeout: Duration::from_millis(timeout_ms),
            split_mode,
            preview_width,
            log_level: get("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            file_logs: parse_flag(get("ENABLE_FILE_LOGS"), "ENABLE_FILE_LOGS")?,
            log_dir: get("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
        })
    }

    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint.path())
    }

    /// First host label of the base URL, e.g. the project ref of a hosted instance.
    pub fn project_ref(&self) -> Option<String> {
        let url = Url::parse(&self.base_url).ok()?;
        let label = url.domain()?.split('.').next()?;
        (!label.is_empty()).then(|| label.to_string())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("service_key", &"<redacted>")
            .field("api_key", &"<redacted>")
            .field("schema_path", &self.schema_path)
            .field("endpoint", &self.endpoint)
            .field("sql_field", &self.sql_field)
            .field("timeout", &self.timeout)
            .field("split_mode", &self.split_mode)
            .field("preview_width", &self.preview_width)
            .field("log_level", &self.log_level)
            .field("file_logs", &self.file_logs)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(trimmed.to_string()),
        _ => Err(ConfigError::Invalid {
            key: "SUPABASE_URL",
            value: raw.to_string(),
        }),
    }
}

fn parse_flag(value: Option<String>, key: &'static str) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::trim) {
        None => Ok(false),
        Some("true" | "1") => Ok(true),
        Some("false" | "0") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            key,
            value: other.to_string(),
        }),
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}
