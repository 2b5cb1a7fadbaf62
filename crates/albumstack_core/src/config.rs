//! Stack configuration.
//!
//! # Responsibility
//! - Hold the names and placement of every declared resource.
//! - Load overrides from a RON file and `ALBUMSTACK_*` environment variables.
//!
//! # Invariants
//! - A loaded config is always validated before it is returned.
//! - Environment overrides win over file values, file values win over defaults.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub const ENV_PREFIX: &str = "ALBUMSTACK_";

const DEFAULT_TABLE_NAME: &str = "AlbumTable";
const DEFAULT_API_NAME: &str = "AlbumApi";
const DEFAULT_STAGE_NAME: &str = "prod";
const DEFAULT_LOG_GROUP_NAME: &str = "AlbumApiAccessLogs";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_ACCOUNT: &str = "000000000000";

/// Names and placement of the declared resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub table_name: String,
    pub api_name: String,
    pub stage_name: String,
    pub log_group_name: String,
    pub region: String,
    pub account: String,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            api_name: DEFAULT_API_NAME.to_string(),
            stage_name: DEFAULT_STAGE_NAME.to_string(),
            log_group_name: DEFAULT_LOG_GROUP_NAME.to_string(),
            region: DEFAULT_REGION.to_string(),
            account: DEFAULT_ACCOUNT.to_string(),
        }
    }
}

impl StackConfig {
    /// Parses a RON document; missing fields fall back to defaults.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            ron::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a RON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_ron_str(&source)
    }

    /// Loads defaults, then the optional file, then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env_overrides(std::env::vars())
    }

    /// Applies `ALBUMSTACK_<FIELD>` overrides from the given variables.
    ///
    /// Unknown `ALBUMSTACK_*` keys are ignored so that unrelated settings
    /// (for example the log level read by the CLI) can share the prefix.
    pub fn with_env_overrides<I>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(field) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let slot = match field {
                "TABLE_NAME" => &mut self.table_name,
                "API_NAME" => &mut self.api_name,
                "STAGE_NAME" => &mut self.stage_name,
                "LOG_GROUP_NAME" => &mut self.log_group_name,
                "REGION" => &mut self.region,
                "ACCOUNT" => &mut self.account,
                _ => continue,
            };
            *slot = value.trim().to_string();
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("table_name", &self.table_name),
            ("api_name", &self.api_name),
            ("stage_name", &self.stage_name),
            ("log_group_name", &self.log_group_name),
            ("region", &self.region),
            ("account", &self.account),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }
        if !is_valid_table_name(&self.table_name) {
            return Err(ConfigError::Invalid(format!(
                "table_name `{}` must be 3-255 chars of [A-Za-z0-9_.-]",
                self.table_name
            )));
        }
        if !self.account.chars().all(|c| c.is_ascii_digit()) || self.account.len() != 12 {
            return Err(ConfigError::Invalid(format!(
                "account `{}` must be a 12-digit id",
                self.account
            )));
        }
        Ok(())
    }

    /// Resource identifier of the table, used in permission grants.
    pub fn table_arn(&self) -> String {
        format!(
            "arn:aws:dynamodb:{}:{}:table/{}",
            self.region, self.account, self.table_name
        )
    }

    pub fn log_group_arn(&self) -> String {
        format!(
            "arn:aws:logs:{}:{}:log-group:{}",
            self.region, self.account, self.log_group_name
        )
    }
}

fn is_valid_table_name(value: &str) -> bool {
    (3..=255).contains(&value.len())
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "failed to read config `{path}`: {message}"),
            Self::Parse(message) => write!(f, "invalid config syntax: {message}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {}
