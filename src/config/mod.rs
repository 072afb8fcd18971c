//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{fs, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::submission::SubmissionPolicy;

mod cli;


pub use cli::*;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "postdesk";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub remote: RemoteSettings,
    pub logging: LoggingSettings,
    pub workflow: WorkflowSettings,
    pub user: UserSettings,
}

#[derive(Clone)]
pub struct RemoteSettings {
    pub base_url: Option<Url>,
    /// Site the post detail paths are resolved against; defaults to `base_url`.
    pub site_url: Option<Url>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for RemoteSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSettings")
            .field("base_url", &self.base_url)
            .field("site_url", &self.site_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkflowSettings {
    pub policy: SubmissionPolicy,
}

#[derive(Debug, Clone)]
pub struct UserSettings {
    pub id: Option<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("failed to read api key file {path}: {source}")]
    KeyFile {
        path: String,
        source: std::io::Error,
    },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("POSTDESK").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    if let Some(overrides) = cli.command.overrides() {
        raw.apply_overrides(overrides)?;
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    remote: RawRemoteSettings,
    logging: RawLoggingSettings,
    workflow: RawWorkflowSettings,
    user: RawUserSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &RemoteOverrides) -> Result<(), LoadError> {
        if let Some(url) = overrides.base_url.as_ref() {
            self.remote.base_url = Some(url.clone());
        }
        if let Some(url) = overrides.site_url.as_ref() {
            self.remote.site_url = Some(url.clone());
        }
        if let Some(path) = overrides.api_key_file.as_ref() {
            let key = fs::read_to_string(path).map_err(|source| LoadError::KeyFile {
                path: path.display().to_string(),
                source,
            })?;
            self.remote.api_key = Some(key.trim().to_string());
        }
        if let Some(seconds) = overrides.timeout_seconds {
            self.remote.timeout_seconds = Some(seconds);
        }
        if let Some(id) = overrides.user_id.as_ref() {
            self.user.id = Some(id.clone());
        }
        if let Some(policy) = overrides.policy.as_ref() {
            self.workflow.policy = Some(policy.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        Ok(())
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            remote,
            logging,
            workflow,
            user,
        } = raw;

        let remote = build_remote_settings(remote)?;
        let logging = build_logging_settings(logging)?;
        let workflow = build_workflow_settings(workflow)?;
        let user = build_user_settings(user);

        Ok(Self {
            remote,
            logging,
            workflow,
            user,
        })
    }
}

fn build_remote_settings(remote: RawRemoteSettings) -> Result<RemoteSettings, LoadError> {
    let base_url = parse_url(remote.base_url, "remote.base_url")?;
    let site_url = parse_url(remote.site_url, "remote.site_url")?;
    let api_key = non_blank(remote.api_key);

    let timeout_secs = remote.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "remote.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(RemoteSettings {
        base_url,
        site_url,
        api_key,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_workflow_settings(workflow: RawWorkflowSettings) -> Result<WorkflowSettings, LoadError> {
    let policy = match workflow.policy {
        Some(policy) => SubmissionPolicy::from_str(&policy)
            .map_err(|reason| LoadError::invalid("workflow.policy", reason))?,
        None => SubmissionPolicy::default(),
    };
    Ok(WorkflowSettings { policy })
}

fn build_user_settings(user: RawUserSettings) -> UserSettings {
    UserSettings {
        id: non_blank(user.id),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRemoteSettings {
    base_url: Option<String>,
    site_url: Option<String>,
    api_key: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawWorkflowSettings {
    policy: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUserSettings {
    id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_url(value: Option<String>, key: &'static str) -> Result<Option<Url>, LoadError> {
    non_blank(value)
        .map(|raw| {
            Url::parse(&raw).map_err(|err| LoadError::invalid(key, format!("`{raw}`: {err}")))
        })
        .transpose()
}
