//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{collections::BTreeMap, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use reqwest::{
    Url,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::infra::client::{DEFAULT_ENDPOINT, parse_endpoint};

pub use cli::{ChartInput, CliArgs, RenderArgs, SettingsOverrides, VariantArg};

const LOCAL_CONFIG_BASENAME: &str = "highchart-export";
const ENV_PREFIX: &str = "HIGHCHART_EXPORT";
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::WARN;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub export: ExportSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Render endpoint; always ends with `/`.
    pub endpoint: Url,
    /// Static headers sent with every request.
    pub headers: HeaderMap,
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

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
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
    let mut builder =
        Config::builder().add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

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
    export: RawExportSettings,
    logging: RawLoggingSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(endpoint) = overrides.endpoint.as_ref() {
            self.export.endpoint = Some(endpoint.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { export, logging } = raw;

        let export = build_export_settings(export)?;
        let logging = build_logging_settings(logging)?;

        Ok(Self { export, logging })
    }
}

fn build_export_settings(export: RawExportSettings) -> Result<ExportSettings, LoadError> {
    let raw_endpoint = export
        .endpoint
        .and_then(|value| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let endpoint = parse_endpoint(&raw_endpoint)
        .map_err(|err| LoadError::invalid("export.endpoint", err.to_string()))?;

    let mut headers = HeaderMap::new();
    for (name, value) in export.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            LoadError::invalid("export.headers", format!("invalid header name `{name}`: {err}"))
        })?;
        let header_value = HeaderValue::from_str(&value).map_err(|err| {
            LoadError::invalid(
                "export.headers",
                format!("invalid value for header `{name}`: {err}"),
            )
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(ExportSettings { endpoint, headers })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => DEFAULT_LOG_LEVEL,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawExportSettings {
    endpoint: Option<String>,
    headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}
