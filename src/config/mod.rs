//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::loader::{JsonFieldMapper, LoaderSettings};

mod cli;

pub use cli::{CliArgs, Command, FetchArgs, LoaderOverrides, ScrollArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "pager";
const ENV_PREFIX: &str = "PAGER";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    /// URL template; required by every command that touches the network.
    pub url: Option<String>,
    pub loader: LoaderSettings,
    pub mapping: JsonFieldMapper,
    pub http: HttpSettings,
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

#[derive(Debug, Clone, Default)]
pub struct HttpSettings {
    pub timeout: Option<Duration>,
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

/// Parse the command line and load settings for it.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(cli.command.overrides());

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    loader: RawLoaderSettings,
    mapping: RawMappingSettings,
    http: RawHttpSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoaderSettings {
    url: Option<String>,
    page_size: Option<u32>,
    initial_page: Option<u32>,
    debounce_ms: Option<u64>,
    cache_pages: Option<usize>,
    auto_load_initial: Option<bool>,
    abortable: Option<bool>,
    threshold: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawMappingSettings {
    items_pointer: Option<String>,
    page_pointer: Option<String>,
    total_pages_pointer: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawHttpSettings {
    timeout_seconds: Option<u64>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &LoaderOverrides) {
        if let Some(url) = overrides.url.as_ref() {
            self.loader.url = Some(url.clone());
        }
        if let Some(size) = overrides.page_size {
            self.loader.page_size = Some(size);
        }
        if let Some(millis) = overrides.debounce_ms {
            self.loader.debounce_ms = Some(millis);
        }
        if let Some(pages) = overrides.cache_pages {
            self.loader.cache_pages = Some(pages);
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
        let RawSettings {
            logging,
            loader,
            mapping,
            http,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let (url, loader) = build_loader_settings(loader)?;
        let mapping = build_mapping_settings(mapping)?;
        let http = build_http_settings(http)?;

        Ok(Self {
            logging,
            url,
            loader,
            mapping,
            http,
        })
    }

    /// The URL template, or an error naming the missing key.
    pub fn require_url(&self) -> Result<&str, LoadError> {
        self.url
            .as_deref()
            .ok_or_else(|| LoadError::invalid("loader.url", "a URL template is required"))
    }
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

fn build_loader_settings(
    loader: RawLoaderSettings,
) -> Result<(Option<String>, LoaderSettings), LoadError> {
    let defaults = LoaderSettings::default();

    let url = loader.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let page_size = loader.page_size.unwrap_or(defaults.page_size);
    if page_size == 0 {
        return Err(LoadError::invalid(
            "loader.page_size",
            "must be greater than zero",
        ));
    }

    let cache_pages = loader.cache_pages.unwrap_or(defaults.cache_pages);
    if cache_pages == 0 {
        return Err(LoadError::invalid(
            "loader.cache_pages",
            "must be greater than zero",
        ));
    }

    let threshold = loader.threshold.unwrap_or(defaults.threshold);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(LoadError::invalid(
            "loader.threshold",
            "must be between 0.0 and 1.0",
        ));
    }

    let settings = LoaderSettings {
        page_size,
        initial_page: loader.initial_page.unwrap_or(defaults.initial_page),
        debounce_ms: loader.debounce_ms.unwrap_or(defaults.debounce_ms),
        cache_pages,
        auto_load_initial: loader
            .auto_load_initial
            .unwrap_or(defaults.auto_load_initial),
        abortable: loader.abortable.unwrap_or(defaults.abortable),
        threshold,
    };

    Ok((url, settings))
}

fn build_mapping_settings(mapping: RawMappingSettings) -> Result<JsonFieldMapper, LoadError> {
    let defaults = JsonFieldMapper::default();
    Ok(JsonFieldMapper {
        items_pointer: json_pointer(
            mapping.items_pointer,
            defaults.items_pointer,
            "mapping.items_pointer",
        )?,
        page_pointer: json_pointer(
            mapping.page_pointer,
            defaults.page_pointer,
            "mapping.page_pointer",
        )?,
        total_pages_pointer: json_pointer(
            mapping.total_pages_pointer,
            defaults.total_pages_pointer,
            "mapping.total_pages_pointer",
        )?,
    })
}

fn json_pointer(
    value: Option<String>,
    default: String,
    key: &'static str,
) -> Result<String, LoadError> {
    let pointer = value.unwrap_or(default);
    if !pointer.is_empty() && !pointer.starts_with('/') {
        return Err(LoadError::invalid(
            key,
            format!("JSON pointer `{pointer}` must be empty or start with `/`"),
        ));
    }
    Ok(pointer)
}

fn build_http_settings(http: RawHttpSettings) -> Result<HttpSettings, LoadError> {
    let timeout = match http.timeout_seconds {
        Some(0) => {
            return Err(LoadError::invalid(
                "http.timeout_seconds",
                "must be greater than zero",
            ));
        }
        Some(seconds) => Some(Duration::from_secs(seconds)),
        None => None,
    };
    Ok(HttpSettings { timeout })
}
