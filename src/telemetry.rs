//! Process bootstrap for logs and codec metrics
//!
//! `framectl` needs two things: structured logs on stderr, so stdout stays
//! free for frame output, and a meter provider so the codec instruments in
//! `codec::telemetry` record somewhere. Library users who bring their own
//! subscriber and provider never call into this module.
//!
//! Environment:
//! - `RUST_LOG`: filter directives, overriding the requested log level
//! - `TSFRAME_LOG_FORMAT`: `json` (default) or `text`
//! - `OTEL_SERVICE_NAME`, `OTEL_RESOURCE_ATTRIBUTES`: metric resource

use std::fmt;
use std::str::FromStr;

use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::Resource;
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::{Error, Result};

/// Line format of the stderr log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Json => "json",
            LogFormat::Text => "text",
        })
    }
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" => Ok(LogFormat::Text),
            other => Err(Error::Config(format!(
                "unknown log format '{}'. Use 'json' or 'text'",
                other
            ))),
        }
    }
}

/// Logging and metric resource settings for one tool invocation.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub log_level: Level,
    pub log_format: LogFormat,
    /// Resource attributes attached to every metric, `service.*` included
    pub resource: Vec<KeyValue>,
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>, log_level: Level) -> Self {
        let service_name = service_name.into();
        Self {
            resource: vec![
                KeyValue::new("service.name", service_name.clone()),
                KeyValue::new("service.namespace", "tsframe"),
            ],
            service_name,
            log_level,
            log_format: LogFormat::default(),
        }
    }

    /// Defaults overridden by the `OTEL_*` and `TSFRAME_LOG_FORMAT` variables.
    pub fn from_env(default_service_name: &str, log_level: &str) -> Result<Self> {
        let service_name = match std::env::var("OTEL_SERVICE_NAME") {
            Ok(name) if name.trim().is_empty() => {
                return Err(Error::Config("OTEL_SERVICE_NAME is set but empty".to_string()))
            }
            Ok(name) => name.trim().to_string(),
            Err(_) => default_service_name.to_string(),
        };
        let mut config = Self::new(service_name, parse_log_level(log_level)?);

        if let Ok(format) = std::env::var("TSFRAME_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }
        if let Ok(raw) = std::env::var("OTEL_RESOURCE_ATTRIBUTES") {
            config.merge_resource(&raw)?;
        }
        Ok(config)
    }

    /// Add `key=value,...` pairs; `service.name` stays as configured.
    fn merge_resource(&mut self, raw: &str) -> Result<()> {
        for (key, value) in parse_resource_attributes(raw)? {
            if key == "service.name" {
                continue;
            }
            self.resource.retain(|kv| kv.key.as_str() != key);
            self.resource.push(KeyValue::new(key, value));
        }
        Ok(())
    }
}

/// Keeps the meter provider alive; metrics flush when it is dropped.
pub struct Telemetry {
    config: TelemetryConfig,
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    /// Install the stderr log subscriber and the global meter provider.
    pub fn init_for_component(default_service_name: &str, log_level: &str) -> Result<Self> {
        Self::init(TelemetryConfig::from_env(default_service_name, log_level)?)
    }

    pub fn init(config: TelemetryConfig) -> Result<Self> {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(config.log_level).into())
            .from_env_lossy();
        let builder = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        let installed = match config.log_format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Text => builder.try_init(),
        };
        installed.map_err(|e| Error::Config(format!("log subscriber already installed: {}", e)))?;

        let meter_provider = SdkMeterProvider::builder()
            .with_resource(Resource::new(config.resource.clone()))
            .build();
        global::set_meter_provider(meter_provider.clone());

        info!(
            service_name = %config.service_name,
            log_format = %config.log_format,
            "Telemetry initialized"
        );
        Ok(Self {
            config,
            meter_provider,
        })
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        let _ = self.meter_provider.shutdown();
    }
}

fn parse_log_level(raw: &str) -> Result<Level> {
    raw.trim()
        .parse::<Level>()
        .map_err(|_| Error::Config(format!("invalid log level '{}'", raw.trim())))
}

fn parse_resource_attributes(raw: &str) -> Result<Vec<(String, String)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(Error::Config(format!(
                "resource attribute '{}' is not key=value",
                pair
            ))),
        })
        .collect()
}
