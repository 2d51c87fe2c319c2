//! Distributed tracing setup with OpenTelemetry.
//!
//! Spans always flow through an OpenTelemetry layer when tracing is enabled.
//! With the `otlp` feature and an endpoint configured, they are exported over
//! OTLP/gRPC; otherwise they stay in-process.

use crate::logging::LoggingConfig;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::{
    trace::{Config, RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Service name used when `OTLP_SERVICE_NAME` is unset
pub const DEFAULT_SERVICE_NAME: &str = "ai-gateway";

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Install the OpenTelemetry layer
    pub enabled: bool,
    /// Service name
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// OTLP gRPC endpoint
    pub otlp_endpoint: Option<String>,
    /// Extra gRPC metadata sent with every export
    pub otlp_headers: Vec<(String, String)>,
    /// Extra resource attributes attached to every span
    pub resource_attributes: Vec<(String, String)>,
    /// Log output settings
    pub logging: LoggingConfig,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: None,
            otlp_headers: Vec::new(),
            resource_attributes: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TracingConfig {
    /// Create a new tracing configuration
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Build from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from `OTLP_ENDPOINT`, `OTLP_API_KEY`, `OTLP_HEADERS`,
    /// `OTLP_SERVICE_NAME`, `OTLP_RESOURCE_ATTRIBUTES`, `LOG_FORMAT`, and
    /// `LOG_LEVEL` as returned by `lookup`
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut logging = LoggingConfig::default();
        if let Some(format) = read("LOG_FORMAT") {
            logging = logging.with_format(crate::logging::LogFormat::from_name(&format));
        }
        if let Some(level) = read("LOG_LEVEL") {
            logging = logging.with_level(level);
        }

        let mut config = Self::new(
            read("OTLP_SERVICE_NAME").unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
        )
        .with_logging(logging);

        if let Some(endpoint) = read("OTLP_ENDPOINT") {
            config = config.with_otlp_endpoint(endpoint);
        }
        if let Some(api_key) = read("OTLP_API_KEY") {
            config = config.with_api_key(&api_key);
        }
        if let Some(headers) = read("OTLP_HEADERS") {
            for (key, value) in parse_headers(&headers) {
                config = config.with_otlp_header(key, value);
            }
        }
        if let Some(attributes) = read("OTLP_RESOURCE_ATTRIBUTES") {
            config.resource_attributes = parse_headers(&attributes)
                .into_iter()
                .filter(|(_, value)| !value.is_empty())
                .collect();
        }

        config
    }

    /// Set the OTLP endpoint
    #[must_use]
    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    /// Authenticate exports with `Authorization: Basic base64(key + ":")`
    #[must_use]
    pub fn with_api_key(self, api_key: &str) -> Self {
        let token = STANDARD.encode(format!("{api_key}:"));
        self.with_otlp_header("authorization", format!("Basic {token}"))
    }

    /// Add an export header, replacing any header of the same name
    #[must_use]
    pub fn with_otlp_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        let existing = self
            .otlp_headers
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(&key));
        match existing {
            Some(index) => self.otlp_headers[index] = (key, value),
            None => self.otlp_headers.push((key, value)),
        }
        self
    }

    /// Set the logging configuration
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    fn resource(&self) -> Resource {
        let mut attributes = vec![
            KeyValue::new("service.name", self.service_name.clone()),
            KeyValue::new("service.version", self.service_version.clone()),
        ];
        attributes.extend(
            self.resource_attributes
                .iter()
                .map(|(key, value)| KeyValue::new(key.clone(), value.clone())),
        );
        Resource::new(attributes)
    }
}

/// Parse `key=value,key2=value2`; malformed pairs are skipped
#[must_use]
pub fn parse_headers(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Initialize logging and tracing.
///
/// Returns the tracer provider so the caller can flush it on shutdown.
pub fn init_tracing(config: &TracingConfig) -> Result<Option<TracerProvider>, TracingError> {
    if !config.enabled {
        crate::logging::init_logging(&config.logging)?;
        return Ok(None);
    }

    let provider = build_provider(config)?;
    let tracer = provider.tracer(config.service_name.clone());
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(otel_layer)
        .with(config.logging.fmt_layer())
        .try_init()
        .map_err(|e| TracingError::Init(e.to_string()))?;

    info!(
        service = %config.service_name,
        otlp_endpoint = config.otlp_endpoint.as_deref().unwrap_or("none"),
        "Tracing initialized"
    );

    Ok(Some(provider))
}

fn local_provider(config: &TracingConfig) -> TracerProvider {
    let trace_config = Config::default()
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(config.resource());

    TracerProvider::builder().with_config(trace_config).build()
}

#[cfg(not(feature = "otlp"))]
fn build_provider(config: &TracingConfig) -> Result<TracerProvider, TracingError> {
    if config.otlp_endpoint.is_some() {
        warn!("OTLP_ENDPOINT is set but the binary was built without the `otlp` feature; spans will not be exported");
    }
    Ok(local_provider(config))
}

#[cfg(feature = "otlp")]
fn build_provider(config: &TracingConfig) -> Result<TracerProvider, TracingError> {
    use opentelemetry_otlp::WithExportConfig;
    use tonic::metadata::{MetadataKey, MetadataMap, MetadataValue};

    let Some(endpoint) = config.otlp_endpoint.as_deref() else {
        return Ok(local_provider(config));
    };

    let mut metadata = MetadataMap::new();
    for (key, value) in &config.otlp_headers {
        let key = MetadataKey::from_bytes(key.to_ascii_lowercase().as_bytes())
            .map_err(|e| TracingError::OtlpConfig(format!("header name '{key}': {e}")))?;
        let value = MetadataValue::try_from(value.as_str())
            .map_err(|e| TracingError::OtlpConfig(format!("header value: {e}")))?;
        metadata.insert(key, value);
    }

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .with_metadata(metadata);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(Config::default().with_resource(config.resource()))
        .install_batch(opentelemetry_sdk::runtime::Tokio)
        .map_err(|e| TracingError::OtlpConfig(e.to_string()))
}

/// Flush remaining spans and drop the provider
pub fn shutdown_tracing(provider: Option<TracerProvider>) {
    if let Some(provider) = provider {
        for result in provider.force_flush() {
            if let Err(e) = result {
                warn!(error = %e, "Failed to flush spans");
            }
        }
        drop(provider);
        info!("Tracing shutdown complete");
    }
}

/// Tracing initialization error
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// Failed to initialize tracing
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
    /// OTLP configuration error
    #[error("OTLP configuration error: {0}")]
    OtlpConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use opentelemetry::{Key, Value};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.service_name, "ai-gateway");
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn test_from_lookup() {
        let config = TracingConfig::from_lookup(lookup(&[
            ("OTLP_ENDPOINT", "http://collector:4317"),
            ("OTLP_SERVICE_NAME", "edge-gateway"),
            ("OTLP_HEADERS", "authorization=Basic abc, x-scope = team-a"),
            ("LOG_FORMAT", "json"),
        ]));

        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4317"));
        assert_eq!(config.service_name, "edge-gateway");
        assert_eq!(
            config.otlp_headers,
            vec![
                ("authorization".to_string(), "Basic abc".to_string()),
                ("x-scope".to_string(), "team-a".to_string()),
            ]
        );
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_api_key_becomes_basic_auth_header() {
        let config = TracingConfig::from_lookup(lookup(&[
            ("OTLP_ENDPOINT", "https://collector:4317"),
            ("OTLP_API_KEY", "secret"),
            ("OTLP_HEADERS", "x-scope=team-a"),
        ]));

        assert_eq!(
            config.otlp_headers,
            vec![
                ("authorization".to_string(), "Basic c2VjcmV0Og==".to_string()),
                ("x-scope".to_string(), "team-a".to_string()),
            ]
        );
    }

    #[test]
    fn test_explicit_authorization_header_overrides_api_key() {
        let config = TracingConfig::from_lookup(lookup(&[
            ("OTLP_API_KEY", "secret"),
            ("OTLP_HEADERS", "Authorization=Bearer tok"),
        ]));

        assert_eq!(
            config.otlp_headers,
            vec![("Authorization".to_string(), "Bearer tok".to_string())]
        );
    }

    #[test]
    fn test_resource_attributes_from_lookup() {
        let config = TracingConfig::from_lookup(lookup(&[
            ("OTLP_SERVICE_NAME", "edge-gateway"),
            (
                "OTLP_RESOURCE_ATTRIBUTES",
                "deployment.environment=prod, team = ml,empty=,broken",
            ),
        ]));

        assert_eq!(
            config.resource_attributes,
            vec![
                ("deployment.environment".to_string(), "prod".to_string()),
                ("team".to_string(), "ml".to_string()),
            ]
        );

        let resource = config.resource();
        assert_eq!(
            resource.get(Key::new("deployment.environment")),
            Some(Value::from("prod"))
        );
        assert_eq!(resource.get(Key::new("team")), Some(Value::from("ml")));
        assert_eq!(
            resource.get(Key::new("service.name")),
            Some(Value::from("edge-gateway"))
        );
        assert!(resource.get(Key::new("empty")).is_none());
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = TracingConfig::from_lookup(lookup(&[
            ("OTLP_ENDPOINT", "  "),
            ("OTLP_SERVICE_NAME", ""),
        ]));
        assert!(config.otlp_endpoint.is_none());
        assert_eq!(config.service_name, DEFAULT_SERVICE_NAME);
    }

    #[test]
    fn test_parse_headers_skips_malformed() {
        assert_eq!(
            parse_headers("a=1,broken,=2,b=x=y"),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "x=y".to_string()),
            ]
        );
    }
}
