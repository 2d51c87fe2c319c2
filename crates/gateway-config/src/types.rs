//! Configuration file schema.

use crate::error::{ConfigError, ConfigResult};
use gateway_core::{ConflictResolution, Provider, Route, RouteStep, RoutingTable};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Port used when neither the file nor `$PORT` provides one
pub const DEFAULT_PORT: u16 = 8080;

/// Default step timeout literal
pub const DEFAULT_TIMEOUT: &str = "30s";

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_timeout() -> String {
    DEFAULT_TIMEOUT.to_string()
}

/// Top-level gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Key clients must present to the gateway
    #[serde(default = "empty_secret")]
    pub api_key: SecretString,

    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port; zero means "not set" until the loader applies defaults
    #[serde(default)]
    pub port: u16,

    /// Timeout for steps without their own, as a duration literal
    #[serde(default = "default_timeout")]
    pub default_timeout: String,

    /// Upstream providers
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Routes, matched against the request model in declaration order
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Environment variables referenced by the file, sorted
    #[serde(skip)]
    pub env_vars: Vec<String>,
}

/// Provider entry
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Unique name
    #[serde(default)]
    pub name: String,
    /// Upstream bearer token
    #[serde(default = "empty_secret")]
    pub api_key: SecretString,
    /// Upstream base URL
    #[serde(default)]
    pub base_url: String,
}

/// Route entry
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// Model name the route answers to
    #[serde(default)]
    pub name: String,
    /// Ordered steps
    #[serde(default)]
    pub steps: Vec<RouteStepConfig>,
}

/// Route step entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteStepConfig {
    /// Provider name
    #[serde(default)]
    pub provider: String,
    /// Upstream model
    #[serde(default)]
    pub model: String,
    /// Optional duration literal, e.g. `45s`
    #[serde(default)]
    pub timeout: Option<String>,
    /// Optional `tools` or `format`
    #[serde(default)]
    pub conflict_resolution: Option<String>,
}

impl GatewayConfig {
    /// `host:port` to bind
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Route names in declaration order
    #[must_use]
    pub fn route_names(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.name.as_str()).collect()
    }

    /// Parsed default step timeout
    pub fn default_timeout(&self) -> ConfigResult<Duration> {
        parse_duration(&self.default_timeout)
            .map_err(|e| ConfigError::validation(format!("default_timeout: {e}")))
    }

    /// Convert into the immutable routing table used by the execution engine.
    ///
    /// Expects a validated configuration; any literal that fails to parse is
    /// still reported as a validation error.
    pub fn routing_table(&self) -> ConfigResult<RoutingTable> {
        let providers = self
            .providers
            .iter()
            .map(|p| Provider {
                name: p.name.clone(),
                api_key: p.api_key.clone(),
                base_url: p.base_url.clone(),
            })
            .collect();

        let routes = self
            .routes
            .iter()
            .enumerate()
            .map(|(i, route)| {
                let steps = route
                    .steps
                    .iter()
                    .enumerate()
                    .map(|(j, step)| {
                        step.to_route_step()
                            .map_err(|e| ConfigError::validation(format!("route[{i}] ({}) step[{j}]: {e}", route.name)))
                    })
                    .collect::<ConfigResult<Vec<_>>>()?;
                Ok(Route::new(route.name.clone(), steps))
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(RoutingTable::new(providers, routes).with_default_timeout(self.default_timeout()?))
    }
}

impl RouteStepConfig {
    /// Convert into a core route step, parsing the timeout and directive literals
    pub fn to_route_step(&self) -> Result<RouteStep, String> {
        let mut step = RouteStep::new(self.provider.clone(), self.model.clone());

        if let Some(timeout) = self.timeout.as_deref().filter(|t| !t.is_empty()) {
            let timeout = parse_duration(timeout).map_err(|e| format!("invalid timeout format: {e}"))?;
            step = step.with_timeout(timeout);
        }

        if let Some(literal) = self.conflict_resolution.as_deref() {
            let resolution: ConflictResolution = literal.parse().map_err(|e| format!("{e}"))?;
            step = step.with_conflict_resolution(resolution);
        }

        Ok(step)
    }
}

/// Parse a duration literal such as `30s`, `500ms`, `1m 30s`, `1.5s` or `1h30m0.5s`
pub fn parse_duration(literal: &str) -> Result<Duration, humantime::DurationError> {
    let literal = literal.trim();
    humantime::parse_duration(literal).or_else(|e| parse_compact_duration(literal).ok_or(e))
}

/// `<decimal><unit>` sequences with units `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`
fn parse_compact_duration(literal: &str) -> Option<Duration> {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    const MAX_FRACTION_DIGITS: usize = 18;

    let mut rest = literal.strip_prefix('+').unwrap_or(literal);
    if rest == "0" {
        return Some(Duration::ZERO);
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3_600 * NANOS_PER_SEC,
            _ => return None,
        };

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && fraction.is_empty()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let mut nanos = whole.checked_mul(scale)?;

        let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
        if !fraction.is_empty() {
            let digits: u128 = fraction.parse().ok()?;
            let places = u32::try_from(fraction.len()).ok()?;
            nanos = nanos.checked_add(digits * scale / 10u128.pow(places))?;
        }

        total = total.checked_add(nanos)?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).ok()?;
    let subsec = u32::try_from(total % NANOS_PER_SEC).ok()?;
    Some(Duration::new(secs, subsec))
}
