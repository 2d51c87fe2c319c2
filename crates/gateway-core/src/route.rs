//! Providers, routes, and route steps.
//!
//! A [`Route`] is matched against the `model` field of an inbound request and
//! carries an ordered list of [`RouteStep`]s. Each step names a [`Provider`]
//! (connection details only) plus the upstream model, timeout, and conflict
//! resolution to use for that attempt. All of these are immutable once the
//! configuration has been loaded.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Timeout used when neither the step nor the configuration specifies one.
pub const FALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection configuration for an upstream provider.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Unique provider name referenced by route steps
    pub name: String,
    /// Bearer token sent upstream
    pub api_key: SecretString,
    /// Base URL; `/chat/completions` is appended per call
    pub base_url: String,
}

impl Provider {
    /// Create a new provider configuration
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_key: SecretString::new(api_key.into()),
            base_url: base_url.into(),
        }
    }

    /// Whether the provider has the credentials and address needed to be called.
    ///
    /// This is a configuration sanity check, not a live health probe.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.base_url.is_empty()
    }
}

/// Field-stripping directive applied to the outbound request of a step.
///
/// Some upstreams reject requests carrying both `tools` and `response_format`;
/// a step can keep one and drop the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConflictResolution {
    /// Send the request unchanged
    #[default]
    #[serde(rename = "none")]
    None,
    /// Keep `tools`, remove `response_format`
    #[serde(rename = "tools")]
    RemoveResponseFormat,
    /// Keep `response_format`, remove `tools`
    #[serde(rename = "format")]
    RemoveTools,
}

impl ConflictResolution {
    /// Top-level request field removed by this directive, if any
    #[must_use]
    pub fn competing_field(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::RemoveResponseFormat => Some("response_format"),
            Self::RemoveTools => Some("tools"),
        }
    }

    /// Whether this is the no-op directive
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::RemoveResponseFormat => write!(f, "tools"),
            Self::RemoveTools => write!(f, "format"),
        }
    }
}

/// Returned when a conflict resolution literal is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("conflict_resolution must be 'tools' or 'format', got '{0}'")]
pub struct UnknownConflictResolution(pub String);

impl FromStr for ConflictResolution {
    type Err = UnknownConflictResolution;

    /// Parse the configuration literal. The empty string means no directive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::None),
            "tools" => Ok(Self::RemoveResponseFormat),
            "format" => Ok(Self::RemoveTools),
            other => Err(UnknownConflictResolution(other.to_string())),
        }
    }
}

/// One provider/model attempt within a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStep {
    /// Name of the provider to call
    pub provider: String,
    /// Model sent upstream in place of the client's model
    pub model: String,
    /// Per-step deadline
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
    /// Field-stripping directive
    #[serde(default, skip_serializing_if = "ConflictResolution::is_none")]
    pub conflict_resolution: ConflictResolution,
}

impl RouteStep {
    /// Create a step with no timeout override and no conflict resolution
    #[must_use]
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            timeout: None,
            conflict_resolution: ConflictResolution::None,
        }
    }

    /// Set the step timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the conflict resolution directive
    #[must_use]
    pub fn with_conflict_resolution(mut self, resolution: ConflictResolution) -> Self {
        self.conflict_resolution = resolution;
        self
    }

    /// Step timeout, falling back to the configured default
    #[must_use]
    pub fn resolve_timeout(&self, default_timeout: Duration) -> Duration {
        self.timeout.unwrap_or(default_timeout)
    }
}

/// A named, ordered list of steps matched against a request's model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Exact model name this route answers to
    pub name: String,
    /// Steps attempted in order until one succeeds
    pub steps: Vec<RouteStep>,
}

impl Route {
    /// Create a new route
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<RouteStep>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

/// Validated, immutable routing configuration consumed by the execution engine.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    /// Providers by declaration order
    pub providers: Vec<Provider>,
    /// Routes by declaration order
    pub routes: Vec<Route>,
    /// Timeout for steps that do not set their own
    pub default_timeout: Duration,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            routes: Vec::new(),
            default_timeout: FALLBACK_TIMEOUT,
        }
    }
}

impl RoutingTable {
    /// Create a routing table with the fallback default timeout
    #[must_use]
    pub fn new(providers: Vec<Provider>, routes: Vec<Route>) -> Self {
        Self {
            providers,
            routes,
            ..Default::default()
        }
    }

    /// Set the default step timeout
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Providers keyed by name. A later declaration replaces an earlier one.
    #[must_use]
    pub fn provider_map(&self) -> HashMap<String, Provider> {
        self.providers
            .iter()
            .map(|p| (p.name.clone(), p.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_resolution_parsing() {
        assert_eq!("".parse::<ConflictResolution>(), Ok(ConflictResolution::None));
        assert_eq!(
            "tools".parse::<ConflictResolution>(),
            Ok(ConflictResolution::RemoveResponseFormat)
        );
        assert_eq!(
            "format".parse::<ConflictResolution>(),
            Ok(ConflictResolution::RemoveTools)
        );

        let err = "Tools".parse::<ConflictResolution>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "conflict_resolution must be 'tools' or 'format', got 'Tools'"
        );
    }

    #[test]
    fn test_competing_field() {
        assert_eq!(ConflictResolution::None.competing_field(), None);
        assert_eq!(
            ConflictResolution::RemoveResponseFormat.competing_field(),
            Some("response_format")
        );
        assert_eq!(ConflictResolution::RemoveTools.competing_field(), Some("tools"));
    }

    #[test]
    fn test_provider_availability() {
        assert!(Provider::new("p1", "key", "http://localhost").is_available());
        assert!(!Provider::new("p1", "", "http://localhost").is_available());
        assert!(!Provider::new("p1", "key", "").is_available());
    }

    #[test]
    fn test_step_timeout_resolution() {
        let default_timeout = Duration::from_secs(10);

        let step = RouteStep::new("p1", "gpt-4");
        assert_eq!(step.resolve_timeout(default_timeout), default_timeout);

        let step = step.with_timeout(Duration::from_millis(500));
        assert_eq!(step.resolve_timeout(default_timeout), Duration::from_millis(500));
    }

    #[test]
    fn test_route_serialization() {
        let route = Route::new(
            "smart",
            vec![
                RouteStep::new("p1", "gpt-4")
                    .with_timeout(Duration::from_secs(45))
                    .with_conflict_resolution(ConflictResolution::RemoveResponseFormat),
                RouteStep::new("p2", "gpt-3.5-turbo"),
            ],
        );

        let json = serde_json::to_value(&route).expect("serialize");
        assert_eq!(json["name"], "smart");
        assert_eq!(json["steps"][0]["timeout"], "45s");
        assert_eq!(json["steps"][0]["conflict_resolution"], "tools");
        assert!(json["steps"][1].get("timeout").is_none());
        assert!(json["steps"][1].get("conflict_resolution").is_none());

        let back: Route = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, route);
    }

    #[test]
    fn test_provider_map_last_declaration_wins() {
        let table = RoutingTable::new(
            vec![
                Provider::new("p1", "first", "http://a"),
                Provider::new("p1", "second", "http://b"),
            ],
            Vec::new(),
        );

        let map = table.provider_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map["p1"].base_url, "http://b");
        assert_eq!(table.default_timeout, FALLBACK_TIMEOUT);
    }
}
