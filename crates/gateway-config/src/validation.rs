//! Load-time validation.
//!
//! Messages address the offending entry as `provider[i] (name)` or
//! `route[i] (name) step[j]`. The first problem found is reported.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{parse_duration, GatewayConfig};
use gateway_core::ConflictResolution;
use secrecy::ExposeSecret;
use std::collections::{HashMap, HashSet};

/// Validate a configuration after environment substitution and defaults
pub fn validate(config: &GatewayConfig) -> ConfigResult<()> {
    if config.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::validation("api_key is required"));
    }

    if parse_duration(&config.default_timeout).is_err() {
        return Err(ConfigError::validation(format!(
            "default_timeout: invalid duration '{}'",
            config.default_timeout
        )));
    }

    if config.providers.is_empty() {
        return Err(ConfigError::validation("at least one provider must be configured"));
    }

    for (i, provider) in config.providers.iter().enumerate() {
        if provider.name.trim().is_empty() {
            return Err(ConfigError::validation(format!("provider[{i}]: name is required")));
        }
        if provider.api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::validation(format!(
                "provider[{i}] ({}): api_key is required",
                provider.name
            )));
        }
        if provider.base_url.trim().is_empty() {
            return Err(ConfigError::validation(format!(
                "provider[{i}] ({}): base_url is required",
                provider.name
            )));
        }
    }

    let provider_names: HashSet<&str> = config.providers.iter().map(|p| p.name.as_str()).collect();

    for (i, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            return Err(ConfigError::validation(format!("route[{i}]: name is required")));
        }
        if route.steps.is_empty() {
            return Err(ConfigError::validation(format!(
                "route[{i}] ({}): at least one step must be configured",
                route.name
            )));
        }

        for (j, step) in route.steps.iter().enumerate() {
            let at = |message: String| {
                ConfigError::validation(format!("route[{i}] ({}) step[{j}]: {message}", route.name))
            };

            if step.provider.trim().is_empty() {
                return Err(at("provider is required".to_string()));
            }
            if step.model.trim().is_empty() {
                return Err(at("model is required".to_string()));
            }
            if !provider_names.contains(step.provider.as_str()) {
                return Err(at(format!(
                    "provider '{}' not found in providers list",
                    step.provider
                )));
            }
            if let Some(timeout) = step.timeout.as_deref().filter(|t| !t.is_empty()) {
                if let Err(e) = parse_duration(timeout) {
                    return Err(at(format!("invalid timeout format: {e}")));
                }
            }
            if let Some(literal) = step.conflict_resolution.as_deref() {
                if let Err(e) = literal.parse::<ConflictResolution>() {
                    return Err(at(e.to_string()));
                }
            }
        }
    }

    Ok(())
}

/// Route names declared more than once, in order of first declaration.
///
/// Duplicates are legal; only the first declaration is ever matched.
pub fn duplicate_route_names(config: &GatewayConfig) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();

    for route in &config.routes {
        let count = counts.entry(route.name.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            order.push(route.name.clone());
        }
    }

    order
}
