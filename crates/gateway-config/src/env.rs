//! `${NAME}` environment variable substitution.

use crate::error::{ConfigError, ConfigResult};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeSet;

#[allow(clippy::expect_used)]
static ENV_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static pattern"));

/// Sorted, deduplicated names of every variable referenced in `raw`
pub fn referenced_vars(raw: &str) -> Vec<String> {
    ENV_REF
        .captures_iter(raw)
        .map(|caps| caps[1].to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Replace every `${NAME}` with the value returned by `lookup`.
///
/// A variable that is unset or empty is an error; all such names are reported
/// together, sorted.
pub fn expand<F>(raw: &str, lookup: F) -> ConfigResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let missing: Vec<String> = referenced_vars(raw)
        .into_iter()
        .filter(|name| lookup(name).map_or(true, |value| value.is_empty()))
        .collect();

    if !missing.is_empty() {
        return Err(ConfigError::MissingEnvVars(missing));
    }

    Ok(ENV_REF
        .replace_all(raw, |caps: &Captures<'_>| lookup(&caps[1]).unwrap_or_default())
        .into_owned())
}
