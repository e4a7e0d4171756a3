//! Small readers shared by the `config` modules.
//!
//! Every config type has a `from_lookup` constructor taking a key lookup, so
//! tests can feed values without touching the process environment.
//! `from_env` passes [`process_env`].

use std::str::FromStr;

pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Trimmed value, with empty strings treated as unset.
pub fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parsed value, falling back to `default` when unset or unparseable.
pub fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match non_empty(lookup, key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("ignoring invalid {key}={raw:?}");
            default
        }),
        None => default,
    }
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

pub fn flag_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    lookup(key).and_then(|v| parse_flag(&v)).unwrap_or(default)
}

/// Boolean switch read straight from the process environment.
pub fn parse_bool_env(var_name: &str, default: bool) -> bool {
    flag_or(&process_env, var_name, default)
}

#[cfg(test)]
pub(crate) fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let owned: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| {
        owned
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}
