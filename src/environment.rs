use std::env;
use std::str::FromStr;

/// Retrieves an environment variable, falling back to a default when unset.
///
/// # Arguments
/// - `var`: The name of the environment variable.
/// - `default`: The value to use when the variable is unset.
///
/// # Returns
/// - `String`
pub fn get_env_or(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Retrieves an environment variable and parses it, falling back to a default
/// when unset or unparseable.
///
/// # Arguments
/// - `var`: The name of the environment variable.
/// - `default`: The value to use when the variable is unset or invalid.
///
/// # Returns
/// - `T`
pub fn get_env_parsed<T: FromStr + Copy>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
