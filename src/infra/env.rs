use std::str::FromStr;
use std::time::Duration;

use crate::domain::AdapterError;

/// Shared fallback for every HTTP client timeout in the crate.
pub const ENV_GLOBAL_TIMEOUT_SECS: &str = "PDFRAG_HTTP_TIMEOUT_SECS";

pub(crate) fn read_env_var(name: &str) -> Result<Option<String>, AdapterError> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(error) => Err(AdapterError::configuration(format!(
            "{name} could not be read: {error}"
        ))),
    }
}

pub(crate) fn read_parsed_env<T>(name: &str, expected: &str) -> Result<Option<T>, AdapterError>
where
    T: FromStr,
{
    let Some(value) = read_env_var(name)? else {
        return Ok(None);
    };
    parse_value(name, &value, expected).map(Some)
}

pub(crate) fn parse_value<T>(name: &str, value: &str, expected: &str) -> Result<T, AdapterError>
where
    T: FromStr,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|_| AdapterError::configuration(format!("{name} must be {expected}")))
}

pub(crate) fn parse_timeout_seconds(name: &str, value: &str) -> Result<Duration, AdapterError> {
    let parsed: u64 = parse_value(name, value, "a positive integer in seconds")?;
    if parsed == 0 {
        return Err(AdapterError::configuration(format!(
            "{name} must be greater than 0 seconds"
        )));
    }
    Ok(Duration::from_secs(parsed))
}

pub(crate) fn read_timeout_from_env(name: &str) -> Result<Option<Duration>, AdapterError> {
    let Some(value) = read_env_var(name)? else {
        return Ok(None);
    };
    Ok(Some(parse_timeout_seconds(name, &value)?))
}

pub(crate) fn resolve_timeout_with_global_fallback<F>(
    specific_timeout: Option<Duration>,
    read_global_timeout: F,
    default_timeout: Duration,
) -> Result<Duration, AdapterError>
where
    F: FnOnce() -> Result<Option<Duration>, AdapterError>,
{
    if let Some(timeout) = specific_timeout {
        return Ok(timeout);
    }

    Ok(read_global_timeout()?.unwrap_or(default_timeout))
}
