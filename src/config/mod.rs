//! Startup configuration read from the process environment.
//!
//! A `.env` file, if present, is loaded by the binary before
//! [`Settings::from_env`] runs. The credential is the only required value;
//! its absence is fatal and reported before any engine is built.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::consts::{
    API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_BIND_ADDR, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_TEMPERATURE,
};
use crate::error::{Error, Result};

pub const BASE_URL_ENV: &str = "LLM_BASE_URL";
pub const MODEL_ENV: &str = "LLM_MODEL";
pub const TEMPERATURE_ENV: &str = "LLM_TEMPERATURE";
pub const REQUEST_TIMEOUT_ENV: &str = "LLM_REQUEST_TIMEOUT_MS";
pub const FANOUT_TIMEOUT_ENV: &str = "FANOUT_TIMEOUT_SECS";
pub const BIND_ADDR_ENV: &str = "BIND_ADDR";

#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub request_timeout: Duration,
    /// Deadline for the fan-out gather. `None` waits indefinitely.
    pub fanout_timeout: Option<Duration>,
    pub bind_addr: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get(API_KEY_ENV).ok_or_else(|| {
            Error::Configuration(format!("{API_KEY_ENV} environment variable is not set"))
        })?;

        let request_timeout_ms: u64 = parse_opt(REQUEST_TIMEOUT_ENV, get(REQUEST_TIMEOUT_ENV))?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        let fanout_timeout_secs: Option<u64> =
            parse_opt(FANOUT_TIMEOUT_ENV, get(FANOUT_TIMEOUT_ENV))?;
        let temperature: f32 =
            parse_opt(TEMPERATURE_ENV, get(TEMPERATURE_ENV))?.unwrap_or(DEFAULT_TEMPERATURE);
        validate_temperature(temperature)?;

        Ok(Self {
            api_key,
            base_url: get(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get(MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature,
            request_timeout: Duration::from_millis(request_timeout_ms),
            fanout_timeout: fanout_timeout_secs.map(Duration::from_secs),
            bind_addr: get(BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}

fn parse_opt<T>(key: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|e| Error::Configuration(format!("invalid {key} value `{value}`: {e}")))
    })
    .transpose()
}

/// Sampling temperature must be a finite, non-negative number.
pub fn validate_temperature(temperature: f32) -> Result<()> {
    if !temperature.is_finite() || temperature < 0.0 {
        return Err(Error::Configuration(format!(
            "invalid {TEMPERATURE_ENV} value `{temperature}`: must be finite and non-negative"
        )));
    }
    Ok(())
}

// Keeps the credential out of logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .field("fanout_timeout", &self.fanout_timeout)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}
