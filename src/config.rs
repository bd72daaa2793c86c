// THEORY:
// Where violation records ultimately go (a hosted backend) is deployment
// configuration, not code. The recognized options are {endpoint, api_key},
// resolved exactly once at startup with a fixed precedence:
//
//     explicit injection  >  environment  >  error
//
// There is deliberately no default and no baked-in fallback value. A
// deployment that wants remote delivery must say where; everything else uses
// a local sink and never touches this module.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Environment variable naming the violation-sink endpoint.
pub const ENDPOINT_ENV: &str = "PROCTOR_SINK_ENDPOINT";
/// Environment variable naming the violation-sink API key.
pub const API_KEY_ENV: &str = "PROCTOR_SINK_API_KEY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("violation sink endpoint not configured; inject a SinkConfig or set {ENDPOINT_ENV}")]
    MissingEndpoint,
}

/// Connection settings for a remote violation sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl SinkConfig {
    /// Resolves the sink configuration once, at startup. An explicitly
    /// injected config wins outright; otherwise the environment is consulted;
    /// otherwise resolution fails.
    pub fn resolve(explicit: Option<SinkConfig>) -> Result<SinkConfig, ConfigError> {
        Self::resolve_from(explicit, |name| env::var(name).ok())
    }

    /// `resolve` with a pluggable environment, so precedence is testable
    /// without mutating process state.
    pub fn resolve_from(
        explicit: Option<SinkConfig>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<SinkConfig, ConfigError> {
        if let Some(config) = explicit {
            return Ok(config);
        }

        match lookup(ENDPOINT_ENV) {
            Some(endpoint) if !endpoint.is_empty() => Ok(SinkConfig {
                endpoint,
                api_key: lookup(API_KEY_ENV).filter(|key| !key.is_empty()),
            }),
            _ => Err(ConfigError::MissingEndpoint),
        }
    }
}
