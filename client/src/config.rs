//! Builder configuration.
//!
//! A [BuilderConfig] is plain data (loadable from YAML). [BuilderConfig::validate]
//! resolves the protocol version and the hash engine once, so an unusable
//! configuration fails before any hashing or network I/O.

use serde::{Deserialize, Serialize};
use sigcraft_types::{HashSeed, SessionFields, VersionPolicy};
use std::{fmt, time::Duration};
use thiserror::Error;
use url::Url;

pub const DEFAULT_VERSION: &str = "0.45";

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_prefer_local() -> bool {
    true
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub hashing_endpoint: Option<String>,
    #[serde(default)]
    pub hashing_key: Option<String>,
    /// Use the local engine when the version allows it.
    #[serde(default = "default_prefer_local")]
    pub prefer_local: bool,
    /// Overrides the version's seed for local hashing.
    #[serde(default)]
    pub hash_seed: Option<HashSeed>,
    /// Overrides the version's `unknown25` constant.
    #[serde(default)]
    pub unknown25: Option<i64>,

    // Clock overrides (unix ms). Unset values are read from the system clock.
    #[serde(default)]
    pub init_time: Option<u64>,
    #[serde(default)]
    pub time: Option<u64>,
    #[serde(default)]
    pub time_since_start: Option<u64>,

    /// Default session fields for every signature.
    #[serde(default)]
    pub fields: SessionFields,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            hashing_endpoint: None,
            hashing_key: None,
            prefer_local: default_prefer_local(),
            hash_seed: None,
            unknown25: None,
            init_time: None,
            time: None,
            time_since_start: None,
            fields: SessionFields::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported protocol version: {0}")]
    UnknownVersion(String),
    #[error("no auth ticket set")]
    MissingAuthTicket,
    #[error("version {version} requires a hashing endpoint and key")]
    RemoteNotConfigured { version: String },
    #[error("no hash seed for local hashing with version {version}")]
    MissingHashSeed { version: String },
    #[error("{field} must be a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },
    #[error("{field} URL scheme must be http or https: {value}")]
    InvalidUrlScheme { field: &'static str, value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("timestamp must be finite and non-negative (got {0})")]
    InvalidTimestamp(f64),
    #[error("session_hash must be bytes or base64 text: {0}")]
    InvalidSessionHash(String),
    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Which engine hashes signatures for a validated configuration.
#[derive(Clone, PartialEq, Eq)]
pub enum EngineSelection {
    Local(HashSeed),
    Remote { endpoint: Url, key: String },
}

impl fmt::Debug for EngineSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineSelection::Local(seed) => f.debug_tuple("Local").field(seed).finish(),
            EngineSelection::Remote { endpoint, .. } => f
                .debug_struct("Remote")
                .field("endpoint", &endpoint.as_str())
                .field("key", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    pub version: String,
    pub policy: &'static VersionPolicy,
    pub engine: EngineSelection,
    pub unknown25: i64,
    pub init_time: Option<u64>,
    pub time: Option<u64>,
    pub time_since_start: Option<u64>,
    pub fields: SessionFields,
    pub request_timeout: Duration,
}

struct RedactedConfig<'a>(&'a BuilderConfig);

impl fmt::Debug for RedactedConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = self.0;
        f.debug_struct("BuilderConfig")
            .field("version", &cfg.version)
            .field("hashing_endpoint", &cfg.hashing_endpoint)
            .field(
                "hashing_key",
                &cfg.hashing_key.as_ref().map(|_| "<redacted>"),
            )
            .field("prefer_local", &cfg.prefer_local)
            .field("hash_seed", &cfg.hash_seed)
            .field("unknown25", &cfg.unknown25)
            .field("init_time", &cfg.init_time)
            .field("time", &cfg.time)
            .field("time_since_start", &cfg.time_since_start)
            .field("fields", &cfg.fields.keys().collect::<Vec<_>>())
            .field("request_timeout_ms", &cfg.request_timeout_ms)
            .finish()
    }
}

impl fmt::Debug for BuilderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        RedactedConfig(self).fmt(f)
    }
}

fn validate_http_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => {}
        _ => {
            return Err(ConfigError::InvalidUrlScheme {
                field,
                value: value.to_string(),
            })
        }
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
    Ok(url)
}

fn ensure_nonzero_u64(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidNonZero { field, value });
    }
    Ok(())
}

impl BuilderConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn redacted_debug(&self) -> impl fmt::Debug + '_ {
        RedactedConfig(self)
    }

    fn remote_selection(&self) -> Result<EngineSelection, ConfigError> {
        let not_configured = || ConfigError::RemoteNotConfigured {
            version: self.version.clone(),
        };
        let endpoint = self
            .hashing_endpoint
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(not_configured)?;
        let key = self
            .hashing_key
            .as_deref()
            .filter(|value| !value.is_empty())
            .ok_or_else(not_configured)?;
        Ok(EngineSelection::Remote {
            endpoint: validate_http_url("hashing_endpoint", endpoint.trim())?,
            key: key.to_string(),
        })
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let policy = VersionPolicy::lookup(&self.version)
            .ok_or_else(|| ConfigError::UnknownVersion(self.version.clone()))?;
        ensure_nonzero_u64("request_timeout_ms", self.request_timeout_ms)?;

        let engine = if policy.allow_local && self.prefer_local {
            let seed = self
                .hash_seed
                .or(policy.hash_seed)
                .ok_or_else(|| ConfigError::MissingHashSeed {
                    version: self.version.clone(),
                })?;
            EngineSelection::Local(seed)
        } else {
            self.remote_selection()?
        };

        Ok(ValidatedConfig {
            version: self.version.trim().to_string(),
            policy,
            engine,
            unknown25: self.unknown25.unwrap_or(policy.unknown25),
            init_time: self.init_time,
            time: self.time,
            time_since_start: self.time_since_start,
            fields: self.fields,
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        })
    }
}
