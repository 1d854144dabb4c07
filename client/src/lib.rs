pub mod builder;
pub mod config;
pub mod encrypt;
pub mod engine;
pub mod wire;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::{SignatureBuilder, SignatureOverrides};
pub use config::{BuilderConfig, ConfigError, EngineSelection, ValidatedConfig};
pub use encrypt::{
    encrypt_payload, timestamp_from_f64, BoxError, PayloadEncryptor, SignatureEncoder,
};
pub use engine::{
    EngineKind, HashEngine, HashJob, HashOutcome, HashServerError, HashServerErrorKind,
    LocalHashEngine, RemoteHashClient,
};
pub use sigcraft_hashing::HashError;
pub use wire::ProtocolError;
use thiserror::Error;

/// Error type for signature building.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("hash computation failed: {0}")]
    Hash(#[from] HashError),
    #[error(transparent)]
    HashServer(#[from] HashServerError),
    #[error("malformed hashing server response: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("hash task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("encryption failed: {0}")]
    Encryption(#[source] BoxError),
}

impl Error {
    /// Whether the caller may retry after backing off. Only rate limiting
    /// qualifies; nothing is retried internally.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Error::HashServer(err) if err.is_retriable())
    }
}

/// Result type for signature building.
pub type Result<T> = std::result::Result<T, Error>;
