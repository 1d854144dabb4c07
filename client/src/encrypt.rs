//! Boundary to the external signature encoder and payload encryptor.
//!
//! Neither primitive is implemented here; callers plug in the protobuf
//! encoder for [Signature] and the platform's encryption routine.

use sigcraft_types::Signature;
use tracing::debug;

use crate::{ConfigError, Error, Result};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Serializes an assembled [Signature] to its wire bytes.
pub trait SignatureEncoder {
    fn encode_signature(&self, signature: &Signature) -> Vec<u8>;
}

/// Encrypts a serialized signature.
pub trait PayloadEncryptor {
    fn encrypt(
        &self,
        payload: &[u8],
        timestamp_since_start: u64,
        version: &str,
    ) -> std::result::Result<Vec<u8>, BoxError>;
}

impl<F> SignatureEncoder for F
where
    F: Fn(&Signature) -> Vec<u8>,
{
    fn encode_signature(&self, signature: &Signature) -> Vec<u8> {
        self(signature)
    }
}

/// Convert a caller-held `f64` elapsed time (ms) to the integer the encryptor
/// takes, rejecting NaN, infinities, negatives and values beyond `u64`.
pub fn timestamp_from_f64(timestamp_since_start: f64) -> Result<u64> {
    if !timestamp_since_start.is_finite()
        || timestamp_since_start < 0.0
        || timestamp_since_start >= u64::MAX as f64
    {
        return Err(ConfigError::InvalidTimestamp(timestamp_since_start).into());
    }
    Ok(timestamp_since_start as u64)
}

/// Call `encryptor` exactly once.
///
/// Encryptor failures are returned as [Error::Encryption] unchanged.
pub fn encrypt_payload<E>(
    encryptor: &E,
    payload: &[u8],
    timestamp_since_start: u64,
    version: &str,
) -> Result<Vec<u8>>
where
    E: PayloadEncryptor + ?Sized,
{
    debug!(len = payload.len(), version, "encrypting signature");
    encryptor
        .encrypt(payload, timestamp_since_start, version)
        .map_err(Error::Encryption)
}
