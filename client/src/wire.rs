//! Hashing-server wire format.
//!
//! Coordinates (in the [WireRevision::Bits64] revision) and returned request
//! hashes are full 64-bit integers. Servers and intermediaries that parse JSON
//! numbers as doubles lose precision above 2^53, so bare integer literals of
//! 16 or more digits are quoted before the text reaches a JSON parser and the
//! wide fields accept either form.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use regex::{Captures, Regex};
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};
use serde_json::{json, Map, Value};
use sigcraft_types::{LocationSample, WireRevision};
use std::{borrow::Cow, fmt, sync::LazyLock};
use thiserror::Error;

use crate::engine::{HashJob, HashOutcome};

/// Digits at which a bare JSON integer is quoted.
pub const WIDE_INTEGER_DIGITS: usize = 16;

// Matches whole string literals (so their contents are skipped) or whole
// number tokens.
static JSON_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?"#)
        .expect("invalid json token pattern")
});

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("expected {expected} request hashes, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("{field} out of range: {value}")]
    InvalidInteger { field: &'static str, value: i128 },
}

fn is_wide_integer(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    digits.len() >= WIDE_INTEGER_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Quote every bare integer literal of [WIDE_INTEGER_DIGITS] or more digits.
///
/// String literals and non-integer numbers are left untouched.
pub fn quote_wide_integers(text: &str) -> Cow<'_, str> {
    JSON_TOKEN.replace_all(text, |caps: &Captures<'_>| {
        let token = &caps[0];
        if is_wide_integer(token) {
            format!("\"{token}\"")
        } else {
            token.to_string()
        }
    })
}

/// Integer that arrives either as a JSON number or as a quoted decimal string.
///
/// Held as `i128` so both signed and unsigned 64-bit encodings of the same
/// bit pattern are accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WideInt(pub i128);

impl WideInt {
    /// Bit pattern as `u64`; negative values are read as two's complement i64.
    pub fn to_u64(self, field: &'static str) -> Result<u64, ProtocolError> {
        if let Ok(value) = u64::try_from(self.0) {
            return Ok(value);
        }
        i64::try_from(self.0)
            .map(|value| value as u64)
            .map_err(|_| ProtocolError::InvalidInteger {
                field,
                value: self.0,
            })
    }

    /// Bit pattern as `u32`; negative values are read as two's complement i32.
    pub fn to_u32(self, field: &'static str) -> Result<u32, ProtocolError> {
        if let Ok(value) = u32::try_from(self.0) {
            return Ok(value);
        }
        i32::try_from(self.0)
            .map(|value| value as u32)
            .map_err(|_| ProtocolError::InvalidInteger {
                field,
                value: self.0,
            })
    }
}

impl<'de> Deserialize<'de> for WideInt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct WideIntVisitor;

        impl Visitor<'_> for WideIntVisitor {
            type Value = WideInt;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or a decimal string")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<WideInt, E> {
                Ok(WideInt(value.into()))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<WideInt, E> {
                Ok(WideInt(value.into()))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<WideInt, E> {
                value
                    .trim()
                    .parse::<i128>()
                    .map(WideInt)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_any(WideIntVisitor)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HashResponseBody {
    #[serde(default)]
    location_auth_hash: Option<WideInt>,
    #[serde(default)]
    location_hash: Option<WideInt>,
    #[serde(default)]
    request_hashes: Option<Vec<WideInt>>,
}

fn location_fields(location: &LocationSample, wire: WireRevision) -> Map<String, Value> {
    let mut fields = Map::new();
    match wire {
        WireRevision::Plain => {
            fields.insert("Latitude".into(), json!(location.lat));
            fields.insert("Longitude".into(), json!(location.lng));
            fields.insert("Altitude".into(), json!(location.accuracy));
        }
        WireRevision::Bits64 => {
            fields.insert("Latitude64".into(), json!(location.lat.to_bits() as i64));
            fields.insert("Longitude64".into(), json!(location.lng.to_bits() as i64));
            fields.insert("Accuracy64".into(), json!(location.accuracy.to_bits() as i64));
        }
    }
    fields
}

/// Encode a hashing-server request body.
///
/// 64-bit fields are written as bare integer literals; serde_json emits
/// `i64` exactly so no intermediate quoting is needed on this side.
pub fn encode_request(job: &HashJob, wire: WireRevision) -> Result<String, ProtocolError> {
    let mut body = location_fields(&job.location, wire);
    body.insert("Timestamp".into(), json!(job.timestamp));
    body.insert("AuthTicket".into(), json!(B64.encode(&job.auth_ticket)));
    body.insert("SessionData".into(), json!(B64.encode(&job.session_hash)));
    body.insert(
        "Requests".into(),
        job.requests
            .iter()
            .map(|request| Value::from(B64.encode(request)))
            .collect(),
    );
    Ok(serde_json::to_string(&body)?)
}

/// Parse a successful hashing-server response for `expected` requests.
pub fn decode_response(text: &str, expected: usize) -> Result<HashOutcome, ProtocolError> {
    let repaired = quote_wide_integers(text);
    let body: HashResponseBody = serde_json::from_str(&repaired)?;

    let location_hash1 = body
        .location_auth_hash
        .ok_or(ProtocolError::MissingField("locationAuthHash"))?
        .to_u32("locationAuthHash")?;
    let location_hash2 = body
        .location_hash
        .ok_or(ProtocolError::MissingField("locationHash"))?
        .to_u32("locationHash")?;
    let request_hashes = body
        .request_hashes
        .ok_or(ProtocolError::MissingField("requestHashes"))?
        .into_iter()
        .map(|hash| hash.to_u64("requestHashes"))
        .collect::<Result<Vec<_>, _>>()?;
    if request_hashes.len() != expected {
        return Err(ProtocolError::LengthMismatch {
            expected,
            got: request_hashes.len(),
        });
    }

    Ok(HashOutcome {
        location_hash1,
        location_hash2,
        request_hashes,
    })
}
