use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Session field seeded with random bytes and sent as the hashing server's
/// session data.
pub const SESSION_HASH_FIELD: &str = "session_hash";

/// Free-form signature field value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    U64(u64),
    I64(i64),
    Text(String),
    Bytes(Vec<u8>),
}

impl FieldValue {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Bytes(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::U64(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::I64(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Named fields merged into the signature after the hashes.
pub type SessionFields = BTreeMap<String, FieldValue>;

/// Assembled request signature, ready for an external encoder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub location_hash1: u32,
    pub location_hash2: u32,
    pub timestamp: u64,
    pub timestamp_since_start: u64,
    pub unknown25: i64,
    /// One hash per request, in request order.
    pub request_hash: Vec<u64>,
    #[serde(flatten)]
    pub fields: SessionFields,
}

impl Signature {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn session_hash(&self) -> Option<&[u8]> {
        self.field(SESSION_HASH_FIELD).and_then(FieldValue::as_bytes)
    }
}
