use serde::{Deserialize, Serialize};

/// Serialized size of a [LocationSample].
pub const LOCATION_BYTES: usize = 24;

/// Player position used as location hash input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub accuracy: f64,
}

impl LocationSample {
    pub const fn new(lat: f64, lng: f64, accuracy: f64) -> Self {
        Self { lat, lng, accuracy }
    }

    /// Big-endian `lat || lng || accuracy` with no padding.
    pub fn to_bytes(&self) -> [u8; LOCATION_BYTES] {
        let mut out = [0u8; LOCATION_BYTES];
        out[..8].copy_from_slice(&self.lat.to_be_bytes());
        out[8..16].copy_from_slice(&self.lng.to_be_bytes());
        out[16..].copy_from_slice(&self.accuracy.to_be_bytes());
        out
    }
}
