//! Per-version protocol constants.
//!
//! Each protocol version is described by one row of [VERSION_POLICIES];
//! supporting a new version is a data change.

use serde::{Deserialize, Serialize};

/// Seed prepended to local hash inputs.
///
/// `Legacy` is the seed of the 0.45 local path; `Current` belongs to the
/// 0.45.1 sub-revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashSeed {
    Current,
    Legacy,
}

impl HashSeed {
    pub const fn value(self) -> u32 {
        match self {
            HashSeed::Current => 0x46e9_45f8,
            HashSeed::Legacy => 0x6124_7fbf,
        }
    }
}

/// How coordinates are carried in hashing-server requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireRevision {
    /// `Latitude`, `Longitude`, `Altitude` as JSON numbers.
    Plain,
    /// `Latitude64`, `Longitude64`, `Accuracy64` as the IEEE-754 bit pattern
    /// reinterpreted as a signed 64-bit integer.
    Bits64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionPolicy {
    pub prefix: &'static str,
    /// Value of the signature's `unknown25` field.
    pub unknown25: i64,
    /// Whether hashes may be computed locally.
    pub allow_local: bool,
    pub hash_seed: Option<HashSeed>,
    /// API segment of the hashing-server path (`api/{api}/hash`).
    pub api: &'static str,
    pub wire: WireRevision,
}

pub const VERSION_POLICIES: &[VersionPolicy] = &[
    VersionPolicy {
        prefix: "0.45",
        unknown25: 16_892_874_496_697_272_497u64 as i64,
        allow_local: true,
        hash_seed: Some(HashSeed::Legacy),
        api: "v119",
        wire: WireRevision::Plain,
    },
    VersionPolicy {
        prefix: "0.45.1",
        unknown25: 16_892_874_496_697_272_497u64 as i64,
        allow_local: true,
        hash_seed: Some(HashSeed::Current),
        api: "v119",
        wire: WireRevision::Plain,
    },
    VersionPolicy {
        prefix: "0.51",
        unknown25: -8_832_040_574_896_607_694,
        allow_local: false,
        hash_seed: None,
        api: "v121_2",
        wire: WireRevision::Plain,
    },
    VersionPolicy {
        prefix: "0.53",
        unknown25: -76_506_539_888_958_491,
        allow_local: false,
        hash_seed: None,
        api: "v123_1",
        wire: WireRevision::Plain,
    },
    VersionPolicy {
        prefix: "0.55",
        unknown25: -9_156_899_491_064_153_954,
        allow_local: false,
        hash_seed: None,
        api: "v125",
        wire: WireRevision::Plain,
    },
    VersionPolicy {
        prefix: "0.57",
        unknown25: -816_976_800_928_766_045,
        allow_local: false,
        hash_seed: None,
        api: "v127_2",
        wire: WireRevision::Bits64,
    },
    VersionPolicy {
        prefix: "0.59",
        unknown25: -3_226_782_243_204_485_589,
        allow_local: false,
        hash_seed: None,
        api: "v127_4",
        wire: WireRevision::Bits64,
    },
    VersionPolicy {
        prefix: "0.61",
        unknown25: 1_296_456_256_998_993_698,
        allow_local: false,
        hash_seed: None,
        api: "v129_1",
        wire: WireRevision::Bits64,
    },
];

impl VersionPolicy {
    /// `version` matches when it equals the prefix or extends it with a
    /// further dotted component ("0.45" and "0.45.1", but not "0.451").
    pub fn matches(&self, version: &str) -> bool {
        match version.strip_prefix(self.prefix) {
            Some("") => true,
            Some(rest) => rest.starts_with('.'),
            None => false,
        }
    }

    /// Most specific policy for `version`: the longest matching prefix wins.
    pub fn lookup(version: &str) -> Option<&'static VersionPolicy> {
        let version = version.trim();
        VERSION_POLICIES
            .iter()
            .filter(|policy| policy.matches(version))
            .max_by_key(|policy| policy.prefix.len())
    }
}
