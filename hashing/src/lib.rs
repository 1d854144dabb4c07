//! Local implementation of the request signature hash.
//!
//! The hash accumulates 16-byte lanes into a 128-bit value and is computed
//! entirely with 64-bit words (see [Int128]) so every carry is explicit.
//! Inputs are salted with a big-endian seed prefix before hashing:
//! [hash32_salt32] produces location hashes and [hash64_salt64] produces
//! request hashes.

mod hash;
mod int128;

pub use hash::{
    fold32, hash32, hash32_salt32, hash64, hash64_salt32, hash64_salt64, hash_block, BLOCK_SIZE,
    LANE_SIZE,
};
pub use int128::Int128;
use thiserror::Error;

/// Error type for local hash computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("no seed provided for {0}")]
    MissingSeed(&'static str),
    #[error("block of {len} bytes must be a multiple of 16 and at most 128 bytes")]
    UnalignedBlock { len: usize },
}
