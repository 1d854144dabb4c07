//! Hash backends.
//!
//! [LocalHashEngine] computes hashes in-process; [RemoteHashClient] asks a
//! hashing server. Both produce the same [HashOutcome] for a [HashJob].

mod local;
mod remote;

pub use local::LocalHashEngine;
pub use remote::{HashServerError, HashServerErrorKind, RemoteHashClient};

use async_trait::async_trait;
use bytes::Bytes;
use sigcraft_types::LocationSample;
use std::{fmt, future::Future};
use tokio::task::JoinSet;

use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineKind {
    Local,
    Remote,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Local => f.write_str("local"),
            EngineKind::Remote => f.write_str("remote"),
        }
    }
}

/// Inputs for one signature's worth of hashing.
#[derive(Clone, Debug)]
pub struct HashJob {
    pub auth_ticket: Bytes,
    pub location: LocationSample,
    /// Signature timestamp (ms); only the remote engine consumes it.
    pub timestamp: u64,
    /// Session data; only the remote engine consumes it.
    pub session_hash: Bytes,
    pub requests: Vec<Bytes>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashOutcome {
    pub location_hash1: u32,
    pub location_hash2: u32,
    /// `request_hashes[i]` is the hash of `HashJob::requests[i]`.
    pub request_hashes: Vec<u64>,
}

#[async_trait]
pub trait HashEngine: Send + Sync + fmt::Debug {
    fn kind(&self) -> EngineKind;

    /// Compute both location hashes and one hash per request.
    async fn compute(&self, job: &HashJob) -> Result<HashOutcome>;
}

/// Run `hash` for every request concurrently and return the results in
/// request order.
///
/// Each task reports its index and the result lands in that slot, so the
/// output never depends on completion order. The first failure is returned
/// and every task still running is aborted.
pub async fn hash_in_order<F, Fut>(requests: &[Bytes], hash: F) -> Result<Vec<u64>>
where
    F: Fn(usize, Bytes) -> Fut,
    Fut: Future<Output = Result<u64>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for (index, request) in requests.iter().enumerate() {
        let task = hash(index, request.clone());
        tasks.spawn(async move { (index, task.await) });
    }

    let mut slots: Vec<Option<u64>> = vec![None; requests.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined?;
        let value = result?;
        debug_assert!(slots[index].is_none(), "slot {index} written twice");
        slots[index] = Some(value);
    }

    Ok(slots.into_iter().flatten().collect())
}
