use async_trait::async_trait;
use sigcraft_hashing::{hash32_salt32, hash64_salt32, hash64_salt64, HashError};
use sigcraft_types::{HashSeed, LocationSample};
use tracing::trace;

use super::{hash_in_order, EngineKind, HashEngine, HashJob, HashOutcome};
use crate::Result;

/// In-process hash engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalHashEngine {
    seed: Option<u32>,
}

impl LocalHashEngine {
    pub fn new(seed: HashSeed) -> Self {
        Self {
            seed: Some(seed.value()),
        }
    }

    /// Engine with an arbitrary (or absent) seed. Every hash fails with
    /// [HashError::MissingSeed] when `seed` is `None`.
    pub fn with_seed(seed: Option<u32>) -> Self {
        Self { seed }
    }

    fn seed(&self, operation: &'static str) -> std::result::Result<u32, HashError> {
        self.seed.ok_or(HashError::MissingSeed(operation))
    }

    /// Location hash bound to the auth ticket.
    pub fn hash_location1(
        &self,
        auth_ticket: &[u8],
        location: &LocationSample,
    ) -> std::result::Result<u32, HashError> {
        let seed = hash32_salt32(auth_ticket, self.seed("hash_location1")?);
        Ok(hash32_salt32(&location.to_bytes(), seed))
    }

    pub fn hash_location2(&self, location: &LocationSample) -> std::result::Result<u32, HashError> {
        Ok(hash32_salt32(&location.to_bytes(), self.seed("hash_location2")?))
    }

    pub fn hash_request(
        &self,
        auth_ticket: &[u8],
        request: &[u8],
    ) -> std::result::Result<u64, HashError> {
        let seed = hash64_salt32(auth_ticket, self.seed("hash_request")?);
        Ok(hash64_salt64(request, seed))
    }
}

#[async_trait]
impl HashEngine for LocalHashEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Local
    }

    async fn compute(&self, job: &HashJob) -> Result<HashOutcome> {
        let location_hash1 = self.hash_location1(&job.auth_ticket, &job.location)?;
        let location_hash2 = self.hash_location2(&job.location)?;

        let engine = *self;
        let ticket = job.auth_ticket.clone();
        let request_hashes = hash_in_order(&job.requests, |index, request| {
            let ticket = ticket.clone();
            async move {
                let hash = engine.hash_request(&ticket, &request)?;
                trace!(index, len = request.len(), hash, "hashed request");
                Ok::<_, crate::Error>(hash)
            }
        })
        .await?;

        Ok(HashOutcome {
            location_hash1,
            location_hash2,
            request_hashes,
        })
    }
}
