//! Deterministic pseudorandom block subsets.
//!
//! Every hint owns a subset of the database's blocks. Subsets are never
//! persisted; they are regenerated on demand from `(key, seed)` by
//! replaying an AES counter stream, so a restored client reconstructs
//! exactly the subsets it had before shutdown.
//!
//! Candidates are 32-bit keystream words reduced modulo the universe
//! size. The reduction carries a small bias when the universe does not
//! divide `2^32`; the subsets are not security-sensitive, so the bias is
//! tolerated in exchange for a replayable stream (see
//! [`SubsetGen::contains`]).

use std::collections::BTreeSet;

use thiserror::Error;

use crate::prf::{CtrStream, PrfKey128};

#[derive(Debug, Error, PartialEq, Eq)]
/// Subset generation errors.
pub enum Error {
    /// A subset cannot be larger than its universe.
    #[error("subset size {size} exceeds universe size {total}")]
    SizeExceedsTotal { size: u32, total: u32 },
}

/// Deterministic generator of fixed-size subsets of `[0, total)`.
#[derive(Clone)]
pub struct SubsetGen {
    key: PrfKey128,
}

impl SubsetGen {
    /// Create a generator; all subsets it produces are functions of this
    /// key and the per-subset seed.
    pub fn new(key: &PrfKey128) -> Self {
        Self { key: *key }
    }

    /// The `size`-element subset of `[0, total)` selected by `seed`.
    ///
    /// Duplicate candidates are dropped silently; the stream is consumed
    /// until the subset is full.
    pub fn generate(
        &self,
        seed: u64,
        size: u32,
        total: u32,
    ) -> Result<BTreeSet<u32>, Error> {
        if size > total {
            return Err(Error::SizeExceedsTotal { size, total });
        }

        let mut subset = BTreeSet::new();
        if size == 0 {
            return Ok(subset);
        }

        let mut stream = CtrStream::new(&self.key, seed);
        while (subset.len() as u32) < size {
            for word in stream.next_u32x4() {
                if subset.len() as u32 == size {
                    break;
                }
                subset.insert(word % total);
            }
        }
        Ok(subset)
    }

    /// Membership test that replays the generation stream instead of
    /// materializing the subset.
    ///
    /// Returns true as soon as `idx` is admitted, false once the subset
    /// fills up without admitting it. Must walk candidates in exactly the
    /// order [`SubsetGen::generate`] does.
    pub fn contains(
        &self,
        seed: u64,
        size: u32,
        total: u32,
        idx: u32,
    ) -> Result<bool, Error> {
        if size > total {
            return Err(Error::SizeExceedsTotal { size, total });
        }
        if size == 0 {
            return Ok(false);
        }

        let mut seen = BTreeSet::new();
        let mut stream = CtrStream::new(&self.key, seed);
        while (seen.len() as u32) < size {
            for word in stream.next_u32x4() {
                if seen.len() as u32 == size {
                    break;
                }
                let candidate = word % total;
                if candidate == idx {
                    return Ok(true);
                }
                seen.insert(candidate);
            }
        }
        Ok(false)
    }
}
