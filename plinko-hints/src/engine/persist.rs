//! Parities-only persistence of the hint inventory.
//!
//! Only the header and the parity accumulators hit the disk; block
//! subsets, permutations and sampler state are all deterministic in the
//! master key and are regenerated on load. Lifecycle state (consumed
//! hints, promotions, the query cache) is deliberately not persisted; a
//! restored engine starts a fresh query budget.

use binary_layout::prelude::*;
use thiserror::Error;
use tracing::debug;

use plinko_crypto::prf::PrfKey256;

use crate::hint::Parity;

use super::{HintEngine, Params};

define_layout!(header, LittleEndian, {
    magic: u32,
    version: u32,
    entries: u64,
    block_size: u32,
    lambda: u32,
    queries: u32,
    blocks: u32,
});

/// `"PLHN"` as a little-endian word.
pub const MAGIC: u32 = 0x504c_484e;

/// Current on-disk format version. Unknown versions are rejected, never
/// guessed at.
pub const VERSION: u32 = 1;

#[derive(Debug, Error)]
/// Failures while restoring a persisted hint inventory.
pub enum Error {
    /// The buffer does not start with the hint magic.
    #[error("bad magic {0:#010x}, expected {MAGIC:#010x}")]
    BadMagic(u32),
    /// The format version is not one this build understands.
    #[error("unsupported hint format version {0}")]
    UnsupportedVersion(u32),
    /// The stored block count disagrees with the stored geometry.
    #[error("stored block count {stored} disagrees with derived {derived}")]
    BlockCountMismatch { stored: u32, derived: u32 },
    /// The payload length does not match the header's geometry.
    #[error("hint payload is {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    /// Rebuilding the engine from the stored parameters failed.
    #[error(transparent)]
    Engine(#[from] super::Error),
}

impl HintEngine {
    fn payload_len(params: &Params) -> usize {
        Parity::SIZE * (params.num_regular() + 2 * params.num_backup())
    }

    /// Serialize the header and every parity, in index order. Vacant
    /// slots serialize as zeros.
    pub fn to_bytes(&self) -> Vec<u8> {
        let header_len = header::SIZE.unwrap();
        let mut out = vec![0u8; header_len + Self::payload_len(&self.params)];

        header::magic::write(&mut out[..], MAGIC);
        header::version::write(&mut out[..], VERSION);
        header::entries::write(&mut out[..], self.params.entries);
        header::block_size::write(&mut out[..], self.params.block_size);
        header::lambda::write(&mut out[..], self.params.lambda);
        header::queries::write(&mut out[..], self.params.queries);
        header::blocks::write(&mut out[..], self.params.blocks());

        let mut cursor = header_len;
        let mut put = |out: &mut Vec<u8>, cursor: &mut usize, parity: Option<&Parity>| {
            if let Some(parity) = parity {
                out[*cursor..*cursor + Parity::SIZE].copy_from_slice(parity.as_ref());
            }
            *cursor += Parity::SIZE;
        };

        for hint in &self.regular {
            put(&mut out, &mut cursor, hint.as_ref().map(|h| &h.parity));
        }
        for hint in &self.backup {
            put(&mut out, &mut cursor, hint.as_ref().map(|h| &h.parity_in));
        }
        for hint in &self.backup {
            put(&mut out, &mut cursor, hint.as_ref().map(|h| &h.parity_out));
        }

        out
    }

    /// Restore an engine from [`HintEngine::to_bytes`] output.
    ///
    /// The master key must be the one the snapshot was built with;
    /// subsets and permutations are regenerated from it, then the stored
    /// parities are laid over the freshly initialized hints.
    pub fn from_bytes(bytes: &[u8], master_key: &PrfKey256) -> Result<Self, Error> {
        let header_len = header::SIZE.unwrap();
        if bytes.len() < header_len {
            return Err(Error::LengthMismatch {
                expected: header_len,
                actual: bytes.len(),
            });
        }

        let magic = header::magic::read(bytes);
        if magic != MAGIC {
            return Err(Error::BadMagic(magic));
        }
        let version = header::version::read(bytes);
        if version != VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let params = Params {
            entries: header::entries::read(bytes),
            block_size: header::block_size::read(bytes),
            lambda: header::lambda::read(bytes),
            queries: header::queries::read(bytes),
        };

        let mut engine = HintEngine::new(params, master_key)?;

        let stored_blocks = header::blocks::read(bytes);
        if stored_blocks != params.blocks() {
            return Err(Error::BlockCountMismatch {
                stored: stored_blocks,
                derived: params.blocks(),
            });
        }

        let expected = header_len + Self::payload_len(&params);
        if bytes.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        engine.initialize_hints()?;

        let mut cursor = header_len;
        let mut take = |cursor: &mut usize| {
            let mut parity = [0u8; Parity::SIZE];
            parity.copy_from_slice(&bytes[*cursor..*cursor + Parity::SIZE]);
            *cursor += Parity::SIZE;
            Parity::new(parity)
        };

        for slot in &mut engine.regular {
            let parity = take(&mut cursor);
            if let Some(hint) = slot.as_mut() {
                hint.parity = parity;
            }
        }
        for slot in &mut engine.backup {
            let parity = take(&mut cursor);
            if let Some(hint) = slot.as_mut() {
                hint.parity_in = parity;
            }
        }
        for slot in &mut engine.backup {
            let parity = take(&mut cursor);
            if let Some(hint) = slot.as_mut() {
                hint.parity_out = parity;
            }
        }

        debug!(
            entries = params.entries,
            blocks = params.blocks(),
            "hint parities restored from snapshot"
        );
        Ok(engine)
    }
}
