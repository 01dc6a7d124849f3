//! Hint variants and their parity accumulator.

use std::collections::BTreeSet;
use std::ops::{BitXor, BitXorAssign, Deref};
use std::{fmt, str::FromStr};

/// Subset of block indices a hint ranges over; kept ordered so that
/// iteration is deterministic.
pub type BlockSet = BTreeSet<u32>;

/// A 256-bit XOR accumulator.
///
/// Parities are opaque: the only arithmetic ever applied to them is XOR,
/// so the byte array is both the in-memory and the on-disk
/// representation.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Parity([u8; 32]);

impl Parity {
    /// Width in bytes.
    pub const SIZE: usize = 32;

    /// The neutral element.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Wrap raw bytes.
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Whether no entry has been folded in (or everything cancelled).
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&byte| byte == 0)
    }
}

impl From<[u8; 32]> for Parity {
    #[inline]
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Parity {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for Parity {
    type Target = [u8; 32];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl BitXor for Parity {
    type Output = Parity;

    fn bitxor(mut self, rhs: Self) -> Parity {
        self ^= rhs;
        self
    }
}

impl BitXorAssign for Parity {
    fn bitxor_assign(&mut self, rhs: Self) {
        for (lhs, rhs) in self.0.iter_mut().zip(rhs.0) {
            *lhs ^= rhs;
        }
    }
}

impl fmt::Debug for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Parity").field(&hex::encode(self)).finish()
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self))
    }
}

impl FromStr for Parity {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self::new(bytes))
    }
}

/// A live hint, good for one private query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularHint {
    /// Blocks the parity ranges over; `c/2 + 1` of them.
    pub blocks: BlockSet,
    /// XOR of one entry per covered block.
    pub parity: Parity,
}

/// A dormant hint waiting to replace a consumed regular one.
///
/// Backups accumulate both halves of the block universe so that
/// promotion can pick whichever half excludes the promoting block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupHint {
    /// The designated half of the block universe; `c/2` blocks.
    pub blocks: BlockSet,
    /// Parity over entries whose block is in `blocks`.
    pub parity_in: Parity,
    /// Parity over entries whose block is outside `blocks`.
    pub parity_out: Parity,
}

/// A spent backup, reborn as a query-specific hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotedHint {
    /// The half of the block universe the stored parity ranges over.
    /// Never contains the promoting block; the covered set a query plan
    /// reports is `blocks + {query block}`.
    pub blocks: BlockSet,
    /// Absolute database index of the query that triggered promotion.
    pub query_index: u64,
    /// Parity over `blocks` at this hint's offsets, folded with the
    /// retrieved value at `query_index`.
    pub parity: Parity,
}
