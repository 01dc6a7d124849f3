//! Key derivation for the per-block iPRF instances.
//!
//! A 32-byte master secret and a block index deterministically derive the
//! 32-byte key of that block's iPRF; the hint engine relies on identical
//! `(master, block)` pairs yielding identical keys across restarts, since
//! subsets and permutations are regenerated rather than persisted.

use crate::prf::{BlockCipher, PrfKey128, PrfKey256};

/// Domain-separation tag baked into every derivation block ("PLNK").
pub const KDF_TAG: u32 = 0x504c_4e4b;

/// Derive the 32-byte iPRF key for one database block.
///
/// Two counter blocks `(block ‖ tag ‖ counter)` are encrypted under the
/// first half of the master key and concatenated.
pub fn derive_block_key(master: &PrfKey256, block: u32) -> PrfKey256 {
    let cipher = BlockCipher::new(&master_half(master));

    let mut out = [0u8; 32];
    for counter in 0u32..2 {
        let mut input = [0u8; 16];
        input[..8].copy_from_slice(&u64::from(block).to_le_bytes());
        input[8..12].copy_from_slice(&KDF_TAG.to_le_bytes());
        input[12..16].copy_from_slice(&counter.to_le_bytes());
        cipher.encrypt_block(&mut input);
        out[counter as usize * 16..][..16].copy_from_slice(&input);
    }
    out
}

/// Split a 32-byte iPRF key into its permutation and sampler halves.
pub fn split_key(key: &PrfKey256) -> (PrfKey128, PrfKey128) {
    let mut prp = [0u8; 16];
    let mut pmns = [0u8; 16];
    prp.copy_from_slice(&key[..16]);
    pmns.copy_from_slice(&key[16..]);
    (prp, pmns)
}

/// First 16 bytes of the master secret, the half that keys the KDF and
/// the subset generator.
pub fn master_half(master: &PrfKey256) -> PrfKey128 {
    let mut half = [0u8; 16];
    half.copy_from_slice(&master[..16]);
    half
}
