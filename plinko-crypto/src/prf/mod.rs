//! AES-backed PRF plumbing shared by every primitive in this crate.
//!
//! We expose two helper objects:
//!
//! * [`BlockCipher`], a keyed 128-bit block permutation used both as a
//!   PRF and as the source of deterministic keystreams, and
//! * [`CtrStream`], a counter-mode byte stream with unbiased bounded
//!   draws on top, which drives the permutation shuffle and the subset
//!   generator.
//!
//! Neither object carries mutable key state; a [`CtrStream`] only advances
//! its block counter.

mod cipher;
mod stream;

pub use self::{cipher::BlockCipher, stream::CtrStream};

/// 128-bit key for the AES-based primitives.
pub type PrfKey128 = [u8; 16];

/// 256-bit composite key; consumers split it into two 128-bit halves.
pub type PrfKey256 = [u8; 32];
