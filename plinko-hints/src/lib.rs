//! Hint management for the Plinko private information retrieval client.
//!
//! A hint is a subset of the database's blocks together with a 256-bit
//! XOR parity over one entry per block; holding enough hints lets the
//! client answer point queries without revealing which index it wants.
//! This crate implements the full hint lifecycle on top of the invertible
//! PRF from `plinko-crypto`:
//!
//! * streaming construction of regular and backup hints over a database,
//! * query planning ([`HintEngine::get_hint`]),
//! * consumption and backup promotion ([`HintEngine::consume_hint`]),
//! * online maintenance under database mutations
//!   ([`HintEngine::update_hint`]), and
//! * parities-only persistence ([`HintEngine::to_bytes`] /
//!   [`HintEngine::from_bytes`]).
//!
//! # Example
//!
//! ```
//! use plinko_hints::{HintEngine, Params, Parity};
//!
//! let master = [7u8; 32];
//! let params = Params { entries: 64, block_size: 8, lambda: 2, queries: 2 };
//!
//! let mut engine = HintEngine::new(params, &master)?;
//! engine.initialize_hints()?;
//!
//! // stream the database through the engine
//! for i in 0..64u64 {
//!     let mut entry = [0u8; 32];
//!     entry[..8].copy_from_slice(&i.to_le_bytes());
//!     engine.process_entry(i, Parity::new(entry));
//! }
//!
//! // plan a private read of entry 12 (block 1, offset 4)
//! if let Some(plan) = engine.get_hint(1, 4) {
//!     assert!(plan.blocks.contains(&1));
//!     assert_eq!(plan.offsets[1], 4);
//! }
//! # Ok::<(), plinko_hints::engine::Error>(())
//! ```

pub mod engine;
pub mod hint;

pub use engine::{HintEngine, HintPlan, HintStats, Params};
pub use hint::{BlockSet, Parity};
