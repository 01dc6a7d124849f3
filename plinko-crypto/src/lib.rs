//! Deterministic cryptographic primitives for the Plinko private
//! information retrieval client.
//!
//! The centerpiece is the invertible PRF ([`iprf::Iprf`]): a keyed map from
//! a large domain onto a small range that supports both forward evaluation
//! and *full* preimage enumeration. It is assembled from two simpler
//! keyed objects:
//!
//! * [`prp::Prp`], a small-domain pseudorandom permutation, and
//! * [`pmns::Pmns`], a pseudorandom multinomial sampler that throws the
//!   permuted domain into bins along a virtual binary tree.
//!
//! Around those sit the shared AES plumbing ([`prf`]), the key-derivation
//! helpers ([`kdf`]) and the deterministic block-subset generator
//! ([`subset`]) used by the hint engine upstream.
//!
//! Every type here is immutable once constructed and free of interior
//! state; identical keys and parameters always reproduce identical
//! outputs, across calls and across restarts.

pub mod iprf;
pub mod kdf;
pub mod pmns;
pub mod prf;
pub mod prp;
pub mod subset;
