//! Rust-native building blocks for the Plinko private information
//! retrieval scheme.
//!
//! Plinko is a collection of modules implementing the client-side hint
//! machinery of the Plinko PIR protocol in native Rust. This crate
//! doesn't provide any particular application; it is meant as a base
//! layer for higher-level use-cases such as private wallets or private
//! block explorers.

#![warn(missing_docs)]

#[doc(inline)]
pub use plinko_crypto as crypto;

#[doc(inline)]
pub use plinko_hints as hints;
