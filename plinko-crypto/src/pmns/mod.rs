//! Pseudorandom multinomial sampler.
//!
//! Conceptually, `n` balls are thrown into `m` bins. The assignment is
//! represented as a balanced binary tree over the bin range: each internal
//! node splits its contiguous block of balls between its children with a
//! binomially distributed left count, seeded by a PRF of the node's
//! identity. Nothing is materialized; both directions walk the virtual
//! tree from the root, recomputing every split on the way down.
//!
//! * `forward(x)` follows ball `x` to its bin in `O(log m)` PRF calls.
//! * `backward(y)` follows bin `y` to the contiguous ball range assigned
//!   to it, in `O(log m)` PRF calls plus the size of the answer.
//!
//! The split at a node is a pure function of `(low, high, count)` and the
//! key, so forward and backward traversals can never disagree about the
//! shape of the tree.

mod binomial;

use cryptoxide::blake2b::Blake2b;
use cryptoxide::digest::Digest as _;
use thiserror::Error;

use crate::prf::{BlockCipher, PrfKey128};

/// Scales a 53-bit keystream fragment into the open unit interval.
const INV_TWO_TO_53: f64 = 1.0 / (1u64 << 53) as f64;

#[derive(Debug, Error, PartialEq, Eq)]
/// Construction errors for the sampler.
pub enum Error {
    /// The bin count must be a power of two so that every split is
    /// balanced.
    #[error("range size {0} is not a power of two")]
    RangeNotPowerOfTwo(u64),
    /// There must be at least one ball.
    #[error("sampler domain must be non-empty")]
    EmptyDomain,
}

/// A keyed many-to-one map from `[0, n)` onto `[0, m)` with full preimage
/// enumeration.
#[derive(Clone)]
pub struct Pmns {
    prf: BlockCipher,
    domain: u64,
    range: u64,
}

impl Pmns {
    /// Create a sampler throwing `n` balls into `m` bins.
    pub fn new(key: &PrfKey128, n: u64, m: u64) -> Result<Self, Error> {
        if n == 0 {
            return Err(Error::EmptyDomain);
        }
        if !m.is_power_of_two() {
            return Err(Error::RangeNotPowerOfTwo(m));
        }
        Ok(Self {
            prf: BlockCipher::new(key),
            domain: n,
            range: m,
        })
    }

    /// Number of balls.
    pub fn domain_size(&self) -> u64 {
        self.domain
    }

    /// Number of bins.
    pub fn range_size(&self) -> u64 {
        self.range
    }

    /// Bin that ball `x` lands in.
    ///
    /// # Panics
    ///
    /// Panics if `x` is outside `[0, n)`.
    pub fn forward(&self, x: u64) -> u64 {
        assert!(
            x < self.domain,
            "ball index {x} outside domain of size {}",
            self.domain
        );

        let mut low = 0u64;
        let mut high = self.range - 1;
        let mut count = self.domain;
        let mut index = x;

        while low < high {
            let mid = low + (high - low) / 2;
            let left = self.left_count(low, high, mid, count);
            if index < left {
                high = mid;
                count = left;
            } else {
                low = mid + 1;
                index -= left;
                count -= left;
            }
        }
        low
    }

    /// All balls landing in bin `y`, in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `y` is outside `[0, m)`.
    pub fn backward(&self, y: u64) -> Vec<u64> {
        let (start, count) = self.bin_span(y);
        (start..start + count).collect()
    }

    /// The contiguous ball block `[start, start + count)` assigned to bin
    /// `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y` is outside `[0, m)`.
    pub fn bin_span(&self, y: u64) -> (u64, u64) {
        assert!(
            y < self.range,
            "bin index {y} outside range of size {}",
            self.range
        );

        let mut low = 0u64;
        let mut high = self.range - 1;
        let mut start = 0u64;
        let mut count = self.domain;

        while low < high {
            let mid = low + (high - low) / 2;
            let left = self.left_count(low, high, mid, count);
            if y <= mid {
                high = mid;
                count = left;
            } else {
                low = mid + 1;
                start += left;
                count -= left;
            }
        }
        (start, count)
    }

    /// How many of a node's `count` balls fall into its left child.
    fn left_count(&self, low: u64, high: u64, mid: u64, count: u64) -> u64 {
        let p = (mid - low + 1) as f64 / (high - low + 1) as f64;
        let (u1, u2) = self.node_uniforms(node_id(low, high, self.domain));
        binomial::sample(count, p, u1, u2)
    }

    /// Two uniforms in `(0, 1)` derived from the PRF output for a node.
    fn node_uniforms(&self, node: u64) -> (f64, f64) {
        let mut block = [0u8; 16];
        block[8..].copy_from_slice(&node.to_be_bytes());
        self.prf.encrypt_block(&mut block);

        let w1 = u64::from_be_bytes(block[..8].try_into().unwrap());
        let w2 = u64::from_be_bytes(block[8..].try_into().unwrap());
        (unit_open(w1), unit_open(w2))
    }
}

/// Map a 64-bit word into the open interval `(0, 1)`.
#[inline]
fn unit_open(word: u64) -> f64 {
    ((word >> 11) as f64 + 0.5) * INV_TWO_TO_53
}

/// Collision-resistant 64-bit identifier for a tree node.
///
/// Hashes the full-width big-endian encoding of `(low, high, n)`; `n`
/// disambiguates nodes of samplers that share a bin range but differ in
/// ball count. Truncating any of the three inputs is not an option, so
/// they go through a hash rather than a bit packing.
fn node_id(low: u64, high: u64, n: u64) -> u64 {
    let mut hasher = Blake2b::new(32);
    hasher.input(&low.to_be_bytes());
    hasher.input(&high.to_be_bytes());
    hasher.input(&n.to_be_bytes());

    let mut digest = [0u8; 32];
    hasher.result(&mut digest);
    u64::from_be_bytes(digest[..8].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: PrfKey128 = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b,
        0x0c, 0x0d, 0x0e, 0x0f,
    ];

    fn sampler(n: u64, m: u64) -> Pmns {
        Pmns::new(&KEY, n, m).unwrap()
    }

    #[test]
    fn rejects_non_power_of_two_range() {
        assert_eq!(
            Pmns::new(&KEY, 16, 12).err(),
            Some(Error::RangeNotPowerOfTwo(12))
        );
        assert_eq!(
            Pmns::new(&KEY, 16, 0).err(),
            Some(Error::RangeNotPowerOfTwo(0))
        );
    }

    #[test]
    fn rejects_empty_domain() {
        assert_eq!(Pmns::new(&KEY, 0, 8).err(), Some(Error::EmptyDomain));
    }

    #[test]
    fn single_bin_swallows_everything() {
        let pmns = sampler(37, 1);

        for x in 0..37 {
            assert_eq!(pmns.forward(x), 0);
        }
        assert_eq!(pmns.backward(0), (0..37).collect::<Vec<_>>());
    }

    #[test]
    fn forward_lands_inside_backward() {
        let pmns = sampler(1024, 256);

        for x in 0..1024 {
            let y = pmns.forward(x);
            assert!(y < 256);
            assert!(pmns.backward(y).contains(&x));
        }
    }

    #[test]
    fn backward_agrees_with_forward() {
        let pmns = sampler(1024, 256);

        for y in 0..256 {
            for x in pmns.backward(y) {
                assert_eq!(pmns.forward(x), y);
            }
        }
    }

    #[test]
    fn bins_partition_the_domain() {
        let pmns = sampler(1024, 256);

        let mut seen = vec![false; 1024];
        let mut total = 0u64;
        for y in 0..256 {
            let balls = pmns.backward(y);
            // spans are emitted in ascending order
            assert!(balls.windows(2).all(|w| w[0] < w[1]));
            for x in balls {
                assert!(!seen[x as usize], "ball {x} assigned to two bins");
                seen[x as usize] = true;
                total += 1;
            }
        }
        assert_eq!(total, 1024);
    }

    #[test]
    fn traversals_are_deterministic() {
        let a = sampler(1024, 256);
        let b = sampler(1024, 256);

        for x in 0..1024 {
            assert_eq!(a.forward(x), b.forward(x));
        }
        for y in 0..256 {
            assert_eq!(a.bin_span(y), b.bin_span(y));
        }
    }

    #[test]
    fn node_ids_distinguish_domain_sizes() {
        // same (low, high) under different root ball counts must never
        // share a node id; 16-bit packings used to collide here
        assert_ne!(node_id(0, 1023, 0), node_id(0, 1023, 65536));
        assert_ne!(node_id(0, 1023, 1024), node_id(0, 1023, 1 << 40));
    }

    #[test]
    fn bin_loads_look_binomial() {
        // chi-squared against the uniform multinomial; the statistic for
        // m bins has mean m-1 and variance 2(m-1)
        let n = 16384u64;
        let m = 256u64;
        let pmns = sampler(n, m);

        let mut loads = vec![0u64; m as usize];
        for y in 0..m {
            let (_, count) = pmns.bin_span(y);
            loads[y as usize] = count;
        }
        assert_eq!(loads.iter().sum::<u64>(), n);

        let expected = n as f64 / m as f64;
        let chi2: f64 = loads
            .iter()
            .map(|&load| {
                let d = load as f64 - expected;
                d * d / expected
            })
            .sum();

        let dof = (m - 1) as f64;
        let z = (chi2 - dof) / (2.0 * dof).sqrt();
        assert!(z.abs() < 3.0, "chi-squared z-score {z} out of bounds");
    }
}
