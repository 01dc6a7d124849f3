//! Invertible pseudorandom function.
//!
//! Composes the table permutation with the multinomial sampler:
//! `forward(x) = pmns(prp(x))`. Because the sampler assigns each bin a
//! contiguous block of the *permuted* domain, inverting a bin is a matter
//! of walking that block back through the permutation, which yields the
//! complete preimage set in time proportional to its size.
//!
//! Preimages are always reported in the original domain; the permuted
//! intermediate never escapes this module.

use crate::kdf;
use crate::pmns::{self, Pmns};
use crate::prf::PrfKey256;
use crate::prp::Prp;

/// A keyed map `[0, n) -> [0, m)` with efficient forward evaluation and
/// full preimage enumeration.
#[derive(Clone)]
pub struct Iprf {
    prp: Prp,
    pmns: Pmns,
}

impl Iprf {
    /// Build an instance over domain `n` and range `m` (a power of two).
    ///
    /// The 32-byte key splits into independent halves for the permutation
    /// and the sampler. An empty domain or a non-power-of-two range is
    /// rejected; the sampler validates both before the permutation
    /// tables are built.
    pub fn new(key: &PrfKey256, n: u64, m: u64) -> Result<Self, pmns::Error> {
        let (prp_key, pmns_key) = kdf::split_key(key);
        let pmns = Pmns::new(&pmns_key, n, m)?;
        Ok(Self {
            prp: Prp::new(&prp_key, n),
            pmns,
        })
    }

    /// Number of elements in the domain.
    pub fn domain_size(&self) -> u64 {
        self.prp.domain_size()
    }

    /// Number of bins in the range.
    pub fn range_size(&self) -> u64 {
        self.pmns.range_size()
    }

    /// Evaluate the function at `x`.
    ///
    /// # Panics
    ///
    /// Panics if `x` is outside `[0, n)`.
    pub fn forward(&self, x: u64) -> u64 {
        self.pmns.forward(self.prp.forward(x))
    }

    /// Every `x` with `forward(x) == y`, in the original domain.
    ///
    /// A bin outside `[0, m)` has no preimages; asking for one is a
    /// protocol event, not an error, and yields the empty sequence.
    pub fn inverse(&self, y: u64) -> Vec<u64> {
        if y >= self.pmns.range_size() {
            return Vec::new();
        }
        let (start, count) = self.pmns.bin_span(y);
        (start..start + count).map(|u| self.prp.inverse(u)).collect()
    }
}
