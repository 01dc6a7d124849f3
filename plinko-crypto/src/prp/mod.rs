//! Table-based small-domain pseudorandom permutation.
//!
//! The permutation is materialized at construction time as a pair of
//! lookup tables built by a Fisher-Yates shuffle of the identity, with
//! swap indices drawn from an AES counter-mode keystream through
//! rejection sampling. Both directions are then a single array access,
//! and bijectivity holds by construction rather than by proof about a
//! round function.
//!
//! The tables cost `16n` bytes for a domain of `n`; at the scales the
//! hint engine instantiates (one permutation per database block over the
//! hint domain) this stays well inside the memory envelope.

use crate::prf::{CtrStream, PrfKey128};

/// Domain-separation nonce for the table-shuffle keystream ("PRPSHUFL").
const SHUFFLE_NONCE: u64 = 0x5052_5053_4855_464c;

/// A keyed bijection on `[0, n)`.
#[derive(Clone)]
pub struct Prp {
    fwd: Vec<u64>,
    inv: Vec<u64>,
}

impl Prp {
    /// Build the permutation tables for a domain of `n` elements.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero; the permutation needs a non-empty domain.
    pub fn new(key: &PrfKey128, n: u64) -> Self {
        assert!(n >= 1, "permutation domain must be non-empty");

        let mut stream = CtrStream::new(key, SHUFFLE_NONCE);
        let mut fwd: Vec<u64> = (0..n).collect();
        for i in (1..n).rev() {
            let j = stream.next_bounded(i + 1);
            fwd.swap(i as usize, j as usize);
        }

        let mut inv = vec![0u64; n as usize];
        for (i, &y) in fwd.iter().enumerate() {
            inv[y as usize] = i as u64;
        }

        Self { fwd, inv }
    }

    /// Number of elements in the domain.
    pub fn domain_size(&self) -> u64 {
        self.fwd.len() as u64
    }

    /// Image of `x` under the permutation.
    ///
    /// # Panics
    ///
    /// Panics if `x` is outside `[0, n)`.
    #[inline]
    pub fn forward(&self, x: u64) -> u64 {
        assert!(
            x < self.domain_size(),
            "permutation input {x} outside domain of size {}",
            self.domain_size()
        );
        self.fwd[x as usize]
    }

    /// Preimage of `y` under the permutation.
    ///
    /// # Panics
    ///
    /// Panics if `y` is outside `[0, n)`.
    #[inline]
    pub fn inverse(&self, y: u64) -> u64 {
        assert!(
            y < self.domain_size(),
            "permutation output {y} outside domain of size {}",
            self.domain_size()
        );
        self.inv[y as usize]
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    #[test]
    fn two_element_smoke() {
        let prp = Prp::new(&[0u8; 16], 2);

        assert_ne!(prp.forward(0), prp.forward(1));
        assert!(prp.forward(0) < 2);
        assert!(prp.forward(1) < 2);
        assert_eq!(prp.inverse(prp.forward(0)), 0);
        assert_eq!(prp.inverse(prp.forward(1)), 1);
    }

    #[test]
    fn singleton_domain_is_identity() {
        let prp = Prp::new(&[7u8; 16], 1);
        assert_eq!(prp.forward(0), 0);
        assert_eq!(prp.inverse(0), 0);
    }

    #[test]
    fn both_directions_invert_each_other() {
        let prp = Prp::new(&[5u8; 16], 1000);

        for x in 0..1000 {
            assert_eq!(prp.inverse(prp.forward(x)), x);
            assert_eq!(prp.forward(prp.inverse(x)), x);
        }
    }

    #[test]
    fn forward_covers_the_domain() {
        let prp = Prp::new(&[5u8; 16], 257);

        let mut seen = vec![false; 257];
        for x in 0..257 {
            seen[prp.forward(x) as usize] = true;
        }
        assert!(seen.into_iter().all(|hit| hit));
    }

    #[test]
    fn same_key_same_tables() {
        let a = Prp::new(&[9u8; 16], 512);
        let b = Prp::new(&[9u8; 16], 512);

        for x in 0..512 {
            assert_eq!(a.forward(x), b.forward(x));
        }
    }

    #[test]
    fn distinct_keys_mostly_disagree() {
        let a = Prp::new(&[0u8; 16], 1000);
        let b = Prp::new(&[1u8; 16], 1000);

        let agreements = (0..1000).filter(|&x| a.forward(x) == b.forward(x)).count();

        // a random pair of permutations agrees on ~1 point; 10% is the
        // generous ceiling the scheme tolerates
        assert!(agreements < 100, "permutations agree on {agreements}/1000 points");
    }

    #[test]
    #[should_panic]
    fn out_of_domain_forward_panics() {
        Prp::new(&[0u8; 16], 10).forward(10);
    }

    #[test]
    #[should_panic]
    fn out_of_domain_inverse_panics() {
        Prp::new(&[0u8; 16], 10).inverse(10);
    }

    #[quickcheck]
    fn roundtrips_for_arbitrary_keys(key_seed: u64, n_raw: u16) -> bool {
        let n = u64::from(n_raw % 300) + 1;
        let mut key = [0u8; 16];
        key[..8].copy_from_slice(&key_seed.to_le_bytes());
        let prp = Prp::new(&key, n);

        (0..n).all(|x| prp.inverse(prp.forward(x)) == x)
    }
}
