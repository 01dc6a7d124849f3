use crate::prf::{BlockCipher, PrfKey128};

/// Deterministic counter-mode keystream.
///
/// Each 16-byte block encrypts a counter placed in bytes `[0..8)`
/// (little-endian) next to a fixed domain-separation nonce in bytes
/// `[8..16)`. The same `(key, nonce)` pair always replays the same
/// stream, which is what lets subset membership be re-derived without
/// storing the subsets themselves.
pub struct CtrStream {
    cipher: BlockCipher,
    nonce: u64,
    counter: u64,
    block: [u8; 16],
    used: usize,
}

impl CtrStream {
    /// Start a fresh stream for the given key and domain-separation
    /// nonce.
    pub fn new(key: &PrfKey128, nonce: u64) -> Self {
        Self {
            cipher: BlockCipher::new(key),
            nonce,
            counter: 0,
            block: [0u8; 16],
            used: 16,
        }
    }

    fn refill(&mut self) {
        let mut block = [0u8; 16];
        block[..8].copy_from_slice(&self.counter.to_le_bytes());
        block[8..].copy_from_slice(&self.nonce.to_le_bytes());
        self.cipher.encrypt_block(&mut block);

        self.block = block;
        self.counter = self.counter.wrapping_add(1);
        self.used = 0;
    }

    /// Next eight keystream bytes as a little-endian word.
    pub fn next_u64(&mut self) -> u64 {
        if self.used == 16 {
            self.refill();
        }
        let word = u64::from_le_bytes(
            self.block[self.used..self.used + 8].try_into().unwrap(),
        );
        self.used += 8;
        word
    }

    /// Next whole keystream block as four little-endian 32-bit words.
    ///
    /// Always consumes a fresh block; any unread tail of the previous
    /// block is discarded.
    pub fn next_u32x4(&mut self) -> [u32; 4] {
        self.refill();
        self.used = 16;
        core::array::from_fn(|i| {
            u32::from_le_bytes(self.block[i * 4..i * 4 + 4].try_into().unwrap())
        })
    }

    /// Unbiased draw from `[0, bound)` by rejection sampling over 64-bit
    /// words.
    ///
    /// Words below `2^64 mod bound` are discarded, so the surviving
    /// residues are exactly uniform.
    pub fn next_bounded(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "bounded draw from an empty range");
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let word = self.next_u64();
            if word >= threshold {
                return word % bound;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_is_deterministic() {
        let key = [3u8; 16];
        let mut a = CtrStream::new(&key, 77);
        let mut b = CtrStream::new(&key, 77);

        for _ in 0..64 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn nonce_separates_streams() {
        let key = [3u8; 16];
        let mut a = CtrStream::new(&key, 0);
        let mut b = CtrStream::new(&key, 1);

        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn bounded_draws_stay_in_range() {
        let mut stream = CtrStream::new(&[9u8; 16], 0);

        for bound in [1u64, 2, 3, 7, 100, 1 << 33] {
            for _ in 0..100 {
                assert!(stream.next_bounded(bound) < bound);
            }
        }
    }

    #[test]
    fn bound_of_one_is_constant_zero() {
        let mut stream = CtrStream::new(&[0u8; 16], 0);
        for _ in 0..10 {
            assert_eq!(stream.next_bounded(1), 0);
        }
    }

    #[test]
    #[should_panic]
    fn empty_bound_is_rejected() {
        CtrStream::new(&[0u8; 16], 0).next_bounded(0);
    }

    #[test]
    fn word_blocks_follow_the_counter() {
        // two u64 reads consume exactly the block that one u32x4 read
        // yields, in the same byte order
        let key = [1u8; 16];
        let mut words = CtrStream::new(&key, 5);
        let mut blocks = CtrStream::new(&key, 5);

        let lo = words.next_u64().to_le_bytes();
        let hi = words.next_u64().to_le_bytes();
        let quads = blocks.next_u32x4();

        let mut raw = [0u8; 16];
        raw[..8].copy_from_slice(&lo);
        raw[8..].copy_from_slice(&hi);
        let expected: [u32; 4] = core::array::from_fn(|i| {
            u32::from_le_bytes(raw[i * 4..i * 4 + 4].try_into().unwrap())
        });

        assert_eq!(quads, expected);
    }
}
