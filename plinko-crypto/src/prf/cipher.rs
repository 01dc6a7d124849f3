use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;

use crate::prf::PrfKey128;

/// A keyed 128-bit block permutation.
///
/// This is AES-128 from the RustCrypto `aes` crate, used strictly as a
/// PRF and as a deterministic stream source: 16 bytes in, 16 bytes out,
/// no padding, no chaining mode. Outputs are bit-exact against the
/// FIPS-197 test vectors.
#[derive(Clone)]
pub struct BlockCipher {
    inner: Aes128,
}

impl BlockCipher {
    /// Expand the given key. The schedule is computed once and reused for
    /// every block.
    pub fn new(key: &PrfKey128) -> Self {
        Self {
            inner: Aes128::new(&GenericArray::from(*key)),
        }
    }

    /// Encrypt a single 16-byte block in place.
    #[inline]
    pub fn encrypt_block(&self, block: &mut [u8; 16]) {
        self.inner
            .encrypt_block(GenericArray::from_mut_slice(&mut block[..]));
    }

    /// Convenience wrapper returning the ciphertext of `block`.
    #[inline]
    pub fn encrypt(&self, mut block: [u8; 16]) -> [u8; 16] {
        self.encrypt_block(&mut block);
        block
    }
}
