//! Password-derived rolling keystream
//!
//! Each keystream byte is `password[i % len] + i` with unsigned mod-256
//! wraparound, where `i` is a global byte counter. XOR-ing a byte with the
//! keystream is self-inverse, so the same sequence drives both directions.
//!
//! The counter covers the hidden extension field and every body byte, but
//! never the signature tag bytes inserted at segment boundaries. Encode and
//! decode must walk identical index sequences; any divergence desynchronizes
//! the stream irrecoverably.

use crate::error::{ErrorCategory, ErrorKind, NullboxError, Result};
use zeroize::Zeroizing;

/// Stateful keystream cursor over a non-empty password.
#[derive(Debug)]
pub struct Keystream {
    password: Zeroizing<Vec<u8>>,
    index: u64,
}

impl Keystream {
    /// Creates a keystream positioned at index 0.
    ///
    /// An empty password is rejected here so that the per-byte arithmetic
    /// never has to consider a zero-length modulus.
    pub fn new(password: &[u8]) -> Result<Self> {
        if password.is_empty() {
            return Err(NullboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::EmptyPassphrase,
                "passphrase must not be empty",
            ));
        }
        Ok(Self {
            password: Zeroizing::new(password.to_vec()),
            index: 0,
        })
    }

    /// The keystream byte at an arbitrary index, without advancing the cursor.
    ///
    /// Pure in (password, index): repeated calls with the same index yield
    /// the same byte regardless of cursor position.
    pub fn byte_at(&self, index: u64) -> u8 {
        let key_char = self.password[(index % self.password.len() as u64) as usize];
        key_char.wrapping_add(index as u8)
    }

    /// Returns the keystream byte at the cursor and advances it by one.
    pub fn next_byte(&mut self) -> u8 {
        let b = self.byte_at(self.index);
        self.index += 1;
        b
    }

    /// Current cursor position (bytes consumed so far).
    pub fn index(&self) -> u64 {
        self.index
    }

    /// XORs every byte of `buf` with consecutive keystream bytes, in place.
    pub fn apply(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b ^= self.next_byte();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_password_rejected() {
        let err = Keystream::new(b"").expect_err("expected empty passphrase error");
        assert_eq!(err.kind, Some(ErrorKind::EmptyPassphrase));
        assert_eq!(err.category, ErrorCategory::User);
    }

    #[test]
    fn test_known_keystream_bytes() {
        // password "hunter2": h=104, u=117, n=110, t=116, e=101, r=114, 2=50
        let ks = Keystream::new(b"hunter2").unwrap();
        assert_eq!(ks.byte_at(0), 104); // h + 0
        assert_eq!(ks.byte_at(1), 118); // u + 1
        assert_eq!(ks.byte_at(7), 111); // wraps back to h, + 7
        // index 300: password position 300 % 7 = 6 -> '2' (50), 50 + 300 mod 256 = 94
        assert_eq!(ks.byte_at(300), 94);
    }

    #[test]
    fn test_mod_256_wraparound() {
        let ks = Keystream::new(&[0xFF]).unwrap();
        assert_eq!(ks.byte_at(0), 0xFF);
        assert_eq!(ks.byte_at(1), 0x00); // 255 + 1 wraps
        assert_eq!(ks.byte_at(257), 0x00); // index reduced mod 256 first
    }

    #[test]
    fn test_cursor_matches_byte_at() {
        let mut ks = Keystream::new(b"secret").unwrap();
        let expected: Vec<u8> = (0..64).map(|i| ks.byte_at(i)).collect();
        let walked: Vec<u8> = (0..64).map(|_| ks.next_byte()).collect();
        assert_eq!(expected, walked);
        assert_eq!(ks.index(), 64);
    }

    #[test]
    fn test_determinism_across_instances() {
        let mut a = Keystream::new(b"pass").unwrap();
        let mut b = Keystream::new(b"pass").unwrap();
        for _ in 0..1000 {
            assert_eq!(a.next_byte(), b.next_byte());
        }
    }

    #[test]
    fn test_apply_is_self_inverse() {
        let mut data: Vec<u8> = (0..=255).collect();
        let original = data.clone();

        let mut enc = Keystream::new(b"roundtrip").unwrap();
        enc.apply(&mut data);
        assert_ne!(data, original);

        let mut dec = Keystream::new(b"roundtrip").unwrap();
        dec.apply(&mut data);
        assert_eq!(data, original);
    }
}
