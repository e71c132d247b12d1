//! Salted passphrase verification digest
//!
//! A 64-bit djb2 rolling hash (seed 5381, `h = h*33 + c` with wraparound)
//! over `passphrase ++ salt`. This is a password-check convenience, not a
//! security boundary: it is neither reversible nor collision-resistant, and
//! it must never be treated as authentication of the body contents.

/// djb2 seed constant.
const SEED: u64 = 5381;

/// Computes the 64-bit mixing hash over an arbitrary byte sequence.
pub fn digest(data: &[u8]) -> u64 {
    fold(SEED, data)
}

/// Digest over `passphrase ++ salt`, the form stored in container headers.
pub fn passphrase_digest(passphrase: &[u8], salt: &[u8]) -> u64 {
    fold(fold(SEED, passphrase), salt)
}

/// The sole authentication check: recompute over the candidate passphrase
/// and the stored salt, compare with the stored digest. Retry and abort
/// policy belongs to the caller.
pub fn verify(passphrase: &[u8], salt: &[u8], stored: u64) -> bool {
    passphrase_digest(passphrase, salt) == stored
}

fn fold(seed: u64, data: &[u8]) -> u64 {
    data.iter()
        .fold(seed, |h, &c| h.wrapping_mul(33).wrapping_add(c as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_seed() {
        assert_eq!(digest(b""), 5381);
    }

    #[test]
    fn test_known_value() {
        // This exact value is produced by the original C++ NullYex tool.
        assert_eq!(digest(b"hunter2ABCDEFGH"), 0x5ec40548ecb09ef1);
    }

    #[test]
    fn test_split_matches_concatenation() {
        assert_eq!(
            passphrase_digest(b"hunter2", b"ABCDEFGH"),
            digest(b"hunter2ABCDEFGH")
        );
    }

    #[test]
    fn test_deterministic() {
        let a = passphrase_digest(b"some passphrase", b"12345678");
        let b = passphrase_digest(b"some passphrase", b"12345678");
        assert_eq!(a, b);
    }

    #[test]
    fn test_order_sensitive() {
        assert_ne!(digest(b"ab"), digest(b"ba"));
        assert_ne!(
            passphrase_digest(b"pw", b"saltsalt"),
            passphrase_digest(b"saltsalt", b"pw")
        );
    }

    #[test]
    fn test_single_byte_change_shifts_digest() {
        // Not a collision-resistance claim; just a smoke check that the
        // mixing actually mixes for nearby inputs.
        let base = passphrase_digest(b"password", b"AAAAAAAA");
        assert_ne!(base, passphrase_digest(b"passwore", b"AAAAAAAA"));
        assert_ne!(base, passphrase_digest(b"password", b"AAAAAAAB"));
    }

    #[test]
    fn test_verify() {
        let stored = passphrase_digest(b"correct", b"NaClNaCl");
        assert!(verify(b"correct", b"NaClNaCl", stored));
        assert!(!verify(b"wrong", b"NaClNaCl", stored));
        assert!(!verify(b"correct", b"NaClNaCm", stored));
    }
}
