//! Loggable fingerprint of the session signing key.
//!
//! Operators compare fingerprints across replicas to confirm they share a
//! key without the key material ever reaching the logs.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

/// Digest bytes kept before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// First eight bytes of the SHA-256 of the signing half, as lowercase hex.
///
/// # Examples
///
/// ```rust
/// use actix_web::cookie::Key;
/// use marketplace::inbound::http::session_config::fingerprint::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn same_master_key_gives_same_fingerprint() {
        let first = key_fingerprint(&Key::derive_from(&[7; 64]));
        let second = key_fingerprint(&Key::derive_from(&[7; 64]));
        assert_eq!(first, second);
    }

    #[rstest]
    fn fingerprint_is_short_lowercase_hex() {
        let fp = key_fingerprint(&Key::generate());
        assert_eq!(fp.len(), FINGERPRINT_BYTES * 2);
        assert!(
            fp.chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[rstest]
    fn rotated_keys_are_distinguishable() {
        assert_ne!(
            key_fingerprint(&Key::derive_from(&[b'a'; 64])),
            key_fingerprint(&Key::derive_from(&[b'b'; 64]))
        );
    }
}
