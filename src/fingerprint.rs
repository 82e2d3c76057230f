//! Stable failure fingerprints.

use sha2::{Digest as _, Sha256};

pub const FINGERPRINT_LEN: usize = 16;

/// Digest an ordered list of parts into a 16-hex-char fingerprint.
///
/// Each part is followed by a newline before hashing, so `["ab", "c"]` and
/// `["a", "bc"]` produce different digests. This is a dedup key for humans,
/// not a security boundary.
#[must_use]
pub fn fingerprint_failure<S: AsRef<str>>(parts: &[S]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())[..FINGERPRINT_LEN].to_string()
}
