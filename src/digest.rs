use sha2::{Digest, Sha512};

/// Length of a record name: hex-encoded SHA-512.
pub const DIGEST_LEN: usize = 128;

/// Record file name for a token.
pub fn digest(token: &[u8]) -> String {
    hex::encode(Sha512::digest(token))
}
