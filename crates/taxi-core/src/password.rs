//! Password hashing.
//!
//! Hashes are stored as `pbkdf2_sha256$<iterations>$<salt hex>$<hash hex>`.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

/// Algorithm tag at the front of every encoded hash.
pub const ALGORITHM: &str = "pbkdf2_sha256";

/// Default PBKDF2 round count.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Hash `raw` with a fresh random salt.
pub fn hash_password(raw: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    encode(raw, &salt, iterations.max(1))
}

/// Check `raw` against an encoded hash. Malformed encodings never verify.
pub fn verify_password(raw: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(algorithm), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    if algorithm != ALGORITHM {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };
    if iterations == 0 || expected.len() != KEY_LEN {
        return false;
    }

    let mut derived = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(raw.as_bytes(), &salt, iterations, &mut derived);

    // Compare every byte regardless of where the first mismatch is.
    derived
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn encode(raw: &str, salt: &[u8], iterations: u32) -> String {
    let mut derived = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(raw.as_bytes(), salt, iterations, &mut derived);
    format!(
        "{}${}${}${}",
        ALGORITHM,
        iterations,
        hex::encode(salt),
        hex::encode(derived)
    )
}
