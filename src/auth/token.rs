// src/auth/token.rs
use base64::Engine;
use rand::rngs::OsRng;
use rand::Rng;
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const DEFAULT_TOKEN_BYTES: usize = 32;
pub const VERIFICATION_CODE_DIGITS: usize = 6;

/// Generate a secure random bearer token using the OS RNG.
pub fn generate_token_default() -> String {
    let mut rng = OsRng;
    generate_token(&mut rng, DEFAULT_TOKEN_BYTES)
}

/// Generate a URL-safe token from random bytes.
/// - Uses Base64 URL-safe, no padding.
/// - Typically 32 bytes -> ~43 char token.
pub fn generate_token<R: RngCore>(rng: &mut R, nbytes: usize) -> String {
    let mut buf = vec![0u8; nbytes];
    rng.fill_bytes(&mut buf);
    base64_url_nopad(&buf)
}

/// Generate the numeric code mailed out for account verification.
/// Zero-padded so it is always VERIFICATION_CODE_DIGITS long.
pub fn generate_verification_code() -> String {
    let mut rng = OsRng;
    generate_numeric_code(&mut rng, VERIFICATION_CODE_DIGITS)
}

pub fn generate_numeric_code<R: Rng>(rng: &mut R, digits: usize) -> String {
    let max = 10u64.pow(digits as u32);
    format!("{:0width$}", rng.gen_range(0..max), width = digits)
}

/// Hash a token or code using SHA-256.
/// Store this output in DB (BLOB), never the raw value.
pub fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let out = hasher.finalize();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}

/// Constant-time-ish compare for hashes (simple and sufficient here).
pub fn hashes_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn base64_url_nopad(bytes: &[u8]) -> String {
    // URL_SAFE_NO_PAD makes tokens safe for query params without encoding.
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
