// src/auth/passwords.rs
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::auth::token::hashes_equal;
use crate::errors::ServerError;

const SALT_BYTES: usize = 16;
const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password with a fresh random salt.
/// Stored form: "<salt_b64>$<digest_b64>", both URL-safe no-pad.
pub fn hash_password(password: &str) -> Result<String, ServerError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ServerError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);

    let digest = salted_digest(&salt, password);
    let b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    Ok(format!("{}${}", b64.encode(salt), b64.encode(digest)))
}

/// Check a candidate password against a stored "<salt>$<digest>" hash.
/// Malformed stored values fail closed.
pub fn verify_password(stored: &str, candidate: &str) -> bool {
    let b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let Some((salt_part, digest_part)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = b64.decode(salt_part) else {
        return false;
    };
    let Ok(expected) = b64.decode(digest_part) else {
        return false;
    };

    let actual = salted_digest(&salt, candidate);
    hashes_equal(&actual, &expected)
}

fn salted_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let out = hasher.finalize();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}
