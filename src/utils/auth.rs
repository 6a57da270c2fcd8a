//! Authentication utilities

use anyhow::Result;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::UserConfig;

const PBKDF2_ITERATIONS: u32 = 100_000;
const HASH_LENGTH: usize = 32;

/// Length of opaque session tokens
pub const SESSION_TOKEN_LENGTH: usize = 40;

/// hash a password using pbkdf2-sha256
pub fn hash_password(password: &str) -> Result<String> {
    let config = UserConfig::load()?;
    let salt = config.server_id.as_bytes();

    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut hash);

    Ok(hex::encode(hash))
}

/// verify a password against a hash using constant-time comparison
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let computed_hash = hash_password(password)?;
    let computed_bytes = computed_hash.as_bytes();
    let stored_bytes = hash.as_bytes();

    Ok(computed_bytes.ct_eq(stored_bytes).into())
}

/// generate a random string of the given length
pub fn generate_random_string(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_string() {
        let s1 = generate_random_string(SESSION_TOKEN_LENGTH);
        let s2 = generate_random_string(SESSION_TOKEN_LENGTH);

        assert_eq!(s1.len(), SESSION_TOKEN_LENGTH);
        assert_eq!(s2.len(), SESSION_TOKEN_LENGTH);
        assert_ne!(s1, s2); // Should be different (with very high probability)
    }
}
