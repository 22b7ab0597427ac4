use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

// Argon2id, 19 MiB, 2 passes, one lane. The same cost for every account.
fn hasher() -> Result<Argon2<'static>, String> {
    let params = Params::new(19 * 1024, 2, 1, None).map_err(|e| e.to_string())?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// One-way hash of a password, with a fresh random salt per call.
pub fn hash(plaintext: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()?
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|e| format!("password hashing failed: {e}"))
}

/// Check a password against a stored digest. A mismatch is `Ok(false)`;
/// only an unreadable digest is an error.
pub fn verify(plaintext: &str, digest: &str) -> Result<bool, String> {
    let parsed =
        PasswordHash::new(digest).map_err(|e| format!("unreadable password digest: {e}"))?;
    Ok(Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok())
}
