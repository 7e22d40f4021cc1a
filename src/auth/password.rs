use thiserror::Error;

/// bcrypt work factor used for every stored password
pub const BCRYPT_COST: u32 = 10;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Hash a plaintext password with a fresh salt.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(plain, BCRYPT_COST)?)
}

/// Compare a plaintext password against a stored digest.
///
/// A malformed digest never matches.
pub fn verify_password(plain: &str, digest: &str) -> bool {
    match bcrypt::verify(plain, digest) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Password verification against malformed digest: {}", e);
            false
        }
    }
}
