use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::config::AdminAccount;

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| e.to_string())
}

/// Ok(false) for a wrong password, Err only for an unparseable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Check a login form against the configured admin account.
/// The email comparison ignores case and surrounding whitespace.
pub fn check_credentials(admin: &AdminAccount, email: &str, password: &str) -> Result<bool, String> {
    if email.trim().to_lowercase() != admin.email {
        // Still pay for a verification so unknown emails are not faster.
        let _ = verify_password(password, &admin.password_hash);
        return Ok(false);
    }
    verify_password(password, &admin.password_hash)
}
