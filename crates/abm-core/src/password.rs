//! Password hashing.
//!
//! Passwords are stored as argon2id PHC strings, e.g. `$argon2id$v=19$…`.
//! Plaintext never reaches the store.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;

use crate::{Error, Result};

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map_err(|e| Error::PasswordHash(e.to_string()))?
    .to_string();
  Ok(hash)
}

/// `false` when the password does not match or `phc` is not a valid hash.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}
