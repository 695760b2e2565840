use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hashes the password with a fresh random salt using argon2's default
/// parameters. The returned PHC string carries everything `verify_password`
/// needs.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("password hashing failed: {e}"))
}

/// Verifies `plain` against a stored PHC hash. A mismatch is `Ok(false)`;
/// only an unparseable stored hash is an error.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| anyhow!("stored password hash is invalid: {e}"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_accepts_correct_password() {
        let hash = hash_password("open sesame 42").unwrap();
        assert!(verify_password("open sesame 42", &hash).unwrap());
        assert!(!verify_password("open sesame 43", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = hash_password("repeatable").unwrap();
        let second = hash_password("repeatable").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("repeatable", &first).unwrap());
        assert!(verify_password("repeatable", &second).unwrap());
    }

    #[test]
    fn invalid_stored_hash_is_an_error() {
        assert!(verify_password("whatever", "plainly-not-a-phc-string").is_err());
    }
}
