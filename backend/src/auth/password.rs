//! Password hashing

use super::AuthError;

/// Hash a password with bcrypt at `cost`
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Check a password against a stored bcrypt hash.
///
/// A malformed hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps the tests fast.
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2-hunter2", TEST_COST).unwrap();
        assert_ne!(hash, "hunter2-hunter2");
        assert!(verify_password("hunter2-hunter2", &hash));
        assert!(!verify_password("hunter3-hunter3", &hash));
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }
}
