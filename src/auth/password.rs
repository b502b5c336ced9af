use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the password, the format stored in `Users.password`.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password).eq_ignore_ascii_case(stored_hash.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_known_digest() {
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn test_verify_password() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", &stored));
        assert!(verify_password("correct horse", &stored.to_uppercase()));
        assert!(!verify_password("wrong horse", &stored));
    }
}
