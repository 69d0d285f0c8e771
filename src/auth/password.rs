//! Password hashing and verification using PBKDF2-HMAC-SHA256
//!
//! Stored credentials are two base64 text columns: the random salt and the
//! derived key. Verification re-derives the key from the candidate password
//! and compares the encodings in constant time.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Salt length in bytes
pub const SALT_LEN: usize = 64;

/// Derived key length in bytes
pub const KEY_LEN: usize = 256;

/// PBKDF2 iteration count
pub const ITERATIONS: u32 = 10_000;

/// Encoded hash and salt, ready to be stored as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword {
    pub hash: String,
    pub salt: String,
}

/// Salted password hasher
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
    salt_len: usize,
    key_len: usize,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            iterations: ITERATIONS,
            salt_len: SALT_LEN,
            key_len: KEY_LEN,
        }
    }
}

impl PasswordHasher {
    /// Hasher with explicit parameters. Hashes made with one parameter set
    /// only verify under the same set.
    pub fn with_params(iterations: u32, salt_len: usize, key_len: usize) -> Self {
        Self {
            iterations,
            salt_len,
            key_len,
        }
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> HashedPassword {
        let mut salt = vec![0u8; self.salt_len];
        OsRng.fill_bytes(&mut salt);

        HashedPassword {
            hash: STANDARD.encode(self.derive(password, &salt)),
            salt: STANDARD.encode(&salt),
        }
    }

    /// Verify a password against a stored hash and salt
    ///
    /// Undecodable stored values verify as `false`.
    pub fn verify(&self, password: &str, stored_hash: &str, stored_salt: &str) -> bool {
        let salt = match STANDARD.decode(stored_salt) {
            Ok(salt) => salt,
            Err(_) => return false,
        };

        let candidate = STANDARD.encode(self.derive(password, &salt));
        candidate.as_bytes().ct_eq(stored_hash.as_bytes()).into()
    }

    fn derive(&self, password: &str, salt: &[u8]) -> Vec<u8> {
        let mut key = vec![0u8; self.key_len];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, self.iterations, &mut key);
        key
    }
}

/// Hash a password with the default parameters
pub fn hash_password(password: &str) -> HashedPassword {
    PasswordHasher::default().hash(password)
}

/// Verify a password with the default parameters
pub fn verify_password(password: &str, stored_hash: &str, stored_salt: &str) -> bool {
    PasswordHasher::default().verify(password, stored_hash, stored_salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flip_char(s: &str, index: usize) -> String {
        let mut chars: Vec<char> = s.chars().collect();
        chars[index] = if chars[index] == 'A' { 'B' } else { 'A' };
        chars.into_iter().collect()
    }

    #[test]
    fn test_hash_and_verify() {
        let password = "correct-horse-battery-staple";
        let hashed = hash_password(password);

        assert!(verify_password(password, &hashed.hash, &hashed.salt));
        assert!(!verify_password("wrong-password", &hashed.hash, &hashed.salt));
    }

    #[test]
    fn test_encoded_lengths() {
        let hashed = hash_password("payroll");

        assert_eq!(STANDARD.decode(&hashed.salt).unwrap().len(), SALT_LEN);
        assert_eq!(STANDARD.decode(&hashed.hash).unwrap().len(), KEY_LEN);
    }

    #[test]
    fn test_different_salts() {
        let password = "same-password";
        let first = hash_password(password);
        let second = hash_password(password);

        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);

        assert!(verify_password(password, &first.hash, &first.salt));
        assert!(verify_password(password, &second.hash, &second.salt));
    }

    #[test]
    fn test_tampered_hash_rejected() {
        let hashed = hash_password("s3cret");
        let len = hashed.hash.len();

        for index in [0, 1, len / 2, len - 3] {
            let tampered = flip_char(&hashed.hash, index);
            assert!(!verify_password("s3cret", &tampered, &hashed.salt));
        }
    }

    #[test]
    fn test_tampered_salt_rejected() {
        let hashed = hash_password("s3cret");
        let len = hashed.salt.len();

        // Includes the trailing padding characters
        for index in [0, len / 2, len - 3, len - 1] {
            let tampered = flip_char(&hashed.salt, index);
            assert!(!verify_password("s3cret", &hashed.hash, &tampered));
        }
    }

    #[test]
    fn test_invalid_encoding() {
        let hashed = hash_password("s3cret");

        assert!(!verify_password("s3cret", &hashed.hash, "not base64 at all!"));
        assert!(!verify_password("s3cret", "", &hashed.salt));
        assert!(!verify_password("s3cret", "", ""));
    }

    #[test]
    fn test_params_must_match() {
        let fast = PasswordHasher::with_params(10, 16, 32);
        let hashed = fast.hash("pw");

        assert!(fast.verify("pw", &hashed.hash, &hashed.salt));
        assert!(!PasswordHasher::default().verify("pw", &hashed.hash, &hashed.salt));
    }
}
