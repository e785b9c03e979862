/// Password hashing using Argon2id
///
/// [`CredentialHasher`] hashes passwords into PHC strings and verifies them.
/// The work factor is fixed when the hasher is built; verification reads the
/// parameters back out of the stored hash, so hashes created under older
/// parameters keep verifying.
///
/// # Security
///
/// - **Algorithm**: Argon2id, version 0x13
/// - **Default cost**: 64 MB memory, 3 passes, 4 lanes, 32-byte output
/// - **Salt**: 16 random bytes from the OS RNG per hash
/// - **Input ceiling**: inputs above [`MAX_PASSWORD_BYTES`] are refused, never truncated
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::password::{CredentialHasher, HashingCost};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = CredentialHasher::new(HashingCost::new(1024, 1, 1))?;
/// let hash = hasher.hash("correct horse battery staple")?;
///
/// assert!(hasher.verify("correct horse battery staple", &hash)?);
/// assert!(!hasher.verify("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Longest accepted password, in bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Cost parameters rejected by Argon2
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Input exceeds [`MAX_PASSWORD_BYTES`]
    #[error("Password exceeds {MAX_PASSWORD_BYTES} bytes")]
    TooLong,

    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Stored hash is not a PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),
}

/// Argon2id work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingCost {
    /// Memory in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Number of lanes
    pub parallelism: u32,
}

impl HashingCost {
    pub const fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }
}

impl Default for HashingCost {
    fn default() -> Self {
        Self::new(65536, 3, 4)
    }
}

/// Argon2id hasher with a fixed work factor
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    cost: HashingCost,
}

impl CredentialHasher {
    /// Builds a hasher for the given cost
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidParams` if Argon2 rejects the cost
    /// (e.g. memory below 8 KiB per lane).
    pub fn new(cost: HashingCost) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(cost.memory_kib)
            .t_cost(cost.iterations)
            .p_cost(cost.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params),
            cost,
        })
    }

    /// Work factor new hashes are created with
    pub fn cost(&self) -> HashingCost {
        self.cost
    }

    /// Hashes a password into a PHC string
    ///
    /// # Errors
    ///
    /// - `PasswordError::TooLong` if the input exceeds [`MAX_PASSWORD_BYTES`]
    /// - `PasswordError::HashError` if Argon2 fails
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong);
        }

        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;

        Ok(password_hash.to_string())
    }

    /// Verifies a password against a stored PHC string
    ///
    /// Returns `Ok(false)` on mismatch and for inputs above the ceiling,
    /// since no such input can ever have been hashed.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }

        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> CredentialHasher {
        CredentialHasher::new(HashingCost::new(1024, 1, 1)).expect("valid cost")
    }

    #[test]
    fn test_default_cost() {
        let cost = HashingCost::default();
        assert_eq!(cost.memory_kib, 65536);
        assert_eq!(cost.iterations, 3);
        assert_eq!(cost.parallelism, 4);
    }

    #[test]
    fn test_hash_is_phc_argon2id() {
        let hash = fast_hasher().hash("test_password_123").expect("hash");
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=1024"));
        assert!(hash.contains("t=1"));
        assert!(hash.contains("p=1"));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let hasher = fast_hasher();
        let first = hasher.hash("same_password").expect("hash");
        let second = hasher.hash("same_password").expect("hash");
        assert_ne!(first, second);
        assert!(hasher.verify("same_password", &first).expect("verify"));
        assert!(hasher.verify("same_password", &second).expect("verify"));
    }

    #[test]
    fn test_verify_round_trip() {
        let hasher = fast_hasher();
        for password in ["a", "password123", "пароль-unicode", "with spaces and $ymbols!"] {
            let hash = hasher.hash(password).expect("hash");
            assert!(hasher.verify(password, &hash).expect("verify"));
            assert!(!hasher.verify(&format!("{}x", password), &hash).expect("verify"));
        }
    }

    #[test]
    fn test_empty_password_does_not_match_nonempty() {
        let hasher = fast_hasher();
        let hash = hasher.hash("nonempty").expect("hash");
        assert!(!hasher.verify("", &hash).expect("verify"));
    }

    #[test]
    fn test_verify_uses_parameters_from_hash() {
        let old = CredentialHasher::new(HashingCost::new(2048, 2, 1)).expect("cost");
        let hash = old.hash("rotated").expect("hash");
        assert!(fast_hasher().verify("rotated", &hash).expect("verify"));
    }

    #[test]
    fn test_input_ceiling_fails_closed() {
        let hasher = fast_hasher();
        let at_limit = "a".repeat(MAX_PASSWORD_BYTES);
        let over_limit = "a".repeat(MAX_PASSWORD_BYTES + 1);

        let hash = hasher.hash(&at_limit).expect("hash at limit");
        assert!(hasher.verify(&at_limit, &hash).expect("verify"));

        assert!(matches!(hasher.hash(&over_limit), Err(PasswordError::TooLong)));
        assert!(!hasher.verify(&over_limit, &hash).expect("verify"));
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = fast_hasher().verify("password", "not-a-phc-string");
        assert!(matches!(result, Err(PasswordError::InvalidHash(_))));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        let result = CredentialHasher::new(HashingCost::new(1, 1, 1));
        assert!(matches!(result, Err(PasswordError::InvalidParams(_))));
    }
}
