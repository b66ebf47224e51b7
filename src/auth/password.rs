// Password hashing and verification service

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::{rngs::OsRng, RngCore};
use std::sync::{Arc, OnceLock};
use tracing::error;

use crate::auth::error::AuthError;

/// Argon2id hashing with configurable cost
#[derive(Clone)]
pub struct PasswordService {
    params: Params,
    /// Hash verified against when no account matches, built on first use
    decoy: Arc<OnceLock<Option<String>>>,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

impl PasswordService {
    /// Custom cost parameters, e.g. cheap ones for tests
    pub fn with_params(params: Params) -> Self {
        Self {
            params,
            decoy: Arc::new(OnceLock::new()),
        }
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                AuthError::PasswordHashError
            })
    }

    /// Verify a password against a stored hash
    ///
    /// The cost parameters embedded in the hash win over `self.params`, so hashes
    /// produced under older settings keep verifying.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            AuthError::PasswordHashError
        })?;
        Ok(self
            .hasher()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Runs a full verification that never succeeds
    ///
    /// Login calls this for unknown emails so they cost as much as a wrong
    /// password on a real account.
    pub fn verify_decoy(&self, password: &str) -> bool {
        let decoy = self.decoy.get_or_init(|| {
            let mut secret = [0u8; 32];
            OsRng.fill_bytes(&mut secret);
            self.hash_password(&hex_string(&secret)).ok()
        });
        if let Some(hash) = decoy {
            let _ = self.verify_password(password, hash);
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn decoy_ready(&self) -> bool {
        self.decoy.get().is_some()
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_service() -> PasswordService {
        PasswordService::with_params(Params::new(8, 1, 1, None).unwrap())
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let service = fast_service();
        let hash = service.hash_password("Secur3P@ssw0rd!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify_password("Secur3P@ssw0rd!", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let service = fast_service();
        let hash = service.hash_password("correct-horse-battery-staple").unwrap();
        assert!(!service.verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let service = fast_service();
        let first = service.hash_password("Password1").unwrap();
        let second = service.hash_password("Password1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = fast_service()
            .verify_password("anything", "not-a-valid-hash")
            .unwrap_err();
        assert_eq!(err, AuthError::PasswordHashError);
    }

    #[test]
    fn decoy_verification_never_matches() {
        let service = fast_service();
        assert!(!service.verify_decoy("Secret123"));
        assert!(!service.verify_decoy(""));

        let decoy = service.decoy.get().cloned().flatten().unwrap();
        assert!(decoy.starts_with("$argon2id$"));
        // Clones share the decoy instead of hashing again
        assert_eq!(service.clone().decoy.get().cloned().flatten(), Some(decoy));
    }
}
