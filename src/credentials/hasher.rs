use super::CredentialError;
use secrecy::{ExposeSecret, SecretString};
use tokio::task;

/// bcrypt work factor used when none is configured.
pub const DEFAULT_COST: u32 = 10;

/// Accepted range for the bcrypt work factor.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Salted one-way password hashing. Both operations are CPU bound and run on
/// the blocking thread pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_COST,
        }
    }
}

impl PasswordHasher {
    /// # Errors
    /// Returns [`CredentialError::Unexpected`] if `cost` is outside `MIN_COST..=MAX_COST`.
    pub fn new(cost: u32) -> Result<Self, CredentialError> {
        if (MIN_COST..=MAX_COST).contains(&cost) {
            Ok(Self { cost })
        } else {
            Err(CredentialError::Unexpected(format!(
                "bcrypt cost must be between {MIN_COST} and {MAX_COST}, got {cost}"
            )))
        }
    }

    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// # Errors
    /// Returns [`CredentialError::Unexpected`] if hashing fails or the worker panics.
    pub async fn hash(&self, password: SecretString) -> Result<String, CredentialError> {
        let cost = self.cost;

        task::spawn_blocking(move || bcrypt::hash(password.expose_secret(), cost))
            .await
            .map_err(|e| CredentialError::Unexpected(format!("hash task failed: {e}")))?
            .map_err(|e| CredentialError::Unexpected(format!("hash failed: {e}")))
    }

    /// Compare `password` against a stored hash.
    ///
    /// # Errors
    /// Returns [`CredentialError::Unexpected`] if the stored hash is malformed or the worker panics.
    pub async fn verify(
        &self,
        password: SecretString,
        hash: String,
    ) -> Result<bool, CredentialError> {
        task::spawn_blocking(move || bcrypt::verify(password.expose_secret(), &hash))
            .await
            .map_err(|e| CredentialError::Unexpected(format!("verify task failed: {e}")))?
            .map_err(|e| CredentialError::Unexpected(format!("verify failed: {e}")))
    }
}
