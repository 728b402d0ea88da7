//! User credential registration and authentication.
//!
//! Register looks the username up, hashes the password with bcrypt and inserts
//! the new record. The lookup and the insert are not atomic; the `users`
//! collection carries a unique key on `username`, so a racing insert is
//! rejected by the store and reported as [`CredentialError::DuplicateUsername`]
//! exactly like a username found by the lookup.
//!
//! Authenticate reports an unknown username and a wrong password with the same
//! [`CredentialError::InvalidCredentials`] so callers cannot enumerate users.

use crate::store::{to_body, Collection, DocumentStore, StoreError, Stored};
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};
use utoipa::ToSchema;

mod hasher;
pub use self::hasher::{PasswordHasher, DEFAULT_COST, MAX_COST, MIN_COST};

#[derive(ToSchema, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailAddress {
    pub email: String,
}

/// A registered user as persisted in the `users` collection.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserCredential {
    pub username: String,
    /// bcrypt hash, stored under the `password` field.
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(rename = "emailAddresses", alias = "emailAddress", default)]
    pub email_addresses: Vec<EmailAddress>,
}

impl std::fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredential")
            .field("username", &self.username)
            .field("password_hash", &"***")
            .field("email_addresses", &self.email_addresses)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Username is already in use")]
    DuplicateUsername,
    #[error("Invalid username and/or password")]
    InvalidCredentials,
    #[error("store failure: {0}")]
    Store(StoreError),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl From<StoreError> for CredentialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => Self::DuplicateUsername,
            other => Self::Store(other),
        }
    }
}

/// Persistence collaborator for credentials. Users are only ever addressed by username.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Stored<UserCredential>>, StoreError>;

    /// # Errors
    /// Returns [`StoreError::Conflict`] if the username is already taken.
    async fn insert(&self, user: UserCredential) -> Result<Stored<UserCredential>, StoreError>;
}

/// [`UserStore`] over the `users` collection of a [`DocumentStore`].
#[derive(Clone)]
pub struct DocumentUsers {
    store: Arc<dyn DocumentStore>,
}

impl DocumentUsers {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserStore for DocumentUsers {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Stored<UserCredential>>, StoreError> {
        self.store
            .find_one(Collection::Users, "username", username)
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    async fn insert(&self, user: UserCredential) -> Result<Stored<UserCredential>, StoreError> {
        let doc = self.store.insert(Collection::Users, to_body(&user)?).await?;
        Ok(Stored {
            id: doc.id,
            record: user,
        })
    }
}

/// Registration input. The password is plaintext until hashed.
pub struct Registration {
    pub username: String,
    pub password: SecretString,
    pub email_addresses: Vec<EmailAddress>,
}

#[derive(Clone)]
pub struct Credentials {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    #[must_use]
    pub const fn hasher(&self) -> PasswordHasher {
        self.hasher
    }

    /// Create a user with a hashed password.
    ///
    /// # Errors
    /// [`CredentialError::DuplicateUsername`] when the username is taken, otherwise
    /// store or hashing failures.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(
        &self,
        registration: Registration,
    ) -> Result<Stored<UserCredential>, CredentialError> {
        if self
            .users
            .find_by_username(&registration.username)
            .await?
            .is_some()
        {
            debug!("Username is already in use");
            return Err(CredentialError::DuplicateUsername);
        }

        let password_hash = self.hasher.hash(registration.password).await?;

        let user = self
            .users
            .insert(UserCredential {
                username: registration.username,
                password_hash,
                email_addresses: registration.email_addresses,
            })
            .await?;

        debug!(id = %user.id, "User registered");

        Ok(user)
    }

    /// Check a username/password pair. No session state is created.
    ///
    /// # Errors
    /// [`CredentialError::InvalidCredentials`] for an unknown user or a wrong password.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: SecretString,
    ) -> Result<(), CredentialError> {
        let Some(user) = self.users.find_by_username(username).await? else {
            debug!("Unknown username");
            return Err(CredentialError::InvalidCredentials);
        };

        if self
            .hasher
            .verify(password, user.record.password_hash)
            .await?
        {
            debug!("User logged in");
            Ok(())
        } else {
            debug!("Password mismatch");
            Err(CredentialError::InvalidCredentials)
        }
    }
}
