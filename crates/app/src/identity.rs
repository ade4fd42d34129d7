//! Identity
//!
//! What the cart needs from the identity provider: a stable user id and a
//! way to obtain the user's current bearer credential.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

/// Stable identifier of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Bearer credential for the remote cart store. Zeroed on drop and never
/// printed.
#[derive(Clone)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    /// Wrap a raw bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// The raw token, for building an `Authorization` header.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Errors raised when a credential cannot be obtained.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The identity provider could not issue a token.
    #[error("credential unavailable: {0}")]
    Unavailable(String),
}

/// Source of the signed-in user's current credential.
#[automock]
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetch the current credential, refreshing it if needed.
    async fn credential(&self) -> Result<Credential, CredentialError>;
}

/// A credential handed over as-is, e.g. from the command line.
#[derive(Debug, Clone)]
pub struct StaticCredential(Credential);

impl StaticCredential {
    /// Wrap a credential.
    pub fn new(credential: Credential) -> Self {
        Self(credential)
    }
}

#[async_trait]
impl CredentialSource for StaticCredential {
    async fn credential(&self) -> Result<Credential, CredentialError> {
        Ok(self.0.clone())
    }
}

/// A user reported by the identity provider's sign-in event.
#[derive(Clone)]
pub struct SignedInUser {
    id: UserId,
    credentials: Arc<dyn CredentialSource>,
}

impl SignedInUser {
    /// Create a signed-in user.
    pub fn new(id: UserId, credentials: Arc<dyn CredentialSource>) -> Self {
        Self { id, credentials }
    }

    /// Convenience constructor for a user with a fixed bearer token.
    pub fn with_token(id: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(
            UserId::new(id),
            Arc::new(StaticCredential::new(Credential::new(token))),
        )
    }

    /// The user's id.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Fetch the user's current credential.
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] if the identity provider cannot issue
    /// one.
    pub async fn credential(&self) -> Result<Credential, CredentialError> {
        self.credentials.credential().await
    }
}

impl fmt::Debug for SignedInUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedInUser")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("secret-token");

        assert_eq!(format!("{credential:?}"), "Credential(..)");
        assert_eq!(credential.expose(), "secret-token");
    }

    #[tokio::test]
    async fn with_token_yields_static_credential() -> TestResult {
        let user = SignedInUser::with_token("u1", "abc");

        assert_eq!(user.id(), &UserId::from("u1"));
        assert_eq!(user.credential().await?.expose(), "abc");

        Ok(())
    }

    #[tokio::test]
    async fn mocked_source_failure_propagates() {
        let mut source = MockCredentialSource::new();
        source
            .expect_credential()
            .once()
            .returning(|| Err(CredentialError::Unavailable("offline".to_string())));

        let user = SignedInUser::new(UserId::from("u1"), Arc::new(source));

        assert!(matches!(
            user.credential().await,
            Err(CredentialError::Unavailable(_))
        ));
    }
}
