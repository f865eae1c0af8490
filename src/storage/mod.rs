//! Remote storage for artifacts.
//!
//! Two seams keep the network out of the pipeline core:
//!
//! - [`CredentialProvider`] hands out an access [`Token`]. How the token was
//!   obtained (browser consent, refresh, a cached file) is not our concern.
//! - [`RemoteStore`] creates one new file under a parent folder.
//!
//! [`drive::DriveClient`] implements the store against the Google Drive v3
//! upload endpoint.

pub mod credentials;
pub mod drive;

use crate::error::{AuthError, UploadError};
use crate::models::RemoteFile;
use std::fmt;

pub use credentials::{CachedCredential, ConfiguredCredential};
pub use drive::DriveClient;

/// Bearer token for the remote store.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Source of access tokens.
pub trait CredentialProvider {
    async fn obtain_credential(&self) -> Result<Token, AuthError>;
}

/// Destination for uploaded artifacts.
pub trait RemoteStore {
    /// Create a new file named `name` under `parent_folder_id` holding
    /// `content`. Never overwrites; every call makes a new remote object.
    async fn create_file(
        &self,
        token: &Token,
        parent_folder_id: &str,
        name: &str,
        content: Vec<u8>,
    ) -> Result<RemoteFile, UploadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("ya29.secret");
        assert_eq!(format!("{token:?}"), "Token(<redacted>)");
        assert_eq!(token.secret(), "ya29.secret");
    }
}
