//! Credential providers.
//!
//! The interactive consent flow happens outside this program. We accept a
//! token that was already issued, either directly (env var / flag) or from a
//! cached token file, and fetch it at most once per process.

use super::{CredentialProvider, Token};
use crate::error::AuthError;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

/// A token supplied up front.
#[derive(Debug, Clone)]
pub struct StaticToken(pub Token);

impl CredentialProvider for StaticToken {
    async fn obtain_credential(&self) -> Result<Token, AuthError> {
        Ok(self.0.clone())
    }
}

/// A token cached on disk as JSON with an `access_token` field, the shape
/// OAuth token endpoints return.
#[derive(Debug, Clone)]
pub struct TokenFile {
    pub path: PathBuf,
}

#[derive(Deserialize)]
struct StoredToken {
    access_token: String,
}

impl CredentialProvider for TokenFile {
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    async fn obtain_credential(&self) -> Result<Token, AuthError> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|source| AuthError::TokenFile {
                path: self.path.clone(),
                source,
            })?;
        let stored: StoredToken =
            serde_json::from_slice(&raw).map_err(|source| AuthError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        info!("Loaded cached access token");
        Ok(Token::new(stored.access_token))
    }
}

/// Provider chosen from configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredCredential {
    Static(StaticToken),
    File(TokenFile),
    Missing,
}

impl ConfiguredCredential {
    /// An explicit token wins over a token file.
    pub fn from_options(access_token: Option<String>, token_path: Option<PathBuf>) -> Self {
        match (access_token, token_path) {
            (Some(token), _) => Self::Static(StaticToken(Token::new(token))),
            (None, Some(path)) => Self::File(TokenFile { path }),
            (None, None) => Self::Missing,
        }
    }
}

impl CredentialProvider for ConfiguredCredential {
    async fn obtain_credential(&self) -> Result<Token, AuthError> {
        match self {
            Self::Static(p) => p.obtain_credential().await,
            Self::File(p) => p.obtain_credential().await,
            Self::Missing => Err(AuthError::Missing),
        }
    }
}

/// Wraps a provider so the credential is obtained once and reused. A failed
/// attempt is not cached.
#[derive(Debug)]
pub struct CachedCredential<P> {
    inner: P,
    token: OnceCell<Token>,
}

impl<P> CachedCredential<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            token: OnceCell::new(),
        }
    }
}

impl<P: CredentialProvider> CredentialProvider for CachedCredential<P> {
    async fn obtain_credential(&self) -> Result<Token, AuthError> {
        let token = self
            .token
            .get_or_try_init(|| async {
                debug!("Obtaining credential");
                self.inner.obtain_credential().await
            })
            .await?;
        Ok(token.clone())
    }
}
