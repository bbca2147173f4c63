//! Authorizers and the token plumbing they share.
//! An authorizer hands out Bearer tokens for one resource (audience).

use crate::error::Result;
use reqwest::blocking::RequestBuilder;

pub mod cache;
pub mod cli;
pub mod client_secret;
pub mod file;

pub use cache::AccessToken;
pub use cli::{CliAuthorizer, CliOutput, CliRunner, ProcessCliRunner};
pub use client_secret::{ClientSecretAuthorizer, ClientSecretCredentials};
pub use file::AuthFile;

/// Something that can attach credentials to outbound Azure requests.
///
/// Notes:
/// - The interface is synchronous, matching the blocking HTTP client used by
///   the built-in authorizers.
/// - Implementations cache tokens internally and refresh them near expiry.
pub trait Authorizer: Send + Sync {
    /// Returns an access token suitable for `Authorization: Bearer <token>`.
    fn token(&self) -> Result<String>;

    /// Full `Authorization` header value.
    fn authorization_header(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.token()?))
    }

    /// Attaches the Bearer token to a request.
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request.bearer_auth(self.token()?))
    }
}

impl<T: Authorizer + ?Sized> Authorizer for Box<T> {
    fn token(&self) -> Result<String> {
        (**self).token()
    }
}

impl<T: Authorizer + ?Sized> Authorizer for std::sync::Arc<T> {
    fn token(&self) -> Result<String> {
        (**self).token()
    }
}

/// Fixed token, for tests and for callers that manage tokens elsewhere.
pub struct StaticAuthorizer {
    token: String,
}

impl StaticAuthorizer {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Authorizer for StaticAuthorizer {
    fn token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}
