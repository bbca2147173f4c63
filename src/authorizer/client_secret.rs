//! Service principal authorizer using the OAuth 2.0 client credentials grant.
//!
//! Tokens are requested from `{active_directory}{tenant}/oauth2/token` for a single
//! resource and cached until shortly before they expire.

use super::Authorizer;
use super::cache::{AccessToken, TokenCache};
use crate::config::{CloudEnvironment, EnvVarNames};
use crate::env::Env;
use crate::error::{AuthError, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use tracing::debug;

/// Everything needed to ask Azure AD for a service principal token.
#[derive(Debug, Clone)]
pub struct ClientSecretCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
    /// Authority host, e.g. `https://login.microsoftonline.com/`.
    pub active_directory_endpoint: String,
    /// Audience the token is issued for.
    pub resource: String,
}

impl ClientSecretCredentials {
    /// Reads client id, secret and tenant from `env`; the cloud defaults to public
    /// unless the `*_ENVIRONMENT` variable names another one.
    pub fn from_env(env: &Env, names: &EnvVarNames) -> Result<Self> {
        let required = |name: &str| {
            env.non_empty(name).ok_or_else(|| {
                AuthError::ConfigurationError(format!("{name} is not set or empty"))
            })
        };
        let client_id = required(&names.client_id)?;
        let client_secret = required(&names.client_secret)?;
        let tenant_id = required(&names.tenant_id)?;

        let cloud = match env.non_empty(&names.environment) {
            Some(name) => CloudEnvironment::from_name(&name)?,
            None => CloudEnvironment::default(),
        };

        Ok(Self {
            tenant_id,
            client_id,
            client_secret: SecretString::from(client_secret),
            active_directory_endpoint: cloud.active_directory_endpoint.to_string(),
            resource: cloud.resource_manager_endpoint.to_string(),
        })
    }

    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/token",
            self.active_directory_endpoint.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(deserialize_with = "seconds_from_str_or_int")]
    expires_in: i64,
}

/// Azure AD v1 endpoints return `expires_in` as a string, v2 as a number.
fn seconds_from_str_or_int<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Secs {
        Int(i64),
        Str(String),
    }
    match Secs::deserialize(deserializer)? {
        Secs::Int(n) => Ok(n),
        Secs::Str(s) => s.trim().parse::<i64>().map_err(serde::de::Error::custom),
    }
}

/// Service principal authorizer with in-memory caching.
pub struct ClientSecretAuthorizer {
    creds: ClientSecretCredentials,
    http: reqwest::blocking::Client,
    cache: TokenCache,
}

impl ClientSecretAuthorizer {
    /// No request is made until the first [`Authorizer::token`] call.
    pub fn new(creds: ClientSecretCredentials, http: reqwest::blocking::Client) -> Self {
        Self {
            creds,
            http,
            cache: TokenCache::new(),
        }
    }

    pub fn credentials(&self) -> &ClientSecretCredentials {
        &self.creds
    }

    fn fetch_new_token(&self) -> Result<AccessToken> {
        let url = self.creds.token_url();
        debug!(
            tenant_id = %self.creds.tenant_id,
            client_id = %self.creds.client_id,
            resource = %self.creds.resource,
            "requesting service principal token"
        );

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.creds.client_id.as_str()),
            ("client_secret", self.creds.client_secret.expose_secret()),
            ("resource", self.creds.resource.as_str()),
        ];

        let resp = self
            .http
            .post(url)
            .form(&form)
            .send()
            .map_err(|e| AuthError::HttpError(format!("Token endpoint request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(AuthError::TokenRequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        let tr: TokenResponse = resp
            .json()
            .map_err(|e| AuthError::ParseError(format!("Failed to parse token response: {e}")))?;

        AccessToken::expiring_in(tr.access_token, tr.expires_in)
    }
}

impl Authorizer for ClientSecretAuthorizer {
    fn token(&self) -> Result<String> {
        self.cache.get_or_refresh(|| self.fetch_new_token())
    }
}
