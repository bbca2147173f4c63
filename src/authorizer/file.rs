//! SDK auth file support.
//!
//! The file is the JSON written by `az ad sp create-for-rbac --sdk-auth`: a service
//! principal plus the endpoints of the cloud it lives in. Endpoints missing from the
//! file fall back to the public cloud.

use super::client_secret::ClientSecretCredentials;
use crate::config::{PUBLIC_CLOUD, same_endpoint};
use crate::error::{AuthError, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

/// Parsed contents of an SDK auth file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthFile {
    pub client_id: String,
    pub client_secret: SecretString,
    #[serde(default)]
    pub subscription_id: Option<String>,
    pub tenant_id: String,
    #[serde(default)]
    pub active_directory_endpoint_url: Option<String>,
    #[serde(default)]
    pub resource_manager_endpoint_url: Option<String>,
    #[serde(default)]
    pub active_directory_graph_resource_id: Option<String>,
    #[serde(default)]
    pub management_endpoint_url: Option<String>,
    #[serde(default)]
    pub gallery_endpoint_url: Option<String>,
    #[serde(default)]
    pub sql_management_endpoint_url: Option<String>,
}

impl AuthFile {
    /// Reads and parses the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            AuthError::ConfigurationError(format!(
                "Failed to read auth file {}: {e}",
                path.display()
            ))
        })?;
        let text = decode_text(&bytes)?;
        Self::from_json(&text)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str::<Self>(json)
            .map_err(|e| AuthError::ParseError(format!("Invalid auth file JSON: {e}")))
    }

    pub fn active_directory_endpoint(&self) -> &str {
        self.active_directory_endpoint_url
            .as_deref()
            .unwrap_or(PUBLIC_CLOUD.active_directory_endpoint)
    }

    pub fn resource_manager_endpoint(&self) -> &str {
        self.resource_manager_endpoint_url
            .as_deref()
            .unwrap_or(PUBLIC_CLOUD.resource_manager_endpoint)
    }

    pub fn management_endpoint(&self) -> &str {
        self.management_endpoint_url
            .as_deref()
            .unwrap_or(PUBLIC_CLOUD.management_endpoint)
    }

    pub fn graph_resource(&self) -> &str {
        self.active_directory_graph_resource_id
            .as_deref()
            .unwrap_or(PUBLIC_CLOUD.graph_endpoint)
    }

    pub fn gallery_endpoint(&self) -> &str {
        self.gallery_endpoint_url
            .as_deref()
            .unwrap_or(PUBLIC_CLOUD.gallery_endpoint)
    }

    /// Maps a base URI onto the token resource this file uses for it.
    ///
    /// Callers pass public-cloud defaults; the file may describe a different cloud,
    /// so each default is translated to the file's matching endpoint. A URI that is
    /// already one of the file's own endpoints is returned unchanged.
    pub fn resource_for(&self, base_uri: &str) -> Result<String> {
        let table = [
            (
                PUBLIC_CLOUD.resource_manager_endpoint,
                self.resource_manager_endpoint(),
            ),
            (PUBLIC_CLOUD.management_endpoint, self.management_endpoint()),
            (
                PUBLIC_CLOUD.active_directory_endpoint,
                self.active_directory_endpoint(),
            ),
            (PUBLIC_CLOUD.graph_endpoint, self.graph_resource()),
            (PUBLIC_CLOUD.gallery_endpoint, self.gallery_endpoint()),
        ];

        if let Some((_, own)) = table.iter().find(|(public, _)| same_endpoint(public, base_uri)) {
            return Ok((*own).to_string());
        }
        if table.iter().any(|(_, own)| same_endpoint(own, base_uri)) {
            return Ok(base_uri.to_string());
        }
        Err(AuthError::ConfigurationError(format!(
            "base URI {base_uri} did not match any endpoint in the auth file"
        )))
    }

    /// Service principal credentials for tokens issued for `resource`.
    pub fn credentials(&self, resource: impl Into<String>) -> ClientSecretCredentials {
        ClientSecretCredentials {
            tenant_id: self.tenant_id.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            active_directory_endpoint: self.active_directory_endpoint().to_string(),
            resource: resource.into(),
        }
    }
}

/// Accepts UTF-8 (with or without BOM) and BOM-marked UTF-16, which is what
/// PowerShell redirection produces on Windows.
fn decode_text(bytes: &[u8]) -> Result<String> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => decode_utf8(rest),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => decode_utf8(bytes),
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| AuthError::ParseError(format!("Invalid UTF-8 in auth file: {e}")))
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| unit([c[0], c[1]]))
        .collect();
    String::from_utf16(&units)
        .map_err(|e| AuthError::ParseError(format!("Invalid UTF-16 in auth file: {e}")))
}
