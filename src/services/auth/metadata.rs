//! OAuth 2.0 Protected Resource Metadata (RFC 9728).
//!
//! 401 responses point clients at the metadata document through the
//! `resource_metadata` parameter of `WWW-Authenticate`; the document tells them
//! which authorization server issues tokens for this server.

use serde::Serialize;
use url::Url;

pub const WELL_KNOWN_PATH: &str = "/.well-known/oauth-protected-resource";

/// Metadata discovery URL for `server_url`.
///
/// `https://mcp.example.com`     -> `https://mcp.example.com/.well-known/oauth-protected-resource`
/// `https://mcp.example.com/mcp` -> `https://mcp.example.com/.well-known/oauth-protected-resource/mcp`
pub fn resource_metadata_url(server_url: &Url) -> Url {
    let path = server_url.path();
    let suffix = if path == "/" { "" } else { path };

    let mut url = server_url.clone();
    url.set_path(&format!("{WELL_KNOWN_PATH}{suffix}"));
    url.set_query(None);
    url.set_fragment(None);
    url
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceMetadata {
    pub resource: String,
    pub authorization_servers: Vec<String>,
    pub scopes_supported: Vec<String>,
    pub bearer_methods_supported: Vec<String>,
    pub resource_name: String,
}

/// This server as an OAuth protected resource.
#[derive(Debug, Clone)]
pub struct ProtectedResource {
    metadata_url: Url,
    document: ResourceMetadata,
}

impl ProtectedResource {
    pub fn new(server_url: Url, issuer: String, scopes_supported: Vec<String>) -> Self {
        let metadata_url = resource_metadata_url(&server_url);
        let document = ResourceMetadata {
            resource: server_url.to_string(),
            authorization_servers: vec![issuer],
            scopes_supported,
            bearer_methods_supported: vec!["header".to_string()],
            resource_name: env!("CARGO_PKG_NAME").to_string(),
        };

        Self {
            metadata_url,
            document,
        }
    }

    pub fn metadata_url(&self) -> &Url {
        &self.metadata_url
    }

    /// Route path the metadata document is served on.
    pub fn metadata_path(&self) -> &str {
        self.metadata_url.path()
    }

    pub fn document(&self) -> &ResourceMetadata {
        &self.document
    }
}
