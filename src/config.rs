/*
 * Responsibility
 * - 環境変数 (.env 含む) から起動設定を読み込む
 * - PORT / MCP_SERVER_URL / AUTH0_DOMAIN / AUTH0_AUDIENCE など
 * - 不足・不正な値は起動失敗 (ConfigError)
 */
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // Public base URL of this MCP server (used for resource metadata discovery)
    pub server_url: Url,

    pub auth0_domain: String,
    pub auth0_audience: String,
    pub access_token_leeway_seconds: u64,
    pub idp_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the process env in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            None => DEFAULT_PORT,
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let server_url = lookup("MCP_SERVER_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"));
        let server_url =
            Url::parse(&server_url).map_err(|_| ConfigError::Invalid("MCP_SERVER_URL"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth0_domain = lookup("AUTH0_DOMAIN").ok_or(ConfigError::Missing("AUTH0_DOMAIN"))?;
        let auth0_audience =
            lookup("AUTH0_AUDIENCE").ok_or(ConfigError::Missing("AUTH0_AUDIENCE"))?;

        let access_token_leeway_seconds = lookup("ACCESS_TOKEN_LEEWAY_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let idp_timeout = lookup("IDP_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            server_url,
            auth0_domain,
            auth0_audience,
            access_token_leeway_seconds,
            idp_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_port_and_server_url() {
        let config = Config::from_lookup(lookup_from(&[
            ("AUTH0_DOMAIN", "tenant.us.auth0.com"),
            ("AUTH0_AUDIENCE", "https://mcp.example.com"),
        ]))
        .unwrap();

        assert_eq!(config.addr.port(), 3001);
        assert_eq!(config.server_url.as_str(), "http://localhost:3001/");
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.access_token_leeway_seconds, 60);
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    fn server_url_follows_custom_port() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("AUTH0_DOMAIN", "tenant.us.auth0.com"),
            ("AUTH0_AUDIENCE", "aud"),
        ]))
        .unwrap();

        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.server_url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn explicit_server_url_wins() {
        let config = Config::from_lookup(lookup_from(&[
            ("MCP_SERVER_URL", "https://mcp.example.com/mcp"),
            ("APP_ENV", "prod"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
            ("AUTH0_DOMAIN", "tenant.us.auth0.com"),
            ("AUTH0_AUDIENCE", "aud"),
        ]))
        .unwrap();

        assert_eq!(config.server_url.as_str(), "https://mcp.example.com/mcp");
        assert!(config.app_env.is_production());
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn missing_identity_provider_settings_fail() {
        let err = Config::from_lookup(lookup_from(&[("AUTH0_AUDIENCE", "aud")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AUTH0_DOMAIN")));

        let err =
            Config::from_lookup(lookup_from(&[("AUTH0_DOMAIN", "d.auth0.com")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AUTH0_AUDIENCE")));
    }

    #[test]
    fn rejects_bad_port_and_url() {
        let err = Config::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("AUTH0_DOMAIN", "d"),
            ("AUTH0_AUDIENCE", "a"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("PORT")));

        let err = Config::from_lookup(lookup_from(&[
            ("MCP_SERVER_URL", "not a url"),
            ("AUTH0_DOMAIN", "d"),
            ("AUTH0_AUDIENCE", "a"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("MCP_SERVER_URL")));
    }
}
