//! Server configuration loaded from environment variables.
//!
//! Every setting has a default so a local development server starts with no
//! configuration at all. Values that fail to parse are logged and ignored.

use log::warn;
use std::path::PathBuf;

use common::upload::{UploadPolicy, DEFAULT_MAX_KB};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Env: `HTTP_HOST`. Default: `127.0.0.1`
    pub host: String,

    /// Env: `HTTP_PORT`. Default: `3001`
    pub port: u16,

    /// SQLite database file, or `:memory:`.
    /// Env: `DATABASE_PATH`. Default: `ispeak.sqlite`
    pub database_path: String,

    /// Root directory of the storage buckets, served under `/uploads`.
    /// Env: `STORAGE_ROOT`. Default: `./uploads`
    pub storage_root: PathBuf,

    /// Prefix for the public URLs of stored objects, e.g. `https://cdn.example.com`.
    /// Env: `PUBLIC_BASE_URL`. Default: empty (same origin)
    pub public_base_url: String,

    /// Image size ceiling in KB.
    /// Env: `MAX_UPLOAD_KB`. Default: `200`
    pub max_upload_kb: u32,

    /// Limit for JSON and multipart request bodies in MB.
    /// Env: `MAX_REQUEST_MB`. Default: `10`
    pub max_request_mb: usize,

    /// Lifetime of a bearer session.
    /// Env: `SESSION_TTL_HOURS`. Default: `168`
    pub session_ttl_hours: i64,

    /// Enables image analysis when set.
    /// Env: `OPENROUTER_API_KEY`
    pub openrouter_api_key: Option<String>,

    /// Env: `OPENROUTER_MODEL`. Default: `openai/gpt-5-nano`
    pub openrouter_model: String,

    /// Admin account created on start-up when both are set and the email is unknown.
    /// Env: `ADMIN_EMAIL`, `ADMIN_PASSWORD`
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,

    /// Opens the admin dashboard in the default browser once the server is up.
    /// Env: `OPEN_BROWSER` (true/false). Default: `false`
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            database_path: "ispeak.sqlite".to_string(),
            storage_root: PathBuf::from("./uploads"),
            public_base_url: String::new(),
            max_upload_kb: DEFAULT_MAX_KB,
            max_request_mb: 10,
            session_ttl_hours: 24 * 7,
            openrouter_api_key: None,
            openrouter_model: "openai/gpt-5-nano".to_string(),
            admin_email: None,
            admin_password: None,
            open_browser: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests need not touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(host) = non_empty("HTTP_HOST") {
            config.host = host;
        }
        parse_into(&lookup, "HTTP_PORT", &mut config.port);
        if let Some(path) = non_empty("DATABASE_PATH") {
            config.database_path = path;
        }
        if let Some(root) = non_empty("STORAGE_ROOT") {
            config.storage_root = PathBuf::from(root);
        }
        if let Some(base) = non_empty("PUBLIC_BASE_URL") {
            config.public_base_url = base.trim_end_matches('/').to_string();
        }
        parse_into(&lookup, "MAX_UPLOAD_KB", &mut config.max_upload_kb);
        parse_into(&lookup, "MAX_REQUEST_MB", &mut config.max_request_mb);
        parse_into(&lookup, "SESSION_TTL_HOURS", &mut config.session_ttl_hours);
        config.openrouter_api_key = non_empty("OPENROUTER_API_KEY");
        if let Some(model) = non_empty("OPENROUTER_MODEL") {
            config.openrouter_model = model;
        }
        config.admin_email = non_empty("ADMIN_EMAIL");
        config.admin_password = non_empty("ADMIN_PASSWORD");
        if let Some(val) = non_empty("OPEN_BROWSER") {
            config.open_browser = val == "true" || val == "1";
        }

        if config.max_upload_kb == 0 {
            warn!("MAX_UPLOAD_KB must be positive, using {}", DEFAULT_MAX_KB);
            config.max_upload_kb = DEFAULT_MAX_KB;
        }

        config
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::with_max_kb(self.max_upload_kb)
    }

    pub fn max_request_bytes(&self) -> usize {
        self.max_request_mb * 1024 * 1024
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn parse_into<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *slot = value,
            Err(_) => warn!("Invalid {}={:?}, using default", key, raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let env: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3001);
        assert_eq!(config.max_upload_kb, 200);
        assert!(config.openrouter_api_key.is_none());
        assert_eq!(config.upload_policy().max_bytes(), 200 * 1024);
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let config = config_from(&[
            ("HTTP_PORT", "8088"),
            ("MAX_UPLOAD_KB", " 400 "),
            ("PUBLIC_BASE_URL", "https://cdn.example.com/"),
            ("OPENROUTER_API_KEY", "  "),
        ]);
        assert_eq!(config.port, 8088);
        assert_eq!(config.max_upload_kb, 400);
        assert_eq!(config.public_base_url, "https://cdn.example.com");
        assert!(config.openrouter_api_key.is_none());
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = config_from(&[("HTTP_PORT", "eighty"), ("MAX_UPLOAD_KB", "0")]);
        assert_eq!(config.port, 3001);
        assert_eq!(config.max_upload_kb, 200);
    }
}
