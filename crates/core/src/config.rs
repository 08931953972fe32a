use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "sitedrop.toml";

/// Environment variable overriding the listening port
pub const PORT_ENV: &str = "PORT";

/// Environment variable supplying the default bearer token
pub const TOKEN_ENV: &str = "VERCEL_TOKEN";

/// Process-wide relay configuration, read once at startup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub port: u16,
    /// Token used when a request does not carry its own
    pub vercel_token: Option<String>,
    /// Directory served as the companion frontend
    pub public_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub provider: ProviderConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            vercel_token: None,
            public_dir: PathBuf::from("public"),
            max_upload_bytes: 10 * 1024 * 1024,
            provider: ProviderConfig::default(),
        }
    }
}

/// Hosting provider endpoints and polling behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_base: String,
    /// Domain used to build the fallback site URL
    pub domain: String,
    pub create_timeout_secs: u64,
    pub poll_timeout_secs: u64,
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.vercel.com".to_string(),
            domain: "vercel.app".to_string(),
            create_timeout_secs: 60,
            poll_timeout_secs: 30,
            poll_attempts: 10,
            poll_interval_ms: 2000,
        }
    }
}

impl ProviderConfig {
    pub fn create_timeout(&self) -> Duration {
        Duration::from_secs(self.create_timeout_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl RelayConfig {
    /// Configured default token, if set to something other than whitespace
    pub fn default_token(&self) -> Option<&str> {
        self.vercel_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Apply `PORT` and `VERCEL_TOKEN` overrides from `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV) {
            self.port = port.trim().parse().map_err(|_| {
                Error::InvalidData(format!("{} must be a port number, got '{}'", PORT_ENV, port))
            })?;
        }

        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            self.vercel_token = Some(token);
        }

        Ok(self)
    }

    fn validate(self) -> Result<Self> {
        if self.provider.api_base.trim().is_empty() {
            return Err(Error::InvalidData(
                "provider.api_base must not be empty".to_string(),
            ));
        }
        if self.provider.domain.trim().is_empty() {
            return Err(Error::InvalidData(
                "provider.domain must not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Load configuration from an explicit file, or from `sitedrop.toml` if present.
///
/// An explicit path must exist. Without one, a missing default file yields the
/// built-in defaults. Environment overrides are applied separately with
/// [`RelayConfig::with_env`].
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            parse_config_str(&content)
        }
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                let content = fs::read_to_string(path)?;
                parse_config_str(&content)
            } else {
                Ok(RelayConfig::default())
            }
        }
    }
}

/// Parse configuration from a TOML string (useful for testing)
pub fn parse_config_str(content: &str) -> Result<RelayConfig> {
    let config: RelayConfig = toml::from_str(content)?;
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.default_token(), None);
        assert_eq!(config.provider.api_base, "https://api.vercel.com");
        assert_eq!(config.provider.domain, "vercel.app");
        assert_eq!(config.provider.create_timeout(), Duration::from_secs(60));
        assert_eq!(config.provider.poll_attempts, 10);
        assert_eq!(config.provider.poll_interval(), Duration::from_millis(2000));
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse_config_str("").unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.public_dir, PathBuf::from("public"));
    }

    #[test]
    fn test_parse_partial_provider_section() {
        let toml = r#"
port = 8080
vercel_token = "abc"

[provider]
poll_attempts = 3
poll_interval_ms = 10
        "#;

        let config = parse_config_str(toml).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_token(), Some("abc"));
        assert_eq!(config.provider.poll_attempts, 3);
        assert_eq!(config.provider.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.provider.domain, "vercel.app");
    }

    #[test]
    fn test_parse_rejects_empty_api_base() {
        let result = parse_config_str("[provider]\napi_base = \"  \"\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("api_base"));
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        let result = parse_config_str("port = \"not a number\"");
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_whitespace_token_is_not_a_token() {
        let config = parse_config_str("vercel_token = \"   \"").unwrap();
        assert_eq!(config.default_token(), None);
    }

    #[test]
    fn test_env_overrides() {
        let config = RelayConfig::default()
            .with_env(env(&[("PORT", "4100"), ("VERCEL_TOKEN", "from-env")]))
            .unwrap();
        assert_eq!(config.port, 4100);
        assert_eq!(config.default_token(), Some("from-env"));
    }

    #[test]
    fn test_env_blank_token_keeps_file_token() {
        let config = parse_config_str("vercel_token = \"from-file\"")
            .unwrap()
            .with_env(env(&[("VERCEL_TOKEN", "")]))
            .unwrap();
        assert_eq!(config.default_token(), Some("from-file"));
    }

    #[test]
    fn test_env_rejects_invalid_port() {
        let result = RelayConfig::default().with_env(env(&[("PORT", "http")]));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PORT"));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        fs::write(&path, "port = 9000\npublic_dir = \"site\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.public_dir, PathBuf::from("site"));
    }

    #[test]
    fn test_load_config_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(Error::IoError(_))));
    }
}
