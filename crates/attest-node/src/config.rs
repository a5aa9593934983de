//! Node configuration loading and management.

use attest_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Full configuration for the Attest node.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AttestConfig {
    /// API server settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Signing key settings.
    #[serde(default)]
    pub signing: SigningConfig,

    /// Credential engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API listen address.
    #[serde(default = "default_api_addr")]
    pub listen_addr: String,
    /// API port.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    Memory,
    Rocksdb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which store backend to run.
    #[serde(default)]
    pub backend: StorageBackendKind,
    /// Path to the data directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Per-operation store timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SigningConfig {
    /// Environment variable holding a hex seed. Takes precedence over `key_file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_env: Option<String>,
    /// Hex seed file, generated on first start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
    /// `did:key` ids of retired signing keys that still verify.
    #[serde(default)]
    pub retired_keys: Vec<String>,
}

// Default value functions
fn default_api_addr() -> String {
    "127.0.0.1".into()
}
fn default_api_port() -> u16 {
    9001
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_timeout_ms() -> u64 {
    2_000
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_api_addr(),
            port: default_api_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            data_dir: default_data_dir(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AttestConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: AttestConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// API socket address string.
    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.api.listen_addr, self.api.port)
    }

    /// Engine view with the storage timeout applied.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            store_timeout_ms: self.storage.timeout_ms,
            ..self.engine.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AttestConfig::default();
        assert_eq!(config.api.port, 9001);
        assert_eq!(config.storage.backend, StorageBackendKind::Memory);
        assert_eq!(config.storage.timeout_ms, 2_000);
        assert_eq!(config.logging.level, "info");
        assert!(config.signing.retired_keys.is_empty());
        assert_eq!(config.engine.presentation_ttl_secs, 86_400);
    }

    #[test]
    fn test_api_addr() {
        let config = AttestConfig::default();
        assert_eq!(config.api_addr(), "127.0.0.1:9001");
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AttestConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let decoded: AttestConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(decoded.api.port, config.api.port);
        assert_eq!(decoded.engine.contexts, config.engine.contexts);
        assert_eq!(decoded.engine.verify_base_url, config.engine.verify_base_url);
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let config = AttestConfig::load(Path::new("/nonexistent/attest.toml")).unwrap();
        assert_eq!(config.api.port, 9001);
    }

    #[test]
    fn test_config_from_toml_partial() {
        let toml_str = r#"
[api]
port = 8081

[storage]
backend = "rocksdb"
timeout_ms = 500

[signing]
key_env = "ATTEST_SIGNING_KEY"

[engine]
issuer = "did:example:permit-office"
verify_base_url = "https://permits.example.gov/vc/verify"

[engine.type_validity_claims]
TradeLicense = "licenseEnd"
"#;
        let config: AttestConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.api.port, 8081);
        assert_eq!(config.storage.backend, StorageBackendKind::Rocksdb);
        assert_eq!(config.signing.key_env.as_deref(), Some("ATTEST_SIGNING_KEY"));
        assert_eq!(config.engine.issuer.as_deref(), Some("did:example:permit-office"));
        assert_eq!(
            config.engine.type_validity_claims.get("TradeLicense").map(String::as_str),
            Some("licenseEnd")
        );
        // Defaults for unspecified
        assert_eq!(config.logging.format, "text");
        assert_eq!(config.engine.default_holder, "did:example:holder");
        assert_eq!(config.engine_config().store_timeout_ms, 500);
    }

    #[test]
    fn test_engine_store_timeout_is_rejected() {
        let toml_str = r#"
[storage]
timeout_ms = 500

[engine]
store_timeout_ms = 10
"#;
        let err = toml::from_str::<AttestConfig>(toml_str).unwrap_err();
        assert!(err.to_string().contains("store_timeout_ms"));
    }
}
