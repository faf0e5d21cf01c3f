//! Client configuration: built-in defaults, then an optional TOML file, then
//! `BANK__*` environment variables (e.g. `BANK__API__BASE_URL`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub feed_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub state_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://bank-application-backend-api.onrender.com".to_string(),
                feed_url: "wss://bank-application-backend-api.onrender.com/currency-feed"
                    .to_string(),
                timeout_secs: 30,
            },
            storage: StorageConfig {
                state_file: PathBuf::from(".tiny-bank-client.json"),
            },
        }
    }
}

impl ClientConfig {
    pub fn load(file: Option<&Path>) -> Result<ClientConfig, config::ConfigError> {
        let defaults = config::Config::try_from(&ClientConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(config::Environment::with_prefix("BANK").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let loaded = ClientConfig::load(None).unwrap();
        assert_eq!(loaded.api.timeout_secs, 30);
        assert!(loaded.api.feed_url.ends_with("/currency-feed"));
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"http://127.0.0.1:3000\"\n\n[storage]\nstate_file = \"/tmp/bank.json\"\n",
        )
        .unwrap();

        let loaded = ClientConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.api.base_url, "http://127.0.0.1:3000");
        assert_eq!(loaded.api.timeout_secs, 30);
        assert_eq!(loaded.storage.state_file, PathBuf::from("/tmp/bank.json"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ClientConfig::load(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }
}
