use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bulkstate_core::{EngineOptions, IdentifierSyntax, DEFAULT_CHUNK_SIZE};
use bulkstate_gateway_http::HttpGatewayConfig;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    pub export: ExportConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Name of the environment variable holding the bearer token.
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub identifier_syntax: IdentifierSyntax,
    #[serde(default = "default_true")]
    pub verify_transition: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            identifier_syntax: IdentifierSyntax::Uuid,
            verify_transition: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportConfig {
    pub dir: String,
}

fn default_api_version() -> String {
    "v9.2".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            remote: RemoteConfig {
                base_url: "https://example.crm.dynamics.com".to_string(),
                api_version: default_api_version(),
                token_env: "BULKSTATE_TOKEN".to_string(),
                timeout_secs: default_timeout_secs(),
            },
            engine: EngineConfig::default(),
            export: ExportConfig {
                dir: "~/.bulkstate/exports".to_string(),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| "parse bulkstate.toml")?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn config_path(root: &Path) -> PathBuf {
        root.join(".bulkstate").join("bulkstate.toml")
    }

    pub fn export_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.export.dir).to_string())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            chunk_size: self.engine.chunk_size,
            identifier_syntax: self.engine.identifier_syntax,
        }
    }

    pub fn http_gateway_config(&self) -> Result<HttpGatewayConfig> {
        let token = std::env::var(&self.remote.token_env)
            .with_context(|| format!("bearer token not set; export {}", self.remote.token_env))?;
        Ok(HttpGatewayConfig {
            base_url: self.remote.base_url.clone(),
            api_version: self.remote.api_version.clone(),
            token,
            timeout: Duration::from_secs(self.remote.timeout_secs),
        })
    }
}
