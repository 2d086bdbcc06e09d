// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Knowledge Store Configuration
//
// Defines the configuration schema for a pattern-cortex store, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Storage backend selection (JSON snapshot or SQLite)
// - Search defaults
// - Logging settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "pattern-cortex/v1";
pub const KIND: &str = "KnowledgeConfig";

/// Top-level Kubernetes-style configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfigManifest {
    /// API version (must be "pattern-cortex/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "KnowledgeConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: KnowledgeConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable store name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeConfigSpec {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage backend, selected once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Whole-store JSON snapshot file
    Json {
        #[serde(default = "default_json_path")]
        path: PathBuf,
    },
    /// Relational tables in a SQLite database
    Sqlite {
        #[serde(default = "default_sqlite_url")]
        url: String,

        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Json {
            path: default_json_path(),
        }
    }
}

impl StorageConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StorageConfig::Json { .. } => "json",
            StorageConfig::Sqlite { .. } => "sqlite",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of episodes returned by similarity search
    #[serde(default = "default_similar_episode_limit")]
    pub similar_episode_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            similar_episode_limit: default_similar_episode_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_json_path() -> PathBuf {
    PathBuf::from("./data/knowledge.json")
}

fn default_sqlite_url() -> String {
    "sqlite://./data/knowledge.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_similar_episode_limit() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for KnowledgeConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "pattern-cortex".to_string(),
                version: Some("1.0.0".to_string()),
            },
            spec: KnowledgeConfigSpec::default(),
        }
    }
}

impl KnowledgeConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. PCORTEX_CONFIG_PATH environment variable
    /// 2. ./pattern-cortex.yaml (working directory)
    /// 3. ~/.pattern-cortex/config.yaml (user home)
    /// 4. /etc/pattern-cortex/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PCORTEX_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./pattern-cortex.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".pattern-cortex").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/pattern-cortex/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = lookup("PCORTEX_STORAGE_BACKEND") {
            match backend.to_lowercase().as_str() {
                "json" => {
                    if !matches!(self.spec.storage, StorageConfig::Json { .. }) {
                        tracing::info!("Environment override: PCORTEX_STORAGE_BACKEND=json");
                        self.spec.storage = StorageConfig::Json {
                            path: default_json_path(),
                        };
                    }
                }
                "sqlite" => {
                    if !matches!(self.spec.storage, StorageConfig::Sqlite { .. }) {
                        tracing::info!("Environment override: PCORTEX_STORAGE_BACKEND=sqlite");
                        self.spec.storage = StorageConfig::Sqlite {
                            url: default_sqlite_url(),
                            max_connections: default_max_connections(),
                        };
                    }
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for PCORTEX_STORAGE_BACKEND: '{}'. Expected json/sqlite. Ignoring.",
                        backend
                    );
                }
            }
        }

        if let Some(data_path) = lookup("PCORTEX_DATA_PATH") {
            if let StorageConfig::Json { path } = &mut self.spec.storage {
                tracing::info!("Environment override: PCORTEX_DATA_PATH={}", data_path);
                *path = PathBuf::from(data_path);
            }
        }

        if let Some(database_url) = lookup("PCORTEX_DATABASE_URL") {
            if let StorageConfig::Sqlite { url, .. } = &mut self.spec.storage {
                tracing::info!("Environment override: PCORTEX_DATABASE_URL set");
                *url = database_url;
            }
        }

        if let Some(level) = lookup("PCORTEX_LOG_LEVEL") {
            self.spec.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        match &self.spec.storage {
            StorageConfig::Json { path } => {
                if path.as_os_str().is_empty() {
                    anyhow::bail!("spec.storage.path cannot be empty");
                }
            }
            StorageConfig::Sqlite { url, max_connections } => {
                if url.is_empty() {
                    anyhow::bail!("spec.storage.url cannot be empty");
                }
                if *max_connections == 0 {
                    anyhow::bail!("spec.storage.max_connections must be at least 1");
                }
            }
        }

        if self.spec.search.similar_episode_limit == 0 {
            anyhow::bail!("spec.search.similar_episode_limit must be at least 1");
        }

        match self.spec.logging.format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("Invalid logging format: '{}'. Expected text or json", other),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_manifest() {
        let manifest = KnowledgeConfigManifest::default();
        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.kind, KIND);
        assert_eq!(manifest.spec.storage.backend_name(), "json");
        assert_eq!(manifest.spec.search.similar_episode_limit, 5);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_sqlite_backend() {
        let yaml = r#"
apiVersion: pattern-cortex/v1
kind: KnowledgeConfig
metadata:
  name: team-store
spec:
  storage:
    backend: sqlite
    url: "sqlite://./team.db?mode=rwc"
  logging:
    level: debug
    format: json
"#;
        let manifest = KnowledgeConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(
            manifest.spec.storage,
            StorageConfig::Sqlite {
                url: "sqlite://./team.db?mode=rwc".to_string(),
                max_connections: 5,
            }
        );
        assert_eq!(manifest.spec.search.similar_episode_limit, 5);
        assert_eq!(manifest.spec.logging.level, "debug");
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut manifest = KnowledgeConfigManifest::default();
        manifest.spec.storage = StorageConfig::Json {
            path: PathBuf::from("/var/lib/pattern-cortex/store.json"),
        };

        let yaml = serde_yaml::to_string(&manifest).unwrap();
        let parsed = KnowledgeConfigManifest::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed.spec.storage, manifest.spec.storage);
        assert_eq!(parsed.metadata.name, "pattern-cortex");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PCORTEX_STORAGE_BACKEND", "sqlite"),
            ("PCORTEX_DATABASE_URL", "sqlite::memory:"),
            ("PCORTEX_LOG_LEVEL", "trace"),
        ]);
        let mut manifest = KnowledgeConfigManifest::default();
        manifest.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(
            manifest.spec.storage,
            StorageConfig::Sqlite {
                url: "sqlite::memory:".to_string(),
                max_connections: 5,
            }
        );
        assert_eq!(manifest.spec.logging.level, "trace");
    }

    #[test]
    fn test_invalid_backend_override_is_ignored() {
        let mut manifest = KnowledgeConfigManifest::default();
        manifest.apply_overrides(|key| {
            (key == "PCORTEX_STORAGE_BACKEND").then(|| "redis".to_string())
        });
        assert_eq!(manifest.spec.storage.backend_name(), "json");
    }

    #[test]
    fn test_validation() {
        let mut manifest = KnowledgeConfigManifest::default();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.search.similar_episode_limit = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.search.similar_episode_limit = 5;

        manifest.spec.logging.format = "xml".to_string();
        assert!(manifest.validate().is_err());
        manifest.spec.logging.format = "text".to_string();

        manifest.spec.storage = StorageConfig::Sqlite {
            url: String::new(),
            max_connections: 5,
        };
        assert!(manifest.validate().is_err());
    }
}
