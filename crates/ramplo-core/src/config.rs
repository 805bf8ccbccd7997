use crate::advisory::{Advisor, AnthropicAdvisor, AnthropicSettings, DisabledAdvisor};
use crate::catalog::SprintCatalog;
use crate::error::Result;
use crate::outreach::OutreachCatalog;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// AdvisoryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key. The key itself is never stored.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    crate::advisory::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    crate::advisory::DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Sprint catalog override; the built-in catalog is used when unset.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub outreach_catalog: Option<PathBuf>,
    #[serde(default)]
    pub advisory: AdvisoryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_version() -> u32 {
    1
}

fn default_database() -> PathBuf {
    PathBuf::from(paths::DEFAULT_DATABASE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            database: default_database(),
            catalog: None,
            outreach_catalog: None,
            advisory: AdvisoryConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load `<root>/.ramplo/config.yaml`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        crate::migrations::migrate_config(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn database_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.database)
    }

    pub fn load_catalog(&self, root: &Path) -> Result<SprintCatalog> {
        match &self.catalog {
            Some(path) => SprintCatalog::load(&paths::resolve(root, path)),
            None => SprintCatalog::builtin(),
        }
    }

    pub fn load_outreach_catalog(&self, root: &Path) -> Result<OutreachCatalog> {
        match &self.outreach_catalog {
            Some(path) => OutreachCatalog::load(&paths::resolve(root, path)),
            None => OutreachCatalog::builtin(),
        }
    }

    /// The advisory client this config describes, reading the key from the environment.
    pub fn build_advisor(&self) -> Arc<dyn Advisor> {
        self.build_advisor_with(|name| std::env::var(name).ok())
    }

    pub fn build_advisor_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Arc<dyn Advisor> {
        if !self.advisory.enabled {
            return Arc::new(DisabledAdvisor);
        }
        let Some(key) = lookup(&self.advisory.api_key_env).filter(|k| !k.trim().is_empty()) else {
            tracing::debug!(env = %self.advisory.api_key_env, "no advisory key, rules only");
            return Arc::new(DisabledAdvisor);
        };
        Arc::new(AnthropicAdvisor::new(AnthropicSettings {
            base_url: self.advisory.base_url.trim_end_matches('/').to_string(),
            api_key: key,
            model: self.advisory.model.clone(),
            timeout: Duration::from_secs(self.advisory.timeout_secs),
            max_tokens: self.advisory.max_tokens,
        }))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        self.validate_with(|name| std::env::var(name).ok())
    }

    pub fn validate_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.version > crate::migrations::CONFIG_VERSION {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "config version {} is newer than this build supports ({})",
                    self.version,
                    crate::migrations::CONFIG_VERSION
                ),
            });
        }

        if self.database.as_os_str().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "database path is empty".to_string(),
            });
        }

        if self.advisory.enabled {
            if lookup(&self.advisory.api_key_env).is_none_or(|k| k.trim().is_empty()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "advisory is enabled but ${} is not set; selection will use rules only",
                        self.advisory.api_key_env
                    ),
                });
            }
            if self.advisory.timeout_secs == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "advisory.timeout_secs must be greater than zero".to_string(),
                });
            }
            if self.advisory.max_tokens == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "advisory.max_tokens must be greater than zero".to_string(),
                });
            }
            if !self.advisory.base_url.starts_with("http://")
                && !self.advisory.base_url.starts_with("https://")
            {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("advisory.base_url '{}' is not an http(s) URL", self.advisory.base_url),
                });
            }
        }

        if self.server.port == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "server.port is 0; an ephemeral port will be chosen".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn with_key(name: &str) -> Option<String> {
        (name == "ANTHROPIC_API_KEY").then(|| "sk-test".to_string())
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.server.port, 3141);
        assert_eq!(cfg.advisory.timeout_secs, 20);
        assert_eq!(cfg.database_path(dir.path()), dir.path().join(".ramplo/ramplo.db"));
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.server.port = 8080;
        cfg.advisory.enabled = false;
        cfg.catalog = Some(PathBuf::from("catalog/sprints.yaml"));
        cfg.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), cfg);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("advisory:\n  model: claude-x\n").unwrap();
        assert_eq!(cfg.advisory.model, "claude-x");
        assert!(cfg.advisory.enabled);
        assert_eq!(cfg.advisory.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(cfg.version, 1);
    }

    #[test]
    fn validate_default_with_key_is_clean() {
        assert!(Config::default().validate_with(with_key).is_empty());
    }

    #[test]
    fn validate_warns_on_missing_key_and_zero_timeout() {
        let mut cfg = Config::default();
        cfg.advisory.timeout_secs = 0;
        let warnings = cfg.validate_with(|_| None);
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains("ANTHROPIC_API_KEY")));
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("timeout_secs")));
    }

    #[test]
    fn validate_skips_advisory_checks_when_disabled() {
        let mut cfg = Config::default();
        cfg.advisory.enabled = false;
        cfg.advisory.timeout_secs = 0;
        assert!(cfg.validate_with(|_| None).is_empty());
    }

    #[test]
    fn advisor_requires_enabled_and_key() {
        let cfg = Config::default();
        let advisor = cfg.build_advisor_with(|_| None);
        let request = crate::advisory::AdvisoryRequest {
            system: String::new(),
            context: String::new(),
            response_shape: String::new(),
        };
        assert!(matches!(
            advisor.advise(&request),
            Err(crate::advisory::AdvisoryError::Disabled)
        ));

        let mut off = Config::default();
        off.advisory.enabled = false;
        assert!(matches!(
            off.build_advisor_with(with_key).advise(&request),
            Err(crate::advisory::AdvisoryError::Disabled)
        ));
    }

    #[test]
    fn catalog_override_is_resolved_against_root() {
        let dir = TempDir::new().unwrap();
        let yaml = "version: 1\nsprints: []\n";
        std::fs::write(dir.path().join("custom.yaml"), yaml).unwrap();
        let cfg = Config {
            catalog: Some(PathBuf::from("custom.yaml")),
            ..Config::default()
        };
        // an empty catalog is rejected at load
        assert!(cfg.load_catalog(dir.path()).is_err());
        assert!(Config::default().load_catalog(dir.path()).is_ok());
        assert!(Config::default().load_outreach_catalog(dir.path()).is_ok());
    }
}
