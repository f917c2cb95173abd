//! Configuration management for portfolio-intel
//!
//! Settings come from `~/.pintel/config.yaml` (or `--config`), then
//! environment overrides, then CLI flags applied by the command context.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheTtl, DemoMode, TtlPolicy};
use crate::error::{ConfigError, Result};

const DEFAULT_DATABASE_URL: &str = "file:./dev.db";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `scripts/` and the spreadsheets they read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,

    /// Interpreter used for extraction scripts
    #[serde(default = "default_python")]
    pub python: String,

    /// SQLite location, `file:` prefix optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// AI provider settings
    #[serde(default)]
    pub ai: AiSettings,

    /// Cache lifetimes and demo mode
    #[serde(default)]
    pub cache: CacheSettings,
}

fn default_python() -> String {
    "python3".to_string()
}

/// AI provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    "claude-3-5-sonnet-latest".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Stretch every lifetime by `demo_multiplier`
    #[serde(default)]
    pub demo_mode: bool,

    #[serde(default = "default_demo_multiplier")]
    pub demo_multiplier: u32,

    #[serde(default)]
    pub ttl: TtlSettings,

    /// How long a caller waits on a producer; unset waits forever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer_timeout_secs: Option<u64>,

    /// Interval of the background expiry sweep
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_demo_multiplier() -> u32 {
    CacheTtl::DEMO_MULTIPLIER
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            demo_mode: false,
            demo_multiplier: default_demo_multiplier(),
            ttl: TtlSettings::default(),
            producer_timeout_secs: None,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Nominal lifetimes in seconds, before demo scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtlSettings {
    #[serde(default = "default_financial_secs")]
    pub financial_secs: u64,
    #[serde(default = "default_customer_secs")]
    pub customer_secs: u64,
    #[serde(default = "default_ai_derived_secs")]
    pub ai_derived_secs: u64,
    #[serde(default = "default_static_secs")]
    pub static_secs: u64,
}

fn default_financial_secs() -> u64 {
    CacheTtl::FINANCIAL.as_secs()
}

fn default_customer_secs() -> u64 {
    CacheTtl::CUSTOMER.as_secs()
}

fn default_ai_derived_secs() -> u64 {
    CacheTtl::AI_DERIVED.as_secs()
}

fn default_static_secs() -> u64 {
    CacheTtl::STATIC.as_secs()
}

impl Default for TtlSettings {
    fn default() -> Self {
        Self {
            financial_secs: default_financial_secs(),
            customer_secs: default_customer_secs(),
            ai_derived_secs: default_ai_derived_secs(),
            static_secs: default_static_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: None,
            python: default_python(),
            database_url: None,
            ai: AiSettings::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".pintel").join("config.yaml"))
    }

    /// Load configuration from an explicit path, or the default location.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(path)
                } else {
                    log::debug!("No config at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to an explicit path, or the default location
    pub fn save_at(&self, path: Option<&str>) -> Result<()> {
        match path {
            Some(path) => self.save_to(path),
            None => self.save_to(Self::default_path()?),
        }
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(path, contents)?;

        // May hold the AI key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup` (the environment in production).
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(raw) = get("PINTEL_DEMO_MODE") {
            self.cache.demo_mode = parse_flag("PINTEL_DEMO_MODE", &raw)?;
        }
        if let Some(root) = get("PINTEL_PROJECT_ROOT") {
            self.project_root = Some(PathBuf::from(root));
        }
        if let Some(url) = get("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.ai.api_key = Some(key);
        }

        Ok(())
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.cache.demo_multiplier == 0 {
            return Err(
                ConfigError::Invalid("cache.demo_multiplier must be at least 1".to_string()).into(),
            );
        }
        if self.python.trim().is_empty() {
            return Err(ConfigError::Invalid("python must not be empty".to_string()).into());
        }
        if self.cache.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache.sweep_interval_secs must be at least 1".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Nominal lifetimes from the config file
    pub fn ttl_policy(&self) -> TtlPolicy {
        let ttl = &self.cache.ttl;
        TtlPolicy {
            financial: Duration::from_secs(ttl.financial_secs),
            customer: Duration::from_secs(ttl.customer_secs),
            ai_derived: Duration::from_secs(ttl.ai_derived_secs),
            static_data: Duration::from_secs(ttl.static_secs),
        }
    }

    pub fn demo_mode(&self) -> DemoMode {
        DemoMode {
            enabled: self.cache.demo_mode,
            multiplier: self.cache.demo_multiplier,
        }
    }

    pub fn producer_timeout(&self) -> Option<Duration> {
        self.cache.producer_timeout_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache.sweep_interval_secs)
    }

    /// Project root, falling back to the working directory
    pub fn project_root(&self) -> PathBuf {
        self.project_root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.project_root().join("scripts")
    }

    /// SQLite file path; relative paths resolve against the project root
    pub fn database_path(&self) -> PathBuf {
        let url = self.database_url.as_deref().unwrap_or(DEFAULT_DATABASE_URL);
        let raw = url
            .strip_prefix("file:")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);

        let path = PathBuf::from(raw);
        if path.is_absolute() {
            path
        } else {
            self.project_root().join(path)
        }
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid(format!("{} must be a boolean, got '{}'", name, other)).into()),
    }
}
