//! Command execution context
//!
//! Builds the configuration, the cache and every collaborator once per
//! process so all commands share one cache instance.

use std::sync::Arc;

use log::debug;
use tokio::task::JoinHandle;

use crate::cache::Cache;
use crate::cli::{GlobalOptions, OutputFormat};
use crate::config::Config;
use crate::data::DataLayer;
use crate::error::Result;
use crate::sources::{AiClient, ScriptRunner, SqliteStore, Sources};

/// Context for command execution containing config, data layer and output format.
pub struct AppContext {
    /// Config file merged with environment and CLI overrides
    pub config: Config,
    /// Cached adapters over the live collaborators
    pub data: DataLayer,
    /// Output format preference
    pub format: OutputFormat,
    sweeper: JoinHandle<()>,
}

impl AppContext {
    /// Load configuration and wire the collaborators.
    ///
    /// Must run inside a tokio runtime; the cache sweeper is spawned here.
    ///
    /// # Errors
    /// Returns error if the config cannot be loaded or is invalid.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let mut config = Config::load_at(opts.config_ref())?;
        config.apply_env()?;
        apply_overrides(&mut config, opts);
        config.validate()?;

        let demo = config.demo_mode();
        let ttl = config.ttl_policy().active(demo);
        if demo.enabled {
            debug!("Demo mode on: cache lifetimes x{}", demo.multiplier);
        }

        let cache = Cache::new(ttl.financial, config.producer_timeout());
        let sweeper = cache.spawn_sweeper(config.sweep_interval());

        let sources = Sources {
            scripts: Arc::new(ScriptRunner::new(config.python.clone(), config.scripts_dir())),
            store: Arc::new(SqliteStore::new(config.database_path())),
            ai: Arc::new(AiClient::new(&config.ai)?),
        };
        debug!(
            "Project root {}, database {}",
            config.project_root().display(),
            config.database_path().display()
        );

        Ok(Self {
            data: DataLayer::new(cache, ttl, sources),
            config,
            format: opts.format,
            sweeper,
        })
    }

    pub fn cache(&self) -> &Cache {
        self.data.cache()
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

/// CLI flags win over the file and the environment.
fn apply_overrides(config: &mut Config, opts: &GlobalOptions) {
    if opts.demo_mode {
        config.cache.demo_mode = true;
    }
    if let Some(secs) = opts.timeout {
        config.cache.producer_timeout_secs = Some(secs);
    }
}
