//! Configuration for the arena

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arena_adapter::AdaptationConfig;
use arena_container::{
    ContainerFactory, DefaultContainerFactory, HostEnvironment, SandboxedContainerFactory,
};
use serde::{Deserialize, Serialize};

/// Main arena configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Adaptation tunables
    #[serde(default)]
    pub adaptation: AdaptationConfig,

    /// Sheet execution
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Container isolation
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sheet execution configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Per-statement deadline in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Candidates evaluated at the same time
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_candidates: usize,
}

impl ExecutionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_concurrent_candidates: default_max_concurrent(),
        }
    }
}

/// Which container factory to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxKind {
    /// No filesystem access at all
    #[default]
    Default,
    /// A private working directory per container
    Sandboxed,
}

/// Container isolation configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default)]
    pub kind: SandboxKind,

    /// Parent of the per-container working directories. Defaults to
    /// `<tmp>/arena`.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Directories every container may read
    #[serde(default)]
    pub read_only_roots: Vec<PathBuf>,
}

impl SandboxConfig {
    /// Factory for the configured isolation level.
    pub fn factory(&self) -> Arc<dyn ContainerFactory> {
        match self.kind {
            SandboxKind::Default => Arc::new(DefaultContainerFactory),
            SandboxKind::Sandboxed => {
                let root = self
                    .root
                    .clone()
                    .unwrap_or_else(|| std::env::temp_dir().join("arena"));
                Arc::new(SandboxedContainerFactory::new(root))
            }
        }
    }

    /// Host environment shared by every container.
    pub fn host(&self) -> HostEnvironment {
        self.read_only_roots
            .iter()
            .fold(HostEnvironment::new(), |host, root| {
                host.with_read_only_root(root.clone())
            })
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_timeout_ms() -> u64 {
    5_000
}

fn default_max_concurrent() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ArenaConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `ARENA_`-prefixed environment variables
    /// (`ARENA_EXECUTION__TIMEOUT_MS=250`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ArenaConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("ARENA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
