//! Pipeline configuration
//!
//! One explicit configuration value loaded at startup and passed by
//! construction into each component. Nothing reads the environment after
//! `PipelineConfig::load` returns.

use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default registry base URL for local development.
pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:9292";

/// Default timeout for registry requests in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default maximum generic-file count per object-create request.
pub const DEFAULT_MAX_FILES_PER_CREATE: usize = 200;

/// Default worker-pool size applied to any stage without an override.
pub const DEFAULT_WORKERS_PER_STAGE: usize = 4;

/// Top-level pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub registry: RegistryConfig,
    pub workers: WorkerPoolConfig,
    pub topics: TopicConfig,
}

/// Registry client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the metadata registry
    pub url: String,
    /// API token sent on every request, if the registry requires one
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Hard cap on generic files embedded in one object-create request
    pub max_files_per_create: usize,
}

/// Per-stage worker-pool sizes. Pool scheduling itself is owned by an
/// external dispatcher; the core only carries the sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    pub fetch: usize,
    pub prepare: usize,
    pub store: usize,
    pub record: usize,
    pub cleanup: usize,
    pub restore: usize,
    pub delete: usize,
}

/// Message-queue topic names per stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    pub fetch: String,
    pub store: String,
    pub record: String,
    pub restore: String,
    pub delete: String,
}

impl PipelineConfig {
    /// Load configuration from environment variables and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = PipelineConfig {
            registry: RegistryConfig {
                url: std::env::var("BAGFLOW_REGISTRY_URL")
                    .unwrap_or_else(|_| DEFAULT_REGISTRY_URL.to_string()),
                api_token: std::env::var("BAGFLOW_REGISTRY_TOKEN").ok(),
                request_timeout_secs: std::env::var("BAGFLOW_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
                max_files_per_create: std::env::var("BAGFLOW_MAX_FILES_PER_CREATE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_MAX_FILES_PER_CREATE),
            },
            workers: WorkerPoolConfig {
                fetch: pool_size("BAGFLOW_FETCH_WORKERS"),
                prepare: pool_size("BAGFLOW_PREPARE_WORKERS"),
                store: pool_size("BAGFLOW_STORE_WORKERS"),
                record: pool_size("BAGFLOW_RECORD_WORKERS"),
                cleanup: pool_size("BAGFLOW_CLEANUP_WORKERS"),
                restore: pool_size("BAGFLOW_RESTORE_WORKERS"),
                delete: pool_size("BAGFLOW_DELETE_WORKERS"),
            },
            topics: TopicConfig {
                fetch: topic("BAGFLOW_FETCH_TOPIC", "bag_fetch"),
                store: topic("BAGFLOW_STORE_TOPIC", "bag_store"),
                record: topic("BAGFLOW_RECORD_TOPIC", "bag_record"),
                restore: topic("BAGFLOW_RESTORE_TOPIC", "object_restore"),
                delete: topic("BAGFLOW_DELETE_TOPIC", "object_delete"),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.registry.url.is_empty() {
            anyhow::bail!("registry URL must not be empty");
        }
        if self.registry.max_files_per_create == 0 {
            anyhow::bail!("max_files_per_create must be at least 1");
        }
        if self.registry.request_timeout_secs == 0 {
            anyhow::bail!("request timeout must be at least 1 second");
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig {
                url: DEFAULT_REGISTRY_URL.to_string(),
                api_token: None,
                request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                max_files_per_create: DEFAULT_MAX_FILES_PER_CREATE,
            },
            workers: WorkerPoolConfig {
                fetch: DEFAULT_WORKERS_PER_STAGE,
                prepare: DEFAULT_WORKERS_PER_STAGE,
                store: DEFAULT_WORKERS_PER_STAGE,
                record: DEFAULT_WORKERS_PER_STAGE,
                cleanup: DEFAULT_WORKERS_PER_STAGE,
                restore: DEFAULT_WORKERS_PER_STAGE,
                delete: DEFAULT_WORKERS_PER_STAGE,
            },
            topics: TopicConfig {
                fetch: "bag_fetch".to_string(),
                store: "bag_store".to_string(),
                record: "bag_record".to_string(),
                restore: "object_restore".to_string(),
                delete: "object_delete".to_string(),
            },
        }
    }
}

fn pool_size(var: &str) -> usize {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_WORKERS_PER_STAGE)
}

fn topic(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}
