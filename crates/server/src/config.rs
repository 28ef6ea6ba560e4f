use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use docqa::PipelineConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// When the index is built relative to accepting connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBuildMode {
    /// Build before binding. The first request sees the finished index.
    #[default]
    Blocking,
    /// Bind immediately and build in a supervised task.
    Background,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds. Covers retrieval and generation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// `["*"]` or an explicit list of origins.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Only honoured with an explicit origin list.
    #[serde(default = "default_true")]
    pub allow_credentials: bool,

    /// Log level or full `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JSON log lines instead of human-readable ones
    #[serde(default = "default_true")]
    pub log_json: bool,

    #[serde(default)]
    pub index_build: IndexBuildMode,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            allowed_origins: default_allowed_origins(),
            allow_credentials: default_true(),
            log_level: default_log_level(),
            log_json: default_true(),
            index_build: IndexBuildMode::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads `.env`, then the optional `docqa.{toml,yaml,json}` file, then
    /// `DOCQA__*` variables, then the plain `PORT`, `FRONTEND_URL` and
    /// provider key variables. Later sources win.
    pub fn load() -> ServerResult<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("docqa").required(false))
            .add_source(
                config::Environment::with_prefix("DOCQA")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_origins"),
            );

        let mut config: ServerConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config.apply_legacy_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies the short variable names deployments already use.
    ///
    /// `PORT` and `FRONTEND_URL` override whatever was configured. Provider
    /// keys only fill in a key that is still unset.
    pub fn apply_legacy_env<F>(&mut self, lookup: F) -> ServerResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = port.trim().parse().map_err(|_| {
                ServerError::Config(format!("PORT must be a port number, got {port:?}"))
            })?;
        }

        if let Some(origins) = lookup("FRONTEND_URL") {
            let origins: Vec<String> = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
            if !origins.is_empty() {
                self.allowed_origins = origins;
            }
        }

        let embedding = &mut self.pipeline.embedding;
        if embedding.api_key.is_none() {
            if let Some(env) = embedding.provider.api_key_env() {
                embedding.api_key = lookup(env);
            }
        }

        let generation = &mut self.pipeline.generation;
        if generation.api_key.is_none() {
            generation.api_key = lookup(generation.provider.api_key_env());
        }
        Ok(())
    }

    pub fn validate(&self) -> ServerResult<()> {
        self.pipeline
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        if self.timeout_secs == 0 {
            return Err(ServerError::Config("timeout_secs must be at least 1".into()));
        }
        if self.max_body_size_mb == 0 {
            return Err(ServerError::Config("max_body_size_mb must be at least 1".into()));
        }

        if self.allowed_origins.is_empty() {
            return Err(ServerError::Config("allowed_origins must not be empty".into()));
        }
        if self.allowed_origins.iter().any(|o| o == "*") {
            if self.allowed_origins.len() > 1 {
                return Err(ServerError::Config(
                    "allowed_origins cannot mix \"*\" with explicit origins".into(),
                ));
            }
        } else {
            self.origin_header_values()?;
        }
        Ok(())
    }

    /// True when every origin is allowed.
    pub fn any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    pub fn origin_header_values(&self) -> ServerResult<Vec<HeaderValue>> {
        self.allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin.trim_end_matches('/'))
                    .map_err(|_| ServerError::Config(format!("invalid origin {origin:?}")))
            })
            .collect()
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Deadline for answering one question, retrieval and generation
    /// included.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Deadline of the outer timeout layer. Longer than [`Self::timeout`] so
    /// `/ask` always reports its own deadline as an answer, never as a 408.
    pub fn layer_timeout(&self) -> Duration {
        self.timeout() + LAYER_TIMEOUT_GRACE
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

const LAYER_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_body_size_mb() -> usize {
    1
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
