use serde::Deserialize;

/// Load-time tunables for the stream-message pool (`streamqueue`).
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PoolConfig {
    /// Messages pre-allocated before the first packet arrives.
    pub initial_size: usize,
    /// How many messages to allocate at once on exhaustion.
    pub growth_step: usize,
    /// Hard cap on total allocations; `None` means unbounded growth.
    pub max_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { initial_size: 5000, growth_step: 250, max_size: None }
    }
}

/// Load-time tunables for app-layer protocol detection (`appproto`).
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Maximum number of reassembled bytes fed to the MPM per direction
    /// before giving up and returning `AppProto::Unknown`.
    pub inspect_bytes: usize,
    /// Register the baseline HTTP/TLS/SMB/SMB2/DCERPC patterns at
    /// startup. Disable to build a detector from a custom pattern set
    /// only.
    pub register_default_patterns: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { inspect_bytes: 4096, register_default_patterns: true }
    }
}

/// Logging verbosity, read the same way as every other setting here
/// rather than left to an ad hoc `RUST_LOG` read.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Passed straight through to `tracing_subscriber::EnvFilter` unless
    /// `RUST_LOG` is set in the environment, which always wins.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Root configuration document for `ids-node`.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct NodeConfig {
    pub pool: PoolConfig,
    pub detection: DetectionConfig,
    pub logging: LoggingConfig,
}
