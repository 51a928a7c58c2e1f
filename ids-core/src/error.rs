use thiserror::Error;

/// Errors raised while parsing or compiling a rule.
///
/// These always bubble up to the rule loader; a rule that fails to
/// compile is reported and the rest of the ruleset keeps loading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("invalid address literal: {0}")]
    InvalidAddress(String),

    #[error("malformed CIDR expression: {0}")]
    InvalidCidr(String),

    #[error("unbalanced brackets in address expression: {0}")]
    UnbalancedBrackets(String),

    #[error("unknown address variable: {0}")]
    UnknownVariable(String),

    #[error("invalid port expression: {0}")]
    InvalidPort(String),

    #[error("invalid rpc keyword arguments: {0}")]
    InvalidRpc(String),

    #[error("invalid stream_size keyword arguments: {0}")]
    InvalidStreamSize(String),

    #[error("pattern registered with empty content")]
    EmptyPattern,

    #[error("address range algebra error: {0}")]
    AddrAlgebra(#[from] AddrError),
}

pub type RuleResult<T> = std::result::Result<T, RuleError>;

/// Internal invariant violations.
///
/// These indicate a bug in the engine itself — an address comparison that
/// fell through all seven defined outcomes, or a best-match radix lookup
/// that returned a node with no leaf data. Callers should treat these as
/// fatal in debug builds and log-and-skip in release builds; they never
/// cross a flow boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddrError {
    #[error("address comparison did not resolve to one of the seven defined outcomes")]
    NonExhaustiveCompare,

    #[error("cut() called on non-overlapping ranges")]
    NotOverlapping,

    #[error("cut_not() called on the full address space")]
    FullAddressSpace,

    #[error("join() called across address families")]
    FamilyMismatch,
}

pub type AddrResult<T> = std::result::Result<T, AddrError>;

/// Resource-exhaustion errors. Fatal at rule-load time; at packet
/// time they cause the single packet to be skipped, never process
/// termination.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("stream message pool exhausted (size {size}, in use {in_use})")]
    Exhausted { size: usize, in_use: usize },
}

pub type PoolResult<T> = std::result::Result<T, PoolError>;

/// Configuration-load errors for `ids-node`'s ambient config layer.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
