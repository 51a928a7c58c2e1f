#![forbid(unsafe_code)]

pub mod addr;
pub mod appproto;
pub mod config;
pub mod engine;
pub mod error;
pub mod ipmatch;
pub mod keywords;
pub mod packet;
pub mod ruleaddr;
pub mod signature;
pub mod smb2;
pub mod streamqueue;
pub mod telemetry;

pub use config::{load_from_path, DetectionConfig, LoggingConfig, NodeConfig, PoolConfig};
pub use engine::{Engine, RuleSpec};
pub use error::{AddrError, ConfigError, PoolError, RuleError};
pub use packet::{Direction, FlowState, IpProto, Packet};
pub use signature::{ProtoMask, SignatureMeta, SignatureTable};
pub use telemetry::init_tracing;
