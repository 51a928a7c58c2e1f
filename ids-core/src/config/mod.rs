mod loader;
mod types;
mod validator;

pub use loader::load_from_path;
pub use types::{DetectionConfig, LoggingConfig, NodeConfig, PoolConfig};
pub use validator::validate;
