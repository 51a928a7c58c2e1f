use crate::config::types::NodeConfig;
use crate::error::{ConfigError, ConfigResult};

pub fn validate(config: &NodeConfig) -> ConfigResult<()> {
    if config.pool.initial_size == 0 {
        return Err(ConfigError::Invalid("pool.initial_size must be > 0".into()));
    }
    if config.pool.growth_step == 0 {
        return Err(ConfigError::Invalid("pool.growth_step must be > 0".into()));
    }
    if let Some(max) = config.pool.max_size {
        if max < config.pool.initial_size {
            return Err(ConfigError::Invalid(
                "pool.max_size must be >= pool.initial_size".into(),
            ));
        }
    }
    if config.detection.inspect_bytes == 0 {
        return Err(ConfigError::Invalid("detection.inspect_bytes must be > 0".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&NodeConfig::default()).is_ok());
    }

    #[test]
    fn zero_initial_size_rejected() {
        let mut cfg = NodeConfig::default();
        cfg.pool.initial_size = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn max_below_initial_rejected() {
        let mut cfg = NodeConfig::default();
        cfg.pool.initial_size = 100;
        cfg.pool.max_size = Some(10);
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn zero_inspect_bytes_rejected() {
        let mut cfg = NodeConfig::default();
        cfg.detection.inspect_bytes = 0;
        assert!(validate(&cfg).is_err());
    }
}
