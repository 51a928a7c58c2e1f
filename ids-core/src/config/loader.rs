use std::fs;
use std::path::Path;

use crate::config::types::NodeConfig;
use crate::config::validator::validate;
use crate::error::ConfigResult;

pub fn load_from_path<P: AsRef<Path>>(path: P) -> ConfigResult<NodeConfig> {
    let text = fs::read_to_string(path)?;
    let config: NodeConfig = toml::from_str(&text)?;
    validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_defaults_from_empty_document() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();
        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg, NodeConfig::default());
    }

    #[test]
    fn loads_overridden_pool_settings() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[pool]\ninitial_size = 10\ngrowth_step = 5\nmax_size = 100\n").unwrap();
        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.pool.initial_size, 10);
        assert_eq!(cfg.pool.growth_step, 5);
        assert_eq!(cfg.pool.max_size, Some(100));
    }

    #[test]
    fn rejects_invalid_settings() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[pool]\ninitial_size = 0\n").unwrap();
        assert!(load_from_path(file.path()).is_err());
    }

    #[test]
    fn missing_file_errors() {
        assert!(load_from_path("/nonexistent/path/config.toml").is_err());
    }
}
