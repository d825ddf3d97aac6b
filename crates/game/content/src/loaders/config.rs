//! Core configuration loader.

use std::path::Path;

use accord_core::CoreConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for core configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Keys missing from the file keep their defaults.
    pub fn load(path: &Path) -> LoadResult<CoreConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<CoreConfig> {
        let config: CoreConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        if config.max_proposals_per_target == 0 {
            anyhow::bail!("max_proposals_per_target must be at least 1");
        }
        Ok(config)
    }
}
