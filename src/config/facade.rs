//! Single entry point for assembling a `ConversionConfig` from every source.

use super::merge::merge_policy;
use super::sources::{environment, file};
use super::{validation_failure, ConversionConfig};
use crate::error::ConversionError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then `config_file` if it exists, then `AGGREGATE__*` environment overrides.
    pub fn load(config_file: Option<&Path>) -> Result<ConversionConfig, ConversionError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        if let Some(path) = config_file {
            builder = file::add_to_builder(builder, path, false)?;
        }
        Self::finish(environment::add_to_builder(builder))
    }

    /// Defaults overlaid with a file that must exist; the environment is not consulted.
    pub fn load_from_file(path: &Path) -> Result<ConversionConfig, ConversionError> {
        let builder = file::add_to_builder(merge_policy::builder_with_defaults()?, path, true)?;
        Self::finish(builder)
    }

    /// Defaults overlaid with an in-memory TOML document.
    pub fn load_from_str(contents: &str) -> Result<ConversionConfig, ConversionError> {
        let builder = file::add_str_to_builder(merge_policy::builder_with_defaults()?, contents);
        Self::finish(builder)
    }

    /// Built-in defaults only
    pub fn default() -> ConversionConfig {
        ConversionConfig::default()
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<ConversionConfig, ConversionError> {
        let config: ConversionConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(validation_failure)?;
        debug!(
            max_depth = config.planning.max_depth,
            entities = config.entities.len(),
            "Loaded configuration"
        );
        Ok(config)
    }
}
