//! TOML configuration file source

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;
use tracing::warn;

/// Add `path` to the builder; a missing file is skipped with a warning unless `required`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    required: bool,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if !path.exists() {
        if required {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        warn!(config_path = %path.display(), "Configuration file not found, using defaults");
        return Ok(builder);
    }

    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(required)))
}

/// Add an in-memory TOML document to the builder.
pub fn add_str_to_builder(
    builder: ConfigBuilder<DefaultState>,
    contents: &str,
) -> ConfigBuilder<DefaultState> {
    builder.add_source(File::from_str(contents, FileFormat::Toml))
}
