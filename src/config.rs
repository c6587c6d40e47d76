use report_format::FormatRules;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Contents of the `--config` TOML file.
///
/// ```toml
/// [format]
/// font_family = "Calibri"
/// section_keywords = ["conclusão:"]
///
/// [format.legacy]
/// footnote_keywords = ["aviso"]
/// ```
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub format: FormatRules,
}

impl Config {
    /// Reads `path`; a missing file means the defaults, a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}
