//! INI file configuration adapter.

use crate::domain::error::SignalbenchError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

/// `ConfigPort` over a parsed INI document. Section and key names are
/// case-insensitive.
pub struct FileConfigAdapter {
    config: Ini,
    source: String,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SignalbenchError> {
        let source = path.as_ref().display().to_string();
        let mut config = Ini::new();
        config
            .load(path.as_ref())
            .map_err(|reason| SignalbenchError::ConfigParse {
                file: source.clone(),
                reason,
            })?;
        Ok(Self { config, source })
    }

    pub fn from_string(content: &str) -> Result<Self, SignalbenchError> {
        let source = "<inline>".to_string();
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SignalbenchError::ConfigParse {
                file: source.clone(),
                reason,
            })?;
        Ok(Self { config, source })
    }

    /// Where the configuration came from, for diagnostics.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
