use std::{fs, io::ErrorKind, path::Path};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

pub const CONFIG_FILE: &str = "config.json";

/// Database settings persisted next to the catalog snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema that unqualified table names resolve to
    pub default_schema: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_schema: "public".to_string(),
        }
    }
}

impl Config {
    /// Reads `config.json` from `dir`, falling back to defaults when absent
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(json) => {
                debug!(path = %path.display(), "config loaded");
                Ok(serde_json::from_str(&json)?)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn store(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join(CONFIG_FILE), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_FILE, Config};
    use crate::error::Result;

    #[test]
    fn test_load_defaults_when_absent() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(Config::load(dir.path())?.default_schema, "public");
        Ok(())
    }

    #[test]
    fn test_store_and_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config {
            default_schema: "app".into(),
        };
        config.store(dir.path())?;
        assert_eq!(Config::load(dir.path())?, config);

        // unknown and missing fields are tolerated
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{"extra": 1}"#)?;
        assert_eq!(Config::load(dir.path())?, Config::default());
        Ok(())
    }
}
