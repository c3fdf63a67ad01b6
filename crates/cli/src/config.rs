use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Optional `helpdesk.toml` next to the working directory; every field
/// has a default so the file can be partial or absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub db_path: String,
    pub export_dir: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: "helpdesk.db".to_string(),
            export_dir: PathBuf::from("exports"),
        }
    }
}

pub fn load(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => parse_file(path),
        None => {
            let default_path = Path::new("helpdesk.toml");
            if default_path.exists() {
                parse_file(default_path)
            } else {
                Ok(CliConfig::default())
            }
        }
    }
}

fn parse_file(path: &Path) -> Result<CliConfig> {
    let raw = fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let config: CliConfig = toml::from_str("db_path = \"/tmp/tickets.db\"").unwrap();
        assert_eq!(config.db_path, "/tmp/tickets.db");
        assert_eq!(config.export_dir, PathBuf::from("exports"));
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config.db_path, "helpdesk.db");
    }
}
