//! Optional project configuration.
//!
//! A `pindefs.toml` next to the working directory supplies defaults for the
//! CLI flags; flags always win. An absent file is not an error, a
//! malformed one is.

use crate::core::error::PindefsError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "pindefs.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Path to the KiCad XML netlist export.
    pub netlist: Option<PathBuf>,
    /// Root snippet name (sheetpath + SnippetType, e.g. `/Mcu`).
    pub root: Option<String>,
    /// Default output path for `gen`.
    pub output: Option<PathBuf>,
    /// Default output format.
    pub format: Option<String>,
    /// Comma-separated snippet path globs.
    pub filter: Option<String>,
}

impl ProjectConfig {
    pub fn load(dir: &Path) -> Result<Self, PindefsError> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)?;
        toml::from_str(&raw).map_err(|e| {
            PindefsError::ConfigError(format!("{}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn absent_file_yields_defaults() {
        let tmp = tempdir().unwrap();
        let cfg = ProjectConfig::load(tmp.path()).unwrap();
        assert!(cfg.netlist.is_none());
        assert!(cfg.root.is_none());
    }

    #[test]
    fn loads_known_keys() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "netlist = \"board.xml\"\nroot = \"/Mcu\"\nformat = \"header\"\n",
        )
        .unwrap();
        let cfg = ProjectConfig::load(tmp.path()).unwrap();
        assert_eq!(cfg.netlist.unwrap(), PathBuf::from("board.xml"));
        assert_eq!(cfg.root.as_deref(), Some("/Mcu"));
        assert_eq!(cfg.format.as_deref(), Some("header"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "rootsnippet = \"/Mcu\"\n").unwrap();
        assert!(matches!(
            ProjectConfig::load(tmp.path()),
            Err(PindefsError::ConfigError(_))
        ));
    }
}
