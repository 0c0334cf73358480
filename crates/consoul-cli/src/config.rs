//! Configuration file handling
//!
//! Looks for `consoul/config.toml` under the platform config directory.
//! Every key is optional; command line flags override what the file says.
//!
//! ```toml
//! color = "auto"
//!
//! [render]
//! smartypants = false
//! hyperlinks = true
//! ```

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;

use consoul_core::RenderOptions;

/// When to emit ANSI escape sequences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when stdout is a terminal and `NO_COLOR` is unset
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Decide for the current process
    pub fn resolve(self) -> bool {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
        self.enabled(std::io::stdout().is_terminal(), no_color)
    }

    fn enabled(self, is_terminal: bool, no_color: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => is_terminal && !no_color,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub color: ColorMode,
    pub render: RenderOptions,
}

/// Default config file location
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("consoul").join("config.toml"))
}

/// Load the config from `path`, or from the default location when `None`.
///
/// An explicit path must exist; a missing default file yields defaults.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_path() {
            Some(path) if path.exists() => path,
            _ => {
                tracing::debug!("No config file, using defaults");
                return Ok(Config::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    tracing::debug!(path = %path.display(), "Loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_color_mode_enabled() {
        assert!(ColorMode::Always.enabled(false, true));
        assert!(!ColorMode::Never.enabled(true, false));
        assert!(ColorMode::Auto.enabled(true, false));
        assert!(!ColorMode::Auto.enabled(false, false));
        assert!(!ColorMode::Auto.enabled(true, true));
    }

    #[test]
    fn test_load_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "color = \"never\"\n\n[render]\nsmartypants = false").unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.color, ColorMode::Never);
        assert!(!config.render.smartypants);
        assert!(config.render.gfm);
        assert!(config.render.mangle);
    }

    #[test]
    fn test_empty_config_is_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(load(Some(file.path())).unwrap(), Config::default());
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_invalid_config_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "color = \"sometimes\"").unwrap();
        let err = load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
