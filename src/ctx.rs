use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::util;

/// Environment variable that points at a template library directly.
pub const TEMPLATES_ENV: &str = "PROMPT_FIELDS_TEMPLATES";

/// Immutable bag of paths used throughout the app.
/// Constructed once at startup; never mutated after that.
#[derive(Clone, Debug)]
pub struct Ctx {
    pub config_file: PathBuf,
    pub templates_dir: PathBuf,
}

/// `config.toml`; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Config {
    /// Relative paths are resolved against the config directory.
    templates_dir: Option<PathBuf>,
}

impl Ctx {
    /// Construct paths from environment variables and `config.toml`.
    pub fn new() -> Result<Self> {
        let home = std::env::var("HOME").context("$HOME is not set")?;

        let xdg = std::env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("{home}/.config"));

        let templates_override = std::env::var_os(TEMPLATES_ENV)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Self::with_config_dir(PathBuf::from(xdg).join("prompt-fields"), templates_override)
    }

    fn with_config_dir(config_dir: PathBuf, templates_override: Option<PathBuf>) -> Result<Self> {
        let config_file = config_dir.join("config.toml");
        let config: Config = match util::read_optional(&config_file)? {
            Some(src) => toml::from_str(&src)
                .with_context(|| format!("parse {}", config_file.display()))?,
            None => Config::default(),
        };

        let templates_dir = templates_override
            .or_else(|| config.templates_dir.map(|p| absolutize(&config_dir, p)))
            .unwrap_or_else(|| config_dir.join("templates"));

        Ok(Self {
            config_file,
            templates_dir,
        })
    }
}

fn absolutize(base: &Path, p: PathBuf) -> PathBuf {
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Ctx::with_config_dir(dir.path().to_path_buf(), None).unwrap();
        assert_eq!(ctx.config_file, dir.path().join("config.toml"));
        assert_eq!(ctx.templates_dir, dir.path().join("templates"));
    }

    #[test]
    fn config_file_sets_relative_templates_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "templates_dir = \"library\"\n").unwrap();
        let ctx = Ctx::with_config_dir(dir.path().to_path_buf(), None).unwrap();
        assert_eq!(ctx.templates_dir, dir.path().join("library"));
    }

    #[test]
    fn override_beats_config_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "templates_dir = \"/srv/tpl\"\n").unwrap();
        let ctx =
            Ctx::with_config_dir(dir.path().to_path_buf(), Some(PathBuf::from("/tmp/other")))
                .unwrap();
        assert_eq!(ctx.templates_dir, PathBuf::from("/tmp/other"));
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "theme = \"dark\"\n").unwrap();
        assert!(Ctx::with_config_dir(dir.path().to_path_buf(), None).is_err());
    }
}
