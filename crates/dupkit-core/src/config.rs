use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/dupkit/config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub engine: Engine,
    pub paths: Paths,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Engine {
    pub binary: PathBuf,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("duplicacy"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Paths {
    pub repository: PathBuf,
    pub guess_root: PathBuf,
    pub settings: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            repository: PathBuf::from("/"),
            guess_root: PathBuf::from("/mnt/root"),
            settings: PathBuf::from("/etc/dupkit/settings"),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config: {}", path.as_ref().display()))?;
        let cfg = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.as_ref().display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH),
            None => {
                tracing::debug!("no config at {DEFAULT_CONFIG_PATH}, using defaults");
                Ok(Self::default())
            }
        }
    }
}
