use dupkit_core::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const MARKER_NAME: &str = ".duplicacy";

// Points the engine at the real preferences so the destination acts as the
// repository root. Removed on drop.
#[derive(Debug)]
pub struct ConfigMarker {
    path: PathBuf,
}

impl ConfigMarker {
    pub fn write(dir: &Path, preferences_dir: &Path) -> Result<Self> {
        let path = dir.join(MARKER_NAME);
        fs::write(&path, format!("{}\n", preferences_dir.display()))
            .map_err(|err| Error::io("failed to write config marker", &path, err))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ConfigMarker {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                warn!("failed to remove {}: {err}", self.path.display());
            }
        }
    }
}
