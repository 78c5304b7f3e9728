use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    InPlace(PathBuf),
    Directory(PathBuf),
}

impl Destination {
    pub fn path(&self) -> &Path {
        match self {
            Self::InPlace(path) | Self::Directory(path) => path,
        }
    }

    pub fn is_in_place(&self) -> bool {
        matches!(self, Self::InPlace(_))
    }

    /// Creates a missing directory and returns its canonical form.
    pub fn create(self) -> Result<Self> {
        if self.is_in_place() {
            return Ok(self);
        }
        let dest = self.path().to_path_buf();
        fs::create_dir_all(&dest)
            .map_err(|err| Error::io("failed to create destination", &dest, err))?;
        let dest = fs::canonicalize(&dest)
            .map_err(|err| Error::io("failed to resolve destination", &dest, err))?;
        Ok(Self::Directory(dest))
    }
}

/// Checks `--dest` without writing anything. An existing directory must be
/// empty; the check is not repeated before the engine runs.
pub fn prepare_destination(dest: Option<&str>, repository: &Path) -> Result<Destination> {
    let dest = match dest {
        None | Some("") => return Ok(Destination::InPlace(repository.to_path_buf())),
        Some(dest) => PathBuf::from(dest),
    };

    if dest.exists() {
        if !dest.is_dir() {
            return Err(Error::invalid(format!(
                "destination {} exists and is not a directory",
                dest.display()
            )));
        }
        let mut entries = fs::read_dir(&dest)
            .map_err(|err| Error::io("failed to read destination", &dest, err))?;
        if entries.next().is_some() {
            return Err(Error::invalid(format!(
                "destination {} is not empty",
                dest.display()
            )));
        }
    }
    Ok(Destination::Directory(dest))
}
