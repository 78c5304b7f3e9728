use dupkit_core::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StoragePreference {
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub storage: String,
}

pub fn read_preferences(preferences_dir: &Path) -> Result<Vec<StoragePreference>> {
    let path = preferences_dir.join("preferences");
    let contents = fs::read_to_string(&path)
        .map_err(|err| Error::io("failed to read preferences", &path, err))?;
    serde_json::from_str(&contents)
        .map_err(|err| Error::invalid(format!("malformed preferences {}: {err}", path.display())))
}
