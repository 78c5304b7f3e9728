use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

pub const BANDWIDTH_LIMIT: &str = "BANDWIDTH_LIMIT";
pub const DISABLE_MAINTENANCE: &str = "DISABLE_MAINTENANCE";

/// Operator toggles read from the shell-style `KEY=VALUE` settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Upload cap in megabits per second; `None` means unlimited.
    pub bandwidth_limit_mbps: Option<u32>,
    pub disable_maintenance: bool,
}

impl Settings {
    /// A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let file = File::open(path).map_err(|err| Error::io("failed to open settings", path, err))?;
        Self::from_reader(file).map_err(|err| match err {
            Error::InvalidInput(message) => {
                Error::invalid(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'=')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut settings = Self::default();
        for result in reader.records() {
            let record =
                result.map_err(|err| Error::invalid(format!("unreadable settings line: {err}")))?;
            let key = record.get(0).unwrap_or_default();
            let key = key.strip_prefix("export ").unwrap_or(key).trim();
            if key.is_empty() || key.starts_with('#') {
                continue;
            }
            let value = record.iter().skip(1).collect::<Vec<_>>().join("=");
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');

            match key.to_ascii_uppercase().as_str() {
                BANDWIDTH_LIMIT => settings.bandwidth_limit_mbps = parse_bandwidth(value)?,
                DISABLE_MAINTENANCE => settings.disable_maintenance = parse_flag(key, value)?,
                _ => debug!("ignoring unrecognized setting {key}"),
            }
        }
        Ok(settings)
    }

    /// Bandwidth cap in the engine's kilobytes-per-second units.
    pub fn limit_rate_kbps(&self) -> Option<u64> {
        self.bandwidth_limit_mbps.map(|mbps| u64::from(mbps) * 1000 / 8)
    }
}

fn parse_bandwidth(value: &str) -> Result<Option<u32>> {
    if value.is_empty() {
        return Ok(None);
    }
    let mbps: u32 = value.parse().map_err(|_| {
        Error::invalid(format!(
            "{BANDWIDTH_LIMIT} must be a whole number of Mbit/s, got '{value}'"
        ))
    })?;
    Ok((mbps > 0).then_some(mbps))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::invalid(format!("{key} must be a boolean, got '{value}'"))),
    }
}
