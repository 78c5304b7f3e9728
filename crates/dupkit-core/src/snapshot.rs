use crate::timestamp::SnapshotTime;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub revision: u32,
    pub timestamp: SnapshotTime,
}

#[derive(Debug, Clone)]
pub struct SnapshotIndex {
    pub storage: String,
    pub snapshots: Vec<Snapshot>,
}

impl SnapshotIndex {
    pub fn new(storage: impl Into<String>, snapshots: Vec<Snapshot>) -> Self {
        Self {
            storage: storage.into(),
            snapshots,
        }
    }

    // Snapshot <id> revision <n> created at YYYY-MM-DD HH:MM ...
    pub fn from_listing(storage: impl Into<String>, output: &str) -> Self {
        let snapshots = output
            .lines()
            .filter(|line| line.trim_start().starts_with("Snapshot "))
            .filter_map(|line| {
                let parsed = parse_listing_line(line);
                if parsed.is_none() {
                    warn!("skipping unrecognized snapshot line: {line}");
                }
                parsed
            })
            .collect();
        Self::new(storage, snapshots)
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn timeline(&self) -> Vec<&SnapshotTime> {
        let mut times: Vec<&SnapshotTime> = self.snapshots.iter().map(|s| &s.timestamp).collect();
        times.sort();
        times
    }
}

fn parse_listing_line(line: &str) -> Option<Snapshot> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["Snapshot", _id, "revision", revision, "created", "at", date, clock, ..] => {
            let revision = revision.parse().ok()?;
            let timestamp = SnapshotTime::from_listing(date, clock).ok()?;
            Some(Snapshot {
                revision,
                timestamp,
            })
        }
        _ => None,
    }
}
