use crate::error::{Error, Result};
use crate::snapshot::{Snapshot, SnapshotIndex};
use crate::timestamp::SnapshotTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Marker {
    Before,
    AtOrAfter,
}

/// Latest snapshot at or before `desired`. Equal timestamps keep listing
/// order, so the later-listed snapshot wins.
pub fn resolve_point_in_time<'a>(
    index: &'a SnapshotIndex,
    desired: &SnapshotTime,
) -> Result<&'a Snapshot> {
    let mut entries: Vec<(&str, Marker, Option<&Snapshot>)> = index
        .snapshots
        .iter()
        .map(|snapshot| (snapshot.timestamp.as_str(), Marker::Before, Some(snapshot)))
        .collect();
    entries.push((desired.as_str(), Marker::AtOrAfter, None));
    entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    let selected = entries
        .iter()
        .position(|entry| entry.2.is_none())
        .and_then(|pos| pos.checked_sub(1))
        .and_then(|prev| entries[prev].2);

    selected.ok_or_else(|| Error::NoSnapshotAvailable {
        time: desired.to_string(),
        storage: index.storage.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(entries: &[(u32, &str)]) -> SnapshotIndex {
        let snapshots = entries
            .iter()
            .map(|(revision, ts)| Snapshot {
                revision: *revision,
                timestamp: SnapshotTime::parse(ts).unwrap(),
            })
            .collect();
        SnapshotIndex::new("default", snapshots)
    }

    fn at(ts: &str) -> SnapshotTime {
        SnapshotTime::parse(ts).unwrap()
    }

    fn yearly() -> SnapshotIndex {
        index(&[
            (1, "2018-01-01T00:00"),
            (2, "2018-06-01T00:00"),
            (3, "2018-12-01T00:00"),
        ])
    }

    #[test]
    fn exact_match_is_inclusive() {
        let idx = yearly();
        let snap = resolve_point_in_time(&idx, &at("2018-06-01T00:00")).unwrap();
        assert_eq!(snap.revision, 2);
    }

    #[test]
    fn later_time_selects_latest_snapshot() {
        let idx = yearly();
        let snap = resolve_point_in_time(&idx, &at("2019-01-01T00:00")).unwrap();
        assert_eq!(snap.revision, 3);
    }

    #[test]
    fn between_snapshots_selects_the_earlier() {
        let idx = yearly();
        let snap = resolve_point_in_time(&idx, &at("2018-11-30T23:59")).unwrap();
        assert_eq!(snap.revision, 2);
    }

    #[test]
    fn time_before_first_snapshot_has_no_candidate() {
        let idx = yearly();
        let err = resolve_point_in_time(&idx, &at("2017-12-31T23:59")).unwrap_err();
        match err {
            Error::NoSnapshotAvailable { time, storage } => {
                assert_eq!(time, "2017-12-31T23:59");
                assert_eq!(storage, "default");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_index_has_no_candidate() {
        let idx = index(&[]);
        let err = resolve_point_in_time(&idx, &at("2020-01-01T00:00")).unwrap_err();
        assert!(matches!(err, Error::NoSnapshotAvailable { .. }));
    }

    #[test]
    fn identical_timestamps_prefer_later_listing() {
        let idx = index(&[(4, "2020-01-01T00:00"), (5, "2020-01-01T00:00")]);
        let snap = resolve_point_in_time(&idx, &at("2020-01-01T00:00")).unwrap();
        assert_eq!(snap.revision, 5);
    }

    #[test]
    fn listing_order_need_not_be_chronological() {
        let idx = index(&[
            (1, "2018-06-01T00:00"),
            (2, "2018-01-01T00:00"),
            (3, "2018-12-01T00:00"),
        ]);
        let snap = resolve_point_in_time(&idx, &at("2018-03-01T00:00")).unwrap();
        assert_eq!(snap.revision, 2);
    }

    #[test]
    fn no_snapshot_lies_between_selection_and_desired_time() {
        let idx = index(&[
            (1, "2018-01-01T00:00"),
            (2, "2018-01-01T06:30"),
            (3, "2018-01-02T00:00"),
            (4, "2018-03-15T12:00"),
            (5, "2018-03-15T12:01"),
        ]);
        for desired in [
            "2018-01-01T00:00",
            "2018-01-01T06:29",
            "2018-01-01T06:30",
            "2018-02-01T00:00",
            "2018-03-15T12:00",
            "2030-01-01T00:00",
        ] {
            let t = at(desired);
            let selected = resolve_point_in_time(&idx, &t).unwrap();
            assert!(selected.timestamp <= t);
            assert!(
                idx.snapshots
                    .iter()
                    .all(|s| !(s.timestamp > selected.timestamp && s.timestamp <= t)),
                "a closer snapshot exists for {desired}"
            );
        }
    }
}
