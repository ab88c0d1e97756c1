//! Last-write-wins conflict resolution.

use waypoint_common::Record;

/// Pick the winning version of a record.
///
/// If there is no remote version the local snapshot wins by default.
/// Otherwise the version with the strictly later `updated_at` wins;
/// equal timestamps resolve to the local version. That tie-break is a
/// deliberate, documented choice: the device the user just touched
/// keeps its edit.
///
/// Pure and synchronous; the caller does all I/O.
pub fn resolve(local: Record, remote: Option<Record>) -> Record {
    match remote {
        None => local,
        Some(remote) if remote.updated_at > local.updated_at => remote,
        Some(_) => local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use serde_json::json;

    fn record_at(id: &str, updated_at: DateTime<Utc>) -> Record {
        Record::new(id, updated_at, json!({"id": id})).unwrap()
    }

    #[test]
    fn test_missing_remote_keeps_local() {
        let local = record_at("t-1", Utc::now());
        let winner = resolve(local.clone(), None);
        assert_eq!(winner, local);
    }

    #[test]
    fn test_later_remote_wins() {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let local = record_at("t-1", base);
        let remote = record_at("t-1", base + chrono::Duration::seconds(1));

        let winner = resolve(local, Some(remote.clone()));
        assert_eq!(winner, remote);
    }

    #[test]
    fn test_later_local_wins() {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let local = record_at("t-1", base + chrono::Duration::seconds(1));
        let remote = record_at("t-1", base);

        let winner = resolve(local.clone(), Some(remote));
        assert_eq!(winner, local);
    }

    #[test]
    fn test_tie_resolves_to_local() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let local = Record::new("t-1", at, json!({"side": "local"})).unwrap();
        let remote = Record::new("t-1", at, json!({"side": "remote"})).unwrap();

        let winner = resolve(local.clone(), Some(remote));
        assert_eq!(winner.data, local.data);
    }

    proptest! {
        #[test]
        fn prop_strictly_later_timestamp_wins(local_ms in 0i64..=4_102_444_800_000, remote_ms in 0i64..=4_102_444_800_000) {
            let local = record_at("t-1", Utc.timestamp_millis_opt(local_ms).unwrap());
            let remote = record_at("t-1", Utc.timestamp_millis_opt(remote_ms).unwrap());

            let winner = resolve(local.clone(), Some(remote.clone()));
            if remote_ms > local_ms {
                prop_assert_eq!(winner.updated_at, remote.updated_at);
            } else {
                // Later local, or a tie: local wins
                prop_assert_eq!(winner.updated_at, local.updated_at);
                prop_assert_eq!(winner.data, local.data);
            }
        }
    }
}
