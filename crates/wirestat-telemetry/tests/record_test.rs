//! Behavioral tests for the per-connection record.

use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};

use wirestat_core::error::ErrorKind;
use wirestat_telemetry::{ConnectionRecord, ConnectionSnapshot};

fn opened_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// A record fully populated for throughput computations.
fn closed_record(elapsed: Duration, sent: u64, received: u64) -> ConnectionRecord {
    let record = ConnectionRecord::new();
    record.set_established(opened_at());
    record.set_closed(opened_at() + elapsed);
    record.set_bytes_sent(sent);
    record.set_bytes_received(received);
    record
}

#[test]
fn test_new_record_is_empty() {
    let record = ConnectionRecord::new();
    assert!(record.established_at().is_none());
    assert!(record.closed_at().is_none());
    assert!(record.remote_address().is_none());
    assert_eq!(record.bytes_sent(), 0);
    assert_eq!(record.bytes_received(), 0);
    assert_eq!(record.resource_count(), 0);
    assert_eq!(record.resources_as_text(), "");
}

#[test]
fn test_new_records_get_distinct_ids() {
    let a = ConnectionRecord::new();
    let b = ConnectionRecord::new();
    assert_ne!(a.id(), b.id());
}

#[test]
fn test_setters_round_trip() {
    let record = ConnectionRecord::new();
    record.set_established(opened_at());
    record.set_remote_address("203.0.113.9:51812");
    record.set_bytes_sent(1024);
    record.set_bytes_received(512);
    record.set_closed(opened_at() + Duration::seconds(3));

    assert_eq!(record.established_at(), Some(opened_at()));
    assert_eq!(record.closed_at(), Some(opened_at() + Duration::seconds(3)));
    assert_eq!(record.remote_address().as_deref(), Some("203.0.113.9:51812"));
    assert_eq!(record.bytes_sent(), 1024);
    assert_eq!(record.bytes_received(), 512);
}

#[test]
fn test_add_resource_is_idempotent() {
    let record = ConnectionRecord::new();
    record.add_resource("/index.html");
    record.add_resource("/index.html");
    record.add_resource("/index.html");
    assert_eq!(record.resource_count(), 1);
    assert!(record.visited_resources().contains("/index.html"));
    assert_eq!(record.resources_as_text(), "/index.html");
}

#[test]
fn test_empty_resource_is_ignored() {
    let record = ConnectionRecord::new();
    record.add_resource("");
    assert_eq!(record.resource_count(), 0);
    record.add_resource("/a");
    record.add_resource("");
    assert_eq!(record.resource_count(), 1);
}

#[test]
fn test_resources_as_text_joins_with_comma_space() {
    let record = ConnectionRecord::new();
    record.add_resource("a");
    record.add_resource("b");

    let text = record.resources_as_text();
    assert!(text == "a, b" || text == "b, a", "unexpected rendering: {text:?}");
    assert_eq!(text.matches(", ").count(), 1);
    assert!(!text.starts_with(", "));
    assert!(!text.ends_with(", "));
}

#[test]
fn test_throughput_over_whole_seconds() {
    let record = closed_record(Duration::seconds(2), 100, 50);
    assert_eq!(record.throughput().expect("throughput"), 75.000);
}

#[test]
fn test_throughput_preserves_subsecond_precision() {
    let record = closed_record(Duration::milliseconds(500), 60, 40);
    assert_eq!(record.throughput().expect("throughput"), 200.000);
}

#[test]
fn test_throughput_rounds_to_three_decimals() {
    // 1 byte over 3 s = 0.333... b/s
    let record = closed_record(Duration::seconds(3), 1, 0);
    assert_eq!(record.throughput().expect("throughput"), 0.333);

    // 1 byte over 16 s = 0.0625 b/s, the half case rounds up
    let record = closed_record(Duration::seconds(16), 0, 1);
    assert_eq!(record.throughput().expect("throughput"), 0.063);
}

#[test]
fn test_throughput_requires_both_timestamps() {
    let record = ConnectionRecord::new();
    let err = record.throughput().expect_err("no timestamps");
    assert_eq!(err.kind, ErrorKind::InvalidState);

    record.set_established(opened_at());
    let err = record.throughput().expect_err("still open");
    assert_eq!(err.kind, ErrorKind::InvalidState);
}

#[test]
fn test_throughput_zero_elapsed_is_invalid_state() {
    let record = closed_record(Duration::zero(), 100, 100);
    let err = record.throughput().expect_err("zero duration");
    assert_eq!(err.kind, ErrorKind::InvalidState);
}

#[test]
fn test_throughput_negative_elapsed_is_invalid_state() {
    let record = closed_record(Duration::seconds(-1), 100, 100);
    let err = record.throughput().expect_err("negative duration");
    assert_eq!(err.kind, ErrorKind::InvalidState);
}

#[test]
fn test_equality_and_hash_cover_all_fields() {
    let record = closed_record(Duration::seconds(5), 10, 20);
    record.set_remote_address("198.51.100.4:40022");
    record.add_resource("/index.html");
    record.add_resource("/style.css");

    let twin = ConnectionRecord::from_snapshot(&record.snapshot());
    assert_eq!(record, twin);
    assert_eq!(hash_of(&record), hash_of(&twin));
}

#[test]
fn test_equality_ignores_resource_insertion_order() {
    let record = closed_record(Duration::seconds(5), 10, 20);
    record.add_resource("/index.html");
    record.add_resource("/style.css");

    let mut snapshot = record.snapshot();
    snapshot.visited_resources.clear();
    let reordered = ConnectionRecord::from_snapshot(&snapshot);
    reordered.add_resource("/style.css");
    reordered.add_resource("/index.html");

    assert_eq!(record, reordered);
    assert_eq!(hash_of(&record), hash_of(&reordered));
}

#[test]
fn test_single_field_change_breaks_equality() {
    let record = closed_record(Duration::seconds(5), 10, 20);
    let twin = ConnectionRecord::from_snapshot(&record.snapshot());
    twin.set_bytes_sent(11);
    assert_ne!(record, twin);

    let twin = ConnectionRecord::from_snapshot(&record.snapshot());
    twin.set_remote_address("192.0.2.1:9");
    assert_ne!(record, twin);

    let twin = ConnectionRecord::from_snapshot(&record.snapshot());
    twin.add_resource("/extra");
    assert_ne!(record, twin);
}

#[test]
fn test_snapshot_serde_round_trip() {
    let record = closed_record(Duration::seconds(2), 100, 50);
    record.set_remote_address("203.0.113.9:51812");
    record.add_resource("/index.html");

    let snapshot = record.snapshot();
    let json = serde_json::to_string(&snapshot).expect("serialize");
    let parsed: ConnectionSnapshot = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(snapshot, parsed);
    assert_eq!(record, ConnectionRecord::from_snapshot(&parsed));
}

#[test]
fn test_concurrent_construction_yields_unique_ids() {
    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(|| (0..100).map(|_| ConnectionRecord::new().id()).collect::<Vec<_>>()))
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().expect("constructor thread panicked") {
            assert!(seen.insert(id), "duplicate id {id}");
        }
    }
    assert_eq!(seen.len(), 8 * 100);
}

#[test]
fn test_concurrent_distinct_adds_are_not_lost() {
    let record = ConnectionRecord::new();

    thread::scope(|s| {
        for t in 0..8 {
            let record = &record;
            s.spawn(move || {
                for i in 0..50 {
                    record.add_resource(&format!("/worker/{t}/item/{i}"));
                }
            });
        }
    });

    assert_eq!(record.resource_count(), 8 * 50);
}

#[test]
fn test_concurrent_duplicate_adds_collapse_to_one() {
    let record = ConnectionRecord::new();

    thread::scope(|s| {
        for _ in 0..8 {
            let record = &record;
            s.spawn(move || {
                for _ in 0..100 {
                    record.add_resource("/shared");
                }
            });
        }
    });

    assert_eq!(record.resource_count(), 1);
}

#[test]
fn test_readers_never_observe_torn_values() {
    let record = ConnectionRecord::new();
    record.set_established(opened_at());

    thread::scope(|s| {
        let writer = &record;
        s.spawn(move || {
            for i in 0..1_000 {
                let value = if i % 2 == 0 { 7 } else { 7_000_000 };
                writer.set_bytes_sent(value);
                writer.add_resource(&format!("/burst/{i}"));
            }
        });

        for _ in 0..4 {
            let reader = &record;
            s.spawn(move || {
                for _ in 0..1_000 {
                    let sent = reader.bytes_sent();
                    assert!(
                        sent == 0 || sent == 7 || sent == 7_000_000,
                        "torn read: {sent}"
                    );
                    // Composite reads stay internally consistent mid-write.
                    let snapshot = reader.snapshot();
                    assert_eq!(snapshot.established_at, Some(opened_at()));
                    let _ = reader.resources_as_text();
                }
            });
        }
    });
}
