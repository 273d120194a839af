use super::*;
use serde_json::json;

use crate::error::AppError;

fn obj(v: serde_json::Value) -> JsonMap {
    v.as_object().cloned().unwrap()
}

#[test]
fn mem_medium_round_trip() {
    let m = MemMedium::default();
    assert_eq!(m.get("k").unwrap(), None);
    m.set("k", "v").unwrap();
    assert_eq!(m.get("k").unwrap().as_deref(), Some("v"));
    m.remove("k").unwrap();
    assert_eq!(m.get("k").unwrap(), None);
    // removing an absent key is fine
    m.remove("k").unwrap();
}

#[test]
fn dir_medium_round_trip_and_sanitized_names() {
    let tmp = tempfile::tempdir().unwrap();
    let m = DirMedium::new(tmp.path()).unwrap();
    m.set("a/b c", "[1,2]").unwrap();
    assert_eq!(m.get("a/b c").unwrap().as_deref(), Some("[1,2]"));
    assert!(tmp.path().join("a_b_c.json").exists());
    m.remove("a/b c").unwrap();
    assert_eq!(m.get("a/b c").unwrap(), None);
}

#[test]
fn raw_add_generates_id_and_timestamps() {
    let store = Store::open_in_memory().unwrap();
    let row = store.add_raw("extras", obj(json!({"label": "x"}))).unwrap();
    let id = row.get("_id").and_then(|v| v.as_str()).unwrap();
    assert!(!id.is_empty());
    assert!(row.get("createdAt").and_then(|v| v.as_str()).is_some());
    assert!(row.get("updatedAt").and_then(|v| v.as_str()).is_some());
    // caller-supplied _id and createdAt are honored at creation
    let row2 = store
        .add_raw("extras", obj(json!({"_id": "fixed", "createdAt": "2020-01-01T00:00:00Z"})))
        .unwrap();
    assert_eq!(row2.get("_id").and_then(|v| v.as_str()), Some("fixed"));
    assert_eq!(
        row2.get("createdAt").and_then(|v| v.as_str()),
        Some("2020-01-01T00:00:00Z")
    );
}

#[test]
fn merge_patch_skips_identity_fields() {
    let mut row = obj(json!({"_id": "a", "createdAt": "2020-01-01T00:00:00Z", "n": 1}));
    super::collections::merge_patch(
        &mut row,
        obj(json!({"_id": "b", "createdAt": "2021-01-01T00:00:00Z", "n": 2, "m": 3})),
    );
    assert_eq!(row.get("_id").and_then(|v| v.as_str()), Some("a"));
    assert_eq!(
        row.get("createdAt").and_then(|v| v.as_str()),
        Some("2020-01-01T00:00:00Z")
    );
    assert_eq!(row.get("n"), Some(&json!(2)));
    assert_eq!(row.get("m"), Some(&json!(3)));
}

#[test]
fn updated_at_never_precedes_created_at() {
    use chrono::{DateTime, Utc};
    // a record stamped with a far-future createdAt clamps updatedAt to it
    let mut row = obj(json!({"createdAt": "2999-01-01T00:00:00Z"}));
    super::collections::stamp_updated_at(&mut row).unwrap();
    let updated: DateTime<Utc> = row
        .get("updatedAt")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap();
    let created = DateTime::parse_from_rfc3339("2999-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
    assert_eq!(updated, created);
}

#[test]
fn list_of_absent_collection_is_empty() {
    let store = Store::open_in_memory().unwrap();
    assert!(store.list_raw("extras").unwrap().is_empty());
}

#[test]
fn corrupt_slot_is_a_fault_not_a_silent_reset() {
    let store = Store::open_in_memory().unwrap();
    store.medium().set(Product::KEY, "definitely not json").unwrap();
    store.close(); // drop the decoded cache so the bad slot is re-read
    let err = store.list::<Product>().unwrap_err();
    assert!(matches!(err, AppError::Corrupt { .. }));
}

#[test]
fn cache_serves_reads_until_closed() {
    let store = Store::open_in_memory().unwrap();
    let before = store.list::<Product>().unwrap().len();
    // An out-of-band medium write is invisible while the cache holds the slot
    store.medium().set(Product::KEY, "[]").unwrap();
    assert_eq!(store.list::<Product>().unwrap().len(), before);
    store.close();
    assert_eq!(store.list::<Product>().unwrap().len(), 0);
}
