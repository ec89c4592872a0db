//! Tests for the write cache

use super::*;
use crate::connection::keys;
use crate::host::AuthenticationMap;
use crate::value::Value;

fn config(container: &str) -> ConnectionConfig {
    let auth: AuthenticationMap = [
        (keys::HOST, "acme.snowflakecomputing.com"),
        (keys::USERNAME, "exporter"),
        (keys::PASSWORD, "pw"),
        (keys::DATABASE_NAME, "DB"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    ConnectionConfig::from_authentication(&auth, container).unwrap()
}

fn record(id: i64) -> Record {
    Record::new().with("OriginEntityCode", format!("/Order#{}", id)).with("Id", id)
}

#[test]
fn test_new_cache_is_empty() {
    let cache = WriteCache::new();
    assert!(cache.is_empty());
    assert_eq!(cache.count(), 0);
    assert!(cache.items().is_empty());
    assert!(cache.partitions().is_empty());
}

#[test]
fn test_add_counts_across_partitions() {
    let mut cache = WriteCache::new();
    cache.add_item(record(1), config("C1"));
    cache.add_item(record(2), config("C1"));
    cache.add_item(record(3), config("C2"));

    assert_eq!(cache.count(), 3);
    assert_eq!(cache.partition_count(), 2);
    assert_eq!(cache.items().len(), 3);
}

#[test]
fn test_partition_isolation() {
    let mut cache = WriteCache::new();
    cache.add_item(record(1), config("A"));
    cache.add_item(record(2), config("B"));
    cache.add_item(record(3), config("A"));

    let a: Vec<_> = cache.records(&config("A")).iter().map(|r| r.get("Id").cloned()).collect();
    let b: Vec<_> = cache.records(&config("B")).iter().map(|r| r.get("Id").cloned()).collect();

    assert_eq!(a, vec![Some(Value::Integer(1)), Some(Value::Integer(3))]);
    assert_eq!(b, vec![Some(Value::Integer(2))]);
}

#[test]
fn test_partitions_in_first_insert_order() {
    let mut cache = WriteCache::new();
    for name in ["Zulu", "Alpha", "Mike"] {
        cache.add_item(record(1), config(name));
    }
    cache.add_item(record(2), config("Zulu"));

    let order: Vec<_> = cache
        .partitions()
        .into_iter()
        .map(|(config, records)| (config.container().to_string(), records.len()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Zulu".to_string(), 2),
            ("Alpha".to_string(), 1),
            ("Mike".to_string(), 1),
        ]
    );
}

#[test]
fn test_items_pair_records_with_config() {
    let mut cache = WriteCache::new();
    cache.add_item(record(1), config("C1"));
    cache.add_item(record(2), config("C2"));

    for (record, config) in cache.items() {
        let expected = if record.get("Id") == Some(&Value::Integer(1)) { "C1" } else { "C2" };
        assert_eq!(config.container(), expected);
    }
}

#[test]
fn test_clear_removes_only_that_partition() {
    let mut cache = WriteCache::new();
    cache.add_item(record(1), config("C1"));
    cache.add_item(record(2), config("C1"));
    cache.add_item(record(3), config("C2"));

    assert_eq!(cache.clear(&config("C1")), 2);
    assert_eq!(cache.count(), 1);
    assert!(cache.records(&config("C1")).is_empty());
    assert_eq!(cache.records(&config("C2")).len(), 1);

    assert_eq!(cache.clear(&config("C1")), 0);
    assert_eq!(cache.clear(&config("C2")), 1);
    assert!(cache.is_empty());
}

#[test]
fn test_partition_recreated_after_clear() {
    let mut cache = WriteCache::new();
    cache.add_item(record(1), config("C1"));
    cache.add_item(record(2), config("C2"));
    cache.clear(&config("C1"));
    cache.add_item(record(3), config("C1"));

    let order: Vec<_> = cache
        .partitions()
        .into_iter()
        .map(|(config, _)| config.container().to_string())
        .collect();
    assert_eq!(order, vec!["C2", "C1"]);
}

#[test]
fn test_retain_keeps_partition_position() {
    let mut cache = WriteCache::new();
    cache.add_item(record(1), config("C1"));
    cache.add_item(record(2), config("C1"));
    cache.add_item(record(3), config("C1"));
    cache.add_item(record(4), config("C2"));

    assert_eq!(cache.retain(&config("C1"), vec![record(2)]), 2);
    assert_eq!(cache.count(), 2);
    assert_eq!(cache.records(&config("C1")), &[record(2)]);

    let order: Vec<_> = cache
        .partitions()
        .into_iter()
        .map(|(config, _)| config.container().to_string())
        .collect();
    assert_eq!(order, vec!["C1", "C2"]);
}

#[test]
fn test_retain_nothing_drops_partition() {
    let mut cache = WriteCache::new();
    cache.add_item(record(1), config("C1"));

    assert_eq!(cache.retain(&config("C1"), Vec::new()), 1);
    assert!(cache.is_empty());
    assert_eq!(cache.partition_count(), 0);
    assert_eq!(cache.retain(&config("C9"), vec![record(1)]), 0);
    assert!(cache.is_empty());
}
