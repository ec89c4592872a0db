//! Write cache
//!
//! Pending records partitioned by destination. The cache itself is not
//! synchronized; the connector owns it behind a single mutex, so every
//! method here runs under that lock.

use std::collections::HashMap;

use crate::connection::ConnectionConfig;
use crate::value::Record;

#[derive(Debug)]
struct Partition {
    /// First-insert order, used to flush partitions deterministically
    seq: u64,
    records: Vec<Record>,
}

/// Keyed accumulator of records awaiting flush
#[derive(Debug, Default)]
pub struct WriteCache {
    partitions: HashMap<ConnectionConfig, Partition>,
    next_seq: u64,
    count: usize,
}

impl WriteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the partition for `config`, creating it if needed
    pub fn add_item(&mut self, record: Record, config: ConnectionConfig) {
        let next_seq = &mut self.next_seq;
        let partition = self.partitions.entry(config).or_insert_with(|| {
            let seq = *next_seq;
            *next_seq += 1;
            Partition {
                seq,
                records: Vec::new(),
            }
        });
        partition.records.push(record);
        self.count += 1;
    }

    /// Total buffered records across all partitions
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of distinct destinations with buffered records
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Snapshot of every buffered (record, config) pair, partition by
    /// partition in first-insert order
    pub fn items(&self) -> Vec<(Record, ConnectionConfig)> {
        self.ordered()
            .flat_map(|(config, partition)| {
                partition
                    .records
                    .iter()
                    .map(move |record| (record.clone(), config.clone()))
            })
            .collect()
    }

    /// Snapshot of every partition in first-insert order
    pub fn partitions(&self) -> Vec<(ConnectionConfig, Vec<Record>)> {
        self.ordered()
            .map(|(config, partition)| (config.clone(), partition.records.clone()))
            .collect()
    }

    /// Buffered records for one destination
    pub fn records(&self, config: &ConnectionConfig) -> &[Record] {
        self.partitions
            .get(config)
            .map(|p| p.records.as_slice())
            .unwrap_or_default()
    }

    /// Keep only `records` in the partition for `config`, returning how many
    /// records were removed.
    ///
    /// The partition keeps its flush position. An empty `records` drops it.
    pub fn retain(&mut self, config: &ConnectionConfig, records: Vec<Record>) -> usize {
        if records.is_empty() {
            return self.clear(config);
        }
        match self.partitions.get_mut(config) {
            Some(partition) => {
                let removed = partition.records.len().saturating_sub(records.len());
                self.count = self.count - partition.records.len() + records.len();
                partition.records = records;
                removed
            }
            None => 0,
        }
    }

    /// Drop the partition for `config`, returning how many records it held
    pub fn clear(&mut self, config: &ConnectionConfig) -> usize {
        match self.partitions.remove(config) {
            Some(partition) => {
                let removed = partition.records.len();
                self.count -= removed;
                removed
            }
            None => 0,
        }
    }

    fn ordered(&self) -> impl Iterator<Item = (&ConnectionConfig, &Partition)> {
        let mut entries: Vec<_> = self.partitions.iter().collect();
        entries.sort_by_key(|(_, partition)| partition.seq);
        entries.into_iter()
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;
