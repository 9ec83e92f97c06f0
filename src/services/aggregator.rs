//! Aggregator service folding events into per-bucket counts

use crate::types::{AccumulationMode, BucketCount, BucketKey, Identity, Result, TrendsError};
use std::collections::{HashMap, HashSet};

/// Per-run aggregation table.
///
/// Count mode increments a counter per bucket; unique mode collects
/// identities per bucket and reports set sizes.
#[derive(Debug)]
pub struct Aggregator {
    mode: AccumulationMode,
    counts: HashMap<BucketKey, u64>,
    identities: HashMap<BucketKey, HashSet<Identity>>,
}

impl Aggregator {
    pub fn new(mode: AccumulationMode) -> Self {
        Self {
            mode,
            counts: HashMap::new(),
            identities: HashMap::new(),
        }
    }

    pub fn mode(&self) -> AccumulationMode {
        self.mode
    }

    /// Record one event in `key`.
    ///
    /// In unique mode an event without identity is rejected with
    /// `MissingIdentity` and leaves the table unchanged.
    pub fn add(&mut self, key: BucketKey, identity: Option<Identity>) -> Result<()> {
        match self.mode {
            AccumulationMode::Count => {
                let count = self.counts.entry(key).or_insert(0);
                *count = count.saturating_add(1);
            }
            AccumulationMode::Unique => {
                let identity = identity.ok_or(TrendsError::MissingIdentity)?;
                self.identities.entry(key).or_default().insert(identity);
            }
        }
        Ok(())
    }

    /// Number of buckets populated so far
    pub fn len(&self) -> usize {
        match self.mode {
            AccumulationMode::Count => self.counts.len(),
            AccumulationMode::Unique => self.identities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows sorted ascending by bucket key
    pub fn finalize(self) -> Vec<BucketCount> {
        let mut result: Vec<BucketCount> = match self.mode {
            AccumulationMode::Count => self
                .counts
                .into_iter()
                .map(|(time, count)| BucketCount { time, count })
                .collect(),
            AccumulationMode::Unique => self
                .identities
                .into_iter()
                .map(|(time, set)| BucketCount {
                    time,
                    count: set.len() as u64,
                })
                .collect(),
        };
        result.sort_by_key(|row| row.time);
        result
    }
}
