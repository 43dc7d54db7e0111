//! LoadAccountant: per-bucket element counts kept beside the bucket array.
//!
//! `records[..filled]` is a compacted list with one record per non-empty
//! bucket; `index_of[bucket]` locates a bucket's record. Both vectors are as
//! long as the bucket array. An empty bucket's `index_of` entry is the bucket
//! count, which is never a record position, so `put`, `remove` and lookups run
//! in O(1) without walking chains.

use core::ops::Index;

/// Element count of one non-empty bucket.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LoadRecord {
    pub index: usize,
    pub length: usize,
}

#[derive(Clone, Debug, Default)]
pub struct LoadAccountant {
    records: Vec<LoadRecord>,
    index_of: Vec<usize>,
    filled: usize,
    total: usize,
}

impl LoadAccountant {
    /// Accountant for `bucket_count` empty buckets.
    pub fn new(bucket_count: usize) -> Self {
        Self {
            records: vec![LoadRecord::default(); bucket_count],
            index_of: vec![bucket_count; bucket_count],
            filled: 0,
            total: 0,
        }
    }

    /// Sentinel `index_of` entry of an empty bucket.
    #[inline]
    fn empty(&self) -> usize {
        self.index_of.len()
    }

    #[inline]
    fn position(&self, bucket: usize) -> Option<usize> {
        let pos = self.index_of[bucket];
        (pos < self.filled && self.records[pos].index == bucket).then_some(pos)
    }

    /// Count one more element in `bucket`.
    pub fn put(&mut self, bucket: usize) {
        match self.position(bucket) {
            Some(pos) => self.records[pos].length += 1,
            None => {
                let pos = self.filled;
                self.records[pos] = LoadRecord {
                    index: bucket,
                    length: 1,
                };
                self.index_of[bucket] = pos;
                self.filled += 1;
            }
        }
        self.total += 1;
    }

    /// Count one element fewer in `bucket`. Panics if the bucket is empty.
    pub fn remove(&mut self, bucket: usize) {
        let pos = match self.position(bucket) {
            Some(pos) => pos,
            None => panic!("remove from empty bucket {bucket}"),
        };
        self.records[pos].length -= 1;
        if self.records[pos].length == 0 {
            let last = self.filled - 1;
            self.records.swap(pos, last);
            let moved = self.records[pos].index;
            self.index_of[moved] = pos;
            self.records[last] = LoadRecord::default();
            self.filled = last;
            self.index_of[bucket] = self.empty();
        }
        self.total -= 1;
    }

    /// Element count of `bucket`.
    #[inline]
    pub fn get(&self, bucket: usize) -> usize {
        self.position(bucket)
            .map_or(0, |pos| self.records[pos].length)
    }

    /// Records of the non-empty buckets, in creation order up to compaction.
    #[inline]
    pub fn records(&self) -> &[LoadRecord] {
        &self.records[..self.filled]
    }

    #[inline]
    pub fn num_filled_buckets(&self) -> usize {
        self.filled
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.total
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.index_of.len()
    }

    /// Mean elements per bucket.
    pub fn load(&self) -> f64 {
        match self.bucket_count() {
            0 => 0.0,
            n => self.total as f64 / n as f64,
        }
    }

    /// Longest chain length. Scans every filled record.
    pub fn max_load(&self) -> usize {
        self.records()
            .iter()
            .map(|r| r.length)
            .max()
            .unwrap_or(0)
    }

    /// Forget every element, keeping the bucket count.
    pub fn clear(&mut self) {
        for record in &mut self.records[..self.filled] {
            *record = LoadRecord::default();
        }
        self.filled = 0;
        self.total = 0;
        let empty = self.empty();
        self.index_of.fill(empty);
    }

    /// Forget every element and switch to `bucket_count` buckets.
    pub fn clear_and_resize(&mut self, bucket_count: usize) {
        self.records.resize(bucket_count, LoadRecord::default());
        self.index_of.resize(bucket_count, bucket_count);
        self.filled = self.filled.min(bucket_count);
        self.clear();
    }

    /// Check the structural invariants. Used by tests and table consistency
    /// checks.
    pub fn is_consistent(&self) -> bool {
        let n = self.bucket_count();
        if self.records.len() != n || self.filled > n || self.filled > self.total {
            return false;
        }
        if (self.total == 0) != (self.filled == 0) {
            return false;
        }
        let mut sum = 0;
        for (pos, r) in self.records().iter().enumerate() {
            if r.length == 0 || r.index >= n || self.index_of[r.index] != pos {
                return false;
            }
            sum += r.length;
        }
        let empty = self.empty();
        sum == self.total
            && self.index_of.iter().enumerate().all(|(b, &pos)| {
                if pos == empty {
                    true
                } else {
                    pos < self.filled && self.records[pos].index == b
                }
            })
    }
}

impl Index<usize> for LoadAccountant {
    type Output = usize;

    /// Element count of `bucket`.
    fn index(&self, bucket: usize) -> &usize {
        match self.position(bucket) {
            Some(pos) => &self.records[pos].length,
            None => &0,
        }
    }
}
