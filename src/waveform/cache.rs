// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Bounded-memory waveform envelope cache.
//!
//! Reduces a PCM signal of any length to at most `budget / 4` buckets of
//! (min, max) sample pairs: 2 bytes of min plus 2 bytes of max per bucket.
//! The downsampling ratio is fixed when the cache is built and the memory
//! footprint depends only on the budget, never on the signal length. Queries
//! reduce bucket sub-ranges to one pair per display column at any zoom.

use std::path::Path;

use hound::WavReader;
use thiserror::Error;
use tracing::{debug, warn};

/// Bytes of cache memory per bucket: an i16 min and an i16 max.
const BUCKET_BYTES: usize = 4;

/// Errors from building a cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("WAV file contains no audio")]
    Empty,

    #[error("unable to read WAV file: {0}")]
    Format(#[from] hound::Error),
}

/// A min/max envelope of a PCM signal.
///
/// Built either by a full scan of a finished file, after which it is
/// immutable, or incrementally in live mode, where it is append-only up to a
/// fixed capacity.
pub struct WaveformCache {
    min: Vec<i16>,
    max: Vec<i16>,
    capacity: usize,
    total_samples: usize,
    samples_per_bucket: usize,
    dropped_blocks: u64,
}

impl WaveformCache {
    /// Scans a WAV file into an envelope that fits in `memory_budget_bytes`.
    ///
    /// One sequential pass; O(total samples) time, O(bucket count) memory.
    /// Fails on zero-length or unreadable input.
    pub fn load_from_file(path: &Path, memory_budget_bytes: usize) -> Result<Self, CacheError> {
        let mut reader = WavReader::open(path)?;
        let total_samples = reader.len() as usize;
        if total_samples == 0 {
            warn!(path = %path.display(), "Refusing to cache empty WAV file.");
            return Err(CacheError::Empty);
        }

        let max_buckets = (memory_budget_bytes / BUCKET_BYTES).max(1);
        let (bucket_count, samples_per_bucket) = if total_samples <= max_buckets {
            (total_samples, 1)
        } else {
            (max_buckets, total_samples.div_ceil(max_buckets))
        };

        let mut min = Vec::with_capacity(bucket_count);
        let mut max = Vec::with_capacity(bucket_count);
        let mut bucket_min = i16::MAX;
        let mut bucket_max = i16::MIN;
        let mut in_bucket = 0usize;

        for sample in reader.samples::<i16>() {
            let sample = sample?;
            bucket_min = bucket_min.min(sample);
            bucket_max = bucket_max.max(sample);
            in_bucket += 1;
            if in_bucket == samples_per_bucket {
                min.push(bucket_min);
                max.push(bucket_max);
                bucket_min = i16::MAX;
                bucket_max = i16::MIN;
                in_bucket = 0;
            }
        }
        if in_bucket > 0 {
            min.push(bucket_min);
            max.push(bucket_max);
        }

        debug!(
            path = %path.display(),
            total_samples,
            buckets = min.len(),
            ratio = samples_per_bucket,
            "Waveform cached."
        );

        let capacity = min.len();
        Ok(WaveformCache {
            min,
            max,
            capacity,
            total_samples,
            samples_per_bucket,
            dropped_blocks: 0,
        })
    }

    /// Creates an empty live-mode cache holding at most `capacity_buckets`
    /// buckets, one per appended hardware block.
    pub fn live(capacity_buckets: usize) -> Self {
        let capacity = capacity_buckets.max(1);
        WaveformCache {
            min: Vec::with_capacity(capacity),
            max: Vec::with_capacity(capacity),
            capacity,
            total_samples: 0,
            samples_per_bucket: 0,
            dropped_blocks: 0,
        }
    }

    /// Appends one block of decoded samples as a single (min, max) bucket.
    /// Past capacity the data is dropped and counted: the visualization
    /// saturates while capture continues elsewhere.
    pub fn live_append(&mut self, block: &[i16]) {
        if block.is_empty() {
            return;
        }
        if self.min.len() >= self.capacity {
            self.dropped_blocks += 1;
            return;
        }

        let mut block_min = i16::MAX;
        let mut block_max = i16::MIN;
        for &sample in block {
            block_min = block_min.min(sample);
            block_max = block_max.max(sample);
        }

        if self.samples_per_bucket == 0 {
            // The ratio is fixed by the first block and never re-adapted.
            self.samples_per_bucket = block.len();
        }
        self.min.push(block_min);
        self.max.push(block_max);
        self.total_samples += block.len();
    }

    /// Reduces the sample range `[start_sample, end_sample)` to exactly
    /// `column_count` (min, max) pairs, one per display column. Out-of-range
    /// inputs are clamped; `end_sample == 0` means the end of the signal.
    pub fn query(
        &self,
        start_sample: usize,
        end_sample: usize,
        column_count: usize,
    ) -> Vec<(i16, i16)> {
        if column_count == 0 || self.min.is_empty() {
            return Vec::new();
        }

        let total = self.total_samples;
        let start = start_sample.min(total.saturating_sub(1));
        let mut end = if end_sample == 0 { total } else { end_sample.min(total) };
        if end <= start {
            end = start + 1;
        }

        let bucket_count = self.min.len();
        let ratio = self.samples_per_bucket.max(1);
        let start_bucket = (start / ratio).min(bucket_count - 1);
        let end_bucket = end.div_ceil(ratio).clamp(start_bucket + 1, bucket_count);
        let span = end_bucket - start_bucket;

        let mut columns = Vec::with_capacity(column_count);
        for column in 0..column_count {
            let mut from = start_bucket + column * span / column_count;
            let mut to = start_bucket + (column + 1) * span / column_count;
            if from >= end_bucket {
                from = end_bucket - 1;
            }
            if to <= from {
                to = from + 1;
            }

            let mut column_min = i16::MAX;
            let mut column_max = i16::MIN;
            for bucket in from..to.min(end_bucket) {
                column_min = column_min.min(self.min[bucket]);
                column_max = column_max.max(self.max[bucket]);
            }
            columns.push((column_min, column_max));
        }
        columns
    }

    /// Total samples summarized by this cache.
    pub fn total_samples(&self) -> usize {
        self.total_samples
    }

    /// Number of buckets currently held.
    pub fn bucket_count(&self) -> usize {
        self.min.len()
    }

    /// Raw samples summarized per bucket.
    pub fn samples_per_bucket(&self) -> usize {
        self.samples_per_bucket
    }

    /// Live-mode blocks dropped after the cache filled.
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped_blocks
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::write_test_wav;

    #[test]
    fn test_small_file_gets_one_bucket_per_sample() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("small.wav");
        let samples: Vec<i16> = (0..100).collect();
        write_test_wav(&path, &samples);

        let cache = WaveformCache::load_from_file(&path, 1024).expect("load");
        assert_eq!(cache.total_samples(), 100);
        assert_eq!(cache.bucket_count(), 100);
        assert_eq!(cache.samples_per_bucket(), 1);
    }

    #[test]
    fn test_large_file_respects_memory_budget() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("large.wav");
        let samples: Vec<i16> = (0..10_000).map(|i| (i % 1000) as i16).collect();
        write_test_wav(&path, &samples);

        // 1000 bytes of budget = 250 buckets.
        let cache = WaveformCache::load_from_file(&path, 1000).expect("load");
        assert_eq!(cache.bucket_count(), 250);
        assert_eq!(cache.samples_per_bucket(), 40);
        assert!(cache.bucket_count() * cache.samples_per_bucket() >= cache.total_samples());
    }

    #[test]
    fn test_bucket_extremes_are_captured() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("extremes.wav");
        // Two buckets of four samples each with known extremes.
        let samples: Vec<i16> = vec![5, -100, 90, 0, -3, 7, -800, 600];
        write_test_wav(&path, &samples);

        let cache = WaveformCache::load_from_file(&path, 8).expect("load");
        assert_eq!(cache.bucket_count(), 2);
        let columns = cache.query(0, 8, 2);
        assert_eq!(columns, vec![(-100, 90), (-800, 600)]);
    }

    #[test]
    fn test_empty_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.wav");
        write_test_wav(&path, &[]);

        assert!(matches!(
            WaveformCache::load_from_file(&path, 1024),
            Err(CacheError::Empty)
        ));
    }

    #[test]
    fn test_unreadable_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nothere.wav");
        assert!(matches!(
            WaveformCache::load_from_file(&path, 1024),
            Err(CacheError::Format(_))
        ));
    }

    #[test]
    fn test_query_returns_exact_column_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("columns.wav");
        let samples: Vec<i16> = (0..5000).map(|i| (i % 128) as i16).collect();
        write_test_wav(&path, &samples);

        let cache = WaveformCache::load_from_file(&path, 400).expect("load");
        for columns in [1usize, 7, 122, 500] {
            let result = cache.query(0, 5000, columns);
            assert_eq!(result.len(), columns);
            for (min, max) in result {
                assert!(min <= max);
            }
        }
    }

    #[test]
    fn test_query_subrange_and_clamping() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("subrange.wav");
        let samples: Vec<i16> = (0..2000).map(|i| i as i16).collect();
        write_test_wav(&path, &samples);

        let cache = WaveformCache::load_from_file(&path, 8192).expect("load");
        let columns = cache.query(500, 1000, 10);
        assert_eq!(columns.len(), 10);
        // Values in a sub-range query come from that sub-range.
        assert!(columns[0].0 >= 500);
        assert!(columns[9].1 < 1000);

        // Degenerate and oversized ranges still produce full output.
        assert_eq!(cache.query(100, 100, 4).len(), 4);
        assert_eq!(cache.query(0, 1_000_000, 4).len(), 4);
    }

    #[test]
    fn test_live_mode_saturates_at_capacity() {
        let mut cache = WaveformCache::live(3);
        let block: Vec<i16> = vec![-10, 20, -30, 40];
        for _ in 0..5 {
            cache.live_append(&block);
        }

        assert_eq!(cache.bucket_count(), 3);
        assert_eq!(cache.dropped_blocks(), 2);
        assert_eq!(cache.total_samples(), 12);
        assert_eq!(cache.samples_per_bucket(), 4);
        assert_eq!(cache.query(0, 12, 3), vec![(-30, 40); 3]);
    }

    #[test]
    fn test_live_mode_ignores_empty_blocks() {
        let mut cache = WaveformCache::live(4);
        cache.live_append(&[]);
        assert_eq!(cache.bucket_count(), 0);
        assert_eq!(cache.total_samples(), 0);
    }
}
