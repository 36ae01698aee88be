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

//! The boundary to the device's audio engine.
//!
//! The audio engine fills a queue with fixed-size blocks of raw PCM from
//! interrupt context and publishes peak levels from its amplitude analyzer.
//! The core never touches hardware directly: it consumes these queues from
//! the main loop, and tests drive the same interfaces with scripted data.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crossbeam_channel::{bounded, Receiver, Sender};

pub mod wav;

/// Bytes per 16-bit PCM sample.
pub const SAMPLE_BYTES: usize = 2;

/// Size in bytes of one block from the audio engine.
pub const BLOCK_BYTES: usize = 256;

/// Samples carried by one block.
pub const BLOCK_SAMPLES: usize = BLOCK_BYTES / SAMPLE_BYTES;

/// One fixed-size block of raw little-endian 16-bit PCM.
#[derive(Clone, Copy)]
pub struct AudioBlock {
    bytes: [u8; BLOCK_BYTES],
}

impl AudioBlock {
    /// Wraps a raw byte block.
    pub fn new(bytes: [u8; BLOCK_BYTES]) -> AudioBlock {
        AudioBlock { bytes }
    }

    /// Builds a block from decoded samples.
    pub fn from_samples(samples: &[i16; BLOCK_SAMPLES]) -> AudioBlock {
        let mut bytes = [0u8; BLOCK_BYTES];
        for (chunk, sample) in bytes.chunks_exact_mut(SAMPLE_BYTES).zip(samples) {
            chunk.copy_from_slice(&sample.to_le_bytes());
        }
        AudioBlock { bytes }
    }

    /// The raw bytes of this block.
    pub fn bytes(&self) -> &[u8; BLOCK_BYTES] {
        &self.bytes
    }

    /// Iterates over the decoded samples in this block.
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.bytes
            .chunks_exact(SAMPLE_BYTES)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
    }
}

impl std::fmt::Debug for AudioBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioBlock")
            .field("len", &BLOCK_BYTES)
            .finish()
    }
}

/// A source of raw audio blocks. Reading a block frees it.
pub trait BlockSource: Send {
    /// The number of blocks ready to be read.
    fn available(&self) -> usize;

    /// Takes the next block, or None if the source is currently empty.
    fn read(&mut self) -> Option<AudioBlock>;
}

/// A source of peak amplitude readings, normalized to [0, 1].
pub trait PeakSource: Send {
    /// Takes the next peak reading, or None if no new reading is available.
    fn read(&mut self) -> Option<f32>;
}

/// Creates the capture queue pair. The producer half goes to the audio
/// engine, the consumer half to whatever drains blocks from the main loop.
pub fn capture_queue(capacity_blocks: usize) -> (CaptureProducer, CaptureQueue) {
    let (tx, rx) = bounded(capacity_blocks);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        CaptureProducer {
            tx,
            dropped: dropped.clone(),
        },
        CaptureQueue { rx, dropped },
    )
}

/// The audio engine's half of the capture queue.
#[derive(Clone)]
pub struct CaptureProducer {
    tx: Sender<AudioBlock>,
    dropped: Arc<AtomicU64>,
}

impl CaptureProducer {
    /// Offers a block to the queue. If the consumer has fallen behind and the
    /// queue is full, the block is dropped and counted; capture keeps running.
    pub fn push(&self, block: AudioBlock) {
        if self.tx.try_send(block).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// The number of blocks dropped due to queue overflow.
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// The consumer half of the capture queue.
pub struct CaptureQueue {
    rx: Receiver<AudioBlock>,
    dropped: Arc<AtomicU64>,
}

impl CaptureQueue {
    /// The number of blocks the producer has dropped so far.
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl BlockSource for CaptureQueue {
    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read(&mut self) -> Option<AudioBlock> {
        self.rx.try_recv().ok()
    }
}

/// Creates the peak queue pair, mirroring [`capture_queue`] for the
/// amplitude analyzer.
pub fn peak_queue(capacity: usize) -> (PeakProducer, PeakQueue) {
    let (tx, rx) = bounded(capacity);
    (PeakProducer { tx }, PeakQueue { rx })
}

/// The amplitude analyzer's half of the peak queue.
#[derive(Clone)]
pub struct PeakProducer {
    tx: Sender<f32>,
}

impl PeakProducer {
    /// Offers a peak level. Readings are dropped when the queue is full;
    /// only fresh levels matter for threshold detection.
    pub fn push(&self, level: f32) {
        let _ = self.tx.try_send(level);
    }
}

/// The consumer half of the peak queue.
pub struct PeakQueue {
    rx: Receiver<f32>,
}

impl PeakSource for PeakQueue {
    fn read(&mut self) -> Option<f32> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_block_sample_roundtrip() {
        let mut samples = [0i16; BLOCK_SAMPLES];
        for (i, sample) in samples.iter_mut().enumerate() {
            *sample = (i as i16) - 64;
        }
        let block = AudioBlock::from_samples(&samples);
        let decoded: Vec<i16> = block.samples().collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_block_decodes_little_endian() {
        let mut bytes = [0u8; BLOCK_BYTES];
        bytes[0] = 0x34;
        bytes[1] = 0x12;
        bytes[2] = 0xFF;
        bytes[3] = 0xFF;
        let block = AudioBlock::new(bytes);
        let mut samples = block.samples();
        assert_eq!(samples.next(), Some(0x1234));
        assert_eq!(samples.next(), Some(-1));
    }

    #[test]
    fn test_capture_queue_drops_newest_when_full() {
        let (producer, mut queue) = capture_queue(2);
        producer.push(AudioBlock::new([1; BLOCK_BYTES]));
        producer.push(AudioBlock::new([2; BLOCK_BYTES]));
        producer.push(AudioBlock::new([3; BLOCK_BYTES]));

        assert_eq!(producer.dropped_blocks(), 1);
        assert_eq!(queue.available(), 2);
        assert_eq!(queue.read().map(|b| b.bytes()[0]), Some(1));
        assert_eq!(queue.read().map(|b| b.bytes()[0]), Some(2));
        assert!(queue.read().is_none());
    }

    #[test]
    fn test_peak_queue_delivers_in_order() {
        let (producer, mut queue) = peak_queue(4);
        producer.push(0.25);
        producer.push(0.5);
        assert_eq!(queue.read(), Some(0.25));
        assert_eq!(queue.read(), Some(0.5));
        assert_eq!(queue.read(), None);
    }
}
