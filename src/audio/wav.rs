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

//! Streaming WAV writer.
//!
//! Writes canonical 16-bit PCM WAV files while the audio is still being
//! produced: a 44-byte header with zeroed size fields goes out first, blocks
//! stream in behind it, and the two size fields are patched on close. A
//! bounded ring of decoded samples mirrors what was written so the recording
//! screen can draw a live preview without touching the file.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use thiserror::Error;
use tracing::{debug, info};

use super::{AudioBlock, BlockSource, BLOCK_BYTES};

/// Size of the WAV header this writer produces.
pub const WAV_HEADER_BYTES: u32 = 44;

/// Decoded samples retained for preview between main-loop reads.
pub const PREVIEW_CAPACITY: usize = 4096;

/// Storage writes are paired into sector-sized chunks; SD-class storage is
/// most efficient at full 512-byte sector writes.
const SECTOR_BYTES: usize = 2 * BLOCK_BYTES;

const RIFF_SIZE_OFFSET: u64 = 4;
const DATA_SIZE_OFFSET: u64 = 40;

/// Errors from the streaming writer.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("a capture session is already open")]
    SessionOpen,

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// One open capture target. Exactly one exists at a time.
struct CaptureSession {
    path: PathBuf,
    file: File,
    total_bytes: u32,
}

/// Streams raw PCM from a [`BlockSource`] into a WAV file.
pub struct WavStreamWriter {
    session: Option<CaptureSession>,
    preview_prod: HeapProd<i16>,
    preview_cons: HeapCons<i16>,
    dropped_preview: u64,
}

impl WavStreamWriter {
    pub fn new() -> WavStreamWriter {
        let (preview_prod, preview_cons) = HeapRb::<i16>::new(PREVIEW_CAPACITY).split();
        WavStreamWriter {
            session: None,
            preview_prod,
            preview_cons,
            dropped_preview: 0,
        }
    }

    /// Whether a capture session is currently open.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// The path of the open session, if any.
    pub fn path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.path.as_path())
    }

    /// Total bytes written to the open session, header included.
    pub fn bytes_written(&self) -> u32 {
        self.session.as_ref().map(|s| s.total_bytes).unwrap_or(0)
    }

    /// Opens a new capture session and writes the placeholder header. Fails
    /// if a session is already open or the file cannot be created.
    pub fn open(
        &mut self,
        path: &Path,
        sample_rate: u32,
        channel_count: u16,
    ) -> Result<(), WriterError> {
        if self.session.is_some() {
            return Err(WriterError::SessionOpen);
        }

        let mut file = File::create(path)?;
        write_header(&mut file, sample_rate, channel_count)?;

        info!(
            path = %path.display(),
            sample_rate,
            channel_count,
            "Capture session opened."
        );

        self.session = Some(CaptureSession {
            path: path.to_path_buf(),
            file,
            total_bytes: WAV_HEADER_BYTES,
        });
        Ok(())
    }

    /// Drains block pairs from the source into sector-sized file writes and
    /// mirrors the decoded samples into the preview ring. No-op when no
    /// session is open. Returns the number of bytes written this call.
    ///
    /// Must run every main-loop iteration while recording; if it falls
    /// behind, the source drops audio rather than erroring.
    pub fn update(&mut self, source: &mut dyn BlockSource) -> Result<usize, WriterError> {
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return Ok(0),
        };

        let mut written = 0;
        while source.available() >= 2 {
            let mut sector = [0u8; SECTOR_BYTES];
            let (first, second) = match (source.read(), source.read()) {
                (Some(first), Some(second)) => (first, second),
                _ => break,
            };
            sector[..BLOCK_BYTES].copy_from_slice(first.bytes());
            sector[BLOCK_BYTES..].copy_from_slice(second.bytes());

            session.file.write_all(&sector)?;
            session.total_bytes += SECTOR_BYTES as u32;
            written += SECTOR_BYTES;

            push_preview(
                &mut self.preview_prod,
                &mut self.dropped_preview,
                first.samples().chain(second.samples()),
            );
        }

        Ok(written)
    }

    /// Appends a single block, bypassing the source. Used to replay pre-roll
    /// audio captured before the session was opened.
    pub fn write_block(&mut self, block: &AudioBlock) -> Result<(), WriterError> {
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return Ok(()),
        };

        session.file.write_all(block.bytes())?;
        session.total_bytes += BLOCK_BYTES as u32;
        push_preview(
            &mut self.preview_prod,
            &mut self.dropped_preview,
            block.samples(),
        );
        Ok(())
    }

    /// Flushes any blocks still queued in the source, patches the header size
    /// fields, and closes the file. No-op when no session is open. Returns
    /// the path of the finished file.
    ///
    /// On storage failure the session stays open so the caller can retry.
    pub fn close(&mut self, source: &mut dyn BlockSource) -> Result<Option<PathBuf>, WriterError> {
        let mut session = match self.session.take() {
            Some(session) => session,
            None => return Ok(None),
        };

        if let Err(e) = finalize(&mut session, source) {
            // The session stays open for a retry.
            self.session = Some(session);
            return Err(e);
        }

        debug!(
            path = %session.path.display(),
            bytes = session.total_bytes,
            "Capture session closed."
        );
        Ok(Some(session.path))
    }

    /// The decoded samples accumulated for preview since the last clear.
    pub fn preview(&self) -> Vec<i16> {
        self.preview_cons.iter().copied().collect()
    }

    /// Drains the preview ring. Does not affect file writes.
    pub fn clear_preview(&mut self) {
        self.preview_cons.clear();
    }

    /// Samples lost to preview ring saturation.
    pub fn dropped_preview_samples(&self) -> u64 {
        self.dropped_preview
    }
}

impl Default for WavStreamWriter {
    fn default() -> Self {
        WavStreamWriter::new()
    }
}

/// Drains straggler blocks, patches the header size fields and syncs.
fn finalize(session: &mut CaptureSession, source: &mut dyn BlockSource) -> Result<(), WriterError> {
    while let Some(block) = source.read() {
        session.file.write_all(block.bytes())?;
        session.total_bytes += BLOCK_BYTES as u32;
    }

    session.file.flush()?;

    // Patch the two placeholder size fields.
    session.file.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))?;
    encode_u32(&mut session.file, session.total_bytes - 8)?;
    session.file.seek(SeekFrom::Start(DATA_SIZE_OFFSET))?;
    encode_u32(&mut session.file, session.total_bytes - WAV_HEADER_BYTES)?;
    session.file.sync_all()?;
    Ok(())
}

fn push_preview(
    prod: &mut HeapProd<i16>,
    dropped: &mut u64,
    samples: impl Iterator<Item = i16>,
) {
    for sample in samples {
        if prod.try_push(sample).is_err() {
            // Preview saturates rather than stalling capture.
            *dropped += 1;
        }
    }
}

/// Writes the canonical 44-byte RIFF/WAVE/fmt/data header with both chunk
/// size fields zeroed.
fn write_header(file: &mut File, sample_rate: u32, channel_count: u16) -> Result<(), WriterError> {
    file.write_all(b"RIFF")?;
    encode_u32(file, 0)?; // patched on close
    file.write_all(b"WAVE")?;

    file.write_all(b"fmt ")?;
    encode_u32(file, 16)?;
    encode_u16(file, 1)?; // PCM
    encode_u16(file, channel_count)?;
    encode_u32(file, sample_rate)?;
    encode_u32(file, sample_rate * u32::from(channel_count) * 2)?;
    encode_u16(file, channel_count * 2)?;
    encode_u16(file, 16)?;

    file.write_all(b"data")?;
    encode_u32(file, 0)?; // patched on close
    Ok(())
}

fn encode_u16(file: &mut File, value: u16) -> std::io::Result<()> {
    file.write_all(&value.to_le_bytes())
}

fn encode_u32(file: &mut File, value: u32) -> std::io::Result<()> {
    file.write_all(&value.to_le_bytes())
}
