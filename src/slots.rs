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

//! Playback slots.
//!
//! A slot maps a trigger note to a named recording plus its trim bounds.
//! The table owns its slots exclusively; the playback engine looks slots up
//! by note when a trigger arrives and reads byte offsets from here.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub mod sidecar;

/// Number of slots the sampler exposes by default, one per pad.
pub const DEFAULT_SLOT_COUNT: usize = 8;

// C3 upward, one semitone per slot.
const DEFAULT_TRIGGER_BASE_NOTE: u8 = 60;

/// WAV data starts after the 44-byte header.
const WAV_DATA_OFFSET: u32 = 44;

/// Slot table errors.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("no slot at index {0}")]
    NoSuchSlot(usize),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// A trim region in samples. Absent bounds mean the whole file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimBounds {
    pub start: u32,
    pub end: u32,
}

impl TrimBounds {
    /// Byte offset of the trim start within the WAV file.
    pub fn start_byte(&self) -> u32 {
        self.start * 2 + WAV_DATA_OFFSET
    }

    /// Byte offset of the trim end within the WAV file.
    pub fn end_byte(&self) -> u32 {
        self.end * 2 + WAV_DATA_OFFSET
    }
}

/// One triggerable playback slot.
#[derive(Debug, Clone)]
pub struct SampleSlot {
    sample_name: String,
    trim: Option<TrimBounds>,
    trigger_note: u8,
    assigned: bool,
}

impl SampleSlot {
    fn empty(trigger_note: u8) -> SampleSlot {
        SampleSlot {
            sample_name: String::new(),
            trim: None,
            trigger_note,
            assigned: false,
        }
    }

    /// Whether a recording is assigned to this slot.
    pub fn is_assigned(&self) -> bool {
        self.assigned
    }

    /// The assigned recording name, without the `.wav` extension.
    pub fn sample_name(&self) -> &str {
        &self.sample_name
    }

    /// The trim bounds, or None to play the whole file.
    pub fn trim(&self) -> Option<TrimBounds> {
        self.trim
    }

    /// The MIDI note that triggers this slot.
    pub fn trigger_note(&self) -> u8 {
        self.trigger_note
    }

    /// Byte offset playback starts from.
    pub fn start_byte(&self) -> u32 {
        self.trim
            .map(|t| t.start_byte())
            .unwrap_or(WAV_DATA_OFFSET)
    }

    /// Byte offset playback stops at, or None for end of file.
    pub fn end_byte(&self) -> Option<u32> {
        self.trim.map(|t| t.end_byte())
    }
}

/// The sampler's slot table.
pub struct SlotTable {
    root: PathBuf,
    slots: Vec<SampleSlot>,
}

impl SlotTable {
    /// Creates a table of empty slots with default trigger notes, rooted at
    /// the recordings directory.
    pub fn new(root: &Path, slot_count: usize) -> SlotTable {
        let slots = (0..slot_count)
            .map(|i| SampleSlot::empty(DEFAULT_TRIGGER_BASE_NOTE + i as u8))
            .collect();
        SlotTable {
            root: root.to_path_buf(),
            slots,
        }
    }

    /// The WAV path for a recording name.
    pub fn wav_path(&self, sample_name: &str) -> PathBuf {
        self.root.join(format!("{}.wav", sample_name))
    }

    /// Assigns a recording to a slot, loading its trim sidecar. A missing
    /// sidecar assigns the whole file.
    pub fn assign(
        &mut self,
        index: usize,
        sample_name: &str,
        trigger_note: u8,
    ) -> Result<(), SlotError> {
        let wav_path = self.wav_path(sample_name);
        let trim = sidecar::read(&wav_path)?;

        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SlotError::NoSuchSlot(index))?;
        slot.sample_name = sample_name.to_string();
        slot.trim = trim;
        slot.trigger_note = trigger_note;
        slot.assigned = true;

        info!(slot = index, sample = sample_name, trigger_note, "Slot assigned.");
        Ok(())
    }

    /// Clears a slot, dropping its assignment and removing the persisted
    /// trim sidecar.
    pub fn clear(&mut self, index: usize) -> Result<(), SlotError> {
        let slot = self
            .slots
            .get(index)
            .ok_or(SlotError::NoSuchSlot(index))?;
        let trigger_note = slot.trigger_note;
        if slot.assigned {
            sidecar::remove(&self.wav_path(&slot.sample_name))?;
        }
        self.slots[index] = SampleSlot::empty(trigger_note);
        debug!(slot = index, "Slot cleared.");
        Ok(())
    }

    /// Looks up the assigned slot triggered by a MIDI note.
    pub fn slot_for_note(&self, note: u8) -> Option<(usize, &SampleSlot)> {
        self.slots
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.assigned && slot.trigger_note == note)
    }

    /// The slot at the given index.
    pub fn slot(&self, index: usize) -> Option<&SampleSlot> {
        self.slots.get(index)
    }

    /// All slots in order.
    pub fn slots(&self) -> &[SampleSlot] {
        &self.slots
    }
}
