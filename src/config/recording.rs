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
use serde::Deserialize;

/// A YAML representation of the recording configuration.
#[derive(Deserialize, Clone)]
pub struct Recording {
    /// Capture sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    sample_rate: u32,

    /// Number of capture channels.
    #[serde(default = "default_channel_count")]
    channel_count: u16,

    /// Normalized peak level that trips a threshold-armed recording.
    #[serde(default = "default_threshold")]
    threshold: f32,

    /// Capacity of the pre-roll ring, in hardware blocks.
    #[serde(default = "default_preroll_blocks")]
    preroll_blocks: usize,

    /// Memory budget for the waveform envelope cache, in KB.
    #[serde(default = "default_memory_budget_kb")]
    memory_budget_kb: usize,

    /// Directory recordings are written to.
    #[serde(default = "default_recordings_dir")]
    recordings_dir: String,

    /// Bucket capacity of the live recording view.
    #[serde(default = "default_live_view_buckets")]
    live_view_buckets: usize,
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_channel_count() -> u16 {
    1
}

fn default_threshold() -> f32 {
    0.1
}

// Roughly half a second of mono audio at 44.1kHz in 128-sample blocks.
fn default_preroll_blocks() -> usize {
    172
}

fn default_memory_budget_kb() -> usize {
    100
}

fn default_recordings_dir() -> String {
    String::from("RECORDINGS")
}

// Display width minus the frame border.
fn default_live_view_buckets() -> usize {
    122
}

impl Default for Recording {
    fn default() -> Self {
        Recording {
            sample_rate: default_sample_rate(),
            channel_count: default_channel_count(),
            threshold: default_threshold(),
            preroll_blocks: default_preroll_blocks(),
            memory_budget_kb: default_memory_budget_kb(),
            recordings_dir: default_recordings_dir(),
            live_view_buckets: default_live_view_buckets(),
        }
    }
}

impl Recording {
    /// The capture sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The capture channel count.
    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    /// The trigger threshold, normalized to [0, 1].
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// The pre-roll ring capacity in blocks.
    pub fn preroll_blocks(&self) -> usize {
        self.preroll_blocks
    }

    /// The waveform cache budget in bytes.
    pub fn memory_budget_bytes(&self) -> usize {
        self.memory_budget_kb * 1024
    }

    /// The directory recordings are written to.
    pub fn recordings_dir(&self) -> &str {
        &self.recordings_dir
    }

    /// The live view bucket capacity.
    pub fn live_view_buckets(&self) -> usize {
        self.live_view_buckets
    }
}

#[cfg(test)]
impl Recording {
    /// Creates a recording configuration rooted in a test directory.
    pub fn for_test(recordings_dir: &std::path::Path) -> Recording {
        Recording {
            recordings_dir: recordings_dir.to_string_lossy().into_owned(),
            ..Recording::default()
        }
    }

    /// Overrides the pre-roll capacity (test only).
    pub fn with_preroll_blocks(mut self, preroll_blocks: usize) -> Recording {
        self.preroll_blocks = preroll_blocks;
        self
    }

    /// Overrides the trigger threshold (test only).
    pub fn with_threshold(mut self, threshold: f32) -> Recording {
        self.threshold = threshold;
        self
    }
}
