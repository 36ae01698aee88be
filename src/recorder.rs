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

//! The recording pipeline.
//!
//! Drives capture through its lifecycle: idle, armed and waiting for the
//! level threshold with audio spooling into the pre-roll ring, recording to
//! disk, then editing the finished take with a waveform cache and trim
//! selector attached. `tick()` must run every main-loop iteration while armed
//! or recording; falling behind loses audio (the queues drop), never
//! corrupts the file.

use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::audio::wav::{WavStreamWriter, WriterError};
use crate::audio::{BlockSource, PeakSource};
use crate::config;
use crate::slots::sidecar;
use crate::waveform::{CacheError, SelectionRegion, TrimSelector, WaveformCache};

use self::naming::NameGenerator;
use self::preroll::PrerollBuffer;

pub mod naming;
pub mod preroll;

/// Errors from the recording pipeline. Every failure leaves the pipeline in
/// a stable state; nothing retries automatically.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("writer error: {0}")]
    Writer(#[from] WriterError),

    #[error("waveform cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// The pipeline's current lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Armed,
    Recording,
    Editing,
}

/// Lifecycle state with its owned data.
enum State {
    Idle,
    Armed {
        preroll: PrerollBuffer,
    },
    Recording {
        live: WaveformCache,
    },
    Editing {
        path: PathBuf,
        cache: WaveformCache,
        selector: TrimSelector,
    },
}

fn state_label(state: &State) -> &'static str {
    match state {
        State::Idle => "idle",
        State::Armed { .. } => "armed",
        State::Recording { .. } => "recording",
        State::Editing { .. } => "editing",
    }
}

/// Orchestrates capture from arm to trim confirmation.
pub struct RecordingPipeline {
    blocks: Box<dyn BlockSource>,
    peaks: Box<dyn PeakSource>,
    writer: WavStreamWriter,
    names: NameGenerator,
    config: config::Recording,
    state: State,
}

impl RecordingPipeline {
    /// Creates an idle pipeline over the device's audio queues.
    pub fn new(
        blocks: Box<dyn BlockSource>,
        peaks: Box<dyn PeakSource>,
        config: config::Recording,
    ) -> RecordingPipeline {
        RecordingPipeline {
            blocks,
            peaks,
            writer: WavStreamWriter::new(),
            names: NameGenerator::new(),
            config,
            state: State::Idle,
        }
    }

    /// The current lifecycle stage.
    pub fn state(&self) -> PipelineState {
        match self.state {
            State::Idle => PipelineState::Idle,
            State::Armed { .. } => PipelineState::Armed,
            State::Recording { .. } => PipelineState::Recording,
            State::Editing { .. } => PipelineState::Editing,
        }
    }

    /// The path of the recording being captured or edited.
    pub fn current_path(&self) -> Option<&Path> {
        match &self.state {
            State::Recording { .. } => self.writer.path(),
            State::Editing { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Starts threshold-armed capture: audio spools into the pre-roll ring
    /// and peak levels are monitored. No file is opened yet.
    pub fn arm(&mut self) -> Result<(), RecorderError> {
        if !matches!(self.state, State::Idle) {
            return Err(RecorderError::InvalidTransition {
                action: "arm",
                state: state_label(&self.state),
            });
        }

        self.state = State::Armed {
            preroll: PrerollBuffer::new(self.config.preroll_blocks()),
        };
        info!(
            threshold = self.config.threshold(),
            preroll_blocks = self.config.preroll_blocks(),
            "Armed, waiting for level threshold."
        );
        Ok(())
    }

    /// Abandons an armed capture, discarding the pre-roll. No file was ever
    /// opened.
    pub fn cancel_arm(&mut self) -> Result<(), RecorderError> {
        if !matches!(self.state, State::Armed { .. }) {
            return Err(RecorderError::InvalidTransition {
                action: "cancel arming",
                state: state_label(&self.state),
            });
        }

        self.state = State::Idle;
        info!("Arming cancelled, pre-roll discarded.");
        Ok(())
    }

    /// Starts recording immediately, bypassing the threshold and pre-roll.
    pub fn manual_start(&mut self) -> Result<(), RecorderError> {
        if !matches!(self.state, State::Idle) {
            return Err(RecorderError::InvalidTransition {
                action: "start recording",
                state: state_label(&self.state),
            });
        }

        self.open_writer()?;
        self.state = State::Recording {
            live: WaveformCache::live(self.config.live_view_buckets()),
        };
        Ok(())
    }

    /// Feeds one peak reading through the state machine: while armed, a
    /// level above the threshold starts the recording; while recording this
    /// just services the writer.
    pub fn on_peak_sample(&mut self, level: f32) -> Result<(), RecorderError> {
        match self.state {
            State::Armed { .. } if level > self.config.threshold() => self.start_from_preroll(),
            State::Recording { .. } => {
                self.writer.update(self.blocks.as_mut())?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Services the active state. Call every main-loop iteration.
    pub fn tick(&mut self) -> Result<(), RecorderError> {
        let triggered = match &mut self.state {
            State::Idle | State::Editing { .. } => false,
            State::Armed { preroll } => {
                while let Some(block) = self.blocks.read() {
                    preroll.push(block);
                }

                let threshold = self.config.threshold();
                let mut hit = false;
                while let Some(level) = self.peaks.read() {
                    if level > threshold {
                        hit = true;
                        break;
                    }
                }
                hit
            }
            State::Recording { live } => {
                self.writer.update(self.blocks.as_mut())?;
                let preview = self.writer.preview();
                if !preview.is_empty() {
                    live.live_append(&preview);
                    self.writer.clear_preview();
                }
                false
            }
        };

        if triggered {
            self.start_from_preroll()
        } else {
            Ok(())
        }
    }

    /// Stops the recording: flushes and closes the file, then rebuilds a
    /// waveform cache from it and attaches a fresh trim selector.
    ///
    /// A close failure keeps the pipeline recording so the stop can be
    /// retried. A cache failure lands back in idle with the error; edit mode
    /// is never entered over an unreadable file.
    pub fn stop(&mut self) -> Result<(), RecorderError> {
        if !matches!(self.state, State::Recording { .. }) {
            return Err(RecorderError::InvalidTransition {
                action: "stop recording",
                state: state_label(&self.state),
            });
        }

        let path = match self.writer.close(self.blocks.as_mut())? {
            Some(path) => path,
            None => {
                // No session despite the recording state; nothing to edit.
                self.state = State::Idle;
                return Ok(());
            }
        };

        let cache = match WaveformCache::load_from_file(&path, self.config.memory_budget_bytes()) {
            Ok(cache) => cache,
            Err(e) => {
                error!(
                    path = %path.display(),
                    err = %e,
                    "Recording closed but its waveform is unreadable."
                );
                self.state = State::Idle;
                return Err(e.into());
            }
        };

        let selector = TrimSelector::new(cache.total_samples());
        info!(
            path = %path.display(),
            samples = cache.total_samples(),
            "Recording stopped, entering edit mode."
        );
        self.state = State::Editing {
            path,
            cache,
            selector,
        };
        Ok(())
    }

    /// Persists the current trim bounds as a sidecar and returns to idle.
    pub fn confirm_trim(&mut self) -> Result<SelectionRegion, RecorderError> {
        let (path, region) = match &self.state {
            State::Editing { path, selector, .. } => (path.clone(), selector.confirm()),
            _ => {
                return Err(RecorderError::InvalidTransition {
                    action: "confirm trim",
                    state: state_label(&self.state),
                })
            }
        };

        // A sidecar write failure keeps the edit session alive.
        sidecar::write(&path, &region)?;
        info!(
            path = %path.display(),
            start = region.start,
            end = region.end,
            "Trim saved."
        );
        self.state = State::Idle;
        Ok(region)
    }

    /// Leaves edit mode without persisting anything.
    pub fn discard_edit(&mut self) -> Result<(), RecorderError> {
        if !matches!(self.state, State::Editing { .. }) {
            return Err(RecorderError::InvalidTransition {
                action: "discard edit",
                state: state_label(&self.state),
            });
        }

        self.state = State::Idle;
        Ok(())
    }

    /// The trim selector, while editing.
    pub fn selector(&self) -> Option<&TrimSelector> {
        match &self.state {
            State::Editing { selector, .. } => Some(selector),
            _ => None,
        }
    }

    /// Mutable access to the trim selector, while editing.
    pub fn selector_mut(&mut self) -> Option<&mut TrimSelector> {
        match &mut self.state {
            State::Editing { selector, .. } => Some(selector),
            _ => None,
        }
    }

    /// The waveform cache of the take being edited.
    pub fn cache(&self) -> Option<&WaveformCache> {
        match &self.state {
            State::Editing { cache, .. } => Some(cache),
            _ => None,
        }
    }

    /// The live envelope of the recording in progress.
    pub fn live_view(&self) -> Option<&WaveformCache> {
        match &self.state {
            State::Recording { live } => Some(live),
            _ => None,
        }
    }

    /// The underlying stream writer, for preview and overflow counters.
    pub fn writer(&self) -> &WavStreamWriter {
        &self.writer
    }

    /// Opens the writer on a freshly named file and replays the pre-roll
    /// into it, oldest block first. A storage failure leaves the armed state
    /// and its pre-roll intact.
    fn start_from_preroll(&mut self) -> Result<(), RecorderError> {
        let state = mem::replace(&mut self.state, State::Idle);
        let label = state_label(&state);
        let mut preroll = match state {
            State::Armed { preroll } => preroll,
            other => {
                self.state = other;
                return Err(RecorderError::InvalidTransition {
                    action: "trigger recording",
                    state: label,
                });
            }
        };

        if let Err(e) = self.open_writer() {
            warn!(err = %e, "Could not open recording file, still armed.");
            self.state = State::Armed { preroll };
            return Err(e);
        }

        info!(
            preroll_blocks = preroll.len(),
            evicted = preroll.evicted_blocks(),
            "Threshold crossed, recording started."
        );
        self.state = State::Recording {
            live: WaveformCache::live(self.config.live_view_buckets()),
        };
        while let Some(block) = preroll.pop() {
            self.writer.write_block(&block)?;
        }
        Ok(())
    }

    fn open_writer(&mut self) -> Result<(), RecorderError> {
        let root = PathBuf::from(self.config.recordings_dir());
        fs::create_dir_all(&root)?;

        let name = self.names.generate();
        let path = root.join(format!("{}.wav", name));
        self.writer.open(
            &path,
            self.config.sample_rate(),
            self.config.channel_count(),
        )?;
        info!(path = %path.display(), "Recording to file.");
        Ok(())
    }
}
