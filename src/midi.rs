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
use std::fmt;

use crossbeam_channel::Sender;
use thiserror::Error;

pub mod mock;

#[cfg(feature = "midir")]
pub mod midir;

/// MIDI device errors.
#[derive(Debug, Error)]
pub enum MidiError {
    #[error("already watching events")]
    AlreadyWatching,

    #[error("no device found with name {0}")]
    NotFound(String),

    #[error("found too many devices that match ({0}), use a less ambiguous device name")]
    Ambiguous(String),

    #[error("MIDI backend error: {0}")]
    Backend(String),
}

/// A MIDI input device that forwards raw event bytes. Parsing happens in
/// the translator layer, so devices stay dumb pipes.
pub trait Device: fmt::Display + Send {
    /// Returns the name of the device.
    fn name(&self) -> String;

    /// Forwards incoming MIDI events to the given sender until stopped.
    fn watch_events(&self, sender: Sender<Vec<u8>>) -> Result<(), MidiError>;

    /// Stops watching events.
    fn stop_watch_events(&self);
}

/// Gets a device with the given name. Names starting with "mock" resolve to
/// mock devices; anything else requires hardware support.
pub fn get_device(name: &str) -> Result<Box<dyn Device>, MidiError> {
    if name.starts_with("mock") {
        return Ok(Box::new(mock::Device::get(name)));
    }

    #[cfg(feature = "midir")]
    {
        Ok(Box::new(midir::get(name)?))
    }

    #[cfg(not(feature = "midir"))]
    Err(MidiError::NotFound(name.to_string()))
}
