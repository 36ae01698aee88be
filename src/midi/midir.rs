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
use std::mem;
use std::sync::Mutex;

use crossbeam_channel::Sender;
use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use tracing::{debug, info};

use super::MidiError;

/// A hardware MIDI input backed by midir. The midir callback thread is the
/// producer side of the event channel; the core consumes it from the main
/// loop.
pub struct Device {
    name: String,
    input_port: MidiInputPort,
    event_connection: Mutex<Option<MidiInputConnection<()>>>,
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn watch_events(&self, sender: Sender<Vec<u8>>) -> Result<(), MidiError> {
        let mut event_connection = self
            .event_connection
            .lock()
            .expect("unable to get connection lock");
        if event_connection.is_some() {
            return Err(MidiError::AlreadyWatching);
        }

        info!(device = self.name, "Watching MIDI events.");

        let input = MidiInput::new("mrec input")
            .map_err(|e| MidiError::Backend(e.to_string()))?;
        *event_connection = Some(
            input
                .connect(
                    &self.input_port,
                    "mrec input watcher",
                    move |_, raw_event, _| {
                        debug!(bytes = raw_event.len(), "Received MIDI event.");
                        // A full channel just drops the event; the consumer
                        // will catch up on fresher input.
                        let _ = sender.try_send(raw_event.to_vec());
                    },
                    (),
                )
                .map_err(|e| MidiError::Backend(e.to_string()))?,
        );

        Ok(())
    }

    fn stop_watch_events(&self) {
        // Explicitly drop the connection.
        let event_connection = self
            .event_connection
            .lock()
            .expect("unable to get connection lock")
            .take();
        mem::drop(event_connection);
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Input)", self.name)
    }
}

/// Lists the names of available hardware inputs.
pub fn list() -> Result<Vec<String>, MidiError> {
    Ok(list_midir_devices()?
        .into_iter()
        .map(|device| device.name)
        .collect())
}

fn list_midir_devices() -> Result<Vec<Device>, MidiError> {
    let input = MidiInput::new("mrec input listing")
        .map_err(|e| MidiError::Backend(e.to_string()))?;

    let mut devices = Vec::new();
    for port in input.ports() {
        let name = input
            .port_name(&port)
            .map_err(|e| MidiError::Backend(e.to_string()))?;
        devices.push(Device {
            name,
            input_port: port,
            event_connection: Mutex::new(None),
        });
    }

    devices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(devices)
}

/// Gets the hardware input whose name contains the given string.
pub fn get(name: &str) -> Result<Device, MidiError> {
    let mut matches = list_midir_devices()?
        .into_iter()
        .filter(|device| device.name.contains(name))
        .collect::<Vec<Device>>();

    if matches.is_empty() {
        return Err(MidiError::NotFound(name.to_string()));
    }
    if matches.len() > 1 {
        return Err(MidiError::Ambiguous(
            matches
                .iter()
                .map(|device| device.name.clone())
                .collect::<Vec<String>>()
                .join(", "),
        ));
    }

    Ok(matches.swap_remove(0))
}
