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
use std::sync::Mutex;

use crossbeam_channel::Sender;

use super::MidiError;

/// A mock MIDI input. Events are injected by tests and forwarded on the
/// caller's own thread; there is no hardware behind it.
pub struct Device {
    name: String,
    sender: Mutex<Option<Sender<Vec<u8>>>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            sender: Mutex::new(None),
        }
    }

    /// Injects a raw MIDI event as if the hardware had produced it.
    pub fn mock_event(&self, event: &[u8]) {
        let sender = self.sender.lock().expect("unable to get sender lock");
        if let Some(sender) = sender.as_ref() {
            let _ = sender.try_send(event.to_vec());
        }
    }
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn watch_events(&self, sender: Sender<Vec<u8>>) -> Result<(), MidiError> {
        let mut current = self.sender.lock().expect("unable to get sender lock");
        if current.is_some() {
            return Err(MidiError::AlreadyWatching);
        }
        *current = Some(sender);
        Ok(())
    }

    fn stop_watch_events(&self) {
        let mut current = self.sender.lock().expect("unable to get sender lock");
        *current = None;
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

#[cfg(test)]
mod test {
    use crossbeam_channel::unbounded;

    use crate::midi::Device as _;

    use super::*;

    #[test]
    fn test_events_flow_through_watcher() {
        let device = Device::get("mock-device");
        let (tx, rx) = unbounded();

        device.watch_events(tx).expect("watch");
        device.mock_event(&[0x90, 60, 127]);
        device.mock_event(&[0x80, 60, 0]);

        assert_eq!(rx.try_recv().expect("event"), vec![0x90, 60, 127]);
        assert_eq!(rx.try_recv().expect("event"), vec![0x80, 60, 0]);
    }

    #[test]
    fn test_watching_twice_fails() {
        let device = Device::get("mock-device");
        let (tx, _rx) = unbounded();
        device.watch_events(tx.clone()).expect("watch");
        assert!(matches!(
            device.watch_events(tx),
            Err(MidiError::AlreadyWatching)
        ));
    }

    #[test]
    fn test_events_after_stop_are_dropped() {
        let device = Device::get("mock-device");
        let (tx, rx) = unbounded();
        device.watch_events(tx).expect("watch");
        device.stop_watch_events();
        device.mock_event(&[0x90, 60, 127]);
        assert!(rx.try_recv().is_err());
    }
}
