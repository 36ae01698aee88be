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

//! Logical control surface.
//!
//! Physical controls and MIDI controllers feed the same small set of logical
//! actions into the UI state machines; downstream code never knows which
//! surface produced an input. [`ControlEvent`] is the raw shape the physical
//! encoder/button layer produces, and the translator converts actions back
//! into it so both paths converge.

pub mod translator;

pub use translator::MidiEventTranslator;

/// Input id of the rotary encoder in a [`ControlEvent`].
pub const ENCODER_INPUT: u8 = 0;
/// Input id of the select/back button.
pub const SELECT_BUTTON: u8 = 1;
/// Input id of the transport button.
pub const TRANSPORT_BUTTON: u8 = 2;
/// Input id of the function (shift) button.
pub const FUNCTION_BUTTON: u8 = 3;

/// Which interaction context currently owns the controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// The top-level menu.
    Home,
    /// The recorder screen, both while capturing and while trimming.
    Recorder,
    /// The live performance screen with its slot grid.
    Live,
}

/// Logical actions the control surfaces produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Moves the menu cursor up.
    NavigateUp,

    /// Moves the menu cursor down.
    NavigateDown,

    /// Activates the current menu item.
    Select { pressed: bool },

    /// Leaves the current screen.
    Back { pressed: bool },

    /// One encoder detent in either direction.
    Encoder { direction: i8 },

    /// Starts or stops the recorder transport.
    TransportToggle { pressed: bool },

    /// Nudges the trim start handle.
    TrimStart { direction: i8 },

    /// Nudges the trim end handle.
    TrimEnd { direction: i8 },

    /// Zooms the waveform view.
    Zoom { direction: i8 },

    /// Nudges the active trim handle.
    Selection { direction: i8 },

    /// Fires a playback slot.
    TriggerSlot { index: u8, velocity: u8 },
}

/// The event shape the physical encoder/button layer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlEvent {
    /// Which input produced the event: [`ENCODER_INPUT`] or a button id.
    pub input: u8,

    /// Whether a button input is pressed (ignored for the encoder).
    pub pressed: bool,

    /// Encoder movement, -1 or +1 per detent.
    pub encoder_delta: i8,

    /// Whether the select button is held alongside this event.
    pub select_held: bool,

    /// Whether the transport button is held alongside this event.
    pub transport_held: bool,

    /// Whether the function button is held alongside this event.
    pub function_held: bool,
}

#[cfg(test)]
mod test {
    use crossbeam_channel::unbounded;
    use midly::live::LiveEvent;

    use crate::config;
    use crate::midi::{self, Device as _};

    use super::*;

    /// Wires a mock MIDI device through the raw byte channel into the
    /// translator, the same path hardware input takes.
    #[test]
    fn test_midi_device_drives_logical_actions() {
        let device = midi::test::Device::get("mock-controller");
        let (tx, rx) = unbounded();
        device.watch_events(tx).expect("watch");

        let mut translator =
            MidiEventTranslator::new(&config::Controller::default()).expect("translator");

        // Pad 0 is note 37 in the stock layout: Note On, then an invalid
        // event that fails parsing, then an unmapped Note On.
        device.mock_event(&[0x90, 37, 100]);
        device.mock_event(&[0x01, 0x02]);
        device.mock_event(&[0x90, 99, 100]);

        let mut actions = Vec::new();
        while let Ok(raw) = rx.try_recv() {
            if let Ok(event) = LiveEvent::parse(&raw) {
                if let Some(action) = translator.process_event(&event) {
                    actions.push(action);
                }
            }
        }

        assert_eq!(actions, vec![Action::NavigateUp]);

        // The surviving action converts to the same shape the physical
        // encoder produces.
        let event = translator.action_to_control_event(actions[0]);
        assert_eq!(event.input, ENCODER_INPUT);
        assert_eq!(event.encoder_delta, -1);
        device.stop_watch_events();
    }
}
