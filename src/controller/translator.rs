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

//! Context-aware MIDI to logical action translation.
//!
//! A class-compliant pad/knob controller drives the same state machines as
//! the physical controls. Pads map to navigation, transport and slot
//! triggers depending on the active context. Knobs are treated as relative:
//! only the direction of each CC value change matters, so any controller
//! works regardless of its absolute knob positions. The first CC message
//! after a context switch is discarded; with no prior value there is no
//! direction to derive.

use midly::{live::LiveEvent, MidiMessage};
use tracing::trace;

use crate::config;

use super::{
    Action, Context, ControlEvent, ENCODER_INPUT, FUNCTION_BUTTON, SELECT_BUTTON, TRANSPORT_BUTTON,
};

/// Knob roles on the recorder screen.
const KNOB_NAVIGATE: usize = 0;
const KNOB_TRIM_START: usize = 4;
const KNOB_TRIM_END: usize = 5;
const KNOB_ZOOM: usize = 6;
const KNOB_SELECTION: usize = 7;

/// First pad that fires playback slots on the live screen.
const FIRST_TRIGGER_PAD: usize = 4;

/// Translates raw MIDI events into logical actions for the active context.
pub struct MidiEventTranslator {
    context: Context,
    pad_notes: [u8; config::PAD_COUNT],
    knob_ccs: [u8; config::KNOB_COUNT],
    last_cc: [Option<u8>; 128],
}

impl MidiEventTranslator {
    /// Creates a translator from the configured surface layout.
    pub fn new(controller: &config::Controller) -> Result<MidiEventTranslator, config::ConfigError> {
        Ok(MidiEventTranslator {
            context: Context::Home,
            pad_notes: controller.pad_layout()?,
            knob_ccs: controller.knob_layout()?,
            last_cc: [None; 128],
        })
    }

    /// The active context.
    pub fn context(&self) -> Context {
        self.context
    }

    /// Switches the active context and clears all per-CC tracking, so stale
    /// deltas never leak across screens.
    pub fn set_context(&mut self, context: Context) {
        self.context = context;
        self.last_cc = [None; 128];
    }

    /// Maps a raw MIDI event to a logical action. Unmapped notes and CCs,
    /// program change and pitch bend are accepted but produce nothing.
    pub fn process_event(&mut self, event: &LiveEvent) -> Option<Action> {
        let message = match event {
            LiveEvent::Midi { message, .. } => message,
            _ => return None,
        };

        match message {
            MidiMessage::NoteOn { key, vel } if u8::from(*vel) > 0 => {
                self.note_on(u8::from(*key), u8::from(*vel))
            }
            // Note On with velocity 0 is a Note Off.
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                self.note_off(u8::from(*key))
            }
            MidiMessage::Controller { controller, value } => {
                self.control_change(u8::from(*controller), u8::from(*value))
            }
            _ => None,
        }
    }

    /// Converts a logical action into the event shape the physical controls
    /// produce, so downstream state machines need only one input format.
    pub fn action_to_control_event(&self, action: Action) -> ControlEvent {
        let encoder = |direction: i8| ControlEvent {
            input: ENCODER_INPUT,
            encoder_delta: direction,
            ..ControlEvent::default()
        };
        let button = |input: u8, pressed: bool| ControlEvent {
            input,
            pressed,
            ..ControlEvent::default()
        };

        match action {
            Action::NavigateUp => encoder(-1),
            Action::NavigateDown => encoder(1),
            Action::Encoder { direction } | Action::Selection { direction } => encoder(direction),
            Action::Select { pressed } | Action::Back { pressed } => {
                button(SELECT_BUTTON, pressed)
            }
            Action::TransportToggle { pressed } => button(TRANSPORT_BUTTON, pressed),
            Action::TrimStart { direction } => ControlEvent {
                select_held: true,
                ..encoder(direction)
            },
            Action::TrimEnd { direction } => ControlEvent {
                transport_held: true,
                ..encoder(direction)
            },
            Action::Zoom { direction } => ControlEvent {
                function_held: true,
                ..encoder(direction)
            },
            // Slot triggers go to the playback engine, not the UI; there is
            // no physical control equivalent.
            Action::TriggerSlot { .. } => ControlEvent::default(),
        }
    }

    fn pad_index(&self, note: u8) -> Option<usize> {
        self.pad_notes.iter().position(|&n| n == note)
    }

    fn knob_index(&self, cc: u8) -> Option<usize> {
        self.knob_ccs.iter().position(|&n| n == cc)
    }

    fn note_on(&self, note: u8, velocity: u8) -> Option<Action> {
        let pad = self.pad_index(note)?;
        match self.context {
            Context::Home => match pad {
                0 => Some(Action::NavigateUp),
                1 => Some(Action::NavigateDown),
                2 => Some(Action::Select { pressed: true }),
                3 => Some(Action::Back { pressed: true }),
                _ => None,
            },
            Context::Recorder => match pad {
                0 => Some(Action::TransportToggle { pressed: true }),
                _ => None,
            },
            Context::Live => match pad {
                0 => Some(Action::NavigateUp),
                1 => Some(Action::NavigateDown),
                2 => Some(Action::Select { pressed: true }),
                3 => Some(Action::Back { pressed: true }),
                pad => Some(Action::TriggerSlot {
                    index: (pad - FIRST_TRIGGER_PAD) as u8,
                    velocity,
                }),
            },
        }
    }

    fn note_off(&self, note: u8) -> Option<Action> {
        let pad = self.pad_index(note)?;
        match self.context {
            Context::Home | Context::Live => match pad {
                2 => Some(Action::Select { pressed: false }),
                3 => Some(Action::Back { pressed: false }),
                _ => None,
            },
            Context::Recorder => match pad {
                0 => Some(Action::TransportToggle { pressed: false }),
                _ => None,
            },
        }
    }

    fn control_change(&mut self, cc: u8, value: u8) -> Option<Action> {
        let knob = self.knob_index(cc)?;

        let last = self.last_cc[cc as usize].replace(value);
        let last = match last {
            Some(last) => last,
            None => {
                // No prior value: an absolute CC position carries no
                // direction, so the first message only seeds the tracker.
                trace!(cc, value, "First CC after context switch, discarded.");
                return None;
            }
        };

        let delta = i16::from(value) - i16::from(last);
        if delta == 0 {
            return None;
        }
        // Direction only: a soft-takeover knob jumping by 5 means the same
        // single step as one moving by 1.
        let direction: i8 = if delta > 0 { 1 } else { -1 };

        match self.context {
            Context::Home | Context::Live => match knob {
                KNOB_NAVIGATE => Some(Action::Encoder { direction }),
                _ => None,
            },
            Context::Recorder => match knob {
                KNOB_NAVIGATE => Some(Action::Encoder { direction }),
                KNOB_TRIM_START => Some(Action::TrimStart { direction }),
                KNOB_TRIM_END => Some(Action::TrimEnd { direction }),
                KNOB_ZOOM => Some(Action::Zoom { direction }),
                KNOB_SELECTION => Some(Action::Selection { direction }),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Controller;

    fn translator() -> MidiEventTranslator {
        MidiEventTranslator::new(&Controller::default()).expect("translator")
    }

    fn note_on(key: u8, vel: u8) -> LiveEvent<'static> {
        LiveEvent::Midi {
            channel: 0.into(),
            message: MidiMessage::NoteOn {
                key: key.into(),
                vel: vel.into(),
            },
        }
    }

    fn note_off(key: u8) -> LiveEvent<'static> {
        LiveEvent::Midi {
            channel: 0.into(),
            message: MidiMessage::NoteOff {
                key: key.into(),
                vel: 0.into(),
            },
        }
    }

    fn cc(controller: u8, value: u8) -> LiveEvent<'static> {
        LiveEvent::Midi {
            channel: 0.into(),
            message: MidiMessage::Controller {
                controller: controller.into(),
                value: value.into(),
            },
        }
    }

    #[test]
    fn test_home_pads_navigate() {
        let mut translator = translator();
        // Stock layout: pad 0 is note 37, pad 2 is note 42.
        assert_eq!(
            translator.process_event(&note_on(37, 100)),
            Some(Action::NavigateUp)
        );
        assert_eq!(
            translator.process_event(&note_on(42, 100)),
            Some(Action::Select { pressed: true })
        );
        assert_eq!(
            translator.process_event(&note_off(42)),
            Some(Action::Select { pressed: false })
        );
    }

    #[test]
    fn test_note_on_velocity_zero_is_note_off() {
        let mut translator = translator();
        assert_eq!(
            translator.process_event(&note_on(42, 0)),
            Some(Action::Select { pressed: false })
        );
    }

    #[test]
    fn test_unmapped_inputs_are_inert() {
        let mut translator = translator();
        assert_eq!(translator.process_event(&note_on(99, 100)), None);
        assert_eq!(translator.process_event(&cc(99, 64)), None);

        let program_change = LiveEvent::Midi {
            channel: 0.into(),
            message: MidiMessage::ProgramChange { program: 5.into() },
        };
        assert_eq!(translator.process_event(&program_change), None);

        let pitch_bend = LiveEvent::Midi {
            channel: 0.into(),
            message: MidiMessage::PitchBend {
                bend: midly::PitchBend::from_int(0),
            },
        };
        assert_eq!(translator.process_event(&pitch_bend), None);
    }

    #[test]
    fn test_first_cc_after_context_switch_is_discarded() {
        let mut translator = translator();
        // Knob 0 is CC 1 in the stock layout.
        assert_eq!(translator.process_event(&cc(1, 64)), None);
        assert_eq!(
            translator.process_event(&cc(1, 65)),
            Some(Action::Encoder { direction: 1 })
        );

        // Switching context forgets every tracked value.
        translator.set_context(Context::Recorder);
        assert_eq!(translator.process_event(&cc(1, 70)), None);
        assert_eq!(
            translator.process_event(&cc(1, 69)),
            Some(Action::Encoder { direction: -1 })
        );
    }

    #[test]
    fn test_cc_direction_ignores_magnitude() {
        let mut translator = translator();
        assert_eq!(translator.process_event(&cc(1, 60)), None);
        let small_step = translator.process_event(&cc(1, 61));
        // Jump back to the seed value, then take a large step.
        assert_eq!(
            translator.process_event(&cc(1, 60)),
            Some(Action::Encoder { direction: -1 })
        );
        let large_step = translator.process_event(&cc(1, 65));
        assert_eq!(small_step, large_step);
        assert_eq!(large_step, Some(Action::Encoder { direction: 1 }));
    }

    #[test]
    fn test_repeated_cc_value_produces_nothing() {
        let mut translator = translator();
        assert_eq!(translator.process_event(&cc(1, 64)), None);
        assert_eq!(translator.process_event(&cc(1, 64)), None);
    }

    #[test]
    fn test_recorder_knobs_drive_trim_editing() {
        let mut translator = translator();
        translator.set_context(Context::Recorder);

        // Knobs 5..8 are CCs 5..8 in the stock layout; seed each first.
        for (cc_number, expected) in [
            (5u8, Action::TrimStart { direction: 1 }),
            (6, Action::TrimEnd { direction: 1 }),
            (7, Action::Zoom { direction: 1 }),
            (8, Action::Selection { direction: 1 }),
        ] {
            assert_eq!(translator.process_event(&cc(cc_number, 10)), None);
            assert_eq!(translator.process_event(&cc(cc_number, 11)), Some(expected));
        }
    }

    #[test]
    fn test_recorder_pad_toggles_transport() {
        let mut translator = translator();
        translator.set_context(Context::Recorder);

        assert_eq!(
            translator.process_event(&note_on(37, 127)),
            Some(Action::TransportToggle { pressed: true })
        );
        assert_eq!(
            translator.process_event(&note_off(37)),
            Some(Action::TransportToggle { pressed: false })
        );
    }

    #[test]
    fn test_live_pads_trigger_slots() {
        let mut translator = translator();
        translator.set_context(Context::Live);

        // Pads 4..8 are notes 40, 38, 46, 44 in the stock layout.
        assert_eq!(
            translator.process_event(&note_on(40, 90)),
            Some(Action::TriggerSlot {
                index: 0,
                velocity: 90
            })
        );
        assert_eq!(
            translator.process_event(&note_on(44, 70)),
            Some(Action::TriggerSlot {
                index: 3,
                velocity: 70
            })
        );
        // Releasing a trigger pad does nothing.
        assert_eq!(translator.process_event(&note_off(40)), None);
    }

    #[test]
    fn test_action_to_control_event_shapes() {
        let translator = translator();

        let zoom = translator.action_to_control_event(Action::Zoom { direction: -1 });
        assert_eq!(zoom.input, ENCODER_INPUT);
        assert_eq!(zoom.encoder_delta, -1);
        assert!(zoom.function_held);
        assert!(!zoom.select_held && !zoom.transport_held);

        let trim_start = translator.action_to_control_event(Action::TrimStart { direction: 1 });
        assert!(trim_start.select_held);
        let trim_end = translator.action_to_control_event(Action::TrimEnd { direction: 1 });
        assert!(trim_end.transport_held);

        let up = translator.action_to_control_event(Action::NavigateUp);
        assert_eq!(up.encoder_delta, -1);
        let down = translator.action_to_control_event(Action::NavigateDown);
        assert_eq!(down.encoder_delta, 1);

        let select = translator.action_to_control_event(Action::Select { pressed: true });
        assert_eq!(select.input, SELECT_BUTTON);
        assert!(select.pressed);

        let transport =
            translator.action_to_control_event(Action::TransportToggle { pressed: true });
        assert_eq!(transport.input, TRANSPORT_BUTTON);
        assert_eq!(FUNCTION_BUTTON, 3);
    }
}
