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

use super::ConfigError;

/// Pads and knobs exposed by the control surface map.
pub const PAD_COUNT: usize = 8;
pub const KNOB_COUNT: usize = 8;

// Stock layout for the Akai MPK Mini.
const DEFAULT_PAD_NOTES: [u8; PAD_COUNT] = [37, 36, 42, 54, 40, 38, 46, 44];
const DEFAULT_KNOB_CCS: [u8; KNOB_COUNT] = [1, 2, 3, 4, 5, 6, 7, 8];

/// A YAML representation of the MIDI control surface layout.
#[derive(Deserialize, Clone)]
pub struct Controller {
    /// Note numbers of the eight pads, in pad order.
    #[serde(default = "default_pad_notes")]
    pad_notes: Vec<u8>,

    /// CC numbers of the eight knobs, in knob order.
    #[serde(default = "default_knob_ccs")]
    knob_ccs: Vec<u8>,
}

fn default_pad_notes() -> Vec<u8> {
    DEFAULT_PAD_NOTES.to_vec()
}

fn default_knob_ccs() -> Vec<u8> {
    DEFAULT_KNOB_CCS.to_vec()
}

impl Default for Controller {
    fn default() -> Self {
        Controller {
            pad_notes: default_pad_notes(),
            knob_ccs: default_knob_ccs(),
        }
    }
}

impl Controller {
    /// The pad note layout as a fixed-size table.
    pub fn pad_layout(&self) -> Result<[u8; PAD_COUNT], ConfigError> {
        self.pad_notes
            .as_slice()
            .try_into()
            .map_err(|_| ConfigError::WrongMapSize {
                kind: "pad note",
                expected: PAD_COUNT,
                got: self.pad_notes.len(),
            })
    }

    /// The knob CC layout as a fixed-size table.
    pub fn knob_layout(&self) -> Result<[u8; KNOB_COUNT], ConfigError> {
        self.knob_ccs
            .as_slice()
            .try_into()
            .map_err(|_| ConfigError::WrongMapSize {
                kind: "knob CC",
                expected: KNOB_COUNT,
                got: self.knob_ccs.len(),
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_layout_is_the_stock_map() {
        let controller = Controller::default();
        assert_eq!(controller.pad_layout().expect("pads"), DEFAULT_PAD_NOTES);
        assert_eq!(controller.knob_layout().expect("knobs"), DEFAULT_KNOB_CCS);
    }

    #[test]
    fn test_wrong_length_layout_is_rejected() {
        let controller = Controller {
            pad_notes: vec![1, 2, 3],
            knob_ccs: default_knob_ccs(),
        };
        assert!(matches!(
            controller.pad_layout(),
            Err(ConfigError::WrongMapSize {
                kind: "pad note",
                expected: PAD_COUNT,
                got: 3,
            })
        ));
    }
}
