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
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

mod controller;
mod recording;

pub use controller::{Controller, KNOB_COUNT, PAD_COUNT};
pub use recording::Recording;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse config file: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("expected {expected} {kind} entries, got {got}")]
    WrongMapSize {
        kind: &'static str,
        expected: usize,
        got: usize,
    },
}

/// The device configuration.
#[derive(Deserialize, Clone, Default)]
pub struct Config {
    /// Recording parameters.
    #[serde(default)]
    recording: Recording,

    /// The MIDI controller surface layout.
    #[serde(default)]
    controller: Controller,
}

impl Config {
    /// Parses the configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Config, ConfigError> {
        let config: Config = serde_yml::from_str(&fs::read_to_string(path)?)?;
        Ok(config)
    }

    /// The recording configuration.
    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// The controller configuration.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            "recording:\n  sample_rate: 22050\n  threshold: 0.2\n  recordings_dir: /SOUNDS\ncontroller:\n  pad_notes: [1, 2, 3, 4, 5, 6, 7, 8]\n  knob_ccs: [10, 11, 12, 13, 14, 15, 16, 17]\n"
        )
        .expect("write");

        let config = Config::deserialize(file.path()).expect("deserialize");
        assert_eq!(config.recording().sample_rate(), 22050);
        assert_eq!(config.recording().threshold(), 0.2);
        assert_eq!(config.recording().recordings_dir(), "/SOUNDS");
        assert_eq!(config.controller().pad_layout().expect("pads")[0], 1);
        assert_eq!(config.controller().knob_layout().expect("knobs")[7], 17);
    }

    #[test]
    fn test_defaults_apply_when_sections_missing() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "recording:\n  threshold: 0.3\n").expect("write");

        let config = Config::deserialize(file.path()).expect("deserialize");
        assert_eq!(config.recording().sample_rate(), 44100);
        assert_eq!(config.recording().channel_count(), 1);
        assert_eq!(config.recording().threshold(), 0.3);
        // The controller falls back to the stock pad layout.
        assert_eq!(config.controller().pad_layout().expect("pads")[0], 37);
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(matches!(
            Config::deserialize(Path::new("/does/not/exist.yaml")),
            Err(ConfigError::Io(_))
        ));
    }
}
