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

//! Trim sidecar files.
//!
//! A confirmed trim region is persisted next to its recording as
//! `<name>.wav.bdf`: exactly 8 bytes, the start and end sample indices as
//! little-endian u32. A missing or short sidecar means the whole file plays.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::slots::TrimBounds;
use crate::waveform::SelectionRegion;

/// Sidecar payload size: two u32 sample indices.
const SIDECAR_BYTES: usize = 8;

/// The sidecar path for a recording: the WAV path with `.bdf` appended.
pub fn sidecar_path(wav_path: &Path) -> PathBuf {
    let mut path = wav_path.as_os_str().to_os_string();
    path.push(".bdf");
    PathBuf::from(path)
}

/// Persists a trim region next to its recording.
pub fn write(wav_path: &Path, region: &SelectionRegion) -> io::Result<()> {
    let path = sidecar_path(wav_path);
    let mut file = fs::File::create(&path)?;
    file.write_all(&region.start.to_le_bytes())?;
    file.write_all(&region.end.to_le_bytes())?;
    debug!(
        path = %path.display(),
        start = region.start,
        end = region.end,
        "Trim sidecar written."
    );
    Ok(())
}

/// Loads the trim region for a recording. A missing or undersized sidecar
/// reads as None: the recording plays in full.
pub fn read(wav_path: &Path) -> io::Result<Option<TrimBounds>> {
    let path = sidecar_path(wav_path);
    let mut file = match fs::File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut bytes = [0u8; SIDECAR_BYTES];
    if let Err(e) = file.read_exact(&mut bytes) {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            warn!(path = %path.display(), "Sidecar too small, playing full file.");
            return Ok(None);
        }
        return Err(e);
    }

    Ok(Some(TrimBounds {
        start: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        end: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    }))
}

/// Removes the sidecar for a recording, if one exists.
pub fn remove(wav_path: &Path) -> io::Result<()> {
    let path = sidecar_path(wav_path);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sidecar_path_appends_extension() {
        assert_eq!(
            sidecar_path(Path::new("/RECORDINGS/BrightWave.wav")),
            PathBuf::from("/RECORDINGS/BrightWave.wav.bdf")
        );
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let wav_path = dir.path().join("take.wav");
        let region = SelectionRegion {
            start: 1234,
            end: 0xDEAD_BEEF,
        };

        write(&wav_path, &region).expect("write");

        let bytes = fs::read(sidecar_path(&wav_path)).expect("read raw");
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[0..4], &1234u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0xDEAD_BEEFu32.to_le_bytes());

        let bounds = read(&wav_path).expect("read").expect("bounds");
        assert_eq!(bounds.start, 1234);
        assert_eq!(bounds.end, 0xDEAD_BEEF);
    }

    #[test]
    fn test_missing_sidecar_reads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bounds = read(&dir.path().join("nothing.wav")).expect("read");
        assert!(bounds.is_none());
    }

    #[test]
    fn test_short_sidecar_reads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let wav_path = dir.path().join("short.wav");
        fs::write(sidecar_path(&wav_path), [1u8, 2, 3, 4, 5, 6, 7]).expect("write short");

        let bounds = read(&wav_path).expect("read");
        assert!(bounds.is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let wav_path = dir.path().join("gone.wav");
        write(&wav_path, &SelectionRegion { start: 0, end: 10 }).expect("write");

        remove(&wav_path).expect("remove");
        assert!(read(&wav_path).expect("read").is_none());
        remove(&wav_path).expect("remove again");
    }
}
