use std::path::Path;

use anyhow::{Context, Result};
use lofty::file::AudioFile;
use lofty::probe::Probe;
use tracing::warn;

/// Whole seconds of audio in the file, or 0 when the format can't be read.
pub fn probe_duration(path: &Path) -> u32 {
    match read_duration(path) {
        Ok(seconds) => seconds,
        Err(e) => {
            warn!("Error getting audio duration for {:?}: {:#}", path, e);
            0
        }
    }
}

fn read_duration(path: &Path) -> Result<u32> {
    let tagged_file = Probe::open(path)
        .context("Failed to open audio file")?
        .guess_file_type()
        .context("Failed to guess audio format")?
        .read()
        .context("Failed to read audio properties")?;

    let seconds = tagged_file.properties().duration().as_secs();
    Ok(u32::try_from(seconds).unwrap_or(u32::MAX))
}
