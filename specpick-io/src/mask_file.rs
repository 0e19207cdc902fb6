//! Selection mask persistence.
//!
//! Masks are stored as JSON: `{"shape": [ny, nx], "pixels": [[y, x], ...]}`.

use crate::Result;
use specpick_core::SelectionMask;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Reads a mask written by [`save_mask`].
///
/// # Errors
/// Returns an error if the file cannot be read, is not valid JSON, or lists a
/// pixel outside the stated shape.
pub fn load_mask<P: AsRef<Path>>(path: P) -> Result<SelectionMask> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mask: SelectionMask = serde_json::from_reader(reader)?;
    log::debug!(
        "loaded mask {} with {} selected spaxel(s)",
        path.as_ref().display(),
        mask.count()
    );
    Ok(mask)
}

/// Writes `mask` as JSON.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn save_mask<P: AsRef<Path>>(path: P, mask: &SelectionMask) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, mask)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
