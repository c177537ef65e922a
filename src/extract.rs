//! Sample-name extraction from the detector metadata file.
//!
//! The instrument writes the sample name into a fixed 120 byte window starting at byte 858.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use camino::Utf8Path;
use encoding_rs::WINDOWS_1252;

use crate::error::SorterError;

pub const SAMPLE_NAME_OFFSET: u64 = 858;
pub const SAMPLE_NAME_LEN: usize = 120;

/// Byte values Windows-1252 leaves unassigned.
const UNDEFINED_CP1252: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Reads the raw sample-name window of `path`.
///
/// A file that ends before or inside the window yields whatever text is available.
pub fn read_sample_name(path: &Utf8Path) -> Result<String, SorterError> {
    let map_err = |err: std::io::Error| SorterError::MetadataRead {
        path: path.as_std_path().to_path_buf(),
        message: err.to_string(),
    };

    let mut file = File::open(path.as_std_path()).map_err(map_err)?;
    let len = file.metadata().map_err(map_err)?.len();
    if len <= SAMPLE_NAME_OFFSET {
        return Ok(String::new());
    }

    file.seek(SeekFrom::Start(SAMPLE_NAME_OFFSET))
        .map_err(map_err)?;
    let mut window = Vec::with_capacity(SAMPLE_NAME_LEN);
    file.take(SAMPLE_NAME_LEN as u64)
        .read_to_end(&mut window)
        .map_err(map_err)?;
    Ok(decode_window(&window))
}

/// Decodes the sample-name window out of a whole metadata buffer.
pub fn decode_sample_window(buffer: &[u8]) -> String {
    let start = (SAMPLE_NAME_OFFSET as usize).min(buffer.len());
    let end = (start + SAMPLE_NAME_LEN).min(buffer.len());
    decode_window(&buffer[start..end])
}

fn decode_window(window: &[u8]) -> String {
    let defined = window
        .iter()
        .copied()
        .filter(|byte| !UNDEFINED_CP1252.contains(byte))
        .collect::<Vec<_>>();
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(&defined);
    text.into_owned()
}
