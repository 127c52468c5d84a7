//! ZIP container assembly.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};

/// Write `entries` into a ZIP container and return its bytes
///
/// Every entry is stored uncompressed under its name, in the given order.
/// An empty slice produces a valid archive with no entries.
///
/// # Errors
///
/// Returns [`Error::Assembly`] if the container cannot be written. Nothing is
/// returned in that case; there is no partial output.
pub fn write_archive(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, bytes) in entries {
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .large_file(bytes.len() as u64 >= u64::from(u32::MAX));

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| assembly_error(format!("failed to create {name} in zip: {e}")))?;
        writer
            .write_all(bytes)
            .map_err(|e| assembly_error(format!("failed to write {name} in zip: {e}")))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| assembly_error(format!("failed to close zip archive: {e}")))?;

    Ok(cursor.into_inner())
}

fn assembly_error(reason: String) -> Error {
    Error::Assembly { reason }
}
