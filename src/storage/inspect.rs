//! Entry inspection
//!
//! Builds the metadata record for a single file or folder.

use log::debug;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use crate::error::StorageError;
use crate::storage::exif;
use crate::storage::results::{Entry, FileEntry, FolderEntry};
use crate::storage::validation::CleanPath;

const JPEG_MIMETYPE: &str = "image/jpeg";

/// Guesses a mimetype from the file extension.
pub fn guess_mimetype(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Inspects the entry at `real_path`, whose location relative to the data
/// root is `path`.
///
/// JPEG files additionally get their image attributes, read from the head of
/// the file only; failing to read them leaves `image` empty rather than
/// failing the inspection.
pub fn inspect_entry(real_path: &Path, path: &CleanPath) -> Result<Entry, StorageError> {
    let metadata =
        fs::metadata(real_path).map_err(|e| StorageError::from_io(e, &path.file_string()))?;
    let name = path.name().to_string();

    if metadata.is_dir() {
        return Ok(Entry::Folder(FolderEntry {
            name,
            path: path.folder_string(),
            size: metadata.len(),
        }));
    }

    let mimetype = guess_mimetype(&name);
    let image = if mimetype == JPEG_MIMETYPE {
        match read_head(real_path) {
            Ok(bytes) => exif::image_info(&bytes),
            Err(e) => {
                debug!("Could not read {} for EXIF: {}", real_path.display(), e);
                None
            }
        }
    } else {
        None
    };

    Ok(Entry::File(FileEntry {
        name,
        path: path.file_string(),
        size: metadata.len(),
        mimetype,
        image,
    }))
}

fn read_head(real_path: &Path) -> io::Result<Vec<u8>> {
    let mut head = Vec::new();
    File::open(real_path)?
        .take(exif::HEADER_READ_LIMIT)
        .read_to_end(&mut head)?;
    Ok(head)
}
