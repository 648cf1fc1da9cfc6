//! Storage operations
//!
//! Mutations of the folder tree: create folder, store uploaded file and
//! delete. Each one answers with the refreshed listing of the affected parent.
//!
//! None of these are transactional. If the underlying I/O fails halfway (disk
//! full during an upload, a permission error in the middle of a recursive
//! delete) the tree is left as the filesystem left it and the error is
//! returned as is; nothing is rolled back.

use log::{error, info};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::StorageError;
use crate::storage::inspect::guess_mimetype;
use crate::storage::listing::list_real_directory;
use crate::storage::results::{Download, FolderListing};
use crate::storage::validation::{CleanPath, resolve_existing, validate_name};

/// Resolves `parent` and checks that it is a folder.
fn resolve_parent_dir(data_root: &Path, parent: &CleanPath) -> Result<PathBuf, StorageError> {
    let real_parent = resolve_existing(data_root, parent)?;
    if !real_parent.is_dir() {
        return Err(StorageError::NotADirectory(parent.file_string()));
    }
    Ok(real_parent)
}

/// Creates the folder `name` inside `parent`.
///
/// Existence is checked by the creation itself, so two concurrent requests
/// for the same name cannot both succeed.
pub fn create_folder(
    data_root: &Path,
    parent: &CleanPath,
    name: &str,
    can_manage: bool,
) -> Result<FolderListing, StorageError> {
    let child = parent.join(name)?;
    let real_parent = resolve_parent_dir(data_root, parent)?;
    let real_path = real_parent.join(name);

    fs::create_dir(&real_path).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(child.folder_string()),
        _ => {
            error!("Failed to create folder {}: {}", real_path.display(), e);
            StorageError::from_io(e, &parent.folder_string())
        }
    })?;

    info!(
        "Created folder {} (real: {})",
        child.folder_string(),
        real_path.display()
    );

    list_real_directory(data_root, &real_parent, parent, can_manage)
}

/// Writes `content` to `parent/filename`, replacing any existing file.
///
/// The content lands in a temporary file next to the target and is renamed
/// over it. An existing symlink at that name is replaced, never written
/// through, and readers never see a partial upload.
pub fn store_file<R: Read>(
    data_root: &Path,
    parent: &CleanPath,
    filename: &str,
    content: &mut R,
    can_manage: bool,
) -> Result<FolderListing, StorageError> {
    let child = parent.join(filename)?;
    let real_parent = resolve_parent_dir(data_root, parent)?;
    let real_path = real_parent.join(filename);

    if fs::symlink_metadata(&real_path).is_ok_and(|m| m.is_dir()) {
        return Err(StorageError::AlreadyExists(child.folder_string()));
    }

    let written = write_file(&real_parent, &real_path, content).map_err(|e| {
        error!("Failed to store file {}: {}", real_path.display(), e);
        StorageError::from_io(e, &child.file_string())
    })?;

    info!(
        "Stored file {} (real: {}) - {} bytes",
        child.file_string(),
        real_path.display(),
        written
    );

    list_real_directory(data_root, &real_parent, parent, can_manage)
}

fn write_file<R: Read>(
    real_parent: &Path,
    real_path: &Path,
    content: &mut R,
) -> io::Result<u64> {
    let mut temp = NamedTempFile::new_in(real_parent)?;
    let written = io::copy(content, &mut temp)?;
    temp.flush()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file().set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    temp.persist(real_path).map_err(|e| e.error)?;
    Ok(written)
}

/// Deletes the file or folder at `path`, folders recursively.
///
/// A symlink is removed itself, never its target.
pub fn delete_entry(
    data_root: &Path,
    path: &CleanPath,
    can_manage: bool,
) -> Result<FolderListing, StorageError> {
    if path.is_root() {
        return Err(StorageError::InvalidPath("cannot delete the root folder".into()));
    }

    let parent = path.parent();
    let real_parent = resolve_parent_dir(data_root, &parent)?;
    let real_path = real_parent.join(path.name());

    let metadata = fs::symlink_metadata(&real_path)
        .map_err(|e| StorageError::from_io(e, &path.file_string()))?;

    let result = if metadata.is_dir() {
        fs::remove_dir_all(&real_path)
    } else {
        fs::remove_file(&real_path)
    };
    result.map_err(|e| {
        error!("Failed to delete {}: {}", real_path.display(), e);
        StorageError::from_io(e, &path.file_string())
    })?;

    info!(
        "Deleted {} (real: {})",
        path.file_string(),
        real_path.display()
    );

    list_real_directory(data_root, &real_parent, &parent, can_manage)
}

/// Prepares a file for download
pub fn prepare_download(data_root: &Path, path: &CleanPath) -> Result<Download, StorageError> {
    let real_path = resolve_existing(data_root, path)?;
    let metadata =
        fs::metadata(&real_path).map_err(|e| StorageError::from_io(e, &path.file_string()))?;

    if !metadata.is_file() {
        return Err(StorageError::NotAFile(path.file_string()));
    }

    Ok(Download {
        real_path,
        name: path.name().to_string(),
        mimetype: guess_mimetype(path.name()),
        size: metadata.len(),
        modified: metadata.modified()?,
    })
}
