//! Folder listing
//!
//! Enumerates the immediate children of a folder into a `FolderListing`.

use log::{debug, error, info};
use std::fs;
use std::path::Path;

use crate::error::StorageError;
use crate::storage::inspect::inspect_entry;
use crate::storage::results::{Entry, FolderListing};
use crate::storage::validation::{CleanPath, is_contained, resolve_existing};

/// Lists the folder at `path` under `data_root`.
///
/// `can_manage` is decided by the caller and copied into the listing.
/// Children that cannot be inspected, for instance because they were removed
/// while the folder was being read, are left out, and so are symlinks whose
/// target lies outside the data root.
pub fn list_directory(
    data_root: &Path,
    path: &CleanPath,
    can_manage: bool,
) -> Result<FolderListing, StorageError> {
    let real_path = resolve_existing(data_root, path)?;
    list_real_directory(data_root, &real_path, path, can_manage)
}

/// Lists an already resolved folder.
pub(crate) fn list_real_directory(
    data_root: &Path,
    real_path: &Path,
    path: &CleanPath,
    can_manage: bool,
) -> Result<FolderListing, StorageError> {
    let root = data_root
        .canonicalize()
        .map_err(|e| StorageError::from_io(e, "/"))?;

    let metadata =
        fs::metadata(real_path).map_err(|e| StorageError::from_io(e, &path.folder_string()))?;
    if !metadata.is_dir() {
        return Err(StorageError::NotADirectory(path.file_string()));
    }

    let entries = fs::read_dir(real_path).map_err(|e| {
        error!(
            "Failed to list directory {} (real: {}): {}",
            path.folder_string(),
            real_path.display(),
            e
        );
        StorageError::from_io(e, &path.folder_string())
    })?;

    let mut folders = Vec::new();
    let mut files = Vec::new();

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            debug!("Skipping non UTF-8 entry in {}", real_path.display());
            continue;
        };
        let Ok(child) = path.join(name) else {
            debug!("Skipping unrepresentable entry {:?}", name);
            continue;
        };

        let is_symlink = entry.file_type().is_ok_and(|t| t.is_symlink());
        if is_symlink && !is_contained(&root, &entry.path()) {
            debug!("Skipping {}: link leaves the data root", child.file_string());
            continue;
        }

        match inspect_entry(&entry.path(), &child) {
            Ok(Entry::Folder(folder)) => folders.push(folder),
            Ok(Entry::File(file)) => files.push(file),
            Err(e) => debug!("Skipping {}: {}", child.file_string(), e),
        }
    }

    folders.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));

    info!(
        "Listed directory {} (real: {}) - {} folders, {} files",
        path.folder_string(),
        real_path.display(),
        folders.len(),
        files.len()
    );

    Ok(FolderListing {
        name: path.name().to_string(),
        path: path.folder_string(),
        can_manage,
        can_write: can_manage,
        folders,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::validation::clean;
    use tempfile::TempDir;

    #[test]
    fn lists_empty_root() {
        let root = TempDir::new().unwrap();
        let listing = list_directory(root.path(), &CleanPath::root(), true).unwrap();

        assert_eq!(listing.name, "");
        assert_eq!(listing.path, "/");
        assert!(listing.can_manage);
        assert!(listing.can_write);
        assert!(listing.folders.is_empty());
        assert!(listing.files.is_empty());
    }

    #[test]
    fn sorts_folders_and_files_by_name() {
        let root = TempDir::new().unwrap();
        for dir in ["b", "B", "a"] {
            fs::create_dir(root.path().join(dir)).unwrap();
        }
        for file in ["z.txt", "Y.txt", "m.txt"] {
            fs::write(root.path().join(file), b"x").unwrap();
        }

        let listing = list_directory(root.path(), &CleanPath::root(), false).unwrap();
        let folders: Vec<_> = listing.folders.iter().map(|f| f.name.as_str()).collect();
        let files: Vec<_> = listing.files.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(folders, ["B", "a", "b"]);
        assert_eq!(files, ["Y.txt", "m.txt", "z.txt"]);
        assert!(!listing.can_manage);
        assert!(!listing.can_write);
    }

    #[test]
    fn lists_nested_folder() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("Foo/Bar")).unwrap();
        fs::write(root.path().join("Foo/note.txt"), b"hi").unwrap();

        let listing = list_directory(root.path(), &clean("/Foo/").unwrap(), true).unwrap();
        assert_eq!(listing.name, "Foo");
        assert_eq!(listing.path, "/Foo/");
        assert_eq!(listing.folders[0].path, "/Foo/Bar/");
        assert_eq!(listing.files[0].path, "/Foo/note.txt");
    }

    #[test]
    fn file_is_not_a_directory() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("test.txt"), b"x").unwrap();

        let result = list_directory(root.path(), &clean("test.txt").unwrap(), true);
        assert!(matches!(result, Err(StorageError::NotADirectory(_))));
    }

    #[test]
    fn missing_folder_is_not_found() {
        let root = TempDir::new().unwrap();
        let result = list_directory(root.path(), &clean("nope").unwrap(), true);
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn skips_links_leaving_the_root() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("victim.txt"), b"original").unwrap();
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("real.txt"), b"x").unwrap();
        std::os::unix::fs::symlink(outside.path().join("victim.txt"), root.path().join("evil.txt"))
            .unwrap();
        std::os::unix::fs::symlink(outside.path(), root.path().join("elsewhere")).unwrap();
        std::os::unix::fs::symlink(root.path().join("real.txt"), root.path().join("alias.txt"))
            .unwrap();

        let listing = list_directory(root.path(), &CleanPath::root(), true).unwrap();
        let files: Vec<_> = listing.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(files, ["alias.txt", "real.txt"]);
        assert!(listing.folders.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn skips_dangling_children() {
        let root = TempDir::new().unwrap();
        std::os::unix::fs::symlink(root.path().join("gone"), root.path().join("dangling"))
            .unwrap();
        fs::write(root.path().join("kept.txt"), b"x").unwrap();

        let listing = list_directory(root.path(), &CleanPath::root(), true).unwrap();
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].name, "kept.txt");
    }
}
