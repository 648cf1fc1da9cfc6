//! Storage result types
//!
//! Defines the records returned by storage operations. Their serde shape is
//! the JSON document served to clients.

use serde::Serialize;
use std::path::PathBuf;
use std::time::SystemTime;

/// Image attributes of a JPEG file with readable EXIF
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<String>,
    /// Pixel dimensions as `[width, height]`
    pub size: (u32, u32),
}

/// A regular file in a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub mimetype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageInfo>,
}

/// A directory in a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    pub name: String,
    pub path: String,
    /// Raw directory size as reported by stat, not the size of its content
    pub size: u64,
}

/// A listed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    File(FileEntry),
    Folder(FolderEntry),
}

/// Contents of a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderListing {
    pub name: String,
    pub path: String,
    pub can_manage: bool,
    pub can_write: bool,
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
}

/// A file prepared for download
#[derive(Debug, Clone)]
pub struct Download {
    pub real_path: PathBuf,
    pub name: String,
    pub mimetype: String,
    pub size: u64,
    pub modified: SystemTime,
}
