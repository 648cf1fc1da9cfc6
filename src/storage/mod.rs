//! File system storage management
//!
//! Path validation, entry inspection, folder listings and mutations of the
//! tree under the data root.

pub mod exif;
pub mod inspect;
pub mod listing;
pub mod operations;
pub mod results;
pub mod validation;

pub use listing::list_directory;
pub use operations::{create_folder, delete_entry, prepare_download, store_file};
pub use results::{Download, Entry, FileEntry, FolderEntry, FolderListing, ImageInfo};
pub use validation::{CleanPath, clean};
