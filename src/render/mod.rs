//! Image renditions
//!
//! Resized JPEG copies of source images, derived on demand and kept in a
//! disposable cache directory.

pub mod cache;
pub mod results;

pub use cache::RenditionCache;
pub use results::{Rendition, RenditionSource};
