//! Rendition result types

use std::time::SystemTime;

/// Where the bytes of a rendition came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenditionSource {
    /// Served from an up-to-date cache file
    Cached,
    /// Freshly resized and written to the cache
    Generated,
}

/// A resized JPEG ready to be served
#[derive(Debug, Clone)]
pub struct Rendition {
    pub bytes: Vec<u8>,
    pub source: RenditionSource,
    /// Modification time of the source image
    pub modified: SystemTime,
}
