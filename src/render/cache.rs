//! Rendition cache
//!
//! A rendition is keyed by the source path and the target size. The cache file
//! is reused while its modification time is not older than the source's and
//! regenerated otherwise. New files are written to a temporary file in the
//! cache directory and renamed into place, so readers never see a partial
//! rendition. Concurrent writers race harmlessly: the bytes for a given source
//! and size are deterministic.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;

use crate::config::ServerConfig;
use crate::error::{RenderError, StorageError};
use crate::render::results::{Rendition, RenditionSource};
use crate::storage::validation::{CleanPath, resolve_existing};

/// Produces and reuses resized JPEG renditions
#[derive(Debug, Clone)]
pub struct RenditionCache {
    data_root: PathBuf,
    cache_root: PathBuf,
    sizes: Vec<u32>,
    quality: u8,
}

impl RenditionCache {
    pub fn new(data_root: PathBuf, cache_root: PathBuf, sizes: Vec<u32>, quality: u8) -> Self {
        Self {
            data_root,
            cache_root,
            sizes,
            quality,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.data_root_path(),
            config.cache_root_path(),
            config.render_sizes.clone(),
            config.render_quality,
        )
    }

    /// Sizes a rendition can be requested at
    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Parses a requested size and checks it against the permitted set.
    pub fn validate_size(&self, raw: Option<&str>) -> Result<u32, RenderError> {
        let raw = raw.ok_or_else(|| RenderError::InvalidSize("missing size".into()))?;
        let size = raw
            .trim()
            .parse::<u32>()
            .map_err(|_| RenderError::InvalidSize(raw.to_string()))?;
        self.check_size(size)?;
        Ok(size)
    }

    fn check_size(&self, size: u32) -> Result<(), RenderError> {
        if self.sizes.contains(&size) {
            Ok(())
        } else {
            Err(RenderError::InvalidSize(size.to_string()))
        }
    }

    /// Location of the cache file for `path` at `size`
    pub fn cache_path(&self, path: &CleanPath, size: u32) -> PathBuf {
        let digest = Sha256::digest(path.as_relative().as_bytes());
        self.cache_root
            .join(format!("{}-{}.jpg", hex::encode(digest), size))
    }

    /// Returns the rendition of the image at `path` for `size`, generating it
    /// when the cache holds nothing up to date.
    pub fn render(&self, path: &CleanPath, size: u32) -> Result<Rendition, RenderError> {
        self.check_size(size)?;

        let real_path = resolve_existing(&self.data_root, path)?;
        let metadata = fs::metadata(&real_path)
            .map_err(|e| StorageError::from_io(e, &path.file_string()))?;
        if !metadata.is_file() {
            return Err(StorageError::NotAFile(path.file_string()).into());
        }
        let modified = metadata.modified()?;

        let cache_file = self.cache_path(path, size);
        if let Some(bytes) = read_if_fresh(&cache_file, modified) {
            debug!("Rendition cache hit for {} at {}", path.file_string(), size);
            return Ok(Rendition {
                bytes,
                source: RenditionSource::Cached,
                modified,
            });
        }

        let bytes = self.generate(&real_path, path, size)?;
        self.store(&cache_file, &bytes)?;

        info!(
            "Rendered {} at {} ({} bytes) into {}",
            path.file_string(),
            size,
            bytes.len(),
            cache_file.display()
        );

        Ok(Rendition {
            bytes,
            source: RenditionSource::Generated,
            modified,
        })
    }

    fn generate(
        &self,
        real_path: &Path,
        path: &CleanPath,
        size: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let image = ImageReader::open(real_path)
            .map_err(|e| StorageError::from_io(e, &path.file_string()))?
            .with_guessed_format()?
            .decode()?;

        let resized = resize_to_fit(image, size);
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

        let mut bytes = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, self.quality))?;
        Ok(bytes)
    }

    /// Writes the rendition through a temporary file and renames it into place.
    fn store(&self, cache_file: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.cache_root)?;
        let mut temp = NamedTempFile::new_in(&self.cache_root)?;
        temp.write_all(bytes)?;
        temp.flush()?;
        temp.persist(cache_file).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Reads the cache file when it is at least as recent as the source.
fn read_if_fresh(cache_file: &Path, source_modified: SystemTime) -> Option<Vec<u8>> {
    let cached_modified = fs::metadata(cache_file).and_then(|m| m.modified()).ok()?;
    if cached_modified < source_modified {
        return None;
    }
    // The file may vanish between stat and read; regenerate in that case
    fs::read(cache_file).ok()
}

/// Scales the image so its larger side equals `size`, never enlarging it.
fn resize_to_fit(image: DynamicImage, size: u32) -> DynamicImage {
    if image.width().max(image.height()) <= size {
        return image;
    }
    image.resize(size, size, FilterType::Lanczos3)
}
