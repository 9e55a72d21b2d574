//! Uploaded image storage and WebP conversion
//!
//! Originals are stored under `<image_dir>/<category>/<sanitized name>` and a
//! downscaled WebP copy is written next to them as `<stem>.webp`. The WebP
//! path only depends on the category and file name, so converting the same
//! upload twice reuses the first result. Decoding and resizing go through
//! `image`; the lossy WebP encoding goes through libwebp.

use crate::category::CategoryType;
use crate::error::{StoreError, StoreResult};
use image::imageops::FilterType;
use image::ImageReader;
use std::path::{Path, PathBuf};

/// Default cap for the long edge of converted images, in pixels
pub const DEFAULT_MAX_EDGE: u32 = 1600;

/// Lossy WebP quality (0-100)
pub const WEBP_QUALITY: f32 = 80.0;

/// An uploaded image file as received from the client
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Uploads without a file name are treated as "no image selected"
    pub fn is_empty(&self) -> bool {
        self.filename.trim().is_empty()
    }
}

/// Reduce a client-supplied file name to a safe, ASCII-only base name.
///
/// Path separators become spaces, whitespace runs become `_`, every
/// character outside `[A-Za-z0-9_.-]` is dropped and leading or trailing
/// dots and underscores are stripped. `"../../etc/passwd"` becomes
/// `"etc_passwd"`. The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(|c| c.is_ascii())
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Stores uploads and produces compressed WebP copies
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    image_dir: PathBuf,
    max_edge: u32,
}

impl ImageProcessor {
    /// Create a processor rooted at `image_dir`
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
            max_edge: DEFAULT_MAX_EDGE,
        }
    }

    /// Override the long-edge cap (values below 1 are clamped to 1)
    pub fn with_max_edge(mut self, max_edge: u32) -> Self {
        self.max_edge = max_edge.max(1);
        self
    }

    /// Directory holding the images of one category
    pub fn category_dir(&self, category: CategoryType) -> PathBuf {
        self.image_dir.join(category.as_str())
    }

    /// Deterministic WebP location for a stored file name
    pub fn webp_path(&self, category: CategoryType, filename: &str) -> PathBuf {
        let stem = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        self.category_dir(category).join(format!("{}.webp", stem))
    }

    /// Write the original upload under its sanitized name and return its path
    pub fn save_upload(&self, category: CategoryType, upload: &ImageUpload) -> StoreResult<PathBuf> {
        let filename = secure_filename(&upload.filename);
        if filename.is_empty() {
            return Err(StoreError::Validation(format!(
                "image file name '{}' has no usable characters",
                upload.filename
            )));
        }

        let dir = self.category_dir(category);
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(&filename);
        std::fs::write(&path, &upload.bytes)?;
        log::info!(
            "Saved uploaded image {} ({} bytes)",
            path.display(),
            upload.bytes.len()
        );
        Ok(path)
    }

    /// Downscale and re-encode `original` as WebP.
    ///
    /// Returns the existing target without touching it if it is already there.
    pub fn compress_to_webp(&self, original: &Path, category: CategoryType) -> StoreResult<PathBuf> {
        let filename = original
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target = self.webp_path(category, &filename);

        if target.exists() {
            log::debug!("WebP already present: {}", target.display());
            return Ok(target);
        }

        let img = ImageReader::open(original)?.with_guessed_format()?.decode()?;
        let (width, height) = (img.width(), img.height());

        let img = if width > self.max_edge || height > self.max_edge {
            img.resize(self.max_edge, self.max_edge, FilterType::Lanczos3)
        } else {
            img
        };
        let rgb = img.to_rgb8();
        let encoded =
            webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height()).encode(WEBP_QUALITY);

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if let Err(e) = std::fs::write(&target, &*encoded) {
            let _ = std::fs::remove_file(&target);
            return Err(e.into());
        }

        log::info!(
            "Converted {} ({}x{}) to {} ({}x{}, {} bytes)",
            original.display(),
            width,
            height,
            target.display(),
            rgb.width(),
            rgb.height(),
            encoded.len()
        );
        Ok(target)
    }

    /// Save the upload, convert it and return the WebP file name to store on the item
    pub fn process(&self, category: CategoryType, upload: &ImageUpload) -> StoreResult<String> {
        let original = self.save_upload(category, upload)?;
        let webp = self.compress_to_webp(&original, category)?;
        Ok(webp
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default())
    }
}
