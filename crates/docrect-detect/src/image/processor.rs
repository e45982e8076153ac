// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image loading, height-bounded down-scaling and encoding for the scanner.

use std::path::Path;

use docrect_core::error::{DocrectError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, info, instrument};

/// A single decoded photo or crop.
///
/// Transformations consume `self` and return a new processor so calls chain:
///
/// ```ignore
/// let png = ImageProcessor::open("receipt.jpg")?
///     .fit_height(600)
///     .to_png_bytes()?;
/// ```
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            DocrectError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| DocrectError::ImageError(format!("failed to decode image: {}", err)))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Down-scale so the height is at most `max_height`, keeping the aspect
    /// ratio. Images already that short are returned unchanged; nothing is
    /// ever up-scaled.
    ///
    /// Triangle filtering is used: the result feeds edge detection, where
    /// Lanczos ringing would add spurious edges.
    #[instrument(skip(self), fields(from_w = self.image.width(), from_h = self.image.height()))]
    pub fn fit_height(self, max_height: u32) -> Self {
        if self.image.height() <= max_height || max_height == 0 {
            return self;
        }
        Self {
            image: resize_to_height(&self.image, max_height),
        }
    }

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Write the image to a file. The format is inferred from the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            DocrectError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

/// Resize `image` to exactly `height` rows, keeping the aspect ratio.
pub fn resize_to_height(image: &DynamicImage, height: u32) -> DynamicImage {
    let new_w = scaled_width(image.width(), image.height(), height);
    let resized = image.resize_exact(new_w, height, FilterType::Triangle);
    debug!(new_w, new_h = height, "Resized to height");
    resized
}

/// Width of a `width x height` image scaled to `new_height`, at least 1.
pub(crate) fn scaled_width(width: u32, height: u32, new_height: u32) -> u32 {
    let w = (width as f64 * new_height as f64 / height as f64).round();
    (w as u32).max(1)
}

fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| DocrectError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
