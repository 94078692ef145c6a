// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decoding, the geometric page transforms (crop, exact
// resize, quarter-turn) and encoding, using the `image` crate.

use image::{DynamicImage, ImageFormat};
use pagewright_core::CropBox;
use pagewright_core::error::{PagewrightError, Result, ValidationError};
use tracing::{debug, info, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`
/// wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let png = ImageProcessor::open("scan.jpg")?
///     .crop(CropBox::new(0, 0, 800, 600)?)?
///     .rotate_counter_clockwise()
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|err| PagewrightError::source_read(path.display().to_string(), err))?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| PagewrightError::source_read("<memory>", err))?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Resize to exactly `width` x `height`, ignoring aspect ratio.
    #[instrument(skip(self), fields(width, height))]
    pub fn resize_exact(self, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ValidationError::InvalidSize { width, height }.into());
        }
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            "Resizing image"
        );
        let resized = self
            .image
            .resize_exact(width, height, image::imageops::FilterType::Lanczos3);
        Ok(Self { image: resized })
    }

    /// Turn the image a quarter turn counter-clockwise, swapping portrait and
    /// landscape.
    pub fn rotate_counter_clockwise(self) -> Self {
        Self {
            image: self.image.rotate270(),
        }
    }

    /// Crop to `area`. The area must lie within the image.
    #[instrument(skip(self), fields(?area))]
    pub fn crop(self, area: CropBox) -> Result<Self> {
        if area.right > self.image.width() || area.bottom > self.image.height() {
            return Err(ValidationError::InvalidCropBox {
                left: area.left,
                top: area.top,
                right: area.right,
                bottom: area.bottom,
            }
            .into());
        }
        let cropped = self
            .image
            .crop_imm(area.left, area.top, area.width(), area.height());
        Ok(Self { image: cropped })
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        PagewrightError::Materialization(format!("image encoding failed: {err}"))
    })?;
    Ok(buffer)
}
