// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagewright composition engine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Clockwise page rotation, always one of 0, 90, 180 or 270 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rotation(u16);

impl Rotation {
    pub const NONE: Self = Self(0);
    pub const QUARTER: Self = Self(90);
    pub const HALF: Self = Self(180);
    pub const THREE_QUARTERS: Self = Self(270);

    /// Validate a user-requested rotation angle. Only 90, 180 and 270 are
    /// accepted; a zero or full turn is not a meaningful request.
    pub fn from_request(degrees: i64) -> Result<Self, ValidationError> {
        match degrees {
            90 | 180 | 270 => Ok(Self(degrees as u16)),
            _ => Err(ValidationError::InvalidRotation { degrees }),
        }
    }

    /// Normalise a stored `/Rotate` value. Returns `None` when the value is
    /// not a multiple of 90.
    pub fn from_page_value(degrees: i64) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(Self(degrees.rem_euclid(360) as u16))
    }

    pub fn degrees(self) -> u16 {
        self.0
    }
}

impl std::ops::Add for Rotation {
    type Output = Rotation;

    /// Rotations compose additively, modulo 360.
    fn add(self, other: Rotation) -> Rotation {
        Rotation((self.0 + other.0) % 360)
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Where inserted pages are spliced into the original document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertPosition {
    /// Before every existing page.
    Start,
    /// After every existing page.
    End,
    /// After the n-th existing page (`At(0)` is equivalent to `Start`).
    At(u32),
}

impl InsertPosition {
    /// Number of original pages that precede the inserted block, for a
    /// document with `total` pages. `None` when `At(n)` exceeds `total`.
    pub fn offset(self, total: u32) -> Option<u32> {
        match self {
            Self::Start => Some(0),
            Self::End => Some(total),
            Self::At(n) if n <= total => Some(n),
            Self::At(_) => None,
        }
    }
}

/// Anchor for page-number stamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageAnchor {
    #[default]
    BottomCenter,
    TopCenter,
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl PageAnchor {
    pub fn is_top(self) -> bool {
        matches!(self, Self::TopCenter | Self::TopLeft | Self::TopRight)
    }
}

impl FromStr for PageAnchor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "bottom" | "bottom-center" => Ok(Self::BottomCenter),
            "top" | "top-center" => Ok(Self::TopCenter),
            "bottom-right" => Ok(Self::BottomRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "top-right" => Ok(Self::TopRight),
            "top-left" => Ok(Self::TopLeft),
            _ => Err(ValidationError::UnknownAnchor {
                input: s.to_string(),
            }),
        }
    }
}

/// Pixel rectangle applied to rasterized pages: `(left, top)` inclusive,
/// `(right, bottom)` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Result<Self, ValidationError> {
        if left >= right || top >= bottom {
            return Err(ValidationError::InvalidCropBox {
                left,
                top,
                right,
                bottom,
            });
        }
        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// 8-bit RGB colour used for drawn text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Self = Self(0, 0, 0);
}

/// Supported input document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Pdf,
    Jpeg,
    Png,
    Tiff,
    Bmp,
    Gif,
    Webp,
    /// Word, Excel and PowerPoint files. Recognised so callers can report a
    /// clear error; conversion is out of scope.
    Office,
}

impl DocumentKind {
    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Office => "application/octet-stream",
        }
    }

    /// Infer document type from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            "docx" | "doc" | "xlsx" | "xls" | "pptx" | "ppt" | "odt" | "ods" => Some(Self::Office),
            _ => None,
        }
    }

    /// Infer document type from a path's extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, Self::Pdf | Self::Office)
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}
