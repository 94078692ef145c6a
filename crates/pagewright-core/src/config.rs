// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Tunables for rendering, decoration and input limits.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Resolution pages are rasterized at before image-space edits.
    pub render_dpi: u32,
    /// Default size (pixels) for free-standing text.
    pub text_font_size: f32,
    /// Watermark text size (pixels).
    pub watermark_font_size: f32,
    /// Watermark opacity, 0.0 to 1.0.
    pub watermark_opacity: f32,
    /// Page-number text size (pixels).
    pub page_number_font_size: f32,
    /// TrueType font tried before the embedded fallback.
    pub preferred_font: Option<PathBuf>,
    /// Directory holding the PDFium shared library, if not next to the binary
    /// or installed system-wide.
    pub pdfium_library_dir: Option<PathBuf>,
    /// Largest source file accepted, in bytes.
    pub max_source_bytes: u64,
    /// Paper used when laying images out as PDF pages.
    pub image_paper: crate::PaperSize,
    /// Paper used for synthesized table-of-contents pages.
    pub toc_paper: crate::PaperSize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            render_dpi: 200,
            text_font_size: 12.0,
            watermark_font_size: 40.0,
            watermark_opacity: 0.3,
            page_number_font_size: 14.0,
            preferred_font: None,
            pdfium_library_dir: None,
            max_source_bytes: 20 * 1024 * 1024,
            image_paper: crate::PaperSize::A4,
            toc_paper: crate::PaperSize::Letter,
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), dpi = config.render_dpi, "Loaded engine config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "render_dpi": 300, "image_paper": "Letter" }"#)
            .expect("write config");

        let config = EngineConfig::load(&path).expect("load config");
        assert_eq!(config.render_dpi, 300);
        assert_eq!(config.image_paper, crate::PaperSize::Letter);
        assert_eq!(config.watermark_opacity, 0.3);
        assert_eq!(config.max_source_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn malformed_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("engine.json");
        std::fs::write(&path, "{ not json").expect("write config");

        assert!(matches!(
            EngineConfig::load(&path),
            Err(crate::PagewrightError::Serialization(_))
        ));
    }
}
