// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font loading for drawn text.

use std::path::Path;

use ab_glyph::FontArc;
use pagewright_core::error::{PagewrightError, Result};
use tracing::{debug, warn};

/// DejaVu Sans, always available regardless of what is installed.
static EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Load `preferred` if given and readable, else the embedded font.
pub fn load_font(preferred: Option<&Path>) -> Result<FontArc> {
    if let Some(path) = preferred {
        match std::fs::read(path) {
            Ok(bytes) => match FontArc::try_from_vec(bytes) {
                Ok(font) => {
                    debug!(path = %path.display(), "Using preferred font");
                    return Ok(font);
                }
                Err(err) => warn!(path = %path.display(), %err, "Preferred font is not a usable TrueType font"),
            },
            Err(err) => warn!(path = %path.display(), %err, "Cannot read preferred font"),
        }
    }
    embedded_font()
}

pub fn embedded_font() -> Result<FontArc> {
    FontArc::try_from_slice(EMBEDDED_FONT)
        .map_err(|err| PagewrightError::Render(format!("embedded font is invalid: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_font_loads() {
        assert!(embedded_font().is_ok());
    }

    #[test]
    fn missing_preferred_font_falls_back() {
        let font = load_font(Some(Path::new("/no/such/font.ttf")));
        assert!(font.is_ok());
    }

    #[test]
    fn garbage_preferred_font_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").expect("write");
        assert!(load_font(Some(&path)).is_ok());
    }
}
