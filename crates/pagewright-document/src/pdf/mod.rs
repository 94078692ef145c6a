// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — the page model, composition, annotations, serialization and
// PDF creation from images.

pub mod annotate;
pub mod compose;
pub mod document;
pub mod materialize;
pub mod writer;

pub use document::{PdfDocument, Page};
pub use writer::PdfWriter;
