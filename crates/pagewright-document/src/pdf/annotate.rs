// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native annotations (sticky notes, links) and document metadata.
//
// Unlike the render pipeline these edits keep the page vector content intact:
// annotations are attached to the page and emitted at materialization.

use std::path::{Path, PathBuf};

use pagewright_core::error::{Result, ValidationError};
use serde::Serialize;
use tracing::{info, instrument};

use super::document::{DocumentMetadata, PageAnnotation, PdfDocument};

/// Link rectangle used when the caller gives none, in PDF user space.
pub const DEFAULT_LINK_RECT: [f32; 4] = [100.0, 100.0, 300.0, 120.0];

fn with_page_annotation(
    doc: &PdfDocument,
    page_index: usize,
    annotation: PageAnnotation,
) -> Result<PdfDocument> {
    let total = doc.page_count();
    if page_index >= total {
        return Err(ValidationError::PageOutOfRange {
            page: page_index as u64 + 1,
            total: total as u32,
        }
        .into());
    }

    let mut pages = doc.pages().to_vec();
    pages[page_index] = pages[page_index].with_annotation(annotation);
    Ok(doc.with_pages(pages))
}

/// Attach an open sticky note at `position` on the given page.
#[instrument(skip(doc, text), fields(text_len = text.len()))]
pub fn add_note(
    doc: &PdfDocument,
    page_index: usize,
    text: &str,
    position: (f32, f32),
) -> Result<PdfDocument> {
    info!(page = page_index + 1, "Adding note");
    with_page_annotation(
        doc,
        page_index,
        PageAnnotation::Note {
            text: text.to_string(),
            x: position.0,
            y: position.1,
        },
    )
}

/// Attach a borderless URI link over `rect` (or [`DEFAULT_LINK_RECT`]).
#[instrument(skip(doc))]
pub fn add_link(
    doc: &PdfDocument,
    page_index: usize,
    url: &str,
    rect: Option<[f32; 4]>,
) -> Result<PdfDocument> {
    info!(page = page_index + 1, "Adding link");
    with_page_annotation(
        doc,
        page_index,
        PageAnnotation::Link {
            url: url.to_string(),
            rect: rect.unwrap_or(DEFAULT_LINK_RECT),
        },
    )
}

/// Apply metadata overrides; fields left unset keep their current value.
pub fn edit_metadata(doc: &PdfDocument, overrides: &DocumentMetadata) -> PdfDocument {
    doc.with_metadata(doc.metadata().overlay(overrides))
}

/// Summary of a PDF file.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub page_count: usize,
    pub metadata: DocumentMetadata,
}

impl std::fmt::Display for DocumentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Size: {} bytes", self.size_bytes)?;
        write!(f, "Pages: {}", self.page_count)?;
        for (key, value) in self.metadata.entries() {
            write!(f, "\n{key}: {value}")?;
        }
        Ok(())
    }
}

/// Name, size, page count and metadata of the PDF at `path`.
pub fn document_info(path: &Path) -> Result<DocumentInfo> {
    let size_bytes = std::fs::metadata(path)?.len();
    let doc = PdfDocument::open(path)?;
    Ok(DocumentInfo {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        size_bytes,
        page_count: doc.page_count(),
        metadata: doc.metadata().clone(),
    })
}
