// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table of contents synthesis from page text.
//
// A heading is any trimmed, non-empty line shorter than 50 characters that
// does not end in sentence punctuation. The listing is prepended to the
// document; entry page numbers refer to the document as it was before the
// listing was added.

use pagewright_core::PaperSize;
use pagewright_core::error::Result;
use tracing::{info, instrument};

use crate::pdf::document::PdfDocument;
use crate::pdf::writer::PdfWriter;

pub const TOC_TITLE: &str = "Table of Contents";

const MAX_HEADING_CHARS: usize = 50;
const TERMINAL_PUNCTUATION: &[char] = &['.', ',', ':', ';', '?', '!', ')'];

/// One listed heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub heading: String,
    /// 1-based page the heading appears on.
    pub page: u32,
}

impl TocEntry {
    fn line(&self) -> String {
        format!("{} .......................... {}", self.heading, self.page)
    }
}

/// Whether a (trimmed) line looks like a heading.
pub fn is_heading(line: &str) -> bool {
    match line.chars().last() {
        None => false,
        Some(last) => {
            line.chars().count() < MAX_HEADING_CHARS && !TERMINAL_PUNCTUATION.contains(&last)
        }
    }
}

/// Every heading of every page, in reading order.
pub fn headings(doc: &PdfDocument) -> Vec<TocEntry> {
    doc.page_texts()
        .iter()
        .enumerate()
        .flat_map(|(index, text)| {
            text.lines()
                .map(str::trim)
                .filter(|line| is_heading(line))
                .map(move |line| TocEntry {
                    heading: line.to_string(),
                    page: index as u32 + 1,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Prepend a table of contents listing the document's headings.
#[instrument(skip_all, fields(pages = doc.page_count()))]
pub fn add_table_of_contents(doc: &PdfDocument, paper: PaperSize) -> Result<PdfDocument> {
    let entries = headings(doc);
    let lines: Vec<String> = entries.iter().map(TocEntry::line).collect();

    let listing = PdfWriter::new(paper).create_listing(TOC_TITLE, &lines);
    let toc = PdfDocument::from_bytes(&listing)?;
    info!(headings = entries.len(), toc_pages = toc.page_count(), "Table of contents built");

    let mut pages = toc.pages().to_vec();
    pages.extend_from_slice(doc.pages());
    Ok(PdfDocument::from_pages(pages, doc.metadata().clone()))
}
