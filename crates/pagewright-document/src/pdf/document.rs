// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document handle — opens a PDF with `lopdf` and exposes it as an ordered,
// indexable sequence of pages.
//
// Pages hold an `Arc` to the parsed source, so moving a page into another
// document never copies or mutates the source. Every operation on a
// `PdfDocument` returns a new value; the only place objects are actually
// copied is `materialize`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use pagewright_core::Rotation;
use pagewright_core::error::{PagewrightError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Page trees deeper than this are treated as malformed.
const MAX_TREE_DEPTH: usize = 64;

/// A parsed source file shared by every page taken from it.
pub(crate) struct SourceDocument {
    pub(crate) document: Document,
    pub(crate) path: Option<PathBuf>,
}

impl SourceDocument {
    /// Follow a reference to the object it names; other objects are returned
    /// as they are.
    pub(crate) fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.document.get_object(*id).ok(),
            other => Some(other),
        }
    }
}

/// Document-level `/Info` fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
}

impl DocumentMetadata {
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Fields set in `overrides` replace ours; the rest are kept.
    pub fn overlay(&self, overrides: &DocumentMetadata) -> DocumentMetadata {
        let pick = |ours: &Option<String>, theirs: &Option<String>| {
            theirs.clone().or_else(|| ours.clone())
        };
        DocumentMetadata {
            title: pick(&self.title, &overrides.title),
            author: pick(&self.author, &overrides.author),
            subject: pick(&self.subject, &overrides.subject),
            keywords: pick(&self.keywords, &overrides.keywords),
            creator: pick(&self.creator, &overrides.creator),
            producer: pick(&self.producer, &overrides.producer),
        }
    }

    /// Set fields as `/Info` key/value pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }

    pub(crate) fn from_info(source: &SourceDocument) -> Self {
        let Some(info) = source
            .document
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|info| source.resolve(info))
            .and_then(|info| info.as_dict().ok())
        else {
            return Self::default();
        };

        let field = |key: &[u8]| match info.get(key).ok().and_then(|v| source.resolve(v)) {
            Some(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
            _ => None,
        };

        Self {
            title: field(b"Title"),
            author: field(b"Author"),
            subject: field(b"Subject"),
            keywords: field(b"Keywords"),
            creator: field(b"Creator"),
            producer: field(b"Producer"),
        }
    }

    pub(crate) fn to_info_dictionary(&self) -> Dictionary {
        let mut info = Dictionary::new();
        for (key, value) in self.entries() {
            info.set(key, encode_text_string(value));
        }
        info
    }
}

/// A native annotation waiting to be emitted when the page is materialized.
#[derive(Debug, Clone, PartialEq)]
pub enum PageAnnotation {
    /// Sticky note at `(x, y)` in PDF user space.
    Note { text: String, x: f32, y: f32 },
    /// Clickable URI over `rect` (`[x1, y1, x2, y2]`).
    Link { url: String, rect: [f32; 4] },
}

/// One page of a document.
#[derive(Clone)]
pub struct Page {
    pub(crate) source: Arc<SourceDocument>,
    pub(crate) object_id: ObjectId,
    /// 1-based position in the source file.
    number: u32,
    rotation: Rotation,
    annotations: Vec<PageAnnotation>,
}

impl Page {
    /// Effective rotation of the page.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// 1-based page number in the file this page was read from.
    pub fn source_number(&self) -> u32 {
        self.number
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source.path.as_deref()
    }

    pub fn annotations(&self) -> &[PageAnnotation] {
        &self.annotations
    }

    /// This page turned by a further `by` degrees.
    pub fn rotated(&self, by: Rotation) -> Page {
        Page {
            rotation: self.rotation + by,
            ..self.clone()
        }
    }

    pub fn with_annotation(&self, annotation: PageAnnotation) -> Page {
        let mut page = self.clone();
        page.annotations.push(annotation);
        page
    }

    /// This page with its pending annotations replaced by `annotations`.
    pub(crate) fn with_annotations(&self, annotations: Vec<PageAnnotation>) -> Page {
        Page {
            annotations,
            ..self.clone()
        }
    }

    /// Plain text of the page. Pages without extractable text, or whose text
    /// cannot be decoded, yield an empty string.
    pub fn text(&self) -> String {
        match self.source.document.extract_text(&[self.number]) {
            Ok(text) => text,
            Err(err) => {
                warn!(page = self.number, %err, "Text extraction failed, treating page as empty");
                String::new()
            }
        }
    }

    /// Look up a page attribute, walking up the page tree for inheritable
    /// keys (`Resources`, `MediaBox`, `CropBox`, `Rotate`).
    pub(crate) fn inherited(&self, key: &[u8]) -> Option<&Object> {
        let document = &self.source.document;
        let mut node = document.get_dictionary(self.object_id).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = node.get(key) {
                return self.source.resolve(value);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = document.get_dictionary(parent).ok()?;
        }
        None
    }

    /// Identity of the parsed source, used to de-duplicate shared objects.
    pub(crate) fn source_key(&self) -> usize {
        Arc::as_ptr(&self.source) as usize
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("source", &self.source.path)
            .field("number", &self.number)
            .field("rotation", &self.rotation)
            .field("annotations", &self.annotations.len())
            .finish()
    }
}

/// An immutable, ordered sequence of pages.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pages: Vec<Page>,
    source_path: Option<PathBuf>,
    metadata: DocumentMetadata,
}

impl PdfDocument {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening PDF: {}", path.display());

        let document = Document::load(path)
            .map_err(|err| PagewrightError::source_read(path.display().to_string(), err))?;
        Self::from_lopdf(document, Some(path.to_path_buf()))
    }

    /// Open a PDF already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| PagewrightError::source_read("<memory>", err))?;
        Self::from_lopdf(document, None)
    }

    fn from_lopdf(document: Document, path: Option<PathBuf>) -> Result<Self> {
        let label = path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".into());

        if document.is_encrypted() {
            return Err(PagewrightError::source_read(
                label,
                "document is encrypted or password-protected",
            ));
        }

        let source = Arc::new(SourceDocument {
            document,
            path: path.clone(),
        });
        let metadata = DocumentMetadata::from_info(&source);

        let page_ids = source.document.get_pages();
        let mut pages = Vec::with_capacity(page_ids.len());
        for (number, object_id) in page_ids {
            let mut page = Page {
                source: Arc::clone(&source),
                object_id,
                number,
                rotation: Rotation::NONE,
                annotations: Vec::new(),
            };
            page.rotation = effective_rotation(&page);
            pages.push(page);
        }

        debug!(pages = pages.len(), "PDF loaded");

        Ok(Self {
            pages,
            source_path: path,
            metadata,
        })
    }

    /// Assemble a document from pages taken from other documents.
    pub fn from_pages(pages: Vec<Page>, metadata: DocumentMetadata) -> Self {
        Self {
            pages,
            source_path: None,
            metadata,
        }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page at a 0-based index.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Path this document was opened from, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Text of every page, in order.
    pub fn page_texts(&self) -> Vec<String> {
        self.pages.iter().map(Page::text).collect()
    }

    // -- Derivation -----------------------------------------------------------

    /// The same pages under different metadata.
    pub fn with_metadata(&self, metadata: DocumentMetadata) -> Self {
        Self {
            pages: self.pages.clone(),
            source_path: self.source_path.clone(),
            metadata,
        }
    }

    /// The same metadata over a different page sequence.
    pub(crate) fn with_pages(&self, pages: Vec<Page>) -> Self {
        Self {
            pages,
            source_path: None,
            metadata: self.metadata.clone(),
        }
    }

    /// Serialize to PDF bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        super::materialize::to_bytes(self)
    }
}

fn effective_rotation(page: &Page) -> Rotation {
    let Some(value) = page.inherited(b"Rotate") else {
        return Rotation::NONE;
    };
    let degrees = match value {
        Object::Integer(n) => *n,
        Object::Real(r) => *r as i64,
        _ => 0,
    };
    Rotation::from_page_value(degrees).unwrap_or_else(|| {
        warn!(page = page.number, degrees, "Ignoring /Rotate that is not a multiple of 90");
        Rotation::NONE
    })
}

/// Decode a PDF text string: UTF-16BE when it carries a byte-order mark,
/// otherwise single-byte.
pub(crate) fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Encode a text string, falling back to UTF-16BE for non-ASCII text.
pub(crate) fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
