// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test fixtures: synthetic PDFs built in memory and a rasterizer that needs
// no PDFium.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{DynamicImage, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use pagewright_core::error::{PagewrightError, Result};

use crate::pdf::document::PdfDocument;
use crate::render::rasterizer::PageRasterizer;

/// A letter-sized PDF with one page per label, each page showing its label.
/// Fonts and the media box live on the page-tree root and are inherited.
pub fn sample_pdf(labels: &[&str]) -> Vec<u8> {
    sample_pdf_with(labels, |_, _, _| {})
}

/// Like [`sample_pdf`], letting the caller edit the lopdf document (pages
/// root id, page ids) before it is saved.
pub fn sample_pdf_with(
    labels: &[&str],
    edit: impl FnOnce(&mut Document, ObjectId, &[ObjectId]),
) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    let mut page_ids = Vec::new();
    for label in labels {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*label)]),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content.encode().expect("encode content");
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
        page_ids.push(page_id);
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => labels.len() as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    edit(&mut doc, pages_id, &page_ids);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save sample pdf");
    bytes
}

pub fn sample_document(labels: &[&str]) -> PdfDocument {
    PdfDocument::from_bytes(&sample_pdf(labels)).expect("load sample pdf")
}

/// Write a sample PDF into `dir` and return its path.
pub fn write_sample(dir: &Path, name: &str, labels: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, sample_pdf(labels)).expect("write sample pdf");
    path
}

/// Write a small solid-colour PNG into `dir` and return its path.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb([200, 40, 40]))
        .save(&path)
        .expect("write png");
    path
}

/// Trimmed labels of every page, for order assertions.
pub fn labels(doc: &PdfDocument) -> Vec<String> {
    doc.page_texts().iter().map(|t| t.trim().to_string()).collect()
}

/// Rasterizer producing one white `2in x 3in` image per page and recording
/// how many pages each call received.
#[derive(Default)]
pub struct FakeRasterizer {
    pub calls: Mutex<Vec<usize>>,
}

impl PageRasterizer for FakeRasterizer {
    fn rasterize(&self, pdf: &[u8], dpi: u32) -> Result<Vec<DynamicImage>> {
        let document =
            Document::load_mem(pdf).map_err(|err| PagewrightError::Render(err.to_string()))?;
        let count = document.get_pages().len();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(count);
        }
        Ok((0..count)
            .map(|_| {
                DynamicImage::ImageRgb8(RgbImage::from_pixel(
                    dpi * 2,
                    dpi * 3,
                    Rgb([255, 255, 255]),
                ))
            })
            .collect())
    }
}
