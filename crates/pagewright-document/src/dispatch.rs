// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dispatch — the single entry point callers drive the engine through.
//
// An `Invocation` names an operation with its raw parameters, the ordered
// input files and the output directory. `Engine::execute` checks the inputs,
// resolves the parameters against the loaded documents, runs the operation
// and writes the results.

use std::path::{Path, PathBuf};

use pagewright_core::error::{PagewrightError, Result, ValidationError};
use pagewright_core::selector::{
    resolve_insert_position, resolve_page, resolve_page_set, resolve_rotation_targets,
    resolve_sequence, resolve_split_points,
};
use pagewright_core::{CropBox, DocumentKind, EngineConfig, PageAnchor, Rgb, Rotation};
use tracing::{info, instrument};

use crate::convert::DocumentConverter;
use crate::extract;
use crate::image::ImageProcessor;
use crate::output::{Artifact, OutputMaterializer};
use crate::pdf::annotate;
use crate::pdf::compose::{self, ReorderMode};
use crate::pdf::document::{DocumentMetadata, PdfDocument};
use crate::render::RenderPipeline;
use crate::render::rasterizer::{PageRasterizer, PdfiumRasterizer};
use crate::toc;

/// A requested operation with its parameters as the user supplied them.
/// Page references are 1-based strings; they are resolved against the
/// document when the operation runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Concatenate all inputs in order.
    Merge,
    /// Split after each listed page. An empty list returns the whole document.
    Split { points: String },
    /// One file per page.
    SplitEach,
    Delete { pages: String },
    /// `strict` requires every page exactly once.
    Reorder { order: String, strict: bool },
    /// `pages` is a list or `"all"`.
    Rotate { angle: i64, pages: String },
    /// Insert the second input into the first at `"start"`, `"end"` or after
    /// page N.
    Insert { position: String },
    AddText {
        page: String,
        text: String,
        x: i32,
        y: i32,
        size: Option<f32>,
        colour: Rgb,
    },
    /// Paste the second input (an image) onto one page of the first.
    AddImage {
        page: String,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    AddNote {
        page: String,
        text: String,
        x: f32,
        y: f32,
    },
    AddLink {
        page: String,
        url: String,
        rect: Option<[f32; 4]>,
    },
    Watermark { text: String, opacity: Option<f32> },
    PageNumbers { position: String },
    /// Put the second input (an image) behind every page of the first.
    Background,
    Crop {
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
    },
    Resize { width: u32, height: u32 },
    ChangeOrientation,
    Sort,
    TableOfContents,
    EditMetadata { metadata: DocumentMetadata },
    Info,
    ExtractText,
    ExtractImages,
    ImagesToPdf,
    PdfToImages,
}

impl Operation {
    /// Minimum and maximum number of input files.
    pub fn input_bounds(&self) -> (usize, Option<usize>) {
        match self {
            Self::Merge => (2, None),
            Self::ImagesToPdf => (1, None),
            Self::Insert { .. } | Self::AddImage { .. } | Self::Background => (2, Some(2)),
            _ => (1, Some(1)),
        }
    }

    /// What input `index` must be.
    fn expects_image(&self, index: usize) -> bool {
        match self {
            Self::ImagesToPdf => true,
            Self::AddImage { .. } | Self::Background => index == 1,
            _ => false,
        }
    }

    /// Stem of the output file names.
    pub fn output_prefix(&self) -> &'static str {
        match self {
            Self::Merge => "merged",
            Self::Split { .. } => "split",
            Self::SplitEach | Self::PdfToImages => "page",
            Self::Delete { .. } => "pages_deleted",
            Self::Reorder { .. } => "reordered",
            Self::Rotate { .. } => "rotated",
            Self::Insert { .. } => "added_pages",
            Self::AddText { .. } => "text_added",
            Self::AddImage { .. } => "image_added",
            Self::AddNote { .. } => "note_added",
            Self::AddLink { .. } => "link_added",
            Self::Watermark { .. } => "watermarked",
            Self::PageNumbers { .. } => "numbered",
            Self::Background => "background_changed",
            Self::Crop { .. } => "cropped",
            Self::Resize { .. } => "resized",
            Self::ChangeOrientation => "orientation_changed",
            Self::Sort => "sorted",
            Self::TableOfContents => "with_toc",
            Self::EditMetadata { .. } => "metadata_edited",
            Self::Info => "info",
            Self::ExtractText => "extracted_text",
            Self::ExtractImages => "image",
            Self::ImagesToPdf => "converted_photos",
        }
    }

    /// Check `supplied` inputs against [`Operation::input_bounds`].
    pub fn check_input_count(&self, supplied: usize) -> Result<()> {
        let (required, allowed) = self.input_bounds();
        if supplied < required {
            return Err(ValidationError::InsufficientInputs { required, supplied }.into());
        }
        if let Some(allowed) = allowed {
            if supplied > allowed {
                return Err(ValidationError::TooManyInputs { allowed, supplied }.into());
            }
        }
        Ok(())
    }
}

/// One request to the engine.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub operation: Operation,
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

/// What an operation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    File(PathBuf),
    Files(Vec<PathBuf>),
    Text(String),
}

/// Runs invocations with one configuration and rasterizer.
pub struct Engine<R: PageRasterizer = PdfiumRasterizer> {
    pipeline: RenderPipeline<R>,
}

impl Engine<PdfiumRasterizer> {
    /// Engine rendering through PDFium.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let rasterizer = PdfiumRasterizer::new(config.pdfium_library_dir.clone());
        Self::with_rasterizer(rasterizer, config)
    }
}

impl<R: PageRasterizer> Engine<R> {
    pub fn with_rasterizer(rasterizer: R, config: EngineConfig) -> Result<Self> {
        Ok(Self {
            pipeline: RenderPipeline::new(rasterizer, config)?,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        self.pipeline.config()
    }

    pub fn pipeline(&self) -> &RenderPipeline<R> {
        &self.pipeline
    }

    /// Validate, run and materialize one invocation. Nothing is written
    /// unless every check passes.
    #[instrument(skip_all, fields(operation = invocation.operation.output_prefix(), inputs = invocation.inputs.len()))]
    pub fn execute(&self, invocation: &Invocation) -> Result<Outcome> {
        let operation = &invocation.operation;
        operation.check_input_count(invocation.inputs.len())?;
        for (index, path) in invocation.inputs.iter().enumerate() {
            self.check_source(path, operation.expects_image(index))?;
        }
        let output = OutputMaterializer::new(&invocation.output_dir)?;
        info!("Executing operation");

        let inputs = &invocation.inputs;
        let prefix = operation.output_prefix();

        match operation {
            Operation::Merge => {
                let docs = inputs.iter().map(PdfDocument::open).collect::<Result<Vec<_>>>()?;
                let merged = compose::merge(&docs)?;
                Ok(Outcome::File(output.write_document(prefix, &merged)?))
            }
            Operation::Split { points } => {
                let doc = PdfDocument::open(&inputs[0])?;
                let points = if points.trim().is_empty() {
                    Vec::new()
                } else {
                    resolve_split_points(points, doc.page_count() as u32)?
                };
                let outcome = compose::split(&doc, &points)?;
                let parts = outcome
                    .parts
                    .iter()
                    .map(PdfDocument::to_bytes)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Outcome::Files(output.write_parts(prefix, "pdf", parts)?))
            }
            Operation::SplitEach => {
                let doc = PdfDocument::open(&inputs[0])?;
                let parts = compose::split_each(&doc)
                    .iter()
                    .map(PdfDocument::to_bytes)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Outcome::Files(output.write_parts(prefix, "pdf", parts)?))
            }
            Operation::Delete { pages } => {
                let doc = PdfDocument::open(&inputs[0])?;
                let selector = resolve_page_set(pages, doc.page_count() as u32)?;
                let result = compose::delete(&doc, &selector)?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::Reorder { order, strict } => {
                let doc = PdfDocument::open(&inputs[0])?;
                let sequence = resolve_sequence(order, doc.page_count() as u32)?;
                let mode = if *strict {
                    ReorderMode::Permutation
                } else {
                    ReorderMode::Free
                };
                let result = compose::reorder(&doc, &sequence, mode)?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::Rotate { angle, pages } => {
                let doc = PdfDocument::open(&inputs[0])?;
                let angle = Rotation::from_request(*angle)?;
                let targets = resolve_rotation_targets(pages, doc.page_count() as u32)?;
                let result = compose::rotate(&doc, angle, &targets);
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::Insert { position } => {
                let original = PdfDocument::open(&inputs[0])?;
                let inserted = PdfDocument::open(&inputs[1])?;
                let position = resolve_insert_position(position, original.page_count() as u32)?;
                let result = compose::insert_pages(&original, &inserted, position)?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::AddText {
                page,
                text,
                x,
                y,
                size,
                colour,
            } => {
                let doc = PdfDocument::open(&inputs[0])?;
                let page = resolve_page(page, doc.page_count() as u32)?;
                let result = self
                    .pipeline
                    .add_text(&doc, page, text, (*x, *y), *size, *colour)?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::AddImage {
                page,
                x,
                y,
                width,
                height,
            } => {
                let doc = PdfDocument::open(&inputs[0])?;
                let page = resolve_page(page, doc.page_count() as u32)?;
                let overlay = ImageProcessor::open(&inputs[1])?.into_dynamic();
                let result = self
                    .pipeline
                    .add_image(&doc, page, &overlay, (*x, *y), (*width, *height))?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::AddNote { page, text, x, y } => {
                let doc = PdfDocument::open(&inputs[0])?;
                let page = resolve_page(page, doc.page_count() as u32)?;
                let result = annotate::add_note(&doc, page, text, (*x, *y))?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::AddLink { page, url, rect } => {
                let doc = PdfDocument::open(&inputs[0])?;
                let page = resolve_page(page, doc.page_count() as u32)?;
                let result = annotate::add_link(&doc, page, url, *rect)?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::Watermark { text, opacity } => {
                let doc = PdfDocument::open(&inputs[0])?;
                let result = self.pipeline.watermark(&doc, text, *opacity)?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::PageNumbers { position } => {
                let anchor: PageAnchor = position.parse()?;
                let doc = PdfDocument::open(&inputs[0])?;
                let result = self.pipeline.page_numbers(&doc, anchor)?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::Background => {
                let doc = PdfDocument::open(&inputs[0])?;
                let background = ImageProcessor::open(&inputs[1])?.into_dynamic();
                let result = self.pipeline.background(&doc, &background)?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::Crop {
                left,
                top,
                right,
                bottom,
            } => {
                let area = CropBox::new(*left, *top, *right, *bottom)?;
                let doc = PdfDocument::open(&inputs[0])?;
                let result = self.pipeline.crop(&doc, area)?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::Resize { width, height } => {
                let doc = PdfDocument::open(&inputs[0])?;
                let result = self.pipeline.resize(&doc, *width, *height)?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::ChangeOrientation => {
                let doc = PdfDocument::open(&inputs[0])?;
                let result = self.pipeline.change_orientation(&doc)?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::Sort => {
                let doc = PdfDocument::open(&inputs[0])?;
                let result = compose::sort_by_content(&doc);
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::TableOfContents => {
                let doc = PdfDocument::open(&inputs[0])?;
                let result = toc::add_table_of_contents(&doc, self.config().toc_paper)?;
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::EditMetadata { metadata } => {
                let doc = PdfDocument::open(&inputs[0])?;
                let result = annotate::edit_metadata(&doc, metadata);
                Ok(Outcome::File(output.write_document(prefix, &result)?))
            }
            Operation::Info => {
                let info = annotate::document_info(&inputs[0])?;
                Ok(Outcome::Text(info.to_string()))
            }
            Operation::ExtractText => {
                let doc = PdfDocument::open(&inputs[0])?;
                Ok(Outcome::Text(extract::extract_text(&doc)))
            }
            Operation::ExtractImages => {
                let doc = PdfDocument::open(&inputs[0])?;
                let images = extract::extract_images(&doc)?;
                if images.is_empty() {
                    return Err(PagewrightError::EmptyResult(
                        "the document has no extractable images".into(),
                    ));
                }
                let artifacts: Vec<Artifact> = images
                    .into_iter()
                    .map(|image| Artifact::new(image.stem(), image.extension, image.data))
                    .collect();
                Ok(Outcome::Files(output.write_all(&artifacts)?))
            }
            Operation::ImagesToPdf => {
                let pdf = DocumentConverter::images_to_pdf(inputs, self.config().image_paper)?;
                Ok(Outcome::File(output.write(prefix, "pdf", &pdf)?))
            }
            Operation::PdfToImages => {
                let doc = PdfDocument::open(&inputs[0])?;
                let pngs = DocumentConverter::pdf_to_images(&self.pipeline, &doc)?;
                Ok(Outcome::Files(output.write_parts(prefix, "png", pngs)?))
            }
        }
    }

    /// Size limit and file type of one input.
    fn check_source(&self, path: &Path, expect_image: bool) -> Result<()> {
        let size = std::fs::metadata(path)
            .map_err(|err| PagewrightError::source_read(path.display().to_string(), err))?
            .len();
        let limit = self.config().max_source_bytes;
        if size > limit {
            return Err(ValidationError::FileTooLarge { size, limit }.into());
        }

        let kind = DocumentConverter::check_supported(path)?;
        let acceptable = if expect_image {
            kind.is_image()
        } else {
            kind == DocumentKind::Pdf
        };
        if !acceptable {
            let wanted = if expect_image { "an image" } else { "a PDF" };
            return Err(PagewrightError::UnsupportedDocument(format!(
                "{} is not {wanted}",
                path.display()
            )));
        }
        Ok(())
    }
}
