// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagewright — PDF page composition from the command line.
//
// Entry point. Initialises logging, loads the engine configuration, turns the
// subcommand into an invocation and prints what it produced.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use pagewright_core::human_errors::humanize_error;
use pagewright_core::{EngineConfig, Rgb};
use pagewright_document::{DocumentMetadata, Engine, Invocation, Operation, Outcome};

#[derive(Parser)]
#[command(name = "pagewright")]
#[command(about = "Merge, split, reorder, rotate, decorate and convert PDF documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory results are written to.
    #[arg(short, long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// JSON engine configuration.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Render resolution for image-space edits.
    #[arg(long, global = true)]
    dpi: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Concatenate PDFs in the order given.
    Merge {
        #[arg(num_args = 2.., required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Split after each listed page ("2,5"). No pages keeps the document whole.
    Split {
        input: PathBuf,
        #[arg(long, default_value = "")]
        points: String,
    },
    /// Write every page as its own PDF.
    SplitEach { input: PathBuf },
    /// Remove pages ("1,3").
    Delete {
        input: PathBuf,
        #[arg(long)]
        pages: String,
    },
    /// Put pages in a new order ("3,1,2").
    Reorder {
        input: PathBuf,
        #[arg(long)]
        order: String,
        /// Allow omitting or repeating pages.
        #[arg(long)]
        allow_partial: bool,
    },
    /// Rotate pages clockwise by 90, 180 or 270 degrees.
    Rotate {
        input: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        angle: i64,
        /// Page list or "all".
        #[arg(long, default_value = "all")]
        pages: String,
    },
    /// Insert the pages of a second PDF.
    Insert {
        input: PathBuf,
        insert: PathBuf,
        /// "start", "end" or the page to insert after.
        #[arg(long, default_value = "end")]
        position: String,
    },
    /// Draw text on a page.
    AddText {
        input: PathBuf,
        #[arg(long)]
        page: String,
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = 50)]
        x: i32,
        #[arg(long, default_value_t = 50)]
        y: i32,
        #[arg(long)]
        size: Option<f32>,
        /// "r,g,b".
        #[arg(long, default_value = "0,0,0", value_parser = parse_colour)]
        colour: Rgb,
    },
    /// Paste an image onto a page.
    AddImage {
        input: PathBuf,
        image: PathBuf,
        #[arg(long)]
        page: String,
        #[arg(long, default_value_t = 0)]
        x: i64,
        #[arg(long, default_value_t = 0)]
        y: i64,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Attach a sticky note to a page.
    AddNote {
        input: PathBuf,
        #[arg(long)]
        page: String,
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = 100.0)]
        x: f32,
        #[arg(long, default_value_t = 100.0)]
        y: f32,
    },
    /// Attach a web link to a page.
    AddLink {
        input: PathBuf,
        #[arg(long)]
        page: String,
        #[arg(long)]
        url: String,
        /// "x1,y1,x2,y2" in PDF points.
        #[arg(long, value_parser = parse_rect)]
        rect: Option<[f32; 4]>,
    },
    /// Stamp text across every page.
    Watermark {
        input: PathBuf,
        #[arg(long)]
        text: String,
        #[arg(long)]
        opacity: Option<f32>,
    },
    /// Number every page.
    PageNumbers {
        input: PathBuf,
        /// bottom, top, bottom-left, bottom-right, top-left or top-right.
        #[arg(long, default_value = "bottom")]
        position: String,
    },
    /// Put an image behind every page.
    Background { input: PathBuf, image: PathBuf },
    /// Crop every page to a pixel box at the render resolution.
    Crop {
        input: PathBuf,
        #[arg(long)]
        left: u32,
        #[arg(long)]
        top: u32,
        #[arg(long)]
        right: u32,
        #[arg(long)]
        bottom: u32,
    },
    /// Resize every page to a pixel size at the render resolution.
    Resize {
        input: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Swap portrait and landscape.
    ChangeOrientation { input: PathBuf },
    /// Order pages by their text.
    Sort { input: PathBuf },
    /// Prepend a table of contents built from short lines.
    Toc { input: PathBuf },
    /// Set document information fields.
    EditMetadata {
        input: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        keywords: Option<String>,
        #[arg(long)]
        creator: Option<String>,
        #[arg(long)]
        producer: Option<String>,
    },
    /// Show size, page count and metadata.
    Info { input: PathBuf },
    /// Print the text of every page.
    ExtractText { input: PathBuf },
    /// Save the images embedded in the pages.
    ExtractImages { input: PathBuf },
    /// Lay images out as PDF pages.
    ImagesToPdf {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Render every page to PNG.
    PdfToImages { input: PathBuf },
}

impl Command {
    /// Operation and ordered input files.
    fn into_parts(self) -> (Operation, Vec<PathBuf>) {
        match self {
            Self::Merge { inputs } => (Operation::Merge, inputs),
            Self::Split { input, points } => (Operation::Split { points }, vec![input]),
            Self::SplitEach { input } => (Operation::SplitEach, vec![input]),
            Self::Delete { input, pages } => (Operation::Delete { pages }, vec![input]),
            Self::Reorder {
                input,
                order,
                allow_partial,
            } => (
                Operation::Reorder {
                    order,
                    strict: !allow_partial,
                },
                vec![input],
            ),
            Self::Rotate { input, angle, pages } => (Operation::Rotate { angle, pages }, vec![input]),
            Self::Insert {
                input,
                insert,
                position,
            } => (Operation::Insert { position }, vec![input, insert]),
            Self::AddText {
                input,
                page,
                text,
                x,
                y,
                size,
                colour,
            } => (
                Operation::AddText {
                    page,
                    text,
                    x,
                    y,
                    size,
                    colour,
                },
                vec![input],
            ),
            Self::AddImage {
                input,
                image,
                page,
                x,
                y,
                width,
                height,
            } => (
                Operation::AddImage {
                    page,
                    x,
                    y,
                    width,
                    height,
                },
                vec![input, image],
            ),
            Self::AddNote {
                input,
                page,
                text,
                x,
                y,
            } => (Operation::AddNote { page, text, x, y }, vec![input]),
            Self::AddLink {
                input,
                page,
                url,
                rect,
            } => (Operation::AddLink { page, url, rect }, vec![input]),
            Self::Watermark {
                input,
                text,
                opacity,
            } => (Operation::Watermark { text, opacity }, vec![input]),
            Self::PageNumbers { input, position } => {
                (Operation::PageNumbers { position }, vec![input])
            }
            Self::Background { input, image } => (Operation::Background, vec![input, image]),
            Self::Crop {
                input,
                left,
                top,
                right,
                bottom,
            } => (
                Operation::Crop {
                    left,
                    top,
                    right,
                    bottom,
                },
                vec![input],
            ),
            Self::Resize {
                input,
                width,
                height,
            } => (Operation::Resize { width, height }, vec![input]),
            Self::ChangeOrientation { input } => (Operation::ChangeOrientation, vec![input]),
            Self::Sort { input } => (Operation::Sort, vec![input]),
            Self::Toc { input } => (Operation::TableOfContents, vec![input]),
            Self::EditMetadata {
                input,
                title,
                author,
                subject,
                keywords,
                creator,
                producer,
            } => (
                Operation::EditMetadata {
                    metadata: DocumentMetadata {
                        title,
                        author,
                        subject,
                        keywords,
                        creator,
                        producer,
                    },
                },
                vec![input],
            ),
            Self::Info { input } => (Operation::Info, vec![input]),
            Self::ExtractText { input } => (Operation::ExtractText, vec![input]),
            Self::ExtractImages { input } => (Operation::ExtractImages, vec![input]),
            Self::ImagesToPdf { images } => (Operation::ImagesToPdf, images),
            Self::PdfToImages { input } => (Operation::PdfToImages, vec![input]),
        }
    }
}

fn parse_colour(raw: &str) -> std::result::Result<Rgb, String> {
    let parts: Vec<u8> = raw
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|err| format!("colour components must be 0-255: {err}"))?;
    match parts.as_slice() {
        [r, g, b] => Ok(Rgb(*r, *g, *b)),
        _ => Err("colour must be three components, \"r,g,b\"".into()),
    }
}

fn parse_rect(raw: &str) -> std::result::Result<[f32; 4], String> {
    let parts: Vec<f32> = raw
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|err| format!("rectangle coordinates must be numbers: {err}"))?;
    <[f32; 4]>::try_from(parts).map_err(|_| "rectangle must be four numbers, \"x1,y1,x2,y2\"".into())
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(dpi) = cli.dpi {
        if dpi == 0 {
            bail!("--dpi must be greater than zero");
        }
        config.render_dpi = dpi;
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let engine = Engine::new(config).context("Failed to start the engine")?;

    let (operation, inputs) = cli.command.into_parts();
    tracing::info!(operation = operation.output_prefix(), "Pagewright starting");
    let invocation = Invocation {
        operation,
        inputs,
        output_dir: cli.output_dir,
    };

    let outcome = engine.execute(&invocation).map_err(|err| {
        tracing::debug!(%err, "Operation failed");
        anyhow!("{}", humanize_error(&err))
    })?;

    match outcome {
        Outcome::File(path) => println!("{}", path.display()),
        Outcome::Files(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
        }
        Outcome::Text(text) => println!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn colour_parses_three_components() {
        assert_eq!(parse_colour("255, 0,10").expect("colour"), Rgb(255, 0, 10));
        assert!(parse_colour("1,2").is_err());
        assert!(parse_colour("1,2,300").is_err());
    }

    #[test]
    fn rect_parses_four_numbers() {
        assert_eq!(parse_rect("1,2,3.5,4").expect("rect"), [1.0, 2.0, 3.5, 4.0]);
        assert!(parse_rect("1,2,3").is_err());
    }

    #[test]
    fn insert_passes_both_files_in_order() {
        let cli = Cli::parse_from(["pagewright", "insert", "a.pdf", "b.pdf", "--position", "start"]);
        let (operation, inputs) = cli.command.into_parts();
        assert_eq!(
            operation,
            Operation::Insert {
                position: "start".into()
            }
        );
        assert_eq!(inputs, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
    }

    #[test]
    fn reorder_is_strict_unless_partial_allowed() {
        let cli = Cli::parse_from(["pagewright", "reorder", "a.pdf", "--order", "2,1"]);
        assert!(matches!(
            cli.command.into_parts().0,
            Operation::Reorder { strict: true, .. }
        ));
    }
}
