// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output materialization — writing results into the caller's directory.
//
// Every file is written to a hidden temporary file in the target directory
// and then moved into place without replacing anything. Readers of the
// directory never see a half-written file.

use std::io::Write;
use std::path::{Path, PathBuf};

use pagewright_core::error::{PagewrightError, Result};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::pdf::document::PdfDocument;

/// Hidden prefix for in-flight files.
const TEMP_PREFIX: &str = ".pw-";

/// One file to write: `{stem}_{uuid}.{extension}`.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub stem: String,
    pub extension: String,
    pub data: Vec<u8>,
}

impl Artifact {
    pub fn new(stem: impl Into<String>, extension: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            stem: stem.into(),
            extension: extension.into(),
            data,
        }
    }
}

/// Writes uniquely named files into one existing directory.
#[derive(Debug, Clone)]
pub struct OutputMaterializer {
    dir: PathBuf,
}

impl OutputMaterializer {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(PagewrightError::Materialization(format!(
                "output directory {} does not exist",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one file named `{prefix}_{uuid}.{extension}`.
    pub fn write(&self, prefix: &str, extension: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.persist(prefix, extension, data)?;
        info!(path = %path.display(), bytes = data.len(), "Output written");
        Ok(path)
    }

    /// Serialize `doc` and write it as `{prefix}_{uuid}.pdf`.
    pub fn write_document(&self, prefix: &str, doc: &PdfDocument) -> Result<PathBuf> {
        let bytes = doc.to_bytes()?;
        self.write(prefix, "pdf", &bytes)
    }

    /// Write numbered parts `{prefix}_{i}_{uuid}.{extension}`, `i` from 1.
    pub fn write_parts(&self, prefix: &str, extension: &str, parts: Vec<Vec<u8>>) -> Result<Vec<PathBuf>> {
        let artifacts: Vec<Artifact> = parts
            .into_iter()
            .enumerate()
            .map(|(i, data)| Artifact::new(format!("{prefix}_{}", i + 1), extension, data))
            .collect();
        self.write_all(&artifacts)
    }

    /// Write every artifact or none: if one fails, the files already written
    /// by this call are removed again.
    #[instrument(skip_all, fields(dir = %self.dir.display(), files = artifacts.len()))]
    pub fn write_all(&self, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            match self.persist(&artifact.stem, &artifact.extension, &artifact.data) {
                Ok(path) => written.push(path),
                Err(err) => {
                    for path in &written {
                        if let Err(cleanup) = std::fs::remove_file(path) {
                            warn!(path = %path.display(), %cleanup, "Cannot remove partial output");
                        }
                    }
                    return Err(err);
                }
            }
        }
        info!(files = written.len(), "Outputs written");
        Ok(written)
    }

    fn persist(&self, stem: &str, extension: &str, data: &[u8]) -> Result<PathBuf> {
        let target = self
            .dir
            .join(format!("{stem}_{}.{extension}", Uuid::new_v4().simple()));

        let mut file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.dir)
            .map_err(|err| materialization("cannot create temporary file", err))?;
        file.write_all(data)
            .and_then(|()| file.as_file().sync_all())
            .map_err(|err| materialization("cannot write temporary file", err))?;
        file.persist_noclobber(&target)
            .map_err(|err| materialization(&format!("cannot create {}", target.display()), err.error))?;

        debug!(path = %target.display(), "File persisted");
        Ok(target)
    }
}

fn materialization(context: &str, err: std::io::Error) -> PagewrightError {
    PagewrightError::Materialization(format!("{context}: {err}"))
}
