// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One user's in-progress operation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pagewright_core::error::{PagewrightError, Result, ValidationError};
use pagewright_document::{Invocation, Operation, Outcome};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::store::UserId;

/// Subdirectory of the workspace that receives operation results.
const OUTPUT_DIR: &str = "output";

/// Progress of a session. Stages only move forward until the session is
/// reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    /// No documents yet.
    Idle,
    /// At least one document staged.
    DocumentsCollected,
    /// Parameters resolved into an invocation.
    Resolved,
    /// Output written.
    Materialized,
}

/// State of one user's current operation.
#[derive(Debug)]
pub struct Session {
    user: UserId,
    workspace: PathBuf,
    max_source_bytes: u64,
    operation: Option<Operation>,
    stage: Stage,
    staged: Vec<PathBuf>,
    outcome: Option<Outcome>,
    last_activity: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(user: UserId, workspace: PathBuf, max_source_bytes: u64) -> Self {
        Self {
            user,
            workspace,
            max_source_bytes,
            operation: None,
            stage: Stage::Idle,
            staged: Vec::new(),
            outcome: None,
            last_activity: Utc::now(),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn operation(&self) -> Option<&Operation> {
        self.operation.as_ref()
    }

    /// Staged input files, in the order they arrived.
    pub fn staged(&self) -> &[PathBuf] {
        &self.staged
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    // -- Transitions ----------------------------------------------------------

    /// Choose the operation documents are being collected for. Only possible
    /// before any document is staged.
    pub fn begin(&mut self, operation: Operation) -> Result<()> {
        if self.stage != Stage::Idle {
            return Err(PagewrightError::Session(
                "an operation is already in progress; reset the session first".into(),
            ));
        }
        info!(user = %self.user, operation = operation.output_prefix(), "Session started");
        self.operation = Some(operation);
        self.touch();
        Ok(())
    }

    /// Store one incoming document in the workspace.
    ///
    /// `declared_size` is the size the sender announced; files above the
    /// limit are refused before any byte is written.
    pub fn stage_document(&mut self, file_name: &str, declared_size: u64, data: &[u8]) -> Result<PathBuf> {
        let Some(operation) = &self.operation else {
            return Err(PagewrightError::Session("no operation selected".into()));
        };
        if self.stage > Stage::DocumentsCollected {
            return Err(PagewrightError::Session(
                "documents can no longer be added to this operation".into(),
            ));
        }
        if declared_size > self.max_source_bytes {
            return Err(ValidationError::FileTooLarge {
                size: declared_size,
                limit: self.max_source_bytes,
            }
            .into());
        }
        if let (_, Some(allowed)) = operation.input_bounds() {
            if self.staged.len() >= allowed {
                return Err(ValidationError::TooManyInputs {
                    allowed,
                    supplied: self.staged.len() + 1,
                }
                .into());
            }
        }

        std::fs::create_dir_all(&self.workspace)?;
        let path = self
            .workspace
            .join(format!("{}_{}", self.staged.len() + 1, safe_file_name(file_name)));
        std::fs::write(&path, data)?;
        debug!(user = %self.user, path = %path.display(), "Document staged");

        self.staged.push(path.clone());
        self.advance(Stage::DocumentsCollected)?;
        Ok(path)
    }

    /// Fix the operation's parameters and build the invocation to run.
    pub fn resolve(&mut self, operation: Operation) -> Result<Invocation> {
        if self.stage != Stage::DocumentsCollected {
            return Err(PagewrightError::Session("no documents have been collected".into()));
        }
        operation.check_input_count(self.staged.len())?;

        let output_dir = self.workspace.join(OUTPUT_DIR);
        std::fs::create_dir_all(&output_dir)?;
        self.operation = Some(operation.clone());
        self.advance(Stage::Resolved)?;

        Ok(Invocation {
            operation,
            inputs: self.staged.clone(),
            output_dir,
        })
    }

    /// Record the result of running the resolved invocation.
    pub fn complete(&mut self, outcome: Outcome) -> Result<()> {
        if self.stage != Stage::Resolved {
            return Err(PagewrightError::Session("the operation was not resolved".into()));
        }
        self.advance(Stage::Materialized)?;
        self.outcome = Some(outcome);
        info!(user = %self.user, "Session completed");
        Ok(())
    }

    /// Return to `Idle`, forgetting the operation. With `delete_files` the
    /// workspace directory and everything in it is removed.
    pub fn reset(&mut self, delete_files: bool) -> Result<()> {
        if delete_files {
            match std::fs::remove_dir_all(&self.workspace) {
                Ok(()) => debug!(path = %self.workspace.display(), "Workspace removed"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %self.workspace.display(), %err, "Cannot remove workspace");
                    return Err(err.into());
                }
            }
        }
        self.operation = None;
        self.stage = Stage::Idle;
        self.staged.clear();
        self.outcome = None;
        self.touch();
        Ok(())
    }

    fn advance(&mut self, to: Stage) -> Result<()> {
        if to < self.stage {
            return Err(PagewrightError::Session(format!(
                "cannot move from {:?} back to {to:?}",
                self.stage
            )));
        }
        self.stage = to;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

/// The final component of a user-supplied name, so it cannot escape the
/// workspace.
fn safe_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(dir: &Path) -> Session {
        Session::new(UserId(7), dir.join("7"), 1024)
    }

    #[test]
    fn full_lifecycle_moves_forward() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        assert_eq!(session.stage(), Stage::Idle);

        session.begin(Operation::Merge).expect("begin");
        session.stage_document("a.pdf", 3, b"one").expect("stage a");
        session.stage_document("b.pdf", 3, b"two").expect("stage b");
        assert_eq!(session.stage(), Stage::DocumentsCollected);

        let invocation = session.resolve(Operation::Merge).expect("resolve");
        assert_eq!(invocation.inputs.len(), 2);
        assert!(invocation.output_dir.is_dir());
        assert_eq!(session.stage(), Stage::Resolved);

        session
            .complete(Outcome::Text("done".into()))
            .expect("complete");
        assert_eq!(session.stage(), Stage::Materialized);
        assert!(session.complete(Outcome::Text("again".into())).is_err());
    }

    #[test]
    fn staging_needs_an_operation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        assert!(session.stage_document("a.pdf", 1, b"x").is_err());
    }

    #[test]
    fn declared_size_over_limit_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        session.begin(Operation::Sort).expect("begin");
        let err = session.stage_document("big.pdf", 4096, b"x").unwrap_err();
        assert!(matches!(
            err,
            PagewrightError::Validation(ValidationError::FileTooLarge { size: 4096, limit: 1024 })
        ));
        assert!(session.staged().is_empty());
    }

    #[test]
    fn single_input_operations_refuse_a_second_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        session.begin(Operation::Sort).expect("begin");
        session.stage_document("a.pdf", 1, b"x").expect("stage");
        let err = session.stage_document("b.pdf", 1, b"y").unwrap_err();
        assert!(matches!(
            err,
            PagewrightError::Validation(ValidationError::TooManyInputs { allowed: 1, supplied: 2 })
        ));
    }

    #[test]
    fn merge_cannot_resolve_with_one_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        session.begin(Operation::Merge).expect("begin");
        session.stage_document("a.pdf", 1, b"x").expect("stage");
        assert!(session.resolve(Operation::Merge).is_err());
        assert_eq!(session.stage(), Stage::DocumentsCollected);
    }

    #[test]
    fn begin_twice_is_refused_until_reset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        session.begin(Operation::Sort).expect("begin");
        session.stage_document("a.pdf", 1, b"x").expect("stage");
        assert!(session.begin(Operation::Merge).is_err());

        session.reset(false).expect("reset");
        assert_eq!(session.stage(), Stage::Idle);
        assert!(session.operation().is_none());
        session.begin(Operation::Merge).expect("begin again");
    }

    #[test]
    fn reset_with_delete_removes_workspace() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        session.begin(Operation::Sort).expect("begin");
        let staged = session.stage_document("a.pdf", 1, b"x").expect("stage");
        assert!(staged.exists());

        session.reset(true).expect("reset");
        assert!(!session.workspace().exists());
    }

    #[test]
    fn file_names_cannot_escape_workspace() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        session.begin(Operation::Sort).expect("begin");
        let path = session
            .stage_document("../../etc/passwd.pdf", 1, b"x")
            .expect("stage");
        assert_eq!(path.parent(), Some(session.workspace()));
        assert!(path.ends_with("1_passwd.pdf"));
    }
}
