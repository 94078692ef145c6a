// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for chat users.
//
// Every engine error is mapped to one plain sentence plus a suggestion of
// what to send next. The kind tells the caller whether asking the user to
// retry with different input makes sense at all.

use crate::error::{PagewrightError, ValidationError};

/// What the user can do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request itself was wrong (bad page numbers, wrong number of files).
    /// Re-asking with corrected input will work.
    ActionRequired,
    /// The file cannot be processed no matter how the request is phrased.
    Permanent,
    /// Something in the environment failed; trying again may succeed.
    Transient,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    pub kind: FailureKind,
}

impl HumanError {
    fn new(message: impl Into<String>, suggestion: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            kind,
        }
    }
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `PagewrightError` into a `HumanError` suitable for a chat reply.
pub fn humanize_error(err: &PagewrightError) -> HumanError {
    match err {
        PagewrightError::Validation(validation) => humanize_validation(validation),

        PagewrightError::EmptyResult(detail) => HumanError::new(
            format!("There's nothing to send back: {detail}."),
            "Keep at least one page, or try a different file.",
            FailureKind::ActionRequired,
        ),

        PagewrightError::SourceRead { .. } => HumanError::new(
            "I couldn't open that file.",
            "It may be damaged or password-protected. Send an unprotected copy.",
            FailureKind::Permanent,
        ),

        PagewrightError::UnsupportedDocument(detail) => HumanError::new(
            "This type of document isn't supported.",
            format!("Send a PDF or an image instead. (File type: {detail})"),
            FailureKind::Permanent,
        ),

        PagewrightError::Render(_) => HumanError::new(
            "I couldn't draw on the pages of this document.",
            "Try again. If it keeps failing, the PDF may use features I can't render.",
            FailureKind::Transient,
        ),

        PagewrightError::Materialization(_) => HumanError::new(
            "I couldn't save the result.",
            "Try again in a moment.",
            FailureKind::Transient,
        ),

        PagewrightError::Session(_) => HumanError::new(
            "That step doesn't fit what we were doing.",
            "Start the command again from the beginning.",
            FailureKind::ActionRequired,
        ),

        PagewrightError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError::new(
                    "The file couldn't be found.",
                    "Send the file again.",
                    FailureKind::ActionRequired,
                )
            } else {
                HumanError::new(
                    "There was a problem reading or writing a file.",
                    "Try again. If this keeps happening, the server's storage may be full.",
                    FailureKind::Transient,
                )
            }
        }

        PagewrightError::Serialization(_) => HumanError::new(
            "Your saved settings couldn't be read.",
            "Change a setting to save them again.",
            FailureKind::Transient,
        ),
    }
}

fn humanize_validation(err: &ValidationError) -> HumanError {
    use ValidationError as V;

    let action = |message: String, suggestion: &str| {
        HumanError::new(message, suggestion, FailureKind::ActionRequired)
    };

    match err {
        V::NoValidPages { .. } => action(
            "I couldn't find any page numbers in that.".into(),
            "Send page numbers separated by commas, like 1,3,5.",
        ),
        V::NotASinglePage { .. } => action(
            "This needs exactly one page number.".into(),
            "Send a single page number, like 2.",
        ),
        V::PageOutOfRange { page, total } => action(
            format!("Page {page} doesn't exist. The document has {total} pages."),
            "Send page numbers between 1 and the last page.",
        ),
        V::SplitPointOutOfRange { total, .. } => action(
            format!(
                "Split points must be between 1 and {}.",
                total.saturating_sub(1)
            ),
            "A split point is the page after which a new part starts.",
        ),
        V::PositionOutOfRange { total, .. } => action(
            format!("You can insert after page 0 to {total}."),
            "Send \"start\", \"end\" or a page number in that range.",
        ),
        V::MalformedPosition { .. } => action(
            "I didn't understand where to insert the pages.".into(),
            "Send \"start\", \"end\" or a page number.",
        ),
        V::InsufficientInputs { required, .. } => action(
            format!("I need at least {required} files for this."),
            "Send more files, then try again.",
        ),
        V::TooManyInputs { allowed, .. } => action(
            format!("This only works with {allowed} file(s)."),
            "Start again and send fewer files.",
        ),
        V::InvalidRotation { .. } => action(
            "Pages can only be turned by 90, 180 or 270 degrees.".into(),
            "Pick one of those angles.",
        ),
        V::NotAPermutation { total } => action(
            format!("The new order must list each of the {total} pages exactly once."),
            "Check for missing or repeated page numbers.",
        ),
        V::UnknownAnchor { .. } => action(
            "I don't know that position for page numbers.".into(),
            "Use top, bottom, top-left, top-right, bottom-left or bottom-right.",
        ),
        V::InvalidCropBox { .. } => action(
            "That crop area is empty.".into(),
            "Left must be smaller than right and top smaller than bottom.",
        ),
        V::InvalidSize { .. } => action(
            "That page size is not valid.".into(),
            "Width and height must both be greater than zero.",
        ),
        V::InvalidOpacity(_) => action(
            "Opacity must be between 0 and 1.".into(),
            "Try something like 0.3.",
        ),
        V::FileTooLarge { limit, .. } => action(
            format!("That file is too large. The limit is {} MB.", limit / (1024 * 1024)),
            "Send a smaller file.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_page_numbers_ask_for_new_input() {
        let err = PagewrightError::from(ValidationError::PageOutOfRange { page: 9, total: 4 });
        let human = humanize_error(&err);
        assert_eq!(human.kind, FailureKind::ActionRequired);
        assert!(human.message.contains("Page 9"));
        assert!(human.message.contains("4 pages"));
    }

    #[test]
    fn unreadable_source_is_permanent() {
        let err = PagewrightError::source_read("scan.pdf", "document is encrypted");
        assert_eq!(humanize_error(&err).kind, FailureKind::Permanent);
    }

    #[test]
    fn materialization_failure_is_transient() {
        let err = PagewrightError::Materialization("disk full".into());
        assert_eq!(humanize_error(&err).kind, FailureKind::Transient);
    }

    #[test]
    fn file_size_limit_is_reported_in_megabytes() {
        let err = PagewrightError::from(ValidationError::FileTooLarge {
            size: 30 * 1024 * 1024,
            limit: 20 * 1024 * 1024,
        });
        assert!(humanize_error(&err).message.contains("20 MB"));
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = PagewrightError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(humanize_error(&err).kind, FailureKind::ActionRequired);
    }
}
