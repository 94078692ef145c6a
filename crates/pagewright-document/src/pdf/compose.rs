// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composition engine — merge, split, delete, reorder, rotate and insert pages.
//
// Every function is pure: it reads its input documents and returns new ones.
// Inputs are expected to come out of the selector resolvers, but each
// function still checks the invariants it depends on.

use std::collections::BTreeSet;

use pagewright_core::error::{PagewrightError, Result, ValidationError};
use pagewright_core::selector::{PageSelector, RotationTargets, SplitPlan};
use pagewright_core::{InsertPosition, Rotation};
use tracing::{debug, info, instrument};

use super::document::{Page, PdfDocument};

/// How strictly `reorder` treats the requested sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReorderMode {
    /// The sequence must name every page exactly once.
    #[default]
    Permutation,
    /// Pages may be omitted or repeated.
    Free,
}

/// Result of [`split`].
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    /// One document per range, in ascending range order.
    pub parts: Vec<PdfDocument>,
    pub plan: SplitPlan,
}

impl SplitOutcome {
    /// True when no split points were given and the only part is the whole
    /// input.
    pub fn whole_document(&self) -> bool {
        self.plan.whole_document
    }
}

// -- Merge / split --------------------------------------------------------------

/// Concatenate documents in list order. At least two are required.
#[instrument(skip_all, fields(documents = docs.len()))]
pub fn merge(docs: &[PdfDocument]) -> Result<PdfDocument> {
    if docs.len() < 2 {
        return Err(ValidationError::InsufficientInputs {
            required: 2,
            supplied: docs.len(),
        }
        .into());
    }

    let pages: Vec<Page> = docs.iter().flat_map(|d| d.pages().iter().cloned()).collect();
    info!(total_pages = pages.len(), "Merging PDFs");
    Ok(docs[0].with_pages(pages))
}

/// Split after each of `points` (1-based). Without points the whole document
/// comes back as a single part.
#[instrument(skip_all, fields(points = ?points))]
pub fn split(doc: &PdfDocument, points: &[u32]) -> Result<SplitOutcome> {
    let plan = SplitPlan::derive(points, doc.page_count() as u32)?;

    let parts = plan
        .ranges
        .iter()
        .map(|range| doc.with_pages(doc.pages()[range.indices()].to_vec()))
        .collect::<Vec<_>>();

    info!(
        parts = parts.len(),
        whole_document = plan.whole_document,
        "Split PDF"
    );
    Ok(SplitOutcome { parts, plan })
}

/// One single-page document per page.
pub fn split_each(doc: &PdfDocument) -> Vec<PdfDocument> {
    doc.pages()
        .iter()
        .map(|page| doc.with_pages(vec![page.clone()]))
        .collect()
}

// -- Page selection ---------------------------------------------------------------

/// Remove every page whose 0-based index is in `pages`. Indices beyond the
/// document are ignored.
#[instrument(skip_all, fields(selected = pages.len()))]
pub fn delete(doc: &PdfDocument, pages: &PageSelector) -> Result<PdfDocument> {
    let kept: Vec<Page> = doc
        .pages()
        .iter()
        .enumerate()
        .filter(|(index, _)| !pages.contains(*index))
        .map(|(_, page)| page.clone())
        .collect();

    if kept.is_empty() {
        return Err(PagewrightError::EmptyResult(format!(
            "deleting {} page(s) would remove all {} pages",
            pages.len(),
            doc.page_count()
        )));
    }

    debug!(before = doc.page_count(), after = kept.len(), "Pages deleted");
    Ok(doc.with_pages(kept))
}

/// Lay the pages out in `sequence` order.
#[instrument(skip_all, fields(mode = ?mode))]
pub fn reorder(doc: &PdfDocument, sequence: &PageSelector, mode: ReorderMode) -> Result<PdfDocument> {
    let total = doc.page_count();
    let order = sequence.indices();

    if let Some(&bad) = order.iter().find(|&&index| index >= total) {
        return Err(ValidationError::PageOutOfRange {
            page: bad as u64 + 1,
            total: total as u32,
        }
        .into());
    }

    match mode {
        ReorderMode::Permutation => {
            let distinct: BTreeSet<usize> = order.iter().copied().collect();
            if order.len() != total || distinct.len() != total {
                return Err(ValidationError::NotAPermutation {
                    total: total as u32,
                }
                .into());
            }
        }
        ReorderMode::Free => {
            if order.is_empty() {
                return Err(PagewrightError::EmptyResult(
                    "the new order lists no pages".into(),
                ));
            }
        }
    }

    let pages = order.iter().map(|&index| doc.pages()[index].clone()).collect();
    Ok(doc.with_pages(pages))
}

/// Sub-document of the given 0-based indices, in the given order.
pub fn select(doc: &PdfDocument, indices: &[usize]) -> Result<PdfDocument> {
    reorder(doc, &PageSelector::sequence(indices.iter().copied()), ReorderMode::Free)
}

// -- Rotation / insertion -----------------------------------------------------------

/// Turn the targeted pages by `angle`; others are untouched.
#[instrument(skip_all, fields(angle = angle.degrees()))]
pub fn rotate(doc: &PdfDocument, angle: Rotation, targets: &RotationTargets) -> PdfDocument {
    let pages = doc
        .pages()
        .iter()
        .enumerate()
        .map(|(index, page)| {
            if targets.includes(index) {
                page.rotated(angle)
            } else {
                page.clone()
            }
        })
        .collect();
    doc.with_pages(pages)
}

/// Splice every page of `inserted` into `original` at `position`.
#[instrument(skip_all, fields(position = ?position))]
pub fn insert_pages(
    original: &PdfDocument,
    inserted: &PdfDocument,
    position: InsertPosition,
) -> Result<PdfDocument> {
    let total = original.page_count() as u32;
    let offset = position
        .offset(total)
        .ok_or(ValidationError::PositionOutOfRange {
            position: match position {
                InsertPosition::At(n) => u64::from(n),
                _ => 0,
            },
            total,
        })? as usize;

    let mut pages = Vec::with_capacity(original.page_count() + inserted.page_count());
    pages.extend_from_slice(&original.pages()[..offset]);
    pages.extend_from_slice(inserted.pages());
    pages.extend_from_slice(&original.pages()[offset..]);

    info!(offset, inserted = inserted.page_count(), "Pages inserted");
    Ok(original.with_pages(pages))
}

// -- Content ordering ---------------------------------------------------------------

/// Stable sort of the pages by their extracted text.
#[instrument(skip_all, fields(pages = doc.page_count()))]
pub fn sort_by_content(doc: &PdfDocument) -> PdfDocument {
    let mut keyed: Vec<(String, &Page)> = doc.pages().iter().map(|p| (p.text(), p)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    doc.with_pages(keyed.into_iter().map(|(_, page)| page.clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{labels, sample_document};
    use pagewright_core::selector::{resolve_page_set, resolve_sequence, resolve_split_points};

    #[test]
    fn merge_concatenates_in_list_order() {
        let a = sample_document(&["a1", "a2"]);
        let b = sample_document(&["b1"]);
        let c = sample_document(&["c1", "c2"]);
        let merged = merge(&[a, b, c]).expect("merge");
        assert_eq!(labels(&merged), vec!["a1", "a2", "b1", "c1", "c2"]);
    }

    #[test]
    fn merge_needs_two_documents() {
        let err = merge(&[sample_document(&["only"])]).unwrap_err();
        assert!(matches!(
            err,
            PagewrightError::Validation(ValidationError::InsufficientInputs {
                required: 2,
                supplied: 1
            })
        ));
    }

    #[test]
    fn merge_survives_materialization() {
        let merged = merge(&[sample_document(&["x"]), sample_document(&["y"])]).expect("merge");
        let reloaded = PdfDocument::from_bytes(&merged.to_bytes().expect("bytes")).expect("reload");
        assert_eq!(labels(&reloaded), vec!["x", "y"]);
    }

    #[test]
    fn split_five_pages_at_two_and_four() {
        let doc = sample_document(&["1", "2", "3", "4", "5"]);
        let points = resolve_split_points("2,4", 5).expect("points");
        let outcome = split(&doc, &points).expect("split");
        assert!(!outcome.whole_document());
        let parts: Vec<Vec<String>> = outcome.parts.iter().map(labels).collect();
        assert_eq!(parts, vec![vec!["1", "2"], vec!["3", "4"], vec!["5"]]);
    }

    #[test]
    fn split_without_points_returns_whole_document() {
        let doc = sample_document(&["1", "2", "3"]);
        let outcome = split(&doc, &[]).expect("split");
        assert!(outcome.whole_document());
        assert_eq!(outcome.parts.len(), 1);
        assert_eq!(outcome.parts[0].page_count(), 3);
    }

    #[test]
    fn split_rejects_point_at_last_page() {
        let doc = sample_document(&["1", "2", "3"]);
        assert!(split(&doc, &[3]).unwrap_err().is_validation());
    }

    #[test]
    fn split_then_merge_restores_pages_and_rotation() {
        let doc = sample_document(&["1", "2", "3", "4"]);
        let doc = rotate(&doc, Rotation::QUARTER, &RotationTargets::Pages(PageSelector::set([2])));
        let outcome = split(&doc, &[1, 3]).expect("split");

        let parts: Vec<PdfDocument> = outcome
            .parts
            .iter()
            .map(|part| PdfDocument::from_bytes(&part.to_bytes().expect("bytes")).expect("reload"))
            .collect();
        let rejoined = merge(&parts).expect("merge");

        assert_eq!(labels(&rejoined), vec!["1", "2", "3", "4"]);
        let degrees: Vec<u16> = rejoined.pages().iter().map(|p| p.rotation().degrees()).collect();
        assert_eq!(degrees, vec![0, 0, 90, 0]);
    }

    #[test]
    fn split_each_yields_single_pages() {
        let doc = sample_document(&["p", "q", "r"]);
        let parts = split_each(&doc);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.page_count() == 1));
        assert_eq!(labels(&parts[2]), vec!["r"]);
    }

    #[test]
    fn delete_removes_selected_pages() {
        let doc = sample_document(&["1", "2", "3", "4"]);
        let set = resolve_page_set("2,4", 4).expect("set");
        let kept = delete(&doc, &set).expect("delete");
        assert_eq!(labels(&kept), vec!["1", "3"]);
    }

    #[test]
    fn delete_middle_of_three_pages() {
        let doc = sample_document(&["1", "2", "3"]);
        let set = resolve_page_set("2", 3).expect("set");
        let kept = delete(&doc, &set).expect("delete");
        assert_eq!(labels(&kept), vec!["1", "3"]);
    }

    #[test]
    fn delete_ignores_members_outside_document() {
        let doc = sample_document(&["1", "2", "3"]);
        let kept = delete(&doc, &PageSelector::set([1, 7, 99])).expect("delete");
        assert_eq!(kept.page_count(), 2);
    }

    #[test]
    fn delete_everything_is_empty_result() {
        let doc = sample_document(&["1", "2"]);
        let err = delete(&doc, &PageSelector::set([0, 1])).unwrap_err();
        assert!(matches!(err, PagewrightError::EmptyResult(_)));
    }

    #[test]
    fn reorder_reverses_pages() {
        let doc = sample_document(&["1", "2", "3"]);
        let sequence = resolve_sequence("3,2,1", 3).expect("sequence");
        let reordered = reorder(&doc, &sequence, ReorderMode::Permutation).expect("reorder");
        assert_eq!(labels(&reordered), vec!["3", "2", "1"]);
    }

    #[test]
    fn permutation_mode_rejects_omissions_and_duplicates() {
        let doc = sample_document(&["1", "2", "3"]);
        for raw in ["1,2", "1,1,2", "1,2,3,3"] {
            let sequence = resolve_sequence(raw, 3).expect("sequence");
            let err = reorder(&doc, &sequence, ReorderMode::Permutation).unwrap_err();
            assert!(matches!(
                err,
                PagewrightError::Validation(ValidationError::NotAPermutation { total: 3 })
            ));
        }
    }

    #[test]
    fn free_mode_allows_duplicates() {
        let doc = sample_document(&["1", "2", "3"]);
        let reordered = reorder(&doc, &PageSelector::sequence([2, 2, 0]), ReorderMode::Free)
            .expect("reorder");
        assert_eq!(labels(&reordered), vec!["3", "3", "1"]);
    }

    #[test]
    fn reorder_rejects_out_of_range_index() {
        let doc = sample_document(&["1", "2"]);
        let err = reorder(&doc, &PageSelector::sequence([0, 5]), ReorderMode::Free).unwrap_err();
        assert!(matches!(
            err,
            PagewrightError::Validation(ValidationError::PageOutOfRange { page: 6, total: 2 })
        ));
    }

    #[test]
    fn rotate_only_touches_targets() {
        let doc = sample_document(&["1", "2", "3"]);
        let targets = RotationTargets::Pages(PageSelector::set([1]));
        let rotated = rotate(&doc, Rotation::QUARTER, &targets);
        let degrees: Vec<u16> = rotated.pages().iter().map(|p| p.rotation().degrees()).collect();
        assert_eq!(degrees, vec![0, 90, 0]);
    }

    #[test]
    fn rotation_accumulates() {
        let doc = sample_document(&["1"]);
        let once = rotate(&doc, Rotation::THREE_QUARTERS, &RotationTargets::All);
        let twice = rotate(&once, Rotation::HALF, &RotationTargets::All);
        assert_eq!(twice.pages()[0].rotation(), Rotation::QUARTER);
    }

    #[test]
    fn insert_at_each_boundary() {
        let original = sample_document(&["o1", "o2", "o3"]);
        let inserted = sample_document(&["i1", "i2"]);

        let start = insert_pages(&original, &inserted, InsertPosition::Start).expect("start");
        assert_eq!(labels(&start), vec!["i1", "i2", "o1", "o2", "o3"]);

        let end = insert_pages(&original, &inserted, InsertPosition::End).expect("end");
        assert_eq!(labels(&end), vec!["o1", "o2", "o3", "i1", "i2"]);

        let middle = insert_pages(&original, &inserted, InsertPosition::At(1)).expect("at 1");
        assert_eq!(labels(&middle), vec!["o1", "i1", "i2", "o2", "o3"]);
    }

    #[test]
    fn insert_offsets_at_the_edges_match_start_and_end() {
        let original = sample_document(&["o1", "o2", "o3"]);
        let inserted = sample_document(&["i1", "i2"]);

        let at_zero = insert_pages(&original, &inserted, InsertPosition::At(0)).expect("at 0");
        let start = insert_pages(&original, &inserted, InsertPosition::Start).expect("start");
        assert_eq!(labels(&at_zero), labels(&start));

        let at_end = insert_pages(&original, &inserted, InsertPosition::At(3)).expect("at 3");
        let end = insert_pages(&original, &inserted, InsertPosition::End).expect("end");
        assert_eq!(labels(&at_end), labels(&end));
    }

    #[test]
    fn insert_beyond_end_is_not_clamped() {
        let original = sample_document(&["o1", "o2", "o3"]);
        let inserted = sample_document(&["i1"]);
        let err = insert_pages(&original, &inserted, InsertPosition::At(4)).unwrap_err();
        assert!(matches!(
            err,
            PagewrightError::Validation(ValidationError::PositionOutOfRange { position: 4, total: 3 })
        ));
    }

    #[test]
    fn sort_by_content_is_alphabetical_and_stable() {
        let doc = sample_document(&["pear", "apple", "fig", "apple"]);
        let sorted = sort_by_content(&doc);
        assert_eq!(labels(&sorted), vec!["apple", "apple", "fig", "pear"]);
        let sources: Vec<u32> = sorted.pages().iter().map(Page::source_number).collect();
        assert_eq!(sources, vec![2, 4, 3, 1]);
    }

    #[test]
    fn select_picks_indices_in_order() {
        let doc = sample_document(&["a", "b", "c"]);
        let picked = select(&doc, &[2, 0]).expect("select");
        assert_eq!(labels(&picked), vec!["c", "a"]);
    }
}
