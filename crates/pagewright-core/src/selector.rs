// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page index resolution — turns user-facing page references ("1,3,5",
// "start", "end", "all") into validated, bounds-checked, 0-based indices.
//
// Every resolver takes the page count of the document it will be applied to,
// so a selector is only ever valid for that document. Nothing here clamps:
// an out-of-range reference is an error.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use tracing::debug;

use crate::error::{PagewrightError, ValidationError};
use crate::types::InsertPosition;

/// A validated selection of pages, stored as 0-based indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelector {
    /// Order irrelevant, duplicates collapsed (deletion, rotation targets).
    Set(BTreeSet<usize>),
    /// Order significant, duplicates kept (reordering).
    Sequence(Vec<usize>),
}

impl PageSelector {
    /// Build a set from 0-based indices.
    pub fn set(indices: impl IntoIterator<Item = usize>) -> Self {
        Self::Set(indices.into_iter().collect())
    }

    /// Build a sequence from 0-based indices.
    pub fn sequence(indices: impl IntoIterator<Item = usize>) -> Self {
        Self::Sequence(indices.into_iter().collect())
    }

    pub fn contains(&self, index: usize) -> bool {
        match self {
            Self::Set(set) => set.contains(&index),
            Self::Sequence(seq) => seq.contains(&index),
        }
    }

    /// Indices in selector order (ascending for sets).
    pub fn indices(&self) -> Vec<usize> {
        match self {
            Self::Set(set) => set.iter().copied().collect(),
            Self::Sequence(seq) => seq.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Set(set) => set.len(),
            Self::Sequence(seq) => seq.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which pages a rotation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationTargets {
    All,
    Pages(PageSelector),
}

impl RotationTargets {
    pub fn includes(&self, index: usize) -> bool {
        match self {
            Self::All => true,
            Self::Pages(selector) => selector.contains(index),
        }
    }
}

/// A contiguous run of pages, 1-based and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRange {
    pub start: u32,
    pub end: u32,
}

impl SplitRange {
    /// The range as 0-based indices.
    pub fn indices(&self) -> RangeInclusive<usize> {
        (self.start as usize - 1)..=(self.end as usize - 1)
    }

    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl std::fmt::Display for SplitRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "[{}]", self.start)
        } else {
            write!(f, "[{}-{}]", self.start, self.end)
        }
    }
}

/// Ranges derived from split points for a specific page count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    pub ranges: Vec<SplitRange>,
    /// Set when no split points were supplied and the plan is the whole
    /// document as a single part.
    pub whole_document: bool,
}

impl SplitPlan {
    /// Derive ranges from split points ("split after page p"). Points must lie
    /// in `[1, total - 1]`; they are sorted and de-duplicated here. An empty
    /// point list yields the whole document as one range.
    pub fn derive(points: &[u32], total: u32) -> Result<Self, PagewrightError> {
        if total == 0 {
            return Err(PagewrightError::EmptyResult(
                "cannot split a document with no pages".into(),
            ));
        }

        let mut sorted: Vec<u32> = points.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        if let Some(&bad) = sorted.iter().find(|&&p| p == 0 || p >= total) {
            return Err(ValidationError::SplitPointOutOfRange {
                point: u64::from(bad),
                total,
            }
            .into());
        }

        if sorted.is_empty() {
            return Ok(Self {
                ranges: vec![SplitRange {
                    start: 1,
                    end: total,
                }],
                whole_document: true,
            });
        }

        let mut ranges = Vec::with_capacity(sorted.len() + 1);
        let mut start = 1;
        for point in sorted {
            ranges.push(SplitRange { start, end: point });
            start = point + 1;
        }
        ranges.push(SplitRange { start, end: total });

        Ok(Self {
            ranges,
            whole_document: false,
        })
    }
}

// -- Parsing --------------------------------------------------------------------

/// Parse a comma-separated list of page numbers. Tokens are trimmed; tokens
/// that are not plain non-negative integers are dropped. Digit runs too long
/// for `u64` saturate to `u64::MAX` so they still fail the range checks.
/// Fails with `NoValidPages` when nothing usable remains.
pub fn parse_numbers(raw: &str) -> Result<Vec<u64>, ValidationError> {
    let numbers: Vec<u64> = raw
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
        .map(|token| token.parse::<u64>().unwrap_or(u64::MAX))
        .collect();

    if numbers.is_empty() {
        return Err(ValidationError::NoValidPages {
            input: raw.to_string(),
        });
    }
    Ok(numbers)
}

fn check_page(page: u64, total: u32) -> Result<usize, ValidationError> {
    if page == 0 || page > u64::from(total) {
        return Err(ValidationError::PageOutOfRange { page, total });
    }
    Ok(page as usize - 1)
}

// -- Resolvers ------------------------------------------------------------------

/// Resolve a page set (deletion, rotation targets). Every page must lie in
/// `[1, total]`.
pub fn resolve_page_set(raw: &str, total: u32) -> Result<PageSelector, ValidationError> {
    let numbers = parse_numbers(raw)?;
    let indices = numbers
        .into_iter()
        .map(|page| check_page(page, total))
        .collect::<Result<BTreeSet<_>, _>>()?;
    debug!(selected = indices.len(), total, "Resolved page set");
    Ok(PageSelector::Set(indices))
}

/// Resolve an ordered page sequence (reordering). Order and duplicates are
/// preserved; every page must lie in `[1, total]`.
pub fn resolve_sequence(raw: &str, total: u32) -> Result<PageSelector, ValidationError> {
    let numbers = parse_numbers(raw)?;
    let indices = numbers
        .into_iter()
        .map(|page| check_page(page, total))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PageSelector::Sequence(indices))
}

/// Resolve split points. Every point must lie in `[1, total - 1]`; the result
/// is sorted and de-duplicated.
pub fn resolve_split_points(raw: &str, total: u32) -> Result<Vec<u32>, ValidationError> {
    let numbers = parse_numbers(raw)?;
    if let Some(&bad) = numbers.iter().find(|&&p| p == 0 || p >= u64::from(total)) {
        return Err(ValidationError::SplitPointOutOfRange { point: bad, total });
    }
    // Every point is below `total`, so it fits in u32.
    let mut points: Vec<u32> = numbers.into_iter().map(|p| p as u32).collect();
    points.sort_unstable();
    points.dedup();
    Ok(points)
}

/// Resolve rotation targets: `"all"` or a page set.
pub fn resolve_rotation_targets(raw: &str, total: u32) -> Result<RotationTargets, ValidationError> {
    if raw.trim().eq_ignore_ascii_case("all") {
        return Ok(RotationTargets::All);
    }
    resolve_page_set(raw, total).map(RotationTargets::Pages)
}

/// Resolve an insertion boundary: `"start"`, `"end"`, or a page count offset
/// in `[0, total]`.
pub fn resolve_insert_position(raw: &str, total: u32) -> Result<InsertPosition, ValidationError> {
    let token = raw.trim();
    if token.eq_ignore_ascii_case("start") {
        return Ok(InsertPosition::Start);
    }
    if token.eq_ignore_ascii_case("end") {
        return Ok(InsertPosition::End);
    }
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::MalformedPosition {
            input: raw.to_string(),
        });
    }

    // Anything that overflows u64 is certainly out of range.
    let position = token.parse::<u64>().unwrap_or(u64::MAX);
    if position > total as u64 {
        return Err(ValidationError::PositionOutOfRange { position, total });
    }
    Ok(InsertPosition::At(position as u32))
}

/// Resolve a single 1-based page reference to a 0-based index. Exactly one
/// page number is accepted.
pub fn resolve_page(raw: &str, total: u32) -> Result<usize, ValidationError> {
    match parse_numbers(raw)?.as_slice() {
        [page] => check_page(*page, total),
        _ => Err(ValidationError::NotASinglePage {
            input: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_drops_non_numeric_tokens() {
        assert_eq!(parse_numbers(" 1, x ,3,-2, 4.5 ,5").unwrap(), vec![1, 3, 5]);
    }

    #[test]
    fn parse_fails_when_nothing_remains() {
        let err = parse_numbers("a,b,c").unwrap_err();
        assert_eq!(
            err,
            ValidationError::NoValidPages {
                input: "a,b,c".into()
            }
        );
        assert!(parse_numbers("").is_err());
        assert!(parse_numbers(" , ,").is_err());
    }

    #[test]
    fn oversized_numbers_are_kept_for_range_checks() {
        assert_eq!(
            parse_numbers("1, 4294967296, 99999999999999999999999").unwrap(),
            vec![1, 4_294_967_296, u64::MAX]
        );
    }

    #[test]
    fn page_set_collapses_duplicates_and_is_zero_based() {
        let selector = resolve_page_set("3,1,3", 5).unwrap();
        assert_eq!(selector, PageSelector::set([0, 2]));
        assert_eq!(selector.len(), 2);
    }

    #[test]
    fn page_set_rejects_out_of_range() {
        assert_eq!(
            resolve_page_set("1,6", 5).unwrap_err(),
            ValidationError::PageOutOfRange { page: 6, total: 5 }
        );
        assert_eq!(
            resolve_page_set("0", 5).unwrap_err(),
            ValidationError::PageOutOfRange { page: 0, total: 5 }
        );
    }

    #[test]
    fn numbers_beyond_u32_are_out_of_range() {
        assert_eq!(
            resolve_page_set("1,4294967296", 5).unwrap_err(),
            ValidationError::PageOutOfRange {
                page: 4_294_967_296,
                total: 5
            }
        );
        // The remaining tokens form a valid permutation; the huge one must
        // still sink the whole sequence.
        assert_eq!(
            resolve_sequence("2,1,3,4,5,4294967297", 5).unwrap_err(),
            ValidationError::PageOutOfRange {
                page: 4_294_967_297,
                total: 5
            }
        );
        assert_eq!(
            resolve_split_points("2,99999999999", 5).unwrap_err(),
            ValidationError::SplitPointOutOfRange {
                point: 99_999_999_999,
                total: 5
            }
        );
        assert!(matches!(
            resolve_page("99999999999999999999999", 5),
            Err(ValidationError::PageOutOfRange { page: u64::MAX, .. })
        ));
    }

    #[test]
    fn sequence_keeps_order_and_duplicates() {
        let selector = resolve_sequence("3, 1, 3", 3).unwrap();
        assert_eq!(selector, PageSelector::sequence([2, 0, 2]));
        assert!(resolve_sequence("1,4", 3).is_err());
    }

    #[test]
    fn split_point_at_page_count_is_rejected() {
        assert_eq!(
            resolve_split_points("5", 5).unwrap_err(),
            ValidationError::SplitPointOutOfRange { point: 5, total: 5 }
        );
        assert!(resolve_split_points("4", 5).is_ok());
    }

    #[test]
    fn split_points_are_sorted_and_deduplicated() {
        assert_eq!(resolve_split_points("4, 2,4", 5).unwrap(), vec![2, 4]);
    }

    #[test]
    fn split_plan_for_five_pages_at_two_and_four() {
        let points = resolve_split_points("2,4", 5).unwrap();
        let plan = SplitPlan::derive(&points, 5).unwrap();
        assert!(!plan.whole_document);
        assert_eq!(
            plan.ranges,
            vec![
                SplitRange { start: 1, end: 2 },
                SplitRange { start: 3, end: 4 },
                SplitRange { start: 5, end: 5 },
            ]
        );
    }

    #[test]
    fn split_plan_ranges_cover_document_without_gaps() {
        for total in 2..9u32 {
            for point in 1..total {
                let plan = SplitPlan::derive(&[point], total).unwrap();
                let covered: Vec<usize> = plan.ranges.iter().flat_map(|r| r.indices()).collect();
                assert_eq!(covered, (0..total as usize).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn split_plan_without_points_is_whole_document() {
        let plan = SplitPlan::derive(&[], 3).unwrap();
        assert!(plan.whole_document);
        assert_eq!(plan.ranges, vec![SplitRange { start: 1, end: 3 }]);
    }

    #[test]
    fn split_plan_of_empty_document_fails() {
        assert!(matches!(
            SplitPlan::derive(&[], 0),
            Err(PagewrightError::EmptyResult(_))
        ));
    }

    #[test]
    fn insert_position_literals_and_offsets() {
        assert_eq!(resolve_insert_position("start", 4), Ok(InsertPosition::Start));
        assert_eq!(resolve_insert_position(" END ", 4), Ok(InsertPosition::End));
        assert_eq!(resolve_insert_position("0", 4), Ok(InsertPosition::At(0)));
        assert_eq!(resolve_insert_position("4", 4), Ok(InsertPosition::At(4)));
    }

    #[test]
    fn insert_position_out_of_range_is_not_clamped() {
        assert_eq!(
            resolve_insert_position("5", 4),
            Err(ValidationError::PositionOutOfRange {
                position: 5,
                total: 4
            })
        );
        assert!(matches!(
            resolve_insert_position("99999999999999999999999", 4),
            Err(ValidationError::PositionOutOfRange { .. })
        ));
    }

    #[test]
    fn insert_position_malformed() {
        for raw in ["", "middle", "-1", "2.5"] {
            assert!(matches!(
                resolve_insert_position(raw, 4),
                Err(ValidationError::MalformedPosition { .. })
            ));
        }
    }

    #[test]
    fn rotation_targets_all_or_set() {
        assert_eq!(resolve_rotation_targets("ALL", 3), Ok(RotationTargets::All));
        let targets = resolve_rotation_targets("2", 3).unwrap();
        assert!(targets.includes(1));
        assert!(!targets.includes(0));
    }

    #[test]
    fn single_page_reference() {
        assert_eq!(resolve_page("2", 3), Ok(1));
        assert!(resolve_page("4", 3).is_err());
        assert!(resolve_page("x", 3).is_err());
    }

    #[test]
    fn single_page_reference_rejects_lists() {
        assert_eq!(
            resolve_page("2,3", 3),
            Err(ValidationError::NotASinglePage {
                input: "2,3".into()
            })
        );
        // Junk around one number still leaves a single page.
        assert_eq!(resolve_page(" 2, x", 3), Ok(1));
    }
}
