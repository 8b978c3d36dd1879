//! PDF split.
//!
//! Extracts pages from one document in one of three mutually exclusive
//! modes, each with its own output cardinality: an explicit page set (one
//! document), a contiguous range (one document), or one document per page.

use crate::artifact::OutputArtifact;
use crate::document::LoadedDocument;
use crate::error::ToolError;
use crate::naming;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The user's page selection for a split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum SplitSelection {
    /// Individually toggled pages (1-based). Output order is ascending page
    /// order regardless of the order pages were toggled in.
    Pages { pages: BTreeSet<u32> },
    /// Inclusive 1-based range. `start > end` is a blocked state, never
    /// auto-swapped.
    Range { start: u32, end: u32 },
    /// One single-page document per source page.
    EachPage,
}

impl SplitSelection {
    /// Whether this selection can execute against a document with
    /// `page_count` pages. Mirrors `validate` without constructing errors,
    /// for enabling/disabling the split action in the UI.
    pub fn is_executable(&self, page_count: u32) -> bool {
        self.validate(page_count).is_ok()
    }

    /// Re-validate against the current page count. Selections are checked
    /// immediately before execution so a document swap invalidates any
    /// stale selection.
    pub fn validate(&self, page_count: u32) -> Result<(), ToolError> {
        match self {
            SplitSelection::Pages { pages } => {
                if pages.is_empty() {
                    return Err(ToolError::InvalidSelection("No pages selected".into()));
                }
                for &page in pages {
                    if page == 0 || page > page_count {
                        return Err(ToolError::InvalidSelection(format!(
                            "Page {} is out of range (1-{})",
                            page, page_count
                        )));
                    }
                }
                Ok(())
            }
            SplitSelection::Range { start, end } => {
                if *start == 0 || *end == 0 {
                    return Err(ToolError::InvalidSelection(
                        "Page numbers must be >= 1".into(),
                    ));
                }
                if start > end {
                    return Err(ToolError::InvalidSelection(format!(
                        "Range start {} exceeds end {}",
                        start, end
                    )));
                }
                if *end > page_count {
                    return Err(ToolError::InvalidSelection(format!(
                        "Page {} is out of range (1-{})",
                        end, page_count
                    )));
                }
                Ok(())
            }
            SplitSelection::EachPage => Ok(()),
        }
    }
}

/// Clamp a user-edited range bound into `[1, page_count]`.
///
/// Clamping happens on edit; an inverted range survives clamping and stays
/// blocked until the user fixes it.
pub fn clamp_bound(value: u32, page_count: u32) -> u32 {
    value.clamp(1, page_count.max(1))
}

/// Execute a split, producing one artifact (Pages, Range) or `page_count`
/// artifacts (EachPage).
///
/// All-or-nothing: if any page extraction fails, no artifacts are returned.
pub fn split_document(
    doc: &LoadedDocument,
    selection: &SplitSelection,
    source_name: &str,
) -> Result<Vec<OutputArtifact>, ToolError> {
    selection.validate(doc.page_count())?;

    match selection {
        SplitSelection::Pages { pages } => {
            let ordered: Vec<u32> = pages.iter().copied().collect();
            let bytes = doc.extract_pages(&ordered)?;
            Ok(vec![OutputArtifact::new(
                naming::extracted_name(source_name),
                bytes,
            )])
        }
        SplitSelection::Range { start, end } => {
            let ordered: Vec<u32> = (*start..=*end).collect();
            let bytes = doc.extract_pages(&ordered)?;
            Ok(vec![OutputArtifact::new(
                naming::range_name(source_name, *start, *end),
                bytes,
            )])
        }
        SplitSelection::EachPage => {
            let mut artifacts = Vec::with_capacity(doc.page_count() as usize);
            for page in 1..=doc.page_count() {
                let bytes = doc.extract_pages(&[page])?;
                artifacts.push(OutputArtifact::new(
                    naming::page_name(source_name, page),
                    bytes,
                ));
            }
            Ok(artifacts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::test_pdf::{create_test_pdf, page_text};

    fn load(bytes: &[u8]) -> LoadedDocument {
        LoadedDocument::from_bytes(bytes).unwrap()
    }

    fn pages(set: &[u32]) -> SplitSelection {
        SplitSelection::Pages {
            pages: set.iter().copied().collect(),
        }
    }

    #[test]
    fn test_explicit_selection_single_output() {
        let pdf = create_test_pdf(5, "Doc");
        let doc = load(&pdf);

        let artifacts = split_document(&doc, &pages(&[1, 3, 5]), "doc.pdf").unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].filename, "doc_extracted.pdf");
        assert_eq!(load(&artifacts[0].bytes).page_count(), 3);
    }

    #[test]
    fn test_explicit_selection_is_toggle_order_independent() {
        let pdf = create_test_pdf(6, "Doc");
        let doc = load(&pdf);

        // Same set, different insertion order
        let clicked_forward = pages(&[2, 4, 6]);
        let clicked_backward = pages(&[6, 4, 2]);

        let a = split_document(&doc, &clicked_forward, "doc.pdf").unwrap();
        let b = split_document(&doc, &clicked_backward, "doc.pdf").unwrap();

        for (page, marker) in [(1, "Doc-Page-2"), (2, "Doc-Page-4"), (3, "Doc-Page-6")] {
            assert!(page_text(&a[0].bytes, page).contains(marker));
            assert!(page_text(&b[0].bytes, page).contains(marker));
        }
    }

    #[test]
    fn test_range_split_correctness() {
        // Range [3, 7] of a 10-page doc: 5 pages, page i == input page i+2
        let pdf = create_test_pdf(10, "Doc");
        let doc = load(&pdf);

        let selection = SplitSelection::Range { start: 3, end: 7 };
        let artifacts = split_document(&doc, &selection, "doc.pdf").unwrap();

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].filename, "doc_pages_3-7.pdf");
        let out = &artifacts[0].bytes;
        assert_eq!(load(out).page_count(), 5);
        for i in 1..=5u32 {
            assert!(page_text(out, i).contains(&format!("Doc-Page-{}", i + 2)));
        }
    }

    #[test]
    fn test_each_page_cardinality() {
        let pdf = create_test_pdf(4, "Doc");
        let doc = load(&pdf);

        let artifacts = split_document(&doc, &SplitSelection::EachPage, "doc.pdf").unwrap();
        assert_eq!(artifacts.len(), 4);
        for (i, artifact) in artifacts.iter().enumerate() {
            let page = i as u32 + 1;
            assert_eq!(artifact.filename, format!("doc_page_{}.pdf", page));
            assert_eq!(load(&artifact.bytes).page_count(), 1);
            assert!(page_text(&artifact.bytes, 1).contains(&format!("Doc-Page-{}", page)));
        }
    }

    #[test]
    fn test_inverted_range_is_blocked_not_swapped() {
        let selection = SplitSelection::Range { start: 7, end: 3 };
        assert!(!selection.is_executable(10));
        assert!(matches!(
            selection.validate(10),
            Err(ToolError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_empty_selection_is_blocked() {
        assert!(!pages(&[]).is_executable(5));
    }

    #[test]
    fn test_stale_selection_rejected_after_page_count_change() {
        // Selection was made against a 10-page doc, then the file was
        // swapped for a 4-page one
        let selection = pages(&[2, 9]);
        assert!(selection.is_executable(10));
        assert!(!selection.is_executable(4));

        let pdf = create_test_pdf(4, "Doc");
        let result = split_document(&load(&pdf), &selection, "doc.pdf");
        assert!(matches!(result, Err(ToolError::InvalidSelection(_))));
    }

    #[test]
    fn test_zero_page_number_rejected() {
        assert!(pages(&[0, 1]).validate(5).is_err());
        assert!(SplitSelection::Range { start: 0, end: 2 }.validate(5).is_err());
    }

    #[test]
    fn test_clamp_bound() {
        assert_eq!(clamp_bound(0, 10), 1);
        assert_eq!(clamp_bound(5, 10), 5);
        assert_eq!(clamp_bound(99, 10), 10);
        // Degenerate document still yields a usable bound
        assert_eq!(clamp_bound(3, 0), 1);
    }
}
