//! Client-side PDF operations
//!
//! This crate holds the document-manipulation core behind the portal's PDF
//! utilities: merge, split, compress, and image-to-PDF, plus the shared
//! document model, output naming, and the worker command protocol. All
//! processing is local; nothing here touches the network or a filesystem.

pub mod artifact;
pub mod command;
pub mod compress;
pub mod document;
pub mod error;
pub mod images;
pub mod merge;
pub mod naming;
pub mod order;
pub mod split;

pub use artifact::OutputArtifact;
pub use command::{run_command, ProcessMetrics, ProcessResult, ToolCommand};
pub use compress::{compress_document, CompressReport};
pub use document::LoadedDocument;
pub use error::ToolError;
pub use images::{images_to_pdf, ConvertOutcome, ImageInput, PageSize};
pub use merge::merge_documents;
pub use order::OrderedList;
pub use split::{clamp_bound, split_document, SplitSelection};

/// Parse PDF bytes and return the page count.
pub fn get_page_count(bytes: &[u8]) -> Result<u32, ToolError> {
    Ok(LoadedDocument::from_bytes(bytes)?.page_count())
}

/// Parse a page list string like "1-3, 5, 8-10" into sorted unique page
/// numbers.
pub fn parse_page_list(input: &str) -> Result<Vec<u32>, ToolError> {
    use std::collections::BTreeSet;

    let mut pages = BTreeSet::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start.trim().parse().map_err(|_| {
                ToolError::InvalidSelection(format!("Invalid start: {}", start))
            })?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| ToolError::InvalidSelection(format!("Invalid end: {}", end)))?;

            if start > end {
                return Err(ToolError::InvalidSelection(format!(
                    "Start {} > end {}",
                    start, end
                )));
            }

            for page in start..=end {
                pages.insert(page);
            }
        } else {
            let page: u32 = part
                .parse()
                .map_err(|_| ToolError::InvalidSelection(format!("Invalid page: {}", part)))?;
            pages.insert(page);
        }
    }

    Ok(pages.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_get_page_count() {
        let pdf = document::test_pdf::create_test_pdf(4, "Doc");
        assert_eq!(get_page_count(&pdf).unwrap(), 4);
    }

    #[test]
    fn test_get_page_count_rejects_garbage() {
        assert!(get_page_count(b"nope").is_err());
    }

    #[test]
    fn test_parse_page_list_single() {
        assert_eq!(parse_page_list("5").unwrap(), vec![5]);
    }

    #[test]
    fn test_parse_page_list_range() {
        assert_eq!(parse_page_list("1-3").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_page_list_complex() {
        assert_eq!(
            parse_page_list("1-3, 5, 8-10").unwrap(),
            vec![1, 2, 3, 5, 8, 9, 10]
        );
    }

    #[test]
    fn test_parse_page_list_deduplicates() {
        assert_eq!(parse_page_list("1-3, 2-4").unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_parse_page_list_rejects_inverted_range() {
        assert!(parse_page_list("7-3").is_err());
    }

    #[test]
    fn test_parse_page_list_rejects_junk() {
        assert!(parse_page_list("abc").is_err());
        assert!(parse_page_list("1-x").is_err());
    }

    proptest! {
        #[test]
        fn prop_parse_page_list_roundtrips_sets(
            pages in proptest::collection::btree_set(1u32..500, 1..20)
        ) {
            let input = pages
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let parsed = parse_page_list(&input).unwrap();
            prop_assert_eq!(parsed, pages.into_iter().collect::<Vec<_>>());
        }
    }
}
