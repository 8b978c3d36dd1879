//! Page-addressable document model.
//!
//! `LoadedDocument` is the single concrete type behind every operation:
//! parse once, then read page count, page geometry, or copy pages out into a
//! fresh serialized document. Parsing failures never expose a partial
//! document; the constructor either returns a fully usable value or an error.

use crate::error::ToolError;
use lopdf::{Document, Object};

/// An in-memory, page-addressable parse of one source PDF.
///
/// Owned exclusively by the operation that loaded it; pages are copied, never
/// shared, when building outputs.
pub struct LoadedDocument {
    doc: Document,
    page_count: u32,
}

impl LoadedDocument {
    /// Parse raw bytes into a document.
    ///
    /// Rejects byte streams that parse but contain no pages, since every
    /// operation here addresses pages.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ToolError> {
        let doc = Document::load_mem(bytes).map_err(|e| ToolError::Parse(e.to_string()))?;

        let page_count = doc.get_pages().len() as u32;
        if page_count == 0 {
            return Err(ToolError::Parse("PDF has no pages".into()));
        }

        Ok(Self { doc, page_count })
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Width and height in points of a page (1-based).
    ///
    /// Follows the Parent chain for inherited MediaBox entries; documents
    /// with no MediaBox anywhere fall back to US Letter.
    pub fn page_dimensions(&self, page: u32) -> Result<(f32, f32), ToolError> {
        self.check_page(page)?;

        let pages = self.doc.get_pages();
        let page_id = pages.get(&page).ok_or_else(|| {
            ToolError::InvalidSelection(format!("Page {} not found", page))
        })?;

        let page_dict = self
            .doc
            .objects
            .get(page_id)
            .and_then(|obj| obj.as_dict().ok())
            .ok_or_else(|| ToolError::Transform(format!("Page {} is not a dictionary", page)))?;

        let media_box = media_box_for(&self.doc, page_dict);
        Ok((
            (media_box[2] - media_box[0]) as f32,
            (media_box[3] - media_box[1]) as f32,
        ))
    }

    /// Copy the given pages (1-based, ascending) into a new serialized
    /// document.
    ///
    /// Page content and geometry are preserved; pages keep the source
    /// document's internal order. Any page number outside
    /// `[1, page_count]` is an error before any work happens.
    pub fn extract_pages(&self, pages: &[u32]) -> Result<Vec<u8>, ToolError> {
        if pages.is_empty() {
            return Err(ToolError::InvalidSelection("No pages selected".into()));
        }
        for &page in pages {
            self.check_page(page)?;
        }

        // Whitelist construction: clone, delete the complement, then drop
        // everything the surviving pages no longer reference.
        let keep: std::collections::HashSet<u32> = pages.iter().copied().collect();
        let delete: Vec<u32> = (1..=self.page_count)
            .filter(|p| !keep.contains(p))
            .collect();

        let mut out = self.doc.clone();
        out.delete_pages(&delete);
        out.prune_objects();
        out.compress();

        let mut buffer = Vec::new();
        out.save_to(&mut buffer)
            .map_err(|e| ToolError::Transform(format!("Save failed: {}", e)))?;

        Ok(buffer)
    }

    /// Serialize the document unchanged.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ToolError> {
        let mut doc = self.doc.clone();
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| ToolError::Transform(format!("Save failed: {}", e)))?;
        Ok(buffer)
    }

    /// Access to the underlying parse for operations that walk objects
    /// directly (merge's ID remapping).
    pub(crate) fn inner(&self) -> &Document {
        &self.doc
    }

    fn check_page(&self, page: u32) -> Result<(), ToolError> {
        if page == 0 || page > self.page_count {
            return Err(ToolError::InvalidSelection(format!(
                "Page {} does not exist (document has {} pages)",
                page, self.page_count
            )));
        }
        Ok(())
    }
}

/// MediaBox of a page, inheriting from the parent page-tree node when the
/// page itself carries none.
fn media_box_for(doc: &Document, page_dict: &lopdf::Dictionary) -> [f64; 4] {
    if let Ok(found) = page_dict.get(b"MediaBox") {
        if let Some(parsed) = found.as_array().ok().and_then(|a| parse_box(a)) {
            return parsed;
        }
    }

    if let Ok(parent_id) = page_dict.get(b"Parent").and_then(|p| p.as_reference()) {
        if let Some(parent_dict) = doc.objects.get(&parent_id).and_then(|o| o.as_dict().ok()) {
            if let Ok(found) = parent_dict.get(b"MediaBox") {
                if let Some(parsed) = found.as_array().ok().and_then(|a| parse_box(a)) {
                    return parsed;
                }
            }
        }
    }

    // US Letter
    [0.0, 0.0, 612.0, 792.0]
}

fn parse_box(array: &[Object]) -> Option<[f64; 4]> {
    if array.len() != 4 {
        return None;
    }
    let mut result = [0.0; 4];
    for (i, obj) in array.iter().enumerate() {
        result[i] = match obj {
            Object::Integer(n) => *n as f64,
            Object::Real(n) => *n as f64,
            _ => return None,
        };
    }
    Some(result)
}


#[cfg(test)]
mod tests {
    use super::test_pdf::{create_test_pdf, page_text};
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let result = LoadedDocument::from_bytes(b"not a valid pdf");
        assert!(matches!(result, Err(ToolError::Parse(_))));
    }

    #[test]
    fn test_from_bytes_reports_page_count() {
        let pdf = create_test_pdf(7, "Doc");
        let doc = LoadedDocument::from_bytes(&pdf).unwrap();
        assert_eq!(doc.page_count(), 7);
    }

    #[test]
    fn test_page_dimensions() {
        let pdf = create_test_pdf(1, "Doc");
        let doc = LoadedDocument::from_bytes(&pdf).unwrap();
        let (width, height) = doc.page_dimensions(1).unwrap();
        assert_eq!(width, 612.0);
        assert_eq!(height, 792.0);
    }

    #[test]
    fn test_page_dimensions_out_of_range() {
        let pdf = create_test_pdf(1, "Doc");
        let doc = LoadedDocument::from_bytes(&pdf).unwrap();
        assert!(doc.page_dimensions(0).is_err());
        assert!(doc.page_dimensions(2).is_err());
    }

    #[test]
    fn test_extract_pages_keeps_content_and_order() {
        let pdf = create_test_pdf(5, "Doc");
        let doc = LoadedDocument::from_bytes(&pdf).unwrap();

        let out = doc.extract_pages(&[2, 4]).unwrap();
        let extracted = LoadedDocument::from_bytes(&out).unwrap();
        assert_eq!(extracted.page_count(), 2);
        assert!(page_text(&out, 1).contains("Doc-Page-2"));
        assert!(page_text(&out, 2).contains("Doc-Page-4"));
    }

    #[test]
    fn test_extract_pages_preserves_dimensions() {
        let pdf = create_test_pdf(3, "Doc");
        let doc = LoadedDocument::from_bytes(&pdf).unwrap();

        let out = doc.extract_pages(&[3]).unwrap();
        let extracted = LoadedDocument::from_bytes(&out).unwrap();
        assert_eq!(extracted.page_dimensions(1).unwrap(), (612.0, 792.0));
    }

    #[test]
    fn test_extract_pages_rejects_empty_selection() {
        let pdf = create_test_pdf(3, "Doc");
        let doc = LoadedDocument::from_bytes(&pdf).unwrap();
        assert!(matches!(
            doc.extract_pages(&[]),
            Err(ToolError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_extract_pages_rejects_out_of_range() {
        let pdf = create_test_pdf(3, "Doc");
        let doc = LoadedDocument::from_bytes(&pdf).unwrap();
        assert!(doc.extract_pages(&[0]).is_err());
        assert!(doc.extract_pages(&[4]).is_err());
        // A bad index fails the whole call, it never partially extracts
        assert!(doc.extract_pages(&[1, 4]).is_err());
    }

    #[test]
    fn test_to_bytes_roundtrips() {
        let pdf = create_test_pdf(2, "Doc");
        let doc = LoadedDocument::from_bytes(&pdf).unwrap();
        let bytes = doc.to_bytes().unwrap();
        let reloaded = LoadedDocument::from_bytes(&bytes).unwrap();
        assert_eq!(reloaded.page_count(), 2);
    }
}
