//! PDF merge.
//!
//! Concatenates the pages of N loaded documents, in list order, into one
//! output document.

use crate::artifact::OutputArtifact;
use crate::document::LoadedDocument;
use crate::error::ToolError;
use crate::naming::MERGED_NAME;
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;

/// Merge documents in the order given.
///
/// The algorithm:
/// 1. Start from a copy of the first document.
/// 2. For each following document:
///    a. Offset every object ID past the destination's current maximum.
///    b. Import all objects with remapped IDs.
///    c. Append its page references, in their internal order.
/// 3. Rewrite the destination page tree's Kids/Count.
/// 4. Compress and serialize.
///
/// Output page order is therefore the concatenation of each input's pages in
/// list order; reordering inputs changes only page order, never content.
pub fn merge_documents(documents: &[&LoadedDocument]) -> Result<OutputArtifact, ToolError> {
    if documents.is_empty() {
        return Err(ToolError::Transform("No documents to merge".into()));
    }

    // Single document passes through unchanged
    if documents.len() == 1 {
        return Ok(OutputArtifact::new(MERGED_NAME, documents[0].to_bytes()?));
    }

    let mut dest = documents[0].inner().clone();
    let mut dest_max_id = dest.max_id;
    let mut dest_page_refs = page_references(&dest);

    for source in &documents[1..] {
        let source = source.inner().clone();
        let source_pages = page_references(&source);

        // Offset for object IDs so the imports cannot collide
        let id_offset = dest_max_id;

        let mut remapped_objects = BTreeMap::new();
        for (old_id, object) in source.objects.into_iter() {
            let new_id = (old_id.0 + id_offset, old_id.1);
            remapped_objects.insert(new_id, remap_object_refs(object, id_offset));
        }
        for (id, object) in remapped_objects {
            dest.objects.insert(id, object);
        }

        for old_page_ref in source_pages {
            dest_page_refs.push((old_page_ref.0 + id_offset, old_page_ref.1));
        }

        dest_max_id = (source.max_id + id_offset).max(dest_max_id);
    }

    update_page_tree(&mut dest, dest_page_refs)?;
    dest.max_id = dest_max_id;
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer)
        .map_err(|e| ToolError::Transform(format!("Failed to save merged PDF: {}", e)))?;

    Ok(OutputArtifact::new(MERGED_NAME, buffer))
}

/// All page object references of a document, in page order.
fn page_references(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// Recursively remap object references inside an object.
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Point the destination's root Pages node at the combined page list.
fn update_page_tree(doc: &mut Document, page_refs: Vec<ObjectId>) -> Result<(), ToolError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(|root| root.as_reference())
        .map_err(|_| ToolError::Transform("No Root reference in trailer".into()))?;

    let pages_id = doc
        .objects
        .get(&catalog_id)
        .and_then(|obj| obj.as_dict().ok())
        .and_then(|catalog| catalog.get(b"Pages").ok())
        .and_then(|pages| pages.as_reference().ok())
        .ok_or_else(|| ToolError::Transform("Catalog has no Pages reference".into()))?;

    if let Some(Object::Dictionary(ref mut pages_dict)) = doc.objects.get_mut(&pages_id) {
        let kids = page_refs
            .iter()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<_>>();
        pages_dict.set("Kids", Object::Array(kids));
        pages_dict.set("Count", Object::Integer(page_refs.len() as i64));
        Ok(())
    } else {
        Err(ToolError::Transform("Invalid pages dictionary".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::test_pdf::{create_test_pdf, page_text};

    fn load(bytes: &[u8]) -> LoadedDocument {
        LoadedDocument::from_bytes(bytes).unwrap()
    }

    #[test]
    fn test_merge_empty_fails() {
        let result = merge_documents(&[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_single_document_passes_through() {
        let pdf = create_test_pdf(2, "Single");
        let artifact = merge_documents(&[&load(&pdf)]).unwrap();

        assert_eq!(artifact.filename, "merged.pdf");
        assert_eq!(load(&artifact.bytes).page_count(), 2);
    }

    #[test]
    fn test_merge_concatenates_page_counts() {
        let doc_a = create_test_pdf(2, "DocA");
        let doc_b = create_test_pdf(3, "DocB");

        let (doc_a, doc_b) = (load(&doc_a), load(&doc_b));
        let artifact = merge_documents(&[&doc_a, &doc_b]).unwrap();
        assert_eq!(load(&artifact.bytes).page_count(), 5);
    }

    #[test]
    fn test_merge_page_order_follows_list_order() {
        // 3-page then 2-page: output page 4 must be the second input's page 1
        let doc_a = create_test_pdf(3, "First");
        let doc_b = create_test_pdf(2, "Second");

        let (doc_a, doc_b) = (load(&doc_a), load(&doc_b));
        let artifact = merge_documents(&[&doc_a, &doc_b]).unwrap();
        let merged = artifact.bytes;

        assert_eq!(load(&merged).page_count(), 5);
        assert!(page_text(&merged, 1).contains("First-Page-1"));
        assert!(page_text(&merged, 3).contains("First-Page-3"));
        assert!(page_text(&merged, 4).contains("Second-Page-1"));
        assert!(page_text(&merged, 5).contains("Second-Page-2"));
    }

    #[test]
    fn test_merge_reorder_changes_only_page_order() {
        let doc_a = create_test_pdf(1, "Alpha");
        let doc_b = create_test_pdf(1, "Beta");

        let (doc_a, doc_b) = (load(&doc_a), load(&doc_b));
        let forward = merge_documents(&[&doc_a, &doc_b]).unwrap();
        let reversed = merge_documents(&[&doc_b, &doc_a]).unwrap();

        assert_eq!(load(&forward.bytes).page_count(), 2);
        assert_eq!(load(&reversed.bytes).page_count(), 2);
        assert!(page_text(&forward.bytes, 1).contains("Alpha-Page-1"));
        assert!(page_text(&reversed.bytes, 1).contains("Beta-Page-1"));
    }

    #[test]
    fn test_merge_prefix_sum_mapping() {
        // Page counts 2, 1, 3: output page k maps to (input, local) via
        // prefix sums [2, 3, 6]
        let docs = [
            create_test_pdf(2, "D0"),
            create_test_pdf(1, "D1"),
            create_test_pdf(3, "D2"),
        ];
        let loaded: Vec<_> = docs.iter().map(|d| load(d)).collect();
        let refs: Vec<_> = loaded.iter().collect();

        let artifact = merge_documents(&refs).unwrap();
        let merged = artifact.bytes;

        assert_eq!(load(&merged).page_count(), 6);
        let expected = [
            (1, "D0-Page-1"),
            (2, "D0-Page-2"),
            (3, "D1-Page-1"),
            (4, "D2-Page-1"),
            (5, "D2-Page-2"),
            (6, "D2-Page-3"),
        ];
        for (page, marker) in expected {
            assert!(
                page_text(&merged, page).contains(marker),
                "output page {} should carry {}",
                page,
                marker
            );
        }
    }

    #[test]
    fn test_merged_document_is_valid_pdf() {
        let doc_a = create_test_pdf(2, "Valid1");
        let doc_b = create_test_pdf(2, "Valid2");

        let (doc_a, doc_b) = (load(&doc_a), load(&doc_b));
        let artifact = merge_documents(&[&doc_a, &doc_b]).unwrap();
        assert!(artifact.bytes.starts_with(b"%PDF-"));
        assert_eq!(load(&artifact.bytes).page_count(), 4);
    }
}
