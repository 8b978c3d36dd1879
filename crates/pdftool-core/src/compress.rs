//! PDF compress.
//!
//! Best-effort, non-lossy size reduction: document metadata is cleared and
//! streams are compressed on re-serialization. Page count, content, and
//! geometry are never altered.

use crate::artifact::OutputArtifact;
use crate::error::ToolError;
use crate::naming;
use lopdf::{Document, Object};
use serde::Serialize;

/// Info-dictionary keys cleared during compression.
const METADATA_KEYS: [&[u8]; 6] = [
    b"Title",
    b"Author",
    b"Subject",
    b"Keywords",
    b"Producer",
    b"Creator",
];

/// Size outcome of a compression run.
#[derive(Debug, Clone, Serialize)]
pub struct CompressReport {
    pub original_size: usize,
    pub compressed_size: usize,
    /// Percentage saved, clamped to zero. An input that was already optimal
    /// reports 0, never a negative number.
    pub savings_percent: f32,
}

/// Compress one PDF, returning the artifact and a size report.
pub fn compress_document(
    bytes: &[u8],
    source_name: &str,
) -> Result<(OutputArtifact, CompressReport), ToolError> {
    let mut doc = Document::load_mem(bytes).map_err(|e| ToolError::Parse(e.to_string()))?;

    strip_metadata(&mut doc);
    doc.prune_objects();
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ToolError::Transform(format!("Failed to save compressed PDF: {}", e)))?;

    let report = CompressReport {
        original_size: bytes.len(),
        compressed_size: buffer.len(),
        savings_percent: savings_percent(bytes.len(), buffer.len()),
    };

    Ok((
        OutputArtifact::new(naming::compressed_name(source_name), buffer),
        report,
    ))
}

/// Percentage saved going from `original` to `compressed`, floored at zero.
fn savings_percent(original: usize, compressed: usize) -> f32 {
    if original == 0 || compressed >= original {
        return 0.0;
    }
    (1.0 - compressed as f32 / original as f32) * 100.0
}

/// Clear title/author/subject/keywords/producer/creator from the Info
/// dictionary, whether it is referenced from the trailer or inlined there.
fn strip_metadata(doc: &mut Document) {
    let info_id = doc
        .trailer
        .get(b"Info")
        .and_then(|obj| obj.as_reference())
        .ok();

    if let Some(id) = info_id {
        if let Some(Object::Dictionary(dict)) = doc.objects.get_mut(&id) {
            for key in METADATA_KEYS {
                dict.remove(key);
            }
        }
    } else if let Ok(Object::Dictionary(dict)) = doc.trailer.get_mut(b"Info") {
        for key in METADATA_KEYS {
            dict.remove(key);
        }
    }
}
