//! Per-file PDF validation and info extraction.

use lopdf::Document;
use serde::Serialize;

/// What the UI shows about an accepted PDF before any operation runs.
#[derive(Debug, Clone, Serialize, Default)]
pub struct PdfInfo {
    /// Number of pages in the document
    pub page_count: u32,
    /// PDF version string from the header (e.g. "1.7")
    pub version: String,
    /// Whether the document is encrypted; operations on it may fail
    pub encrypted: bool,
    /// File size in bytes
    pub size_bytes: usize,
    /// Document title from metadata, if any
    pub title: Option<String>,
    /// Document author from metadata, if any
    pub author: Option<String>,
}

/// Fully validate PDF bytes and extract display info.
pub fn validate_pdf(bytes: &[u8]) -> Result<PdfInfo, String> {
    if bytes.len() < 8 {
        return Err("File too small to be a valid PDF".to_string());
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err("Not a valid PDF file (missing %PDF- header)".to_string());
    }

    let document = Document::load_mem(bytes).map_err(|e| format!("Failed to parse PDF: {}", e))?;

    let page_count = document.get_pages().len() as u32;
    if page_count == 0 {
        return Err("PDF has no pages".to_string());
    }

    Ok(PdfInfo {
        page_count,
        version: header_version(bytes),
        encrypted: document.is_encrypted(),
        size_bytes: bytes.len(),
        title: info_string(&document, b"Title"),
        author: info_string(&document, b"Author"),
    })
}

/// Cheap validation without a full parse, for screening large files before
/// committing to a read: header magic plus an EOF marker near the tail.
pub fn quick_validate(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() < 8 {
        return Err("File too small to be a valid PDF".to_string());
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err("Not a valid PDF file (missing %PDF- header)".to_string());
    }

    let tail = if bytes.len() > 1024 {
        &bytes[bytes.len() - 1024..]
    } else {
        bytes
    };
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err("PDF appears truncated (missing %%EOF marker)".to_string());
    }

    Ok(())
}

/// Version from the `%PDF-x.y` header.
fn header_version(bytes: &[u8]) -> String {
    bytes
        .get(5..8)
        .and_then(|v| std::str::from_utf8(v).ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "1.4".to_string())
}

/// A string entry from the trailer's Info dictionary, if present and
/// non-empty.
fn info_string(document: &Document, key: &[u8]) -> Option<String> {
    let info_id = document
        .trailer
        .get(b"Info")
        .and_then(|obj| obj.as_reference())
        .ok()?;
    let info = document.objects.get(&info_id)?.as_dict().ok()?;
    let raw = info.get(key).and_then(|obj| obj.as_str()).ok()?;

    let decoded = String::from_utf8_lossy(raw);
    if decoded.is_empty() {
        None
    } else {
        Some(decoded.into_owned())
    }
}
