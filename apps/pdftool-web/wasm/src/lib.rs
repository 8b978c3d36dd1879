//! WASM bindings for the portal's PDF utilities.
//!
//! Stateful, session-based API: all document state lives in Rust, JavaScript
//! only handles DOM events, file reads, and downloads.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { PdfToolSession, ToolMode, SplitMode } from './pkg/pdftool_wasm.js';
//!
//! await init();
//!
//! // Merge
//! const session = new PdfToolSession(ToolMode.Merge);
//! session.addDocument("a.pdf", file.type, bytesA);
//! session.addDocument("b.pdf", file.type, bytesB);
//! session.moveDocumentUp(1);
//! for (const artifact of session.execute()) {
//!   downloadBlob(artifact.bytes(), artifact.filename);
//! }
//!
//! // Split
//! const session = new PdfToolSession(ToolMode.Split);
//! session.addDocument("doc.pdf", file.type, bytes);
//! session.setSplitMode(SplitMode.Range);
//! session.setRange(3, 7);
//! const [artifact] = session.execute();
//! ```

pub mod image_session;
pub mod intake;
pub mod preview;
pub mod session;
pub mod validation;

use wasm_bindgen::prelude::*;

// Re-export main types for JavaScript
pub use image_session::{ImageToPdfSession, PageGeometry};
pub use session::{DownloadArtifact, PdfToolSession, SplitMode, ToolMode};
pub use validation::PdfInfo;

/// Log a diagnostic line to the browser console.
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        web_sys::console::log_1(&format!($($t)*).into());
    }
}

/// Initialize the WASM module; called automatically by wasm-bindgen.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Library version.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Quick PDF validation without a full parse.
#[wasm_bindgen]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    validation::quick_validate(bytes).map_err(|e| JsValue::from_str(&e))
}

/// Detailed PDF info without creating a session; useful for showing file
/// details before the user commits to an operation.
#[wasm_bindgen]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = validation::validate_pdf(bytes).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Format a byte count for display.
#[wasm_bindgen]
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_version() {
        assert!(!get_version().is_empty());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(2621440), "2.5 MB");
    }
}
