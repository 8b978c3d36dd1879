use thiserror::Error;

/// Error taxonomy for the toolkit.
///
/// Every failure is recovered at the operation boundary; none of these
/// escalate past the session that triggered them.
#[derive(Error, Debug)]
pub enum ToolError {
    /// A file was rejected before any parsing took place (wrong media type,
    /// oversized, batch cap exceeded).
    #[error("Invalid file: {0}")]
    Validation(String),

    /// Bytes did not parse as a PDF document.
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    /// A page selection referenced pages outside the document, or was
    /// otherwise non-executable (empty set, inverted range).
    #[error("Invalid page selection: {0}")]
    InvalidSelection(String),

    /// Page copy, re-encode, or serialization failed mid-transform.
    /// No partial artifact is exposed when this is returned.
    #[error("Transform failed: {0}")]
    Transform(String),

    /// A single image could not be decoded to pixels. Callers skip the
    /// offending file and continue the batch.
    #[error("Could not decode image: {0}")]
    Resource(String),
}
