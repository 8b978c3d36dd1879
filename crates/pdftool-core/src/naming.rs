//! Deterministic output filenames.
//!
//! Every artifact name is derived from the source filename plus an
//! operation-specific suffix, so repeated runs over the same input produce
//! the same downloads.

/// Fixed name for merge output.
pub const MERGED_NAME: &str = "merged.pdf";

/// Fixed name for image-to-PDF output.
pub const IMAGES_NAME: &str = "images.pdf";

/// Strip a trailing `.pdf` (case-insensitive) from a filename.
///
/// Other extensions are left alone so `scan.PDF` and `scan` both become
/// `scan` while `notes.txt` stays `notes.txt`.
pub fn base_stem(filename: &str) -> &str {
    let bytes = filename.as_bytes();
    let len = bytes.len();
    if len > 4 && bytes[len - 4..].eq_ignore_ascii_case(b".pdf") {
        &filename[..len - 4]
    } else {
        filename
    }
}

/// `<base>_compressed.pdf`
pub fn compressed_name(source: &str) -> String {
    format!("{}_compressed.pdf", base_stem(source))
}

/// `<base>_extracted.pdf`, the explicit page-selection split output.
pub fn extracted_name(source: &str) -> String {
    format!("{}_extracted.pdf", base_stem(source))
}

/// `<base>_pages_<start>-<end>.pdf`, the range split output.
pub fn range_name(source: &str, start: u32, end: u32) -> String {
    format!("{}_pages_{}-{}.pdf", base_stem(source), start, end)
}

/// `<base>_page_<n>.pdf`, the per-page split output.
pub fn page_name(source: &str, page: u32) -> String {
    format!("{}_page_{}.pdf", base_stem(source), page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_stem_strips_pdf_extension() {
        assert_eq!(base_stem("report.pdf"), "report");
        assert_eq!(base_stem("report.PDF"), "report");
        assert_eq!(base_stem("report"), "report");
        assert_eq!(base_stem("notes.txt"), "notes.txt");
    }

    #[test]
    fn test_base_stem_keeps_inner_dots() {
        assert_eq!(base_stem("2024.q3.invoice.pdf"), "2024.q3.invoice");
    }

    #[test]
    fn test_base_stem_short_names() {
        // ".pdf" alone has no stem to strip down to
        assert_eq!(base_stem(".pdf"), ".pdf");
        assert_eq!(base_stem("a.pdf"), "a");
    }

    #[test]
    fn test_suffixed_names() {
        assert_eq!(compressed_name("cv.pdf"), "cv_compressed.pdf");
        assert_eq!(extracted_name("cv.pdf"), "cv_extracted.pdf");
        assert_eq!(range_name("cv.pdf", 3, 7), "cv_pages_3-7.pdf");
        assert_eq!(page_name("cv.pdf", 4), "cv_page_4.pdf");
    }
}
