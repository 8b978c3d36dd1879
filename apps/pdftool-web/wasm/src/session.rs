//! Stateful PDF tool sessions.
//!
//! One session per open tool page. Documents, page selection, and the
//! in-flight gate all live in Rust; JavaScript forwards events and downloads
//! the returned artifacts.

use crate::intake::{screen_batch, screen_file, CandidateFile, IntakePolicy, ToolKind};
use crate::validation::{validate_pdf, PdfInfo};
use pdftool_core::{
    clamp_bound, compress_document, merge_documents, parse_page_list, split_document,
    CompressReport, LoadedDocument, OrderedList, OutputArtifact, SplitSelection,
};
use std::collections::BTreeSet;
use wasm_bindgen::prelude::*;

/// Which PDF tool this session drives.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    /// Multiple documents, concatenate
    Merge,
    /// Single document, extract pages
    Split,
    /// Single document, shrink
    Compress,
}

/// Split sub-mode; mutually exclusive, selected by the user.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Individually toggled pages
    Pages,
    /// Contiguous inclusive range
    Range,
    /// One output file per page
    EachPage,
}

/// A finished artifact handed back to JavaScript for download.
#[wasm_bindgen]
pub struct DownloadArtifact {
    filename: String,
    bytes: Vec<u8>,
}

#[wasm_bindgen]
impl DownloadArtifact {
    #[wasm_bindgen(getter)]
    pub fn filename(&self) -> String {
        self.filename.clone()
    }

    #[wasm_bindgen(getter, js_name = sizeBytes)]
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> js_sys::Uint8Array {
        let array = js_sys::Uint8Array::new_with_length(self.bytes.len() as u32);
        array.copy_from(&self.bytes);
        array
    }
}

impl From<OutputArtifact> for DownloadArtifact {
    fn from(artifact: OutputArtifact) -> Self {
        Self {
            filename: artifact.filename,
            bytes: artifact.bytes,
        }
    }
}

impl DownloadArtifact {
    /// Direct byte access for Rust-side callers and tests; JavaScript goes
    /// through `bytes()`.
    pub(crate) fn raw_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// One accepted document with its parse and display info.
struct DocumentEntry {
    name: String,
    bytes: Vec<u8>,
    document: LoadedDocument,
    info: PdfInfo,
}

/// Stateful session holding documents in Rust memory.
#[wasm_bindgen]
pub struct PdfToolSession {
    mode: ToolMode,
    policy: IntakePolicy,
    documents: OrderedList<DocumentEntry>,
    split_mode: SplitMode,
    selected_pages: BTreeSet<u32>,
    range_start: u32,
    range_end: u32,
    last_report: Option<CompressReport>,
    processing: bool,
}

impl PdfToolSession {
    fn tool_kind(mode: ToolMode) -> ToolKind {
        match mode {
            ToolMode::Merge => ToolKind::Merge,
            ToolMode::Split => ToolKind::Split,
            ToolMode::Compress => ToolKind::Compress,
        }
    }

    fn is_single_document(&self) -> bool {
        matches!(self.mode, ToolMode::Split | ToolMode::Compress)
    }

    fn existing_meta(&self) -> Vec<(String, usize)> {
        self.documents
            .iter()
            .map(|e| (e.name.clone(), e.bytes.len()))
            .collect()
    }

    fn loaded_page_count(&self) -> Option<u32> {
        self.documents.get(0).map(|e| e.document.page_count())
    }

    /// Add one file. Single-document tools swap out whatever was loaded (and
    /// with it any stale page selection); merge appends.
    fn add_document_internal(
        &mut self,
        name: &str,
        media_type: &str,
        bytes: &[u8],
    ) -> Result<PdfInfo, String> {
        let candidate = CandidateFile {
            name: name.to_string(),
            media_type: media_type.to_string(),
            size_bytes: bytes.len(),
        };
        // A single-document tool replaces its loaded file, so the cap and
        // duplicate checks ignore the entry about to be swapped out
        let replacing = self.is_single_document() && !self.documents.is_empty();
        let existing = if replacing {
            Vec::new()
        } else {
            self.existing_meta()
        };
        screen_file(&self.policy, &existing, &candidate).map_err(|e| e.to_string())?;

        let info = validate_pdf(bytes)?;
        let document = LoadedDocument::from_bytes(bytes).map_err(|e| e.to_string())?;

        // Only mutate once the new file is fully parsed; a bad file leaves
        // the previous document and selection untouched
        if replacing {
            self.documents.clear();
        }
        let page_count = document.page_count();
        self.documents.push(DocumentEntry {
            name: name.to_string(),
            bytes: bytes.to_vec(),
            document,
            info: info.clone(),
        });

        if self.mode == ToolMode::Split {
            self.reset_selection_defaults(page_count);
        }

        Ok(info)
    }

    /// All pages selected, full-document range.
    fn reset_selection_defaults(&mut self, page_count: u32) {
        self.selected_pages = (1..=page_count).collect();
        self.range_start = 1;
        self.range_end = page_count;
    }

    fn remove_document_internal(&mut self, index: usize) -> Result<(), String> {
        self.documents.remove(index).map_err(|e| e.to_string())?;
        if self.documents.is_empty() {
            self.selected_pages.clear();
            self.range_start = 1;
            self.range_end = 1;
        }
        Ok(())
    }

    fn require_merge_mode(&self) -> Result<(), String> {
        if self.mode != ToolMode::Merge {
            return Err("Reorder is only available in merge mode".to_string());
        }
        Ok(())
    }

    fn require_split_mode(&self) -> Result<u32, String> {
        if self.mode != ToolMode::Split {
            return Err("Page selection is only available in split mode".to_string());
        }
        self.loaded_page_count()
            .ok_or_else(|| "No document loaded".to_string())
    }

    fn toggle_page_internal(&mut self, page: u32) -> Result<(), String> {
        let page_count = self.require_split_mode()?;
        if page == 0 || page > page_count {
            return Err(format!("Page {} is out of range (1-{})", page, page_count));
        }
        if !self.selected_pages.remove(&page) {
            self.selected_pages.insert(page);
        }
        Ok(())
    }

    fn set_page_expression_internal(&mut self, expr: &str) -> Result<(), String> {
        let page_count = self.require_split_mode()?;
        let pages = parse_page_list(expr).map_err(|e| e.to_string())?;
        for &page in &pages {
            if page == 0 || page > page_count {
                return Err(format!("Page {} is out of range (1-{})", page, page_count));
            }
        }
        self.selected_pages = pages.into_iter().collect();
        Ok(())
    }

    /// Clamp both bounds into the document on edit. An inverted range is
    /// stored as-is and blocks execution until fixed.
    fn set_range_internal(&mut self, start: u32, end: u32) -> Result<(u32, u32), String> {
        let page_count = self.require_split_mode()?;
        self.range_start = clamp_bound(start, page_count);
        self.range_end = clamp_bound(end, page_count);
        Ok((self.range_start, self.range_end))
    }

    fn current_selection(&self) -> SplitSelection {
        match self.split_mode {
            SplitMode::Pages => SplitSelection::Pages {
                pages: self.selected_pages.clone(),
            },
            SplitMode::Range => SplitSelection::Range {
                start: self.range_start,
                end: self.range_end,
            },
            SplitMode::EachPage => SplitSelection::EachPage,
        }
    }

    fn can_execute_internal(&self) -> bool {
        match self.mode {
            ToolMode::Merge => self.documents.len() >= 2,
            ToolMode::Compress => self.documents.len() == 1,
            ToolMode::Split => match self.loaded_page_count() {
                Some(page_count) => self.current_selection().is_executable(page_count),
                None => false,
            },
        }
    }

    fn execute_internal(&mut self) -> Result<Vec<OutputArtifact>, String> {
        if self.processing {
            return Err("An operation is already in progress".to_string());
        }
        if !self.can_execute_internal() {
            return Err("Session is not ready to execute".to_string());
        }

        self.processing = true;
        let result = self.run_transform();
        self.processing = false;
        result
    }

    fn run_transform(&mut self) -> Result<Vec<OutputArtifact>, String> {
        match self.mode {
            ToolMode::Merge => {
                let documents: Vec<&LoadedDocument> =
                    self.documents.iter().map(|e| &e.document).collect();
                let artifact = merge_documents(&documents).map_err(|e| e.to_string())?;
                Ok(vec![artifact])
            }
            ToolMode::Split => {
                let entry = self.documents.get(0).ok_or("No document loaded")?;
                let selection = self.current_selection();
                split_document(&entry.document, &selection, &entry.name)
                    .map_err(|e| e.to_string())
            }
            ToolMode::Compress => {
                let entry = self.documents.get(0).ok_or("No document loaded")?;
                let (artifact, report) =
                    compress_document(&entry.bytes, &entry.name).map_err(|e| e.to_string())?;
                self.last_report = Some(report);
                Ok(vec![artifact])
            }
        }
    }

    /// (page, width, height) for every page of the loaded document; the
    /// split grid sizes its thumbnails from this.
    fn page_dimensions_internal(&self) -> Result<Vec<(u32, f32, f32)>, String> {
        let entry = match self.documents.get(0) {
            Some(entry) => entry,
            None => return Ok(Vec::new()),
        };
        let mut dims = Vec::with_capacity(entry.document.page_count() as usize);
        for page in 1..=entry.document.page_count() {
            let (width, height) = entry
                .document
                .page_dimensions(page)
                .map_err(|e| e.to_string())?;
            dims.push((page, width, height));
        }
        Ok(dims)
    }

    fn reset_internal(&mut self) {
        self.documents.clear();
        self.selected_pages.clear();
        self.range_start = 1;
        self.range_end = 1;
        self.last_report = None;
        self.processing = false;
    }
}

#[wasm_bindgen]
impl PdfToolSession {
    /// Create a new session for the given tool.
    #[wasm_bindgen(constructor)]
    pub fn new(mode: ToolMode) -> Self {
        Self {
            mode,
            policy: IntakePolicy::for_tool(Self::tool_kind(mode)),
            documents: OrderedList::new(),
            split_mode: SplitMode::Pages,
            selected_pages: BTreeSet::new(),
            range_start: 1,
            range_end: 1,
            last_report: None,
            processing: false,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    /// Pre-screen a dropped batch by metadata, before reading any bytes.
    /// Returns `{ accepted: number[], rejected: { name, reason }[] }`.
    #[wasm_bindgen(js_name = screenFiles)]
    pub fn screen_files(
        &self,
        names: Vec<String>,
        media_types: Vec<String>,
        sizes: Vec<u32>,
    ) -> Result<JsValue, JsValue> {
        let batch: Vec<CandidateFile> = names
            .into_iter()
            .zip(media_types)
            .zip(sizes)
            .map(|((name, media_type), size)| CandidateFile {
                name,
                media_type,
                size_bytes: size as usize,
            })
            .collect();
        let verdict = screen_batch(&self.policy, &self.existing_meta(), &batch);

        serde_wasm_bindgen::to_value(&verdict)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Add a document; returns its info as a JS object.
    #[wasm_bindgen(js_name = addDocument)]
    pub fn add_document(
        &mut self,
        name: &str,
        media_type: &str,
        bytes: &[u8],
    ) -> Result<JsValue, JsValue> {
        let info = self
            .add_document_internal(name, media_type, bytes)
            .map_err(|e| JsValue::from_str(&e))?;

        serde_wasm_bindgen::to_value(&info)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Remove a document by its current position.
    #[wasm_bindgen(js_name = removeDocument)]
    pub fn remove_document(&mut self, index: usize) -> Result<(), JsValue> {
        self.remove_document_internal(index)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Move a document one position earlier (merge mode).
    #[wasm_bindgen(js_name = moveDocumentUp)]
    pub fn move_document_up(&mut self, index: usize) -> Result<(), JsValue> {
        self.require_merge_mode().map_err(|e| JsValue::from_str(&e))?;
        self.documents
            .move_up(index)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Move a document one position later (merge mode).
    #[wasm_bindgen(js_name = moveDocumentDown)]
    pub fn move_document_down(&mut self, index: usize) -> Result<(), JsValue> {
        self.require_merge_mode().map_err(|e| JsValue::from_str(&e))?;
        self.documents
            .move_down(index)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = setSplitMode)]
    pub fn set_split_mode(&mut self, mode: SplitMode) {
        self.split_mode = mode;
    }

    #[wasm_bindgen(getter, js_name = splitMode)]
    pub fn split_mode(&self) -> SplitMode {
        self.split_mode
    }

    /// Toggle one 1-based page in the explicit selection.
    #[wasm_bindgen(js_name = togglePage)]
    pub fn toggle_page(&mut self, page: u32) -> Result<(), JsValue> {
        self.toggle_page_internal(page)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Replace the explicit selection from an expression like "1-3, 5".
    #[wasm_bindgen(js_name = setPageExpression)]
    pub fn set_page_expression(&mut self, expr: &str) -> Result<(), JsValue> {
        self.set_page_expression_internal(expr)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Set the range bounds; returns the clamped `[start, end]` so the UI
    /// can reflect the values actually stored.
    #[wasm_bindgen(js_name = setRange)]
    pub fn set_range(&mut self, start: u32, end: u32) -> Result<Vec<u32>, JsValue> {
        let (start, end) = self
            .set_range_internal(start, end)
            .map_err(|e| JsValue::from_str(&e))?;
        Ok(vec![start, end])
    }

    #[wasm_bindgen(js_name = getSelectedPages)]
    pub fn get_selected_pages(&self) -> Vec<u32> {
        self.selected_pages.iter().copied().collect()
    }

    #[wasm_bindgen(js_name = getDocumentCount)]
    pub fn get_document_count(&self) -> usize {
        self.documents.len()
    }

    #[wasm_bindgen(js_name = getTotalPageCount)]
    pub fn get_total_page_count(&self) -> u32 {
        self.documents.iter().map(|e| e.info.page_count).sum()
    }

    /// All document infos, in display order.
    #[wasm_bindgen(js_name = getDocumentInfos)]
    pub fn get_document_infos(&self) -> Result<JsValue, JsValue> {
        #[derive(serde::Serialize)]
        struct DocumentInfoJs {
            name: String,
            page_count: u32,
            size_bytes: usize,
            version: String,
            encrypted: bool,
        }

        let infos: Vec<_> = self
            .documents
            .iter()
            .map(|e| DocumentInfoJs {
                name: e.name.clone(),
                page_count: e.info.page_count,
                size_bytes: e.bytes.len(),
                version: e.info.version.clone(),
                encrypted: e.info.encrypted,
            })
            .collect();

        serde_wasm_bindgen::to_value(&infos)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Per-page dimensions of the loaded document as
    /// `{ page, width, height }[]`.
    #[wasm_bindgen(js_name = getPageDimensions)]
    pub fn get_page_dimensions(&self) -> Result<JsValue, JsValue> {
        #[derive(serde::Serialize)]
        struct PageDimsJs {
            page: u32,
            width: f32,
            height: f32,
        }

        let dims: Vec<PageDimsJs> = self
            .page_dimensions_internal()
            .map_err(|e| JsValue::from_str(&e))?
            .into_iter()
            .map(|(page, width, height)| PageDimsJs {
                page,
                width,
                height,
            })
            .collect();

        serde_wasm_bindgen::to_value(&dims)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Whether the execute action should be enabled.
    #[wasm_bindgen(js_name = canExecute)]
    pub fn can_execute(&self) -> bool {
        self.can_execute_internal()
    }

    #[wasm_bindgen(getter, js_name = isProcessing)]
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Size report of the last compress run, or undefined.
    #[wasm_bindgen(js_name = compressionReport)]
    pub fn compression_report(&self) -> Result<JsValue, JsValue> {
        match &self.last_report {
            Some(report) => serde_wasm_bindgen::to_value(report)
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Run the tool. Returns an array of `DownloadArtifact`s; on failure the
    /// session state is unchanged and the user can retry.
    pub fn execute(&mut self) -> Result<js_sys::Array, JsValue> {
        match self.execute_internal() {
            Ok(artifacts) => Ok(artifacts
                .into_iter()
                .map(|a| JsValue::from(DownloadArtifact::from(a)))
                .collect()),
            Err(e) => {
                crate::console_log!("pdftool: transform failed: {}", e);
                Err(JsValue::from_str(&e))
            }
        }
    }

    /// Discard all state and start over.
    pub fn reset(&mut self) {
        self.reset_internal();
    }
}
