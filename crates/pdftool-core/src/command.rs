//! Worker command protocol.
//!
//! One serde-tagged message drives any of the four tools, so the browser can
//! post a single JSON payload to a web worker and get a self-contained
//! result back. Artifact bytes travel base64-encoded inside the result.

use crate::artifact::OutputArtifact;
use crate::compress::compress_document;
use crate::document::LoadedDocument;
use crate::images::{images_to_pdf, ImageInput, PageSize};
use crate::merge::merge_documents;
use crate::split::{split_document, SplitSelection};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ToolCommand {
    Merge {
        files: Vec<Vec<u8>>,
    },
    Split {
        file: Vec<u8>,
        name: String,
        selection: SplitSelection,
    },
    Compress {
        file: Vec<u8>,
        name: String,
    },
    ImagesToPdf {
        images: Vec<ImageInput>,
        page_size: PageSize,
    },
}

/// One finished artifact, base64-encoded for the JSON boundary.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactPayload {
    pub filename: String,
    /// Base64-encoded PDF data
    pub data: String,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    pub artifacts: Vec<ArtifactPayload>,
    pub error: Option<String>,
    pub metrics: Option<ProcessMetrics>,
    /// Image names skipped by an ImagesToPdf run (empty elsewhere).
    pub skipped: Vec<String>,
}

impl ProcessResult {
    fn completed(
        artifacts: Vec<OutputArtifact>,
        input_size_bytes: usize,
        page_count: u32,
        skipped: Vec<String>,
    ) -> Self {
        let output_size_bytes = artifacts.iter().map(|a| a.size_bytes()).sum();
        Self {
            success: true,
            artifacts: artifacts
                .into_iter()
                .map(|a| ArtifactPayload {
                    size_bytes: a.bytes.len(),
                    data: BASE64.encode(&a.bytes),
                    filename: a.filename,
                })
                .collect(),
            error: None,
            metrics: Some(ProcessMetrics {
                input_size_bytes,
                output_size_bytes,
                page_count,
            }),
            skipped,
        }
    }

    fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            artifacts: Vec::new(),
            error: Some(error.to_string()),
            metrics: None,
            skipped: Vec::new(),
        }
    }
}

/// Execute one command. Never panics; every failure comes back as an
/// unsuccessful result with no artifacts.
pub fn run_command(command: ToolCommand) -> ProcessResult {
    match command {
        ToolCommand::Merge { files } => {
            let input_size = files.iter().map(|f| f.len()).sum();

            let mut documents = Vec::with_capacity(files.len());
            for (i, bytes) in files.iter().enumerate() {
                match LoadedDocument::from_bytes(bytes) {
                    Ok(doc) => documents.push(doc),
                    Err(e) => {
                        return ProcessResult::failed(format!("Document {}: {}", i + 1, e))
                    }
                }
            }
            let page_count = documents.iter().map(|d| d.page_count()).sum();

            let refs: Vec<&LoadedDocument> = documents.iter().collect();

            match merge_documents(&refs) {
                Ok(artifact) => {
                    ProcessResult::completed(vec![artifact], input_size, page_count, Vec::new())
                }
                Err(e) => ProcessResult::failed(e),
            }
        }
        ToolCommand::Split {
            file,
            name,
            selection,
        } => {
            let doc = match LoadedDocument::from_bytes(&file) {
                Ok(doc) => doc,
                Err(e) => return ProcessResult::failed(e),
            };
            match split_document(&doc, &selection, &name) {
                Ok(artifacts) => {
                    let page_count = match &selection {
                        SplitSelection::Pages { pages } => pages.len() as u32,
                        SplitSelection::Range { start, end } => end - start + 1,
                        SplitSelection::EachPage => doc.page_count(),
                    };
                    ProcessResult::completed(artifacts, file.len(), page_count, Vec::new())
                }
                Err(e) => ProcessResult::failed(e),
            }
        }
        ToolCommand::Compress { file, name } => match compress_document(&file, &name) {
            Ok((artifact, report)) => {
                let page_count = LoadedDocument::from_bytes(&artifact.bytes)
                    .map(|d| d.page_count())
                    .unwrap_or(0);
                ProcessResult::completed(vec![artifact], report.original_size, page_count, Vec::new())
            }
            Err(e) => ProcessResult::failed(e),
        },
        ToolCommand::ImagesToPdf { images, page_size } => {
            let input_size = images.iter().map(|i| i.bytes.len()).sum();
            match images_to_pdf(&images, page_size) {
                Ok(outcome) => ProcessResult::completed(
                    vec![outcome.artifact],
                    input_size,
                    outcome.page_count,
                    outcome.skipped,
                ),
                Err(e) => ProcessResult::failed(e),
            }
        }
    }
}
