//! Batch intake and validation policy.
//!
//! Turns raw user-selected files into accepted entries. Each tool screens
//! against its own policy: media-type allow-list, per-file size ceiling, and
//! an optional batch cap. Files fail individually; the rest of the batch
//! proceeds.

use pdftool_core::ToolError;
use serde::{Deserialize, Serialize};

/// 50 MiB ceiling for PDF inputs.
pub const PDF_MAX_BYTES: usize = 52_428_800;

/// 10 MiB ceiling per image input.
pub const IMAGE_MAX_BYTES: usize = 10_485_760;

/// Default cap on multi-file batches.
pub const DEFAULT_BATCH_CAP: usize = 20;

const PDF_TYPES: &[&str] = &["application/pdf"];
const IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
];

/// Which tool a policy screens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Merge,
    Split,
    Compress,
    ImageToPdf,
}

/// Screening rules for one tool's intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakePolicy {
    /// Accepted declared media types
    pub allowed_types: Vec<String>,
    /// Per-file byte ceiling
    pub max_file_bytes: usize,
    /// Cap on total accepted files, where the tool has one
    pub max_files: Option<usize>,
    /// Reject files matching an already-accepted name + byte length.
    /// Deliberately a flag: the tools disagree on this.
    pub reject_duplicates: bool,
}

impl IntakePolicy {
    pub fn for_tool(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Merge => Self {
                allowed_types: owned(PDF_TYPES),
                max_file_bytes: PDF_MAX_BYTES,
                max_files: Some(DEFAULT_BATCH_CAP),
                reject_duplicates: true,
            },
            ToolKind::Split | ToolKind::Compress => Self {
                allowed_types: owned(PDF_TYPES),
                max_file_bytes: PDF_MAX_BYTES,
                max_files: Some(1),
                reject_duplicates: false,
            },
            ToolKind::ImageToPdf => Self {
                allowed_types: owned(IMAGE_TYPES),
                max_file_bytes: IMAGE_MAX_BYTES,
                max_files: Some(DEFAULT_BATCH_CAP),
                reject_duplicates: true,
            },
        }
    }

    fn allows_type(&self, media_type: &str) -> bool {
        self.allowed_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(media_type))
    }
}

/// A file offered by a drop or picker event, before its bytes are read.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    pub media_type: String,
    pub size_bytes: usize,
}

/// A per-file rejection with its user-visible reason.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub name: String,
    pub reason: String,
}

/// Outcome of screening one batch: indices of accepted candidates (order
/// preserved) and the individual rejections.
#[derive(Debug, Clone, Serialize)]
pub struct BatchVerdict {
    pub accepted: Vec<usize>,
    pub rejected: Vec<Rejection>,
}

/// Screen a batch of candidates against a policy.
///
/// `existing` lists already-accepted files as (name, size) pairs; they count
/// toward the batch cap and participate in duplicate detection. Rejection is
/// per-file: a bad file never sinks the rest of the batch.
pub fn screen_batch(
    policy: &IntakePolicy,
    existing: &[(String, usize)],
    batch: &[CandidateFile],
) -> BatchVerdict {
    let mut accepted: Vec<usize> = Vec::new();
    let mut rejected = Vec::new();

    for (index, candidate) in batch.iter().enumerate() {
        let is_dup = policy.reject_duplicates
            && (existing
                .iter()
                .any(|(name, size)| *name == candidate.name && *size == candidate.size_bytes)
                || accepted.iter().any(|&i| {
                    batch[i].name == candidate.name && batch[i].size_bytes == candidate.size_bytes
                }));

        let reason = if !policy.allows_type(&candidate.media_type) {
            Some(format!("Unsupported file type: {}", candidate.media_type))
        } else if candidate.size_bytes > policy.max_file_bytes {
            Some(format!(
                "File exceeds the {} limit",
                format_limit(policy.max_file_bytes)
            ))
        } else if is_dup {
            Some("Duplicate of a file already in the list".to_string())
        } else if policy
            .max_files
            .is_some_and(|cap| existing.len() + accepted.len() >= cap)
        {
            Some(format!(
                "Too many files (limit {})",
                policy.max_files.unwrap_or(0)
            ))
        } else {
            None
        };

        match reason {
            Some(reason) => rejected.push(Rejection {
                name: candidate.name.clone(),
                reason,
            }),
            None => accepted.push(index),
        }
    }

    BatchVerdict { accepted, rejected }
}

/// Screen one file; `Ok(())` or a `Validation` error carrying the
/// user-visible reason.
pub fn screen_file(
    policy: &IntakePolicy,
    existing: &[(String, usize)],
    candidate: &CandidateFile,
) -> Result<(), ToolError> {
    let verdict = screen_batch(policy, existing, std::slice::from_ref(candidate));
    match verdict.rejected.into_iter().next() {
        Some(rejection) => Err(ToolError::Validation(rejection.reason)),
        None => Ok(()),
    }
}

fn owned(types: &[&str]) -> Vec<String> {
    types.iter().map(|t| t.to_string()).collect()
}

fn format_limit(bytes: usize) -> String {
    const MB: usize = 1024 * 1024;
    if bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else {
        format!("{} bytes", bytes)
    }
}
