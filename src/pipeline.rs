//! Export Pipeline - Single Entry Point
//!
//! CRITICAL: finalize MUST call validate internally. No bypass.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::geometry::recompute_all_decisions;
use crate::hashing::document_digest;
use crate::io::ImportError;
use crate::model::FdlDocument;
use crate::validation::{ValidationReport, Validator};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Refresh every framing decision before validating.
    #[serde(default = "default_true")]
    pub recompute_decisions: bool,
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_true() -> bool { true }

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            recompute_decisions: true,
            pretty: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedDocument {
    pub engine_version: String,
    pub digest: String,
    pub validation: ValidationReport,
    pub document: FdlDocument,
    /// Serialized `.fdl` contents.
    #[serde(skip)]
    pub json: String,
}

/// The export pipeline - single entry point for finalizing documents
pub struct ExportPipeline {
    validator: Validator,
    options: ExportOptions,
}

impl ExportPipeline {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            validator: Validator::new(),
            options,
        }
    }

    /// Validate a document.
    ///
    /// This is the ONLY validation entry point.
    pub fn validate_document(&self, document: &FdlDocument) -> ValidationReport {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        self.validator.validate(document)
    }

    /// Finalize a document for export.
    ///
    /// CRITICAL: This ALWAYS calls validate_document internally. No bypass possible.
    pub fn finalize(&self, document: &FdlDocument) -> Result<ExportedDocument, PipelineError> {
        let document = if self.options.recompute_decisions {
            recompute_all_decisions(document)
        } else {
            document.clone()
        };

        // MANDATORY: Validation is always called. This is non-negotiable.
        let validation = self.validate_document(&document);
        if !validation.is_valid {
            return Err(PipelineError::ValidationFailed(validation.errors.join("; ")));
        }

        let digest = document_digest(&document)?;
        let json = if self.options.pretty {
            document.to_json_pretty()?
        } else {
            document.to_json()?
        };
        info!(uuid = %document.uuid, digest = %digest, "finalized document for export");

        Ok(ExportedDocument {
            engine_version: ENGINE_VERSION.to_string(),
            digest,
            validation,
            document,
            json,
        })
    }

    /// Parse and finalize `.fdl` text.
    pub fn finalize_json(&self, text: &str) -> Result<ExportedDocument, PipelineError> {
        let document = FdlDocument::from_json(text)?;
        self.finalize(&document)
    }
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new(ExportOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AspectRatio, Canvas, Context, Dimensions, FramingIntent};

    #[test]
    fn test_options_defaults_from_json() {
        let options: ExportOptions = serde_json::from_str("{}").unwrap();
        assert!(options.recompute_decisions);
        assert!(options.pretty);
    }

    #[test]
    fn test_compact_output() {
        let pipeline = ExportPipeline::new(ExportOptions { pretty: false, ..Default::default() });
        let doc = FdlDocument {
            framing_intents: vec![FramingIntent::new("wide", AspectRatio::new(16, 9))],
            contexts: vec![Context {
                canvases: vec![Canvas::new("A001", Dimensions::new(1920, 1080))],
                ..Default::default()
            }],
            ..FdlDocument::new()
        };
        let exported = pipeline.finalize(&doc).unwrap();
        assert!(!exported.json.contains('\n'));
        assert_eq!(exported.digest.len(), 64);
    }

    #[test]
    fn test_malformed_text_is_import_error() {
        let err = ExportPipeline::default().finalize_json("not json").unwrap_err();
        assert!(matches!(err, PipelineError::Import(ImportError::Json(_))));
    }
}
