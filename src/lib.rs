//! FDL Core - Framing Decision List Geometry & Validation Engine
//!
//! # Ground Rules
//! 1. Decisions Are Derived, Never Hand-Edited
//! 2. Rounding Happens Once
//! 3. Validation Collects, Never Stops Early
//! 4. Every Edit Returns A New Document
//! 5. Export Always Validates

pub mod model;
pub mod ids;
pub mod precision;
pub mod geometry;
pub mod validation;
pub mod io;
pub mod hashing;
pub mod catalog;
pub mod pipeline;

pub use model::{
    AspectRatio, Canvas, CanvasTemplate, Context, Dimensions, FdlDocument, FdlVersion,
    FramingDecision, FramingIntent, PhysicalDimensions, Point,
};
pub use ids::{generate_document_id, generate_element_id, decision_id};
pub use precision::{RoundingEven, RoundingMode, RoundingPolicy, precise_aspect_ratio, format_significant};
pub use geometry::{derive_decision, recompute_all_decisions, ensure_decisions, GeometryError};
pub use validation::{validate, validate_json, ValidationReport, SchemaError, IdTreeError, Validator};
pub use io::ImportError;
pub use hashing::{canonical_json, document_digest};
pub use catalog::{SensorCatalog, CatalogError};
pub use pipeline::{ExportPipeline, ExportOptions, ExportedDocument, PipelineError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
