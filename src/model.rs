//! Document Model - Typed FDL Documents
//!
//! Optional fields are `Option<T>` and are omitted on serialize, never written as `null`.

use serde::{Deserialize, Serialize};

use crate::precision::{RoundingPolicy, round_half_away};

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Physical sensor size in millimetres.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PhysicalDimensions {
    pub width: f64,
    pub height: f64,
}

/// Pixel offset from the top-left of the canvas.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::default()
    }
}

/// Aspect ratio as two positive integers; not required to be reduced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FdlVersion {
    pub major: u32,
    pub minor: u32,
}

impl FdlVersion {
    pub const CURRENT: FdlVersion = FdlVersion { major: 1, minor: 0 };

    pub fn is_supported(&self) -> bool {
        self.major == 1 && self.minor <= 1
    }
}

impl Default for FdlVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// A desired crop shape, independent of any canvas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FramingIntent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub aspect_ratio: AspectRatio,
    /// Percentage of linear shrink, 0..=99.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection: Option<f64>,
}

impl FramingIntent {
    pub fn new(id: impl Into<String>, aspect_ratio: AspectRatio) -> Self {
        Self {
            id: id.into(),
            label: None,
            aspect_ratio,
            protection: None,
        }
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self { label: Some(label.into()), ..self }
    }

    pub fn with_protection(self, protection: f64) -> Self {
        Self { protection: Some(protection), ..self }
    }

    /// Protection as a fraction, only when it actually shrinks the box.
    pub fn protection_fraction(&self) -> Option<f64> {
        match self.protection {
            Some(p) if p > 0.0 && p < 100.0 => Some(p / 100.0),
            _ => None,
        }
    }
}

/// Materialized geometry of one intent on one canvas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FramingDecision {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub framing_intent_id: String,
    pub dimensions: Dimensions,
    pub anchor_point: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection_dimensions: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection_anchor_point: Option<Point>,
}

/// One recorded image plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Canvas {
    pub id: String,
    pub source_canvas_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub dimensions: Dimensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_dimensions: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_anchor_point: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photosite_dimensions: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_dimensions: Option<PhysicalDimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anamorphic_squeeze: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_codec: Option<String>,
    #[serde(default)]
    pub framing_decisions: Vec<FramingDecision>,
}

impl Canvas {
    /// A source canvas (its own `source_canvas_id`) with derived effective dimensions.
    pub fn new(id: impl Into<String>, dimensions: Dimensions) -> Self {
        let id = id.into();
        let canvas = Self {
            source_canvas_id: id.clone(),
            id,
            label: None,
            dimensions,
            effective_dimensions: None,
            effective_anchor_point: None,
            photosite_dimensions: None,
            physical_dimensions: None,
            anamorphic_squeeze: None,
            recording_codec: None,
            framing_decisions: vec![],
        };
        canvas.refresh_effective()
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self { label: Some(label.into()), ..self }
    }

    pub fn with_dimensions(self, dimensions: Dimensions) -> Self {
        Self { dimensions, ..self }.refresh_effective()
    }

    pub fn with_anamorphic_squeeze(self, squeeze: f64) -> Self {
        Self { anamorphic_squeeze: Some(squeeze), ..self }.refresh_effective()
    }

    pub fn squeeze(&self) -> f64 {
        self.anamorphic_squeeze.unwrap_or(1.0)
    }

    /// `(round(width * squeeze), height)`, or `None` when the squeeze is unusable.
    pub fn derived_effective_dimensions(&self) -> Option<Dimensions> {
        let squeeze = self.squeeze();
        if !squeeze.is_finite() || squeeze <= 0.0 {
            return None;
        }
        let width = round_half_away(self.dimensions.width as f64 * squeeze);
        let width = u32::try_from(width).ok()?;
        Some(Dimensions::new(width, self.dimensions.height))
    }

    fn refresh_effective(self) -> Self {
        let effective = self.derived_effective_dimensions();
        Self {
            effective_dimensions: effective,
            effective_anchor_point: effective.map(|_| Point::origin()),
            ..self
        }
    }

    pub fn decision_for(&self, intent_id: &str) -> Option<&FramingDecision> {
        self.framing_decisions
            .iter()
            .find(|d| d.framing_intent_id == intent_id)
    }
}

/// One camera/shooting setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Context {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_creator: Option<String>,
    #[serde(default)]
    pub canvases: Vec<Canvas>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FitSource {
    #[serde(rename = "framing_decision.dimensions")]
    FramingDecisionDimensions,
    #[serde(rename = "framing_decision.protection_dimensions")]
    FramingDecisionProtectionDimensions,
    #[serde(rename = "canvas.dimensions")]
    CanvasDimensions,
    #[serde(rename = "canvas.effective_dimensions")]
    CanvasEffectiveDimensions,
}

impl FitSource {
    pub const ALL: [&'static str; 4] = [
        "framing_decision.dimensions",
        "framing_decision.protection_dimensions",
        "canvas.dimensions",
        "canvas.effective_dimensions",
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FitMethod {
    Width,
    Height,
    Fit,
    Fill,
}

impl FitMethod {
    pub const ALL: [&'static str; 4] = ["width", "height", "fit", "fill"];
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    Top,
    #[default]
    Center,
    Bottom,
}

impl VerticalAlignment {
    pub const ALL: [&'static str; 3] = ["top", "center", "bottom"];
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    Left,
    #[default]
    Center,
    Right,
}

impl HorizontalAlignment {
    pub const ALL: [&'static str; 3] = ["left", "center", "right"];
}

/// Target output transform. Carried through untouched by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanvasTemplate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub target_dimensions: Dimensions,
    #[serde(default = "default_squeeze")]
    pub target_anamorphic_squeeze: f64,
    pub fit_source: FitSource,
    pub fit_method: FitMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_method_vertical: Option<VerticalAlignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_method_horizontal: Option<HorizontalAlignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_from_source_canvas: Option<FitSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_dimensions: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pad_to_maximum: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundingPolicy>,
}

fn default_squeeze() -> f64 { 1.0 }

/// Root of an FDL document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FdlDocument {
    pub uuid: String,
    #[serde(default)]
    pub version: FdlVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fdl_creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_framing_intent: Option<String>,
    #[serde(default)]
    pub framing_intents: Vec<FramingIntent>,
    #[serde(default)]
    pub contexts: Vec<Context>,
    #[serde(default)]
    pub canvas_templates: Vec<CanvasTemplate>,
}

impl FdlDocument {
    /// An empty document with a fresh UUID.
    pub fn new() -> Self {
        Self {
            uuid: crate::ids::generate_document_id(),
            version: FdlVersion::CURRENT,
            fdl_creator: None,
            default_framing_intent: None,
            framing_intents: vec![],
            contexts: vec![],
            canvas_templates: vec![],
        }
    }

    pub fn canvases(&self) -> impl Iterator<Item = &Canvas> {
        self.contexts.iter().flat_map(|c| c.canvases.iter())
    }
}

impl Default for FdlDocument {
    fn default() -> Self {
        Self::new()
    }
}
