//! Geometry Engine - Framing Decisions From Intents
//!
//! All fit and protection math lives here. Preview, export and tech-info
//! consumers call these functions instead of re-deriving geometry.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::ids::decision_id;
use crate::model::{Canvas, Context, Dimensions, FdlDocument, FramingDecision, FramingIntent, Point};
use crate::precision::{format_aspect_ratio, round_half_away};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Canvas '{canvas_id}' has non-positive dimensions {width}x{height}")]
    InvalidCanvas { canvas_id: String, width: u32, height: u32 },

    #[error("Framing intent '{intent_id}' has non-positive aspect ratio {width}:{height}")]
    InvalidAspectRatio { intent_id: String, width: u32, height: u32 },
}

/// How the intent sits inside the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FitKind {
    /// Canvas wider than intent: full height, side margins.
    Pillarbox,
    /// Canvas narrower than intent: full width, top/bottom margins.
    Letterbox,
    Exact,
}

/// Fit classification by exact cross-multiplication of the two ratios.
pub fn fit_kind(canvas: Dimensions, width: u32, height: u32) -> FitKind {
    let canvas_side = canvas.width as u64 * height as u64;
    let intent_side = canvas.height as u64 * width as u64;
    match canvas_side.cmp(&intent_side) {
        std::cmp::Ordering::Greater => FitKind::Pillarbox,
        std::cmp::Ordering::Less => FitKind::Letterbox,
        std::cmp::Ordering::Equal => FitKind::Exact,
    }
}

fn to_pixels(value: f64) -> u32 {
    round_half_away(value).clamp(1, u32::MAX as i64) as u32
}

fn check_inputs(intent: &FramingIntent, canvas: &Canvas) -> Result<(), GeometryError> {
    if !canvas.dimensions.is_positive() {
        return Err(GeometryError::InvalidCanvas {
            canvas_id: canvas.id.clone(),
            width: canvas.dimensions.width,
            height: canvas.dimensions.height,
        });
    }
    if !intent.aspect_ratio.is_positive() {
        return Err(GeometryError::InvalidAspectRatio {
            intent_id: intent.id.clone(),
            width: intent.aspect_ratio.width,
            height: intent.aspect_ratio.height,
        });
    }
    Ok(())
}

/// Derive the framing decision for `intent` on `canvas`.
///
/// The decision id is `<canvas_id>-<intent_id>` and the label is copied from the intent.
pub fn derive_decision(
    intent: &FramingIntent,
    canvas: &Canvas,
) -> Result<FramingDecision, GeometryError> {
    check_inputs(intent, canvas)?;

    let cw = canvas.dimensions.width as f64;
    let ch = canvas.dimensions.height as f64;
    let iw = intent.aspect_ratio.width as f64;
    let ih = intent.aspect_ratio.height as f64;

    let (dimensions, anchor_point) =
        match fit_kind(canvas.dimensions, intent.aspect_ratio.width, intent.aspect_ratio.height) {
            FitKind::Pillarbox => {
                let width = to_pixels(ch * iw / ih);
                let x = round_half_away((cw - width as f64) / 2.0);
                (Dimensions::new(width, canvas.dimensions.height), Point::new(x, 0))
            }
            FitKind::Letterbox => {
                let height = to_pixels(cw * ih / iw);
                let y = round_half_away((ch - height as f64) / 2.0);
                (Dimensions::new(canvas.dimensions.width, height), Point::new(0, y))
            }
            FitKind::Exact => (canvas.dimensions, Point::origin()),
        };

    let (protection_dimensions, protection_anchor_point) = match intent.protection_fraction() {
        Some(p) => {
            let (pd, pa) = protect(dimensions, anchor_point, p);
            (Some(pd), Some(pa))
        }
        None => (None, None),
    };

    Ok(FramingDecision {
        id: decision_id(&canvas.id, &intent.id),
        label: intent.label.clone(),
        framing_intent_id: intent.id.clone(),
        dimensions,
        anchor_point,
        protection_dimensions,
        protection_anchor_point,
    })
}

/// Shrink a placed box by fraction `p` per axis, recentred inside it.
fn protect(dimensions: Dimensions, anchor: Point, p: f64) -> (Dimensions, Point) {
    let w = dimensions.width as f64;
    let h = dimensions.height as f64;
    let protected = Dimensions::new(to_pixels(w * (1.0 - p)), to_pixels(h * (1.0 - p)));
    let offset = Point::new(
        anchor.x + round_half_away(w * p / 2.0),
        anchor.y + round_half_away(h * p / 2.0),
    );
    (protected, offset)
}

fn intent_index(document: &FdlDocument) -> HashMap<&str, &FramingIntent> {
    let mut index = HashMap::new();
    for intent in &document.framing_intents {
        // first definition wins; duplicates are an ID-tree error
        index.entry(intent.id.as_str()).or_insert(intent);
    }
    index
}

fn recompute_canvas(canvas: &Canvas, intents: &HashMap<&str, &FramingIntent>) -> Canvas {
    let framing_decisions = canvas
        .framing_decisions
        .iter()
        .filter_map(|existing| {
            let Some(intent) = intents.get(existing.framing_intent_id.as_str()) else {
                debug!(
                    canvas = %canvas.id,
                    decision = %existing.id,
                    intent = %existing.framing_intent_id,
                    "dropping decision with unresolved framing intent"
                );
                return None;
            };
            match derive_decision(intent, canvas) {
                Ok(derived) => Some(FramingDecision {
                    id: existing.id.clone(),
                    label: existing.label.clone(),
                    ..derived
                }),
                Err(e) => {
                    debug!(canvas = %canvas.id, decision = %existing.id, error = %e, "dropping decision");
                    None
                }
            }
        })
        .collect();

    Canvas { framing_decisions, ..canvas.clone() }
}

/// Recompute every decision from the current intents and canvases.
///
/// Decisions whose intent no longer resolves, or whose geometry cannot be
/// derived, are dropped.
#[tracing::instrument(skip(document), fields(uuid = %document.uuid))]
pub fn recompute_all_decisions(document: &FdlDocument) -> FdlDocument {
    let intents = intent_index(document);
    let contexts = document
        .contexts
        .iter()
        .map(|context| Context {
            canvases: context
                .canvases
                .iter()
                .map(|canvas| recompute_canvas(canvas, &intents))
                .collect(),
            ..context.clone()
        })
        .collect();

    FdlDocument { contexts, ..document.clone() }
}

/// Parallel form of [`recompute_all_decisions`]; output is identical.
#[cfg(feature = "parallel")]
#[tracing::instrument(skip(document), fields(uuid = %document.uuid))]
pub fn recompute_all_decisions_par(document: &FdlDocument) -> FdlDocument {
    use rayon::prelude::*;

    let intents = intent_index(document);
    let contexts = document
        .contexts
        .par_iter()
        .map(|context| Context {
            canvases: context
                .canvases
                .par_iter()
                .map(|canvas| recompute_canvas(canvas, &intents))
                .collect(),
            ..context.clone()
        })
        .collect();

    FdlDocument { contexts, ..document.clone() }
}

/// Materialize a decision for every (intent, canvas) pair that lacks one, then recompute.
#[tracing::instrument(skip(document), fields(uuid = %document.uuid))]
pub fn ensure_decisions(document: &FdlDocument) -> FdlDocument {
    let mut next = document.clone();
    let mut seen = HashSet::new();
    let intents: Vec<&FramingIntent> = document
        .framing_intents
        .iter()
        .filter(|i| seen.insert(i.id.as_str()))
        .collect();

    for context in &mut next.contexts {
        for canvas in &mut context.canvases {
            for intent in &intents {
                if canvas.decision_for(&intent.id).is_some() {
                    continue;
                }
                match derive_decision(intent, canvas) {
                    Ok(decision) => {
                        debug!(canvas = %canvas.id, decision = %decision.id, "created decision");
                        canvas.framing_decisions.push(decision);
                    }
                    Err(e) => debug!(canvas = %canvas.id, error = %e, "skipping decision"),
                }
            }
        }
    }

    recompute_all_decisions(&next)
}

/// Remove a framing intent and every decision that referenced it.
pub fn remove_framing_intent(document: &FdlDocument, intent_id: &str) -> FdlDocument {
    let framing_intents = document
        .framing_intents
        .iter()
        .filter(|i| i.id != intent_id)
        .cloned()
        .collect();
    let default_framing_intent = document
        .default_framing_intent
        .clone()
        .filter(|id| id != intent_id);

    let pruned = FdlDocument {
        framing_intents,
        default_framing_intent,
        ..document.clone()
    };
    recompute_all_decisions(&pruned)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Margins {
    pub left: i64,
    pub right: i64,
    pub top: i64,
    pub bottom: i64,
}

/// Tech-info summary of one decision on its canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionSummary {
    pub decision_id: String,
    pub fit: FitKind,
    pub aspect_ratio: String,
    /// Aspect ratio after applying the canvas squeeze.
    pub desqueezed_aspect_ratio: String,
    pub dimensions: Dimensions,
    pub anchor_point: Point,
    pub margins: Margins,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protection_dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protection_aspect_ratio: Option<String>,
}

/// Describe a decision for preview and tech-info panels.
pub fn describe_decision(canvas: &Canvas, decision: &FramingDecision) -> DecisionSummary {
    let d = decision.dimensions;
    let a = decision.anchor_point;
    let desqueezed_width = round_half_away(d.width as f64 * canvas.squeeze()).max(0) as u32;

    DecisionSummary {
        decision_id: decision.id.clone(),
        fit: fit_kind(canvas.dimensions, d.width, d.height),
        aspect_ratio: format_aspect_ratio(d.width, d.height).unwrap_or_default(),
        desqueezed_aspect_ratio: format_aspect_ratio(desqueezed_width, d.height).unwrap_or_default(),
        dimensions: d,
        anchor_point: a,
        margins: Margins {
            left: a.x,
            right: canvas.dimensions.width as i64 - (a.x + d.width as i64),
            top: a.y,
            bottom: canvas.dimensions.height as i64 - (a.y + d.height as i64),
        },
        protection_dimensions: decision.protection_dimensions,
        protection_aspect_ratio: decision
            .protection_dimensions
            .and_then(|p| format_aspect_ratio(p.width, p.height)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AspectRatio;

    fn hd() -> Canvas {
        Canvas::new("A001", Dimensions::new(1920, 1080))
    }

    #[test]
    fn test_pillarbox_4_3() {
        let intent = FramingIntent::new("academy", AspectRatio::new(4, 3));
        let d = derive_decision(&intent, &hd()).unwrap();
        assert_eq!(d.dimensions, Dimensions::new(1440, 1080));
        assert_eq!(d.anchor_point, Point::new(240, 0));
        assert_eq!(d.id, "A001-academy");
        assert!(d.protection_dimensions.is_none());
    }

    #[test]
    fn test_letterbox_21_9() {
        let intent = FramingIntent::new("scope", AspectRatio::new(21, 9));
        let d = derive_decision(&intent, &hd()).unwrap();
        assert_eq!(d.dimensions, Dimensions::new(1920, 823));
        assert_eq!(d.anchor_point, Point::new(0, 129));
    }

    #[test]
    fn test_exact_ratio_unreduced() {
        let intent = FramingIntent::new("hd", AspectRatio::new(1920, 1080));
        let d = derive_decision(&intent, &hd()).unwrap();
        assert_eq!(d.dimensions, Dimensions::new(1920, 1080));
        assert_eq!(d.anchor_point, Point::origin());
    }

    #[test]
    fn test_protection_recentres() {
        let intent = FramingIntent::new("academy", AspectRatio::new(4, 3)).with_protection(10.0);
        let d = derive_decision(&intent, &hd()).unwrap();
        assert_eq!(d.protection_dimensions, Some(Dimensions::new(1296, 972)));
        assert_eq!(d.protection_anchor_point, Some(Point::new(240 + 72, 54)));
    }

    #[test]
    fn test_zero_protection_is_none() {
        let intent = FramingIntent::new("academy", AspectRatio::new(4, 3)).with_protection(0.0);
        let d = derive_decision(&intent, &hd()).unwrap();
        assert_eq!(d.protection_dimensions, None);
        assert_eq!(d.protection_anchor_point, None);
    }

    #[test]
    fn test_invalid_inputs() {
        let intent = FramingIntent::new("bad", AspectRatio::new(0, 9));
        assert!(matches!(
            derive_decision(&intent, &hd()),
            Err(GeometryError::InvalidAspectRatio { .. })
        ));

        let intent = FramingIntent::new("ok", AspectRatio::new(16, 9));
        let canvas = Canvas::new("Z", Dimensions::new(0, 1080));
        let err = derive_decision(&intent, &canvas).unwrap_err();
        assert!(err.to_string().contains("non-positive dimensions"));
    }

    #[test]
    fn test_extreme_ratio_never_zero() {
        let intent = FramingIntent::new("strip", AspectRatio::new(10000, 1));
        let canvas = Canvas::new("tall", Dimensions::new(10, 1000));
        let d = derive_decision(&intent, &canvas).unwrap();
        assert_eq!(d.dimensions, Dimensions::new(10, 1));
    }

    fn doc_with(intents: Vec<FramingIntent>, decisions: Vec<FramingDecision>) -> FdlDocument {
        let mut canvas = hd();
        canvas.framing_decisions = decisions;
        FdlDocument {
            framing_intents: intents,
            contexts: vec![Context { canvases: vec![canvas], ..Default::default() }],
            ..FdlDocument::new()
        }
    }

    #[test]
    fn test_recompute_refreshes_and_drops() {
        let intent = FramingIntent::new("academy", AspectRatio::new(4, 3));
        let mut stale = derive_decision(&intent, &hd()).unwrap();
        stale.dimensions = Dimensions::new(1, 1);
        stale.label = Some("kept label".into());
        let orphan = FramingDecision {
            framing_intent_id: "gone".into(),
            id: "A001-gone".into(),
            ..stale.clone()
        };

        let doc = doc_with(vec![intent], vec![stale, orphan]);
        let out = recompute_all_decisions(&doc);
        let decisions = &out.contexts[0].canvases[0].framing_decisions;
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].dimensions, Dimensions::new(1440, 1080));
        assert_eq!(decisions[0].label.as_deref(), Some("kept label"));
        // input untouched
        assert_eq!(doc.contexts[0].canvases[0].framing_decisions.len(), 2);
    }

    #[test]
    fn test_ensure_then_remove() {
        let doc = doc_with(
            vec![
                FramingIntent::new("academy", AspectRatio::new(4, 3)),
                FramingIntent::new("scope", AspectRatio::new(21, 9)),
            ],
            vec![],
        );
        let doc = FdlDocument { default_framing_intent: Some("scope".into()), ..doc };

        let ensured = ensure_decisions(&doc);
        let ids: Vec<_> = ensured.contexts[0].canvases[0]
            .framing_decisions
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, ["A001-academy", "A001-scope"]);
        assert_eq!(ensure_decisions(&ensured), ensured);

        let removed = remove_framing_intent(&ensured, "scope");
        assert_eq!(removed.framing_intents.len(), 1);
        assert_eq!(removed.default_framing_intent, None);
        assert_eq!(removed.contexts[0].canvases[0].framing_decisions.len(), 1);
    }

    #[test]
    fn test_describe_decision_margins() {
        let canvas = hd().with_anamorphic_squeeze(2.0);
        let intent = FramingIntent::new("academy", AspectRatio::new(4, 3)).with_protection(10.0);
        let d = derive_decision(&intent, &canvas).unwrap();
        let summary = describe_decision(&canvas, &d);
        assert_eq!(summary.fit, FitKind::Pillarbox);
        assert_eq!(summary.aspect_ratio, "1.33333:1");
        assert_eq!(summary.desqueezed_aspect_ratio, "2.66667:1");
        assert_eq!(summary.margins, Margins { left: 240, right: 240, top: 0, bottom: 0 });
        assert_eq!(summary.protection_aspect_ratio.as_deref(), Some("1.33333:1"));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let intent = FramingIntent::new("academy", AspectRatio::new(4, 3));
        let stale = derive_decision(&intent, &hd()).unwrap();
        let doc = doc_with(vec![intent], vec![stale]);
        assert_eq!(recompute_all_decisions_par(&doc), recompute_all_decisions(&doc));
    }
}
