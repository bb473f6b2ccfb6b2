//! Validation System - Schema Pass + ID-Tree Pass
//!
//! Rules produce structured errors; nothing stops at the first problem.
//! The schema pass walks the JSON shape so wrong types and unknown enum
//! strings are reported with a path. The ID-tree pass walks the same JSON
//! and checks that every reference resolves to a unique element.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::ids::{is_valid_decision_id, is_valid_element_id, MAX_ELEMENT_ID_LEN};
use crate::model::{
    FdlDocument, FitMethod, FitSource, HorizontalAlignment, VerticalAlignment,
};
use crate::precision::{RoundingEven, RoundingMode};

/// Highest protection percentage a framing intent may carry.
pub const MAX_PROTECTION: f64 = 99.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdTreeError {
    pub path: String,
    pub message: String,
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "document" } else { path }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", display_path(&self.path), self.message)
    }
}

impl fmt::Display for IdTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", display_path(&self.path), self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Schema errors followed by ID-tree errors, human-readable.
    pub errors: Vec<String>,
    pub schema_errors: Vec<SchemaError>,
    pub id_tree_errors: Vec<IdTreeError>,
}

impl ValidationReport {
    pub fn new(schema_errors: Vec<SchemaError>, id_tree_errors: Vec<IdTreeError>) -> Self {
        let errors = schema_errors
            .iter()
            .map(ToString::to_string)
            .chain(id_tree_errors.iter().map(ToString::to_string))
            .collect();
        Self {
            is_valid: schema_errors.is_empty() && id_tree_errors.is_empty(),
            errors,
            schema_errors,
            id_tree_errors,
        }
    }
}

/// Schema rule trait - each rule checks one region of the document shape.
pub trait SchemaRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, document: &Value) -> Vec<SchemaError>;
}

// --- Field checking helpers ---

fn join(path: &str, key: &str) -> String {
    if path.is_empty() { key.to_string() } else { format!("{}.{}", path, key) }
}

fn index(path: &str, i: usize) -> String {
    format!("{}[{}]", path, i)
}

/// Collects errors for the fields of one JSON object.
struct Fields<'v, 'e> {
    object: &'v Map<String, Value>,
    path: String,
    errors: &'e mut Vec<SchemaError>,
}

impl<'v, 'e> Fields<'v, 'e> {
    fn open<'a, 'b>(
        value: &'a Value,
        path: String,
        errors: &'b mut Vec<SchemaError>,
    ) -> Option<Fields<'a, 'b>> {
        match value.as_object() {
            Some(object) => Some(Fields { object, path, errors }),
            None => {
                errors.push(SchemaError { path, message: "must be an object".into() });
                None
            }
        }
    }

    fn error(&mut self, key: &str, message: impl Into<String>) {
        self.errors.push(SchemaError { path: join(&self.path, key), message: message.into() });
    }

    fn get(&mut self, key: &str, required: bool) -> Option<&'v Value> {
        match self.object.get(key) {
            Some(Value::Null) => {
                self.error(key, "must be omitted rather than null");
                None
            }
            Some(v) => Some(v),
            None => {
                if required {
                    self.error(key, "is required");
                }
                None
            }
        }
    }

    fn string(&mut self, key: &str, required: bool) -> Option<&'v str> {
        let value = self.get(key, required)?;
        match value.as_str() {
            Some(s) => Some(s),
            None => {
                self.error(key, "must be a string");
                None
            }
        }
    }

    fn element_id(&mut self, key: &str, required: bool) {
        if let Some(id) = self.string(key, required) {
            if !is_valid_element_id(id) {
                self.error(
                    key,
                    format!(
                        "'{}' must be 1-{} characters of [A-Za-z0-9_]",
                        id, MAX_ELEMENT_ID_LEN
                    ),
                );
            }
        }
    }

    fn decision_id(&mut self, key: &str) {
        if let Some(id) = self.string(key, true) {
            if !is_valid_decision_id(id) {
                self.error(key, format!("'{}' must look like <canvas_id>-<framing_intent_id>", id));
            }
        }
    }

    fn boolean(&mut self, key: &str, required: bool) {
        if let Some(value) = self.get(key, required) {
            if !value.is_boolean() {
                self.error(key, "must be a boolean");
            }
        }
    }

    fn positive_number(&mut self, key: &str, required: bool) -> Option<f64> {
        let value = self.get(key, required)?;
        match value.as_f64() {
            Some(n) if n > 0.0 && n.is_finite() => Some(n),
            _ => {
                self.error(key, "must be a positive number");
                None
            }
        }
    }

    fn number_in(&mut self, key: &str, min: f64, max: f64) {
        if let Some(value) = self.get(key, false) {
            match value.as_f64() {
                Some(n) if (min..=max).contains(&n) => {}
                _ => self.error(key, format!("must be a number between {} and {}", min, max)),
            }
        }
    }

    fn enumeration(&mut self, key: &str, allowed: &[&str], required: bool) {
        if let Some(s) = self.string(key, required) {
            if !allowed.contains(&s) {
                self.error(key, format!("'{}' is not one of: {}", s, allowed.join(", ")));
            }
        }
    }

    /// Integer pixel dimensions, both strictly positive.
    fn dimensions(&mut self, key: &str, required: bool) -> Option<(u64, u64)> {
        let value = self.get(key, required)?;
        let mut sub = Fields::open(value, join(&self.path, key), self.errors)?;
        let width = sub.positive_integer("width");
        let height = sub.positive_integer("height");
        Some((width?, height?))
    }

    /// Real-valued dimensions (millimetres), both strictly positive.
    fn physical_dimensions(&mut self, key: &str) {
        if let Some(value) = self.get(key, false) {
            if let Some(mut sub) = Fields::open(value, join(&self.path, key), self.errors) {
                sub.positive_number("width", true);
                sub.positive_number("height", true);
            }
        }
    }

    fn positive_integer(&mut self, key: &str) -> Option<u64> {
        let value = self.get(key, true)?;
        match value.as_u64() {
            Some(n) if n > 0 && n <= u32::MAX as u64 => Some(n),
            _ => {
                self.error(key, "must be a positive integer");
                None
            }
        }
    }

    fn non_negative_integer(&mut self, key: &str) -> Option<u64> {
        let value = self.get(key, true)?;
        match value.as_u64() {
            Some(n) => Some(n),
            None => {
                self.error(key, "must be a non-negative integer");
                None
            }
        }
    }

    fn point(&mut self, key: &str, required: bool) -> Option<(u64, u64)> {
        let value = self.get(key, required)?;
        let mut sub = Fields::open(value, join(&self.path, key), self.errors)?;
        let x = sub.non_negative_integer("x");
        let y = sub.non_negative_integer("y");
        Some((x?, y?))
    }

    fn array(&mut self, key: &str, required: bool) -> &'v [Value] {
        match self.get(key, required) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                self.error(key, "must be an array");
                &[]
            }
            None => &[],
        }
    }
}

// --- Concrete Rules ---

pub struct HeaderRule;

impl SchemaRule for HeaderRule {
    fn name(&self) -> &'static str { "header" }

    fn validate(&self, document: &Value) -> Vec<SchemaError> {
        let mut errors = vec![];
        let Some(mut root) = Fields::open(document, String::new(), &mut errors) else {
            return errors;
        };

        if let Some(uuid) = root.string("uuid", true) {
            if uuid::Uuid::parse_str(uuid).is_err() {
                root.error("uuid", format!("'{}' is not a valid UUID", uuid));
            }
        }

        if let Some(version) = root.get("version", true) {
            if let Some(mut v) = Fields::open(version, "version".into(), root.errors) {
                let major = v.non_negative_integer("major");
                let minor = v.non_negative_integer("minor");
                if let (Some(major), Some(minor)) = (major, minor) {
                    if major != 1 || minor > 1 {
                        v.errors.push(SchemaError {
                            path: "version".into(),
                            message: format!("unsupported FDL version {}.{} (expected 1.0 or 1.1)", major, minor),
                        });
                    }
                }
            }
        }

        root.string("fdl_creator", false);
        root.element_id("default_framing_intent", false);
        root.array("framing_intents", false);
        root.array("contexts", false);
        root.array("canvas_templates", false);
        errors
    }
}

pub struct FramingIntentRule;

impl SchemaRule for FramingIntentRule {
    fn name(&self) -> &'static str { "framing_intents" }

    fn validate(&self, document: &Value) -> Vec<SchemaError> {
        let mut errors = vec![];
        let Some(items) = document.get("framing_intents").and_then(Value::as_array) else {
            return errors;
        };

        for (i, item) in items.iter().enumerate() {
            let Some(mut intent) = Fields::open(item, index("framing_intents", i), &mut errors) else {
                continue;
            };
            intent.element_id("id", true);
            intent.string("label", false);
            intent.dimensions("aspect_ratio", true);
            intent.number_in("protection", 0.0, MAX_PROTECTION);
        }
        errors
    }
}

pub struct ContextRule;

impl ContextRule {
    fn canvas(&self, value: &Value, path: String, errors: &mut Vec<SchemaError>) {
        let Some(mut canvas) = Fields::open(value, path.clone(), errors) else {
            return;
        };
        canvas.element_id("id", true);
        canvas.element_id("source_canvas_id", true);
        canvas.string("label", false);
        let bounds = canvas.dimensions("dimensions", true);
        canvas.dimensions("effective_dimensions", false);
        canvas.point("effective_anchor_point", false);
        canvas.dimensions("photosite_dimensions", false);
        canvas.physical_dimensions("physical_dimensions");
        canvas.positive_number("anamorphic_squeeze", false);
        canvas.string("recording_codec", false);

        let decisions = canvas.array("framing_decisions", false);
        let decisions_path = join(&path, "framing_decisions");
        for (j, decision) in decisions.iter().enumerate() {
            self.decision(decision, index(&decisions_path, j), bounds, errors);
        }
    }

    fn decision(
        &self,
        value: &Value,
        path: String,
        bounds: Option<(u64, u64)>,
        errors: &mut Vec<SchemaError>,
    ) {
        let Some(mut decision) = Fields::open(value, path, errors) else {
            return;
        };
        decision.decision_id("id");
        decision.string("label", false);
        decision.element_id("framing_intent_id", true);
        let size = decision.dimensions("dimensions", true);
        let anchor = decision.point("anchor_point", true);
        decision.dimensions("protection_dimensions", false);
        decision.point("protection_anchor_point", false);

        if let (Some((cw, ch)), Some((w, h)), Some((x, y))) = (bounds, size, anchor) {
            if x + w > cw || y + h > ch {
                decision.error(
                    "dimensions",
                    format!("{}x{} at ({}, {}) extends beyond the {}x{} canvas", w, h, x, y, cw, ch),
                );
            }
        }
    }
}

impl SchemaRule for ContextRule {
    fn name(&self) -> &'static str { "contexts" }

    fn validate(&self, document: &Value) -> Vec<SchemaError> {
        let mut errors = vec![];
        let Some(items) = document.get("contexts").and_then(Value::as_array) else {
            return errors;
        };

        for (i, item) in items.iter().enumerate() {
            let path = index("contexts", i);
            let Some(mut context) = Fields::open(item, path.clone(), &mut errors) else {
                continue;
            };
            context.string("label", false);
            context.string("context_creator", false);
            let canvases = context.array("canvases", false);
            let canvases_path = join(&path, "canvases");
            for (k, canvas) in canvases.iter().enumerate() {
                self.canvas(canvas, index(&canvases_path, k), &mut errors);
            }
        }
        errors
    }
}

pub struct CanvasTemplateRule;

impl SchemaRule for CanvasTemplateRule {
    fn name(&self) -> &'static str { "canvas_templates" }

    fn validate(&self, document: &Value) -> Vec<SchemaError> {
        let mut errors = vec![];
        let Some(items) = document.get("canvas_templates").and_then(Value::as_array) else {
            return errors;
        };

        for (i, item) in items.iter().enumerate() {
            let path = index("canvas_templates", i);
            let Some(mut template) = Fields::open(item, path.clone(), &mut errors) else {
                continue;
            };
            template.element_id("id", true);
            template.string("label", false);
            template.dimensions("target_dimensions", true);
            template.positive_number("target_anamorphic_squeeze", false);
            template.enumeration("fit_source", &FitSource::ALL, true);
            template.enumeration("fit_method", &FitMethod::ALL, true);
            template.enumeration("alignment_method_vertical", &VerticalAlignment::ALL, false);
            template.enumeration("alignment_method_horizontal", &HorizontalAlignment::ALL, false);
            template.enumeration("preserve_from_source_canvas", &FitSource::ALL, false);
            template.dimensions("maximum_dimensions", false);
            template.boolean("pad_to_maximum", false);

            if let Some(round) = template.get("round", false) {
                if let Some(mut r) = Fields::open(round, join(&path, "round"), &mut errors) {
                    r.enumeration("even", &RoundingEven::ALL, true);
                    r.enumeration("mode", &RoundingMode::ALL, true);
                }
            }
        }
        errors
    }
}

// --- ID tree ---

fn items<'v>(value: &'v Value, key: &str) -> &'v [Value] {
    value.get(key).and_then(Value::as_array).map_or(&[], Vec::as_slice)
}

fn text<'v>(value: &'v Value, key: &str) -> Option<&'v str> {
    value.get(key).and_then(Value::as_str)
}

/// Check that ids are unique and every reference resolves.
///
/// Works on the raw JSON so a type error elsewhere never hides a broken
/// reference. Elements whose `id` is missing or not a string are skipped;
/// the schema pass reports those.
pub fn check_id_tree(document: &Value) -> Vec<IdTreeError> {
    let mut errors = vec![];

    let mut intents: HashMap<&str, String> = HashMap::new();
    for (i, intent) in items(document, "framing_intents").iter().enumerate() {
        let Some(id) = text(intent, "id") else { continue };
        let here = index("framing_intents", i);
        if let Some(first) = intents.get(id) {
            errors.push(IdTreeError {
                path: join(&here, "id"),
                message: format!("duplicate framing intent id '{}' (first defined at {})", id, first),
            });
        } else {
            intents.insert(id, here);
        }
    }

    if let Some(default) = text(document, "default_framing_intent") {
        if !intents.contains_key(default) {
            errors.push(IdTreeError {
                path: "default_framing_intent".into(),
                message: format!("references unknown framing intent '{}'", default),
            });
        }
    }

    let mut canvases: HashMap<&str, String> = HashMap::new();
    let mut decisions: HashMap<&str, String> = HashMap::new();
    for (c, context) in items(document, "contexts").iter().enumerate() {
        let context_path = index("contexts", c);
        let local: HashSet<&str> = items(context, "canvases").iter().filter_map(|k| text(k, "id")).collect();

        for (k, canvas) in items(context, "canvases").iter().enumerate() {
            let canvas_path = index(&join(&context_path, "canvases"), k);
            if let Some(id) = text(canvas, "id") {
                if let Some(first) = canvases.get(id) {
                    errors.push(IdTreeError {
                        path: join(&canvas_path, "id"),
                        message: format!("duplicate canvas id '{}' (first defined at {})", id, first),
                    });
                } else {
                    canvases.insert(id, canvas_path.clone());
                }
            }

            if let Some(source) = text(canvas, "source_canvas_id") {
                if !local.contains(source) {
                    errors.push(IdTreeError {
                        path: join(&canvas_path, "source_canvas_id"),
                        message: format!("references canvas '{}' which is not in the same context", source),
                    });
                }
            }

            for (j, decision) in items(canvas, "framing_decisions").iter().enumerate() {
                let decision_path = index(&join(&canvas_path, "framing_decisions"), j);
                if let Some(id) = text(decision, "id") {
                    if let Some(first) = decisions.get(id) {
                        errors.push(IdTreeError {
                            path: join(&decision_path, "id"),
                            message: format!("duplicate framing decision id '{}' (first defined at {})", id, first),
                        });
                    } else {
                        decisions.insert(id, decision_path.clone());
                    }
                }

                if let Some(intent_id) = text(decision, "framing_intent_id") {
                    if !intents.contains_key(intent_id) {
                        errors.push(IdTreeError {
                            path: join(&decision_path, "framing_intent_id"),
                            message: format!("references unknown framing intent '{}'", intent_id),
                        });
                    }
                }
            }
        }
    }

    let mut templates: HashMap<&str, String> = HashMap::new();
    for (t, template) in items(document, "canvas_templates").iter().enumerate() {
        let Some(id) = text(template, "id") else { continue };
        let here = index("canvas_templates", t);
        if let Some(first) = templates.get(id) {
            errors.push(IdTreeError {
                path: join(&here, "id"),
                message: format!("duplicate canvas template id '{}' (first defined at {})", id, first),
            });
        } else {
            templates.insert(id, here);
        }
    }

    errors
}

/// Non-finite floats serialize to `null`. Report them with the range message
/// the JSON rules give for the same field.
fn non_finite_errors(document: &FdlDocument) -> Vec<SchemaError> {
    let mut errors = vec![];
    let mut check = |path: String, value: Option<f64>, message: &str| {
        if value.map_or(false, |v| !v.is_finite()) {
            errors.push(SchemaError { path, message: message.to_string() });
        }
    };
    let protection = format!("must be a number between {} and {}", 0.0, MAX_PROTECTION);
    let positive = "must be a positive number";

    for (i, intent) in document.framing_intents.iter().enumerate() {
        check(join(&index("framing_intents", i), "protection"), intent.protection, protection.as_str());
    }
    for (c, context) in document.contexts.iter().enumerate() {
        for (k, canvas) in context.canvases.iter().enumerate() {
            let canvas_path = index(&join(&index("contexts", c), "canvases"), k);
            check(join(&canvas_path, "anamorphic_squeeze"), canvas.anamorphic_squeeze, positive);
            if let Some(physical) = canvas.physical_dimensions {
                let physical_path = join(&canvas_path, "physical_dimensions");
                check(join(&physical_path, "width"), Some(physical.width), positive);
                check(join(&physical_path, "height"), Some(physical.height), positive);
            }
        }
    }
    for (t, template) in document.canvas_templates.iter().enumerate() {
        let here = join(&index("canvas_templates", t), "target_anamorphic_squeeze");
        check(here, Some(template.target_anamorphic_squeeze), positive);
    }
    errors
}

/// Validator orchestrates schema rules and the ID-tree pass.
pub struct Validator {
    rules: Vec<Box<dyn SchemaRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(HeaderRule),
                Box::new(FramingIntentRule),
                Box::new(ContextRule),
                Box::new(CanvasTemplateRule),
            ],
        }
    }

    fn schema_pass(&self, document: &Value) -> Vec<SchemaError> {
        let mut all_errors = vec![];
        for rule in &self.rules {
            let errors = rule.validate(document);
            if !errors.is_empty() {
                debug!(rule = rule.name(), count = errors.len(), "schema rule reported errors");
            }
            all_errors.extend(errors);
        }
        all_errors
    }

    /// Validate a typed document. Both passes always run.
    pub fn validate(&self, document: &FdlDocument) -> ValidationReport {
        let value = match serde_json::to_value(document) {
            Ok(value) => value,
            Err(e) => {
                let error = SchemaError {
                    path: String::new(),
                    message: format!("document could not be serialized: {}", e),
                };
                return ValidationReport::new(vec![error], vec![]);
            }
        };

        let mut schema_errors = self.schema_pass(&value);
        let non_finite = non_finite_errors(document);
        schema_errors.retain(|e| !non_finite.iter().any(|n| n.path == e.path));
        schema_errors.extend(non_finite);

        let id_tree_errors = check_id_tree(&value);
        debug!(schema = schema_errors.len(), id_tree = id_tree_errors.len(), "validated document");
        ValidationReport::new(schema_errors, id_tree_errors)
    }

    /// Validate raw JSON. Both passes always run.
    pub fn validate_json(&self, document: &Value) -> ValidationReport {
        let mut schema_errors = self.schema_pass(document);
        if schema_errors.is_empty() {
            // Values the rules accept but the model can't hold, e.g. an anchor past i64.
            if let Err(e) = serde_json::from_value::<FdlDocument>(document.clone()) {
                schema_errors.push(SchemaError {
                    path: String::new(),
                    message: format!("does not match the FDL document model: {}", e),
                });
            }
        }
        let id_tree_errors = check_id_tree(document);
        debug!(schema = schema_errors.len(), id_tree = id_tree_errors.len(), "validated json");
        ValidationReport::new(schema_errors, id_tree_errors)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a typed document with the default rule set.
pub fn validate(document: &FdlDocument) -> ValidationReport {
    Validator::new().validate(document)
}

/// Validate raw JSON with the default rule set.
pub fn validate_json(document: &Value) -> ValidationReport {
    Validator::new().validate_json(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "uuid": "8d6f3b0e-7a34-4c1c-9a59-5b2ad0c2f0aa",
            "version": {"major": 1, "minor": 0},
            "default_framing_intent": "academy",
            "framing_intents": [
                {"id": "academy", "aspect_ratio": {"width": 4, "height": 3}, "protection": 10}
            ],
            "contexts": [{
                "label": "A cam",
                "canvases": [{
                    "id": "A001",
                    "source_canvas_id": "A001",
                    "dimensions": {"width": 1920, "height": 1080},
                    "framing_decisions": [{
                        "id": "A001-academy",
                        "framing_intent_id": "academy",
                        "dimensions": {"width": 1440, "height": 1080},
                        "anchor_point": {"x": 240, "y": 0}
                    }]
                }]
            }],
            "canvas_templates": [{
                "id": "deliver",
                "target_dimensions": {"width": 1920, "height": 1080},
                "fit_source": "framing_decision.dimensions",
                "fit_method": "fit",
                "round": {"even": "even", "mode": "up"}
            }]
        })
    }

    #[test]
    fn test_minimal_is_valid() {
        let report = validate_json(&minimal());
        assert!(report.is_valid, "{:?}", report.errors);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_schema_collects_all() {
        let mut doc = minimal();
        doc["uuid"] = json!("not-a-uuid");
        doc["framing_intents"][0]["protection"] = json!(150);
        doc["framing_intents"][0]["aspect_ratio"]["height"] = json!(0);
        doc["canvas_templates"][0]["fit_method"] = json!("stretch");

        let report = validate_json(&doc);
        assert!(!report.is_valid);
        let paths: Vec<_> = report.schema_errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"uuid"));
        assert!(paths.contains(&"framing_intents[0].protection"));
        assert!(paths.contains(&"framing_intents[0].aspect_ratio.height"));
        assert!(paths.contains(&"canvas_templates[0].fit_method"));
        assert_eq!(report.errors.len(), report.schema_errors.len() + report.id_tree_errors.len());
    }

    #[test]
    fn test_wrong_types_and_missing_fields() {
        let mut doc = minimal();
        doc["contexts"][0]["canvases"][0]["dimensions"]["width"] = json!("1920");
        doc["framing_intents"][0]
            .as_object_mut()
            .unwrap()
            .remove("aspect_ratio");
        doc["fdl_creator"] = Value::Null;

        let report = validate_json(&doc);
        let messages: Vec<_> = report.errors.iter().map(String::as_str).collect();
        assert!(messages.contains(&"contexts[0].canvases[0].dimensions.width: must be a positive integer"));
        assert!(messages.contains(&"framing_intents[0].aspect_ratio: is required"));
        assert!(messages.contains(&"fdl_creator: must be omitted rather than null"));
    }

    #[test]
    fn test_type_error_does_not_hide_id_tree() {
        let mut doc = minimal();
        doc["framing_intents"] = json!([
            {"id": "a", "label": 5, "aspect_ratio": {"width": 4, "height": 3}},
            {"id": "a", "aspect_ratio": {"width": 16, "height": 9}}
        ]);
        doc["default_framing_intent"] = json!("a");
        doc["contexts"][0]["canvases"][0]["framing_decisions"][0]["id"] = json!("A001-ghost");
        doc["contexts"][0]["canvases"][0]["framing_decisions"][0]["framing_intent_id"] = json!("ghost");

        let report = validate_json(&doc);
        assert!(!report.is_valid);
        assert_eq!(report.schema_errors.len(), 1);
        assert_eq!(report.schema_errors[0].to_string(), "framing_intents[0].label: must be a string");

        let paths: Vec<_> = report.id_tree_errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "framing_intents[1].id",
                "contexts[0].canvases[0].framing_decisions[0].framing_intent_id",
            ]
        );
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn test_id_tree_skips_non_string_ids() {
        let mut doc = minimal();
        doc["framing_intents"][0]["id"] = json!(7);

        let report = validate_json(&doc);
        let schema: Vec<_> = report.schema_errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(schema, ["framing_intents[0].id"]);
        // The intent can't be resolved, so both references dangle.
        let paths: Vec<_> = report.id_tree_errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "default_framing_intent",
                "contexts[0].canvases[0].framing_decisions[0].framing_intent_id",
            ]
        );
    }

    #[test]
    fn test_unsupported_version() {
        let mut doc = minimal();
        doc["version"] = json!({"major": 2, "minor": 0});
        let report = validate_json(&doc);
        assert_eq!(report.schema_errors.len(), 1);
        assert_eq!(report.schema_errors[0].path, "version");
    }

    #[test]
    fn test_decision_outside_canvas() {
        let mut doc = minimal();
        doc["contexts"][0]["canvases"][0]["framing_decisions"][0]["anchor_point"]["x"] = json!(600);
        let report = validate_json(&doc);
        assert_eq!(report.schema_errors.len(), 1);
        assert!(report.schema_errors[0].message.contains("extends beyond"));
    }

    #[test]
    fn test_id_tree_dangling_and_duplicate() {
        let mut doc = minimal();
        doc["framing_intents"]
            .as_array_mut()
            .unwrap()
            .push(json!({"id": "academy", "aspect_ratio": {"width": 1, "height": 1}}));
        doc["contexts"][0]["canvases"][0]["framing_decisions"][0]["framing_intent_id"] = json!("missing");

        let report = validate_json(&doc);
        assert!(report.schema_errors.is_empty());
        assert_eq!(report.id_tree_errors.len(), 2);
        assert_eq!(report.id_tree_errors[0].path, "framing_intents[1].id");
        assert!(report.id_tree_errors[0].message.contains("framing_intents[0]"));
        assert_eq!(
            report.id_tree_errors[1].path,
            "contexts[0].canvases[0].framing_decisions[0].framing_intent_id"
        );
    }

    #[test]
    fn test_id_tree_canvas_linkage() {
        let mut doc = minimal();
        let canvas = doc["contexts"][0]["canvases"][0].clone();
        doc["contexts"]
            .as_array_mut()
            .unwrap()
            .push(json!({"canvases": [canvas]}));
        doc["contexts"][0]["canvases"][0]["source_canvas_id"] = json!("B001");
        doc["default_framing_intent"] = json!("nope");

        let report = validate_json(&doc);
        let paths: Vec<_> = report.id_tree_errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "default_framing_intent",
                "contexts[0].canvases[0].source_canvas_id",
                "contexts[1].canvases[0].id",
                "contexts[1].canvases[0].framing_decisions[0].id",
            ]
        );
    }

    #[test]
    fn test_typed_validate_matches_json() {
        let typed: FdlDocument = serde_json::from_value(minimal()).unwrap();
        assert_eq!(validate(&typed), validate_json(&minimal()));
    }

    #[test]
    fn test_typed_non_finite_is_range_error() {
        let mut typed: FdlDocument = serde_json::from_value(minimal()).unwrap();
        typed.framing_intents[0].protection = Some(f64::NAN);
        typed.contexts[0].canvases[0].anamorphic_squeeze = Some(f64::INFINITY);

        let report = validate(&typed);
        assert!(!report.is_valid);
        assert_eq!(
            report.errors,
            [
                "framing_intents[0].protection: must be a number between 0 and 99",
                "contexts[0].canvases[0].anamorphic_squeeze: must be a positive number",
            ]
        );
    }
}
