//! Identifier Service
//!
//! Slugs are deterministic and not unique by construction; collisions are
//! reported by the validator's ID-tree pass.

use uuid::Uuid;

/// Longest element id the FDL schema accepts.
pub const MAX_ELEMENT_ID_LEN: usize = 32;

/// Fresh RFC-4122 version 4 UUID for a document header.
pub fn generate_document_id() -> String {
    Uuid::new_v4().to_string()
}

/// Slugify a label into an element id: `[A-Za-z0-9_]`, at most 32 characters.
pub fn generate_element_id(seed_label: &str) -> String {
    seed_label
        .chars()
        .map(|c| if is_id_char(c) { c } else { '_' })
        .take(MAX_ELEMENT_ID_LEN)
        .collect()
}

/// Framing decision id: `<canvas_id>-<framing_intent_id>`.
pub fn decision_id(canvas_id: &str, framing_intent_id: &str) -> String {
    format!("{}-{}", canvas_id, framing_intent_id)
}

pub(crate) fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// True when `id` is a well-formed element id.
pub fn is_valid_element_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_ELEMENT_ID_LEN && id.chars().all(is_id_char)
}

/// True when `id` is a well-formed framing decision id (`a` or `a-b`).
pub fn is_valid_decision_id(id: &str) -> bool {
    let mut parts = id.splitn(2, '-');
    let head = parts.next().unwrap_or_default();
    let head_ok = is_valid_element_id(head);
    match parts.next() {
        Some(tail) => head_ok && is_valid_element_id(tail),
        None => head_ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_is_v4() {
        let id = generate_document_id();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(parsed.get_variant(), uuid::Variant::RFC4122);
        assert_ne!(id, generate_document_id());
    }

    #[test]
    fn test_element_id_slug() {
        assert_eq!(generate_element_id("Scope 2.39:1"), "Scope_2_39_1");
        assert_eq!(generate_element_id("already_ok_123"), "already_ok_123");
        assert_eq!(generate_element_id("Ünïcode"), "_n_code");
    }

    #[test]
    fn test_element_id_truncates() {
        let long = "a".repeat(50);
        assert_eq!(generate_element_id(&long).len(), MAX_ELEMENT_ID_LEN);
    }

    #[test]
    fn test_element_id_deterministic_collisions() {
        assert_eq!(generate_element_id("16:9"), generate_element_id("16-9"));
    }

    #[test]
    fn test_decision_id_shape() {
        let id = decision_id("A001", "wide");
        assert_eq!(id, "A001-wide");
        assert!(is_valid_decision_id(&id));
        assert!(is_valid_decision_id("plain"));
        assert!(!is_valid_decision_id("a-b-c"));
        assert!(!is_valid_decision_id(""));
    }
}
