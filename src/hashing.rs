//! Digest - SHA-256 Over Canonical JSON
//!
//! Two documents with the same content produce the same digest regardless of
//! key order.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::model::FdlDocument;

/// Canonical JSON: object keys sorted at every depth, no whitespace.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    write_canonical(&serde_json::to_value(value)?, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), serde_json::Error> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (n, (key, item)) in entries.into_iter().enumerate() {
                if n > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(item, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (n, item) in items.iter().enumerate() {
                if n > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

/// Fingerprint of a whole FDL document: lowercase hex SHA-256 of its canonical JSON.
pub fn document_digest(document: &FdlDocument) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(document)?;
    Ok(format!("{:x}", Sha256::digest(canonical.as_bytes())))
}
