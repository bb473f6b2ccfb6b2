//! Document I/O - The `.fdl` JSON Boundary
//!
//! The engine is never invoked on a partially parsed document: any parse
//! failure surfaces as an [`ImportError`].

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::model::FdlDocument;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Malformed FDL JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not read FDL file: {0}")]
    Io(#[from] std::io::Error),
}

impl FdlDocument {
    pub fn from_json(text: &str) -> Result<Self, ImportError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn save(&self, path: &Path) -> Result<(), ImportError> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

/// Read a file as raw JSON, for [`crate::validation::validate_json`].
pub fn load_value(path: &Path) -> Result<serde_json::Value, ImportError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
