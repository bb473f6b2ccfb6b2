//! Sensor Catalog - Read-Only Camera Reference Data
//!
//! The table itself is supplied from outside (one JSON file per manufacturer);
//! the engine only reads it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::ids::generate_element_id;
use crate::model::{Canvas, Dimensions, PhysicalDimensions};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Could not read sensor catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed sensor table {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One recording mode of a camera.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorMode {
    pub label: String,
    pub dimensions: Dimensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_dimensions: Option<PhysicalDimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anamorphic_squeeze: Option<f64>,
}

impl SensorMode {
    /// Fresh source canvas for this mode, id slugged from `seed_label`.
    pub fn to_canvas(&self, seed_label: &str) -> Canvas {
        let canvas = Canvas {
            photosite_dimensions: Some(self.dimensions),
            physical_dimensions: self.physical_dimensions,
            ..Canvas::new(generate_element_id(seed_label), self.dimensions)
        }
        .with_label(self.label.clone());

        match self.anamorphic_squeeze {
            Some(squeeze) => canvas.with_anamorphic_squeeze(squeeze),
            None => canvas,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraModel {
    pub model: String,
    #[serde(default)]
    pub modes: Vec<SensorMode>,
}

/// Contents of one manufacturer file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manufacturer {
    pub manufacturer: String,
    #[serde(default)]
    pub models: Vec<CameraModel>,
}

/// Sensor catalog - manufacturer → model → modes
#[derive(Debug, Clone, Default)]
pub struct SensorCatalog {
    manufacturers: BTreeMap<String, Manufacturer>,
}

impl SensorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file in `dir`. Unreadable or malformed files are skipped with a warning.
    pub fn load_from_dir(dir: &Path) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        if !dir.exists() {
            return Ok(catalog);
        }
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |e| e == "json") {
                match Self::read_file(&path) {
                    Ok(manufacturer) => catalog.register(manufacturer),
                    Err(e) => warn!(error = %e, "skipping sensor table"),
                }
            }
        }
        Ok(catalog)
    }

    fn read_file(path: &Path) -> Result<Manufacturer, CatalogError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| CatalogError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn register(&mut self, manufacturer: Manufacturer) {
        self.manufacturers
            .insert(manufacturer.manufacturer.clone(), manufacturer);
    }

    pub fn manufacturers(&self) -> Vec<&str> {
        self.manufacturers.keys().map(String::as_str).collect()
    }

    pub fn models(&self, manufacturer: &str) -> Option<Vec<&str>> {
        let m = self.manufacturers.get(manufacturer)?;
        Some(m.models.iter().map(|c| c.model.as_str()).collect())
    }

    pub fn modes(&self, manufacturer: &str, model: &str) -> Option<&[SensorMode]> {
        self.manufacturers
            .get(manufacturer)?
            .models
            .iter()
            .find(|c| c.model == model)
            .map(|c| c.modes.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.manufacturers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARRI: &str = r#"{
        "manufacturer": "ARRI",
        "models": [{
            "model": "ALEXA 35",
            "modes": [
                {"label": "4.6K 3:2 Open Gate", "dimensions": {"width": 4608, "height": 3164},
                 "physical_dimensions": {"width": 27.99, "height": 19.22}},
                {"label": "4K 2:1 Ana", "dimensions": {"width": 4096, "height": 2048},
                 "anamorphic_squeeze": 2.0}
            ]
        }]
    }"#;

    #[test]
    fn test_load_from_dir_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("arri.json"), ARRI).unwrap();
        fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = SensorCatalog::load_from_dir(dir.path()).unwrap();
        assert_eq!(catalog.manufacturers(), ["ARRI"]);
        assert_eq!(catalog.models("ARRI").unwrap(), ["ALEXA 35"]);
        assert_eq!(catalog.modes("ARRI", "ALEXA 35").unwrap().len(), 2);
        assert!(catalog.modes("ARRI", "ALEXA Mini").is_none());
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let catalog = SensorCatalog::load_from_dir(Path::new("/nonexistent/sensors")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_mode_to_canvas() {
        let manufacturer: Manufacturer = serde_json::from_str(ARRI).unwrap();
        let mode = &manufacturer.models[0].modes[1];
        let canvas = mode.to_canvas("ALEXA 35 4K Ana");

        assert_eq!(canvas.id, "ALEXA_35_4K_Ana");
        assert_eq!(canvas.source_canvas_id, canvas.id);
        assert_eq!(canvas.label.as_deref(), Some("4K 2:1 Ana"));
        assert_eq!(canvas.photosite_dimensions, Some(Dimensions::new(4096, 2048)));
        assert_eq!(canvas.effective_dimensions, Some(Dimensions::new(8192, 2048)));
    }
}
