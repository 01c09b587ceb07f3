//! Run configuration
//!
//! Tolerances and layer lists are carried in one explicit value handed
//! to each component instead of being read from ambient state. Loaded
//! from a JSON file shaped after the control configuration the survey
//! pipeline distributes.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn default_line_tolerance() -> f64 {
    0.1
}

fn default_surface_tolerance() -> f64 {
    0.01
}

/// Configuration for one validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Elevation tolerance for flow-direction comparisons on lines.
    #[serde(default = "default_line_tolerance")]
    pub line_tolerance: f64,

    /// Elevation tolerance for polygon and intersection comparisons.
    #[serde(default = "default_surface_tolerance")]
    pub surface_tolerance: f64,

    /// Layers that get a spatial index before validation begins.
    pub indexed_layers: Vec<String>,

    /// Drainage-line layers checked for flow direction, continuity and
    /// basin closure.
    pub flow_layers: Vec<String>,

    /// Polygon layers checked for constant elevation.
    #[serde(default)]
    pub surface_layers: Vec<String>,

    /// Adjacency list for the endorheic-closure and maximum-height
    /// checks: layers a candidate may legitimately drain into.
    #[serde(default)]
    pub closure_layers: Vec<String>,

    /// Per-layer continuity adjacency: layers whose intersection at an
    /// endpoint explains an apparent continuity break.
    #[serde(default)]
    pub continuity: BTreeMap<String, Vec<String>>,

    /// Layers intersected against surface polygons for the elevation
    /// agreement check.
    #[serde(default)]
    pub surface_intersect_layers: Vec<String>,
}

impl ControlConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ControlConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject configurations that would fail mid-run: every flow layer
    /// must have a continuity adjacency entry.
    pub fn validate(&self) -> Result<()> {
        for layer in &self.flow_layers {
            if !self.continuity.contains_key(layer) {
                return Err(Error::MissingAdjacency(layer.clone()));
            }
        }
        Ok(())
    }

    pub fn continuity_for(&self, layer: &str) -> Result<&[String]> {
        self.continuity
            .get(layer)
            .map(|v| v.as_slice())
            .ok_or_else(|| Error::MissingAdjacency(layer.to_string()))
    }
}
