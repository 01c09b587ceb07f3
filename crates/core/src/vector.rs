//! Features, layers and the in-memory dataset
//!
//! A `Dataset` is read once at startup and never mutated during a
//! validation pass. Feature ids are the stable business keys carried in
//! the source data, distinct from any positional handle.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::GeometryZ;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// A hydrographic feature: business key, 3D geometry and the
/// non-identifier attributes used for continuity pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub geometry: GeometryZ,
    #[serde(default)]
    pub attributes: Vec<AttributeValue>,
}

impl Feature {
    pub fn new(id: impl Into<String>, geometry: GeometryZ) -> Self {
        Self {
            id: id.into(),
            geometry,
            attributes: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<AttributeValue>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Attribute values excluding the business key, in declaration
    /// order. Two features belong to the same continuity class when
    /// these compare equal.
    pub fn attributes_excluding_id(&self) -> &[AttributeValue] {
        &self.attributes
    }
}

/// A named collection of features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub features: Vec<Feature>,
    #[serde(skip)]
    by_id: HashMap<String, usize>,
}

impl Layer {
    pub fn new(name: impl Into<String>, features: Vec<Feature>) -> Self {
        let mut layer = Self {
            name: name.into(),
            features,
            by_id: HashMap::new(),
        };
        layer.rebuild_lookup();
        layer
    }

    fn rebuild_lookup(&mut self) {
        self.by_id = self
            .features
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.clone(), i))
            .collect();
    }

    pub fn feature(&self, id: &str) -> Option<&Feature> {
        self.by_id.get(id).map(|&i| &self.features[i])
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

/// All layers of one survey, loaded once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub layers: Vec<Layer>,
}

impl Dataset {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut dataset: Dataset = serde_json::from_str(json)?;
        for layer in &mut dataset.layers {
            layer.rebuild_lookup();
        }
        Ok(dataset)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn layer(&self, name: &str) -> Result<&Layer> {
        self.layers
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| Error::UnknownLayer(name.to_string()))
    }

    /// Geometry of the single feature of a boundary layer file.
    ///
    /// The survey extent is distributed as a one-feature layer; this
    /// takes the last feature's geometry when more than one is present.
    pub fn boundary_geometry(&self) -> Result<GeometryZ> {
        self.layers
            .iter()
            .flat_map(|l| l.features.iter())
            .last()
            .map(|f| f.geometry.clone())
            .ok_or(Error::EmptyBoundary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vertex;

    #[test]
    fn test_dataset_from_json() {
        let json = r#"{
            "layers": [
                {
                    "name": "drainage",
                    "features": [
                        {
                            "id": "D1",
                            "geometry": {"Line": [[0.0, 0.0, 5.0], [1.0, 0.0, 4.0]]},
                            "attributes": [{"String": "ditch"}, {"Int": 3}]
                        }
                    ]
                }
            ]
        }"#;
        let dataset = Dataset::from_json_str(json).unwrap();
        let layer = dataset.layer("drainage").unwrap();
        assert_eq!(layer.len(), 1);

        let feature = layer.feature("D1").unwrap();
        assert_eq!(
            feature.attributes_excluding_id(),
            &[
                AttributeValue::String("ditch".to_string()),
                AttributeValue::Int(3)
            ]
        );
        let (first, _) = feature.geometry.endpoints().unwrap();
        assert_eq!(first, Vertex::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_unknown_layer_is_an_error() {
        let dataset = Dataset::new(vec![]);
        assert!(dataset.layer("missing").is_err());
    }

    #[test]
    fn test_boundary_geometry_requires_a_feature() {
        let dataset = Dataset::new(vec![Layer::new("boundary", vec![])]);
        assert!(dataset.boundary_geometry().is_err());

        let poly = GeometryZ::Polygon(vec![vec![
            Vertex::new(0.0, 0.0, 0.0),
            Vertex::new(1.0, 0.0, 0.0),
            Vertex::new(1.0, 1.0, 0.0),
            Vertex::new(0.0, 0.0, 0.0),
        ]]);
        let dataset = Dataset::new(vec![Layer::new(
            "boundary",
            vec![Feature::new("B1", poly.clone())],
        )]);
        assert_eq!(dataset.boundary_geometry().unwrap(), poly);
    }
}
