//! Per-layer spatial indexes
//!
//! Thin wrapper over an `rstar` R-tree of feature bounding boxes. The
//! index is advisory: a candidate list may over-approximate, and every
//! consumer re-checks with an exact geometry test. Built once per layer
//! before validation starts and read-only afterwards.

use std::collections::BTreeMap;

use geo_types::Rect;
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use crate::error::{Error, Result};
use crate::vector::{Dataset, Layer};

struct IndexEntry {
    envelope: AABB<[f64; 2]>,
    /// Position of the feature in the layer's insertion order.
    slot: usize,
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Bounding-box index over one layer.
pub struct SpatialIndex {
    tree: RTree<IndexEntry>,
    ids: Vec<String>,
}

impl SpatialIndex {
    /// Build from a layer's feature bounding boxes. Features with an
    /// empty geometry are not indexed.
    pub fn build(layer: &Layer) -> Self {
        let ids: Vec<String> = layer.features.iter().map(|f| f.id.clone()).collect();
        let entries: Vec<IndexEntry> = layer
            .features
            .iter()
            .enumerate()
            .filter_map(|(slot, f)| {
                f.geometry.bounding_box().map(|bbox| IndexEntry {
                    envelope: to_aabb(&bbox),
                    slot,
                })
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            ids,
        }
    }

    /// Candidate feature ids whose bounding box intersects `bbox`,
    /// returned in the layer's feature order so downstream findings
    /// stay deterministic.
    pub fn candidates(&self, bbox: &Rect<f64>) -> Vec<&str> {
        let mut slots: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&to_aabb(bbox))
            .map(|e| e.slot)
            .collect();
        slots.sort_unstable();
        slots.into_iter().map(|s| self.ids[s].as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

fn to_aabb(bbox: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min().x, bbox.min().y], [bbox.max().x, bbox.max().y])
}

/// The set of indexes configured for a run, keyed by layer name.
pub struct IndexSet {
    indexes: BTreeMap<String, SpatialIndex>,
}

impl IndexSet {
    /// Build one index per named layer.
    pub fn build(dataset: &Dataset, layer_names: &[String]) -> Result<Self> {
        info!("constructing spatial indexes for {} layers", layer_names.len());
        let mut indexes = BTreeMap::new();
        for name in layer_names {
            let layer = dataset.layer(name)?;
            indexes.insert(name.clone(), SpatialIndex::build(layer));
        }
        Ok(Self { indexes })
    }

    pub fn get(&self, layer: &str) -> Result<&SpatialIndex> {
        self.indexes
            .get(layer)
            .ok_or_else(|| Error::IndexMissing(layer.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeometryZ, Vertex};
    use crate::vector::Feature;
    use geo_types::Coord;

    fn line(id: &str, x0: f64, x1: f64) -> Feature {
        Feature::new(
            id,
            GeometryZ::Line(vec![Vertex::new(x0, 0.0, 1.0), Vertex::new(x1, 0.0, 0.0)]),
        )
    }

    fn layer() -> Layer {
        Layer::new(
            "drainage",
            vec![line("A", 0.0, 5.0), line("B", 4.0, 10.0), line("C", 20.0, 25.0)],
        )
    }

    #[test]
    fn test_candidates_filter_by_bbox() {
        let index = SpatialIndex::build(&layer());
        assert_eq!(index.len(), 3);

        let probe = Rect::new(Coord { x: 4.5, y: -1.0 }, Coord { x: 4.6, y: 1.0 });
        assert_eq!(index.candidates(&probe), vec!["A", "B"]);

        let probe = Rect::new(Coord { x: 30.0, y: 0.0 }, Coord { x: 31.0, y: 0.0 });
        assert!(index.candidates(&probe).is_empty());
    }

    #[test]
    fn test_degenerate_point_query() {
        let index = SpatialIndex::build(&layer());
        let probe = Rect::new(Coord { x: 20.0, y: 0.0 }, Coord { x: 20.0, y: 0.0 });
        assert_eq!(index.candidates(&probe), vec!["C"]);
    }

    #[test]
    fn test_index_set_missing_layer() {
        let dataset = Dataset::new(vec![layer()]);
        let set = IndexSet::build(&dataset, &["drainage".to_string()]).unwrap();
        assert!(set.get("drainage").is_ok());
        assert!(matches!(set.get("lakes"), Err(Error::IndexMissing(_))));
    }
}
