//! Basin closure classification and verification
//!
//! Aggregates the per-endpoint resolutions of a layer into candidate
//! sets, then confirms or refutes each candidate:
//!
//! - a feature whose both endpoints resolved with intersection count 2
//!   closes on itself and is a candidate endorheic basin;
//! - an endpoint with count 1 (only the feature itself) is a possible
//!   network terminus and claims its elevation as the feature maximum.
//!
//! The shared all-layers test answers whether a geometry truly
//! intersects any feature of the configured adjacent layers, with a
//! bounding-box prefilter and an exact test, short-circuiting on the
//! first confirmed intersection.

use hydrocheck_core::geometry::{self, GeometryZ};
use hydrocheck_core::{Category, Dataset, Finding, IndexSet, Layer, Result};

use crate::continuity::EndpointResolution;

/// A possible network terminus with its claimed elevation.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMaximum {
    pub feature: String,
    pub elevation: f64,
}

/// Candidate sets for one layer, built once and consumed once.
#[derive(Debug, Default)]
pub struct CandidateSet {
    pub maxima: Vec<CandidateMaximum>,
    pub endorheic: Vec<String>,
}

/// Aggregate endpoint resolutions into the layer's candidate sets.
///
/// Count-2-on-both-ends takes precedence: an endorheic candidate never
/// also contributes to the maxima.
pub fn classify(resolutions: &[(String, EndpointResolution)]) -> CandidateSet {
    let mut set = CandidateSet::default();
    for (feature, resolution) in resolutions {
        if resolution.first.count == 2 && resolution.last.count == 2 {
            set.endorheic.push(feature.clone());
            continue;
        }
        if resolution.first.count == 1 {
            set.maxima.push(CandidateMaximum {
                feature: feature.clone(),
                elevation: resolution.first.elevation,
            });
        }
        if resolution.last.count == 1 {
            set.maxima.push(CandidateMaximum {
                feature: feature.clone(),
                elevation: resolution.last.elevation,
            });
        }
    }
    set
}

/// True if `geom` truly intersects any feature of the named layers,
/// skipping `own_layer`. Index candidates are advisory; each one is
/// re-tested exactly, and the first confirmed intersection wins.
pub fn intersects_any_layer(
    own_layer: &str,
    geom: &GeometryZ,
    layers: &[String],
    dataset: &Dataset,
    indexes: &IndexSet,
) -> Result<bool> {
    let Some(bbox) = geom.bounding_box() else {
        return Ok(false);
    };
    for name in layers {
        if name == own_layer {
            continue;
        }
        let layer = dataset.layer(name)?;
        let index = indexes.get(name)?;
        for id in index.candidates(&bbox) {
            let Some(candidate) = layer.feature(id) else {
                continue;
            };
            if geometry::intersects(geom, &candidate.geometry) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Confirm each candidate maximum: a vertex strictly above the claimed
/// endpoint elevation on a feature that drains into no adjacent layer
/// means the network is missing its true maximum.
pub fn verify_maxima(
    layer: &Layer,
    candidates: &[CandidateMaximum],
    closure_layers: &[String],
    dataset: &Dataset,
    indexes: &IndexSet,
) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    for candidate in candidates {
        let Some(feature) = layer.feature(&candidate.feature) else {
            continue;
        };
        let exceeded = feature
            .geometry
            .vertices()
            .any(|v| v.z > candidate.elevation);
        if exceeded
            && !intersects_any_layer(
                &layer.name,
                &feature.geometry,
                closure_layers,
                dataset,
                indexes,
            )?
        {
            findings.push(Finding::new(
                &layer.name,
                &candidate.feature,
                Category::MissingMaximum,
            ));
        }
    }
    Ok(findings)
}

/// Confirm each candidate endorheic feature: isolated from both the
/// survey boundary and every adjacent layer means a genuinely closed
/// basin.
pub fn verify_endorheic(
    layer: &Layer,
    candidates: &[String],
    boundary: &GeometryZ,
    closure_layers: &[String],
    dataset: &Dataset,
    indexes: &IndexSet,
) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    for id in candidates {
        let Some(feature) = layer.feature(id) else {
            continue;
        };
        if geometry::intersects(&feature.geometry, boundary) {
            continue;
        }
        if !intersects_any_layer(
            &layer.name,
            &feature.geometry,
            closure_layers,
            dataset,
            indexes,
        )? {
            findings.push(Finding::new(&layer.name, id, Category::EndorheicWithoutClosure));
        }
    }
    Ok(findings)
}
