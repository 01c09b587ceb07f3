//! Surface elevation check
//!
//! A surface polygon (a lake, a reservoir, any water body at rest) must
//! sit at one constant elevation, and any drainage feature crossing it
//! must agree with that elevation where they meet.
//!
//! The vertex pass scans the whole polygon and reports every deviating
//! vertex (unlike the flow scan, which is fail-fast); if any vertex
//! deviated, the polygon has no well-defined surface elevation and the
//! intersection pass is skipped entirely.

use hydrocheck_core::geometry::{self, GeometryZ};
use hydrocheck_core::{Category, ControlConfig, Dataset, Feature, Finding, IndexSet, Result};

/// Validate one surface polygon.
pub fn validate_surface(
    layer_name: &str,
    feature: &Feature,
    dataset: &Dataset,
    indexes: &IndexSet,
    config: &ControlConfig,
) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    let tolerance = config.surface_tolerance;

    let Some(first) = feature.geometry.vertices().next() else {
        return Ok(findings);
    };
    // The first vertex determines the height of the polygon.
    let surface_elevation = first.z;

    let mut mismatched = false;
    for vertex in feature.geometry.vertices() {
        if (surface_elevation - vertex.z).abs() >= tolerance {
            findings.push(
                Finding::new(layer_name, &feature.id, Category::PolygonHeightMismatch)
                    .with_elevation(surface_elevation)
                    .with_delta((surface_elevation - vertex.z).abs())
                    .with_location(vertex.x, vertex.y),
            );
            mismatched = true;
        }
    }
    if mismatched {
        return Ok(findings);
    }

    let Some(bbox) = feature.geometry.bounding_box() else {
        return Ok(findings);
    };

    for other in &config.surface_intersect_layers {
        let layer = dataset.layer(other)?;
        let index = indexes.get(other)?;
        for id in index.candidates(&bbox) {
            let Some(candidate) = layer.feature(id) else {
                continue;
            };
            if !geometry::intersects(&feature.geometry, &candidate.geometry) {
                continue;
            }
            let Some(inter) = geometry::intersection(&feature.geometry, &candidate.geometry)
            else {
                continue;
            };
            check_intersection(
                layer_name,
                &feature.id,
                other,
                &candidate.id,
                &inter,
                surface_elevation,
                tolerance,
                &mut findings,
            );
        }
    }

    Ok(findings)
}

/// Classify the intersection by its geometry tag and compare elevations
/// accordingly. Line and multipoint scans stop at the first mismatch;
/// anything but points and lines is reported as a diagnostic instead of
/// compared. Mismatch findings name the crossing feature so the report
/// identifies both sides of the disagreement.
#[allow(clippy::too_many_arguments)]
fn check_intersection(
    layer: &str,
    feature: &str,
    other_layer: &str,
    other_feature: &str,
    intersection: &GeometryZ,
    surface_elevation: f64,
    tolerance: f64,
    findings: &mut Vec<Finding>,
) {
    match intersection {
        GeometryZ::Point(v) => {
            if (v.z - surface_elevation).abs() >= tolerance {
                findings.push(
                    Finding::new(layer, feature, Category::IntersectionHeightMismatch)
                        .with_elevation(surface_elevation)
                        .with_delta((v.z - surface_elevation).abs())
                        .with_location(v.x, v.y)
                        .with_detail(format!("{other_layer}/{other_feature}")),
                );
            }
        }
        GeometryZ::Line(_) | GeometryZ::MultiLine(_) | GeometryZ::MultiPoint(_) => {
            for v in intersection.vertices() {
                if (v.z - surface_elevation).abs() >= tolerance {
                    findings.push(
                        Finding::new(layer, feature, Category::IntersectionHeightMismatch)
                            .with_elevation(surface_elevation)
                            .with_delta((v.z - surface_elevation).abs())
                            .with_location(v.x, v.y)
                            .with_detail(format!("{other_layer}/{other_feature}")),
                    );
                    break;
                }
            }
        }
        other => {
            findings.push(
                Finding::new(layer, feature, Category::UnsupportedIntersectionGeometry)
                    .with_detail(other.type_name()),
            );
        }
    }
}
