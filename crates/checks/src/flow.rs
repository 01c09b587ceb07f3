//! Flow-direction check
//!
//! Walks a feature's vertex sequence and verifies the elevations run
//! monotonically once a direction is established. The first vertex
//! anchors a reference elevation; while successive vertices stay within
//! tolerance of that anchor the direction is still open and the next
//! vertex is compared against the same anchor. Once a vertex breaks the
//! tolerance the run direction is fixed and every later vertex is
//! checked both against its predecessor and against the running extreme
//! of the run.
//!
//! The scan stops at the first violation for a feature; later vertices
//! are not examined.

use hydrocheck_core::{Category, Feature, Finding};

/// Scan state for one feature. Passed by value through the loop so no
/// state survives the scan.
#[derive(Debug, Clone, Copy)]
enum FlowRun {
    /// Direction not yet established; `anchor` is the first vertex's
    /// elevation and does not advance while comparisons stay within
    /// tolerance.
    Undetermined { anchor: f64 },
    Ascending { max_seen: f64 },
    Descending { min_seen: f64 },
}

/// Check one feature's flow direction.
///
/// Returns at most one finding: the scan is fail-fast and halts at the
/// first inflection. The previous-vertex test is evaluated before the
/// running-extreme test, so a vertex violating both reports as a
/// previous-vertex inflection.
pub fn scan_flow(layer: &str, feature: &Feature, tolerance: f64) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut run: Option<FlowRun> = None;
    let mut prev_z = 0.0;

    for vertex in feature.geometry.vertices() {
        match run {
            None => {
                run = Some(FlowRun::Undetermined { anchor: vertex.z });
            }
            Some(FlowRun::Undetermined { anchor }) => {
                let delta = vertex.z - anchor;
                if delta.abs() > tolerance {
                    run = Some(if delta > 0.0 {
                        FlowRun::Ascending { max_seen: vertex.z }
                    } else {
                        FlowRun::Descending { min_seen: vertex.z }
                    });
                }
            }
            Some(FlowRun::Descending { min_seen }) => {
                let from_prev = vertex.z - prev_z;
                let from_min = vertex.z - min_seen;
                if from_prev > tolerance || from_min > tolerance {
                    let (delta, category) = if from_prev > tolerance {
                        (from_prev, Category::PreviousVertexInflection)
                    } else {
                        (from_min, Category::RelativeInflection)
                    };
                    findings.push(
                        Finding::new(layer, &feature.id, category)
                            .with_elevation(vertex.z)
                            .with_delta(delta.abs())
                            .with_location(vertex.x, vertex.y),
                    );
                    break;
                }
                if vertex.z < min_seen {
                    run = Some(FlowRun::Descending { min_seen: vertex.z });
                }
            }
            Some(FlowRun::Ascending { max_seen }) => {
                let from_prev = vertex.z - prev_z;
                let from_max = vertex.z - max_seen;
                if from_prev < -tolerance || from_max < -tolerance {
                    let (delta, category) = if from_prev < -tolerance {
                        (from_prev, Category::PreviousVertexInflection)
                    } else {
                        (from_max, Category::RelativeInflection)
                    };
                    findings.push(
                        Finding::new(layer, &feature.id, category)
                            .with_elevation(vertex.z)
                            .with_delta(delta.abs())
                            .with_location(vertex.x, vertex.y),
                    );
                    break;
                }
                if vertex.z > max_seen {
                    run = Some(FlowRun::Ascending { max_seen: vertex.z });
                }
            }
        }
        prev_z = vertex.z;
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydrocheck_core::{GeometryZ, Vertex};

    fn line(zs: &[f64]) -> Feature {
        let vertices = zs
            .iter()
            .enumerate()
            .map(|(i, &z)| Vertex::new(i as f64, 0.0, z))
            .collect();
        Feature::new("F1", GeometryZ::Line(vertices))
    }

    #[test]
    fn test_monotonic_descending_is_clean() {
        let feature = line(&[10.0, 8.0, 6.0, 4.0, 2.0]);
        assert!(scan_flow("drainage", &feature, 0.1).is_empty());
    }

    #[test]
    fn test_monotonic_ascending_is_clean() {
        let feature = line(&[0.0, 0.5, 1.0]);
        assert!(scan_flow("drainage", &feature, 0.1).is_empty());
    }

    #[test]
    fn test_single_reversal_reports_previous_vertex_inflection() {
        let feature = line(&[0.0, 1.0, 0.5]);
        let findings = scan_flow("drainage", &feature, 0.1);
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.category, Category::PreviousVertexInflection);
        assert_eq!(f.elevation, Some(0.5));
        assert_eq!(f.delta, Some(0.5));
        assert_eq!(f.x, Some(2.0));
    }

    #[test]
    fn test_ask_again_keeps_anchor_until_tolerance_breaks() {
        // First two deltas stay inside tolerance of the anchor; the
        // fourth vertex finally fixes the direction downward.
        let feature = line(&[5.0, 5.05, 4.95, 4.7, 4.5]);
        assert!(scan_flow("drainage", &feature, 0.1).is_empty());
    }

    #[test]
    fn test_relative_inflection_on_slow_rise() {
        // Each step stays within tolerance of its predecessor but the
        // last vertex is above the running minimum by more than the
        // tolerance.
        let feature = line(&[10.0, 9.0, 9.05, 9.11]);
        let findings = scan_flow("drainage", &feature, 0.1);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, Category::RelativeInflection);
        assert!((findings[0].delta.unwrap() - 0.11).abs() < 1e-9);
    }

    #[test]
    fn test_fail_fast_reports_only_first_violation() {
        let feature = line(&[10.0, 8.0, 9.0, 7.0, 8.5]);
        let findings = scan_flow("drainage", &feature, 0.1);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].x, Some(2.0));
    }

    #[test]
    fn test_flat_feature_never_establishes_direction() {
        let feature = line(&[3.0, 3.01, 2.99, 3.0]);
        assert!(scan_flow("drainage", &feature, 0.1).is_empty());
    }

    #[test]
    fn test_short_feature_is_clean() {
        let feature = line(&[4.0]);
        assert!(scan_flow("drainage", &feature, 0.1).is_empty());
        let feature = line(&[]);
        assert!(scan_flow("drainage", &feature, 0.1).is_empty());
    }
}
