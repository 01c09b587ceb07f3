//! Endpoint continuity check
//!
//! Resolves each endpoint of a drainage line against the co-located
//! features of its own layer. The spatial index supplies candidates by
//! bounding box; every candidate is re-tested with an exact intersection
//! before it counts. The feature itself always intersects its own
//! endpoint, so a genuine network terminus resolves with count 1 and an
//! endpoint continuing into exactly one neighbour resolves with
//! count 2.
//!
//! Elevation agreement between the endpoint and each intersecting
//! geometry is checked along the way; a pair of same-class features
//! meeting at an endpoint that does not drain into any adjacent layer
//! is a continuity break.

use hydrocheck_core::geometry::{self, GeometryZ};
use hydrocheck_core::{Category, ControlConfig, Dataset, Feature, Finding, IndexSet, Layer, Result, Vertex};

use crate::basin::intersects_any_layer;

/// How one endpoint resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointTag {
    /// Two co-located same-class features forming a legitimate pair.
    ClosedPair,
    /// Pair with no adjacent-layer outlet; a finding was emitted.
    ContinuityError,
    /// At most the feature itself intersects here; possible terminus.
    CandidateMaximum,
    /// No classification: more than two intersections, or two whose
    /// attributes do not match.
    None,
}

/// Classification of one endpoint, computed exactly once per feature
/// per run.
#[derive(Debug, Clone, Copy)]
pub struct EndpointOutcome {
    pub count: usize,
    pub elevation: f64,
    pub tag: EndpointTag,
}

/// Both endpoint classifications plus the findings discovered while
/// resolving them, in discovery order.
#[derive(Debug)]
pub struct EndpointResolution {
    pub first: EndpointOutcome,
    pub last: EndpointOutcome,
    pub findings: Vec<Finding>,
}

impl EndpointResolution {
    fn unresolved() -> Self {
        let none = EndpointOutcome {
            count: 0,
            elevation: 0.0,
            tag: EndpointTag::None,
        };
        Self {
            first: none,
            last: none,
            findings: Vec::new(),
        }
    }
}

/// Resolve both endpoints of `feature` against its own layer.
///
/// Features without line endpoints (points, polygons, degenerate
/// lines) resolve as unclassified with zero intersections.
pub fn resolve_endpoints(
    layer: &Layer,
    feature: &Feature,
    dataset: &Dataset,
    indexes: &IndexSet,
    config: &ControlConfig,
) -> Result<EndpointResolution> {
    let Some((first, last)) = feature.geometry.endpoints() else {
        return Ok(EndpointResolution::unresolved());
    };
    let adjacency = config.continuity_for(&layer.name)?;

    let mut findings = Vec::new();
    // One physical break shows up at both endpoint resolutions of the
    // pair; the second report is suppressed.
    let mut already_flagged = false;

    let first = resolve_one(
        layer, feature, &first, dataset, indexes, config, adjacency,
        &mut findings, &mut already_flagged,
    )?;
    let last = resolve_one(
        layer, feature, &last, dataset, indexes, config, adjacency,
        &mut findings, &mut already_flagged,
    )?;

    Ok(EndpointResolution { first, last, findings })
}

#[allow(clippy::too_many_arguments)]
fn resolve_one(
    layer: &Layer,
    feature: &Feature,
    endpoint: &Vertex,
    dataset: &Dataset,
    indexes: &IndexSet,
    config: &ControlConfig,
    adjacency: &[String],
    findings: &mut Vec<Finding>,
    already_flagged: &mut bool,
) -> Result<EndpointOutcome> {
    let point = GeometryZ::Point(*endpoint);
    let Some(bbox) = point.bounding_box() else {
        return Ok(EndpointOutcome {
            count: 0,
            elevation: endpoint.z,
            tag: EndpointTag::None,
        });
    };
    let index = indexes.get(&layer.name)?;

    let mut hits: Vec<&Feature> = Vec::new();
    for id in index.candidates(&bbox) {
        let Some(candidate) = layer.feature(id) else {
            continue;
        };
        if !geometry::intersects(&point, &candidate.geometry) {
            continue;
        }
        hits.push(candidate);
        if let Some(inter) = geometry::intersection(&point, &candidate.geometry) {
            intersection_height_findings(
                &layer.name,
                &feature.id,
                &inter,
                endpoint.z,
                config.surface_tolerance,
                findings,
            );
        }
    }

    let count = hits.len();
    let mut tag = match count {
        0 | 1 => EndpointTag::CandidateMaximum,
        2 => EndpointTag::ClosedPair,
        _ => EndpointTag::None,
    };

    if count == 2 {
        if !same_attributes(hits[0], hits[1]) {
            tag = EndpointTag::None;
        } else if !intersects_any_layer(&layer.name, &point, adjacency, dataset, indexes)? {
            tag = EndpointTag::ContinuityError;
            if !*already_flagged {
                findings.push(Finding::new(&layer.name, &feature.id, Category::ContinuityError));
                *already_flagged = true;
            }
        }
    }

    Ok(EndpointOutcome {
        count,
        elevation: endpoint.z,
        tag,
    })
}

/// The continuity pairing ignores the business key and compares the
/// remaining attributes for equality.
fn same_attributes(a: &Feature, b: &Feature) -> bool {
    a.attributes_excluding_id() == b.attributes_excluding_id()
}

/// Compare the elevation of an intersection geometry against the
/// endpoint elevation. Line and multipoint intersections stop at the
/// first mismatching vertex, so at most one finding is emitted per
/// intersecting candidate.
pub(crate) fn intersection_height_findings(
    layer: &str,
    feature: &str,
    intersection: &GeometryZ,
    elevation: f64,
    tolerance: f64,
    findings: &mut Vec<Finding>,
) {
    match intersection {
        GeometryZ::Point(v) => {
            if (v.z - elevation).abs() >= tolerance {
                findings.push(
                    Finding::new(layer, feature, Category::IntersectionHeightMismatch)
                        .with_elevation(elevation)
                        .with_delta((v.z - elevation).abs())
                        .with_location(v.x, v.y),
                );
            }
        }
        GeometryZ::Line(_) | GeometryZ::MultiLine(_) | GeometryZ::MultiPoint(_) => {
            for v in intersection.vertices() {
                if (v.z - elevation).abs() >= tolerance {
                    findings.push(
                        Finding::new(layer, feature, Category::IntersectionHeightMismatch)
                            .with_elevation(elevation)
                            .with_delta((v.z - elevation).abs())
                            .with_location(v.x, v.y),
                    );
                    break;
                }
            }
        }
        // Point-against-geometry intersections never produce surfaces.
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydrocheck_core::{AttributeValue, GeometryZ, Vertex};

    fn ditch_attrs() -> Vec<AttributeValue> {
        vec![AttributeValue::String("ditch".into()), AttributeValue::Int(2)]
    }

    fn line(id: &str, vertices: Vec<Vertex>) -> Feature {
        Feature::new(id, GeometryZ::Line(vertices)).with_attributes(ditch_attrs())
    }

    /// A at (0,0,5)-(1,0,4), continuing into B at (1,0,4)-(2,0,3).
    fn paired_dataset(b_z_at_join: f64) -> Dataset {
        let a = line(
            "A",
            vec![Vertex::new(0.0, 0.0, 5.0), Vertex::new(1.0, 0.0, 4.0)],
        );
        let b = line(
            "B",
            vec![Vertex::new(1.0, 0.0, b_z_at_join), Vertex::new(2.0, 0.0, 3.0)],
        );
        Dataset::new(vec![Layer::new("drainage", vec![a, b])])
    }

    fn config() -> ControlConfig {
        ControlConfig::from_json_str(
            r#"{
                "indexed_layers": ["drainage"],
                "flow_layers": ["drainage"],
                "continuity": {"drainage": []}
            }"#,
        )
        .unwrap()
    }

    fn resolve(dataset: &Dataset, config: &ControlConfig, id: &str) -> EndpointResolution {
        let indexes = IndexSet::build(dataset, &config.indexed_layers).unwrap();
        let layer = dataset.layer("drainage").unwrap();
        let feature = layer.feature(id).unwrap();
        resolve_endpoints(layer, feature, dataset, &indexes, config).unwrap()
    }

    #[test]
    fn test_pair_without_outlet_is_a_continuity_error() {
        let dataset = paired_dataset(4.0);
        let res = resolve(&dataset, &config(), "A");

        assert_eq!(res.first.count, 1);
        assert_eq!(res.first.tag, EndpointTag::CandidateMaximum);
        assert_eq!(res.last.count, 2);
        assert_eq!(res.last.tag, EndpointTag::ContinuityError);

        let continuity: Vec<_> = res
            .findings
            .iter()
            .filter(|f| f.category == Category::ContinuityError)
            .collect();
        assert_eq!(continuity.len(), 1);
        assert_eq!(continuity[0].feature, "A");
    }

    #[test]
    fn test_adjacent_layer_intersection_explains_the_break() {
        let mut dataset = paired_dataset(4.0);
        // A lake polygon covering the join point: the flow is consumed
        // there, so no continuity error.
        let lake = Feature::new(
            "L1",
            GeometryZ::Polygon(vec![vec![
                Vertex::new(0.5, -0.5, 4.0),
                Vertex::new(1.5, -0.5, 4.0),
                Vertex::new(1.5, 0.5, 4.0),
                Vertex::new(0.5, 0.5, 4.0),
                Vertex::new(0.5, -0.5, 4.0),
            ]]),
        );
        dataset.layers.push(Layer::new("lakes", vec![lake]));

        let config = ControlConfig::from_json_str(
            r#"{
                "indexed_layers": ["drainage", "lakes"],
                "flow_layers": ["drainage"],
                "continuity": {"drainage": ["lakes"]}
            }"#,
        )
        .unwrap();

        let res = resolve(&dataset, &config, "A");
        assert_eq!(res.last.count, 2);
        assert_eq!(res.last.tag, EndpointTag::ClosedPair);
        assert!(res
            .findings
            .iter()
            .all(|f| f.category != Category::ContinuityError));
    }

    #[test]
    fn test_differing_attributes_do_not_pair() {
        let mut dataset = paired_dataset(4.0);
        dataset.layers[0] = Layer::new(
            "drainage",
            vec![
                line(
                    "A",
                    vec![Vertex::new(0.0, 0.0, 5.0), Vertex::new(1.0, 0.0, 4.0)],
                ),
                Feature::new(
                    "B",
                    GeometryZ::Line(vec![
                        Vertex::new(1.0, 0.0, 4.0),
                        Vertex::new(2.0, 0.0, 3.0),
                    ]),
                )
                .with_attributes(vec![AttributeValue::String("canal".into())]),
            ],
        );

        let res = resolve(&dataset, &config(), "A");
        assert_eq!(res.last.count, 2);
        // A pair in name only: without matching attributes the endpoint
        // stays unclassified.
        assert_eq!(res.last.tag, EndpointTag::None);
        assert!(res.findings.is_empty());
    }

    #[test]
    fn test_intersection_height_mismatch_is_reported() {
        // B's elevation at the join differs from A's endpoint by 0.5.
        let dataset = paired_dataset(4.5);
        let res = resolve(&dataset, &config(), "A");

        let mismatches: Vec<_> = res
            .findings
            .iter()
            .filter(|f| f.category == Category::IntersectionHeightMismatch)
            .collect();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].elevation, Some(4.0));
        assert_eq!(mismatches[0].delta, Some(0.5));
    }

    #[test]
    fn test_isolated_feature_is_candidate_maximum_on_both_ends() {
        let dataset = Dataset::new(vec![Layer::new(
            "drainage",
            vec![line(
                "A",
                vec![Vertex::new(0.0, 0.0, 5.0), Vertex::new(1.0, 0.0, 4.0)],
            )],
        )]);
        let res = resolve(&dataset, &config(), "A");
        assert_eq!(res.first.count, 1);
        assert_eq!(res.last.count, 1);
        assert_eq!(res.first.tag, EndpointTag::CandidateMaximum);
        assert_eq!(res.last.tag, EndpointTag::CandidateMaximum);
    }

    #[test]
    fn test_point_feature_resolves_unclassified() {
        let dataset = Dataset::new(vec![Layer::new(
            "drainage",
            vec![Feature::new("P", GeometryZ::Point(Vertex::new(0.0, 0.0, 1.0)))],
        )]);
        let res = resolve(&dataset, &config(), "P");
        assert_eq!(res.first.count, 0);
        assert_eq!(res.first.tag, EndpointTag::None);
        assert!(res.findings.is_empty());
    }
}
