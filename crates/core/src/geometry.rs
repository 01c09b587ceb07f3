//! 3D vector geometry
//!
//! `geo-types` is strictly 2D, while every check in this crate family
//! compares elevations, so geometries carry their own vertex type with a
//! `z` ordinate. Planar predicates (intersects, clipping, bounding
//! rects) are delegated to the `geo` crate on a 2D projection of the
//! geometry; elevation is re-attached by interpolating along the source
//! segments.

use geo::{BooleanOps, Intersects};
use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, Point, Polygon,
    Rect,
};
use serde::{Deserialize, Serialize};

/// A single 3D vertex; `z` is the elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vertex {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }
}

impl From<[f64; 3]> for Vertex {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Vertex> for [f64; 3] {
    fn from(v: Vertex) -> Self {
        [v.x, v.y, v.z]
    }
}

/// 3D geometry with a discriminated type tag.
///
/// Lines and polygons are stored as vertex sequences; polygon rings are
/// listed exterior first. The enum mirrors the geometry kinds the
/// validators have to distinguish when classifying intersections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryZ {
    Point(Vertex),
    MultiPoint(Vec<Vertex>),
    Line(Vec<Vertex>),
    MultiLine(Vec<Vec<Vertex>>),
    Polygon(Vec<Vec<Vertex>>),
    Collection(Vec<GeometryZ>),
}

impl GeometryZ {
    /// Human-readable tag, used in diagnostic findings.
    pub fn type_name(&self) -> &'static str {
        match self {
            GeometryZ::Point(_) => "point",
            GeometryZ::MultiPoint(_) => "multipoint",
            GeometryZ::Line(_) => "line",
            GeometryZ::MultiLine(_) => "multiline",
            GeometryZ::Polygon(_) => "polygon",
            GeometryZ::Collection(_) => "collection",
        }
    }

    /// Ordered pass over every vertex. Each call restarts from the
    /// first vertex.
    pub fn vertices(&self) -> Box<dyn Iterator<Item = &Vertex> + '_> {
        match self {
            GeometryZ::Point(v) => Box::new(std::iter::once(v)),
            GeometryZ::MultiPoint(vs) | GeometryZ::Line(vs) => Box::new(vs.iter()),
            GeometryZ::MultiLine(parts) | GeometryZ::Polygon(parts) => {
                Box::new(parts.iter().flatten())
            }
            GeometryZ::Collection(gs) => Box::new(gs.iter().flat_map(|g| g.vertices())),
        }
    }

    /// First and last vertex of a line geometry.
    ///
    /// `None` for non-line geometries and for degenerate lines with
    /// fewer than two vertices.
    pub fn endpoints(&self) -> Option<(Vertex, Vertex)> {
        match self {
            GeometryZ::Line(vs) if vs.len() >= 2 => Some((vs[0], vs[vs.len() - 1])),
            GeometryZ::MultiLine(parts) => {
                let first = parts.first()?.first()?;
                let last = parts.last()?.last()?;
                if parts.iter().map(|p| p.len()).sum::<usize>() >= 2 {
                    Some((*first, *last))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Axis-aligned bounding box, degenerate for points.
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        let mut vertices = self.vertices();
        let first = vertices.next()?;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.x, first.y);
        for v in vertices {
            min_x = min_x.min(v.x);
            min_y = min_y.min(v.y);
            max_x = max_x.max(v.x);
            max_y = max_y.max(v.y);
        }
        Some(Rect::new(
            Coord { x: min_x, y: min_y },
            Coord { x: max_x, y: max_y },
        ))
    }

    /// 2D projection for planar predicates.
    pub fn to_geo(&self) -> Geometry<f64> {
        match self {
            GeometryZ::Point(v) => Geometry::Point(Point::from(v.coord())),
            GeometryZ::MultiPoint(vs) => Geometry::MultiPoint(MultiPoint(
                vs.iter().map(|v| Point::from(v.coord())).collect(),
            )),
            GeometryZ::Line(vs) => Geometry::LineString(line_string(vs)),
            GeometryZ::MultiLine(parts) => Geometry::MultiLineString(MultiLineString(
                parts.iter().map(|p| line_string(p)).collect(),
            )),
            GeometryZ::Polygon(rings) => Geometry::Polygon(polygon(rings)),
            GeometryZ::Collection(gs) => Geometry::GeometryCollection(GeometryCollection(
                gs.iter().map(|g| g.to_geo()).collect(),
            )),
        }
    }

    /// Elevation at the point of the geometry closest to `(x, y)`.
    ///
    /// Along segments the elevation is interpolated linearly. `None`
    /// only for empty geometries.
    pub fn elevation_at(&self, x: f64, y: f64) -> Option<f64> {
        let mut best: Option<(f64, f64)> = None;
        self.closest_z(x, y, &mut best);
        best.map(|(_, z)| z)
    }

    fn closest_z(&self, x: f64, y: f64, best: &mut Option<(f64, f64)>) {
        match self {
            GeometryZ::Point(v) => {
                let (dx, dy) = (v.x - x, v.y - y);
                offer(best, dx * dx + dy * dy, v.z);
            }
            GeometryZ::MultiPoint(vs) => {
                for v in vs {
                    let (dx, dy) = (v.x - x, v.y - y);
                    offer(best, dx * dx + dy * dy, v.z);
                }
            }
            GeometryZ::Line(vs) => {
                offer_segments(vs, x, y, best);
            }
            GeometryZ::MultiLine(parts) | GeometryZ::Polygon(parts) => {
                for part in parts {
                    offer_segments(part, x, y, best);
                }
            }
            GeometryZ::Collection(gs) => {
                for g in gs {
                    g.closest_z(x, y, best);
                }
            }
        }
    }
}

fn offer(best: &mut Option<(f64, f64)>, dist_sq: f64, z: f64) {
    if best.map_or(true, |(d, _)| dist_sq < d) {
        *best = Some((dist_sq, z));
    }
}

fn line_string(vs: &[Vertex]) -> LineString<f64> {
    LineString(vs.iter().map(|v| v.coord()).collect())
}

fn polygon(rings: &[Vec<Vertex>]) -> Polygon<f64> {
    let exterior = rings
        .first()
        .map(|r| line_string(r))
        .unwrap_or_else(|| LineString(Vec::new()));
    let interiors = rings.iter().skip(1).map(|r| line_string(r)).collect();
    Polygon::new(exterior, interiors)
}

fn offer_segments(vs: &[Vertex], x: f64, y: f64, best: &mut Option<(f64, f64)>) {
    if vs.len() == 1 {
        let (dx, dy) = (vs[0].x - x, vs[0].y - y);
        offer(best, dx * dx + dy * dy, vs[0].z);
        return;
    }
    for pair in vs.windows(2) {
        let (dist_sq, z) = closest_on_segment(&pair[0], &pair[1], x, y);
        offer(best, dist_sq, z);
    }
}

/// Squared distance to and interpolated elevation at the closest point
/// of segment `a`-`b`.
fn closest_on_segment(a: &Vertex, b: &Vertex, x: f64, y: f64) -> (f64, f64) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((x - a.x) * dx + (y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let px = a.x + t * dx;
    let py = a.y + t * dy;
    let (ex, ey) = (px - x, py - y);
    (ex * ex + ey * ey, a.z + t * (b.z - a.z))
}

/// Exact planar intersection test.
pub fn intersects(a: &GeometryZ, b: &GeometryZ) -> bool {
    a.to_geo().intersects(&b.to_geo())
}

/// Planar intersection of `a` and `b` with elevations re-attached from
/// `b`. Returns `None` when the geometries do not intersect.
///
/// Only the combinations the validators consume are computed precisely:
/// point against anything, and polygon against point, multipoint, line
/// and multiline. Any other pairing falls back to returning `b` itself
/// so callers still see a type tag to report.
pub fn intersection(a: &GeometryZ, b: &GeometryZ) -> Option<GeometryZ> {
    if !intersects(a, b) {
        return None;
    }
    match (a, b) {
        (GeometryZ::Point(p), _) => {
            let z = b.elevation_at(p.x, p.y).unwrap_or(p.z);
            Some(GeometryZ::Point(Vertex::new(p.x, p.y, z)))
        }
        (_, GeometryZ::Point(p)) => Some(GeometryZ::Point(*p)),
        (GeometryZ::Polygon(rings), GeometryZ::Line(vs)) => {
            Some(clip_lines(rings, std::slice::from_ref(vs), b))
        }
        (GeometryZ::Polygon(rings), GeometryZ::MultiLine(parts)) => {
            Some(clip_lines(rings, parts, b))
        }
        (GeometryZ::Polygon(_), GeometryZ::MultiPoint(vs)) => {
            let poly = a.to_geo();
            let inside: Vec<Vertex> = vs
                .iter()
                .filter(|v| poly.intersects(&Point::from(v.coord())))
                .copied()
                .collect();
            Some(GeometryZ::MultiPoint(inside))
        }
        _ => Some(b.clone()),
    }
}

/// Clip line parts with a polygon and restore elevations from the
/// source line.
fn clip_lines(rings: &[Vec<Vertex>], parts: &[Vec<Vertex>], source: &GeometryZ) -> GeometryZ {
    let poly = polygon(rings);
    let mls = MultiLineString(parts.iter().map(|p| line_string(p)).collect());
    let clipped = poly.clip(&mls, false);
    let with_z: Vec<Vec<Vertex>> = clipped
        .0
        .iter()
        .map(|ls| {
            ls.0.iter()
                .map(|c| {
                    let z = source.elevation_at(c.x, c.y).unwrap_or(f64::NAN);
                    Vertex::new(c.x, c.y, z)
                })
                .collect()
        })
        .collect();
    GeometryZ::MultiLine(with_z)
}
