use nalgebra::{Isometry2, Point2, Vector2};
use parry2d::bounding_volume::{Aabb, BoundingVolume};
use parry2d::query;
use parry2d::shape::{ConvexPolygon, Cuboid};
use parry2d::transformation;

/// Two edge vectors count as parallel when their cross product, normalized
/// by their lengths, falls below this.
pub const PARALLEL_EPSILON: f32 = 1.0e-5;

/// Overlap shallower than this does not count as a polygon intersection.
/// Placements snapped vertex-to-vertex against an obstacle, and slides that
/// graze along its edges, must trace clear.
pub const CONTACT_EPSILON: f32 = 1.0e-3;

const DEGENERATE_AREA: f32 = 1.0e-9;

/// A convex polygon with a counter-clockwise vertex ring.
///
/// Vertex indices are stable for the lifetime of the polygon; edge `i` runs
/// from vertex `i` to vertex `i + 1` (wrapping). The centroid, edge vectors
/// and local AABB are precomputed, and a parry `ConvexPolygon` is kept
/// alongside for the narrow-phase intersection tests.
#[derive(Clone, Debug)]
pub struct Polygon {
    verts: Vec<Point2<f32>>,
    edges: Vec<Vector2<f32>>,
    centroid: Point2<f32>,
    aabb: Aabb,
    shape: ConvexPolygon,
}

impl Polygon {
    /// Builds a polygon from a counter-clockwise convex ring of at least
    /// three vertices. Returns `None` for clockwise, collinear or otherwise
    /// degenerate input.
    pub fn new(verts: Vec<Point2<f32>>) -> Option<Self> {
        if verts.len() < 3 {
            return None;
        }
        if signed_area(&verts) <= DEGENERATE_AREA {
            return None;
        }
        let shape = ConvexPolygon::from_convex_polyline(verts.clone())?;
        let n = verts.len();
        let edges = (0..n).map(|i| verts[(i + 1) % n] - verts[i]).collect();
        let centroid = centroid_of(&verts);
        let aabb = Aabb::from_points(&verts);
        Some(Self {
            verts,
            edges,
            centroid,
            aabb,
            shape,
        })
    }

    /// Axis-aligned rectangle of the given dimensions centered on the origin.
    pub fn rectangle(width: f32, height: f32) -> Option<Self> {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Self::new(vec![
            Point2::new(-hw, -hh),
            Point2::new(hw, -hh),
            Point2::new(hw, hh),
            Point2::new(-hw, hh),
        ])
    }

    /// Regular n-gon of the given circumradius centered on the origin, first
    /// vertex on the positive X axis.
    pub fn regular(sides: u32, radius: f32) -> Option<Self> {
        if sides < 3 {
            return None;
        }
        let step = std::f32::consts::TAU / sides as f32;
        let verts = (0..sides)
            .map(|i| {
                let angle = step * i as f32;
                Point2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        Self::new(verts)
    }

    pub fn len(&self) -> usize {
        self.verts.len()
    }

    pub fn vertices(&self) -> &[Point2<f32>] {
        &self.verts
    }

    pub fn vertex(&self, index: usize) -> Point2<f32> {
        self.verts[index]
    }

    /// Edge vector from vertex `index` to the next vertex on the ring.
    pub fn edge(&self, index: usize) -> Vector2<f32> {
        self.edges[index]
    }

    pub fn centroid(&self) -> Point2<f32> {
        self.centroid
    }

    /// Local-space bounding box.
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Bounding box of the polygon placed at `position`.
    pub fn aabb_at(&self, position: Point2<f32>) -> Aabb {
        Aabb::new(
            self.aabb.mins + position.coords,
            self.aabb.maxs + position.coords,
        )
    }

    /// Index of the vertex furthest along `direction`.
    pub fn support_vertex(&self, direction: Vector2<f32>) -> usize {
        let mut best = 0;
        let mut best_dot = f32::NEG_INFINITY;
        for (i, v) in self.verts.iter().enumerate() {
            let dot = v.coords.dot(&direction);
            if dot > best_dot {
                best_dot = dot;
                best = i;
            }
        }
        best
    }

    /// Strict interior test for the polygon placed at `position`; points on
    /// the boundary are outside.
    pub fn contains_point(&self, position: Point2<f32>, point: Point2<f32>) -> bool {
        let local = point - position.coords;
        let n = self.verts.len();
        for i in 0..n {
            let to_point = local - self.verts[i];
            let edge = self.edges[i];
            if edge.x * to_point.y - edge.y * to_point.x <= 0.0 {
                return false;
            }
        }
        true
    }

    /// Narrow-phase test against another polygon, both given by their world
    /// placements. Boundary contact is not an intersection: the polygons
    /// must overlap by more than `CONTACT_EPSILON` on every separating axis.
    pub fn intersects(
        &self,
        position: Point2<f32>,
        other: &Polygon,
        other_position: Point2<f32>,
    ) -> bool {
        let offset = other_position - position;
        for edge in self.edges.iter().chain(other.edges.iter()) {
            let axis = Vector2::new(edge.y, -edge.x);
            let (self_min, self_max) = project(&self.verts, Vector2::zeros(), axis);
            let (other_min, other_max) = project(&other.verts, offset, axis);
            let scale = axis.norm();
            if self_max - other_min <= CONTACT_EPSILON * scale
                || other_max - self_min <= CONTACT_EPSILON * scale
            {
                return false;
            }
        }
        true
    }

    /// Narrow-phase test against a world-space axis-aligned rectangle.
    pub fn intersects_rect(&self, position: Point2<f32>, rect: &Aabb) -> bool {
        let center = rect.center();
        let cuboid = Cuboid::new(rect.half_extents());
        query::intersection_test(
            &Isometry2::translation(position.x, position.y),
            &self.shape,
            &Isometry2::translation(center.x, center.y),
            &cuboid,
        )
        .unwrap_or(false)
    }

    /// True when the rectangle contains the whole polygon placed at
    /// `position`.
    pub fn contained_by_rect(&self, position: Point2<f32>, rect: &Aabb) -> bool {
        rect.contains(&self.aabb_at(position))
    }

    /// The convex region covered when the polygon translates along
    /// `displacement`: the hull of the ring and its translated copy.
    pub fn sweep(&self, displacement: Vector2<f32>) -> Polygon {
        if displacement.norm_squared() == 0.0 {
            return self.clone();
        }
        let mut points = Vec::with_capacity(self.verts.len() * 2);
        points.extend_from_slice(&self.verts);
        points.extend(self.verts.iter().map(|v| *v + displacement));
        let hull = transformation::convex_hull(&points);
        Polygon::new(hull).unwrap_or_else(|| self.clone())
    }
}

/// Scale-independent parallelism test between two edge vectors.
pub fn edges_parallel(a: Vector2<f32>, b: Vector2<f32>) -> bool {
    let cross = a.x * b.y - a.y * b.x;
    cross.abs() <= PARALLEL_EPSILON * a.norm() * b.norm()
}

fn project(verts: &[Point2<f32>], offset: Vector2<f32>, axis: Vector2<f32>) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for v in verts {
        let value = (v.coords + offset).dot(&axis);
        min = min.min(value);
        max = max.max(value);
    }
    (min, max)
}

fn signed_area(verts: &[Point2<f32>]) -> f32 {
    let n = verts.len();
    let mut doubled = 0.0;
    for i in 0..n {
        let p = verts[i];
        let q = verts[(i + 1) % n];
        doubled += p.x * q.y - q.x * p.y;
    }
    doubled * 0.5
}

fn centroid_of(verts: &[Point2<f32>]) -> Point2<f32> {
    let n = verts.len();
    let mut doubled = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p = verts[i];
        let q = verts[(i + 1) % n];
        let cross = p.x * q.y - q.x * p.y;
        doubled += cross;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    if doubled.abs() < DEGENERATE_AREA {
        let sum = verts.iter().fold(Vector2::zeros(), |acc, v| acc + v.coords);
        return Point2::origin() + sum / n as f32;
    }
    Point2::new(cx / (3.0 * doubled), cy / (3.0 * doubled))
}
