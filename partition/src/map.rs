use common::shapes::Polygon;
use nalgebra::Point2;

use crate::collidable::{Collidable, QueryFilter};

/// Query surface shared by the flat and the partitioned map.
///
/// Trace queries test a set of convex shapes, placed at `from`, against the
/// map's collidables; the swept variants extrude `polygon` along `to - from`
/// first. `trace` answers "is the way clear", `trace_exhaust` returns every
/// eligible collidable in the way, each at most once.
pub trait Map {
    /// True when the polygon's AABB placed at `position` fits inside the
    /// world rectangle `[0, width) x [0, height)`.
    fn contains(&self, polygon: &Polygon, position: Point2<f32>) -> bool;

    /// True when no eligible collidable intersects any of `traces` at `from`.
    fn trace_traces(&self, traces: &[Polygon], from: Point2<f32>, filter: QueryFilter<'_>)
        -> bool;

    /// Every eligible collidable intersecting at least one of `traces`.
    fn trace_exhaust_traces<'m>(
        &'m self,
        traces: &[Polygon],
        from: Point2<f32>,
        filter: QueryFilter<'_>,
    ) -> Vec<&'m Collidable>;

    fn trace(
        &self,
        polygon: &Polygon,
        from: Point2<f32>,
        to: Point2<f32>,
        filter: QueryFilter<'_>,
    ) -> bool {
        let traces = [polygon.sweep(to - from)];
        self.trace_traces(&traces, from, filter)
    }

    fn trace_exhaust<'m>(
        &'m self,
        polygon: &Polygon,
        from: Point2<f32>,
        to: Point2<f32>,
        filter: QueryFilter<'_>,
    ) -> Vec<&'m Collidable> {
        let traces = [polygon.sweep(to - from)];
        self.trace_exhaust_traces(&traces, from, filter)
    }
}

pub(crate) fn fits_world(
    polygon: &Polygon,
    position: Point2<f32>,
    width: f32,
    height: f32,
) -> bool {
    let aabb = polygon.aabb();
    position.x >= 0.0
        && position.y >= 0.0
        && position.x + aabb.maxs.x < width
        && position.y + aabb.maxs.y < height
}

pub(crate) fn hits_any(collidable: &Collidable, traces: &[Polygon], from: Point2<f32>) -> bool {
    traces
        .iter()
        .any(|trace| trace.intersects(from, &collidable.bounds, collidable.position))
}
