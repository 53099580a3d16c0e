use common::shapes::Polygon;
use fxhash::FxHashSet;
use nalgebra::Point2;
use parry2d::bounding_volume::{Aabb, BoundingVolume};
use smallvec::SmallVec;

use super::{PartitionedMap, Side};
use crate::collidable::{Collidable, QueryFilter};
use crate::map::{self, Map};

pub(crate) type LeafSet = SmallVec<[u32; 8]>;

impl PartitionedMap {
    /// Leaf whose rectangle holds `position`. Points exactly on a split
    /// line resolve to the left (or top) side.
    pub(crate) fn find_map(&self, position: Point2<f32>) -> u32 {
        if self.partitions.is_empty() {
            return 0;
        }
        let mut part = self.root;
        loop {
            let node = &self.partitions[part as usize];
            let value = if node.is_horizontal() {
                position.y
            } else {
                position.x
            };
            let side = if value <= node.split {
                Side::Left
            } else {
                Side::Right
            };
            let child = node.child(side);
            if node.child_is_leaf(side) {
                return child;
            }
            part = child;
        }
    }

    /// Every leaf whose rectangle intersects `aabb`. This is the membership
    /// predicate: register, unregister and relocate all use it to decide
    /// which leaves list a collidable.
    pub(crate) fn leaves_for_aabb(&self, aabb: &Aabb) -> LeafSet {
        let mut out = LeafSet::new();
        for (i, leaf) in self.leaves.iter().enumerate() {
            if leaf.rect.intersects(aabb) {
                out.push(i as u32);
            }
        }
        out
    }

    /// Leaves a single query polygon overlaps. Stops early once a leaf
    /// contains the polygon outright.
    pub(crate) fn leaves_for_polygon(&self, polygon: &Polygon, position: Point2<f32>) -> LeafSet {
        let mut out = LeafSet::new();
        for (i, leaf) in self.leaves.iter().enumerate() {
            if polygon.contained_by_rect(position, &leaf.rect) {
                out.push(i as u32);
                break;
            }
            if polygon.intersects_rect(position, &leaf.rect) {
                out.push(i as u32);
            }
        }
        out
    }

    /// Leaves any of the trace shapes overlap. Once one leaf fully contains
    /// all traces, later leaves that also fully contain them are skipped.
    pub(crate) fn leaves_for_traces(&self, traces: &[Polygon], from: Point2<f32>) -> LeafSet {
        let mut out = LeafSet::new();
        let mut contained_seen = false;
        for (i, leaf) in self.leaves.iter().enumerate() {
            if traces.iter().all(|t| t.contained_by_rect(from, &leaf.rect)) {
                if !contained_seen {
                    contained_seen = true;
                    out.push(i as u32);
                }
                continue;
            }
            if traces.iter().any(|t| t.intersects_rect(from, &leaf.rect)) {
                out.push(i as u32);
            }
        }
        out
    }

    fn relevant_leaves(&self, traces: &[Polygon], from: Point2<f32>) -> LeafSet {
        match traces {
            [single] => self.leaves_for_polygon(single, from),
            _ => self.leaves_for_traces(traces, from),
        }
    }

    /// First collidable of the leaf under `position` whose bounds strictly
    /// contain it; a position on a split line is looked up in the left leaf.
    pub fn get_intersecting(&self, position: Point2<f32>) -> Option<u32> {
        let leaf = self.find_map(position);
        for &slot in &self.leaves[leaf as usize].slots {
            let Some(c) = self.entities[slot as usize].as_ref() else {
                continue;
            };
            if c.bounds.contains_point(c.position, position) {
                return Some(c.id);
            }
        }
        None
    }
}

impl Map for PartitionedMap {
    fn contains(&self, polygon: &Polygon, position: Point2<f32>) -> bool {
        map::fits_world(polygon, position, self.width(), self.height())
    }

    fn trace_traces(
        &self,
        traces: &[Polygon],
        from: Point2<f32>,
        filter: QueryFilter<'_>,
    ) -> bool {
        for &leaf in &self.relevant_leaves(traces, from) {
            for &slot in &self.leaves[leaf as usize].slots {
                let Some(c) = self.entities[slot as usize].as_ref() else {
                    continue;
                };
                if filter.allows(c) && map::hits_any(c, traces, from) {
                    return false;
                }
            }
        }
        true
    }

    fn trace_exhaust_traces<'m>(
        &'m self,
        traces: &[Polygon],
        from: Point2<f32>,
        filter: QueryFilter<'_>,
    ) -> Vec<&'m Collidable> {
        let relevant = self.relevant_leaves(traces, from);
        let mut out = Vec::new();
        if relevant.len() <= 1 {
            for &leaf in &relevant {
                for &slot in &self.leaves[leaf as usize].slots {
                    let Some(c) = self.entities[slot as usize].as_ref() else {
                        continue;
                    };
                    if filter.allows(c) && map::hits_any(c, traces, from) {
                        out.push(c);
                    }
                }
            }
            return out;
        }
        // Collidables straddling split lines show up in several leaves;
        // dedupe by id without touching the caller's exclusion set.
        let mut seen: FxHashSet<u32> = FxHashSet::default();
        for &leaf in &relevant {
            for &slot in &self.leaves[leaf as usize].slots {
                let Some(c) = self.entities[slot as usize].as_ref() else {
                    continue;
                };
                if !filter.allows(c) || seen.contains(&c.id) {
                    continue;
                }
                if map::hits_any(c, traces, from) {
                    seen.insert(c.id);
                    out.push(c);
                }
            }
        }
        out
    }
}
