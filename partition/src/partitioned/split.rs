use nalgebra::Point2;
use parry2d::bounding_volume::{Aabb, BoundingVolume};

use super::{
    Leaf, Partition, PartitionedMap, IS_ROOT, LEFT_IS_LEAF, LEFT_OF_PARENT, NO_INDEX,
    RIGHT_IS_LEAF, SPLIT_HORIZONTAL,
};

// Calibrated so the linear term dominates the derivative between
// consecutive projected points.
const PUNISH_QUAD: f32 = 16.0;
const PUNISH_LINEAR: f32 = 25.0;
const PUNISH_OFFSET: f32 = 0.7;

const NEWTON_MAX_STEPS: usize = 10;
const NEWTON_EPSILON: f32 = 1.0e-6;

struct AxisCandidate {
    punishment: f32,
    world: f32,
}

impl PartitionedMap {
    /// Splits the leaf along the axis and coordinate with the lowest
    /// entity-repulsion punishment, once it holds more than
    /// `trigger_create_entities` collidables. At most one split per call;
    /// a leaf that cannot host a balanced line is left alone.
    pub(crate) fn consider_split(&mut self, leaf_idx: u32) {
        if self.leaves[leaf_idx as usize].slots.len() <= self.config.trigger_create_entities {
            return;
        }
        let horizontal = self.best_split_on_axis(leaf_idx, true);
        let vertical = self.best_split_on_axis(leaf_idx, false);
        let (is_horizontal, candidate) = match (horizontal, vertical) {
            (Some(h), Some(v)) => {
                if h.punishment <= v.punishment {
                    (true, h)
                } else {
                    (false, v)
                }
            }
            (Some(h), None) => (true, h),
            (None, Some(v)) => (false, v),
            (None, None) => return,
        };
        let rect = self.leaves[leaf_idx as usize].rect;
        let (lo, hi) = if is_horizontal {
            (rect.mins.y, rect.maxs.y)
        } else {
            (rect.mins.x, rect.maxs.x)
        };
        if !(candidate.world > lo && candidate.world < hi) {
            return;
        }
        self.split_leaf(leaf_idx, is_horizontal, candidate.world);
    }

    /// Best dividing coordinate on one axis, as `(punishment, world)`.
    ///
    /// Entity centers are projected to `[0, 1]` on the scale of the leaf's
    /// longer side; the shorter side's band is centered by
    /// `(1 - min/max) / 2`, so a line across the thin dimension scores
    /// against points packed closer together and tends to lose.
    fn best_split_on_axis(&self, leaf_idx: u32, horizontal: bool) -> Option<AxisCandidate> {
        let leaf = &self.leaves[leaf_idx as usize];
        let rect = leaf.rect;
        let width = rect.maxs.x - rect.mins.x;
        let height = rect.maxs.y - rect.mins.y;
        let scale = width.max(height);
        if !(scale > 0.0) {
            return None;
        }
        let (axis_min, axis_extent) = if horizontal {
            (rect.mins.y, height)
        } else {
            (rect.mins.x, width)
        };
        let offset = 0.5 * (1.0 - axis_extent / scale);
        let mut points = Vec::with_capacity(leaf.slots.len());
        for &slot in &leaf.slots {
            let Some(c) = self.entities[slot as usize].as_ref() else {
                continue;
            };
            let center = c.position + c.bounds.centroid().coords;
            let value = if horizontal { center.y } else { center.x };
            points.push((value - axis_min) / scale + offset);
        }
        points.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        // Keep at least min_partition_entities on each side of any line and
        // never seed between more than 2 * max_partition_entities points.
        let n = points.len();
        let min_e = self.config.min_partition_entities;
        let max_e = self.config.max_partition_entities;
        let viable = n.saturating_sub(2 * min_e).min(2 * max_e);
        if viable == 0 {
            return None;
        }
        let edges = ((n - viable) / 2).max(min_e);
        if n < 2 * edges + 2 {
            return None;
        }
        let band = &points[edges..n - edges];
        let mut best: Option<AxisCandidate> = None;
        for pair in band.windows(2) {
            let (punishment, x) = newton_minimum(&points, pair[0], pair[1]);
            if best.as_ref().map_or(true, |b| punishment < b.punishment) {
                best = Some(AxisCandidate {
                    punishment,
                    world: axis_min + (x - offset) * scale,
                });
            }
        }
        best
    }

    fn split_leaf(&mut self, leaf_idx: u32, horizontal: bool, split: f32) {
        let (rect, old_parent, old_flags) = {
            let leaf = &self.leaves[leaf_idx as usize];
            (leaf.rect, leaf.parent, leaf.flags)
        };
        let (near, far) = if horizontal {
            (
                Aabb::new(rect.mins, Point2::new(rect.maxs.x, split)),
                Aabb::new(Point2::new(rect.mins.x, split), rect.maxs),
            )
        } else {
            (
                Aabb::new(rect.mins, Point2::new(split, rect.maxs.y)),
                Aabb::new(Point2::new(split, rect.mins.y), rect.maxs),
            )
        };

        let part_idx = self.partitions.len() as u32;
        let far_idx = self.leaves.len() as u32;
        let mut flags = LEFT_IS_LEAF | RIGHT_IS_LEAF;
        if horizontal {
            flags |= SPLIT_HORIZONTAL;
        }
        if old_parent == NO_INDEX {
            flags |= IS_ROOT;
        } else if old_flags & LEFT_OF_PARENT != 0 {
            flags |= LEFT_OF_PARENT;
        }
        self.partitions.push(Partition {
            flags,
            split,
            left: leaf_idx,
            right: far_idx,
            parent: old_parent,
        });
        if old_parent == NO_INDEX {
            self.root = part_idx;
        } else {
            let parent = &mut self.partitions[old_parent as usize];
            if old_flags & LEFT_OF_PARENT != 0 {
                parent.left = part_idx;
                parent.flags &= !LEFT_IS_LEAF;
            } else {
                parent.right = part_idx;
                parent.flags &= !RIGHT_IS_LEAF;
            }
        }
        self.leaves.push(Leaf {
            flags: 0,
            parent: part_idx,
            rect: far,
            slots: Vec::new(),
        });
        {
            let leaf = &mut self.leaves[leaf_idx as usize];
            leaf.rect = near;
            leaf.parent = part_idx;
            leaf.flags = LEFT_OF_PARENT;
        }

        let slots = std::mem::take(&mut self.leaves[leaf_idx as usize].slots);
        for slot in slots {
            let aabb = match self.entities[slot as usize].as_ref() {
                Some(c) => c.world_aabb(),
                None => continue,
            };
            if near.intersects(&aabb) {
                self.leaves[leaf_idx as usize].slots.push(slot);
            }
            if far.intersects(&aabb) {
                self.leaves[far_idx as usize].slots.push(slot);
            }
        }
    }
}

/// Newton iteration on the punishment from the midpoint of a bracket of two
/// adjacent projected points; returns the lowest value seen and where.
fn newton_minimum(points: &[f32], lo: f32, hi: f32) -> (f32, f32) {
    let mut x = 0.5 * (lo + hi);
    let mut best_x = x;
    let mut best_p = punishment(points, x);
    for _ in 0..NEWTON_MAX_STEPS {
        let d1 = punishment_d1(points, x);
        if d1.abs() < NEWTON_EPSILON {
            break;
        }
        let d2 = punishment_d2(points, x);
        if d2.abs() < NEWTON_EPSILON {
            break;
        }
        let next = x - d1 / d2;
        if !next.is_finite() || next < lo || next > hi {
            break;
        }
        x = next;
        let p = punishment(points, x);
        if p < best_p {
            best_p = p;
            best_x = x;
        }
    }
    (best_p, best_x)
}

/// `P(x) = sum 1 / (a d^2 + b |d| + c)` over `d = z_i - x`. Large where the
/// candidate line crowds entities; minima sit in the gaps between clusters.
fn punishment(points: &[f32], x: f32) -> f32 {
    points
        .iter()
        .map(|&z| {
            let d = (z - x).abs();
            1.0 / (PUNISH_QUAD * d * d + PUNISH_LINEAR * d + PUNISH_OFFSET)
        })
        .sum()
}

fn punishment_d1(points: &[f32], x: f32) -> f32 {
    let mut sum = 0.0;
    for &z in points {
        let d = z - x;
        let s = signum_or_zero(d);
        let ad = d.abs();
        let g = PUNISH_QUAD * ad * ad + PUNISH_LINEAR * ad + PUNISH_OFFSET;
        sum += (2.0 * PUNISH_QUAD * d + PUNISH_LINEAR * s) / (g * g);
    }
    sum
}

fn punishment_d2(points: &[f32], x: f32) -> f32 {
    let mut sum = 0.0;
    for &z in points {
        let d = z - x;
        let s = signum_or_zero(d);
        let ad = d.abs();
        let g = PUNISH_QUAD * ad * ad + PUNISH_LINEAR * ad + PUNISH_OFFSET;
        let gp = 2.0 * PUNISH_QUAD * d + PUNISH_LINEAR * s;
        sum += (2.0 * gp * gp / g - 2.0 * PUNISH_QUAD) / (g * g);
    }
    sum
}

fn signum_or_zero(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
