use fxhash::FxHashSet;
use nalgebra::Point2;
use parry2d::bounding_volume::Aabb;

use super::query::LeafSet;
use super::{Leaf, PartitionedMap, Side, LEFT_IS_LEAF, LEFT_OF_PARENT, NO_INDEX, RIGHT_IS_LEAF};

impl PartitionedMap {
    /// Collapses subtrees that emptied out around the given leaves.
    ///
    /// For each leaf whose count dropped, climb from its parent as long as
    /// the accumulated subtree still fits under `trigger_destroy_entities`,
    /// then merge the highest such subtree into a single fresh leaf. The
    /// root partition itself is never removed; when the whole tree fits,
    /// each of its sides collapses to a leaf instead.
    pub(crate) fn consider_prune(&mut self, changed: LeafSet) {
        if self.partitions.is_empty() {
            return;
        }
        let trigger = self.config.trigger_destroy_entities;
        let mut targets: Vec<(u32, Side)> = Vec::new();
        for &leaf_idx in &changed {
            let parent = self.leaves[leaf_idx as usize].parent;
            if parent == NO_INDEX {
                continue;
            }
            let mut part = parent;
            let mut total =
                self.count_side(part, Side::Left) + self.count_side(part, Side::Right);
            if total > trigger {
                continue;
            }
            loop {
                let up = self.partitions[part as usize].parent;
                if up == NO_INDEX {
                    break;
                }
                let other = self.count_side(up, self.side_of(part).opposite());
                if total + other > trigger {
                    break;
                }
                total += other;
                part = up;
            }
            if self.partitions[part as usize].parent == NO_INDEX {
                targets.push((part, Side::Left));
                targets.push((part, Side::Right));
            } else {
                let up = self.partitions[part as usize].parent;
                targets.push((up, self.side_of(part)));
            }
        }
        targets.sort_unstable();
        targets.dedup();
        while let Some((part, side)) = targets.pop() {
            if self.partitions[part as usize].child_is_leaf(side) {
                continue;
            }
            self.merge_side(part, side, &mut targets);
        }
    }

    /// Which side of its parent this partition hangs on.
    pub(crate) fn side_of(&self, part: u32) -> Side {
        if self.partitions[part as usize].flags & LEFT_OF_PARENT != 0 {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Sum of leaf counts across one side's subtree. Collidables straddling
    /// interior split lines are counted once per leaf listing them.
    pub(crate) fn count_side(&self, part: u32, side: Side) -> usize {
        let node = &self.partitions[part as usize];
        if node.child_is_leaf(side) {
            return self.leaves[node.child(side) as usize].slots.len();
        }
        let mut count = 0;
        let mut stack = vec![node.child(side)];
        while let Some(p) = stack.pop() {
            let node = &self.partitions[p as usize];
            for s in [Side::Left, Side::Right] {
                if node.child_is_leaf(s) {
                    count += self.leaves[node.child(s) as usize].slots.len();
                } else {
                    stack.push(node.child(s));
                }
            }
        }
        count
    }

    /// World rectangle covered by one side of a partition, derived from the
    /// split geometry alone, independent of whatever tree currently hangs
    /// under that side.
    pub(crate) fn find_side_rect(&self, part: u32, side: Side) -> Aabb {
        let mut chain = vec![(part, side)];
        let mut cur = part;
        loop {
            let up = self.partitions[cur as usize].parent;
            if up == NO_INDEX {
                break;
            }
            chain.push((up, self.side_of(cur)));
            cur = up;
        }
        let mut mins = Point2::new(0.0, 0.0);
        let mut maxs = Point2::new(self.width, self.height);
        for &(p, s) in chain.iter().rev() {
            let node = &self.partitions[p as usize];
            if node.is_horizontal() {
                match s {
                    Side::Left => maxs.y = node.split,
                    Side::Right => mins.y = node.split,
                }
            } else {
                match s {
                    Side::Left => maxs.x = node.split,
                    Side::Right => mins.x = node.split,
                }
            }
        }
        Aabb::new(mins, maxs)
    }

    /// Replaces the whole subtree under `(part, side)` with one leaf
    /// spanning its rectangle, holding the distinct collidables of every
    /// descendant leaf. Compacting the arenas shifts indices; survivors and
    /// the caller's pending target list are remapped through rolling shift
    /// tables.
    fn merge_side(&mut self, part: u32, side: Side, pending: &mut Vec<(u32, Side)>) {
        let first = self.partitions[part as usize].child(side);
        let mut dead_parts = vec![first];
        let mut dead_leaves = Vec::new();
        let mut stack = vec![first];
        while let Some(p) = stack.pop() {
            let node = self.partitions[p as usize];
            for s in [Side::Left, Side::Right] {
                let child = node.child(s);
                if node.child_is_leaf(s) {
                    dead_leaves.push(child);
                } else {
                    dead_parts.push(child);
                    stack.push(child);
                }
            }
        }

        let mut seen: FxHashSet<u32> = FxHashSet::default();
        let mut slots = Vec::new();
        for &leaf in &dead_leaves {
            for &slot in &self.leaves[leaf as usize].slots {
                if seen.insert(slot) {
                    slots.push(slot);
                }
            }
        }
        let rect = self.find_side_rect(part, side);

        dead_parts.sort_unstable();
        dead_leaves.sort_unstable();
        let part_shift = build_shift(self.partitions.len(), &dead_parts);
        let leaf_shift = build_shift(self.leaves.len(), &dead_leaves);
        remove_indices(&mut self.partitions, &dead_parts);
        remove_indices(&mut self.leaves, &dead_leaves);

        for node in &mut self.partitions {
            if node.flags & LEFT_IS_LEAF != 0 {
                node.left -= leaf_shift[node.left as usize];
            } else if dead_parts.binary_search(&node.left).is_err() {
                node.left -= part_shift[node.left as usize];
            }
            if node.flags & RIGHT_IS_LEAF != 0 {
                node.right -= leaf_shift[node.right as usize];
            } else if dead_parts.binary_search(&node.right).is_err() {
                node.right -= part_shift[node.right as usize];
            }
            if node.parent != NO_INDEX {
                node.parent -= part_shift[node.parent as usize];
            }
        }
        for leaf in &mut self.leaves {
            if leaf.parent != NO_INDEX {
                leaf.parent -= part_shift[leaf.parent as usize];
            }
        }
        self.root -= part_shift[self.root as usize];

        let new_part = part - part_shift[part as usize];
        let new_leaf = self.leaves.len() as u32;
        let leaf_flags = match side {
            Side::Left => LEFT_OF_PARENT,
            Side::Right => 0,
        };
        self.leaves.push(Leaf {
            flags: leaf_flags,
            parent: new_part,
            rect,
            slots,
        });
        let node = &mut self.partitions[new_part as usize];
        match side {
            Side::Left => {
                node.left = new_leaf;
                node.flags |= LEFT_IS_LEAF;
            }
            Side::Right => {
                node.right = new_leaf;
                node.flags |= RIGHT_IS_LEAF;
            }
        }

        pending.retain_mut(|(p, _)| {
            if dead_parts.binary_search(p).is_ok() {
                return false;
            }
            *p -= part_shift[*p as usize];
            true
        });
    }
}

/// `shift[i]` = number of removed indices at or below `i`; a surviving index
/// `i` lands at `i - shift[i]` after compaction.
fn build_shift(len: usize, dead: &[u32]) -> Vec<u32> {
    let mut shift = vec![0u32; len];
    let mut removed = 0u32;
    let mut next = 0usize;
    for (i, slot) in shift.iter_mut().enumerate() {
        if next < dead.len() && dead[next] == i as u32 {
            removed += 1;
            next += 1;
        }
        *slot = removed;
    }
    shift
}

/// Left-shifts live entries over the holes left by `dead` (sorted).
fn remove_indices<T>(items: &mut Vec<T>, dead: &[u32]) {
    let mut next = 0usize;
    let mut index = 0u32;
    items.retain(|_| {
        let is_dead = next < dead.len() && dead[next] == index;
        if is_dead {
            next += 1;
        }
        index += 1;
        !is_dead
    });
}
