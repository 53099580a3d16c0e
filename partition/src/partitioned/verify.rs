use super::{PartitionedMap, Side, IS_ROOT, LEFT_OF_PARENT, NO_INDEX};
use crate::error::{MapError, MapResult};

const AREA_TOLERANCE: f32 = 1.0e-3;

impl PartitionedMap {
    /// Re-checks the partition invariants: tree and flag coherence, exact
    /// tiling of the world rectangle, and leaf membership matching each
    /// collidable's footprint. Intended for tests and debugging; runs in
    /// time quadratic in the number of leaves.
    pub fn verify(&self) -> MapResult<()> {
        self.verify_tree()?;
        self.verify_tiling()?;
        self.verify_membership()?;
        self.verify_arenas()?;
        Ok(())
    }

    fn verify_tree(&self) -> MapResult<()> {
        if self.partitions.is_empty() {
            if self.leaves.len() != 1 {
                return corrupt(format!(
                    "no partitions but {} leaves",
                    self.leaves.len()
                ));
            }
            if self.leaves[0].parent != NO_INDEX {
                return corrupt("sole leaf has a parent".to_string());
            }
            return Ok(());
        }
        if self.root as usize >= self.partitions.len() {
            return corrupt(format!("root index {} out of range", self.root));
        }
        let leaf_children: usize = self
            .partitions
            .iter()
            .map(|node| {
                [Side::Left, Side::Right]
                    .into_iter()
                    .filter(|&s| node.child_is_leaf(s))
                    .count()
            })
            .sum();
        if leaf_children != self.leaves.len() {
            return corrupt(format!(
                "{} leaves but {} leaf child slots",
                self.leaves.len(),
                leaf_children
            ));
        }
        for (i, node) in self.partitions.iter().enumerate() {
            let is_root = node.flags & IS_ROOT != 0;
            if is_root != (i as u32 == self.root) {
                return corrupt(format!("partition {} root flag mismatch", i));
            }
            if is_root != (node.parent == NO_INDEX) {
                return corrupt(format!("partition {} parent/root mismatch", i));
            }
            for side in [Side::Left, Side::Right] {
                let child = node.child(side);
                if node.child_is_leaf(side) {
                    let Some(leaf) = self.leaves.get(child as usize) else {
                        return corrupt(format!("partition {} leaf child {} missing", i, child));
                    };
                    if leaf.parent != i as u32 {
                        return corrupt(format!(
                            "leaf {} parent is {} not {}",
                            child, leaf.parent, i
                        ));
                    }
                    let flagged_left = leaf.flags & LEFT_OF_PARENT != 0;
                    if flagged_left != (side == Side::Left) {
                        return corrupt(format!("leaf {} side flag mismatch", child));
                    }
                } else {
                    let Some(sub) = self.partitions.get(child as usize) else {
                        return corrupt(format!(
                            "partition {} child partition {} missing",
                            i, child
                        ));
                    };
                    if sub.parent != i as u32 {
                        return corrupt(format!(
                            "partition {} parent is {} not {}",
                            child, sub.parent, i
                        ));
                    }
                    let flagged_left = sub.flags & LEFT_OF_PARENT != 0;
                    if flagged_left != (side == Side::Left) {
                        return corrupt(format!("partition {} side flag mismatch", child));
                    }
                }
            }
        }
        Ok(())
    }

    fn verify_tiling(&self) -> MapResult<()> {
        let world_area = self.width * self.height;
        let mut area = 0.0;
        for leaf in &self.leaves {
            area += (leaf.rect.maxs.x - leaf.rect.mins.x) * (leaf.rect.maxs.y - leaf.rect.mins.y);
        }
        if (area - world_area).abs() > world_area * 1.0e-4 {
            return corrupt(format!(
                "leaf area {} does not tile world area {}",
                area, world_area
            ));
        }
        for (i, a) in self.leaves.iter().enumerate() {
            for (j, b) in self.leaves.iter().enumerate().skip(i + 1) {
                let w = a.rect.maxs.x.min(b.rect.maxs.x) - a.rect.mins.x.max(b.rect.mins.x);
                let h = a.rect.maxs.y.min(b.rect.maxs.y) - a.rect.mins.y.max(b.rect.mins.y);
                if w > 0.0 && h > 0.0 && w * h > AREA_TOLERANCE {
                    return corrupt(format!("leaves {} and {} overlap", i, j));
                }
            }
        }
        Ok(())
    }

    fn verify_membership(&self) -> MapResult<()> {
        for (&id, &slot) in &self.id_map {
            let Some(c) = self.entities.get(slot as usize).and_then(|s| s.as_ref()) else {
                return corrupt(format!("id {} maps to empty slot {}", id, slot));
            };
            if c.id != id {
                return corrupt(format!("slot {} holds id {} not {}", slot, c.id, id));
            }
            let aabb = c.world_aabb();
            let expected = self.leaves_for_aabb(&aabb);
            for (i, leaf) in self.leaves.iter().enumerate() {
                let listed = leaf.slots.contains(&slot);
                let should = expected.contains(&(i as u32));
                if listed != should {
                    return corrupt(format!(
                        "collidable {} listed={} expected={} in leaf {}",
                        id, listed, should, i
                    ));
                }
            }
        }
        Ok(())
    }

    fn verify_arenas(&self) -> MapResult<()> {
        let live = self.entities.iter().filter(|slot| slot.is_some()).count();
        if live != self.id_map.len() {
            return corrupt(format!(
                "{} live slots but {} ids indexed",
                live,
                self.id_map.len()
            ));
        }
        for &free in &self.free_slots {
            if self
                .entities
                .get(free as usize)
                .map_or(true, |slot| slot.is_some())
            {
                return corrupt(format!("free slot {} is occupied", free));
            }
        }
        for (i, leaf) in self.leaves.iter().enumerate() {
            for &slot in &leaf.slots {
                if self
                    .entities
                    .get(slot as usize)
                    .map_or(true, |s| s.is_none())
                {
                    return corrupt(format!("leaf {} lists dead slot {}", i, slot));
                }
            }
        }
        Ok(())
    }
}

fn corrupt(detail: String) -> MapResult<()> {
    Err(MapError::CorruptPartition { detail })
}
