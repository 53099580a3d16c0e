use nalgebra::Point2;

use super::query::LeafSet;
use super::{PartitionedMap, RelocationRequest};
use crate::collidable::Collidable;
use crate::error::{MapError, MapResult};

impl PartitionedMap {
    /// Takes ownership of the collidable, assigns the next id and lists it
    /// in every leaf its footprint touches.
    pub fn register(&mut self, mut collidable: Collidable) -> u32 {
        let id = self.id_counter;
        self.id_counter += 1;
        collidable.id = id;
        self.insert_collidable(collidable);
        id
    }

    /// Registers under the id already stored on the collidable, for callers
    /// that manage ids themselves. The internal counter jumps past the id so
    /// later `register` calls cannot collide with it.
    pub fn register_with_id(&mut self, collidable: Collidable) -> MapResult<u32> {
        let id = collidable.id;
        if self.id_map.contains_key(&id) {
            return Err(MapError::DuplicateCollidable { id });
        }
        if id >= self.id_counter {
            self.id_counter = id + 1;
        }
        self.insert_collidable(collidable);
        Ok(id)
    }

    fn insert_collidable(&mut self, collidable: Collidable) {
        let id = collidable.id;
        let aabb = collidable.world_aabb();
        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.entities[slot as usize] = Some(collidable);
                slot
            }
            None => {
                self.entities.push(Some(collidable));
                (self.entities.len() - 1) as u32
            }
        };
        let affected = self.leaves_for_aabb(&aabb);
        for &leaf in &affected {
            self.leaves[leaf as usize].slots.push(slot);
        }
        self.id_map.insert(id, slot);
        for &leaf in &affected {
            self.consider_split(leaf);
        }
    }

    /// Removes the collidable from every leaf listing it and returns it.
    pub fn unregister(&mut self, id: u32) -> MapResult<Collidable> {
        let slot = self
            .id_map
            .remove(&id)
            .ok_or(MapError::UnknownCollidable { id })?;
        let aabb = match self.entities[slot as usize].as_ref() {
            Some(c) => c.world_aabb(),
            None => return Err(MapError::UnknownCollidable { id }),
        };
        let affected = self.leaves_for_aabb(&aabb);
        for &leaf in &affected {
            let slots = &mut self.leaves[leaf as usize].slots;
            if let Some(at) = slots.iter().position(|&s| s == slot) {
                slots.swap_remove(at);
            }
        }
        let removed = self.entities[slot as usize].take();
        self.free_slots.push(slot);
        self.consider_prune(affected);
        removed.ok_or(MapError::UnknownCollidable { id })
    }

    /// Moves a collidable. When it stays strictly inside the single leaf it
    /// already occupies only the position changes; otherwise the leaf lists
    /// are patched by set difference and the affected leaves re-balanced.
    pub fn relocate(&mut self, id: u32, position: Point2<f32>) -> MapResult<()> {
        let slot = *self
            .id_map
            .get(&id)
            .ok_or(MapError::UnknownCollidable { id })?;
        let (old_aabb, new_aabb) = match self.entities[slot as usize].as_ref() {
            Some(c) => (c.world_aabb(), c.bounds.aabb_at(position)),
            None => return Err(MapError::UnknownCollidable { id }),
        };
        let old_leaves = self.leaves_for_aabb(&old_aabb);
        if let [only] = old_leaves[..] {
            let rect = self.leaves[only as usize].rect;
            let inside = new_aabb.mins.x > rect.mins.x
                && new_aabb.mins.y > rect.mins.y
                && new_aabb.maxs.x < rect.maxs.x
                && new_aabb.maxs.y < rect.maxs.y;
            if inside {
                if let Some(c) = self.entities[slot as usize].as_mut() {
                    c.position = position;
                }
                return Ok(());
            }
        }
        let new_leaves = self.leaves_for_aabb(&new_aabb);
        let removed: LeafSet = old_leaves
            .iter()
            .copied()
            .filter(|leaf| !new_leaves.contains(leaf))
            .collect();
        let added: LeafSet = new_leaves
            .iter()
            .copied()
            .filter(|leaf| !old_leaves.contains(leaf))
            .collect();
        for &leaf in &removed {
            let slots = &mut self.leaves[leaf as usize].slots;
            if let Some(at) = slots.iter().position(|&s| s == slot) {
                slots.swap_remove(at);
            }
        }
        for &leaf in &added {
            self.leaves[leaf as usize].slots.push(slot);
        }
        if let Some(c) = self.entities[slot as usize].as_mut() {
            c.position = position;
        }
        for &leaf in &added {
            self.consider_split(leaf);
        }
        self.consider_prune(removed);
        Ok(())
    }

    pub fn relocate_batch(&mut self, requests: &[RelocationRequest]) -> MapResult<()> {
        for request in requests {
            self.relocate(request.id, request.position)?;
        }
        Ok(())
    }
}
