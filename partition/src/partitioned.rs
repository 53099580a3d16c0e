use fxhash::FxHashMap;
use nalgebra::Point2;
use parry2d::bounding_volume::Aabb;

use crate::collidable::Collidable;
use crate::error::{MapError, MapResult};

mod prune;
mod query;
mod split;
mod update;
mod verify;

pub(crate) const NO_INDEX: u32 = u32::MAX;

pub(crate) const SPLIT_HORIZONTAL: u8 = 0b0000_0001;
pub(crate) const LEFT_IS_LEAF: u8 = 0b0000_0010;
pub(crate) const RIGHT_IS_LEAF: u8 = 0b0000_0100;
pub(crate) const IS_ROOT: u8 = 0b0000_1000;
pub(crate) const LEFT_OF_PARENT: u8 = 0b0001_0000;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Inner node of the space partition. `split` is a world Y coordinate for
/// horizontal dividing lines and a world X coordinate for vertical ones;
/// children at or left of the line hang off `left`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Partition {
    pub(crate) flags: u8,
    pub(crate) split: f32,
    pub(crate) left: u32,
    pub(crate) right: u32,
    pub(crate) parent: u32,
}

impl Partition {
    pub(crate) fn is_horizontal(&self) -> bool {
        self.flags & SPLIT_HORIZONTAL != 0
    }

    pub(crate) fn child(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub(crate) fn child_is_leaf(&self, side: Side) -> bool {
        match side {
            Side::Left => self.flags & LEFT_IS_LEAF != 0,
            Side::Right => self.flags & RIGHT_IS_LEAF != 0,
        }
    }
}

/// Terminal sub-rectangle of the partition. `slots` indexes the map's
/// collidable arena; a collidable whose footprint straddles a split line is
/// listed by every leaf it touches.
#[derive(Clone, Debug)]
pub(crate) struct Leaf {
    pub(crate) flags: u8,
    pub(crate) parent: u32,
    pub(crate) rect: Aabb,
    pub(crate) slots: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct PartitionConfig {
    /// Lower bound on entities left on either side of a new split line.
    pub min_partition_entities: usize,
    pub max_partition_entities: usize,
    /// A leaf holding more entities than this is eligible for splitting.
    pub trigger_create_entities: usize,
    /// A subtree holding this many entities or fewer collapses to one leaf.
    pub trigger_destroy_entities: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        PartitionConfig {
            min_partition_entities: 4,
            max_partition_entities: 20,
            trigger_create_entities: 15,
            trigger_destroy_entities: 4,
        }
    }
}

impl PartitionConfig {
    pub fn validate(&self) -> MapResult<()> {
        if self.max_partition_entities < self.min_partition_entities {
            return Err(MapError::InvalidTuning {
                name: "max_partition_entities",
                value: self.max_partition_entities,
                limit: self.min_partition_entities,
            });
        }
        if self.trigger_create_entities < 2 * self.min_partition_entities {
            return Err(MapError::InvalidTuning {
                name: "trigger_create_entities",
                value: self.trigger_create_entities,
                limit: 2 * self.min_partition_entities,
            });
        }
        let destroy_limit = (2 * self.min_partition_entities).saturating_sub(1);
        if self.trigger_destroy_entities > destroy_limit {
            return Err(MapError::InvalidTuning {
                name: "trigger_destroy_entities",
                value: self.trigger_destroy_entities,
                limit: destroy_limit,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RelocationRequest {
    pub id: u32,
    pub position: Point2<f32>,
}

/// A binary tree of axis-aligned sub-rectangles over `[0, W) x [0, H)`.
///
/// Leaves list the collidables whose footprints touch their rectangle;
/// queries only visit the leaves their shapes overlap. Leaves split where an
/// entity-repulsion potential is lowest once they grow past
/// `trigger_create_entities`, and subtrees collapse back into single leaves
/// when they empty out. Both node arenas stay dense; collapsing shifts
/// indices, so no index is handed out to callers.
pub struct PartitionedMap {
    width: f32,
    height: f32,
    config: PartitionConfig,
    partitions: Vec<Partition>,
    leaves: Vec<Leaf>,
    root: u32,
    entities: Vec<Option<Collidable>>,
    free_slots: Vec<u32>,
    id_map: FxHashMap<u32, u32>,
    id_counter: u32,
}

impl PartitionedMap {
    pub fn new(width: f32, height: f32) -> MapResult<Self> {
        Self::new_with_config(width, height, PartitionConfig::default())
    }

    pub fn new_with_config(width: f32, height: f32, config: PartitionConfig) -> MapResult<Self> {
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return Err(MapError::InvalidWorldDims { width, height });
        }
        config.validate()?;
        let world = Aabb::new(Point2::new(0.0, 0.0), Point2::new(width, height));
        Ok(Self {
            width,
            height,
            config,
            partitions: Vec::new(),
            leaves: vec![Leaf {
                flags: 0,
                parent: NO_INDEX,
                rect: world,
                slots: Vec::new(),
            }],
            root: NO_INDEX,
            entities: Vec::new(),
            free_slots: Vec::new(),
            id_map: FxHashMap::default(),
            id_counter: 0,
        })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Number of registered collidables.
    pub fn len(&self) -> usize {
        self.id_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_map.is_empty()
    }

    pub fn collidable(&self, id: u32) -> Option<&Collidable> {
        self.id_map
            .get(&id)
            .and_then(|&slot| self.entities[slot as usize].as_ref())
    }

    pub fn collidables(&self) -> impl Iterator<Item = &Collidable> {
        self.entities.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.leaves.len()
    }

    /// Appends every leaf rectangle, for inspection and debugging.
    pub fn leaf_rects(&self, rects: &mut Vec<Aabb>) {
        rects.extend(self.leaves.iter().map(|leaf| leaf.rect));
    }
}
