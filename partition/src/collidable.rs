use common::shapes::Polygon;
use fxhash::FxHashSet;
use nalgebra::Point2;
use parry2d::bounding_volume::Aabb;

/// Bit 63 of the flag mask is reserved; `with_flags` strips it, so callers
/// get the lower 63 bits.
pub const RESERVED_FLAG: u64 = 1 << 63;

/// An obstacle (or unit) known to a map: a convex polygon in local
/// coordinates plus a world position and a caller-defined flag mask.
///
/// The id is assigned by the owning map on registration. The position is
/// only mutable through the map's `relocate`, which keeps the partition
/// bookkeeping consistent.
#[derive(Clone, Debug)]
pub struct Collidable {
    pub(crate) id: u32,
    pub(crate) flags: u64,
    pub(crate) position: Point2<f32>,
    pub(crate) bounds: Polygon,
}

impl Collidable {
    pub fn new(position: Point2<f32>, bounds: Polygon) -> Self {
        Self {
            id: 0,
            flags: 0,
            position,
            bounds,
        }
    }

    pub fn with_flags(position: Point2<f32>, bounds: Polygon, flags: u64) -> Self {
        Self {
            id: 0,
            flags: flags & !RESERVED_FLAG,
            position,
            bounds,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn flags(&self) -> u64 {
        self.flags
    }

    pub fn position(&self) -> Point2<f32> {
        self.position
    }

    pub fn bounds(&self) -> &Polygon {
        &self.bounds
    }

    /// Bounding box of the footprint `bounds + position`.
    pub fn world_aabb(&self) -> Aabb {
        self.bounds.aabb_at(self.position)
    }
}

/// Eligibility filter shared by all trace queries: a collidable takes part
/// when its id is not excluded and it carries none of the excluded flags.
#[derive(Clone, Copy, Default)]
pub struct QueryFilter<'a> {
    pub exclude_ids: Option<&'a FxHashSet<u32>>,
    pub exclude_flags: u64,
}

impl<'a> QueryFilter<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_flags(exclude_flags: u64) -> Self {
        Self {
            exclude_ids: None,
            exclude_flags,
        }
    }

    pub fn with_ids(exclude_ids: &'a FxHashSet<u32>) -> Self {
        Self {
            exclude_ids: Some(exclude_ids),
            exclude_flags: 0,
        }
    }

    pub fn allows(&self, collidable: &Collidable) -> bool {
        if collidable.flags & self.exclude_flags != 0 {
            return false;
        }
        match self.exclude_ids {
            Some(ids) => !ids.contains(&collidable.id),
            None => true,
        }
    }
}
