use common::shapes::Polygon;
use nalgebra::Point2;

use crate::collidable::{Collidable, QueryFilter};
use crate::map::{self, Map};

/// A flat collidable list with linear-scan queries. The baseline `Map`
/// implementation, and the reference the partitioned map is checked against.
pub struct SimpleMap {
    width: f32,
    height: f32,
    collidables: Vec<Collidable>,
    id_counter: u32,
}

impl SimpleMap {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            collidables: Vec::new(),
            id_counter: 0,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Takes ownership of the collidable and assigns the next id. No
    /// geometric validation is performed.
    pub fn register(&mut self, mut collidable: Collidable) -> u32 {
        let id = self.id_counter;
        self.id_counter += 1;
        collidable.id = id;
        self.collidables.push(collidable);
        id
    }

    pub fn collidables(&self) -> &[Collidable] {
        &self.collidables
    }

    /// First collidable, in registration order, whose bounds strictly
    /// contain `position`; boundary points are outside.
    pub fn get_intersecting(&self, position: Point2<f32>) -> Option<u32> {
        self.collidables
            .iter()
            .find(|c| c.bounds.contains_point(c.position, position))
            .map(|c| c.id)
    }
}

impl Map for SimpleMap {
    fn contains(&self, polygon: &Polygon, position: Point2<f32>) -> bool {
        map::fits_world(polygon, position, self.width, self.height)
    }

    fn trace_traces(
        &self,
        traces: &[Polygon],
        from: Point2<f32>,
        filter: QueryFilter<'_>,
    ) -> bool {
        !self
            .collidables
            .iter()
            .any(|c| filter.allows(c) && map::hits_any(c, traces, from))
    }

    fn trace_exhaust_traces<'m>(
        &'m self,
        traces: &[Polygon],
        from: Point2<f32>,
        filter: QueryFilter<'_>,
    ) -> Vec<&'m Collidable> {
        self.collidables
            .iter()
            .filter(|c| filter.allows(c) && map::hits_any(c, traces, from))
            .collect()
    }
}
