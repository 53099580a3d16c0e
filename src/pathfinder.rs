use std::cmp::Ordering;
use std::collections::BinaryHeap;

use common::shapes::{edges_parallel, Polygon};
use fxhash::FxHashSet;
use nalgebra::Point2;
use partition::{Collidable, Map, QueryFilter};

/// Weight on the heuristic term; above 1 the search leans depth-first and
/// trades optimality for fewer expansions.
const HEURISTIC_WEIGHT: f32 = 1.5;
const OPEN_QUEUE_CAPACITY: usize = 256;
const NO_NODE: u32 = u32::MAX;

/// Best-first any-angle pathfinder for one moving polygon on one map.
///
/// Candidate waypoints snap a vertex of the moving polygon onto a vertex of
/// an obstacle; from a snap the search slides along the same obstacle ring
/// one vertex at a time, or jumps to whatever other obstacle blocks the way.
/// The result is a polyline of snap points ending at `end`; a single-element
/// `[end]` means the straight line was already clear.
pub struct Pathfinder<'a, M: Map + ?Sized> {
    map: &'a M,
    shape: &'a Polygon,
    start: Point2<f32>,
    end: Point2<f32>,
    filter: QueryFilter<'a>,
}

struct PathNode<'a> {
    parent: u32,
    location: Point2<f32>,
    collidable: Option<&'a Collidable>,
    their_vertex: u32,
    our_vertex: u32,
    g: f32,
    #[allow(dead_code)]
    h: f32,
}

#[derive(Clone, Copy, PartialEq)]
struct OpenEntry {
    cost: f32,
    node: u32,
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Flipped so the BinaryHeap pops the cheapest entry first.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node.cmp(&self.node))
    }
}

struct SearchState<'a> {
    nodes: Vec<PathNode<'a>>,
    open: BinaryHeap<OpenEntry>,
    closed: FxHashSet<(u32, u32, u32)>,
}

impl<'a, M: Map + ?Sized> Pathfinder<'a, M> {
    pub fn new(
        map: &'a M,
        shape: &'a Polygon,
        start: Point2<f32>,
        end: Point2<f32>,
        filter: QueryFilter<'a>,
    ) -> Self {
        Self {
            map,
            shape,
            start,
            end,
            filter,
        }
    }

    /// Runs the search. Returns the waypoints from start (excluded) to end
    /// (included), or `None` when no placement sequence reaches the end.
    pub fn calculate_path(&self) -> Option<Vec<Point2<f32>>> {
        let initial = self
            .map
            .trace_exhaust(self.shape, self.start, self.end, self.filter);
        if initial.is_empty() {
            return Some(vec![self.end]);
        }
        // The end must admit a stationary placement at all before it is
        // worth expanding anything.
        if !self
            .map
            .trace_traces(std::slice::from_ref(self.shape), self.end, self.filter)
        {
            return None;
        }

        let mut state = SearchState {
            nodes: Vec::new(),
            open: BinaryHeap::with_capacity(OPEN_QUEUE_CAPACITY),
            closed: FxHashSet::default(),
        };
        state.nodes.push(PathNode {
            parent: NO_NODE,
            location: self.start,
            collidable: None,
            their_vertex: 0,
            our_vertex: 0,
            g: 0.0,
            h: (self.end - self.start).norm(),
        });
        self.queue_collidables(&mut state, 0, initial);

        while let Some(entry) = state.open.pop() {
            let location = state.nodes[entry.node as usize].location;
            let blockers = self
                .map
                .trace_exhaust(self.shape, location, self.end, self.filter);
            if blockers.is_empty() {
                return Some(self.reconstruct(&state, entry.node));
            }
            self.queue_collidables(&mut state, entry.node, blockers);
        }
        None
    }

    /// Expands every snap candidate around the given obstacles, growing the
    /// obstacle list with whatever blocks an attempted approach.
    fn queue_collidables(
        &self,
        state: &mut SearchState<'a>,
        from: u32,
        initial: Vec<&'a Collidable>,
    ) {
        let from_collidable = state.nodes[from as usize].collidable.map(|c| c.id());
        let from_their = state.nodes[from as usize].their_vertex;
        let from_our = state.nodes[from as usize].our_vertex;
        let mut seen: FxHashSet<u32> = initial.iter().map(|c| c.id()).collect();
        let mut pending = initial;
        let mut next = 0;
        while next < pending.len() {
            let obstacle = pending[next];
            next += 1;
            for their_vtx in 0..obstacle.bounds().len() as u32 {
                let vertex = obstacle.bounds().vertex(their_vtx as usize);
                // Pressing our polygon against that obstacle vertex from
                // outside, the touching vertex of ours is the one furthest
                // toward the obstacle's interior.
                let inward = obstacle.bounds().centroid() - vertex;
                let our_vtx = self.shape.support_vertex(inward) as u32;
                let blockers = if from_collidable == Some(obstacle.id()) {
                    self.queue_slide(
                        state, from, obstacle, their_vtx, our_vtx, from_their, from_our,
                    )
                } else {
                    self.consider_target(state, from, obstacle, their_vtx, our_vtx)
                };
                for blocker in blockers {
                    if seen.insert(blocker.id()) {
                        pending.push(blocker);
                    }
                }
            }
        }
    }

    /// Snap transitions along the obstacle the node already rests on. Only
    /// ring-adjacent obstacle vertices are worth trying; sliding further
    /// around almost never traces clear.
    fn queue_slide(
        &self,
        state: &mut SearchState<'a>,
        from: u32,
        obstacle: &'a Collidable,
        their_vtx: u32,
        our_vtx: u32,
        from_their: u32,
        from_our: u32,
    ) -> Vec<&'a Collidable> {
        let ring = obstacle.bounds().len() as u32;
        let step = (their_vtx + ring - from_their) % ring;
        if step != 1 && step != ring - 1 {
            return Vec::new();
        }
        if our_vtx == from_our {
            return self.consider_target(state, from, obstacle, their_vtx, our_vtx);
        }

        // Our contact vertex has to change; take the shorter way around our
        // ring, ties toward increment.
        let ours = self.shape.len() as u32;
        let forward = (our_vtx + ours - from_our) % ours;
        let backward = (from_our + ours - our_vtx) % ours;
        let target_our = if forward <= backward {
            (from_our + 1) % ours
        } else {
            (from_our + ours - 1) % ours
        };

        // When the edge we rotate over is parallel to the obstacle edge the
        // slide is vacuous and collapses into the straight combined step.
        let our_edge = if forward <= backward {
            self.shape.edge(from_our as usize)
        } else {
            self.shape.edge(target_our as usize)
        };
        let their_edge = if step == 1 {
            obstacle.bounds().edge(from_their as usize)
        } else {
            obstacle.bounds().edge(their_vtx as usize)
        };
        if edges_parallel(our_edge, their_edge) {
            return self.consider_target(state, from, obstacle, their_vtx, our_vtx);
        }

        // Rotating around either contact point is a legitimate next move;
        // emit both one-step candidates.
        let mut blockers = self.consider_target(state, from, obstacle, from_their, target_our);
        blockers.extend(self.consider_target(state, from, obstacle, their_vtx, from_our));
        blockers
    }

    /// Attempts one snap placement. A clear trace enqueues a node and closes
    /// the `(obstacle, their, our)` triple; a blocked trace hands the
    /// blockers back without closing so the triple can be retried from
    /// another node.
    fn consider_target(
        &self,
        state: &mut SearchState<'a>,
        from: u32,
        obstacle: &'a Collidable,
        their_vtx: u32,
        our_vtx: u32,
    ) -> Vec<&'a Collidable> {
        let key = (obstacle.id(), their_vtx, our_vtx);
        if state.closed.contains(&key) {
            return Vec::new();
        }
        let target = obstacle.position()
            + (obstacle.bounds().vertex(their_vtx as usize).coords
                - self.shape.vertex(our_vtx as usize).coords);
        if !self.map.contains(self.shape, target) {
            state.closed.insert(key);
            return Vec::new();
        }
        let from_location = state.nodes[from as usize].location;
        let blockers = self
            .map
            .trace_exhaust(self.shape, from_location, target, self.filter);
        if !blockers.is_empty() {
            return blockers;
        }
        state.closed.insert(key);
        let g = state.nodes[from as usize].g + (target - from_location).norm();
        let h = (self.end - target).norm();
        let node = state.nodes.len() as u32;
        state.nodes.push(PathNode {
            parent: from,
            location: target,
            collidable: Some(obstacle),
            their_vertex: their_vtx,
            our_vertex: our_vtx,
            g,
            h,
        });
        state.open.push(OpenEntry {
            cost: g + HEURISTIC_WEIGHT * h,
            node,
        });
        Vec::new()
    }

    fn reconstruct(&self, state: &SearchState<'_>, node: u32) -> Vec<Point2<f32>> {
        let mut path = vec![self.end];
        let mut cur = node;
        while state.nodes[cur as usize].parent != NO_NODE {
            path.push(state.nodes[cur as usize].location);
            cur = state.nodes[cur as usize].parent;
        }
        path.reverse();
        path
    }
}
