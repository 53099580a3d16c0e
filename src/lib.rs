pub mod pathfinder;


pub use common::shapes::{edges_parallel, Polygon};
pub use partition::{
    Collidable, Map, MapError, MapResult, PartitionConfig, PartitionedMap, QueryFilter,
    SimpleMap,
};
pub use pathfinder::Pathfinder;
