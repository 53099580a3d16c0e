pub mod collidable;
pub mod error;
pub mod map;
pub mod partitioned;
pub mod simple;

pub use collidable::{Collidable, QueryFilter, RESERVED_FLAG};
pub use error::{MapError, MapResult};
pub use map::Map;
pub use partitioned::{PartitionConfig, PartitionedMap, RelocationRequest};
pub use simple::SimpleMap;
