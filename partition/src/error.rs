use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    InvalidWorldDims { width: f32, height: f32 },
    InvalidTuning {
        name: &'static str,
        value: usize,
        limit: usize,
    },
    UnknownCollidable { id: u32 },
    DuplicateCollidable { id: u32 },
    CorruptPartition { detail: String },
}

pub type MapResult<T> = Result<T, MapError>;

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::InvalidWorldDims { width, height } => {
                write!(
                    f,
                    "map width/height must be finite and positive (width: {}, height: {})",
                    width, height
                )
            }
            MapError::InvalidTuning { name, value, limit } => {
                write!(
                    f,
                    "partition tuning {} = {} is outside its allowed bound ({})",
                    name, value, limit
                )
            }
            MapError::UnknownCollidable { id } => {
                write!(f, "no collidable registered under id {}", id)
            }
            MapError::DuplicateCollidable { id } => {
                write!(f, "a collidable is already registered under id {}", id)
            }
            MapError::CorruptPartition { detail } => {
                write!(f, "partition invariant violated: {}", detail)
            }
        }
    }
}

impl std::error::Error for MapError {}
