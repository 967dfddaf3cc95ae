use crate::layout::Dim;
use crate::location::Location;




/**
 * Error to represent an invalid mesh description, or a field whose shape
 * does not agree with the mesh or kernel it is handed to.
 */
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{from}->{to} neighbor ({row}, {col}) = {index} is outside of 0..{size}")]
    NeighborOutOfRange {
        from: Location,
        to: Location,
        row: usize,
        col: usize,
        index: i64,
        size: usize,
    },

    #[error("{from}->{to} is declared dense but slot ({row}, {col}) has no neighbor")]
    MissingNeighbor {
        from: Location,
        to: Location,
        row: usize,
        col: usize,
    },

    #[error("invalid location type: expected {expected}, found {found}")]
    InvalidLocation {
        expected: Location,
        found: Location,
    },

    #[error("field has no {0} dimension")]
    MissingDimension(Dim),

    #[error("shape mismatch in {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("mesh has no {from}->{to} connectivity")]
    MissingConnectivity {
        from: Location,
        to: Location,
    },

    #[error("{from}->{to} connectivity carries no neighbor signs")]
    UnsignedConnectivity {
        from: Location,
        to: Location,
    },

    #[error("mesh has no size for location {0}")]
    MissingLocationSize(Location),

    #[error("per-{0} slots of the output field are not disjoint blocks")]
    NonBlockedLayout(Location),

    #[error("could not build thread pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, Error>;
