use std::fmt;




/**
 * Identifier for a kind of mesh entity.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Location {
    Vertex,
    Edge,
    Cell,
}




// ============================================================================
impl Location {

    pub const ALL: [Location; 3] = [Location::Vertex, Location::Edge, Location::Cell];


    /**
     * Return a dense index for this location, suitable for addressing small
     * per-location arrays.
     */
    pub fn index(self) -> usize {
        match self {
            Location::Vertex => 0,
            Location::Edge => 1,
            Location::Cell => 2,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Vertex => write!(fmt, "vertex"),
            Location::Edge => write!(fmt, "edge"),
            Location::Cell => write!(fmt, "cell"),
        }
    }
}




/// Compile-time tag for a location. Kernels written against the marker types
/// get their location checks from the type system; code holding a runtime
/// [`Location`] goes through the `_dyn` accessors instead.
///
pub trait LocationType: Copy + Default + Send + Sync + 'static {
    const LOCATION: Location;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Vertex;

#[derive(Clone, Copy, Debug, Default)]
pub struct Edge;

#[derive(Clone, Copy, Debug, Default)]
pub struct Cell;

impl LocationType for Vertex {
    const LOCATION: Location = Location::Vertex;
}

impl LocationType for Edge {
    const LOCATION: Location = Location::Edge;
}

impl LocationType for Cell {
    const LOCATION: Location = Location::Cell;
}
