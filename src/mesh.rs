use std::collections::HashMap;
use log::{debug, info};
use crate::connectivity::{Connectivity, NeighborSource};
use crate::error::{Error, Result};
use crate::location::{Location, LocationType};




/// A trait for an external mesh description that can be registered into a
/// `Mesh`. Implementors answer per-location element counts, and hand out a
/// raw neighbor source for each `(from, to)` pair they support.
///
pub trait MeshProvider {
    /// Return the number of elements of the given location, if known.
    ///
    fn location_size(&self, location: Location) -> Option<usize>;

    /// Return the raw neighbor source for a location pair, if supported.
    ///
    fn neighbor_source(&self, from: Location, to: Location) -> Option<&dyn NeighborSource>;

    /// Return the table width to use for a location pair. `None` lets the
    /// mesh use the widest row of the source.
    ///
    fn max_neighbors(&self, _from: Location, _to: Location) -> Option<usize> {
        None
    }

    /// Whether rows of the given pair may be shorter than the table width.
    /// Pairs answering `false` are built as dense tables.
    ///
    fn has_skip_values(&self, _from: Location, _to: Location) -> bool {
        true
    }

    /// Whether an edge is a pole edge, which gets sign +1 relative to both
    /// of its endpoints.
    ///
    fn is_pole_edge(&self, _edge: usize) -> bool {
        false
    }
}




/**
 * An immutable registry of per-location element counts and connectivities
 * between location pairs. Derived tables (inverses, compositions) are built
 * eagerly by the `MeshBuilder` and cached here for the lifetime of the mesh.
 */
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    sizes: [Option<usize>; 3],
    connectivities: HashMap<(Location, Location), Connectivity>,
}




// ============================================================================
impl Mesh {


    /**
     * Return a builder for a new mesh.
     */
    pub fn builder() -> MeshBuilder {
        MeshBuilder::default()
    }


    /**
     * Return the number of elements of the location `L`.
     */
    pub fn location_size<L: LocationType>(&self) -> Result<usize> {
        self.location_size_dyn(L::LOCATION)
    }

    pub fn location_size_dyn(&self, location: Location) -> Result<usize> {
        self.sizes[location.index()].ok_or(Error::MissingLocationSize(location))
    }


    /**
     * Return the connectivity from `F` to `T`.
     */
    pub fn connectivity<F: LocationType, T: LocationType>(&self) -> Result<&Connectivity> {
        self.connectivity_dyn(F::LOCATION, T::LOCATION)
    }

    pub fn connectivity_dyn(&self, from: Location, to: Location) -> Result<&Connectivity> {
        self.connectivities
            .get(&(from, to))
            .ok_or(Error::MissingConnectivity { from, to })
    }


    /**
     * Determine whether the mesh has a connectivity from `from` to `to`.
     */
    pub fn has_connectivity(&self, from: Location, to: Location) -> bool {
        self.connectivities.contains_key(&(from, to))
    }


    /**
     * Return an iterator over the registered location pairs, in a
     * deterministic order.
     */
    pub fn connectivity_pairs(&self) -> impl Iterator<Item = (Location, Location)> {
        let mut pairs: Vec<_> = self.connectivities.keys().copied().collect();
        pairs.sort();
        pairs.into_iter()
    }
}




/**
 * Assembles a `Mesh`. Connectivities may be registered directly, pulled from
 * a `MeshProvider`, or derived from tables already registered. Every table
 * is checked against the location sizes when the mesh is built.
 */
#[derive(Default)]
pub struct MeshBuilder {
    sizes: [Option<usize>; 3],
    connectivities: HashMap<(Location, Location), Connectivity>,
}




// ============================================================================
impl MeshBuilder {

    pub fn location_size(mut self, location: Location, size: usize) -> Self {
        self.sizes[location.index()] = Some(size);
        self
    }


    /**
     * Register a connectivity. The element counts of its two locations are
     * recorded if not yet known, and must agree with what is already known.
     */
    pub fn connectivity(mut self, connectivity: Connectivity) -> Result<Self> {
        self.record_size(connectivity.from(), connectivity.size())?;
        self.record_size(connectivity.to(), connectivity.target_size())?;
        debug!("registered {}->{} connectivity", connectivity.from(), connectivity.to());
        self.connectivities.insert((connectivity.from(), connectivity.to()), connectivity);
        Ok(self)
    }


    /**
     * Register the primary (self) connectivity of a location whose size is
     * already known.
     */
    pub fn primary(self, location: Location) -> Result<Self> {
        let size = self.sizes[location.index()].ok_or(Error::MissingLocationSize(location))?;
        self.connectivity(Connectivity::primary(location, size))
    }


    /**
     * Register the given location pairs from a mesh provider. Element counts
     * reported by the provider are recorded first.
     */
    pub fn from_provider<P>(mut self, provider: &P, pairs: &[(Location, Location)]) -> Result<Self>
    where
        P: MeshProvider + ?Sized,
    {
        for location in Location::ALL {
            if let Some(size) = provider.location_size(location) {
                self.record_size(location, size)?;
            }
        }
        for &(from, to) in pairs {
            let source = provider
                .neighbor_source(from, to)
                .ok_or(Error::MissingConnectivity { from, to })?;
            let target_size = self.sizes[to.index()].ok_or(Error::MissingLocationSize(to))?;
            let width = provider
                .max_neighbors(from, to)
                .unwrap_or_else(|| (0..source.rows()).map(|r| source.cols(r)).max().unwrap_or(0));

            let connectivity = if provider.has_skip_values(from, to) {
                Connectivity::build(source, from, to, target_size, width)?
            } else {
                Connectivity::dense(source, from, to, target_size, width)?
            };
            self = self.connectivity(connectivity)?;
        }
        Ok(self)
    }


    /**
     * Derive and register the inverse of a registered connectivity.
     */
    pub fn derive_inverse(self, from: Location, to: Location, max_neighbors: Option<usize>) -> Result<Self> {
        let inverse = self.get(from, to)?.inverse(max_neighbors)?;
        self.connectivity(inverse)
    }


    /**
     * Derive and register the signed inverse of a registered two-endpoint
     * connectivity (typically `edge -> vertex`), with the given pole
     * predicate over source elements.
     */
    pub fn derive_oriented_inverse<P>(self, from: Location, to: Location, max_neighbors: Option<usize>, is_pole: P) -> Result<Self>
    where
        P: Fn(usize) -> bool,
    {
        let inverse = self.get(from, to)?.oriented_inverse(max_neighbors, is_pole)?;
        self.connectivity(inverse)
    }


    /**
     * Derive and register `from -> to` as the composition of the registered
     * `from -> via` and `via -> to` connectivities.
     */
    pub fn derive_composition(self, from: Location, via: Location, to: Location, max_neighbors: Option<usize>) -> Result<Self> {
        let composed = self.get(from, via)?.compose(self.get(via, to)?, max_neighbors)?;
        self.connectivity(composed)
    }


    /**
     * Validate and return the mesh. Every registered table must have one row
     * per element of its source location.
     */
    pub fn build(self) -> Result<Mesh> {
        for c in self.connectivities.values() {
            let size = self.sizes[c.from().index()].ok_or(Error::MissingLocationSize(c.from()))?;
            if c.size() != size {
                return Err(Error::ShapeMismatch {
                    what: "connectivity row count",
                    expected: size,
                    found: c.size(),
                })
            }
        }
        let mesh = Mesh { sizes: self.sizes, connectivities: self.connectivities };

        info!("mesh with {} vertices, {} edges, {} cells and {} connectivities",
            describe(mesh.sizes[Location::Vertex.index()]),
            describe(mesh.sizes[Location::Edge.index()]),
            describe(mesh.sizes[Location::Cell.index()]),
            mesh.connectivities.len());
        Ok(mesh)
    }

    fn get(&self, from: Location, to: Location) -> Result<&Connectivity> {
        self.connectivities
            .get(&(from, to))
            .ok_or(Error::MissingConnectivity { from, to })
    }

    fn record_size(&mut self, location: Location, size: usize) -> Result<()> {
        match self.sizes[location.index()] {
            Some(known) if known != size => Err(Error::ShapeMismatch {
                what: "location size",
                expected: known,
                found: size,
            }),
            _ => {
                self.sizes[location.index()] = Some(size);
                Ok(())
            }
        }
    }
}

fn describe(size: Option<usize>) -> String {
    size.map_or_else(|| "?".to_string(), |s| s.to_string())
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::location::{Edge, Vertex};

    struct Triangles {
        edges: Vec<[i32; 2]>,
    }

    impl MeshProvider for Triangles {
        fn location_size(&self, location: Location) -> Option<usize> {
            match location {
                Location::Vertex => Some(4),
                Location::Edge => Some(self.edges.len()),
                Location::Cell => None,
            }
        }

        fn neighbor_source(&self, from: Location, to: Location) -> Option<&dyn NeighborSource> {
            match (from, to) {
                (Location::Edge, Location::Vertex) => Some(&self.edges),
                _ => None,
            }
        }

        fn has_skip_values(&self, _: Location, _: Location) -> bool {
            false
        }
    }

    fn provider() -> Triangles {
        Triangles { edges: vec![[0, 1], [1, 2], [2, 0], [1, 3]] }
    }

    #[test]
    fn mesh_from_provider_answers_sizes_and_tables() {
        let mesh = Mesh::builder()
            .from_provider(&provider(), &[(Location::Edge, Location::Vertex)]).unwrap()
            .build().unwrap();
        assert_eq!(mesh.location_size::<Vertex>(), Ok(4));
        assert_eq!(mesh.location_size::<Edge>(), Ok(4));
        assert_eq!(mesh.location_size_dyn(Location::Cell), Err(Error::MissingLocationSize(Location::Cell)));

        let e2v = mesh.connectivity::<Edge, Vertex>().unwrap();
        assert_eq!(e2v.max_neighbors(), 2);
        assert!(!e2v.has_skip_values());
        assert!(mesh.connectivity::<Vertex, Edge>().is_err());
    }

    #[test]
    fn unsupported_pair_is_reported_by_provider_registration() {
        let result = Mesh::builder().from_provider(&provider(), &[(Location::Cell, Location::Vertex)]);
        assert!(matches!(result, Err(Error::MissingConnectivity { from: Location::Cell, to: Location::Vertex })));
    }

    #[test]
    fn derived_tables_are_cached_in_the_mesh() {
        let mesh = Mesh::builder()
            .from_provider(&provider(), &[(Location::Edge, Location::Vertex)]).unwrap()
            .derive_oriented_inverse(Location::Edge, Location::Vertex, Some(7), |_| false).unwrap()
            .derive_composition(Location::Vertex, Location::Edge, Location::Vertex, None).unwrap()
            .build().unwrap();

        assert!(mesh.has_connectivity(Location::Vertex, Location::Edge));
        assert!(!mesh.has_connectivity(Location::Cell, Location::Vertex));

        let v2e = mesh.connectivity::<Vertex, Edge>().unwrap();
        assert_eq!(v2e.size(), 4);
        assert_eq!(v2e.max_neighbors(), 7);
        assert_eq!(
            mesh.connectivity_pairs().collect::<Vec<_>>(),
            vec![
                (Location::Vertex, Location::Vertex),
                (Location::Vertex, Location::Edge),
                (Location::Edge, Location::Vertex),
            ]);
    }

    #[test]
    fn conflicting_location_sizes_are_rejected() {
        let result = Mesh::builder()
            .location_size(Location::Vertex, 3)
            .from_provider(&provider(), &[]);
        assert!(matches!(result, Err(Error::ShapeMismatch { what: "location size", expected: 3, found: 4 })));
    }

    #[test]
    fn primary_connectivity_needs_a_known_size() {
        assert!(Mesh::builder().primary(Location::Cell).is_err());
        let mesh = Mesh::builder()
            .location_size(Location::Cell, 9)
            .primary(Location::Cell).unwrap()
            .build().unwrap();
        assert_eq!(mesh.connectivity_dyn(Location::Cell, Location::Cell).unwrap().size(), 9);
    }
}
