use crate::connectivity::NeighborSource;
use crate::error::Result;
use crate::field::Field;
use crate::location::Location;
use crate::mesh::{Mesh, MeshProvider};




/**
 * The median-dual geometry of a Cartesian mesh: the control volume of each
 * vertex, and the x and y components of the dual face normal crossing each
 * edge. None of these fields has a vertical dimension.
 */
#[derive(Clone, Debug)]
pub struct DualGeometry {
    pub vol: Field<f64>,
    pub s_mxx: Field<f64>,
    pub s_myy: Field<f64>,
}




/**
 * A quadrilateral mesh of `ni` rows by `nj` columns of cells, either wrapped
 * around in both directions (a torus) or bounded. Vertex `(r, c)` sits at
 * `x = c * dx`, `y = r * dy`.
 *
 * Numbering: cell `(r, c)` is `r * nj + c`. Horizontal edges, joining
 * `(r, c)` to `(r, c + 1)`, come first; vertical edges, joining `(r, c)` to
 * `(r + 1, c)`, follow. Cell-to-cell rows are ordered up, right, down,
 * left; cell-to-vertex rows are `(r, c), (r, c + 1), (r + 1, c),
 * (r + 1, c + 1)`; cell-to-edge rows are top, right, bottom, left. In a
 * bounded mesh, cells on the boundary have -1 for their missing neighbors.
 */
#[derive(Clone, Debug)]
pub struct CartesianMesh {
    ni: usize,
    nj: usize,
    spacing: (f64, f64),
    periodic: bool,
    edge_to_vertex: Vec<[i32; 2]>,
    cell_to_vertex: Vec<[i32; 4]>,
    cell_to_edge: Vec<[i32; 4]>,
    cell_to_cell: Vec<[i32; 4]>,
}




// ============================================================================
impl CartesianMesh {


    /**
     * Generate a periodic mesh of `ni * nj` vertices, `2 * ni * nj` edges and
     * `ni * nj` cells, with cell spacing `(dx, dy)`.
     */
    pub fn periodic(ni: usize, nj: usize, spacing: (f64, f64)) -> Self {
        assert!(ni > 0 && nj > 0, "mesh must have at least one cell");
        let vertex = |r: usize, c: usize| ((r % ni) * nj + c % nj) as i32;
        let horizontal = |r: usize, c: usize| ((r % ni) * nj + c % nj) as i32;
        let vertical = |r: usize, c: usize| (ni * nj + (r % ni) * nj + c % nj) as i32;
        let cell = |r: usize, c: usize| ((r % ni) * nj + c % nj) as i32;

        let mut edge_to_vertex = Vec::with_capacity(2 * ni * nj);
        edge_to_vertex.extend(cells(ni, nj).map(|(r, c)| [vertex(r, c), vertex(r, c + 1)]));
        edge_to_vertex.extend(cells(ni, nj).map(|(r, c)| [vertex(r, c), vertex(r + 1, c)]));

        Self {
            ni,
            nj,
            spacing,
            periodic: true,
            edge_to_vertex,
            cell_to_vertex: cells(ni, nj)
                .map(|(r, c)| [vertex(r, c), vertex(r, c + 1), vertex(r + 1, c), vertex(r + 1, c + 1)])
                .collect(),
            cell_to_edge: cells(ni, nj)
                .map(|(r, c)| [horizontal(r, c), vertical(r, c + 1), horizontal(r + 1, c), vertical(r, c)])
                .collect(),
            cell_to_cell: cells(ni, nj)
                .map(|(r, c)| [cell(r + ni - 1, c), cell(r, c + 1), cell(r + 1, c), cell(r, c + nj - 1)])
                .collect(),
        }
    }


    /**
     * Generate a bounded mesh of `(ni + 1) * (nj + 1)` vertices and `ni * nj`
     * cells, with cell spacing `(dx, dy)`.
     */
    pub fn bounded(ni: usize, nj: usize, spacing: (f64, f64)) -> Self {
        assert!(ni > 0 && nj > 0, "mesh must have at least one cell");
        let num_horizontal = (ni + 1) * nj;
        let vertex = |r: usize, c: usize| (r * (nj + 1) + c) as i32;
        let horizontal = |r: usize, c: usize| (r * nj + c) as i32;
        let vertical = |r: usize, c: usize| (num_horizontal + r * (nj + 1) + c) as i32;
        let cell = |r: isize, c: isize| {
            if r < 0 || c < 0 || r >= ni as isize || c >= nj as isize {
                -1
            } else {
                (r as usize * nj + c as usize) as i32
            }
        };

        let mut edge_to_vertex = Vec::with_capacity(num_horizontal + ni * (nj + 1));
        edge_to_vertex.extend(cells(ni + 1, nj).map(|(r, c)| [vertex(r, c), vertex(r, c + 1)]));
        edge_to_vertex.extend(cells(ni, nj + 1).map(|(r, c)| [vertex(r, c), vertex(r + 1, c)]));

        Self {
            ni,
            nj,
            spacing,
            periodic: false,
            edge_to_vertex,
            cell_to_vertex: cells(ni, nj)
                .map(|(r, c)| [vertex(r, c), vertex(r, c + 1), vertex(r + 1, c), vertex(r + 1, c + 1)])
                .collect(),
            cell_to_edge: cells(ni, nj)
                .map(|(r, c)| [horizontal(r, c), vertical(r, c + 1), horizontal(r + 1, c), vertical(r, c)])
                .collect(),
            cell_to_cell: cells(ni, nj)
                .map(|(r, c)| (r as isize, c as isize))
                .map(|(r, c)| [cell(r - 1, c), cell(r, c + 1), cell(r + 1, c), cell(r, c - 1)])
                .collect(),
        }
    }


    /**
     * The 2x2-cell, 9-vertex bounded mesh with unit spacing.
     */
    pub fn prototype() -> Self {
        Self::bounded(2, 2, (1.0, 1.0))
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    pub fn spacing(&self) -> (f64, f64) {
        self.spacing
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_columns() * self.vertex_rows()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_to_vertex.len()
    }

    pub fn num_cells(&self) -> usize {
        self.ni * self.nj
    }

    pub fn edge_to_vertex(&self) -> &[[i32; 2]] {
        &self.edge_to_vertex
    }

    pub fn cell_to_vertex(&self) -> &[[i32; 4]] {
        &self.cell_to_vertex
    }

    pub fn cell_to_edge(&self) -> &[[i32; 4]] {
        &self.cell_to_edge
    }

    pub fn cell_to_cell(&self) -> &[[i32; 4]] {
        &self.cell_to_cell
    }


    /**
     * Return the `(x, y)` position of a vertex.
     */
    pub fn vertex_position(&self, vertex: usize) -> (f64, f64) {
        let (r, c) = self.vertex_index(vertex);
        (c as f64 * self.spacing.0, r as f64 * self.spacing.1)
    }


    /**
     * Whether a vertex lies on the boundary. Periodic meshes have none.
     */
    pub fn is_boundary_vertex(&self, vertex: usize) -> bool {
        let (r, c) = self.vertex_index(vertex);
        !self.periodic && (r == 0 || r == self.ni || c == 0 || c == self.nj)
    }


    /**
     * Compute the median-dual geometry. Interior vertices own a `dx * dy`
     * control volume and interior edges a dual face of length `dy`
     * (horizontal edges, normal along x) or `dx` (vertical edges, normal
     * along y). On a bounded mesh, both are halved on the boundary, and
     * corner volumes are quartered.
     */
    pub fn geometry(&self) -> DualGeometry {
        let (dx, dy) = self.spacing;
        let num_horizontal = if self.periodic { self.ni * self.nj } else { (self.ni + 1) * self.nj };
        let row_weight = |r: usize| if !self.periodic && (r == 0 || r == self.ni) { 0.5 } else { 1.0 };
        let col_weight = |c: usize| if !self.periodic && (c == 0 || c == self.nj) { 0.5 } else { 1.0 };

        let vol = (0..self.num_vertices())
            .map(|v| self.vertex_index(v))
            .map(|(r, c)| dx * dy * row_weight(r) * col_weight(c))
            .collect();

        let mut s_mxx = vec![0.0; self.num_edges()];
        let mut s_myy = vec![0.0; self.num_edges()];

        for e in 0..self.num_edges() {
            if e < num_horizontal {
                s_mxx[e] = dy * row_weight(e / self.nj);
            } else {
                s_myy[e] = dx * col_weight((e - num_horizontal) % self.vertex_columns());
            }
        }
        DualGeometry {
            vol: Field::from_elements(Location::Vertex, vol),
            s_mxx: Field::from_elements(Location::Edge, s_mxx),
            s_myy: Field::from_elements(Location::Edge, s_myy),
        }
    }


    /**
     * Register the provided tables into a mesh and derive the vertex tables
     * from them: a signed vertex-to-edge table with `max_vertex_edges`
     * slots, and a vertex-to-cell table.
     */
    pub fn mesh(&self, max_vertex_edges: usize) -> Result<Mesh> {
        use Location::{Cell, Edge, Vertex};

        Mesh::builder()
            .from_provider(self, &[(Edge, Vertex), (Cell, Vertex), (Cell, Edge), (Cell, Cell)])?
            .derive_oriented_inverse(Edge, Vertex, Some(max_vertex_edges), |e| self.is_pole_edge(e))?
            .derive_inverse(Cell, Vertex, Some(4))?
            .build()
    }

    fn vertex_rows(&self) -> usize {
        if self.periodic { self.ni } else { self.ni + 1 }
    }

    fn vertex_columns(&self) -> usize {
        if self.periodic { self.nj } else { self.nj + 1 }
    }

    fn vertex_index(&self, vertex: usize) -> (usize, usize) {
        assert!(vertex < self.num_vertices(), "vertex {} out of range", vertex);
        (vertex / self.vertex_columns(), vertex % self.vertex_columns())
    }
}




// ============================================================================
impl MeshProvider for CartesianMesh {
    fn location_size(&self, location: Location) -> Option<usize> {
        match location {
            Location::Vertex => Some(self.num_vertices()),
            Location::Edge => Some(self.num_edges()),
            Location::Cell => Some(self.num_cells()),
        }
    }

    fn neighbor_source(&self, from: Location, to: Location) -> Option<&dyn NeighborSource> {
        match (from, to) {
            (Location::Edge, Location::Vertex) => Some(&self.edge_to_vertex),
            (Location::Cell, Location::Vertex) => Some(&self.cell_to_vertex),
            (Location::Cell, Location::Edge) => Some(&self.cell_to_edge),
            (Location::Cell, Location::Cell) => Some(&self.cell_to_cell),
            _ => None,
        }
    }

    fn max_neighbors(&self, from: Location, _to: Location) -> Option<usize> {
        match from {
            Location::Edge => Some(2),
            Location::Cell => Some(4),
            Location::Vertex => None,
        }
    }

    fn has_skip_values(&self, from: Location, to: Location) -> bool {
        !self.periodic && (from, to) == (Location::Cell, Location::Cell)
    }
}

fn cells(rows: usize, cols: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..rows).flat_map(move |r| (0..cols).map(move |c| (r, c)))
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use approx::assert_relative_eq;
    use crate::location::{Cell, Edge, Vertex};

    #[test]
    fn periodic_three_by_three_mesh_has_the_expected_tables() {
        let grid = CartesianMesh::periodic(3, 3, (1.0, 1.0));
        assert_eq!(grid.num_vertices(), 9);
        assert_eq!(grid.num_edges(), 18);
        assert_eq!(grid.num_cells(), 9);
        assert_eq!(grid.cell_to_cell()[0], [6, 1, 3, 2]);
        assert_eq!(grid.cell_to_cell()[1], [7, 2, 4, 0]);
        assert_eq!(grid.cell_to_cell()[3], [0, 4, 6, 5]);
        assert_eq!(grid.edge_to_vertex()[0], [0, 1]);
        assert_eq!(grid.edge_to_vertex()[9], [0, 3]);
        assert_eq!(grid.edge_to_vertex()[15], [6, 0]);
        assert_eq!(grid.cell_to_vertex()[8], [8, 6, 2, 0]);
        assert_eq!(grid.cell_to_edge()[0], [0, 10, 3, 9]);
    }

    #[test]
    fn periodic_three_by_three_mesh_serves_dense_cell_and_edge_tables() {
        let grid = CartesianMesh::periodic(3, 3, (1.0, 1.0));
        assert!(grid.is_periodic());
        assert_eq!(grid.spacing(), (1.0, 1.0));

        let mesh = grid.mesh(4).unwrap();
        let c2c = mesh.connectivity::<Cell, Cell>().unwrap();
        assert_eq!(c2c.size(), 9);
        assert_eq!(c2c.max_neighbors(), 4);
        assert_eq!(c2c.skip_value(), -1);
        assert!(!c2c.has_skip_values());
        let mut neighbors: Vec<i32> = c2c.neighbors(0).map(|n| n.index).collect();
        neighbors.sort();
        assert_eq!(neighbors, vec![1, 2, 3, 6]);

        let e2v = mesh.connectivity::<Edge, Vertex>().unwrap();
        assert_eq!(e2v.size(), 18);
        assert_eq!(e2v.max_neighbors(), 2);
        assert_eq!(e2v.neighbors(0).map(|n| n.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn bounded_mesh_reports_its_spacing() {
        let grid = CartesianMesh::bounded(2, 3, (0.5, 0.25));
        assert!(!grid.is_periodic());
        assert_eq!(grid.spacing(), (0.5, 0.25));
    }

    #[test]
    fn prototype_mesh_sums_vertex_indexes_per_cell() {
        let grid = CartesianMesh::prototype();
        let mesh = grid.mesh(4).unwrap();
        let c2v = mesh.connectivity::<Cell, Vertex>().unwrap();
        let sums: Vec<i32> = (0..4).map(|c| c2v.neighbors(c).map(|n| n.index).sum()).collect();
        assert_eq!(sums, vec![8, 12, 20, 24]);
    }

    #[test]
    fn bounded_mesh_has_skip_values_on_boundary_cells() {
        let grid = CartesianMesh::bounded(2, 3, (1.0, 1.0));
        assert_eq!(grid.cell_to_cell()[0], [-1, 1, 3, -1]);
        assert_eq!(grid.cell_to_cell()[4], [1, 5, -1, 3]);

        let mesh = grid.mesh(4).unwrap();
        let c2c = mesh.connectivity::<Cell, Cell>().unwrap();
        assert!(c2c.has_skip_values());
        assert_eq!(c2c.neighbors(0).count(), 2);
        assert!(!mesh.connectivity::<Edge, Vertex>().unwrap().has_skip_values());
    }

    #[test]
    fn vertex_tables_are_derived_with_signs() {
        let grid = CartesianMesh::bounded(2, 2, (1.0, 1.0));
        let mesh = grid.mesh(4).unwrap();
        let v2e = mesh.connectivity::<Vertex, Edge>().unwrap();
        assert_eq!(v2e.neighbors(0).count(), 2);
        assert_eq!(v2e.neighbors(4).count(), 4);
        assert!(v2e.neighbors(0).all(|n| n.sign == 1));
        assert!(v2e.neighbors(8).all(|n| n.sign == -1));
        assert_eq!(mesh.connectivity::<Vertex, Cell>().unwrap().neighbors(4).count(), 4);
    }

    #[test]
    fn every_periodic_vertex_has_four_edges() {
        let grid = CartesianMesh::periodic(4, 5, (1.0, 1.0));
        let mesh = grid.mesh(4).unwrap();
        let v2e = mesh.connectivity::<Vertex, Edge>().unwrap();
        for v in 0..grid.num_vertices() {
            assert_eq!(v2e.neighbors(v).count(), 4);
            assert_eq!(v2e.neighbors(v).map(|n| n.sign as i32).sum::<i32>(), 0);
        }
    }

    #[test]
    fn dual_volumes_tile_the_domain() {
        let grid = CartesianMesh::bounded(3, 4, (0.5, 2.0));
        let geometry = grid.geometry();
        let total: f64 = geometry.vol.iter().sum();
        assert_relative_eq!(total, 3.0 * 2.0 * 4.0 * 0.5);
        assert_relative_eq!(*geometry.vol.at(0, 0), 0.25);
        assert_relative_eq!(*geometry.s_mxx.at(0, 0), 1.0);
        assert_relative_eq!(*geometry.s_mxx.at(4, 0), 2.0);
        assert_relative_eq!(*geometry.s_myy.at(4, 0), 0.0);
    }

    #[test]
    fn vertex_positions_follow_the_spacing() {
        let grid = CartesianMesh::periodic(3, 4, (0.5, 2.0));
        assert_eq!(grid.vertex_position(6), (1.0, 2.0));
        assert!(!grid.is_boundary_vertex(0));
        assert!(CartesianMesh::prototype().is_boundary_vertex(3));
        assert!(!CartesianMesh::prototype().is_boundary_vertex(4));
    }
}
