use log::debug;
use rayon::prelude::*;
use crate::composite::{Axis, Composite, Cursor};
use crate::connectivity::{Connectivity, NeighborTable};
use crate::error::{Error, Result};
use crate::execution::Execution;
use crate::field::{Field, FieldView, FieldViewMut};
use crate::iteration::{for_each_element, sum_neighbors, IndirectAccess};
use crate::layout::Dim;
use crate::location::{Edge, Location, Vertex};
use crate::mesh::Mesh;




/**
 * The caller-allocated fields of the nabla kernel. `s_*` and `zavgs_*` are
 * defined over edges; `pp`, `pnabla_*` and `vol` over vertices. The number
 * of vertical levels is taken from `pnabla_mxx`; every output must have
 * that many levels, and inputs either as many or no level dimension at all
 * (in which case their single value is used on every level).
 */
pub struct NablaFields<'a> {
    pub s_mxx: FieldView<'a, f64>,
    pub s_myy: FieldView<'a, f64>,
    pub zavgs_mxx: FieldViewMut<'a, f64>,
    pub zavgs_myy: FieldViewMut<'a, f64>,
    pub pp: FieldView<'a, f64>,
    pub pnabla_mxx: FieldViewMut<'a, f64>,
    pub pnabla_myy: FieldViewMut<'a, f64>,
    pub vol: FieldView<'a, f64>,
}




/**
 * Where the orientation of an edge relative to a vertex comes from: the
 * signs embedded in a signed vertex->edge connectivity, or a separate field
 * over `[vertex, neighbor]` (optionally with levels), read at the same slot
 * as the neighbor table.
 */
#[derive(Clone, Debug)]
pub enum SignSource<'a> {
    Connectivity,
    Field(FieldView<'a, f64>),
}




#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Table,
    Sx,
    Sy,
    Zx,
    Zy,
    Nx,
    Ny,
    Vol,
}




/**
 * Compute the gradient of `pp` on a single thread: first the edge phase over
 * all edges, then the vertex phase over all vertices.
 */
pub fn nabla_sequential(mesh: &Mesh, fields: &mut NablaFields, sign: &SignSource) -> Result<()> {
    let plan = Plan::new(mesh, fields, sign)?;
    let NablaFields { s_mxx, s_myy, zavgs_mxx, zavgs_myy, pp, pnabla_mxx, pnabla_myy, vol } = fields;

    let edges = EdgePhase::new(&plan, pp, s_mxx, s_myy, zavgs_mxx, zavgs_myy)?;
    debug!("nabla edge phase: {} edges x {} levels (sequential)", plan.num_edges, plan.num_levels);

    for_each_element(&edges.composite, 0..plan.num_edges, |_, cursor| {
        for k in 0..plan.num_levels {
            let cursor = cursor.shifted(Axis::Level, k as i64);
            let (x, y) = edges.eval(cursor, k);
            *zavgs_mxx.get_mut(cursor.ptr(Slot::Zx)) = x;
            *zavgs_myy.get_mut(cursor.ptr(Slot::Zy)) = y;
        }
    })?;

    let vertices = VertexPhase::new(&plan, zavgs_mxx, zavgs_myy, pnabla_mxx, pnabla_myy, vol, sign)?;
    debug!("nabla vertex phase: {} vertices x {} levels (sequential)", plan.num_vertices, plan.num_levels);

    for_each_element(&vertices.composite, 0..plan.num_vertices, |v, cursor| {
        for k in 0..plan.num_levels {
            let cursor = cursor.shifted(Axis::Level, k as i64);
            let (x, y) = vertices.eval(cursor, v, k);
            *pnabla_mxx.get_mut(cursor.ptr(Slot::Nx)) = x;
            *pnabla_myy.get_mut(cursor.ptr(Slot::Ny)) = y;
        }
    })
}




/**
 * Compute the gradient of `pp` with one task per edge, then one task per
 * vertex, on the current Rayon pool. The vertex phase starts only after
 * every edge task has finished. Each task writes only the block of its own
 * element, so the output fields must have location-major layouts; this is
 * checked before anything is written.
 */
pub fn nabla_parallel(mesh: &Mesh, fields: &mut NablaFields, sign: &SignSource) -> Result<()> {
    let plan = Plan::new(mesh, fields, sign)?;
    let NablaFields { s_mxx, s_myy, zavgs_mxx, zavgs_myy, pp, pnabla_mxx, pnabla_myy, vol } = fields;

    for output in [&*zavgs_mxx, &*zavgs_myy, &*pnabla_mxx, &*pnabla_myy] {
        output.check_blocked()?;
    }

    let edges = EdgePhase::new(&plan, pp, s_mxx, s_myy, zavgs_mxx, zavgs_myy)?;
    let (kx, ky) = (level_stride(zavgs_mxx), level_stride(zavgs_myy));
    debug!("nabla edge phase: {} edges x {} levels (parallel)", plan.num_edges, plan.num_levels);

    zavgs_mxx
        .par_blocks_mut()?
        .zip(zavgs_myy.par_blocks_mut()?)
        .enumerate()
        .for_each(|(e, (zx, zy))| {
            let cursor = edges.composite.at(e);
            for k in 0..plan.num_levels {
                let (x, y) = edges.eval(cursor.shifted(Axis::Level, k as i64), k);
                zx[k * kx] = x;
                zy[k * ky] = y;
            }
        });

    let vertices = VertexPhase::new(&plan, zavgs_mxx, zavgs_myy, pnabla_mxx, pnabla_myy, vol, sign)?;
    let (kx, ky) = (level_stride(pnabla_mxx), level_stride(pnabla_myy));
    debug!("nabla vertex phase: {} vertices x {} levels (parallel)", plan.num_vertices, plan.num_levels);

    pnabla_mxx
        .par_blocks_mut()?
        .zip(pnabla_myy.par_blocks_mut()?)
        .enumerate()
        .for_each(|(v, (nx, ny))| {
            let cursor = vertices.composite.at(v);
            for k in 0..plan.num_levels {
                let (x, y) = vertices.eval(cursor.shifted(Axis::Level, k as i64), v, k);
                nx[k * kx] = x;
                ny[k * ky] = y;
            }
        });
    Ok(())
}




/**
 * Compute the gradient of `pp` with the given execution.
 */
pub fn nabla(mesh: &Mesh, fields: &mut NablaFields, sign: &SignSource, execution: &Execution) -> Result<()> {
    if execution.is_parallel() {
        execution.install(|| nabla_parallel(mesh, fields, sign))?
    } else {
        nabla_sequential(mesh, fields, sign)
    }
}




// ============================================================================
struct Plan<'m> {
    e2v: &'m Connectivity,
    v2e: &'m Connectivity,
    num_edges: usize,
    num_vertices: usize,
    num_levels: usize,
}

impl<'m> Plan<'m> {
    fn new(mesh: &'m Mesh, fields: &NablaFields, sign: &SignSource) -> Result<Self> {
        let e2v = mesh.connectivity::<Edge, Vertex>()?;
        let v2e = mesh.connectivity::<Vertex, Edge>()?;
        let num_edges = mesh.location_size::<Edge>()?;
        let num_vertices = mesh.location_size::<Vertex>()?;
        let num_levels = fields.pnabla_mxx.num_levels();

        for (what, field, output) in [
            ("s_mxx", &fields.s_mxx.as_view(), false),
            ("s_myy", &fields.s_myy.as_view(), false),
            ("zavgs_mxx", &fields.zavgs_mxx.as_view(), true),
            ("zavgs_myy", &fields.zavgs_myy.as_view(), true),
        ] {
            check_field(what, field, Location::Edge, num_edges, num_levels, output)?;
        }
        for (what, field, output) in [
            ("pp", &fields.pp.as_view(), false),
            ("vol", &fields.vol.as_view(), false),
            ("pnabla_mxx", &fields.pnabla_mxx.as_view(), true),
            ("pnabla_myy", &fields.pnabla_myy.as_view(), true),
        ] {
            check_field(what, field, Location::Vertex, num_vertices, num_levels, output)?;
        }

        match sign {
            SignSource::Connectivity => {
                if !matches!(v2e.neighbor_table(), NeighborTable::Signed(_)) {
                    return Err(Error::UnsignedConnectivity { from: Location::Vertex, to: Location::Edge })
                }
            }
            SignSource::Field(signs) => {
                check_field("sign", signs, Location::Vertex, num_vertices, num_levels, false)?;
                let slots = signs.layout().upper_bound(Dim::Neighbor)?;
                if slots < v2e.max_neighbors() {
                    return Err(Error::ShapeMismatch {
                        what: "sign neighbor slots",
                        expected: v2e.max_neighbors(),
                        found: slots,
                    })
                }
            }
        }
        Ok(Self { e2v, v2e, num_edges, num_vertices, num_levels })
    }
}

fn check_field(what: &'static str, field: &FieldView<f64>, location: Location, size: usize, num_levels: usize, output: bool) -> Result<()> {
    field.expect_location(location)?;

    if field.size() != size {
        return Err(Error::ShapeMismatch { what, expected: size, found: field.size() })
    }
    let broadcast = !output && !field.layout().has_dim(Dim::K);

    if field.num_levels() != num_levels && !broadcast {
        return Err(Error::ShapeMismatch { what, expected: num_levels, found: field.num_levels() })
    }
    Ok(())
}

fn level_stride<S>(field: &Field<f64, S>) -> usize
where
    S: AsRef<[f64]>,
{
    field.layout().stride_or_zero(Dim::K)
}




// ============================================================================
struct EdgePhase<'a> {
    e2v: &'a Connectivity,
    composite: Composite<Slot, 5>,
    access: IndirectAccess,
    pp: &'a FieldView<'a, f64>,
    s_mxx: &'a FieldView<'a, f64>,
    s_myy: &'a FieldView<'a, f64>,
}

impl<'a> EdgePhase<'a> {
    fn new(
        plan: &Plan<'a>,
        pp: &'a FieldView<'a, f64>,
        s_mxx: &'a FieldView<'a, f64>,
        s_myy: &'a FieldView<'a, f64>,
        zavgs_mxx: &FieldViewMut<f64>,
        zavgs_myy: &FieldViewMut<f64>,
    ) -> Result<Self> {
        let composite = Composite::new(Location::Edge, [
            (Slot::Table, plan.e2v.layout()),
            (Slot::Sx, s_mxx.layout()),
            (Slot::Sy, s_myy.layout()),
            (Slot::Zx, zavgs_mxx.layout()),
            (Slot::Zy, zavgs_myy.layout()),
        ])?;
        Ok(Self {
            e2v: plan.e2v,
            composite,
            access: IndirectAccess::new(pp, Location::Vertex)?,
            pp,
            s_mxx,
            s_myy,
        })
    }

    /// Returns `(s_mxx, s_myy)` scaled by the mean of `pp` over the edge's
    /// endpoints, for the edge and level the cursor is positioned at.
    fn eval(&self, cursor: Cursor<Slot, 5>, k: usize) -> (f64, f64) {
        let row = self.e2v.row_at(cursor.ptr(Slot::Table));
        let zavg = 0.5 * sum_neighbors(&row, |n| *self.access.read(self.pp, n.index, k));
        (self.s_mxx.get(cursor.ptr(Slot::Sx)) * zavg, self.s_myy.get(cursor.ptr(Slot::Sy)) * zavg)
    }
}




// ============================================================================
enum Signs<'a> {
    Table,
    Field(&'a FieldView<'a, f64>, Composite<(), 1>),
}

struct VertexPhase<'a> {
    v2e: &'a Connectivity,
    composite: Composite<Slot, 4>,
    zx: IndirectAccess,
    zy: IndirectAccess,
    zavgs_mxx: &'a FieldViewMut<'a, f64>,
    zavgs_myy: &'a FieldViewMut<'a, f64>,
    vol: &'a FieldView<'a, f64>,
    signs: Signs<'a>,
}

impl<'a> VertexPhase<'a> {
    fn new(
        plan: &Plan<'a>,
        zavgs_mxx: &'a FieldViewMut<'a, f64>,
        zavgs_myy: &'a FieldViewMut<'a, f64>,
        pnabla_mxx: &FieldViewMut<f64>,
        pnabla_myy: &FieldViewMut<f64>,
        vol: &'a FieldView<'a, f64>,
        sign: &'a SignSource<'a>,
    ) -> Result<Self> {
        let composite = Composite::new(Location::Vertex, [
            (Slot::Table, plan.v2e.layout()),
            (Slot::Nx, pnabla_mxx.layout()),
            (Slot::Ny, pnabla_myy.layout()),
            (Slot::Vol, vol.layout()),
        ])?;
        let signs = match sign {
            SignSource::Connectivity => Signs::Table,
            SignSource::Field(field) => Signs::Field(field, Composite::new(Location::Vertex, [((), field.layout())])?),
        };
        Ok(Self {
            v2e: plan.v2e,
            composite,
            zx: IndirectAccess::new(zavgs_mxx, Location::Edge)?,
            zy: IndirectAccess::new(zavgs_myy, Location::Edge)?,
            zavgs_mxx,
            zavgs_myy,
            vol,
            signs,
        })
    }

    /// Returns the sign-weighted sums of `zavgs_*` over the edges incident
    /// to vertex `v`, divided by its volume, at level `k`.
    fn eval(&self, cursor: Cursor<Slot, 4>, v: usize, k: usize) -> (f64, f64) {
        let row = self.v2e.row_at(cursor.ptr(Slot::Table));
        let mut xx = 0.0;
        let mut yy = 0.0;

        for (slot, n) in row.valid() {
            let sign = match &self.signs {
                Signs::Table => n.sign as f64,
                Signs::Field(field, composite) => {
                    let ptr = composite
                        .at(v)
                        .shifted(Axis::Level, k as i64)
                        .shifted(Axis::Neighbor, slot as i64)
                        .ptr(());
                    *field.get(ptr)
                }
            };
            xx += sign * self.zx.read(self.zavgs_mxx, n.index, k);
            yy += sign * self.zy.read(self.zavgs_myy, n.index, k);
        }
        let vol = *self.vol.get(cursor.ptr(Slot::Vol));
        (xx / vol, yy / vol)
    }
}
