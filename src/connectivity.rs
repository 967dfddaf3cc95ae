use log::{debug, warn};
use crate::error::{Error, Result};
use crate::field::Field;
use crate::layout::{shifted, Dim, Ptr, StridedLayout};
use crate::location::Location;




/// The sentinel marking an empty slot in a padded neighbor table.
pub const SKIP_VALUE: i32 = -1;




/**
 * One slot of a neighbor table: the index of a target element and the
 * orientation of the target relative to the source element. Unsigned tables
 * report a sign of +1.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Neighbor {
    pub index: i32,
    pub sign: i8,
}

impl Neighbor {

    pub const SKIP: Neighbor = Neighbor { index: SKIP_VALUE, sign: 1 };

    pub fn new(index: i32) -> Self {
        Self { index, sign: 1 }
    }

    pub fn signed(index: i32, sign: i8) -> Self {
        Self { index, sign }
    }

    pub fn is_skip(&self) -> bool {
        self.index == SKIP_VALUE
    }
}




/// A raw, row-oriented description of a neighbor relation, as handed over by
/// a mesh provider. Rows may have different lengths; slots equal to
/// `missing_value` denote absent neighbors.
///
pub trait NeighborSource {
    /// Return the number of rows (source elements).
    fn rows(&self) -> usize;

    /// Return the number of entries in the given row.
    fn cols(&self, row: usize) -> usize;

    /// Return the entry at the given row and column.
    fn value(&self, row: usize, col: usize) -> i32;

    /// Return the marker for an absent neighbor.
    fn missing_value(&self) -> i32 {
        SKIP_VALUE
    }
}

impl NeighborSource for [Vec<i32>] {
    fn rows(&self) -> usize {
        self.len()
    }

    fn cols(&self, row: usize) -> usize {
        self[row].len()
    }

    fn value(&self, row: usize, col: usize) -> i32 {
        self[row][col]
    }
}

impl<const M: usize> NeighborSource for [[i32; M]] {
    fn rows(&self) -> usize {
        self.len()
    }

    fn cols(&self, _row: usize) -> usize {
        M
    }

    fn value(&self, row: usize, col: usize) -> i32 {
        self[row][col]
    }
}

impl<T> NeighborSource for Vec<T>
where
    [T]: NeighborSource,
{
    fn rows(&self) -> usize {
        self.as_slice().rows()
    }

    fn cols(&self, row: usize) -> usize {
        self.as_slice().cols(row)
    }

    fn value(&self, row: usize, col: usize) -> i32 {
        self.as_slice().value(row, col)
    }
}




/**
 * The storage flavors of a neighbor table. Every flavor is laid out over
 * `[from, neighbor]`.
 *
 * - `Primary`: the trivial self-connectivity, element `i` has the single
 *   neighbor `i`. No storage; a position is the element index itself.
 * - `Dense`: fixed degree, every slot holds a valid index.
 * - `Jagged`: rows padded with `SKIP_VALUE`.
 * - `Signed`: rows padded with `Neighbor::SKIP`, each slot carries a sign.
 */
#[derive(Clone, Debug)]
pub enum NeighborTable {
    Primary(StridedLayout),
    Dense(Field<i32>),
    Jagged(Field<i32>),
    Signed(Field<Neighbor>),
}

impl NeighborTable {

    pub fn layout(&self) -> &StridedLayout {
        match self {
            NeighborTable::Primary(layout) => layout,
            NeighborTable::Dense(field) | NeighborTable::Jagged(field) => field.layout(),
            NeighborTable::Signed(field) => field.layout(),
        }
    }

    /**
     * Return the neighbor stored at a position of the table.
     */
    pub fn get(&self, ptr: Ptr) -> Neighbor {
        match self {
            NeighborTable::Primary(_) => Neighbor::new(ptr.0 as i32),
            NeighborTable::Dense(field) | NeighborTable::Jagged(field) => Neighbor::new(*field.get(ptr)),
            NeighborTable::Signed(field) => *field.get(ptr),
        }
    }

    pub fn has_skip_values(&self) -> bool {
        matches!(self, NeighborTable::Jagged(_) | NeighborTable::Signed(_))
    }
}




/**
 * The neighbor relation from the elements of one location to those of
 * another, stored as a rectangular table with `max_neighbors` slots per row.
 *
 * Invariants, established by every constructor: the table has `size` rows
 * and `max_neighbors` columns, and every slot holds either `SKIP_VALUE` or a
 * target index in `0..target_size`.
 */
#[derive(Clone, Debug)]
pub struct Connectivity {
    from: Location,
    to: Location,
    size: usize,
    max_neighbors: usize,
    target_size: usize,
    table: NeighborTable,
}




// ============================================================================
impl Connectivity {


    /**
     * The trivial connectivity of a location to its own index space.
     */
    pub fn primary(location: Location, size: usize) -> Self {
        let layout = StridedLayout::new(0, &[
            (location.into(), 1, size),
            (Dim::Neighbor, 0, 1),
        ]);
        Self {
            from: location,
            to: location,
            size,
            max_neighbors: 1,
            target_size: size,
            table: NeighborTable::Primary(layout),
        }
    }


    /**
     * Build a padded table from a raw source. Up to `max_neighbors` entries
     * of each row are copied; longer rows are truncated, shorter rows padded
     * with `SKIP_VALUE`. The source's missing marker becomes `SKIP_VALUE`.
     * Any other entry outside `0..target_size` aborts construction.
     */
    pub fn build<S>(source: &S, from: Location, to: Location, target_size: usize, max_neighbors: usize) -> Result<Self>
    where
        S: NeighborSource + ?Sized,
    {
        let size = source.rows();
        let missing = source.missing_value();

        let data = table_data(size, max_neighbors, |row, col| {
            if col >= source.cols(row) {
                return Ok(SKIP_VALUE)
            }
            let index = source.value(row, col);
            if index == missing {
                return Ok(SKIP_VALUE)
            }
            check_index(from, to, row, col, index, target_size)
        })?;

        warn_truncated(source, from, to, max_neighbors);
        let table = NeighborTable::Jagged(Field::from_vec(from, table_layout(from, size, max_neighbors), data)?);
        debug!("built {}->{} connectivity ({} x {})", from, to, size, max_neighbors);
        Ok(Self { from, to, size, max_neighbors, target_size, table })
    }


    /**
     * Build a fixed-degree table from a raw source. Every row must provide
     * at least `max_neighbors` valid entries; a short row or a missing
     * marker is a construction error. Longer rows are truncated, as in
     * `build`.
     */
    pub fn dense<S>(source: &S, from: Location, to: Location, target_size: usize, max_neighbors: usize) -> Result<Self>
    where
        S: NeighborSource + ?Sized,
    {
        let size = source.rows();
        let missing = source.missing_value();

        let data = table_data(size, max_neighbors, |row, col| {
            if col >= source.cols(row) || source.value(row, col) == missing {
                return Err(Error::MissingNeighbor { from, to, row, col })
            }
            check_index(from, to, row, col, source.value(row, col), target_size)
        })?;

        warn_truncated(source, from, to, max_neighbors);
        let table = NeighborTable::Dense(Field::from_vec(from, table_layout(from, size, max_neighbors), data)?);
        debug!("built dense {}->{} connectivity ({} x {})", from, to, size, max_neighbors);
        Ok(Self { from, to, size, max_neighbors, target_size, table })
    }


    /**
     * Build a signed table from explicit rows of neighbors. Rows longer than
     * `max_neighbors` are a construction error here, since dropping an
     * oriented neighbor would silently change a reduction.
     */
    pub fn from_neighbors(
        rows: &[Vec<Neighbor>],
        from: Location,
        to: Location,
        target_size: usize,
        max_neighbors: usize,
    ) -> Result<Self> {
        let size = rows.len();

        if let Some(widest) = rows.iter().map(Vec::len).max().filter(|&w| w > max_neighbors) {
            return Err(Error::ShapeMismatch {
                what: "signed neighbor count",
                expected: max_neighbors,
                found: widest,
            })
        }
        let data = table_data(size, max_neighbors, |row, col| {
            match rows[row].get(col) {
                None => Ok(Neighbor::SKIP),
                Some(n) if n.is_skip() => Ok(Neighbor::SKIP),
                Some(n) => check_index(from, to, row, col, n.index, target_size).map(|i| Neighbor::signed(i, n.sign)),
            }
        })?;

        let table = NeighborTable::Signed(Field::from_vec(from, table_layout(from, size, max_neighbors), data)?);
        debug!("built signed {}->{} connectivity ({} x {})", from, to, size, max_neighbors);
        Ok(Self { from, to, size, max_neighbors, target_size, table })
    }


    /**
     * Return a signed copy of this connectivity, with the sign of each
     * valid slot given by `sign(row, slot, index)`.
     */
    pub fn with_signs<F>(&self, sign: F) -> Result<Self>
    where
        F: Fn(usize, usize, i32) -> i8,
    {
        let rows: Vec<Vec<Neighbor>> = (0..self.size)
            .map(|row| {
                self.row(row)
                    .slots()
                    .enumerate()
                    .map(|(slot, n)| if n.is_skip() { n } else { Neighbor::signed(n.index, sign(row, slot, n.index)) })
                    .collect()
            })
            .collect();
        Self::from_neighbors(&rows, self.from, self.to, self.target_size, self.max_neighbors)
    }


    /**
     * Derive the inverse (`to -> from`) connectivity. Each target row lists
     * the source elements referring to it in ascending source order, with
     * multiplicity. Rows are padded to `max_neighbors`, or to the widest
     * row if `None`.
     */
    pub fn inverse(&self, max_neighbors: Option<usize>) -> Result<Self> {
        let buckets = self.buckets(|_, _| 1);
        let width = bucket_width(&buckets, max_neighbors)?;
        let rows: Vec<Vec<i32>> = buckets
            .into_iter()
            .map(|bucket| bucket.into_iter().map(|n| n.index).collect())
            .collect();
        debug!("derived {}->{} as inverse of {}->{}", self.to, self.from, self.from, self.to);
        Self::build(&rows[..], self.to, self.from, self.size, width)
    }


    /**
     * Derive the signed inverse of a two-endpoint relation such as
     * `edge -> vertex`. A target gets sign +1 relative to a source if it is
     * the source's first endpoint, or if `is_pole(source)` holds, and -1
     * otherwise.
     */
    pub fn oriented_inverse<P>(&self, max_neighbors: Option<usize>, is_pole: P) -> Result<Self>
    where
        P: Fn(usize) -> bool,
    {
        let buckets = self.buckets(|source, index| {
            let first = self.row(source).slot(0).index;
            if index == first || is_pole(source) { 1 } else { -1 }
        });
        let width = bucket_width(&buckets, max_neighbors)?;
        debug!("derived oriented {}->{} from {}->{}", self.to, self.from, self.from, self.to);
        Self::from_neighbors(&buckets, self.to, self.from, self.size, width)
    }


    /**
     * Compose this `from -> mid` connectivity with a `mid -> to` one. Each
     * row of the result holds the distinct targets reachable in two steps,
     * in ascending order.
     */
    pub fn compose(&self, other: &Connectivity, max_neighbors: Option<usize>) -> Result<Self> {
        if self.to != other.from {
            return Err(Error::InvalidLocation { expected: self.to, found: other.from })
        }
        let rows: Vec<Vec<i32>> = (0..self.size)
            .map(|row| {
                let mut targets: Vec<i32> = self
                    .neighbors(row)
                    .flat_map(|mid| other.neighbors(mid.index as usize))
                    .map(|n| n.index)
                    .collect();
                targets.sort_unstable();
                targets.dedup();
                targets
            })
            .collect();

        let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
        let width = match max_neighbors {
            Some(max) if widest > max => {
                return Err(Error::ShapeMismatch { what: "composed neighbor count", expected: max, found: widest })
            }
            Some(max) => max,
            None => widest,
        };
        debug!("composed {}->{}->{}", self.from, self.to, other.to);
        Self::build(&rows[..], self.from, other.to, other.target_size, width)
    }

    pub fn from(&self) -> Location {
        self.from
    }

    pub fn to(&self) -> Location {
        self.to
    }

    /// Number of source elements (rows).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of slots in every row.
    pub fn max_neighbors(&self) -> usize {
        self.max_neighbors
    }

    pub fn skip_value(&self) -> i32 {
        SKIP_VALUE
    }

    /// Number of target elements; every valid index is below this.
    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn neighbor_table(&self) -> &NeighborTable {
        &self.table
    }

    pub fn layout(&self) -> &StridedLayout {
        self.table.layout()
    }

    pub fn has_skip_values(&self) -> bool {
        self.table.has_skip_values()
    }


    /**
     * Return the row of the given source element.
     */
    pub fn row(&self, element: usize) -> NeighborRow<'_> {
        assert!(element < self.size, "element {} out of range on {}->{} connectivity of size {}",
            element, self.from, self.to, self.size);
        let stride = self.layout().stride_or_zero(self.from.into());
        self.row_at(shifted(self.layout().origin(), stride, element as i64))
    }


    /**
     * Return the row starting at a position of the table, e.g. the position
     * held by a composite cursor.
     */
    pub fn row_at(&self, start: Ptr) -> NeighborRow<'_> {
        NeighborRow {
            table: &self.table,
            start,
            stride: self.layout().stride_or_zero(Dim::Neighbor),
            width: self.max_neighbors,
        }
    }


    /**
     * Return an iterator over the valid neighbors of a source element, in
     * slot order.
     */
    pub fn neighbors(&self, element: usize) -> impl Iterator<Item = Neighbor> + '_ {
        self.row(element).valid().map(|(_, n)| n)
    }

    fn buckets<F>(&self, sign: F) -> Vec<Vec<Neighbor>>
    where
        F: Fn(usize, i32) -> i8,
    {
        let mut buckets = vec![Vec::new(); self.target_size];

        for source in 0..self.size {
            for n in self.neighbors(source) {
                buckets[n.index as usize].push(Neighbor::signed(source as i32, sign(source, n.index)));
            }
        }
        buckets
    }
}




/**
 * A view of one row of a neighbor table.
 */
#[derive(Clone, Copy, Debug)]
pub struct NeighborRow<'a> {
    table: &'a NeighborTable,
    start: Ptr,
    stride: usize,
    width: usize,
}

impl<'a> NeighborRow<'a> {

    /// Number of slots, including padding.
    pub fn len(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0
    }

    pub fn slot(&self, slot: usize) -> Neighbor {
        assert!(slot < self.width, "slot {} out of range on row of width {}", slot, self.width);
        self.table.get(shifted(self.start, self.stride, slot as i64))
    }

    /**
     * Return an iterator over every slot, padding included.
     */
    pub fn slots(&self) -> impl Iterator<Item = Neighbor> + 'a {
        let row = *self;
        (0..row.width).map(move |slot| row.slot(slot))
    }

    /**
     * Return an iterator over the occupied slots and their slot numbers.
     */
    pub fn valid(&self) -> impl Iterator<Item = (usize, Neighbor)> + 'a {
        self.slots().enumerate().filter(|(_, n)| !n.is_skip())
    }
}




// ============================================================================
fn table_layout(from: Location, size: usize, max_neighbors: usize) -> StridedLayout {
    StridedLayout::row_major(&[(from.into(), size), (Dim::Neighbor, max_neighbors)])
}

fn table_data<T, F>(size: usize, max_neighbors: usize, mut f: F) -> Result<Vec<T>>
where
    F: FnMut(usize, usize) -> Result<T>,
{
    let mut data = Vec::with_capacity(size * max_neighbors);

    for row in 0..size {
        for col in 0..max_neighbors {
            data.push(f(row, col)?);
        }
    }
    Ok(data)
}

fn check_index(from: Location, to: Location, row: usize, col: usize, index: i32, size: usize) -> Result<i32> {
    if index < 0 || index as usize >= size {
        Err(Error::NeighborOutOfRange { from, to, row, col, index: index as i64, size })
    } else {
        Ok(index)
    }
}

fn warn_truncated<S>(source: &S, from: Location, to: Location, max_neighbors: usize) -> usize
where
    S: NeighborSource + ?Sized,
{
    let truncated = (0..source.rows()).filter(|&row| source.cols(row) > max_neighbors).count();

    if truncated > 0 {
        warn!("{}->{}: {} rows truncated to {} neighbors", from, to, truncated, max_neighbors);
    }
    truncated
}

fn bucket_width(buckets: &[Vec<Neighbor>], max_neighbors: Option<usize>) -> Result<usize> {
    let widest = buckets.iter().map(Vec::len).max().unwrap_or(0);

    match max_neighbors {
        Some(max) if widest > max => Err(Error::ShapeMismatch {
            what: "inverse neighbor count",
            expected: max,
            found: widest,
        }),
        Some(max) => Ok(max),
        None => Ok(widest),
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use Location::{Cell, Edge, Vertex};

    fn triangle_edges() -> Vec<[i32; 2]> {
        vec![[0, 1], [1, 2], [2, 0], [1, 3]]
    }

    #[test]
    fn build_pads_short_rows_with_skip_value() {
        let rows = vec![vec![1, 2], vec![0], vec![]];
        let c = Connectivity::build(&rows[..], Cell, Cell, 3, 3).unwrap();
        assert_eq!(c.size(), 3);
        assert_eq!(c.max_neighbors(), 3);
        assert_eq!(c.skip_value(), -1);
        assert!(c.has_skip_values());
        let slots: Vec<_> = c.row(1).slots().map(|n| n.index).collect();
        assert_eq!(slots, vec![0, -1, -1]);
        assert_eq!(c.neighbors(2).count(), 0);
    }

    #[test]
    fn build_truncates_long_rows() {
        let rows = vec![vec![0, 1, 2, 3]];
        let c = Connectivity::build(&rows[..], Vertex, Edge, 4, 2).unwrap();
        assert_eq!(c.neighbors(0).map(|n| n.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn build_converts_the_source_missing_marker() {
        struct Source;

        impl NeighborSource for Source {
            fn rows(&self) -> usize { 1 }
            fn cols(&self, _: usize) -> usize { 2 }
            fn value(&self, _: usize, col: usize) -> i32 { if col == 0 { 9999 } else { 1 } }
            fn missing_value(&self) -> i32 { 9999 }
        }
        let c = Connectivity::build(&Source, Vertex, Edge, 2, 2).unwrap();
        assert_eq!(c.row(0).slot(0), Neighbor::SKIP);
        assert_eq!(c.row(0).slot(1), Neighbor::new(1));
    }

    #[test]
    fn out_of_range_index_aborts_construction() {
        let rows = vec![vec![0, 1], vec![1, 5]];
        assert_eq!(
            Connectivity::build(&rows[..], Edge, Vertex, 3, 2).unwrap_err(),
            Error::NeighborOutOfRange { from: Edge, to: Vertex, row: 1, col: 1, index: 5, size: 3 });

        let rows = vec![vec![0, -7]];
        assert!(Connectivity::build(&rows[..], Edge, Vertex, 3, 2).is_err());
    }

    #[test]
    fn dense_table_rejects_missing_neighbors() {
        let rows = vec![vec![0, 1], vec![2, -1]];
        assert_eq!(
            Connectivity::dense(&rows[..], Edge, Vertex, 3, 2).unwrap_err(),
            Error::MissingNeighbor { from: Edge, to: Vertex, row: 1, col: 1 });

        let rows = vec![vec![0, 1], vec![2]];
        assert!(Connectivity::dense(&rows[..], Edge, Vertex, 3, 2).is_err());

        let c = Connectivity::dense(&triangle_edges()[..], Edge, Vertex, 4, 2).unwrap();
        assert!(!c.has_skip_values());
    }

    #[test]
    fn dense_table_truncates_long_rows() {
        let rows = vec![vec![0, 1, 3], vec![1, 2]];
        assert_eq!(warn_truncated(&rows[..], Edge, Vertex, 2), 1);
        assert_eq!(warn_truncated(&rows[..], Edge, Vertex, 3), 0);

        let c = Connectivity::dense(&rows[..], Edge, Vertex, 4, 2).unwrap();
        assert_eq!(c.max_neighbors(), 2);
        assert_eq!(c.neighbors(0).map(|n| n.index).collect::<Vec<_>>(), vec![0, 1]);
        assert!(!c.has_skip_values());
    }

    #[test]
    fn primary_connectivity_maps_each_element_to_itself() {
        let c = Connectivity::primary(Cell, 5);
        assert_eq!(c.size(), 5);
        assert_eq!(c.max_neighbors(), 1);
        for i in 0..5 {
            assert_eq!(c.neighbors(i).collect::<Vec<_>>(), vec![Neighbor::new(i as i32)]);
        }
        let inverse = c.inverse(None).unwrap();
        assert_eq!(inverse.neighbors(3).map(|n| n.index).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn inverse_table_contains_every_forward_pair() {
        let e2v = Connectivity::dense(&triangle_edges()[..], Edge, Vertex, 4, 2).unwrap();
        let v2e = e2v.inverse(Some(4)).unwrap();
        assert_eq!(v2e.from(), Vertex);
        assert_eq!(v2e.to(), Edge);
        assert_eq!(v2e.size(), 4);
        assert_eq!(v2e.max_neighbors(), 4);

        for e in 0..e2v.size() {
            for v in e2v.neighbors(e) {
                assert!(v2e.neighbors(v.index as usize).any(|n| n.index == e as i32));
            }
        }
        assert_eq!(v2e.neighbors(1).map(|n| n.index).collect::<Vec<_>>(), vec![0, 1, 3]);
    }

    #[test]
    fn inverse_rows_are_in_ascending_source_order() {
        let rows = vec![vec![2], vec![0, 2], vec![2, 1], vec![2]];
        let c = Connectivity::build(&rows[..], Cell, Vertex, 3, 2).unwrap();
        let inverse = c.inverse(None).unwrap();
        assert_eq!(inverse.max_neighbors(), 4);
        assert_eq!(inverse.neighbors(2).map(|n| n.index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn inverse_wider_than_requested_is_an_error() {
        let e2v = Connectivity::dense(&triangle_edges()[..], Edge, Vertex, 4, 2).unwrap();
        assert!(matches!(e2v.inverse(Some(2)), Err(Error::ShapeMismatch { expected: 2, found: 3, .. })));
    }

    #[test]
    fn oriented_inverse_signs_first_endpoint_positive() {
        let e2v = Connectivity::dense(&triangle_edges()[..], Edge, Vertex, 4, 2).unwrap();
        let v2e = e2v.oriented_inverse(Some(7), |_| false).unwrap();
        let row: Vec<_> = v2e.neighbors(1).collect();
        assert_eq!(row, vec![
            Neighbor::signed(0, -1),
            Neighbor::signed(1, 1),
            Neighbor::signed(3, 1),
        ]);
        assert_eq!(v2e.row(1).slot(6), Neighbor::SKIP);
    }

    #[test]
    fn pole_edges_are_positive_at_both_endpoints() {
        let e2v = Connectivity::dense(&triangle_edges()[..], Edge, Vertex, 4, 2).unwrap();
        let v2e = e2v.oriented_inverse(None, |e| e == 0).unwrap();
        assert_eq!(v2e.neighbors(0).collect::<Vec<_>>(), vec![Neighbor::signed(0, 1), Neighbor::signed(2, -1)]);
        assert_eq!(v2e.neighbors(1).next(), Some(Neighbor::signed(0, 1)));
    }

    #[test]
    fn with_signs_keeps_padding() {
        let rows = vec![vec![1], vec![0, 1]];
        let c = Connectivity::build(&rows[..], Vertex, Edge, 2, 2).unwrap();
        let signed = c.with_signs(|row, slot, _| if row == slot { 1 } else { -1 }).unwrap();
        assert_eq!(signed.row(0).slots().collect::<Vec<_>>(), vec![Neighbor::signed(1, 1), Neighbor::SKIP]);
        assert_eq!(signed.row(1).slots().collect::<Vec<_>>(), vec![Neighbor::signed(0, -1), Neighbor::signed(1, 1)]);
    }

    #[test]
    fn signed_rows_wider_than_table_are_rejected() {
        let rows = vec![vec![Neighbor::new(0), Neighbor::new(1), Neighbor::new(2)]];
        assert!(Connectivity::from_neighbors(&rows, Vertex, Edge, 3, 2).is_err());
    }

    #[test]
    fn composition_deduplicates_targets() {
        let e2v = Connectivity::dense(&triangle_edges()[..], Edge, Vertex, 4, 2).unwrap();
        let v2e = e2v.inverse(None).unwrap();
        let v2v = v2e.compose(&e2v, None).unwrap();
        assert_eq!(v2v.from(), Vertex);
        assert_eq!(v2v.to(), Vertex);
        assert_eq!(v2v.neighbors(1).map(|n| n.index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(v2v.neighbors(3).map(|n| n.index).collect::<Vec<_>>(), vec![1, 3]);
        assert!(e2v.compose(&e2v, None).is_err());
    }

    #[test]
    fn table_shape_matches_size_and_width() {
        let e2v = Connectivity::dense(&triangle_edges()[..], Edge, Vertex, 4, 2).unwrap();
        let layout = e2v.layout();
        assert_eq!(layout.upper_bound(Edge.into()), Ok(4));
        assert_eq!(layout.upper_bound(Dim::Neighbor), Ok(2));
    }
}
