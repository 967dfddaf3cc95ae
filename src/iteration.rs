use core::fmt::Debug;
use core::iter::{Product, Sum};
use core::ops::Range;
use crate::composite::{Axis, Composite, Cursor};
use crate::connectivity::{Neighbor, NeighborRow};
use crate::error::{Error, Result};
use crate::field::Field;
use crate::layout::{Dim, Ptr};
use crate::location::Location;




/**
 * Invoke `body` once for each element in `range` along the composite's
 * primary location, in ascending order, with a cursor positioned at that
 * element. The cursor starts at `range.start` and advances by one primary
 * stride between invocations. Fails if the range is not contained in the
 * composite.
 */
pub fn for_each_element<K, const N: usize, F>(composite: &Composite<K, N>, range: Range<usize>, mut body: F) -> Result<()>
where
    K: Copy + Eq + Debug,
    F: FnMut(usize, Cursor<'_, K, N>),
{
    if range.start > range.end {
        return Err(Error::ShapeMismatch {
            what: "iteration range",
            expected: range.end,
            found: range.start,
        })
    }
    composite.check_size(range.end)?;

    let mut cursor = composite.at(range.start);

    for i in range {
        body(i, cursor);
        cursor.shift(Axis::Primary, 1);
    }
    Ok(())
}




/**
 * Invoke `f` for each occupied slot of a neighbor row, in slot order. Slots
 * holding the skip value are passed over, so padding never reaches `f`.
 */
pub fn for_each_neighbor<F>(row: &NeighborRow, mut f: F)
where
    F: FnMut(Neighbor),
{
    for (_, neighbor) in row.valid() {
        f(neighbor)
    }
}




/**
 * Addressing of a field from neighbor indexes found in a connectivity table.
 * Built once per traversal from the field's layout; the field itself is
 * passed to each read, so the same access may serve several fields with the
 * same layout.
 */
#[derive(Clone, Copy, Debug)]
pub struct IndirectAccess {
    origin: Ptr,
    stride: usize,
    level_stride: usize,
    size: usize,
}




// ============================================================================
impl IndirectAccess {


    /**
     * Create an access for a field, which must be defined over `location`
     * (the target location of the connectivity the indexes come from).
     */
    pub fn new<T, S>(field: &Field<T, S>, location: Location) -> Result<Self>
    where
        S: AsRef<[T]>,
    {
        field.expect_location(location)?;
        let layout = field.layout();
        Ok(Self {
            origin: layout.origin(),
            stride: layout.stride(location.into())?,
            level_stride: layout.stride_or_zero(Dim::K),
            size: field.size(),
        })
    }


    /**
     * Return the position of the value of neighbor `index` at level zero.
     * The index must not be the skip value; callers check for it first.
     */
    pub fn ptr(&self, index: i32) -> Ptr {
        self.ptr_at_level(index, 0)
    }

    pub fn ptr_at_level(&self, index: i32, level: usize) -> Ptr {
        assert!(index >= 0 && (index as usize) < self.size,
            "indirect access at {} outside of 0..{}", index, self.size);
        Ptr(self.origin.0 + self.stride * index as usize + self.level_stride * level)
    }

    pub fn read<'a, T, S>(&self, field: &'a Field<T, S>, index: i32, level: usize) -> &'a T
    where
        S: AsRef<[T]>,
    {
        field.get(self.ptr_at_level(index, level))
    }
}




/**
 * Fold over the occupied slots of a neighbor row.
 */
pub fn fold_neighbors<A, F>(row: &NeighborRow, init: A, f: F) -> A
where
    F: FnMut(A, Neighbor) -> A,
{
    row.valid().map(|(_, n)| n).fold(init, f)
}

pub fn sum_neighbors<T, F>(row: &NeighborRow, f: F) -> T
where
    T: Sum,
    F: FnMut(Neighbor) -> T,
{
    row.valid().map(|(_, n)| n).map(f).sum()
}

pub fn product_neighbors<T, F>(row: &NeighborRow, f: F) -> T
where
    T: Product,
    F: FnMut(Neighbor) -> T,
{
    row.valid().map(|(_, n)| n).map(f).product()
}


/// Smallest value of `f` over the occupied slots, or `None` for an empty row.
pub fn min_neighbors<T, F>(row: &NeighborRow, mut f: F) -> Option<T>
where
    T: PartialOrd,
    F: FnMut(Neighbor) -> T,
{
    fold_neighbors(row, None, |acc: Option<T>, n| {
        let x = f(n);
        match acc {
            Some(a) if a <= x => Some(a),
            _ => Some(x),
        }
    })
}


/// Largest value of `f` over the occupied slots, or `None` for an empty row.
pub fn max_neighbors<T, F>(row: &NeighborRow, mut f: F) -> Option<T>
where
    T: PartialOrd,
    F: FnMut(Neighbor) -> T,
{
    fold_neighbors(row, None, |acc: Option<T>, n| {
        let x = f(n);
        match acc {
            Some(a) if a >= x => Some(a),
            _ => Some(x),
        }
    })
}
