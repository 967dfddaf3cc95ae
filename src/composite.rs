use core::fmt::Debug;
use crate::error::{Error, Result};
use crate::layout::{shifted, Dim, Ptr, StridedLayout};
use crate::location::Location;




/**
 * Identifier for an axis a cursor can be shifted along
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Primary,
    Level,
    Neighbor,
}




#[derive(Clone, Copy, Debug)]
struct Member<K> {
    key: K,
    origin: Ptr,
    strides: [usize; 3],
}




/**
 * A keyed bundle of co-indexed fields: for each member the origin of its
 * buffer and its strides along the primary location, the vertical level and
 * the neighbor axis. A composite only records addressing, not data, so
 * members may have different value types. Members without a level or
 * neighbor dimension get a zero stride on that axis, which broadcasts their
 * single value.
 *
 * Composites are built per traversal and dropped afterwards.
 */
#[derive(Clone, Debug)]
pub struct Composite<K, const N: usize> {
    primary: Location,
    size: usize,
    members: [Member<K>; N],
}




// ============================================================================
impl<K, const N: usize> Composite<K, N>
where
    K: Copy + Eq + Debug,
{


    /**
     * Bundle the given layouts for traversal along a primary location. Every
     * layout must have a dimension for that location. The number of
     * elements the composite can traverse is the smallest upper bound among
     * the members.
     */
    pub fn new(primary: Location, members: [(K, &StridedLayout); N]) -> Result<Self> {
        let dim = Dim::Location(primary);
        let mut size = usize::MAX;

        for (_, layout) in &members {
            size = size.min(layout.upper_bound(dim)?);
        }
        let members = members.map(|(key, layout)| Member {
            key,
            origin: layout.origin(),
            strides: [
                layout.stride_or_zero(dim),
                layout.stride_or_zero(Dim::K),
                layout.stride_or_zero(Dim::Neighbor),
            ],
        });
        Ok(Self { primary, size: if N == 0 { 0 } else { size }, members })
    }


    /**
     * Return the primary location.
     */
    pub fn primary(&self) -> Location {
        self.primary
    }


    /**
     * Return the number of elements along the primary location.
     */
    pub fn size(&self) -> usize {
        self.size
    }


    /**
     * Return a cursor at the first element.
     */
    pub fn origin(&self) -> Cursor<'_, K, N> {
        Cursor {
            composite: self,
            ptrs: self.members.map(|m| m.origin),
        }
    }


    /**
     * Return a cursor positioned at the given element. This is a pure
     * function of the element index, so parallel executors can position
     * each task independently.
     */
    pub fn at(&self, element: usize) -> Cursor<'_, K, N> {
        self.origin().shifted(Axis::Primary, element as i64)
    }


    /**
     * Return the stride of a member along an axis.
     */
    pub fn stride(&self, key: K, axis: Axis) -> usize {
        self.member(key).1.strides[axis_index(axis)]
    }


    /**
     * Fail unless the composite can traverse `count` elements.
     */
    pub fn check_size(&self, count: usize) -> Result<()> {
        if count > self.size {
            Err(Error::ShapeMismatch {
                what: "composite traversal length",
                expected: self.size,
                found: count,
            })
        } else {
            Ok(())
        }
    }

    fn member(&self, key: K) -> (usize, &Member<K>) {
        self.members
            .iter()
            .enumerate()
            .find(|(_, m)| m.key == key)
            .unwrap_or_else(|| panic!("composite has no member {:?}", key))
    }
}




/**
 * A set of positions, one per member of a composite, which move together.
 */
#[derive(Debug)]
pub struct Cursor<'a, K, const N: usize> {
    composite: &'a Composite<K, N>,
    ptrs: [Ptr; N],
}

impl<'a, K, const N: usize> Clone for Cursor<'a, K, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, const N: usize> Copy for Cursor<'a, K, N> {}




// ============================================================================
impl<'a, K, const N: usize> Cursor<'a, K, N>
where
    K: Copy + Eq + Debug,
{


    /**
     * Return the current position of a member.
     */
    pub fn ptr(&self, key: K) -> Ptr {
        self.ptrs[self.composite.member(key).0]
    }


    /**
     * Advance every member by `offset` steps along an axis.
     */
    pub fn shift(&mut self, axis: Axis, offset: i64) {
        let a = axis_index(axis);
        for (ptr, member) in self.ptrs.iter_mut().zip(&self.composite.members) {
            *ptr = shifted(*ptr, member.strides[a], offset);
        }
    }


    /**
     * Return a copy of this cursor advanced along an axis.
     */
    pub fn shifted(&self, axis: Axis, offset: i64) -> Self {
        let mut result = *self;
        result.shift(axis, offset);
        result
    }
}

fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::Primary => 0,
        Axis::Level => 1,
        Axis::Neighbor => 2,
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Key {
        Table,
        Value,
    }

    const E: Location = Location::Edge;

    fn layouts() -> (StridedLayout, StridedLayout) {
        let table = StridedLayout::row_major(&[(E.into(), 6), (Dim::Neighbor, 2)]);
        let value = StridedLayout::column_major(&[(E.into(), 5), (Dim::K, 3)]);
        (table, value)
    }

    #[test]
    fn composite_size_is_the_smallest_member_size() {
        let (table, value) = layouts();
        let composite = Composite::new(E, [(Key::Table, &table), (Key::Value, &value)]).unwrap();
        assert_eq!(composite.primary(), E);
        assert_eq!(composite.size(), 5);
        assert!(composite.check_size(5).is_ok());
        assert!(composite.check_size(6).is_err());
    }

    #[test]
    fn members_advance_by_their_own_strides() {
        let (table, value) = layouts();
        let composite = Composite::new(E, [(Key::Table, &table), (Key::Value, &value)]).unwrap();
        let mut cursor = composite.origin();
        cursor.shift(Axis::Primary, 2);
        assert_eq!(cursor.ptr(Key::Table), Ptr(4));
        assert_eq!(cursor.ptr(Key::Value), Ptr(2));

        let level = cursor.shifted(Axis::Level, 2);
        assert_eq!(level.ptr(Key::Table), Ptr(4));
        assert_eq!(level.ptr(Key::Value), Ptr(12));

        let slot = cursor.shifted(Axis::Neighbor, 1);
        assert_eq!(slot.ptr(Key::Table), Ptr(5));
        assert_eq!(slot.ptr(Key::Value), Ptr(2));
    }

    #[test]
    fn missing_axis_has_zero_stride() {
        let (table, value) = layouts();
        let composite = Composite::new(E, [(Key::Table, &table), (Key::Value, &value)]).unwrap();
        assert_eq!(composite.stride(Key::Table, Axis::Primary), 2);
        assert_eq!(composite.stride(Key::Table, Axis::Neighbor), 1);
        assert_eq!(composite.stride(Key::Table, Axis::Level), 0);
        assert_eq!(composite.stride(Key::Value, Axis::Primary), 1);
        assert_eq!(composite.stride(Key::Value, Axis::Level), 5);
        assert_eq!(composite.stride(Key::Value, Axis::Neighbor), 0);
    }

    #[test]
    fn random_access_agrees_with_stepping() {
        let (table, value) = layouts();
        let composite = Composite::new(E, [(Key::Table, &table), (Key::Value, &value)]).unwrap();
        let mut cursor = composite.origin();

        for i in 0..composite.size() {
            let direct = composite.at(i);
            assert_eq!(direct.ptr(Key::Table), cursor.ptr(Key::Table));
            assert_eq!(direct.ptr(Key::Value), cursor.ptr(Key::Value));
            cursor.shift(Axis::Primary, 1);
        }
    }

    #[test]
    fn member_without_the_primary_location_is_rejected() {
        let other = StridedLayout::row_major(&[(Location::Cell.into(), 4)]);
        assert_eq!(
            Composite::new(E, [(Key::Value, &other)]).unwrap_err(),
            Error::MissingDimension(Dim::Location(E)));
    }
}
