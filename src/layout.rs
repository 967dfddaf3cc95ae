use core::ops::Range;
use std::fmt;
use crate::error::{Error, Result};
use crate::location::Location;




/**
 * Identifier for an axis of a strided layout: a mesh location, the neighbor
 * slot axis of a connectivity table, or the vertical level.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Dim {
    Location(Location),
    Neighbor,
    K,
}

impl From<Location> for Dim {
    fn from(location: Location) -> Self {
        Dim::Location(location)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Location(location) => write!(fmt, "{}", location),
            Dim::Neighbor => write!(fmt, "neighbor"),
            Dim::K => write!(fmt, "k"),
        }
    }
}




/**
 * A position in a strided buffer, measured in elements from the start of the
 * buffer.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ptr(pub usize);




/**
 * Advance a position by `offset` steps of the given stride.
 */
pub fn shift(ptr: &mut Ptr, stride: usize, offset: i64) {
    *ptr = shifted(*ptr, stride, offset)
}




/**
 * Return a position advanced by `offset` steps of the given stride. Shifting
 * to before the start of the buffer is a logic error and panics.
 */
pub fn shifted(ptr: Ptr, stride: usize, offset: i64) -> Ptr {
    let target = ptr.0 as i64 + stride as i64 * offset;
    assert!(target >= 0, "shifted position {} is before the start of the buffer", target);
    Ptr(target as usize)
}




#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct Extent {
    dim: Dim,
    stride: usize,
    upper: usize,
}




/**
 * Describes how a set of named dimensions is laid out in a flat buffer: an
 * origin, and for each dimension a stride and an (exclusive) upper bound. The
 * lower bound of every dimension is zero.
 */
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StridedLayout {
    origin: usize,
    extents: Vec<Extent>,
}




// ============================================================================
impl StridedLayout {


    /**
     * Create a layout from explicit `(dim, stride, upper_bound)` triples.
     * Dimensions must be distinct.
     */
    pub fn new(origin: usize, dims: &[(Dim, usize, usize)]) -> Self {
        for (n, (a, _, _)) in dims.iter().enumerate() {
            assert!(
                dims[n + 1..].iter().all(|(b, _, _)| a != b),
                "dimension {} appears more than once in a layout", a);
        }
        Self {
            origin,
            extents: dims
                .iter()
                .map(|&(dim, stride, upper)| Extent { dim, stride, upper })
                .collect(),
        }
    }


    /**
     * Return a dense layout in row-major order (C-like; the final dimension
     * has unit stride).
     */
    pub fn row_major(shape: &[(Dim, usize)]) -> Self {
        let mut stride = 1;
        let mut dims = vec![(Dim::K, 0, 0); shape.len()];

        for (n, &(dim, upper)) in shape.iter().enumerate().rev() {
            dims[n] = (dim, stride, upper);
            stride *= upper.max(1);
        }
        Self::new(0, &dims)
    }


    /**
     * Return a dense layout in column-major order (the first dimension has
     * unit stride).
     */
    pub fn column_major(shape: &[(Dim, usize)]) -> Self {
        let mut stride = 1;
        let mut dims = Vec::with_capacity(shape.len());

        for &(dim, upper) in shape {
            dims.push((dim, stride, upper));
            stride *= upper.max(1);
        }
        Self::new(0, &dims)
    }


    /**
     * Return the position of the first element.
     */
    pub fn origin(&self) -> Ptr {
        Ptr(self.origin)
    }


    /**
     * Return an iterator over the dimensions, in declaration order.
     */
    pub fn dims(&self) -> impl Iterator<Item = Dim> + '_ {
        self.extents.iter().map(|e| e.dim)
    }


    /**
     * Determine whether the layout has the given dimension.
     */
    pub fn has_dim(&self, dim: Dim) -> bool {
        self.extent(dim).is_ok()
    }


    /**
     * Return the stride of the given dimension.
     */
    pub fn stride(&self, dim: Dim) -> Result<usize> {
        self.extent(dim).map(|e| e.stride)
    }


    /**
     * Return the (exclusive) upper bound of the given dimension.
     */
    pub fn upper_bound(&self, dim: Dim) -> Result<usize> {
        self.extent(dim).map(|e| e.upper)
    }


    /**
     * Return the stride of the given dimension, or zero if the layout does
     * not have it. A zero stride broadcasts the single value along that axis.
     */
    pub fn stride_or_zero(&self, dim: Dim) -> usize {
        self.stride(dim).unwrap_or(0)
    }


    /**
     * Return the upper bound of the given dimension, or one if the layout
     * does not have it.
     */
    pub fn upper_bound_or_one(&self, dim: Dim) -> usize {
        self.upper_bound(dim).unwrap_or(1)
    }


    /**
     * Return the number of elements addressed by this layout.
     */
    pub fn len(&self) -> usize {
        self.extents.iter().map(|e| e.upper).product()
    }


    /**
     * Determine whether this layout addresses no elements.
     */
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }


    /**
     * Return the minimum length of a buffer which holds every position
     * addressed by this layout.
     */
    pub fn required_len(&self) -> usize {
        if self.is_empty() {
            return self.origin
        }
        self.origin + self.extents.iter().map(|e| e.stride * (e.upper - 1)).sum::<usize>() + 1
    }


    /**
     * Return the position of a multi-index. Dimensions not mentioned in the
     * index are taken at zero.
     */
    pub fn offset(&self, index: &[(Dim, usize)]) -> Result<Ptr> {
        let mut ptr = self.origin();

        for &(dim, i) in index {
            let extent = self.extent(dim)?;
            if i >= extent.upper {
                return Err(Error::ShapeMismatch {
                    what: "layout index",
                    expected: extent.upper,
                    found: i,
                })
            }
            ptr.0 += extent.stride * i;
        }
        Ok(ptr)
    }


    /**
     * Return a layout selecting a sub-range of one dimension. The origin is
     * shifted to the start of the range and the upper bound becomes its
     * length.
     */
    pub fn restrict(&self, dim: Dim, range: Range<usize>) -> Result<Self> {
        let extent = self.extent(dim)?;

        if range.start > range.end || range.end > extent.upper {
            return Err(Error::ShapeMismatch {
                what: "restricted range",
                expected: extent.upper,
                found: range.end,
            })
        }
        let mut result = self.clone();
        result.origin += extent.stride * range.start;

        for e in &mut result.extents {
            if e.dim == dim {
                e.upper = range.end - range.start;
            }
        }
        Ok(result)
    }


    /**
     * Return an iterator over every addressed position, in the order of the
     * dimensions as declared (the final dimension increases fastest).
     */
    pub fn iter(&self) -> impl Iterator<Item = Ptr> + '_ {
        let len = self.len();
        (0..len).map(move |mut n| {
            let mut ptr = self.origin;
            for e in self.extents.iter().rev() {
                ptr += e.stride * (n % e.upper);
                n /= e.upper;
            }
            Ptr(ptr)
        })
    }

    fn extent(&self, dim: Dim) -> Result<&Extent> {
        self.extents
            .iter()
            .find(|e| e.dim == dim)
            .ok_or(Error::MissingDimension(dim))
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;

    const E: Dim = Dim::Location(Location::Edge);

    #[test]
    fn row_major_layout_has_unit_stride_on_last_dim() {
        let layout = StridedLayout::row_major(&[(E, 18), (Dim::K, 5)]);
        assert_eq!(layout.stride(E), Ok(5));
        assert_eq!(layout.stride(Dim::K), Ok(1));
        assert_eq!(layout.len(), 90);
        assert_eq!(layout.required_len(), 90);
        assert_eq!(layout.offset(&[(E, 2), (Dim::K, 3)]), Ok(Ptr(13)));
    }

    #[test]
    fn column_major_layout_has_unit_stride_on_first_dim() {
        let layout = StridedLayout::column_major(&[(E, 18), (Dim::K, 5)]);
        assert_eq!(layout.stride(E), Ok(1));
        assert_eq!(layout.stride(Dim::K), Ok(18));
        assert_eq!(layout.offset(&[(E, 2), (Dim::K, 3)]), Ok(Ptr(56)));
    }

    #[test]
    fn missing_dimension_is_reported() {
        let layout = StridedLayout::row_major(&[(E, 18)]);
        assert_eq!(layout.stride(Dim::Neighbor), Err(Error::MissingDimension(Dim::Neighbor)));
        assert_eq!(layout.stride_or_zero(Dim::K), 0);
        assert_eq!(layout.upper_bound_or_one(Dim::K), 1);
    }

    #[test]
    fn restricted_layout_moves_the_origin() {
        let layout = StridedLayout::row_major(&[(E, 10), (Dim::K, 2)]);
        let sub = layout.restrict(E, 4..7).unwrap();
        assert_eq!(sub.origin(), Ptr(8));
        assert_eq!(sub.upper_bound(E), Ok(3));
        assert_eq!(sub.required_len(), 14);
        assert!(layout.restrict(E, 4..11).is_err());
    }

    #[test]
    fn iteration_visits_every_position_once() {
        let layout = StridedLayout::column_major(&[(E, 3), (Dim::K, 2)]);
        let mut ptrs: Vec<_> = layout.iter().map(|p| p.0).collect();
        assert_eq!(ptrs, vec![0, 3, 1, 4, 2, 5]);
        ptrs.sort_unstable();
        assert_eq!(ptrs, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn shifting_by_negative_offset_moves_backward() {
        let mut ptr = Ptr(10);
        shift(&mut ptr, 3, -2);
        assert_eq!(ptr, Ptr(4));
        assert_eq!(shifted(ptr, 4, 1), Ptr(8));
    }

    #[test]
    #[should_panic]
    fn shifting_before_the_buffer_panics() {
        shifted(Ptr(1), 2, -1);
    }
}
