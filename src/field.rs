use std::marker::PhantomData;
use rayon::prelude::*;
use crate::error::{Error, Result};
use crate::layout::{Dim, Ptr, StridedLayout};
use crate::location::Location;




/**
 * A field is a mapping from the elements of one mesh location (and possibly
 * additional dimensions, like the vertical level or a neighbor slot) to
 * values. The mapping is backed by a flat buffer addressed through a
 * `StridedLayout`. The buffer may be owned by the field (`Vec<T>`, the
 * default), or be a view over memory owned by the caller (`&[T]` or
 * `&mut [T]`); all of these satisfy the same access contract.
 *
 * The primary location of the field is the location of its first location
 * dimension. Fields constructed by the helpers below are laid out
 * location-major, `[location, k]`, so that the values of one element form a
 * contiguous block.
 */
#[derive(Clone, Debug, serde::Serialize)]
#[serde(bound(serialize = "S: serde::Serialize"))]
pub struct Field<T, S = Vec<T>> {
    location: Location,
    layout: StridedLayout,
    data: S,
    #[serde(skip)]
    marker: PhantomData<T>,
}

pub type FieldView<'a, T> = Field<T, &'a [T]>;
pub type FieldViewMut<'a, T> = Field<T, &'a mut [T]>;




// ============================================================================
impl<T: Clone> Field<T> {


    /**
     * Generate a field over `size` elements of a location and `num_levels`
     * vertical levels, with every value set to `value`.
     */
    pub fn filled(location: Location, size: usize, num_levels: usize, value: T) -> Self {
        let layout = Self::default_layout(location, size, num_levels);
        let data = vec![value; layout.required_len()];
        Self { location, layout, data, marker: PhantomData }
    }


    /**
     * Generate a field with an arbitrary layout, with every value set to
     * `value`. The layout must have a dimension for the given location.
     */
    pub fn with_layout(location: Location, layout: StridedLayout, value: T) -> Result<Self> {
        layout.stride(location.into())?;
        let data = vec![value; layout.required_len()];
        Ok(Self { location, layout, data, marker: PhantomData })
    }


    /**
     * Generate a field with values defined from a closure of the element
     * index and the vertical level.
     */
    pub fn from_function<F>(location: Location, size: usize, num_levels: usize, f: F) -> Self
    where
        F: Fn(usize, usize) -> T
    {
        let layout = Self::default_layout(location, size, num_levels);
        let data = (0..size)
            .flat_map(|i| (0..num_levels).map(move |k| (i, k)))
            .map(|(i, k)| f(i, k))
            .collect();
        Self { location, layout, data, marker: PhantomData }
    }


    /**
     * Wrap one value per element, with no vertical dimension. Kernels use
     * the single value of such a field on every level.
     */
    pub fn from_elements(location: Location, data: Vec<T>) -> Self {
        let layout = StridedLayout::row_major(&[(location.into(), data.len())]);
        Self { location, layout, data, marker: PhantomData }
    }


    /**
     * Wrap an owned buffer. The buffer must be long enough for the layout.
     */
    pub fn from_vec(location: Location, layout: StridedLayout, data: Vec<T>) -> Result<Self> {
        validate(location, &layout, data.len())?;
        Ok(Self { location, layout, data, marker: PhantomData })
    }


    /**
     * Consume the field, returning its backing buffer.
     */
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn default_layout(location: Location, size: usize, num_levels: usize) -> StridedLayout {
        StridedLayout::row_major(&[(location.into(), size), (Dim::K, num_levels)])
    }
}

impl<T: Clone + Default> Field<T> {
    pub fn zeros(location: Location, size: usize, num_levels: usize) -> Self {
        Self::filled(location, size, num_levels, T::default())
    }
}




// ============================================================================
impl<'a, T> Field<T, &'a [T]> {


    /**
     * Create a read-only view over caller-owned memory.
     */
    pub fn from_slice(location: Location, layout: StridedLayout, data: &'a [T]) -> Result<Self> {
        validate(location, &layout, data.len())?;
        Ok(Self { location, layout, data, marker: PhantomData })
    }
}

impl<'a, T> Field<T, &'a mut [T]> {


    /**
     * Create a writable view over caller-owned memory.
     */
    pub fn from_slice_mut(location: Location, layout: StridedLayout, data: &'a mut [T]) -> Result<Self> {
        validate(location, &layout, data.len())?;
        Ok(Self { location, layout, data, marker: PhantomData })
    }
}




// ============================================================================
impl<T, S> Field<T, S>
where
    S: AsRef<[T]>,
{


    /**
     * Return the primary location of this field.
     */
    pub fn location(&self) -> Location {
        self.location
    }


    /**
     * Return the layout of the backing buffer.
     */
    pub fn layout(&self) -> &StridedLayout {
        &self.layout
    }


    /**
     * Return the number of elements of the primary location.
     */
    pub fn size(&self) -> usize {
        self.layout.upper_bound_or_one(self.location.into())
    }


    /**
     * Return the number of vertical levels (one if the field has no vertical
     * dimension).
     */
    pub fn num_levels(&self) -> usize {
        self.layout.upper_bound_or_one(Dim::K)
    }


    /**
     * Return the whole backing buffer, including any positions the layout
     * does not address.
     */
    pub fn data(&self) -> &[T] {
        self.data.as_ref()
    }


    /**
     * Return the value at a position.
     */
    pub fn get(&self, ptr: Ptr) -> &T {
        &self.data.as_ref()[ptr.0]
    }


    /**
     * Return the value for the given element and vertical level.
     */
    pub fn at(&self, element: usize, level: usize) -> &T {
        self.get(self.position(element, level))
    }


    /**
     * Fail with an invalid-location error unless this field is defined over
     * the given location.
     */
    pub fn expect_location(&self, expected: Location) -> Result<()> {
        if self.location == expected {
            Ok(())
        } else {
            Err(Error::InvalidLocation { expected, found: self.location })
        }
    }


    /**
     * Return a read-only view of this field.
     */
    pub fn as_view(&self) -> FieldView<'_, T> {
        Field {
            location: self.location,
            layout: self.layout.clone(),
            data: self.data.as_ref(),
            marker: PhantomData,
        }
    }


    /**
     * Return an iterator over the values addressed by the layout, in layout
     * order.
     */
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let data = self.data.as_ref();
        self.layout.iter().map(move |ptr| &data[ptr.0])
    }


    /**
     * Fail unless the positions of each element form a block lying strictly
     * before the block of the next element. Returns the block length.
     */
    pub fn check_blocked(&self) -> Result<usize> {
        let primary = Dim::Location(self.location);
        let stride = self.layout.stride(primary)?;
        let span: usize = self.layout
            .dims()
            .filter(|&dim| dim != primary)
            .map(|dim| {
                let upper = self.layout.upper_bound_or_one(dim);
                self.layout.stride_or_zero(dim) * upper.saturating_sub(1)
            })
            .sum();

        if self.size() > 1 && span >= stride {
            return Err(Error::NonBlockedLayout(self.location))
        }
        Ok(stride.max(span + 1))
    }

    fn position(&self, element: usize, level: usize) -> Ptr {
        let stride = self.layout.stride_or_zero(self.location.into());
        let kstride = self.layout.stride_or_zero(Dim::K);
        if element >= self.size() || level >= self.num_levels() {
            panic!("index ({} {}) out of range on {} field ({} elements, {} levels)",
                element,
                level,
                self.location,
                self.size(),
                self.num_levels());
        }
        Ptr(self.layout.origin().0 + element * stride + level * kstride)
    }
}




// ============================================================================
impl<T, S> Field<T, S>
where
    S: AsRef<[T]> + AsMut<[T]>,
{
    pub fn data_mut(&mut self) -> &mut [T] {
        self.data.as_mut()
    }

    pub fn get_mut(&mut self, ptr: Ptr) -> &mut T {
        &mut self.data.as_mut()[ptr.0]
    }

    pub fn at_mut(&mut self, element: usize, level: usize) -> &mut T {
        let ptr = self.position(element, level);
        self.get_mut(ptr)
    }


    /**
     * Return a writable view of this field.
     */
    pub fn as_view_mut(&mut self) -> FieldViewMut<'_, T> {
        Field {
            location: self.location,
            layout: self.layout.clone(),
            data: self.data.as_mut(),
            marker: PhantomData,
        }
    }


    /**
     * Return a parallel iterator over disjoint per-element blocks of the
     * buffer. Block `i` starts at the position of element `i`, level zero;
     * the value at level `k` is found at `k * stride(K)` within the block.
     * This requires that all positions of one element lie strictly before
     * the positions of the next one, which holds for location-major layouts
     * but not, for example, for a column-major layout with several levels.
     */
    pub fn par_blocks_mut(&mut self) -> Result<impl IndexedParallelIterator<Item = &mut [T]> + '_>
    where
        T: Send,
    {
        let block = self.check_blocked()?;
        let size = self.size();
        let origin = self.layout.origin().0;
        Ok(self.data.as_mut()[origin..].par_chunks_mut(block).take(size))
    }
}




// ============================================================================
fn validate(location: Location, layout: &StridedLayout, len: usize) -> Result<()> {
    layout.stride(location.into())?;

    if layout.required_len() > len {
        return Err(Error::ShapeMismatch {
            what: "field buffer length",
            expected: layout.required_len(),
            found: len,
        })
    }
    Ok(())
}
