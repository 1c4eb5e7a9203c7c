//! This module defines [ElementVec].

use std::{ops::Range, sync::Arc};

use arrow::{
    array::{ArrayRef, BooleanArray, BooleanBufferBuilder, Float64Array, Int64Array},
    buffer::{BooleanBuffer, ScalarBuffer},
    datatypes::ArrowNativeType,
};
use delegate::delegate;

use super::{ElementType, ElementValue};

/// Contiguous storage of elements of one [ElementType]
///
/// The elements live in reference-counted Arrow buffers.
/// Cloning a vector, slicing it or viewing it as an Arrow array shares the buffer;
/// mutation copies it only if it is shared.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementVec {
    /// Elements of type [`bool`], bit-packed
    Bool(BooleanBuffer),
    /// Elements of type [`i64`]
    Int64(ScalarBuffer<i64>),
    /// Elements of type [`f64`]
    Float64(ScalarBuffer<f64>),
}

impl Default for ElementVec {
    fn default() -> Self {
        ElementVec::Float64(ScalarBuffer::from(Vec::new()))
    }
}

/// Collect `values` into a bit-packed buffer.
fn boolean_buffer<I>(values: I) -> BooleanBuffer
where
    I: IntoIterator<Item = bool>,
{
    let values = values.into_iter();
    let mut builder = BooleanBufferBuilder::new(values.size_hint().0);
    for value in values {
        builder.append(value);
    }
    builder.finish()
}

/// Run `update` on the elements of `buffer` as a [Vec].
///
/// The allocation is reused if `buffer` is its only owner and copied otherwise.
fn update_scalars<T, F>(buffer: &mut ScalarBuffer<T>, update: F)
where
    T: ArrowNativeType,
    F: FnOnce(&mut Vec<T>),
{
    let shared = std::mem::replace(buffer, ScalarBuffer::from(Vec::new()));
    let mut data = Vec::from(shared);
    update(&mut data);
    *buffer = ScalarBuffer::from(data);
}

/// Bit-packed counterpart of [update_scalars], which always copies.
fn update_bools<F>(buffer: &mut BooleanBuffer, update: F)
where
    F: FnOnce(&mut Vec<bool>),
{
    let mut data = buffer.iter().collect::<Vec<_>>();
    update(&mut data);
    *buffer = boolean_buffer(data);
}

impl ElementVec {
    delegate! {
        to match self {
            Self::Bool(data) => data,
            Self::Int64(data) => data,
            Self::Float64(data) => data,
        } {
            /// Returns the number of elements.
            pub fn len(&self) -> usize;
            /// Returns true iff there are no elements.
            pub fn is_empty(&self) -> bool;
        }
    }

    /// Create an empty vector of the given type.
    pub fn new(element_type: ElementType) -> Self {
        Self::zeros(element_type, 0)
    }

    /// Create a vector of `len` zero (or `false`) elements.
    pub fn zeros(element_type: ElementType, len: usize) -> Self {
        match element_type {
            ElementType::Bool => ElementVec::Bool(BooleanBuffer::new_unset(len)),
            ElementType::Int64 => ElementVec::from(vec![0i64; len]),
            ElementType::Float64 => ElementVec::from(vec![0.0; len]),
        }
    }

    /// Create a vector holding `len` copies of `value`.
    pub fn repeat(value: ElementValue, len: usize) -> Self {
        match value {
            ElementValue::Bool(true) => ElementVec::Bool(BooleanBuffer::new_set(len)),
            ElementValue::Bool(false) => ElementVec::Bool(BooleanBuffer::new_unset(len)),
            ElementValue::Int64(value) => ElementVec::from(vec![value; len]),
            ElementValue::Float64(value) => ElementVec::from(vec![value; len]),
        }
    }

    /// Collect values into a vector of the given type, converting where necessary.
    pub fn from_values<I>(element_type: ElementType, values: I) -> Self
    where
        I: IntoIterator<Item = ElementValue>,
    {
        let values = values.into_iter();
        match element_type {
            ElementType::Bool => ElementVec::Bool(boolean_buffer(values.map(|v| v.to_bool()))),
            ElementType::Int64 => ElementVec::from(values.map(|v| v.to_i64()).collect::<Vec<_>>()),
            ElementType::Float64 => {
                ElementVec::from(values.map(|v| v.to_f64()).collect::<Vec<_>>())
            }
        }
    }

    /// Return the [ElementType] of the stored elements.
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementVec::Bool(_) => ElementType::Bool,
            ElementVec::Int64(_) => ElementType::Int64,
            ElementVec::Float64(_) => ElementType::Float64,
        }
    }

    /// Return the element at `index` or `None` if it is out of bounds.
    pub fn get(&self, index: usize) -> Option<ElementValue> {
        match self {
            ElementVec::Bool(data) => {
                (index < data.len()).then(|| ElementValue::Bool(data.value(index)))
            }
            ElementVec::Int64(data) => data.get(index).copied().map(ElementValue::Int64),
            ElementVec::Float64(data) => data.get(index).copied().map(ElementValue::Float64),
        }
    }

    /// Iterate over all elements.
    pub fn iter(&self) -> impl Iterator<Item = ElementValue> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index))
    }

    /// Append a value, converting it to the type of this vector.
    pub fn push(&mut self, value: ElementValue) {
        match self {
            ElementVec::Bool(data) => update_bools(data, |data| data.push(value.to_bool())),
            ElementVec::Int64(data) => update_scalars(data, |data| data.push(value.to_i64())),
            ElementVec::Float64(data) => update_scalars(data, |data| data.push(value.to_f64())),
        }
    }

    /// Overwrite the element at `index`, converting `value` to the type of this vector.
    ///
    /// Returns `false` if `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: ElementValue) -> bool {
        if index >= self.len() {
            return false;
        }

        match self {
            ElementVec::Bool(data) => update_bools(data, |data| data[index] = value.to_bool()),
            ElementVec::Int64(data) => update_scalars(data, |data| data[index] = value.to_i64()),
            ElementVec::Float64(data) => {
                update_scalars(data, |data| data[index] = value.to_f64())
            }
        }
        true
    }

    /// Append all elements of `other`, converting them to the type of this vector.
    pub fn extend_from(&mut self, other: &ElementVec) {
        match self {
            ElementVec::Bool(data) => {
                update_bools(data, |data| data.extend(other.iter().map(|v| v.to_bool())))
            }
            ElementVec::Int64(data) => {
                update_scalars(data, |data| data.extend(other.iter().map(|v| v.to_i64())))
            }
            ElementVec::Float64(data) => {
                update_scalars(data, |data| data.extend(other.iter().map(|v| v.to_f64())))
            }
        }
    }

    /// Shorten the vector to `len` elements without copying.
    ///
    /// Has no effect if `len` is not smaller than the current length.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }

        match self {
            ElementVec::Bool(data) => *data = data.slice(0, len),
            ElementVec::Int64(data) => *data = data.slice(0, len),
            ElementVec::Float64(data) => *data = data.slice(0, len),
        }
    }

    /// Change the number of elements to `len`,
    /// padding with zero (or `false`) or truncating as necessary.
    pub fn resize(&mut self, len: usize) {
        if len <= self.len() {
            self.truncate(len);
            return;
        }

        match self {
            ElementVec::Bool(data) => update_bools(data, |data| data.resize(len, false)),
            ElementVec::Int64(data) => update_scalars(data, |data| data.resize(len, 0)),
            ElementVec::Float64(data) => update_scalars(data, |data| data.resize(len, 0.0)),
        }
    }

    /// Return this vector converted to the given type.
    ///
    /// The buffer is shared if the type does not change.
    pub fn cast(&self, element_type: ElementType) -> ElementVec {
        if self.element_type() == element_type {
            return self.clone();
        }

        ElementVec::from_values(element_type, self.iter())
    }

    /// Return the elements at the given positions.
    ///
    /// # Panics
    /// Panics if one of the indices is out of bounds.
    pub fn take(&self, indices: &[usize]) -> ElementVec {
        match self {
            ElementVec::Bool(data) => {
                ElementVec::Bool(boolean_buffer(indices.iter().map(|&i| data.value(i))))
            }
            ElementVec::Int64(data) => {
                ElementVec::from(indices.iter().map(|&i| data[i]).collect::<Vec<_>>())
            }
            ElementVec::Float64(data) => {
                ElementVec::from(indices.iter().map(|&i| data[i]).collect::<Vec<_>>())
            }
        }
    }

    /// Return the elements in the given range, sharing the buffer.
    ///
    /// # Panics
    /// Panics if the range is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> ElementVec {
        let (offset, len) = (range.start, range.len());
        assert!(offset + len <= self.len(), "slice {range:?} out of bounds");

        match self {
            ElementVec::Bool(data) => ElementVec::Bool(data.slice(offset, len)),
            ElementVec::Int64(data) => ElementVec::Int64(data.slice(offset, len)),
            ElementVec::Float64(data) => ElementVec::Float64(data.slice(offset, len)),
        }
    }

    /// Return the elements as an Arrow array sharing the buffer of this vector.
    pub fn to_arrow(&self) -> ArrayRef {
        match self {
            ElementVec::Bool(data) => Arc::new(BooleanArray::new(data.clone(), None)),
            ElementVec::Int64(data) => Arc::new(Int64Array::new(data.clone(), None)),
            ElementVec::Float64(data) => Arc::new(Float64Array::new(data.clone(), None)),
        }
    }
}

impl From<Vec<bool>> for ElementVec {
    fn from(value: Vec<bool>) -> Self {
        ElementVec::Bool(boolean_buffer(value))
    }
}

impl From<Vec<i64>> for ElementVec {
    fn from(value: Vec<i64>) -> Self {
        ElementVec::Int64(ScalarBuffer::from(value))
    }
}

impl From<Vec<f64>> for ElementVec {
    fn from(value: Vec<f64>) -> Self {
        ElementVec::Float64(ScalarBuffer::from(value))
    }
}

impl From<BooleanBuffer> for ElementVec {
    fn from(value: BooleanBuffer) -> Self {
        ElementVec::Bool(value)
    }
}

impl From<ScalarBuffer<i64>> for ElementVec {
    fn from(value: ScalarBuffer<i64>) -> Self {
        ElementVec::Int64(value)
    }
}

impl From<ScalarBuffer<f64>> for ElementVec {
    fn from(value: ScalarBuffer<f64>) -> Self {
        ElementVec::Float64(value)
    }
}
