//! This module defines [DenseArray].

use crate::{
    datatypes::{ElementValue, ElementVec},
    error::ExpressionError,
    expression::operations::{BinaryOperation, ElementwiseFunction, Reduction, UnaryOperation},
};

use super::kernels;

/// Compute the shape two arrays are broadcast to when combined.
///
/// Shapes are aligned at their last axis;
/// axes of length one stretch to match the other shape.
pub fn broadcast_shapes(left: &[usize], right: &[usize]) -> Result<Vec<usize>, ExpressionError> {
    let ndim = left.len().max(right.len());
    let mut result = vec![0; ndim];

    for axis in 0..ndim {
        let left_dim = (axis + left.len())
            .checked_sub(ndim)
            .map_or(1, |index| left[index]);
        let right_dim = (axis + right.len())
            .checked_sub(ndim)
            .map_or(1, |index| right[index]);

        result[axis] = match (left_dim, right_dim) {
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            _ => {
                return Err(ExpressionError::ShapeMismatch(
                    left.to_vec(),
                    right.to_vec(),
                ))
            }
        };
    }

    Ok(result)
}

/// For every position of an array of shape `target` in row-major order,
/// compute the position in an array of shape `shape` broadcast to it.
pub fn broadcast_indices(shape: &[usize], target: &[usize]) -> Vec<usize> {
    let offset = target.len() - shape.len();
    let mut strides = vec![0; target.len()];

    let mut stride = 1;
    for (axis, &dim) in shape.iter().enumerate().rev() {
        if dim != 1 {
            strides[axis + offset] = stride;
        }
        stride *= dim;
    }

    let total: usize = target.iter().product();
    let mut result = Vec::with_capacity(total);
    let mut index = vec![0; target.len()];

    for _ in 0..total {
        result.push(index.iter().zip(&strides).map(|(i, s)| i * s).sum());

        for axis in (0..target.len()).rev() {
            index[axis] += 1;
            if index[axis] < target[axis] {
                break;
            }
            index[axis] = 0;
        }
    }

    result
}

/// Normalize a possibly negative `axis` for data with `ndim` dimensions.
pub(crate) fn normalize_axis(axis: i64, ndim: usize) -> Result<usize, ExpressionError> {
    let invalid = ExpressionError::InvalidAxis { axis, ndim };
    let ndim_signed = i64::try_from(ndim).map_err(|_| invalid.clone())?;
    let normalized = if axis < 0 { axis + ndim_signed } else { axis };

    if (0..ndim_signed).contains(&normalized) {
        usize::try_from(normalized).map_err(|_| invalid)
    } else {
        Err(invalid)
    }
}

/// Regular n-dimensional array of elements stored in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct DenseArray {
    shape: Vec<usize>,
    data: ElementVec,
    units: Option<String>,
}

impl DenseArray {
    /// Create a new [DenseArray].
    ///
    /// # Panics
    /// Panics if the number of elements does not match the shape.
    pub fn new(shape: Vec<usize>, data: ElementVec) -> Self {
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape must match the number of elements"
        );

        Self {
            shape,
            data,
            units: None,
        }
    }

    /// Create a zero-dimensional array holding a single value.
    pub fn scalar(value: ElementValue) -> Self {
        Self::new(Vec::new(), ElementVec::repeat(value, 1))
    }

    /// Attach physical units to this array.
    pub fn with_units(mut self, units: Option<String>) -> Self {
        self.units = units;
        self
    }

    /// Return the physical units of this array, if any.
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    /// Return the number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Return the length of each dimension.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Return the elements in row-major order.
    pub fn data(&self) -> &ElementVec {
        &self.data
    }

    /// Consume the array and return its elements in row-major order.
    pub fn into_data(self) -> ElementVec {
        self.data
    }

    /// Return the single element of a zero-dimensional array.
    pub fn item(&self) -> Option<ElementValue> {
        if self.ndim() == 0 {
            self.data.get(0)
        } else {
            None
        }
    }

    fn broadcast_to(&self, shape: &[usize]) -> ElementVec {
        if self.shape == shape {
            self.data.clone()
        } else {
            self.data.take(&broadcast_indices(&self.shape, shape))
        }
    }

    /// Apply `operation` to the elements of `self` and `other` after broadcasting.
    pub fn binary(
        &self,
        operation: BinaryOperation,
        other: &DenseArray,
    ) -> Result<DenseArray, ExpressionError> {
        let shape = broadcast_shapes(&self.shape, &other.shape)?;
        let data = kernels::binary(
            operation,
            &self.broadcast_to(&shape),
            &other.broadcast_to(&shape),
        )?;

        Ok(DenseArray::new(shape, data))
    }

    /// Apply `operation` to every element.
    pub fn unary(&self, operation: UnaryOperation) -> Result<DenseArray, ExpressionError> {
        Ok(DenseArray::new(
            self.shape.clone(),
            kernels::unary(operation, &self.data)?,
        ))
    }

    /// Apply `function` to the given arguments after broadcasting them against each other.
    pub fn function(
        function: ElementwiseFunction,
        arguments: &[&DenseArray],
    ) -> Result<DenseArray, ExpressionError> {
        let shape = arguments
            .iter()
            .try_fold(Vec::new(), |shape, argument| {
                broadcast_shapes(&shape, &argument.shape)
            })?;
        let data = arguments
            .iter()
            .map(|argument| argument.broadcast_to(&shape))
            .collect::<Vec<_>>();
        let data = kernels::function(function, &data.iter().collect::<Vec<_>>())?;

        Ok(DenseArray::new(shape, data))
    }

    /// Aggregate elements with `reduction`,
    /// either all of them or along one axis.
    pub fn reduce(
        &self,
        reduction: Reduction,
        axis: Option<i64>,
    ) -> Result<DenseArray, ExpressionError> {
        let Some(axis) = axis else {
            let value = kernels::reduce(reduction, &self.data, 0..self.data.len())?;
            return Ok(DenseArray::scalar(value));
        };
        let axis = normalize_axis(axis, self.ndim())?;

        let outer: usize = self.shape[..axis].iter().product();
        let length = self.shape[axis];
        let inner: usize = self.shape[axis + 1..].iter().product();

        let mut values = Vec::with_capacity(outer * inner);
        for outer_index in 0..outer {
            for inner_index in 0..inner {
                let indices = (0..length)
                    .map(|position| (outer_index * length + position) * inner + inner_index)
                    .collect::<Vec<_>>();
                values.push(kernels::reduce(
                    reduction,
                    &self.data.take(&indices),
                    0..length,
                )?);
            }
        }

        let mut shape = self.shape.clone();
        shape.remove(axis);
        let data = ElementVec::from_values(
            kernels::reduction_type(reduction, self.data.element_type()),
            values,
        );

        Ok(DenseArray::new(shape, data))
    }
}

impl From<ElementVec> for DenseArray {
    fn from(data: ElementVec) -> Self {
        DenseArray::new(vec![data.len()], data)
    }
}
