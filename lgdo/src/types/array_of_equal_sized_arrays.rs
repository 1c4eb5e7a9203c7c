//! This module defines [ArrayOfEqualSizedArrays].

use std::sync::Arc;

use arrow::{
    array::{ArrayRef, FixedSizeListArray},
    datatypes::Field,
    error::ArrowError,
};

use crate::{
    arrays::{DenseArray, NestedArray},
    datatypes::ElementVec,
    error::Error,
    view::{column_field, View, ViewFormat, ViewParameters},
};

use super::{attrs_with_datatype, Attrs, LgdoType};

/// Array of vectors that all have the same length
///
/// Elements are stored row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayOfEqualSizedArrays {
    rows: usize,
    vector_len: usize,
    data: ElementVec,
    attrs: Attrs,
}

impl ArrayOfEqualSizedArrays {
    /// Create a new [ArrayOfEqualSizedArrays] of `rows` vectors of length `vector_len`.
    ///
    /// # Panics
    /// Panics if `data` does not hold exactly `rows * vector_len` elements.
    pub fn new(rows: usize, vector_len: usize, data: impl Into<ElementVec>) -> Self {
        Self::with_attrs(rows, vector_len, data, Attrs::new())
    }

    /// Create a new [ArrayOfEqualSizedArrays] with the given attributes.
    ///
    /// # Panics
    /// Panics if `data` does not hold exactly `rows * vector_len` elements.
    pub fn with_attrs(
        rows: usize,
        vector_len: usize,
        data: impl Into<ElementVec>,
        attrs: Attrs,
    ) -> Self {
        let data = data.into();
        assert_eq!(
            rows * vector_len,
            data.len(),
            "data must hold rows * vector_len elements"
        );

        let mut result = Self {
            rows,
            vector_len,
            data,
            attrs: Attrs::new(),
        };
        result.attrs = attrs_with_datatype(attrs, result.form_datatype());
        result
    }

    /// Create a new [ArrayOfEqualSizedArrays] from a two-dimensional [DenseArray].
    pub fn from_dense(array: DenseArray) -> Option<Self> {
        let &[rows, vector_len] = array.shape() else {
            return None;
        };

        Some(Self::new(rows, vector_len, array.into_data()))
    }

    /// Return the number of vectors.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Return the length of each vector.
    pub fn vector_len(&self) -> usize {
        self.vector_len
    }

    /// Return the elements, row by row.
    pub fn data(&self) -> &ElementVec {
        &self.data
    }

    /// Return the vector at `row` or `None` if it is out of bounds.
    pub fn row(&self, row: usize) -> Option<ElementVec> {
        (row < self.rows).then(|| {
            self.data
                .slice(row * self.vector_len..(row + 1) * self.vector_len)
        })
    }

    fn to_dense(&self) -> DenseArray {
        DenseArray::new(vec![self.rows, self.vector_len], self.data.clone())
    }
}

impl LgdoType for ArrayOfEqualSizedArrays {
    fn datatype_name(&self) -> &'static str {
        "array_of_equalsized_arrays"
    }

    fn form_datatype(&self) -> String {
        format!(
            "array_of_equalsized_arrays<1,1>{{{}}}",
            self.data.element_type().datatype_name()
        )
    }

    fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    fn length(&self) -> Option<usize> {
        Some(self.rows)
    }

    fn resize(&mut self, length: usize) -> Result<(), Error> {
        self.data.resize(length * self.vector_len);
        self.rows = length;
        Ok(())
    }

    fn view_as(&self, format: ViewFormat, parameters: &ViewParameters) -> Result<View, Error> {
        let units = if parameters.units() {
            self.units()
        } else {
            None
        };

        match format {
            ViewFormat::Array => Ok(View::Dense(
                self.to_dense().with_units(units.map(String::from)),
            )),
            ViewFormat::Records => {
                if parameters.units() {
                    return Err(Error::UnitsNotSupported(format));
                }

                let offsets = (0..=self.rows).map(|row| row * self.vector_len).collect();
                Ok(View::Nested(NestedArray::new(
                    vec![offsets],
                    self.data.clone(),
                )))
            }
            ViewFormat::Tabular => {
                let size = i32::try_from(self.vector_len).map_err(|_| {
                    ArrowError::InvalidArgumentError(format!(
                        "vector length {} exceeds the capacity of a fixed size list",
                        self.vector_len
                    ))
                })?;
                let item = Field::new("item", self.data.element_type().arrow_type(), false);
                let array = FixedSizeListArray::try_new(
                    Arc::new(item),
                    size,
                    self.data.to_arrow(),
                    None,
                )?;

                let array: ArrayRef = Arc::new(array);
                let field = column_field("", &array, units);

                Ok(View::Series {
                    field: Arc::new(field),
                    array,
                })
            }
        }
    }
}
