//! This module defines [VectorOfVectors].

use std::sync::Arc;

use arrow::{
    array::{ArrayRef, LargeListArray},
    buffer::OffsetBuffer,
    datatypes::Field,
    error::ArrowError,
};

use crate::{
    arrays::NestedArray,
    datatypes::{ElementType, ElementVec},
    error::Error,
    view::{column_field, View, ViewFormat, ViewParameters},
};

use super::{attrs_with_datatype, Attrs, LgdoType};

/// Array of vectors of varying length
///
/// All vectors are stored back to back in `flattened_data`.
/// Vector `i` ends at `cumulative_length[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorOfVectors {
    flattened_data: ElementVec,
    cumulative_length: Vec<usize>,
    attrs: Attrs,
}

impl VectorOfVectors {
    /// Create a new [VectorOfVectors].
    ///
    /// # Panics
    /// Panics if `cumulative_length` is decreasing
    /// or does not end at the length of `flattened_data`.
    pub fn new(flattened_data: impl Into<ElementVec>, cumulative_length: Vec<usize>) -> Self {
        Self::with_attrs(flattened_data, cumulative_length, Attrs::new())
    }

    /// Create a new [VectorOfVectors] with the given attributes.
    ///
    /// # Panics
    /// Panics if `cumulative_length` is decreasing
    /// or does not end at the length of `flattened_data`.
    pub fn with_attrs(
        flattened_data: impl Into<ElementVec>,
        cumulative_length: Vec<usize>,
        attrs: Attrs,
    ) -> Self {
        let flattened_data = flattened_data.into();
        assert!(
            cumulative_length.windows(2).all(|pair| pair[0] <= pair[1]),
            "cumulative lengths must not decrease"
        );
        assert_eq!(
            cumulative_length.last().copied().unwrap_or(0),
            flattened_data.len(),
            "cumulative lengths must end at the number of elements"
        );

        let mut result = Self {
            flattened_data,
            cumulative_length,
            attrs: Attrs::new(),
        };
        result.attrs = attrs_with_datatype(attrs, result.form_datatype());
        result
    }

    /// Create an empty [VectorOfVectors] for elements of the given type.
    pub fn empty(element_type: ElementType) -> Self {
        Self::new(ElementVec::new(element_type), Vec::new())
    }

    /// Create a new [VectorOfVectors] from a two-dimensional [NestedArray].
    pub fn from_nested(array: &NestedArray) -> Option<Self> {
        let cumulative_length = array.cumulative_length()?.to_vec();
        Some(Self::new(array.content().clone(), cumulative_length))
    }

    /// Return the number of vectors.
    pub fn len(&self) -> usize {
        self.cumulative_length.len()
    }

    /// Return true iff there are no vectors.
    pub fn is_empty(&self) -> bool {
        self.cumulative_length.is_empty()
    }

    /// Return the elements of all vectors, back to back.
    pub fn flattened_data(&self) -> &ElementVec {
        &self.flattened_data
    }

    /// Return the end offset of each vector.
    pub fn cumulative_length(&self) -> &[usize] {
        &self.cumulative_length
    }

    fn start(&self, index: usize) -> usize {
        match index {
            0 => 0,
            _ => self.cumulative_length[index - 1],
        }
    }

    /// Return the vector at `index` or `None` if it is out of bounds.
    pub fn get(&self, index: usize) -> Option<ElementVec> {
        let end = *self.cumulative_length.get(index)?;
        Some(self.flattened_data.slice(self.start(index)..end))
    }

    /// Append a vector, converting its elements to the element type.
    pub fn push(&mut self, vector: impl Into<ElementVec>) {
        self.flattened_data.extend_from(&vector.into());
        self.cumulative_length.push(self.flattened_data.len());
    }

    fn to_nested(&self) -> NestedArray {
        NestedArray::from_cumulative_length(&self.cumulative_length, self.flattened_data.clone())
    }
}

macro_rules! from_vectors {
    ($type:ty) => {
        impl From<Vec<Vec<$type>>> for VectorOfVectors {
            fn from(vectors: Vec<Vec<$type>>) -> Self {
                let mut cumulative_length = Vec::with_capacity(vectors.len());
                let mut end = 0;
                for vector in &vectors {
                    end += vector.len();
                    cumulative_length.push(end);
                }

                let flattened_data = vectors.into_iter().flatten().collect::<Vec<$type>>();
                VectorOfVectors::new(flattened_data, cumulative_length)
            }
        }
    };
}

from_vectors!(bool);
from_vectors!(i64);
from_vectors!(f64);

impl LgdoType for VectorOfVectors {
    fn datatype_name(&self) -> &'static str {
        "array"
    }

    fn form_datatype(&self) -> String {
        format!(
            "array<1>{{array<1>{{{}}}}}",
            self.flattened_data.element_type().datatype_name()
        )
    }

    fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    fn length(&self) -> Option<usize> {
        Some(self.len())
    }

    fn resize(&mut self, length: usize) -> Result<(), Error> {
        if length <= self.len() {
            self.cumulative_length.truncate(length);
            self.flattened_data
                .truncate(self.cumulative_length.last().copied().unwrap_or(0));
        } else {
            let end = self.flattened_data.len();
            self.cumulative_length.resize(length, end);
        }

        Ok(())
    }

    fn view_as(&self, format: ViewFormat, parameters: &ViewParameters) -> Result<View, Error> {
        match format {
            ViewFormat::Array => Err(Error::FormatNotSupported {
                format,
                datatype: self.form_datatype(),
            }),
            ViewFormat::Records => {
                if parameters.units() {
                    return Err(Error::UnitsNotSupported(format));
                }

                Ok(View::Nested(self.to_nested()))
            }
            ViewFormat::Tabular => {
                let offsets = std::iter::once(0)
                    .chain(self.cumulative_length.iter().copied())
                    .map(i64::try_from)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|error| ArrowError::InvalidArgumentError(error.to_string()))?;

                let item = Field::new("item", self.flattened_data.element_type().arrow_type(), false);
                let array = LargeListArray::try_new(
                    Arc::new(item),
                    OffsetBuffer::new(offsets.into()),
                    self.flattened_data.to_arrow(),
                    None,
                )?;

                let array: ArrayRef = Arc::new(array);
                let units = if parameters.units() {
                    self.units()
                } else {
                    None
                };
                let field = column_field("", &array, units);

                Ok(View::Series {
                    field: Arc::new(field),
                    array,
                })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use arrow::{
        array::{Array as _, AsArray},
        datatypes::{DataType, Int64Type},
    };

    use crate::{
        datatypes::ElementVec,
        error::Error,
        types::LgdoType,
        view::{ViewFormat, ViewParameters},
    };

    use super::VectorOfVectors;
    use test_log::test;

    fn ragged() -> VectorOfVectors {
        VectorOfVectors::from(vec![vec![5i64], vec![6, 7], vec![8, 9, 0]])
    }

    #[test]
    fn construct_and_read_back() {
        let mut vectors = ragged();
        assert_eq!(vectors.cumulative_length(), &[1, 3, 6]);
        assert_eq!(vectors.get(1), Some(ElementVec::from(vec![6i64, 7])));
        assert_eq!(vectors.get(3), None);
        assert_eq!(vectors.form_datatype(), "array<1>{array<1>{real}}");

        vectors.push(vec![1.5, 2.5]);
        assert_eq!(vectors.get(3), Some(ElementVec::from(vec![1i64, 2])));
    }

    #[test]
    fn resize_truncates_or_appends_empty_vectors() {
        let mut vectors = ragged();

        vectors.resize(2).unwrap();
        assert_eq!(vectors.cumulative_length(), &[1, 3]);
        assert_eq!(vectors.flattened_data().len(), 3);

        vectors.resize(4).unwrap();
        assert_eq!(vectors.cumulative_length(), &[1, 3, 3, 3]);
        assert_eq!(vectors.get(3), Some(ElementVec::from(Vec::<i64>::new())));
    }

    #[test]
    fn views() {
        let nested = ragged()
            .view_as(ViewFormat::Records, &ViewParameters::default())
            .unwrap()
            .into_nested()
            .unwrap();
        assert_eq!(nested.ndim(), 2);

        let (_, column) = ragged()
            .view_as(ViewFormat::Tabular, &ViewParameters::default())
            .unwrap()
            .into_series()
            .unwrap();
        assert_eq!(column.len(), 3);
        assert!(matches!(column.data_type(), DataType::LargeList(_)));

        assert!(matches!(
            ragged().view_as(ViewFormat::Array, &ViewParameters::default()),
            Err(Error::FormatNotSupported { .. })
        ));
    }

    #[test]
    fn views_alias_the_flattened_data() {
        let vectors = ragged();
        let ElementVec::Int64(buffer) = vectors.flattened_data() else {
            panic!("expected integers");
        };

        let nested = vectors
            .view_as(ViewFormat::Records, &ViewParameters::default())
            .unwrap()
            .into_nested()
            .unwrap();
        assert!(matches!(nested.content(), ElementVec::Int64(data) if data.as_ptr() == buffer.as_ptr()));

        let (_, column) = vectors
            .view_as(ViewFormat::Tabular, &ViewParameters::default())
            .unwrap()
            .into_series()
            .unwrap();
        let values = column.as_list::<i64>().values().as_primitive::<Int64Type>().values().as_ptr();
        assert_eq!(values, buffer.as_ptr());
    }
}
