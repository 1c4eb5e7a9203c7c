//! This module defines [Array].

use std::sync::Arc;

use crate::{
    arrays::{DenseArray, NestedArray},
    datatypes::{ElementValue, ElementVec},
    error::Error,
    view::{column_field, View, ViewFormat, ViewParameters},
};

use super::{attrs_with_datatype, Attrs, LgdoType};

/// One-dimensional array of elements with attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    data: ElementVec,
    attrs: Attrs,
}

impl Array {
    /// Create a new [Array].
    pub fn new(data: impl Into<ElementVec>) -> Self {
        Self::with_attrs(data, Attrs::new())
    }

    /// Create a new [Array] with the given attributes.
    pub fn with_attrs(data: impl Into<ElementVec>, attrs: Attrs) -> Self {
        let mut result = Self {
            data: data.into(),
            attrs: Attrs::new(),
        };
        result.attrs = attrs_with_datatype(attrs, result.form_datatype());
        result
    }

    /// Return the elements.
    pub fn data(&self) -> &ElementVec {
        &self.data
    }

    /// Return the element at `index` or `None` if it is out of bounds.
    pub fn get(&self, index: usize) -> Option<ElementValue> {
        self.data.get(index)
    }

    /// Overwrite the element at `index`, converting `value` to the element type.
    ///
    /// Returns `false` if `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: impl Into<ElementValue>) -> bool {
        self.data.set(index, value.into())
    }

    /// Append an element, converting it to the element type.
    pub fn push(&mut self, value: impl Into<ElementValue>) {
        self.data.push(value.into());
    }
}

impl From<ElementVec> for Array {
    fn from(data: ElementVec) -> Self {
        Array::new(data)
    }
}

impl From<Vec<bool>> for Array {
    fn from(data: Vec<bool>) -> Self {
        Array::new(data)
    }
}

impl From<Vec<i64>> for Array {
    fn from(data: Vec<i64>) -> Self {
        Array::new(data)
    }
}

impl From<Vec<f64>> for Array {
    fn from(data: Vec<f64>) -> Self {
        Array::new(data)
    }
}

impl LgdoType for Array {
    fn datatype_name(&self) -> &'static str {
        "array"
    }

    fn form_datatype(&self) -> String {
        format!("array<1>{{{}}}", self.data.element_type().datatype_name())
    }

    fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    fn length(&self) -> Option<usize> {
        Some(self.data.len())
    }

    fn resize(&mut self, length: usize) -> Result<(), Error> {
        self.data.resize(length);
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
                DenseArray::from(self.data.clone()).with_units(units.map(String::from)),
            )),
            ViewFormat::Records => {
                if parameters.units() {
                    return Err(Error::UnitsNotSupported(format));
                }

                Ok(View::Nested(NestedArray::flat(self.data.clone())))
            }
            ViewFormat::Tabular => {
                let array = self.data.to_arrow();
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
        datatypes::Int64Type,
    };

    use crate::{
        datatypes::{ElementValue, ElementVec},
        error::Error,
        types::LgdoType,
        view::{ViewFormat, ViewParameters, UNITS_METADATA_KEY},
    };

    use super::Array;
    use test_log::test;

    #[test]
    fn resize_and_set() {
        let mut array = Array::from(vec![1.0, 2.0]);
        assert_eq!(array.form_datatype(), "array<1>{real}");

        array.resize(4).unwrap();
        assert!(array.set(3, 5i64));
        assert!(!array.set(4, 1.0));

        assert_eq!(array.data(), &ElementVec::from(vec![1.0, 2.0, 0.0, 5.0]));
        assert_eq!(array.get(3), Some(ElementValue::Float64(5.0)));
    }

    #[test]
    fn views_carry_units() {
        let mut array = Array::from(vec![true, false]);
        array
            .attrs_mut()
            .insert("units".to_string(), "m".into());
        let with_units = ViewParameters::default().with_units(true);

        let dense = array
            .view_as(ViewFormat::Array, &with_units)
            .unwrap()
            .into_dense()
            .unwrap();
        assert_eq!(dense.units(), Some("m"));

        let (field, column) = array
            .view_as(ViewFormat::Tabular, &with_units)
            .unwrap()
            .into_series()
            .unwrap();
        assert_eq!(column.len(), 2);
        assert_eq!(
            field.metadata().get(UNITS_METADATA_KEY).map(String::as_str),
            Some("m")
        );

        assert!(matches!(
            array.view_as(ViewFormat::Records, &with_units),
            Err(Error::UnitsNotSupported(ViewFormat::Records))
        ));
    }

    #[test]
    fn views_alias_the_elements() {
        let array = Array::from(vec![1i64, 2, 3]);
        let ElementVec::Int64(buffer) = array.data() else {
            panic!("expected integers");
        };
        let elements = buffer.as_ptr();
        let parameters = ViewParameters::default();

        let dense = array
            .view_as(ViewFormat::Array, &parameters)
            .unwrap()
            .into_dense()
            .unwrap();
        assert!(matches!(dense.data(), ElementVec::Int64(data) if data.as_ptr() == elements));

        let nested = array
            .view_as(ViewFormat::Records, &parameters)
            .unwrap()
            .into_nested()
            .unwrap();
        assert!(matches!(nested.content(), ElementVec::Int64(data) if data.as_ptr() == elements));

        let (_, column) = array
            .view_as(ViewFormat::Tabular, &parameters)
            .unwrap()
            .into_series()
            .unwrap();
        assert_eq!(column.as_primitive::<Int64Type>().values().as_ptr(), elements);
    }
}
