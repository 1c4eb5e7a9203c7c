//! This module defines [Scalar].

use crate::{
    arrays::DenseArray,
    datatypes::ElementValue,
    error::Error,
    view::{View, ViewFormat, ViewParameters},
};

use super::{attrs_with_datatype, Attrs, LgdoType};

/// Single value with attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    value: ElementValue,
    attrs: Attrs,
}

impl Scalar {
    /// Create a new [Scalar].
    pub fn new(value: impl Into<ElementValue>) -> Self {
        Self::with_attrs(value, Attrs::new())
    }

    /// Create a new [Scalar] with the given attributes.
    pub fn with_attrs(value: impl Into<ElementValue>, attrs: Attrs) -> Self {
        let value = value.into();
        let datatype = value.element_type().datatype_name().to_string();

        Self {
            value,
            attrs: attrs_with_datatype(attrs, datatype),
        }
    }

    /// Return the value.
    pub fn value(&self) -> ElementValue {
        self.value
    }

    /// Replace the value.
    pub fn set_value(&mut self, value: impl Into<ElementValue>) {
        *self = Self::with_attrs(value, std::mem::take(&mut self.attrs));
    }
}

impl LgdoType for Scalar {
    fn datatype_name(&self) -> &'static str {
        self.value.element_type().datatype_name()
    }

    fn form_datatype(&self) -> String {
        self.datatype_name().to_string()
    }

    fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    fn length(&self) -> Option<usize> {
        None
    }

    fn resize(&mut self, _length: usize) -> Result<(), Error> {
        Err(Error::UnsupportedColumnType(self.datatype_name().to_string()))
    }

    fn view_as(&self, format: ViewFormat, parameters: &ViewParameters) -> Result<View, Error> {
        match format {
            ViewFormat::Array => {
                let units = parameters
                    .units()
                    .then(|| self.units().map(String::from))
                    .flatten();
                Ok(View::Dense(DenseArray::scalar(self.value).with_units(units)))
            }
            _ => Err(Error::FormatNotSupported {
                format,
                datatype: self.datatype_name().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        datatypes::ElementValue,
        types::LgdoType,
        view::{ViewFormat, ViewParameters},
    };

    use super::Scalar;
    use test_log::test;

    #[test]
    fn datatype_follows_value() {
        let mut scalar = Scalar::new(true);
        assert_eq!(scalar.form_datatype(), "bool");

        scalar.set_value(2.5);
        assert_eq!(scalar.attrs()["datatype"], "real");
        assert_eq!(scalar.value(), ElementValue::Float64(2.5));
    }

    #[test]
    fn views() {
        let mut scalar = Scalar::new(7i64);
        scalar
            .attrs_mut()
            .insert("units".to_string(), "ns".into());

        let dense = scalar
            .view_as(ViewFormat::Array, &ViewParameters::default().with_units(true))
            .unwrap()
            .into_dense()
            .unwrap();
        assert_eq!(dense.item(), Some(ElementValue::Int64(7)));
        assert_eq!(dense.units(), Some("ns"));

        assert!(scalar
            .view_as(ViewFormat::Tabular, &ViewParameters::default())
            .is_err());
    }
}
