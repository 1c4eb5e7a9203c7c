//! This module defines the data objects and the capabilities they share.

pub mod array;
pub mod array_of_equal_sized_arrays;
pub mod lgdo_struct;
pub mod scalar;
pub mod table;
pub mod vector_of_vectors;

use std::{
    cell::{Ref, RefCell, RefMut},
    collections::BTreeMap,
    rc::Rc,
};

use enum_dispatch::enum_dispatch;

use crate::{
    error::Error,
    view::{View, ViewFormat, ViewParameters},
};

pub use array::Array;
pub use array_of_equal_sized_arrays::ArrayOfEqualSizedArrays;
pub use lgdo_struct::Struct;
pub use scalar::Scalar;
pub use table::Table;
pub use vector_of_vectors::VectorOfVectors;

/// Attributes attached to a data object
pub type Attrs = BTreeMap<String, serde_json::Value>;

/// Name of the attribute describing the layout of a data object
pub const DATATYPE_ATTRIBUTE: &str = "datatype";
/// Name of the attribute holding physical units
pub const UNITS_ATTRIBUTE: &str = "units";

/// Create attributes from `attrs`, with the `datatype` attribute set to `datatype`.
pub(crate) fn attrs_with_datatype(mut attrs: Attrs, datatype: String) -> Attrs {
    attrs.insert(
        DATATYPE_ATTRIBUTE.to_string(),
        serde_json::Value::String(datatype),
    );
    attrs
}

/// Capabilities shared by all data objects
#[enum_dispatch]
pub trait LgdoType {
    /// Name of the kind of object, e.g. `array` or `table`.
    fn datatype_name(&self) -> &'static str;

    /// Full description of the layout of this object as stored in the `datatype` attribute.
    fn form_datatype(&self) -> String;

    /// Attributes of this object.
    fn attrs(&self) -> &Attrs;

    /// Mutable access to the attributes of this object.
    ///
    /// The `datatype` attribute is maintained by the object itself.
    fn attrs_mut(&mut self) -> &mut Attrs;

    /// Number of rows, or `None` for objects without rows.
    fn length(&self) -> Option<usize>;

    /// Pad or truncate to `length` rows, keeping existing rows.
    ///
    /// # Errors
    /// Returns [Error::UnsupportedColumnType] for objects without rows.
    fn resize(&mut self, length: usize) -> Result<(), Error>;

    /// View this object in another representation.
    fn view_as(&self, format: ViewFormat, parameters: &ViewParameters) -> Result<View, Error>;

    /// Physical units of this object, if the `units` attribute is a string.
    fn units(&self) -> Option<&str> {
        self.attrs()
            .get(UNITS_ATTRIBUTE)
            .and_then(serde_json::Value::as_str)
    }
}

/// Data object
#[enum_dispatch(LgdoType)]
#[derive(Debug, Clone)]
pub enum Lgdo {
    /// Single value
    Scalar(Scalar),
    /// One-dimensional array
    Array(Array),
    /// Array of vectors that all have the same length
    ArrayOfEqualSizedArrays(ArrayOfEqualSizedArrays),
    /// Array of vectors of varying length
    VectorOfVectors(VectorOfVectors),
    /// Named collection of data objects
    Struct(Struct),
    /// Named collection of columns with a common number of rows
    Table(Table),
}

/// Shared handle to a data object
///
/// Cloning the handle does not copy the object:
/// changes made through one handle are visible through all others.
#[derive(Debug, Clone)]
pub struct LgdoRef(Rc<RefCell<Lgdo>>);

impl LgdoRef {
    /// Wrap a data object into a new handle.
    pub fn new(object: impl Into<Lgdo>) -> Self {
        Self(Rc::new(RefCell::new(object.into())))
    }

    /// Immutably borrow the data object.
    ///
    /// # Panics
    /// Panics if the object is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, Lgdo> {
        self.0.borrow()
    }

    /// Mutably borrow the data object.
    ///
    /// # Panics
    /// Panics if the object is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, Lgdo> {
        self.0.borrow_mut()
    }

    /// Return true iff both handles refer to the same object.
    pub fn ptr_eq(&self, other: &LgdoRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of rows of the referenced object.
    pub fn length(&self) -> Option<usize> {
        self.borrow().length()
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::Error,
        types::{Array, LgdoType, Scalar},
    };

    use super::{Lgdo, LgdoRef};
    use test_log::test;

    #[test]
    fn handles_share_objects() {
        let first = LgdoRef::new(Array::from(vec![1i64, 2, 3]));
        let second = first.clone();

        second.borrow_mut().resize(5).unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(first.length(), Some(5));
        assert!(!first.ptr_eq(&LgdoRef::new(Array::from(vec![1i64]))));
    }

    #[test]
    fn scalars_have_no_rows() {
        let mut scalar = Lgdo::from(Scalar::new(3i64));

        assert_eq!(scalar.length(), None);
        assert!(matches!(
            scalar.resize(3),
            Err(Error::UnsupportedColumnType(name)) if name == "real"
        ));
    }
}
