//! This module defines the views of data objects in third-party representations.

use std::{collections::HashMap, str::FromStr, sync::Arc};

use arrow::{
    array::{Array as _, ArrayRef, StructArray},
    datatypes::Field,
    record_batch::RecordBatch,
};
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::{
    arrays::{DenseArray, NestedArray},
    error::Error,
};

/// Key of the Arrow field metadata holding physical units
pub const UNITS_METADATA_KEY: &str = "units";

/// Third-party representations a data object can be viewed as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ViewFormat {
    /// Arrow arrays and record batches with physical units as field metadata
    #[strum(to_string = "tabular", serialize = "pd")]
    Tabular,
    /// Nested records, i.e. [NestedArray]s for columns and Arrow struct arrays for tables
    #[strum(to_string = "records", serialize = "ak")]
    Records,
    /// Regular n-dimensional [DenseArray]s
    #[strum(to_string = "array", serialize = "np")]
    Array,
}

impl ViewFormat {
    /// Look up a format by its name or alias.
    pub fn parse(name: &str) -> Result<Self, Error> {
        Self::from_str(name).map_err(|_| Error::UnsupportedFormat(name.to_string()))
    }
}

/// Parameters of a view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewParameters {
    /// Whether physical units are carried along
    pub(crate) with_units: bool,
    /// Subset and order of the table columns to include
    pub(crate) columns: Option<Vec<String>>,
    /// Prepended to the names of flattened columns
    pub(crate) prefix: String,
}

impl ViewParameters {
    /// Set whether physical units are carried along.
    pub fn with_units(mut self, with_units: bool) -> Self {
        self.with_units = with_units;
        self
    }

    /// Restrict the view of a table to the given columns, in the given order.
    pub fn with_columns<Iter, S>(mut self, columns: Iter) -> Self
    where
        Iter: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the prefix prepended to the names of flattened columns.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Return whether physical units are carried along.
    pub fn units(&self) -> bool {
        self.with_units
    }

    /// Return the selected columns, if any.
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Return the prefix of flattened column names.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Field describing a column view,
/// named `name` and carrying `units` as metadata if given.
pub(crate) fn column_field(name: &str, array: &ArrayRef, units: Option<&str>) -> Field {
    let field = Field::new(name, array.data_type().clone(), array.null_count() > 0);

    match units {
        Some(units) => field.with_metadata(HashMap::from([(
            UNITS_METADATA_KEY.to_string(),
            units.to_string(),
        )])),
        None => field,
    }
}

/// View of a data object
#[derive(Debug, Clone)]
pub enum View {
    /// Regular numeric array
    Dense(DenseArray),
    /// Ragged numeric array
    Nested(NestedArray),
    /// Single Arrow column with its field description
    Series {
        /// Field describing the column; it is unnamed until placed in a table
        field: Arc<Field>,
        /// Data of the column
        array: ArrayRef,
    },
    /// Table of flat Arrow columns
    Frame(RecordBatch),
    /// Arrow struct array, possibly with nested struct columns
    Records(StructArray),
}

impl View {
    /// Return the dense array of this view, if it is one.
    pub fn into_dense(self) -> Option<DenseArray> {
        match self {
            View::Dense(array) => Some(array),
            _ => None,
        }
    }

    /// Return the nested array of this view, if it is one.
    pub fn into_nested(self) -> Option<NestedArray> {
        match self {
            View::Nested(array) => Some(array),
            _ => None,
        }
    }

    /// Return the Arrow column and its field of this view, if it is one.
    pub fn into_series(self) -> Option<(Arc<Field>, ArrayRef)> {
        match self {
            View::Series { field, array } => Some((field, array)),
            _ => None,
        }
    }

    /// Return the record batch of this view, if it is one.
    pub fn into_frame(self) -> Option<RecordBatch> {
        match self {
            View::Frame(batch) => Some(batch),
            _ => None,
        }
    }

    /// Return the struct array of this view, if it is one.
    pub fn into_records(self) -> Option<StructArray> {
        match self {
            View::Records(array) => Some(array),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::error::Error;

    use super::{ViewFormat, ViewParameters};
    use test_log::test;

    #[test]
    fn format_names_and_aliases() {
        assert_eq!(ViewFormat::parse("pd").unwrap(), ViewFormat::Tabular);
        assert_eq!(ViewFormat::parse("records").unwrap(), ViewFormat::Records);
        assert_eq!(ViewFormat::parse("np").unwrap(), ViewFormat::Array);
        assert_eq!(ViewFormat::Records.to_string(), "records");
        assert!(matches!(
            ViewFormat::parse("xarray"),
            Err(Error::UnsupportedFormat(name)) if name == "xarray"
        ));
    }

    #[test]
    fn parameters_chain() {
        let parameters = ViewParameters::default()
            .with_units(true)
            .with_columns(["b", "a"])
            .with_prefix("sub_");

        assert!(parameters.units());
        assert_eq!(
            parameters.columns(),
            Some(&["b".to_string(), "a".to_string()][..])
        );
        assert_eq!(parameters.prefix(), "sub_");
    }
}
