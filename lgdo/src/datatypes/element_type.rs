//! This module defines [ElementType].

use std::fmt::Display;

use arrow::datatypes::DataType;

/// Descriptors to refer to the possible element types at runtime.
///
/// The order of the variants is the order of type promotion,
/// i.e. combining two element types yields the larger one.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub enum ElementType {
    /// Data type [`bool`]
    Bool,
    /// Data type [`i64`]
    Int64,
    /// Data type [`f64`]
    Float64,
}

impl ElementType {
    /// Return the type both `self` and `other` can be converted to without loss of kind.
    pub fn promote(self, other: Self) -> Self {
        std::cmp::max(self, other)
    }

    /// Return the type in which arithmetic on this type is carried out.
    ///
    /// Booleans take part in arithmetic as integers.
    pub fn arithmetic(self) -> Self {
        std::cmp::max(self, ElementType::Int64)
    }

    /// Name of this type as used in the `datatype` attribute.
    pub fn datatype_name(&self) -> &'static str {
        match self {
            ElementType::Bool => "bool",
            ElementType::Int64 | ElementType::Float64 => "real",
        }
    }

    /// Return the corresponding Arrow [DataType].
    pub fn arrow_type(&self) -> DataType {
        match self {
            ElementType::Bool => DataType::Boolean,
            ElementType::Int64 => DataType::Int64,
            ElementType::Float64 => DataType::Float64,
        }
    }
}

impl Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementType::Bool => write!(f, "bool"),
            ElementType::Int64 => write!(f, "int64"),
            ElementType::Float64 => write!(f, "float64"),
        }
    }
}
