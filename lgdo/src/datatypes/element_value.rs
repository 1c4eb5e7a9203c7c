//! This module defines [ElementValue].

use std::fmt::Display;

use super::ElementType;

/// A single element of one of the supported [ElementType]s
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ElementValue {
    /// Value of type [`bool`]
    Bool(bool),
    /// Value of type [`i64`]
    Int64(i64),
    /// Value of type [`f64`]
    Float64(f64),
}

impl ElementValue {
    /// Return the [ElementType] of this value.
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementValue::Bool(_) => ElementType::Bool,
            ElementValue::Int64(_) => ElementType::Int64,
            ElementValue::Float64(_) => ElementType::Float64,
        }
    }

    /// Convert this value into an [`f64`].
    pub fn to_f64(&self) -> f64 {
        match self {
            ElementValue::Bool(value) => f64::from(u8::from(*value)),
            ElementValue::Int64(value) => *value as f64,
            ElementValue::Float64(value) => *value,
        }
    }

    /// Convert this value into an [`i64`], truncating floating point values.
    pub fn to_i64(&self) -> i64 {
        match self {
            ElementValue::Bool(value) => i64::from(*value),
            ElementValue::Int64(value) => *value,
            ElementValue::Float64(value) => *value as i64,
        }
    }

    /// Convert this value into a [`bool`], which is `true` for any non-zero number.
    pub fn to_bool(&self) -> bool {
        match self {
            ElementValue::Bool(value) => *value,
            ElementValue::Int64(value) => *value != 0,
            ElementValue::Float64(value) => *value != 0.0,
        }
    }

    /// Convert this value into a value of the given [ElementType].
    pub fn cast(self, element_type: ElementType) -> Self {
        match element_type {
            ElementType::Bool => ElementValue::Bool(self.to_bool()),
            ElementType::Int64 => ElementValue::Int64(self.to_i64()),
            ElementType::Float64 => ElementValue::Float64(self.to_f64()),
        }
    }
}

impl From<bool> for ElementValue {
    fn from(value: bool) -> Self {
        ElementValue::Bool(value)
    }
}

impl From<i64> for ElementValue {
    fn from(value: i64) -> Self {
        ElementValue::Int64(value)
    }
}

impl From<f64> for ElementValue {
    fn from(value: f64) -> Self {
        ElementValue::Float64(value)
    }
}

impl From<ElementValue> for serde_json::Value {
    fn from(value: ElementValue) -> Self {
        match value {
            ElementValue::Bool(value) => serde_json::Value::from(value),
            ElementValue::Int64(value) => serde_json::Value::from(value),
            ElementValue::Float64(value) => serde_json::Value::from(value),
        }
    }
}

impl Display for ElementValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementValue::Bool(value) => write!(f, "{value}"),
            ElementValue::Int64(value) => write!(f, "{value}"),
            ElementValue::Float64(value) => write!(f, "{value}"),
        }
    }
}
