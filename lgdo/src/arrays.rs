//! This module defines the numeric views of data objects used for evaluating expressions.
//!
//! Regular data is viewed as a [DenseArray], ragged data as a [NestedArray].

pub mod dense;
pub mod kernels;
pub mod nested;

pub use dense::DenseArray;
pub use nested::NestedArray;
