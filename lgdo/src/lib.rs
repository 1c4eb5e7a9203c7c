//! This crate defines in-memory data objects for structured scientific data.
//!
//! The central type is [Table][types::table::Table], a collection of named
//! columns that share a common number of rows. Columns are themselves data objects
//! ([Array][types::array::Array], [ArrayOfEqualSizedArrays][types::array_of_equal_sized_arrays::ArrayOfEqualSizedArrays],
//! [VectorOfVectors][types::vector_of_vectors::VectorOfVectors] or nested tables)
//! that can be shared between tables without copying.
//! Tables support expression evaluation over their columns
//! and can be viewed as Arrow record batches or struct arrays.

#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts
)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    variant_size_differences,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]

pub mod arrays;
pub mod datatypes;
pub mod error;
pub mod evaluation;
pub mod expression;
pub mod types;
pub mod view;

pub use error::Error;
pub use types::{Lgdo, LgdoRef, LgdoType};
