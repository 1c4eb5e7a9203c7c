//! This module defines the expression language understood by [crate::types::Table::eval].

pub mod operations;
pub mod parser;
pub mod tree;

pub use parser::{parse_expression, MAX_NESTING_DEPTH};
pub use tree::{ExpressionLeaf, ExpressionTree};
