//! This module defines the engines evaluating an [ExpressionTree] on numeric data.
//!
//! The [vectorized] engine works on regular arrays only and compiles the expression
//! into a [StackProgram][vectorized::StackProgram].
//! The [general] engine walks the expression over ragged arrays.

pub mod general;
pub mod vectorized;

use std::collections::HashMap;

use crate::{
    datatypes::ElementValue,
    error::ExpressionError,
    expression::{
        operations::UnaryOperation,
        tree::{ExpressionLeaf, ExpressionTree},
    },
};

/// Named values an expression may refer to in addition to the columns of a table
pub type EvaluationParameters = HashMap<String, ElementValue>;

/// Value of the `axis` keyword of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    /// No `axis` keyword was given
    Default,
    /// `axis=None`
    All,
    /// Explicit index, possibly negative
    Index(i64),
}

/// Extract the `axis` keyword from the keyword arguments of a call to `function`.
pub(crate) fn axis_keyword(
    function: &str,
    keywords: &[(String, ExpressionTree)],
) -> Result<Axis, ExpressionError> {
    let mut axis = Axis::Default;

    for (keyword, value) in keywords {
        if keyword != "axis" {
            return Err(ExpressionError::UnexpectedKeyword {
                function: function.to_string(),
                keyword: keyword.clone(),
            });
        }

        axis = match value {
            ExpressionTree::Leaf(ExpressionLeaf::NoneLiteral) => Axis::All,
            ExpressionTree::Leaf(ExpressionLeaf::Constant(ElementValue::Int64(index))) => {
                Axis::Index(*index)
            }
            ExpressionTree::Unary(UnaryOperation::Negation, sub) => match sub.as_ref() {
                ExpressionTree::Leaf(ExpressionLeaf::Constant(ElementValue::Int64(index))) => {
                    Axis::Index(-index)
                }
                _ => return Err(ExpressionError::NonConstantAxis(function.to_string())),
            },
            _ => return Err(ExpressionError::NonConstantAxis(function.to_string())),
        };
    }

    Ok(axis)
}

/// Reject any keyword arguments of a call to `function`.
pub(crate) fn no_keywords(
    function: &str,
    keywords: &[(String, ExpressionTree)],
) -> Result<(), ExpressionError> {
    match keywords.first() {
        Some((keyword, _)) => Err(ExpressionError::UnexpectedKeyword {
            function: function.to_string(),
            keyword: keyword.clone(),
        }),
        None => Ok(()),
    }
}

/// Check that a call to `function` has `expected` positional arguments.
pub(crate) fn check_argument_count(
    function: &str,
    expected: usize,
    arguments: &[ExpressionTree],
) -> Result<(), ExpressionError> {
    if arguments.len() == expected {
        Ok(())
    } else {
        Err(ExpressionError::WrongArgumentCount {
            function: function.to_string(),
            expected,
            given: arguments.len(),
        })
    }
}
