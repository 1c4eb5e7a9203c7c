//! This module defines the engine evaluating expressions over ragged data.
//!
//! Functions are only reachable through the `np.` and `ak.` namespaces.

use std::{collections::HashMap, str::FromStr};

use crate::{
    arrays::{dense::normalize_axis, kernels, NestedArray},
    datatypes::{ElementValue, ElementVec},
    error::ExpressionError,
    expression::{
        operations::{ElementwiseFunction, Namespace, Reduction, StructureFunction},
        tree::{ExpressionLeaf, ExpressionTree},
    },
};

use super::{axis_keyword, check_argument_count, no_keywords, Axis};

/// Value computed by the general engine
#[derive(Debug, Clone, PartialEq)]
pub enum GeneralValue {
    /// A single number
    Scalar(ElementValue),
    /// Possibly ragged lists of numbers
    Nested(NestedArray),
}

impl GeneralValue {
    /// Return the number of dimensions of this value.
    pub fn ndim(&self) -> usize {
        match self {
            GeneralValue::Scalar(_) => 0,
            GeneralValue::Nested(array) => array.ndim(),
        }
    }
}

fn reduce(
    name: &str,
    reduction: Reduction,
    value: GeneralValue,
    axis: Axis,
) -> Result<GeneralValue, ExpressionError> {
    let array = match value {
        GeneralValue::Scalar(value) => {
            if let Axis::Index(axis) = axis {
                return Err(ExpressionError::InvalidAxis { axis, ndim: 0 });
            }

            return kernels::reduce(reduction, &ElementVec::repeat(value, 1), 0..1)
                .map(GeneralValue::Scalar);
        }
        GeneralValue::Nested(array) => array,
    };

    match axis {
        Axis::Default | Axis::All => array.reduce_all(reduction).map(GeneralValue::Scalar),
        Axis::Index(index) => {
            let normalized = normalize_axis(index, array.ndim())?;
            if normalized + 1 != array.ndim() {
                return Err(ExpressionError::UnsupportedAxis {
                    function: name.to_string(),
                    axis: index,
                });
            }

            if array.ndim() == 1 {
                array.reduce_all(reduction).map(GeneralValue::Scalar)
            } else {
                array.reduce_innermost(reduction).map(GeneralValue::Nested)
            }
        }
    }
}

fn structure(
    name: &str,
    function: StructureFunction,
    value: GeneralValue,
    axis: Axis,
) -> Result<GeneralValue, ExpressionError> {
    let GeneralValue::Nested(array) = value else {
        return Err(ExpressionError::UnsupportedOperand {
            operation: name.to_string(),
            operand: "scalar".to_string(),
        });
    };

    match function {
        StructureFunction::Num => {
            let axis = match axis {
                Axis::Default => 1,
                Axis::Index(index) => index,
                Axis::All => {
                    return Err(ExpressionError::UnsupportedOperand {
                        operation: name.to_string(),
                        operand: "axis=None".to_string(),
                    })
                }
            };

            if normalize_axis(axis, array.ndim())? == 0 {
                let length = i64::try_from(array.len()).unwrap_or(i64::MAX);
                return Ok(GeneralValue::Scalar(ElementValue::Int64(length)));
            }

            array.num(axis).map(GeneralValue::Nested)
        }
        StructureFunction::Flatten => {
            let axis = match axis {
                Axis::Default => Some(1),
                Axis::All => None,
                Axis::Index(index) => Some(index),
            };

            array.flatten(axis).map(GeneralValue::Nested)
        }
    }
}

fn elementwise(
    function: ElementwiseFunction,
    arguments: Vec<GeneralValue>,
) -> Result<GeneralValue, ExpressionError> {
    let single = |value: ElementValue| ElementVec::repeat(value, 1);
    let first = |result: ElementVec| {
        GeneralValue::Scalar(result.get(0).unwrap_or(ElementValue::Float64(f64::NAN)))
    };

    match arguments.as_slice() {
        [GeneralValue::Scalar(value)] => {
            kernels::function(function, &[&single(*value)]).map(first)
        }
        [GeneralValue::Nested(array)] => array.function(function).map(GeneralValue::Nested),
        [GeneralValue::Scalar(left), GeneralValue::Scalar(right)] => {
            kernels::function(function, &[&single(*left), &single(*right)]).map(first)
        }
        [GeneralValue::Nested(left), GeneralValue::Scalar(right)] => left
            .function2(function, &left.filled_with(*right))
            .map(GeneralValue::Nested),
        [GeneralValue::Scalar(left), GeneralValue::Nested(right)] => right
            .filled_with(*left)
            .function2(function, right)
            .map(GeneralValue::Nested),
        [GeneralValue::Nested(left), GeneralValue::Nested(right)] => {
            left.function2(function, right).map(GeneralValue::Nested)
        }
        _ => Err(ExpressionError::WrongArgumentCount {
            function: function.to_string(),
            expected: function.arity(),
            given: arguments.len(),
        }),
    }
}

/// Evaluate `tree`, resolving references through `values`.
///
/// Evaluation recurses along the tree, whose height should therefore stay within
/// [MAX_NESTING_DEPTH](crate::expression::MAX_NESTING_DEPTH) as for every parsed tree.
pub fn evaluate(
    tree: &ExpressionTree,
    values: &HashMap<String, GeneralValue>,
) -> Result<GeneralValue, ExpressionError> {
    match tree {
        ExpressionTree::Leaf(ExpressionLeaf::Constant(value)) => Ok(GeneralValue::Scalar(*value)),
        ExpressionTree::Leaf(ExpressionLeaf::Reference(name)) => values
            .get(name)
            .cloned()
            .ok_or_else(|| ExpressionError::UnknownIdentifier(name.clone())),
        ExpressionTree::Leaf(ExpressionLeaf::NoneLiteral) => {
            Err(ExpressionError::UnsupportedOperand {
                operation: "expression".to_string(),
                operand: "None".to_string(),
            })
        }
        ExpressionTree::Unary(operation, sub) => match evaluate(sub, values)? {
            GeneralValue::Scalar(value) => {
                kernels::unary_value(*operation, value).map(GeneralValue::Scalar)
            }
            GeneralValue::Nested(array) => array.unary(*operation).map(GeneralValue::Nested),
        },
        ExpressionTree::Binary {
            operation,
            left,
            right,
        } => {
            let left = evaluate(left, values)?;
            let right = evaluate(right, values)?;

            match (left, right) {
                (GeneralValue::Scalar(left), GeneralValue::Scalar(right)) => {
                    kernels::binary_value(*operation, left, right).map(GeneralValue::Scalar)
                }
                (GeneralValue::Nested(left), GeneralValue::Scalar(right)) => left
                    .binary_scalar(*operation, right, false)
                    .map(GeneralValue::Nested),
                (GeneralValue::Scalar(left), GeneralValue::Nested(right)) => right
                    .binary_scalar(*operation, left, true)
                    .map(GeneralValue::Nested),
                (GeneralValue::Nested(left), GeneralValue::Nested(right)) => {
                    left.binary(*operation, &right).map(GeneralValue::Nested)
                }
            }
        }
        ExpressionTree::Call {
            namespace: None,
            function,
            ..
        } => Err(ExpressionError::UnknownFunction(function.clone())),
        ExpressionTree::Call {
            namespace: Some(namespace),
            function,
            arguments,
            keywords,
        } => {
            let name = format!("{namespace}.{function}");

            let reduction = Reduction::from_str(function)
                .ok()
                .filter(|reduction| *namespace == Namespace::Nested || *reduction != Reduction::Count);
            if let Some(reduction) = reduction {
                check_argument_count(&name, 1, arguments)?;
                let axis = axis_keyword(&name, keywords)?;
                let value = evaluate(&arguments[0], values)?;

                return reduce(&name, reduction, value, axis);
            }

            match namespace {
                Namespace::Numeric => {
                    let function = ElementwiseFunction::from_str(function)
                        .ok()
                        .filter(|function| *function != ElementwiseFunction::Where)
                        .ok_or_else(|| ExpressionError::UnknownFunction(name.clone()))?;
                    no_keywords(&name, keywords)?;
                    check_argument_count(&name, function.arity(), arguments)?;

                    let arguments = arguments
                        .iter()
                        .map(|argument| evaluate(argument, values))
                        .collect::<Result<Vec<_>, _>>()?;

                    elementwise(function, arguments)
                }
                Namespace::Nested => {
                    let function = StructureFunction::from_str(function)
                        .map_err(|_| ExpressionError::UnknownFunction(name.clone()))?;
                    check_argument_count(&name, 1, arguments)?;
                    let axis = axis_keyword(&name, keywords)?;
                    let value = evaluate(&arguments[0], values)?;

                    structure(&name, function, value, axis)
                }
            }
        }
    }
}
