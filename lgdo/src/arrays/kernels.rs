//! This module defines the element kernels shared by both evaluation engines.
//!
//! Kernels operate on [ElementVec]s of equal length;
//! broadcasting is the responsibility of the caller.

use std::ops::Range;

use num::Integer;

use crate::{
    datatypes::{ElementType, ElementValue, ElementVec},
    error::ExpressionError,
    expression::operations::{BinaryOperation, ElementwiseFunction, Reduction, UnaryOperation},
};

fn unsupported(operation: impl ToString, operand: ElementType) -> ExpressionError {
    ExpressionError::UnsupportedOperand {
        operation: operation.to_string(),
        operand: operand.to_string(),
    }
}

/// Return the type of the result of applying `operation` to values of the given types.
pub fn binary_type(
    operation: BinaryOperation,
    left: ElementType,
    right: ElementType,
) -> Result<ElementType, ExpressionError> {
    let common = left.promote(right);

    Ok(match operation {
        BinaryOperation::Addition
        | BinaryOperation::Subtraction
        | BinaryOperation::Multiplication
        | BinaryOperation::Remainder
        | BinaryOperation::Power => common.arithmetic(),
        BinaryOperation::Division => ElementType::Float64,
        BinaryOperation::Lessthan
        | BinaryOperation::Lessthaneq
        | BinaryOperation::Greaterthan
        | BinaryOperation::Greaterthaneq
        | BinaryOperation::Equals
        | BinaryOperation::Unequals => ElementType::Bool,
        BinaryOperation::And | BinaryOperation::Or | BinaryOperation::Xor => {
            if common == ElementType::Float64 {
                return Err(unsupported(operation, common));
            }
            common
        }
    })
}

fn floor_remainder_f64(left: f64, right: f64) -> f64 {
    let remainder = left % right;
    if remainder != 0.0 && (remainder < 0.0) != (right < 0.0) {
        remainder + right
    } else {
        remainder
    }
}

fn binary_i64(operation: BinaryOperation, left: i64, right: i64) -> Result<i64, ExpressionError> {
    Ok(match operation {
        BinaryOperation::Addition => left.wrapping_add(right),
        BinaryOperation::Subtraction => left.wrapping_sub(right),
        BinaryOperation::Multiplication => left.wrapping_mul(right),
        BinaryOperation::Remainder => match right {
            0 | -1 => 0,
            _ => left.mod_floor(&right),
        },
        BinaryOperation::Power => {
            let exponent =
                u32::try_from(right).map_err(|_| ExpressionError::NegativeIntegerPower)?;
            left.wrapping_pow(exponent)
        }
        BinaryOperation::And => left & right,
        BinaryOperation::Or => left | right,
        BinaryOperation::Xor => left ^ right,
        _ => return Err(unsupported(operation, ElementType::Int64)),
    })
}

fn binary_f64(operation: BinaryOperation, left: f64, right: f64) -> Result<f64, ExpressionError> {
    Ok(match operation {
        BinaryOperation::Addition => left + right,
        BinaryOperation::Subtraction => left - right,
        BinaryOperation::Multiplication => left * right,
        BinaryOperation::Division => left / right,
        BinaryOperation::Remainder => floor_remainder_f64(left, right),
        BinaryOperation::Power => left.powf(right),
        _ => return Err(unsupported(operation, ElementType::Float64)),
    })
}

fn compare(operation: BinaryOperation, common: ElementType, left: ElementValue, right: ElementValue) -> bool {
    let ordering = if common == ElementType::Float64 {
        left.to_f64().partial_cmp(&right.to_f64())
    } else {
        Some(left.to_i64().cmp(&right.to_i64()))
    };

    match (operation, ordering) {
        (BinaryOperation::Unequals, None) => true,
        (_, None) => false,
        (BinaryOperation::Lessthan, Some(ordering)) => ordering.is_lt(),
        (BinaryOperation::Lessthaneq, Some(ordering)) => ordering.is_le(),
        (BinaryOperation::Greaterthan, Some(ordering)) => ordering.is_gt(),
        (BinaryOperation::Greaterthaneq, Some(ordering)) => ordering.is_ge(),
        (BinaryOperation::Equals, Some(ordering)) => ordering.is_eq(),
        (BinaryOperation::Unequals, Some(ordering)) => ordering.is_ne(),
        _ => false,
    }
}

/// Apply `operation` to a pair of values.
pub fn binary_value(
    operation: BinaryOperation,
    left: ElementValue,
    right: ElementValue,
) -> Result<ElementValue, ExpressionError> {
    let result_type = binary_type(operation, left.element_type(), right.element_type())?;
    let common = left.element_type().promote(right.element_type());

    Ok(match operation {
        BinaryOperation::Lessthan
        | BinaryOperation::Lessthaneq
        | BinaryOperation::Greaterthan
        | BinaryOperation::Greaterthaneq
        | BinaryOperation::Equals
        | BinaryOperation::Unequals => ElementValue::Bool(compare(operation, common, left, right)),
        BinaryOperation::Division => ElementValue::Float64(left.to_f64() / right.to_f64()),
        BinaryOperation::And | BinaryOperation::Or | BinaryOperation::Xor
            if result_type == ElementType::Bool =>
        {
            let (left, right) = (left.to_bool(), right.to_bool());
            ElementValue::Bool(match operation {
                BinaryOperation::And => left && right,
                BinaryOperation::Or => left || right,
                _ => left != right,
            })
        }
        _ => match result_type {
            ElementType::Float64 => {
                ElementValue::Float64(binary_f64(operation, left.to_f64(), right.to_f64())?)
            }
            _ => ElementValue::Int64(binary_i64(operation, left.to_i64(), right.to_i64())?),
        },
    })
}

/// Apply `operation` to each pair of elements of `left` and `right`.
pub fn binary(
    operation: BinaryOperation,
    left: &ElementVec,
    right: &ElementVec,
) -> Result<ElementVec, ExpressionError> {
    debug_assert_eq!(left.len(), right.len());

    let result_type = binary_type(operation, left.element_type(), right.element_type())?;

    if let (ElementVec::Float64(left), ElementVec::Float64(right)) = (left, right) {
        if result_type == ElementType::Float64 {
            return left
                .iter()
                .zip(right.iter())
                .map(|(&left, &right)| binary_f64(operation, left, right))
                .collect::<Result<Vec<_>, _>>()
                .map(ElementVec::from);
        }
    }

    let values = left
        .iter()
        .zip(right.iter())
        .map(|(left, right)| binary_value(operation, left, right))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ElementVec::from_values(result_type, values))
}

/// Apply `operation` to a single value.
pub fn unary_value(
    operation: UnaryOperation,
    value: ElementValue,
) -> Result<ElementValue, ExpressionError> {
    Ok(match (operation, value) {
        (UnaryOperation::Negation, ElementValue::Int64(value)) => {
            ElementValue::Int64(value.wrapping_neg())
        }
        (UnaryOperation::Negation, ElementValue::Float64(value)) => ElementValue::Float64(-value),
        (UnaryOperation::Invert, ElementValue::Bool(value)) => ElementValue::Bool(!value),
        (UnaryOperation::Invert, ElementValue::Int64(value)) => ElementValue::Int64(!value),
        (operation, value) => return Err(unsupported(operation, value.element_type())),
    })
}

/// Apply `operation` to each element of `data`.
pub fn unary(operation: UnaryOperation, data: &ElementVec) -> Result<ElementVec, ExpressionError> {
    let element_type = data.element_type();
    let values = data
        .iter()
        .map(|value| unary_value(operation, value))
        .collect::<Result<Vec<_>, _>>()?;

    if values.is_empty() {
        // still reject unsupported operand types on empty input
        unary_value(operation, ElementValue::Bool(false).cast(element_type))?;
    }

    Ok(ElementVec::from_values(element_type, values))
}

fn float_function(function: ElementwiseFunction, value: f64) -> f64 {
    match function {
        ElementwiseFunction::Sqrt => value.sqrt(),
        ElementwiseFunction::Exp => value.exp(),
        ElementwiseFunction::Expm1 => value.exp_m1(),
        ElementwiseFunction::Log => value.ln(),
        ElementwiseFunction::Log10 => value.log10(),
        ElementwiseFunction::Log1p => value.ln_1p(),
        ElementwiseFunction::Abs => value.abs(),
        ElementwiseFunction::Sin => value.sin(),
        ElementwiseFunction::Cos => value.cos(),
        ElementwiseFunction::Tan => value.tan(),
        ElementwiseFunction::Arcsin => value.asin(),
        ElementwiseFunction::Arccos => value.acos(),
        ElementwiseFunction::Arctan => value.atan(),
        ElementwiseFunction::Sinh => value.sinh(),
        ElementwiseFunction::Cosh => value.cosh(),
        ElementwiseFunction::Tanh => value.tanh(),
        ElementwiseFunction::Floor => value.floor(),
        ElementwiseFunction::Ceil => value.ceil(),
        ElementwiseFunction::Arctan2 | ElementwiseFunction::Where => f64::NAN,
    }
}

/// Apply `function` to the given arguments, which all have the same length.
///
/// Every function yields floating point numbers, except for `abs`,
/// which keeps the type of its input, and `where`,
/// which yields the common type of its second and third argument.
pub fn function(
    function: ElementwiseFunction,
    arguments: &[&ElementVec],
) -> Result<ElementVec, ExpressionError> {
    if arguments.len() != function.arity() {
        return Err(ExpressionError::WrongArgumentCount {
            function: function.to_string(),
            expected: function.arity(),
            given: arguments.len(),
        });
    }

    Ok(match (function, arguments) {
        (ElementwiseFunction::Abs, [ElementVec::Bool(data)]) => ElementVec::Bool(data.clone()),
        (ElementwiseFunction::Abs, [ElementVec::Int64(data)]) => {
            ElementVec::from(data.iter().map(|value| value.wrapping_abs()).collect::<Vec<_>>())
        }
        (ElementwiseFunction::Arctan2, [y, x]) => ElementVec::from(
            y.iter()
                .zip(x.iter())
                .map(|(y, x)| y.to_f64().atan2(x.to_f64()))
                .collect::<Vec<_>>(),
        ),
        (ElementwiseFunction::Where, [condition, then, otherwise]) => {
            let result_type = then.element_type().promote(otherwise.element_type());
            ElementVec::from_values(
                result_type,
                condition
                    .iter()
                    .zip(then.iter().zip(otherwise.iter()))
                    .map(|(condition, (then, otherwise))| {
                        if condition.to_bool() {
                            then
                        } else {
                            otherwise
                        }
                    }),
            )
        }
        (function, [data]) => ElementVec::from(
            data.iter()
                .map(|value| float_function(function, value.to_f64()))
                .collect::<Vec<_>>(),
        ),
        _ => unreachable!("argument count was checked against the arity"),
    })
}

/// Return the type of the result of applying `reduction` to elements of the given type.
pub fn reduction_type(reduction: Reduction, element_type: ElementType) -> ElementType {
    match reduction {
        Reduction::Sum | Reduction::Prod => element_type.arithmetic(),
        Reduction::Min | Reduction::Max => element_type,
        Reduction::Mean => ElementType::Float64,
        Reduction::Count => ElementType::Int64,
    }
}

fn extremum_f64(reduction: Reduction, current: f64, next: f64) -> f64 {
    if current.is_nan() || next.is_nan() {
        return f64::NAN;
    }

    if reduction == Reduction::Min {
        current.min(next)
    } else {
        current.max(next)
    }
}

/// Aggregate the elements of `data` within `range` into a single value.
///
/// # Panics
/// Panics if `range` is out of bounds.
pub fn reduce(
    reduction: Reduction,
    data: &ElementVec,
    range: Range<usize>,
) -> Result<ElementValue, ExpressionError> {
    let count = range.len();

    Ok(match (reduction, data) {
        (Reduction::Count, _) => ElementValue::Int64(i64::try_from(count).unwrap_or(i64::MAX)),
        (Reduction::Mean, data) => {
            let sum: f64 = data.slice(range).iter().map(|value| value.to_f64()).sum();
            ElementValue::Float64(sum / count as f64)
        }
        (Reduction::Min | Reduction::Max, _) if count == 0 => {
            return Err(ExpressionError::EmptyReduction(reduction.to_string()))
        }
        (Reduction::Min, ElementVec::Bool(data)) => {
            ElementValue::Bool(range.map(|index| data.value(index)).all(|v| v))
        }
        (Reduction::Max, ElementVec::Bool(data)) => {
            ElementValue::Bool(range.map(|index| data.value(index)).any(|v| v))
        }
        (Reduction::Min, ElementVec::Int64(data)) => {
            ElementValue::Int64(data[range].iter().copied().min().unwrap_or_default())
        }
        (Reduction::Max, ElementVec::Int64(data)) => {
            ElementValue::Int64(data[range].iter().copied().max().unwrap_or_default())
        }
        (Reduction::Min | Reduction::Max, ElementVec::Float64(data)) => {
            let slice = &data[range];
            ElementValue::Float64(
                slice[1..]
                    .iter()
                    .fold(slice[0], |current, &next| extremum_f64(reduction, current, next)),
            )
        }
        (Reduction::Sum, ElementVec::Float64(data)) => ElementValue::Float64(data[range].iter().sum()),
        (Reduction::Prod, ElementVec::Float64(data)) => {
            ElementValue::Float64(data[range].iter().product())
        }
        (Reduction::Sum, data) => ElementValue::Int64(
            data.slice(range)
                .iter()
                .fold(0i64, |sum, value| sum.wrapping_add(value.to_i64())),
        ),
        (Reduction::Prod, data) => ElementValue::Int64(
            data.slice(range)
                .iter()
                .fold(1i64, |product, value| product.wrapping_mul(value.to_i64())),
        ),
    })
}
