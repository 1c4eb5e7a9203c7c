//! This module defines the operators and functions of the expression language.

use strum_macros::{Display, EnumString, IntoStaticStr};

/// Operators with two operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum BinaryOperation {
    /// Sum of two numbers
    #[strum(serialize = "+")]
    Addition,
    /// Difference of two numbers
    #[strum(serialize = "-")]
    Subtraction,
    /// Product of two numbers
    #[strum(serialize = "*")]
    Multiplication,
    /// True division, always resulting in a floating point number
    #[strum(serialize = "/")]
    Division,
    /// Remainder of the floor division, with the sign of the divisor
    #[strum(serialize = "%")]
    Remainder,
    /// Exponentiation
    #[strum(serialize = "**")]
    Power,
    /// Less than comparison
    #[strum(serialize = "<")]
    Lessthan,
    /// Less than or equal comparison
    #[strum(serialize = "<=")]
    Lessthaneq,
    /// Greater than comparison
    #[strum(serialize = ">")]
    Greaterthan,
    /// Greater than or equal comparison
    #[strum(serialize = ">=")]
    Greaterthaneq,
    /// Equality
    #[strum(serialize = "==")]
    Equals,
    /// Inequality
    #[strum(serialize = "!=")]
    Unequals,
    /// Logical conjunction of booleans, bitwise and of integers
    #[strum(serialize = "&")]
    And,
    /// Logical disjunction of booleans, bitwise or of integers
    #[strum(serialize = "|")]
    Or,
    /// Logical exclusive or of booleans, bitwise exclusive or of integers
    #[strum(serialize = "^")]
    Xor,
}

/// Operators with one operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum UnaryOperation {
    /// Arithmetic negation
    #[strum(serialize = "-")]
    Negation,
    /// Logical negation of booleans, bitwise not of integers
    #[strum(serialize = "~")]
    Invert,
}

/// Functions applied element by element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ElementwiseFunction {
    /// Square root
    Sqrt,
    /// Exponential function
    Exp,
    /// `exp(x) - 1`
    Expm1,
    /// Natural logarithm
    Log,
    /// Logarithm to base 10
    Log10,
    /// `log(1 + x)`
    Log1p,
    /// Absolute value, keeps integers integral
    Abs,
    /// Sine
    Sin,
    /// Cosine
    Cos,
    /// Tangent
    Tan,
    /// Inverse sine
    Arcsin,
    /// Inverse cosine
    Arccos,
    /// Inverse tangent
    Arctan,
    /// Hyperbolic sine
    Sinh,
    /// Hyperbolic cosine
    Cosh,
    /// Hyperbolic tangent
    Tanh,
    /// Largest integer not greater than the input
    Floor,
    /// Smallest integer not less than the input
    Ceil,
    /// Four-quadrant inverse tangent of `y / x`
    Arctan2,
    /// Choose from the second or third argument depending on the first
    Where,
}

impl ElementwiseFunction {
    /// Number of arguments this function takes.
    pub fn arity(&self) -> usize {
        match self {
            ElementwiseFunction::Arctan2 => 2,
            ElementwiseFunction::Where => 3,
            _ => 1,
        }
    }
}

/// Functions aggregating many elements into one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Reduction {
    /// Sum of all elements
    Sum,
    /// Product of all elements
    Prod,
    /// Smallest element
    Min,
    /// Largest element
    Max,
    /// Arithmetic mean
    Mean,
    /// Number of elements
    Count,
}

/// Functions changing the list structure of nested data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum StructureFunction {
    /// Number of elements in each list at the given depth
    Num,
    /// Remove one level of nesting
    Flatten,
}

/// Prefixes under which functions are exposed to the general engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum Namespace {
    /// Elementwise numeric functions and reductions
    #[strum(serialize = "np")]
    Numeric,
    /// Functions on nested lists
    #[strum(serialize = "ak")]
    Nested,
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::{BinaryOperation, ElementwiseFunction, Namespace, Reduction};
    use test_log::test;

    #[test]
    fn symbols_round_trip() {
        assert_eq!(
            BinaryOperation::from_str("**").unwrap(),
            BinaryOperation::Power
        );
        assert_eq!(BinaryOperation::Lessthaneq.to_string(), "<=");
        assert_eq!(
            ElementwiseFunction::from_str("arctan2").unwrap(),
            ElementwiseFunction::Arctan2
        );
        assert_eq!(Reduction::from_str("sum").unwrap(), Reduction::Sum);
        assert_eq!(Namespace::from_str("ak").unwrap(), Namespace::Nested);
        assert!(ElementwiseFunction::from_str("eval").is_err());
    }
}
