//! Error-handling module for the crate

use thiserror::Error;

use crate::view::ViewFormat;

/// Errors that occur while parsing or evaluating expressions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Expression text could not be parsed
    #[error("failed to parse expression \"{expression}\" at position {position}")]
    Parse {
        /// The expression that was parsed
        expression: String,
        /// Byte offset at which parsing stopped
        position: usize,
    },
    /// Identifier is neither a column nor a parameter
    #[error("name \"{0}\" is not defined")]
    UnknownIdentifier(String),
    /// Function is not provided by the engine evaluating the expression
    #[error("function \"{0}\" is not supported here")]
    UnknownFunction(String),
    /// Function was called with the wrong number of arguments
    #[error("function \"{function}\" expects {expected} argument(s) but got {given}")]
    WrongArgumentCount {
        /// Name of the function
        function: String,
        /// Number of expected arguments
        expected: usize,
        /// Number of given arguments
        given: usize,
    },
    /// Keyword argument that is not understood by the function
    #[error("function \"{function}\" got an unexpected keyword argument \"{keyword}\"")]
    UnexpectedKeyword {
        /// Name of the function
        function: String,
        /// Name of the keyword
        keyword: String,
    },
    /// Axis argument is not an integer constant or out of range
    #[error("invalid axis {axis} for data with {ndim} dimension(s)")]
    InvalidAxis {
        /// Requested axis
        axis: i64,
        /// Number of dimensions of the data
        ndim: usize,
    },
    /// Axis is valid but the operation is only implemented for other axes
    #[error("axis {axis} is not supported by \"{function}\" on nested data")]
    UnsupportedAxis {
        /// Name of the function
        function: String,
        /// Requested axis
        axis: i64,
    },
    /// Stack program does not leave exactly one value on the stack
    #[error("the compiled stack program was malformed")]
    MalformedStackProgram,
    /// Axis argument is not an integer literal
    #[error("axis of \"{0}\" must be an integer constant")]
    NonConstantAxis(String),
    /// Reduction used below the root of an expression on the vectorized engine
    #[error("reduction \"{0}\" must be the outermost operation of the expression")]
    ReductionNotOutermost(String),
    /// Dense operands cannot be broadcast against each other
    #[error("operands could not be broadcast together with shapes {0:?} and {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),
    /// Nested operands cannot be broadcast against each other
    #[error("cannot broadcast nested lists: {0}")]
    NestedMismatch(String),
    /// Integer raised to a negative integer power
    #[error("integers to negative integer powers are not allowed")]
    NegativeIntegerPower,
    /// Minimum or maximum of an empty sequence
    #[error("zero-size reduction \"{0}\" has no identity")]
    EmptyReduction(String),
    /// Minimum or maximum of one of the empty lists of a nested array
    #[error("reduction \"{reduction}\" of the empty list at position {list} has no identity")]
    EmptyList {
        /// Name of the reduction
        reduction: String,
        /// Position of the empty list among its siblings
        list: usize,
    },
    /// Expression nests parentheses, operators or calls too deeply
    #[error("expression is nested more than {0} levels deep")]
    TooDeeplyNested(usize),
    /// Operation applied to a value of the wrong kind
    #[error("unsupported operand for \"{operation}\": {operand}")]
    UnsupportedOperand {
        /// Operation that was applied
        operation: String,
        /// Description of the operand
        operand: String,
    },
}

/// Error-Collection for all the possible Errors occurring in this crate
#[derive(Error, Debug)]
pub enum Error {
    /// Object has no row length and cannot be a table column
    #[error("cannot add field of type {0}")]
    UnsupportedColumnType(String),
    /// Format name is unknown
    #[error("{0} is not a supported third-party format")]
    UnsupportedFormat(String),
    /// Format is known but not available for this kind of object
    #[error("format {format} is not supported for {datatype}")]
    FormatNotSupported {
        /// Requested format
        format: ViewFormat,
        /// Name of the object type
        datatype: String,
    },
    /// Unit-carrying view in a format that cannot carry units
    #[error("format {0} cannot carry physical units, view the data with_units = false")]
    UnitsNotSupported(ViewFormat),
    /// Evaluation result has a dimensionality without corresponding object type
    #[error("evaluation resulted in {0}-dimensional data, cannot determine result LGDO type")]
    UnsupportedResultDimension(usize),
    /// Evaluation result has a kind without corresponding object type
    #[error("evaluation resulted in a {0} object, cannot determine result LGDO type")]
    UnsupportedResultType(String),
    /// No field with the given name
    #[error("no field named \"{0}\"")]
    MissingField(String),
    /// Error while handling an expression
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    /// Error reported by Arrow while building a view
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
}
