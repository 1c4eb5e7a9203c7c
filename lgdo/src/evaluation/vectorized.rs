//! This module defines the engine evaluating expressions over whole [DenseArray]s.

use std::{borrow::Cow, collections::HashMap, str::FromStr};

use crate::{
    arrays::DenseArray,
    error::ExpressionError,
    expression::{
        operations::{BinaryOperation, ElementwiseFunction, Reduction, UnaryOperation},
        tree::{ExpressionLeaf, ExpressionTree},
    },
};

use super::{axis_keyword, check_argument_count, no_keywords, Axis};

/// Upon calling the evaluation method of [StackProgram],
/// it will receive a slice of arrays.
/// This number indexes into that slice.
pub type StackReferenceIndex = usize;

/// A value pushed onto the evaluation stack of [StackProgram]
#[derive(Debug, Clone)]
enum StackValue {
    /// A constant value on the stack
    Constant(DenseArray),
    /// A reference to an array that will be provided upon calling [StackProgram::evaluate]
    Reference(StackReferenceIndex),
}

/// Operation performed in a [StackProgram]
#[derive(Debug, Clone)]
enum StackOperation {
    /// Push the given value onto the stack.
    Push(StackValue),
    /// Evaluate the given unary operation on the top element of the stack.
    Unary(UnaryOperation),
    /// Evaluate the given binary operation on the top two elements of the stack.
    Binary(BinaryOperation),
    /// Evaluate the given function on as many top elements as it takes arguments.
    Function(ElementwiseFunction),
}

/// Return the reduction of the given name, if this engine supports it.
fn vectorized_reduction(function: &str) -> Option<Reduction> {
    match Reduction::from_str(function) {
        Ok(reduction @ (Reduction::Sum | Reduction::Prod | Reduction::Min | Reduction::Max)) => {
            Some(reduction)
        }
        _ => None,
    }
}

/// Representation of an [ExpressionTree] as a stack program
///
/// A reduction may only appear as the outermost operation.
/// It is stored separately and applied to the final value of the stack.
#[derive(Debug, Clone)]
pub struct StackProgram {
    size: usize,
    instructions: Vec<StackOperation>,
    reduction: Option<(Reduction, Option<i64>)>,
}

impl StackProgram {
    /// Constructs a new [StackProgram] from a list of [StackOperation]s.
    /// Checks, that all stack operations have sufficient arguments, and the stack height
    /// at the end of the computation is exactly 1.
    fn new(
        instructions: Vec<StackOperation>,
        reduction: Option<(Reduction, Option<i64>)>,
    ) -> Result<Self, ExpressionError> {
        let mut max_height = 0;
        let mut current_height: usize = 0;

        for instruction in instructions.iter() {
            match instruction {
                StackOperation::Push(_) => {
                    current_height += 1;
                }
                StackOperation::Unary(_) => {
                    if current_height == 0 {
                        return Err(ExpressionError::MalformedStackProgram);
                    }
                }
                StackOperation::Binary(_) => {
                    if current_height <= 1 {
                        return Err(ExpressionError::MalformedStackProgram);
                    }

                    current_height -= 1;
                }
                StackOperation::Function(function) => {
                    if current_height < function.arity() {
                        return Err(ExpressionError::MalformedStackProgram);
                    }

                    current_height = current_height + 1 - function.arity();
                }
            }

            max_height = std::cmp::max(current_height, max_height);
        }

        if current_height != 1 {
            return Err(ExpressionError::MalformedStackProgram);
        }

        Ok(Self {
            size: max_height,
            instructions,
            reduction,
        })
    }

    /// Construct a [StackProgram] from an [ExpressionTree].
    ///
    /// `reference_map` assigns each name the expression may refer to
    /// the position of its value in the slice passed to [StackProgram::evaluate].
    /// Compilation recurses along the tree, see [general::evaluate](super::general::evaluate).
    pub fn from_expression_tree(
        tree: &ExpressionTree,
        reference_map: &HashMap<String, StackReferenceIndex>,
    ) -> Result<StackProgram, ExpressionError> {
        fn build_operations(
            term: &ExpressionTree,
            reference_map: &HashMap<String, StackReferenceIndex>,
            operations: &mut Vec<StackOperation>,
        ) -> Result<(), ExpressionError> {
            match term {
                ExpressionTree::Leaf(leaf) => operations.push(StackOperation::Push(match leaf {
                    ExpressionLeaf::Constant(constant) => {
                        StackValue::Constant(DenseArray::scalar(*constant))
                    }
                    ExpressionLeaf::Reference(reference) => StackValue::Reference(
                        *reference_map
                            .get(reference)
                            .ok_or_else(|| ExpressionError::UnknownIdentifier(reference.clone()))?,
                    ),
                    ExpressionLeaf::NoneLiteral => {
                        return Err(ExpressionError::UnsupportedOperand {
                            operation: "expression".to_string(),
                            operand: "None".to_string(),
                        })
                    }
                })),
                ExpressionTree::Unary(operation, sub) => {
                    build_operations(sub, reference_map, operations)?;

                    operations.push(StackOperation::Unary(*operation));
                }
                ExpressionTree::Binary {
                    operation,
                    left,
                    right,
                } => {
                    build_operations(left, reference_map, operations)?;
                    build_operations(right, reference_map, operations)?;

                    operations.push(StackOperation::Binary(*operation));
                }
                ExpressionTree::Call {
                    namespace: Some(namespace),
                    function,
                    ..
                } => {
                    return Err(ExpressionError::UnknownFunction(format!(
                        "{namespace}.{function}"
                    )))
                }
                ExpressionTree::Call {
                    namespace: None,
                    function: name,
                    arguments,
                    keywords,
                } => {
                    if vectorized_reduction(name).is_some() {
                        return Err(ExpressionError::ReductionNotOutermost(name.clone()));
                    }

                    let function = ElementwiseFunction::from_str(name)
                        .map_err(|_| ExpressionError::UnknownFunction(name.clone()))?;
                    no_keywords(name, keywords)?;
                    check_argument_count(name, function.arity(), arguments)?;

                    for argument in arguments {
                        build_operations(argument, reference_map, operations)?;
                    }

                    operations.push(StackOperation::Function(function));
                }
            }

            Ok(())
        }

        let (body, reduction) = match tree {
            ExpressionTree::Call {
                namespace: None,
                function,
                arguments,
                keywords,
            } if vectorized_reduction(function).is_some() => {
                check_argument_count(function, 1, arguments)?;
                let axis = match axis_keyword(function, keywords)? {
                    Axis::Default | Axis::All => None,
                    Axis::Index(index) => Some(index),
                };

                (&arguments[0], vectorized_reduction(function).map(|r| (r, axis)))
            }
            _ => (tree, None),
        };

        let mut term_operations = Vec::new();
        build_operations(body, reference_map, &mut term_operations)?;
        let program = Self::new(term_operations, reduction)?;

        log::trace!("compiled \"{tree}\" into {program:?}");

        Ok(program)
    }

    /// Evaluate the stack program on the given arrays and return the result.
    pub fn evaluate(&self, referenced_values: &[DenseArray]) -> Result<DenseArray, ExpressionError> {
        let mut stack = Vec::<Cow<'_, DenseArray>>::with_capacity(self.size);

        for instruction in self.instructions.iter() {
            match instruction {
                StackOperation::Push(stack_value) => match stack_value {
                    StackValue::Constant(array) => stack.push(Cow::Borrowed(array)),
                    StackValue::Reference(reference) => stack.push(Cow::Borrowed(
                        referenced_values
                            .get(*reference)
                            .ok_or(ExpressionError::MalformedStackProgram)?,
                    )),
                },
                StackOperation::Unary(operation) => {
                    let input = stack
                        .pop()
                        .ok_or(ExpressionError::MalformedStackProgram)?;

                    stack.push(Cow::Owned(input.unary(*operation)?));
                }
                StackOperation::Binary(operation) => {
                    let second_input = stack
                        .pop()
                        .ok_or(ExpressionError::MalformedStackProgram)?;
                    let first_input = stack
                        .pop()
                        .ok_or(ExpressionError::MalformedStackProgram)?;

                    stack.push(Cow::Owned(first_input.binary(*operation, &second_input)?));
                }
                StackOperation::Function(function) => {
                    let first = stack
                        .len()
                        .checked_sub(function.arity())
                        .ok_or(ExpressionError::MalformedStackProgram)?;
                    let inputs = stack.split_off(first);
                    let inputs = inputs.iter().map(|input| &**input).collect::<Vec<_>>();

                    stack.push(Cow::Owned(DenseArray::function(*function, &inputs)?));
                }
            }
        }

        let result = stack
            .pop()
            .ok_or(ExpressionError::MalformedStackProgram)?
            .into_owned();

        match self.reduction {
            Some((reduction, axis)) => result.reduce(reduction, axis),
            None => Ok(result),
        }
    }
}
