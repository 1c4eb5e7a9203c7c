//! This module defines a tree representation of expressions

use std::fmt::Display;

use itertools::Itertools;

use crate::datatypes::ElementValue;

use super::operations::{BinaryOperation, Namespace, UnaryOperation};

/// Leaf node of an [ExpressionTree]
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionLeaf {
    /// Constant value
    Constant(ElementValue),
    /// The literal `None`, only meaningful as a keyword argument
    NoneLiteral,
    /// Named value supplied when evaluating the [ExpressionTree]
    Reference(String),
}

/// Tree structure representing a series of function applications
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionTree {
    /// Leaf node
    Leaf(ExpressionLeaf),
    /// Application of a unary operator
    Unary(UnaryOperation, Box<ExpressionTree>),
    /// Application of a binary operator
    Binary {
        /// Binary operation
        operation: BinaryOperation,
        /// First operand
        left: Box<ExpressionTree>,
        /// Second operand
        right: Box<ExpressionTree>,
    },
    /// Call of a named function
    Call {
        /// Optional prefix of the function name
        namespace: Option<Namespace>,
        /// Name of the function
        function: String,
        /// Positional arguments
        arguments: Vec<ExpressionTree>,
        /// Keyword arguments
        keywords: Vec<(String, ExpressionTree)>,
    },
}

impl ExpressionTree {
    /// Create a leaf node with a constant.
    pub fn constant(constant: impl Into<ElementValue>) -> Self {
        Self::Leaf(ExpressionLeaf::Constant(constant.into()))
    }

    /// Create a leaf node with a reference.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Leaf(ExpressionLeaf::Reference(name.into()))
    }

    /// Create a tree node applying a unary operator to `sub`.
    pub fn unary(operation: UnaryOperation, sub: Self) -> Self {
        Self::Unary(operation, Box::new(sub))
    }

    /// Create a tree node applying a binary operator to `left` and `right`.
    pub fn binary(operation: BinaryOperation, left: Self, right: Self) -> Self {
        Self::Binary {
            operation,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a tree node calling a function with positional arguments only.
    pub fn call(
        namespace: Option<Namespace>,
        function: impl Into<String>,
        arguments: Vec<Self>,
    ) -> Self {
        Self::Call {
            namespace,
            function: function.into(),
            arguments,
            keywords: Vec::new(),
        }
    }

    /// Return all names referenced in the tree, in order of first appearance.
    pub fn references(&self) -> Vec<String> {
        fn collect<'a>(tree: &'a ExpressionTree, result: &mut Vec<&'a str>) {
            match tree {
                ExpressionTree::Leaf(ExpressionLeaf::Reference(name)) => {
                    if !result.contains(&name.as_str()) {
                        result.push(name);
                    }
                }
                ExpressionTree::Leaf(_) => {}
                ExpressionTree::Unary(_, sub) => collect(sub, result),
                ExpressionTree::Binary { left, right, .. } => {
                    collect(left, result);
                    collect(right, result);
                }
                ExpressionTree::Call {
                    arguments,
                    keywords,
                    ..
                } => {
                    for argument in arguments {
                        collect(argument, result);
                    }
                    for (_, value) in keywords {
                        collect(value, result);
                    }
                }
            }
        }

        let mut result = Vec::new();
        collect(self, &mut result);
        result.into_iter().map(String::from).collect()
    }

    /// Return the number of edges on the longest path from this node to a leaf.
    pub fn height(&self) -> usize {
        match self {
            ExpressionTree::Leaf(_) => 0,
            ExpressionTree::Unary(_, sub) => sub.height() + 1,
            ExpressionTree::Binary { left, right, .. } => left.height().max(right.height()) + 1,
            ExpressionTree::Call {
                arguments,
                keywords,
                ..
            } => arguments
                .iter()
                .chain(keywords.iter().map(|(_, value)| value))
                .map(|argument| argument.height() + 1)
                .max()
                .unwrap_or(0),
        }
    }

    /// Return whether this tree evaluates to a constant value.
    pub fn is_constant(&self) -> bool {
        self.references().is_empty()
    }
}

impl Display for ExpressionLeaf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpressionLeaf::Constant(ElementValue::Bool(true)) => write!(f, "True"),
            ExpressionLeaf::Constant(ElementValue::Bool(false)) => write!(f, "False"),
            ExpressionLeaf::Constant(value) => write!(f, "{value}"),
            ExpressionLeaf::NoneLiteral => write!(f, "None"),
            ExpressionLeaf::Reference(name) => write!(f, "{name}"),
        }
    }
}

impl Display for ExpressionTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpressionTree::Leaf(leaf) => write!(f, "{leaf}"),
            ExpressionTree::Unary(operation, sub) => write!(f, "{operation}({sub})"),
            ExpressionTree::Binary {
                operation,
                left,
                right,
            } => write!(f, "({left} {operation} {right})"),
            ExpressionTree::Call {
                namespace,
                function,
                arguments,
                keywords,
            } => {
                if let Some(namespace) = namespace {
                    write!(f, "{namespace}.")?;
                }

                let arguments = arguments
                    .iter()
                    .map(ToString::to_string)
                    .chain(
                        keywords
                            .iter()
                            .map(|(keyword, value)| format!("{keyword}={value}")),
                    )
                    .join(", ");
                write!(f, "{function}({arguments})")
            }
        }
    }
}
