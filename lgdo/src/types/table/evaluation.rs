//! This module implements expression evaluation over the columns of a [Table].

use std::collections::HashMap;

use crate::{
    arrays::{DenseArray, NestedArray},
    datatypes::ElementValue,
    error::Error,
    evaluation::{
        general::{self, GeneralValue},
        vectorized::{StackProgram, StackReferenceIndex},
        EvaluationParameters,
    },
    expression::{parse_expression, ExpressionTree},
    types::{Array, ArrayOfEqualSizedArrays, Lgdo, LgdoType, Scalar, VectorOfVectors},
    view::{View, ViewFormat, ViewParameters},
};

use super::Table;

/// Value an identifier of an expression is bound to
#[derive(Debug)]
enum Operand {
    Parameter(ElementValue),
    Dense(DenseArray),
    Nested(NestedArray),
}

impl Table {
    /// Evaluate `expression` over the columns of this table and return the result as a new object.
    ///
    /// Identifiers refer to `parameters` or, if there is no parameter of that name, to columns.
    /// If no [VectorOfVectors] column is referenced, the expression is compiled
    /// into a vectorized program over dense arrays; reductions are then only allowed
    /// as the outermost operation. Otherwise, it is evaluated over nested arrays
    /// and array functions are available in the `np.` and `ak.` namespaces.
    ///
    /// Operators follow Python precedence, so `a > 1 | b` compares `a` with `1 | b`.
    ///
    /// Results become a [Scalar], an [Array], an [ArrayOfEqualSizedArrays]
    /// or a [VectorOfVectors] depending on their dimension.
    /// Results have no missing values: `ak.min` and `ak.max` over `axis=1`
    /// fail if one of the lists is empty instead of yielding `None` for it.
    ///
    /// # Errors
    /// Returns [Error::Expression] if the expression cannot be parsed or evaluated,
    /// in particular [TooDeeplyNested](crate::error::ExpressionError::TooDeeplyNested) beyond
    /// [MAX_NESTING_DEPTH](crate::expression::MAX_NESTING_DEPTH) levels
    /// and [EmptyList](crate::error::ExpressionError::EmptyList) for the reductions of empty lists above,
    /// and [Error::UnsupportedResultDimension] if no object type fits the result.
    pub fn eval(&self, expression: &str, parameters: &EvaluationParameters) -> Result<Lgdo, Error> {
        let tree = parse_expression(expression)?;

        let mut operands = Vec::new();
        for name in tree.references() {
            let operand = match (parameters.get(&name), self.get(&name)) {
                (Some(value), _) => Operand::Parameter(*value),
                (None, Some(column)) => column_operand(&column.borrow())?,
                // unknown names are reported by the engines
                (None, None) => continue,
            };

            operands.push((name, operand));
        }

        let has_nested = operands
            .iter()
            .any(|(_, operand)| matches!(operand, Operand::Nested(_)));

        log::debug!(
            "evaluating \"{expression}\" with the {} engine over {:?}",
            if has_nested { "general" } else { "vectorized" },
            operands.iter().map(|(name, _)| name).collect::<Vec<_>>()
        );

        if has_nested {
            evaluate_general(&tree, operands)
        } else {
            evaluate_vectorized(&tree, operands)
        }
    }
}

/// View a column as an operand: ragged columns as nested arrays, all others as dense arrays.
fn column_operand(column: &Lgdo) -> Result<Operand, Error> {
    let format = match column {
        Lgdo::VectorOfVectors(_) => ViewFormat::Records,
        _ => ViewFormat::Array,
    };

    match column.view_as(format, &ViewParameters::default())? {
        View::Dense(array) => Ok(Operand::Dense(array)),
        View::Nested(array) => Ok(Operand::Nested(array)),
        _ => Err(Error::FormatNotSupported {
            format,
            datatype: column.form_datatype(),
        }),
    }
}

fn evaluate_vectorized(
    tree: &ExpressionTree,
    operands: Vec<(String, Operand)>,
) -> Result<Lgdo, Error> {
    let mut reference_map = HashMap::<String, StackReferenceIndex>::new();
    let mut values = Vec::with_capacity(operands.len());

    for (name, operand) in operands {
        let value = match operand {
            Operand::Parameter(value) => DenseArray::scalar(value),
            Operand::Dense(array) => array,
            Operand::Nested(_) => return Err(Error::UnsupportedResultType(name)),
        };

        reference_map.insert(name, values.len());
        values.push(value);
    }

    let program = StackProgram::from_expression_tree(tree, &reference_map)?;
    let result = program.evaluate(&values)?;

    match result.ndim() {
        0 => result
            .item()
            .map(|value| Scalar::new(value).into())
            .ok_or(Error::UnsupportedResultDimension(0)),
        1 => Ok(Array::new(result.into_data()).into()),
        2 => ArrayOfEqualSizedArrays::from_dense(result)
            .map(Lgdo::from)
            .ok_or(Error::UnsupportedResultDimension(2)),
        ndim => Err(Error::UnsupportedResultDimension(ndim)),
    }
}

fn evaluate_general(tree: &ExpressionTree, operands: Vec<(String, Operand)>) -> Result<Lgdo, Error> {
    let mut values = HashMap::<String, GeneralValue>::new();

    for (name, operand) in operands {
        let value = match operand {
            Operand::Parameter(value) => GeneralValue::Scalar(value),
            Operand::Dense(array) => match (NestedArray::from_dense(&array), array.item()) {
                (Some(nested), _) => GeneralValue::Nested(nested),
                (None, Some(value)) => GeneralValue::Scalar(value),
                (None, None) => return Err(Error::UnsupportedResultType(name)),
            },
            Operand::Nested(array) => GeneralValue::Nested(array),
        };

        values.insert(name, value);
    }

    match general::evaluate(tree, &values)? {
        GeneralValue::Scalar(value) => Ok(Scalar::new(value).into()),
        GeneralValue::Nested(array) => match array.ndim() {
            1 => Ok(Array::new(array.content().clone()).into()),
            2 => VectorOfVectors::from_nested(&array)
                .map(Lgdo::from)
                .ok_or(Error::UnsupportedResultDimension(2)),
            ndim => Err(Error::UnsupportedResultDimension(ndim)),
        },
    }
}

#[cfg(test)]
mod test {
    use crate::{
        datatypes::{ElementValue, ElementVec},
        error::{Error, ExpressionError},
        evaluation::EvaluationParameters,
        types::{Array, ArrayOfEqualSizedArrays, Lgdo, LgdoRef, VectorOfVectors},
    };

    use super::Table;
    use test_log::test;

    fn table() -> Table {
        Table::from_columns([
            ("a", LgdoRef::new(Array::from(vec![1i64, 2, 3]))),
            ("b", LgdoRef::new(Array::from(vec![10i64, 20, 30]))),
            (
                "v",
                LgdoRef::new(VectorOfVectors::from(vec![
                    vec![5i64],
                    vec![6, 7],
                    vec![8, 9, 0],
                ])),
            ),
            (
                "m",
                LgdoRef::new(ArrayOfEqualSizedArrays::new(
                    3,
                    2,
                    vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
                )),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn dense_columns() {
        let table = table();
        let none = EvaluationParameters::new();

        match table.eval("a + b", &none).unwrap() {
            Lgdo::Array(array) => assert_eq!(array.data(), &ElementVec::from(vec![11i64, 22, 33])),
            other => panic!("unexpected result {other:?}"),
        }

        match table.eval("sum(a * b)", &none).unwrap() {
            Lgdo::Scalar(scalar) => assert_eq!(scalar.value(), ElementValue::Int64(140)),
            other => panic!("unexpected result {other:?}"),
        }

        match table.eval("m * 2", &none).unwrap() {
            Lgdo::ArrayOfEqualSizedArrays(array) => {
                assert_eq!(array.row(2), Some(ElementVec::from(vec![10.0, 12.0])))
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn ragged_columns() {
        let table = table();
        let none = EvaluationParameters::new();

        match table.eval("a + v", &none).unwrap() {
            Lgdo::VectorOfVectors(vectors) => assert_eq!(
                vectors,
                VectorOfVectors::from(vec![vec![6i64], vec![8, 9], vec![11, 12, 3]])
            ),
            other => panic!("unexpected result {other:?}"),
        }

        match table.eval("np.sum(a) + ak.sum(v)", &none).unwrap() {
            Lgdo::Scalar(scalar) => assert_eq!(scalar.value(), ElementValue::Int64(41)),
            other => panic!("unexpected result {other:?}"),
        }

        match table.eval("ak.num(v)", &none).unwrap() {
            Lgdo::Array(array) => assert_eq!(array.data(), &ElementVec::from(vec![1i64, 2, 3])),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn parameters_shadow_columns() {
        let table = table();
        let parameters = EvaluationParameters::from([
            ("a".to_string(), ElementValue::Int64(2)),
            ("k".to_string(), ElementValue::Float64(0.5)),
        ]);

        match table.eval("a * b * k", &parameters).unwrap() {
            Lgdo::Array(array) => {
                assert_eq!(array.data(), &ElementVec::from(vec![10.0, 20.0, 30.0]))
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn errors() {
        let table = table();
        let none = EvaluationParameters::new();

        assert!(matches!(
            table.eval("a +", &none),
            Err(Error::Expression(ExpressionError::Parse { .. }))
        ));
        assert!(matches!(
            table.eval("a + c", &none),
            Err(Error::Expression(ExpressionError::UnknownIdentifier(name))) if name == "c"
        ));
        assert!(matches!(
            table.eval("sum(a) + 1", &none),
            Err(Error::Expression(ExpressionError::ReductionNotOutermost(_)))
        ));
    }

    #[test]
    fn deeply_nested_expressions_fail_cleanly() {
        let table = table();
        let none = EvaluationParameters::new();

        for expression in [
            format!("{}a{}", "(".repeat(10_000), ")".repeat(10_000)),
            format!("{}v", "-".repeat(10_000)),
            vec!["a"; 10_000].join(" + "),
        ] {
            assert!(matches!(
                table.eval(&expression, &none),
                Err(Error::Expression(ExpressionError::TooDeeplyNested(_)))
            ));
        }

        match table.eval(&format!("{}a{}", "(".repeat(50), ")".repeat(50)), &none) {
            Ok(Lgdo::Array(array)) => assert_eq!(array.data(), &ElementVec::from(vec![1i64, 2, 3])),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn logical_operators_bind_tighter_than_comparisons() {
        let table = table();
        let none = EvaluationParameters::new();

        match table.eval("a > 1 | a == 1", &none).unwrap() {
            Lgdo::Array(array) => {
                assert_eq!(array.data(), &ElementVec::from(vec![false, false, false]))
            }
            other => panic!("unexpected result {other:?}"),
        }

        match table.eval("(a > 1) | (a == 1)", &none).unwrap() {
            Lgdo::Array(array) => {
                assert_eq!(array.data(), &ElementVec::from(vec![true, true, true]))
            }
            other => panic!("unexpected result {other:?}"),
        }

        match table.eval("1 < a <= 2 ^ a == 3", &none).unwrap() {
            Lgdo::Array(array) => {
                assert_eq!(array.data(), &ElementVec::from(vec![false, false, false]))
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn empty_lists_have_no_extremum() {
        let table = Table::from_columns([(
            "v",
            LgdoRef::new(VectorOfVectors::from(vec![vec![5i64], vec![], vec![8, 9, 0]])),
        )])
        .unwrap();
        let none = EvaluationParameters::new();

        assert!(matches!(
            table.eval("ak.max(v, axis=1)", &none),
            Err(Error::Expression(ExpressionError::EmptyList { reduction, list: 1 }))
                if reduction == "max"
        ));

        match table.eval("ak.sum(v, axis=1)", &none).unwrap() {
            Lgdo::Array(array) => assert_eq!(array.data(), &ElementVec::from(vec![5i64, 0, 17])),
            other => panic!("unexpected result {other:?}"),
        }
    }
}
