use std::collections::HashMap;

use arrow::{array::AsArray, datatypes::Int64Type};
use lgdo::{
    arrays::{DenseArray, NestedArray},
    datatypes::{ElementValue, ElementVec},
    error::Error,
    evaluation::{
        general::{self, GeneralValue},
        vectorized::StackProgram,
        EvaluationParameters,
    },
    expression::parse_expression,
    types::{Array, Attrs, Lgdo, LgdoRef, LgdoType, Table, VectorOfVectors},
    view::{ViewFormat, ViewParameters},
};
use quickcheck_macros::quickcheck;
use test_log::test;

fn column(length: usize) -> LgdoRef {
    LgdoRef::new(Array::from((0..length as i64).collect::<Vec<_>>()))
}

fn array_data(column: &LgdoRef) -> ElementVec {
    let object = column.borrow();
    match &*object {
        Lgdo::Array(array) => array.data().clone(),
        other => panic!("expected an array, got {other:?}"),
    }
}

#[quickcheck]
fn construction_resizes_all_columns(lengths: Vec<u8>, size: Option<u8>) -> bool {
    let columns = lengths
        .iter()
        .enumerate()
        .map(|(index, &length)| {
            let length = usize::from(length);
            let column = if index % 2 == 0 {
                column(length)
            } else {
                LgdoRef::new(VectorOfVectors::from(vec![vec![1.0]; length]))
            };
            (format!("c{index}"), column)
        })
        .collect::<Vec<_>>();

    let table = Table::new(size.map(usize::from), columns.clone(), Attrs::new()).unwrap();

    let expected = match (size, lengths.first()) {
        (Some(size), _) => usize::from(size),
        (None, Some(&first)) => usize::from(first),
        (None, None) => Table::DEFAULT_SIZE,
    };

    table.size() == expected
        && columns
            .iter()
            .all(|(_, column)| column.length() == Some(table.size()))
}

#[quickcheck]
fn resize_without_size_is_idempotent(size: u8, columns: u8) -> bool {
    let size = usize::from(size);
    let mut table = Table::from_columns(
        (0..columns % 8).map(|index| (format!("c{index}"), column(size))),
    )
    .unwrap();

    let before = table
        .iter()
        .map(|(_, column)| array_data(column))
        .collect::<Vec<_>>();
    let size_before = table.size();

    table.resize(None, true).unwrap();

    let after = table
        .iter()
        .map(|(_, column)| array_data(column))
        .collect::<Vec<_>>();

    table.size() == size_before && before == after
}

#[quickcheck]
fn add_field_reconciles_lengths(size: u8, length: u8, adopt_column_size: bool) -> bool {
    let (size, length) = (usize::from(size), usize::from(length));

    let existing = column(size);
    let mut table = Table::from_columns([("existing", existing.clone())]).unwrap();

    let incoming = column(length);
    table
        .add_field("incoming", incoming.clone(), adopt_column_size)
        .unwrap();

    let expected = if adopt_column_size { length } else { size };
    table.size() == expected
        && existing.length() == Some(expected)
        && incoming.length() == Some(expected)
}

#[quickcheck]
fn cursor_fills_and_clears(size: u8) -> bool {
    let size = usize::from(size);
    let mut table = Table::with_size(size);

    for _ in 0..size {
        table.push_row();
    }
    let full = table.is_full();

    table.clear();
    full && table.loc() == 0 && (size == 0 || !table.is_full())
}

#[quickcheck]
fn engines_agree_on_dense_operands(values: Vec<(i16, i16)>) -> bool {
    const EXPRESSIONS: [&str; 7] = [
        "a + b",
        "a * b - 3",
        "a % 7 + b / 2",
        "-a * 2 + b",
        "(a > b) | (a == 3)",
        "a ** 2 + ~b",
        "a > 1 | b == 1 ^ a",
    ];

    let a = ElementVec::from(values.iter().map(|&(a, _)| i64::from(a)).collect::<Vec<_>>());
    let b = ElementVec::from(values.iter().map(|&(_, b)| i64::from(b)).collect::<Vec<_>>());

    let reference_map = HashMap::from([("a".to_string(), 0), ("b".to_string(), 1)]);
    let dense = [DenseArray::from(a.clone()), DenseArray::from(b.clone())];
    let nested = HashMap::from([
        ("a".to_string(), GeneralValue::Nested(NestedArray::flat(a))),
        ("b".to_string(), GeneralValue::Nested(NestedArray::flat(b))),
    ]);

    EXPRESSIONS.iter().all(|expression| {
        let tree = parse_expression(expression).unwrap();

        let vectorized = StackProgram::from_expression_tree(&tree, &reference_map)
            .and_then(|program| program.evaluate(&dense))
            .unwrap();
        let general = general::evaluate(&tree, &nested).unwrap();

        match general {
            GeneralValue::Nested(array) => {
                array.ndim() == vectorized.ndim() && array.content() == vectorized.data()
            }
            GeneralValue::Scalar(_) => false,
        }
    })
}

#[test]
fn join_aliases_columns() {
    let first = Table::from_columns([("a", column(3)), ("b", column(3))]).unwrap();
    let mut second = Table::from_columns([("c", column(3))]).unwrap();

    second.join(&first, None, true).unwrap();
    assert_eq!(second.keys().collect::<Vec<_>>(), vec!["c", "a", "b"]);

    for name in ["a", "b"] {
        assert!(second.get(name).unwrap().ptr_eq(first.get(name).unwrap()));
    }

    {
        let mut column = first.get("b").unwrap().borrow_mut();
        if let Lgdo::Array(array) = &mut *column {
            array.set(2, 42i64);
        }
    }
    assert_eq!(
        array_data(second.get("b").unwrap()),
        ElementVec::from(vec![0i64, 1, 42])
    );

    drop(first);
    assert_eq!(second.get("a").unwrap().length(), Some(3));
}

#[test]
fn eval_dense_and_ragged_columns() {
    let table = Table::from_columns([
        ("a", LgdoRef::new(Array::from(vec![1i64, 2, 3]))),
        ("b", LgdoRef::new(Array::from(vec![10i64, 20, 30]))),
        (
            "v",
            LgdoRef::new(VectorOfVectors::from(vec![vec![5i64], vec![6, 7], vec![8, 9, 0]])),
        ),
    ])
    .unwrap();
    let none = EvaluationParameters::new();

    match table.eval("a + b", &none).unwrap() {
        Lgdo::Array(array) => assert_eq!(array.data(), &ElementVec::from(vec![11i64, 22, 33])),
        other => panic!("unexpected result {other:?}"),
    }

    match table.eval("a + v", &none).unwrap() {
        Lgdo::VectorOfVectors(vectors) => {
            assert_eq!(vectors.cumulative_length(), &[1, 3, 6]);
            assert_eq!(
                vectors.flattened_data(),
                &ElementVec::from(vec![6i64, 8, 9, 11, 12, 3])
            );
        }
        other => panic!("unexpected result {other:?}"),
    }

    match table.eval("np.sum(a) + ak.sum(v)", &none).unwrap() {
        Lgdo::Scalar(scalar) => assert_eq!(scalar.value(), ElementValue::Int64(41)),
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn table_views_that_always_fail() {
    let table = Table::from_columns([("a", column(2)), ("b", column(2))]).unwrap();

    assert!(matches!(
        table.view_as(ViewFormat::Array, &ViewParameters::default()),
        Err(Error::FormatNotSupported { .. })
    ));
    assert!(matches!(
        table.view_as(
            ViewFormat::Records,
            &ViewParameters::default().with_units(true)
        ),
        Err(Error::UnitsNotSupported(_))
    ));
    assert!(matches!(
        ViewFormat::parse("xarray"),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn tabular_view_aliases_column_buffers() {
    let a = column(4);
    let table = Table::from_columns([("a", a.clone())]).unwrap();

    let batch = table
        .view_as(ViewFormat::Tabular, &ViewParameters::default())
        .unwrap()
        .into_frame()
        .unwrap();
    let viewed = batch.column(0).as_primitive::<Int64Type>().values().as_ptr();

    let column = a.borrow();
    let Lgdo::Array(array) = &*column else {
        panic!("expected an array");
    };
    let ElementVec::Int64(buffer) = array.data() else {
        panic!("expected integers");
    };
    assert_eq!(viewed, buffer.as_ptr());
}
