//! This module defines the parser turning expression text into an [ExpressionTree].
//!
//! Operator precedence, from loosest to tightest binding:
//! comparisons, `|`, `^`, `&`, `+ -`, `* / %`, unary `- ~ +`, `**`.
//! Comparisons chain, so `a < b <= c` means `(a < b) & (b <= c)`.

use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{all_consuming, map, map_res, not, opt, recognize},
    error::ErrorKind,
    multi::{many0_count, separated_list0},
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use crate::{datatypes::ElementValue, error::ExpressionError};

use super::{
    operations::{BinaryOperation, Namespace, UnaryOperation},
    tree::{ExpressionLeaf, ExpressionTree},
};

/// Maximum nesting depth of an expression
///
/// Every parenthesis, unary operator, exponent and call opens a level,
/// as does every operator of a chain like `a + b + c`.
pub const MAX_NESTING_DEPTH: usize = 64;

type ParserError<'a> = nom::Err<nom::error::Error<&'a str>>;
type ParserResult<'a, T> = IResult<&'a str, T>;

/// Parse an expression.
///
/// # Errors
/// Returns [ExpressionError::Parse] carrying the byte offset
/// at which the input stopped being understood
/// and [ExpressionError::TooDeeplyNested] if the expression
/// is nested deeper than [MAX_NESTING_DEPTH].
pub fn parse_expression(expression: &str) -> Result<ExpressionTree, ExpressionError> {
    let parser = delimited(
        multispace0,
        |input| parse_comparison(input, 0),
        multispace0,
    );

    match all_consuming(parser)(expression) {
        Ok((_, tree)) => Ok(tree),
        Err(nom::Err::Failure(error)) if error.code == ErrorKind::TooLarge => {
            Err(ExpressionError::TooDeeplyNested(MAX_NESTING_DEPTH))
        }
        Err(nom::Err::Error(error)) | Err(nom::Err::Failure(error)) => {
            Err(ExpressionError::Parse {
                expression: expression.to_string(),
                position: expression.len() - error.input.len(),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(ExpressionError::Parse {
            expression: expression.to_string(),
            position: expression.len(),
        }),
    }
}

/// Error aborting the parse because the input at `input` is nested too deeply
fn too_deep(input: &str) -> ParserError<'_> {
    nom::Err::Failure(nom::error::Error::new(input, ErrorKind::TooLarge))
}

/// Enter the next nesting level.
fn descend(input: &str, depth: usize) -> Result<usize, ParserError<'_>> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(too_deep(input));
    }

    Ok(depth + 1)
}

/// Check that a tree of the given `height` still fits below nesting level `depth`.
fn fits(input: &str, depth: usize, height: usize) -> Result<(), ParserError<'_>> {
    if depth + height > MAX_NESTING_DEPTH {
        return Err(too_deep(input));
    }

    Ok(())
}

/// Match `symbol` surrounded by optional whitespace.
fn token<'a>(symbol: &'static str) -> impl FnMut(&'a str) -> ParserResult<'a, &'a str> {
    delimited(multispace0, tag(symbol), multispace0)
}

/// Match an operator symbol and translate it into an operation.
fn operator<'a, O>(symbol: &'static str) -> impl FnMut(&'a str) -> ParserResult<'a, O>
where
    O: FromStr,
{
    map_res(token(symbol), O::from_str)
}

/// Parse a left-associative chain of `operand`s separated by one of the given `operators`.
fn chain<'a, P, Q>(
    input: &'a str,
    depth: usize,
    mut operand: P,
    mut operators: Q,
) -> ParserResult<'a, ExpressionTree>
where
    P: FnMut(&'a str, usize) -> ParserResult<'a, ExpressionTree>,
    Q: FnMut(&'a str) -> ParserResult<'a, BinaryOperation>,
{
    let (mut rest, mut tree) = operand(input, depth)?;
    let mut height = tree.height();

    loop {
        let Ok((after_operator, operation)) = operators(rest) else {
            break;
        };
        let (after_operand, next) = operand(after_operator, depth)?;

        height = height.max(next.height()) + 1;
        fits(rest, depth, height)?;

        tree = ExpressionTree::binary(operation, tree, next);
        rest = after_operand;
    }

    Ok((rest, tree))
}

fn comparison_operator(input: &str) -> ParserResult<'_, BinaryOperation> {
    alt((
        operator("<="),
        operator(">="),
        operator("=="),
        operator("!="),
        operator("<"),
        operator(">"),
    ))(input)
}

/// Comparisons bind loosest and chain:
/// every comparison after the first also compares the right operand of its predecessor.
fn parse_comparison(input: &str, depth: usize) -> ParserResult<'_, ExpressionTree> {
    let (mut rest, mut left) = parse_or(input, depth)?;
    let mut result: Option<(ExpressionTree, usize)> = None;

    loop {
        let Ok((after_operator, operation)) = comparison_operator(rest) else {
            break;
        };
        let (after_operand, right) = parse_or(after_operator, depth)?;

        let comparison_height = left.height().max(right.height()) + 1;
        let comparison = ExpressionTree::binary(operation, left, right.clone());

        let (tree, height) = match result.take() {
            None => (comparison, comparison_height),
            Some((previous, previous_height)) => (
                ExpressionTree::binary(BinaryOperation::And, previous, comparison),
                previous_height.max(comparison_height) + 1,
            ),
        };
        fits(rest, depth, height)?;

        result = Some((tree, height));

        left = right;
        rest = after_operand;
    }

    Ok((rest, result.map_or(left, |(tree, _)| tree)))
}

fn parse_or(input: &str, depth: usize) -> ParserResult<'_, ExpressionTree> {
    chain(input, depth, parse_xor, operator("|"))
}

fn parse_xor(input: &str, depth: usize) -> ParserResult<'_, ExpressionTree> {
    chain(input, depth, parse_and, operator("^"))
}

fn parse_and(input: &str, depth: usize) -> ParserResult<'_, ExpressionTree> {
    chain(input, depth, parse_sum, operator("&"))
}

fn parse_sum(input: &str, depth: usize) -> ParserResult<'_, ExpressionTree> {
    chain(input, depth, parse_product, alt((operator("+"), operator("-"))))
}

fn parse_product(input: &str, depth: usize) -> ParserResult<'_, ExpressionTree> {
    chain(
        input,
        depth,
        parse_unary,
        alt((
            terminated(operator("*"), not(char('*'))),
            operator("/"),
            operator("%"),
        )),
    )
}

fn parse_unary(input: &str, depth: usize) -> ParserResult<'_, ExpressionTree> {
    let mut unary_operator = alt((
        operator::<UnaryOperation>("-"),
        operator::<UnaryOperation>("~"),
    ));
    if let Ok((rest, operation)) = unary_operator(input) {
        let (rest, sub) = parse_unary(rest, descend(input, depth)?)?;
        return Ok((rest, ExpressionTree::unary(operation, sub)));
    }

    if let Ok((rest, _)) = token("+")(input) {
        return parse_unary(rest, descend(input, depth)?);
    }

    parse_power(input, depth)
}

/// Exponentiation binds tighter than a unary operator on its left
/// but its exponent may itself carry a unary operator, so `-2**-1` is `-(2**(-1))`.
fn parse_power(input: &str, depth: usize) -> ParserResult<'_, ExpressionTree> {
    let (rest, base) = parse_atom(input, depth)?;
    let Ok((after_operator, _)) = operator::<BinaryOperation>("**")(rest) else {
        return Ok((rest, base));
    };

    let (rest, exponent) = parse_unary(after_operator, descend(rest, depth)?)?;
    fits(input, depth, base.height().max(exponent.height()) + 1)?;

    Ok((
        rest,
        ExpressionTree::binary(BinaryOperation::Power, base, exponent),
    ))
}

fn parse_atom(input: &str, depth: usize) -> ParserResult<'_, ExpressionTree> {
    delimited(
        multispace0,
        alt((
            parse_number,
            |input| parse_name_or_call(input, depth),
            |input| parse_parenthesized(input, depth),
        )),
        multispace0,
    )(input)
}

fn parse_parenthesized(input: &str, depth: usize) -> ParserResult<'_, ExpressionTree> {
    let (rest, _) = token("(")(input)?;
    let (rest, tree) = parse_comparison(rest, descend(input, depth)?)?;
    let (rest, _) = token(")")(rest)?;

    Ok((rest, tree))
}

fn parse_number(input: &str) -> ParserResult<'_, ExpressionTree> {
    map_res(
        recognize_float,
        |text: &str| -> Result<ExpressionTree, std::num::ParseFloatError> {
            let is_integer = text.bytes().all(|byte| byte.is_ascii_digit());
            if is_integer {
                if let Ok(value) = text.parse::<i64>() {
                    return Ok(ExpressionTree::constant(value));
                }
            }

            Ok(ExpressionTree::constant(text.parse::<f64>()?))
        },
    )(input)
}

fn parse_identifier(input: &str) -> ParserResult<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))(input)
}

/// Keyword arguments look like `axis=-1`.
fn parse_keyword_argument(input: &str, depth: usize) -> ParserResult<'_, (String, ExpressionTree)> {
    map(
        pair(
            terminated(
                delimited(multispace0, parse_identifier, multispace0),
                terminated(char('='), not(char('='))),
            ),
            |input| parse_comparison(input, depth),
        ),
        |(keyword, value)| (keyword.to_string(), value),
    )(input)
}

enum Argument {
    Positional(ExpressionTree),
    Keyword(String, ExpressionTree),
}

fn parse_arguments(input: &str, depth: usize) -> ParserResult<'_, Vec<Argument>> {
    let (rest, _) = token("(")(input)?;
    let depth = descend(input, depth)?;

    terminated(
        separated_list0(
            token(","),
            alt((
                map(
                    move |input| parse_keyword_argument(input, depth),
                    |(keyword, value)| Argument::Keyword(keyword, value),
                ),
                map(
                    move |input| parse_comparison(input, depth),
                    Argument::Positional,
                ),
            )),
        ),
        token(")"),
    )(rest)
}

fn parse_name_or_call(input: &str, depth: usize) -> ParserResult<'_, ExpressionTree> {
    let (rest, (first, second)) = pair(
        parse_identifier,
        opt(preceded(char('.'), parse_identifier)),
    )(input)?;
    let (rest, arguments) = opt(|input| parse_arguments(input, depth))(rest)?;

    let Some(arguments) = arguments else {
        if second.is_some() {
            // attribute access is not part of the language
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            )));
        }

        let leaf = match first {
            "True" => ExpressionLeaf::Constant(ElementValue::Bool(true)),
            "False" => ExpressionLeaf::Constant(ElementValue::Bool(false)),
            "None" => ExpressionLeaf::NoneLiteral,
            name => ExpressionLeaf::Reference(name.to_string()),
        };
        return Ok((rest, ExpressionTree::Leaf(leaf)));
    };

    let (namespace, function) = match second {
        Some(function) => {
            let Ok(namespace) = Namespace::from_str(first) else {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Verify,
                )));
            };
            (Some(namespace), function)
        }
        None => (None, first),
    };

    let mut positional = Vec::new();
    let mut keywords = Vec::new();
    for argument in arguments {
        match argument {
            Argument::Positional(tree) => positional.push(tree),
            Argument::Keyword(keyword, tree) => keywords.push((keyword, tree)),
        }
    }

    Ok((
        rest,
        ExpressionTree::Call {
            namespace,
            function: function.to_string(),
            arguments: positional,
            keywords,
        },
    ))
}
