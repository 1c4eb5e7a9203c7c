//! This module defines [NestedArray].

use std::ops::Range;

use crate::{
    datatypes::{ElementValue, ElementVec},
    error::ExpressionError,
    expression::operations::{BinaryOperation, ElementwiseFunction, Reduction, UnaryOperation},
};

use super::{
    dense::{normalize_axis, DenseArray},
    kernels,
};

/// Offsets of one level of lists.
///
/// List `i` spans the positions `offsets[i]..offsets[i + 1]` of the next level.
pub type Offsets = Vec<usize>;

fn list_range(offsets: &[usize], index: usize) -> Range<usize> {
    offsets[index]..offsets[index + 1]
}

fn counts_to_offsets(counts: impl IntoIterator<Item = usize>) -> Offsets {
    let mut offsets = vec![0];
    let mut end = 0;
    for count in counts {
        end += count;
        offsets.push(end);
    }
    offsets
}

/// Array of variable-length lists, possibly nested several levels deep
///
/// The outermost dimension holds [NestedArray::len] entries.
/// Each level of `offsets` partitions the entries of the next level into lists;
/// the innermost level partitions `content`.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedArray {
    offsets: Vec<Offsets>,
    content: ElementVec,
}

/// Result of aligning the list structure of two [NestedArray]s
#[derive(Debug)]
struct Alignment {
    offsets: Vec<Offsets>,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl NestedArray {
    /// Create a new [NestedArray].
    ///
    /// # Panics
    /// Panics if the offsets are not consistent with each other and the content.
    pub fn new(offsets: Vec<Offsets>, content: ElementVec) -> Self {
        let mut entries = content.len();
        for level in offsets.iter().rev() {
            assert!(
                level.first() == Some(&0) && level.last() == Some(&entries),
                "offsets must span the next level"
            );
            entries = level.len() - 1;
        }

        Self { offsets, content }
    }

    /// Create a one-dimensional array without any list structure.
    pub fn flat(content: ElementVec) -> Self {
        Self::new(Vec::new(), content)
    }

    /// Create a two-dimensional array from the end offset of each list.
    pub fn from_cumulative_length(cumulative_length: &[usize], content: ElementVec) -> Self {
        let mut offsets = Vec::with_capacity(cumulative_length.len() + 1);
        offsets.push(0);
        offsets.extend_from_slice(cumulative_length);

        Self::new(vec![offsets], content)
    }

    /// Create an array with regular list lengths from a [DenseArray] of at least one dimension.
    ///
    /// Returns `None` for zero-dimensional arrays.
    pub fn from_dense(array: &DenseArray) -> Option<Self> {
        let shape = array.shape();
        if shape.is_empty() {
            return None;
        }

        let offsets = (0..shape.len() - 1)
            .map(|level| {
                let lists: usize = shape[..=level].iter().product();
                (0..=lists).map(|list| list * shape[level + 1]).collect()
            })
            .collect();

        Some(Self::new(offsets, array.data().clone()))
    }

    /// Return the number of outermost entries.
    pub fn len(&self) -> usize {
        match self.offsets.first() {
            Some(offsets) => offsets.len() - 1,
            None => self.content.len(),
        }
    }

    /// Return true iff there are no outermost entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the number of dimensions, i.e. the levels of lists plus one.
    pub fn ndim(&self) -> usize {
        self.offsets.len() + 1
    }

    /// Return the offsets of each list level, outermost first.
    pub fn offsets(&self) -> &[Offsets] {
        &self.offsets
    }

    /// Return the innermost elements.
    pub fn content(&self) -> &ElementVec {
        &self.content
    }

    /// Return the end offset of each list of a two-dimensional array.
    pub fn cumulative_length(&self) -> Option<&[usize]> {
        match self.offsets.as_slice() {
            [offsets] => Some(&offsets[1..]),
            _ => None,
        }
    }

    /// Return the lists of a two-dimensional array.
    pub fn to_lists(&self) -> Option<Vec<Vec<ElementValue>>> {
        let [offsets] = self.offsets.as_slice() else {
            return None;
        };

        Some(
            (0..offsets.len() - 1)
                .map(|list| {
                    list_range(offsets, list)
                        .filter_map(|index| self.content.get(index))
                        .collect()
                })
                .collect(),
        )
    }

    /// Match up the list structure of `self` and `other`.
    ///
    /// Where both arrays have lists at the same depth, their lengths have to agree.
    /// Where only one of them has lists, each element of the other
    /// is repeated for every entry of the corresponding list.
    fn align(&self, other: &NestedArray) -> Result<Alignment, ExpressionError> {
        if self.len() != other.len() {
            return Err(ExpressionError::NestedMismatch(format!(
                "arrays have different lengths {} and {}",
                self.len(),
                other.len()
            )));
        }

        let mut left: Vec<usize> = (0..self.len()).collect();
        let mut right: Vec<usize> = (0..other.len()).collect();
        let mut offsets = Vec::new();

        for depth in 0..self.offsets.len().max(other.offsets.len()) {
            let left_level = self.offsets.get(depth);
            let right_level = other.offsets.get(depth);

            let mut next_left = Vec::new();
            let mut next_right = Vec::new();
            let mut counts = Vec::with_capacity(left.len());

            for (&left_index, &right_index) in left.iter().zip(&right) {
                let left_range = left_level.map(|level| list_range(level, left_index));
                let right_range = right_level.map(|level| list_range(level, right_index));

                let count = match (&left_range, &right_range) {
                    (Some(left_range), Some(right_range)) => {
                        if left_range.len() != right_range.len() {
                            return Err(ExpressionError::NestedMismatch(format!(
                                "lists of lengths {} and {} at depth {}",
                                left_range.len(),
                                right_range.len(),
                                depth + 1
                            )));
                        }
                        left_range.len()
                    }
                    (Some(range), None) | (None, Some(range)) => range.len(),
                    (None, None) => unreachable!("one of the arrays has lists at this depth"),
                };

                match left_range {
                    Some(range) => next_left.extend(range),
                    None => next_left.extend(std::iter::repeat(left_index).take(count)),
                }
                match right_range {
                    Some(range) => next_right.extend(range),
                    None => next_right.extend(std::iter::repeat(right_index).take(count)),
                }
                counts.push(count);
            }

            offsets.push(counts_to_offsets(counts));
            left = next_left;
            right = next_right;
        }

        Ok(Alignment {
            offsets,
            left,
            right,
        })
    }

    /// Apply `operation` to the elements of `self` and `other` after aligning their lists.
    pub fn binary(
        &self,
        operation: BinaryOperation,
        other: &NestedArray,
    ) -> Result<NestedArray, ExpressionError> {
        let alignment = self.align(other)?;
        let content = kernels::binary(
            operation,
            &self.content.take(&alignment.left),
            &other.content.take(&alignment.right),
        )?;

        Ok(NestedArray::new(alignment.offsets, content))
    }

    /// Create an array with the list structure of `self` and every element set to `value`.
    pub fn filled_with(&self, value: ElementValue) -> NestedArray {
        NestedArray::new(
            self.offsets.clone(),
            ElementVec::repeat(value, self.content.len()),
        )
    }

    /// Apply `operation` to every element and `value`, which is broadcast everywhere.
    ///
    /// If `value_first` is set, `value` is the left operand.
    pub fn binary_scalar(
        &self,
        operation: BinaryOperation,
        value: ElementValue,
        value_first: bool,
    ) -> Result<NestedArray, ExpressionError> {
        let broadcast = ElementVec::repeat(value, self.content.len());
        let content = if value_first {
            kernels::binary(operation, &broadcast, &self.content)?
        } else {
            kernels::binary(operation, &self.content, &broadcast)?
        };

        Ok(NestedArray::new(self.offsets.clone(), content))
    }

    /// Apply `operation` to every element.
    pub fn unary(&self, operation: UnaryOperation) -> Result<NestedArray, ExpressionError> {
        Ok(NestedArray::new(
            self.offsets.clone(),
            kernels::unary(operation, &self.content)?,
        ))
    }

    /// Apply a one-argument `function` to every element.
    pub fn function(&self, function: ElementwiseFunction) -> Result<NestedArray, ExpressionError> {
        Ok(NestedArray::new(
            self.offsets.clone(),
            kernels::function(function, &[&self.content])?,
        ))
    }

    /// Apply a two-argument `function` to the elements of `self` and `other`
    /// after aligning their lists.
    pub fn function2(
        &self,
        function: ElementwiseFunction,
        other: &NestedArray,
    ) -> Result<NestedArray, ExpressionError> {
        let alignment = self.align(other)?;
        let content = kernels::function(
            function,
            &[
                &self.content.take(&alignment.left),
                &other.content.take(&alignment.right),
            ],
        )?;

        Ok(NestedArray::new(alignment.offsets, content))
    }

    /// Aggregate all elements into a single value.
    pub fn reduce_all(&self, reduction: Reduction) -> Result<ElementValue, ExpressionError> {
        kernels::reduce(reduction, &self.content, 0..self.content.len())
    }

    /// Aggregate each innermost list into a single value,
    /// removing one dimension.
    ///
    /// There are no missing values, so `min` and `max` fail
    /// with [ExpressionError::EmptyList] if one of the lists is empty.
    pub fn reduce_innermost(&self, reduction: Reduction) -> Result<NestedArray, ExpressionError> {
        let Some((innermost, outer)) = self.offsets.split_last() else {
            return Err(ExpressionError::InvalidAxis { axis: 1, ndim: 1 });
        };

        let content = (0..innermost.len() - 1)
            .map(|list| {
                kernels::reduce(reduction, &self.content, list_range(innermost, list)).map_err(
                    |error| match error {
                        ExpressionError::EmptyReduction(reduction) => {
                            ExpressionError::EmptyList { reduction, list }
                        }
                        error => error,
                    },
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let content = ElementVec::from_values(
            kernels::reduction_type(reduction, self.content.element_type()),
            content,
        );

        Ok(NestedArray::new(outer.to_vec(), content))
    }

    /// Count the entries of each list at dimension `axis`,
    /// which has to be at least one.
    pub fn num(&self, axis: i64) -> Result<NestedArray, ExpressionError> {
        let normalized = normalize_axis(axis, self.ndim())?;
        if normalized == 0 {
            return Err(ExpressionError::UnsupportedAxis {
                function: "num".to_string(),
                axis,
            });
        }

        let level = &self.offsets[normalized - 1];
        let counts = (0..level.len() - 1)
            .map(|list| i64::try_from(list_range(level, list).len()).unwrap_or(i64::MAX))
            .collect::<Vec<_>>();

        Ok(NestedArray::new(
            self.offsets[..normalized - 1].to_vec(),
            ElementVec::from(counts),
        ))
    }

    /// Remove the list boundaries between dimension `axis - 1` and `axis`.
    ///
    /// With `axis` set to `None`, all list structure is removed.
    pub fn flatten(&self, axis: Option<i64>) -> Result<NestedArray, ExpressionError> {
        let Some(axis) = axis else {
            return Ok(NestedArray::flat(self.content.clone()));
        };

        let normalized = normalize_axis(axis, self.ndim())?;
        let mut offsets = self.offsets.clone();

        match normalized {
            0 => {}
            1 => {
                offsets.remove(0);
            }
            _ => {
                let inner = offsets.remove(normalized - 1);
                let outer = &mut offsets[normalized - 2];
                for offset in outer.iter_mut() {
                    *offset = inner[*offset];
                }
            }
        }

        Ok(NestedArray::new(offsets, self.content.clone()))
    }
}

#[cfg(test)]
mod test {
    use crate::{
        arrays::DenseArray,
        datatypes::{ElementValue, ElementVec},
        error::ExpressionError,
        expression::operations::{BinaryOperation, Reduction},
    };

    use super::NestedArray;
    use test_log::test;

    fn ragged() -> NestedArray {
        NestedArray::from_cumulative_length(&[1, 3, 6], ElementVec::from(vec![5i64, 6, 7, 8, 9, 0]))
    }

    #[test]
    fn flat_broadcasts_over_lists() {
        let flat = NestedArray::flat(ElementVec::from(vec![1i64, 2, 3]));
        let sum = flat.binary(BinaryOperation::Addition, &ragged()).unwrap();

        assert_eq!(sum.cumulative_length(), Some(&[1, 3, 6][..]));
        assert_eq!(sum.content(), &ElementVec::from(vec![6i64, 8, 9, 11, 12, 3]));
    }

    #[test]
    fn equal_lists_combine() {
        let doubled = ragged().binary(BinaryOperation::Addition, &ragged()).unwrap();
        assert_eq!(
            doubled.content(),
            &ElementVec::from(vec![10i64, 12, 14, 16, 18, 0])
        );

        let other =
            NestedArray::from_cumulative_length(&[2, 3, 6], ElementVec::from(vec![0i64; 6]));
        assert!(matches!(
            ragged().binary(BinaryOperation::Addition, &other),
            Err(ExpressionError::NestedMismatch(_))
        ));

        let short = NestedArray::flat(ElementVec::from(vec![1i64, 2]));
        assert!(short.binary(BinaryOperation::Addition, &ragged()).is_err());
    }

    #[test]
    fn dense_rows_become_lists() {
        let matrix = DenseArray::new(vec![2, 2], ElementVec::from(vec![1.0, 2.0, 3.0, 4.0]));
        let nested = NestedArray::from_dense(&matrix).unwrap();

        assert_eq!(nested.len(), 2);
        assert_eq!(nested.cumulative_length(), Some(&[2, 4][..]));
        assert!(NestedArray::from_dense(&DenseArray::scalar(1i64.into())).is_none());
    }

    #[test]
    fn reductions() {
        assert_eq!(
            ragged().reduce_all(Reduction::Sum).unwrap(),
            ElementValue::Int64(35)
        );

        let sums = ragged().reduce_innermost(Reduction::Sum).unwrap();
        assert_eq!(sums.ndim(), 1);
        assert_eq!(sums.content(), &ElementVec::from(vec![5i64, 13, 17]));

        let means = ragged().reduce_innermost(Reduction::Mean).unwrap();
        assert_eq!(means.content(), &ElementVec::from(vec![5.0, 6.5, 17.0 / 3.0]));
    }

    #[test]
    fn empty_lists_in_reductions() {
        let with_empty =
            NestedArray::from_cumulative_length(&[1, 1, 4], ElementVec::from(vec![5i64, 8, 9, 0]));

        let sums = with_empty.reduce_innermost(Reduction::Sum).unwrap();
        assert_eq!(sums.content(), &ElementVec::from(vec![5i64, 0, 17]));

        assert!(matches!(
            with_empty.reduce_innermost(Reduction::Max),
            Err(ExpressionError::EmptyList { reduction, list: 1 }) if reduction == "max"
        ));
    }

    #[test]
    fn structure() {
        let counts = ragged().num(1).unwrap();
        assert_eq!(counts.content(), &ElementVec::from(vec![1i64, 2, 3]));
        assert!(ragged().num(0).is_err());

        let flat = ragged().flatten(Some(1)).unwrap();
        assert_eq!(flat.ndim(), 1);
        assert_eq!(flat.len(), 6);

        let deep = NestedArray::new(
            vec![vec![0, 2, 3], vec![0, 1, 3, 4]],
            ElementVec::from(vec![1i64, 2, 3, 4]),
        );
        let merged = deep.flatten(Some(2)).unwrap();
        assert_eq!(merged.cumulative_length(), Some(&[3, 4][..]));

        let lists = deep.flatten(Some(1)).unwrap();
        assert_eq!(lists.cumulative_length(), Some(&[1, 3, 4][..]));
    }
}
