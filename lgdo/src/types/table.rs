//! This module defines [Table].

pub mod evaluation;
pub mod view;

use delegate::delegate;

use crate::{
    error::Error,
    view::{View, ViewFormat, ViewParameters},
};

use super::{Attrs, Lgdo, LgdoRef, LgdoType, Struct};

/// Named collection of columns with a common number of rows
///
/// Columns are shared handles: a column joined from another table
/// is the same object in both tables.
///
/// The table also tracks a row cursor `loc` for producers that fill it row by row
/// (see [Table::push_row], [Table::is_full] and [Table::clear]).
/// The cursor is pure bookkeeping and never touches the columns.
///
/// Note that a table that was resized but not yet filled still reports
/// its full size; resize it to the filled rows before handing it on.
#[derive(Debug, Clone)]
pub struct Table {
    fields: Struct,
    /// Common number of rows, `None` only while there are no columns
    size: Option<usize>,
    loc: usize,
}

impl Table {
    /// Number of rows of a table created without size and without columns
    pub const DEFAULT_SIZE: usize = 1024;

    /// Create a new [Table].
    ///
    /// If `columns` is not empty, all columns are resized to `size`.
    /// Without a `size`, the length of the first column is used,
    /// and a warning is logged for every column that has to be resized.
    ///
    /// # Errors
    /// Returns [Error::UnsupportedColumnType] if one of the columns has no row length.
    /// No column is resized in that case.
    pub fn new<Iter, S>(size: Option<usize>, columns: Iter, attrs: Attrs) -> Result<Self, Error>
    where
        Iter: IntoIterator<Item = (S, LgdoRef)>,
        S: Into<String>,
    {
        let columns = columns.into_iter().collect::<Vec<_>>();
        for (_, column) in &columns {
            column_length(&column.borrow())?;
        }

        let mut fields = Struct::with_kind("table", attrs);
        for (name, column) in columns {
            fields.add_field(name, column);
        }

        let mut table = Self {
            fields,
            size,
            loc: 0,
        };

        if !table.fields.is_empty() {
            table.resize(size, size.is_none())?;
        }

        Ok(table)
    }

    /// Create a new [Table] without columns.
    pub fn with_size(size: usize) -> Self {
        Self {
            fields: Struct::with_kind("table", Attrs::new()),
            size: Some(size),
            loc: 0,
        }
    }

    /// Create a new [Table] whose size is given by the first of `columns`.
    ///
    /// # Errors
    /// Returns [Error::UnsupportedColumnType] if one of the columns has no row length.
    pub fn from_columns<Iter, S>(columns: Iter) -> Result<Self, Error>
    where
        Iter: IntoIterator<Item = (S, LgdoRef)>,
        S: Into<String>,
    {
        Self::new(None, columns, Attrs::new())
    }

    /// Return the number of rows.
    pub fn size(&self) -> usize {
        self.size.unwrap_or(Self::DEFAULT_SIZE)
    }

    /// Resize all columns to `new_size` rows, or to the length of the first column if `None`.
    ///
    /// Columns that are nested tables are resized recursively.
    /// If `warn_on_mismatch` is set, a warning is logged for every column that is resized.
    ///
    /// # Errors
    /// Returns [Error::UnsupportedColumnType] if a column has no row length.
    pub fn resize(&mut self, new_size: Option<usize>, warn_on_mismatch: bool) -> Result<(), Error> {
        let mut target = new_size;

        for (name, column) in self.fields.iter() {
            let mut object = column.borrow_mut();
            let length = column_length(&object)?;

            let Some(size) = target else {
                target = Some(length);
                continue;
            };

            if length != size {
                if warn_on_mismatch {
                    log::warn!("resizing column \"{name}\" with length {length} to {size}");
                }

                match &mut *object {
                    Lgdo::Table(table) => table.resize(Some(size), warn_on_mismatch)?,
                    other => other.resize(size)?,
                }
            }
        }

        self.size = target;
        Ok(())
    }

    /// Advance the row cursor by one.
    ///
    /// The cursor is not bounded by the size; check [Table::is_full] first.
    pub fn push_row(&mut self) {
        self.loc += 1;
    }

    /// Return whether the row cursor reached the size.
    pub fn is_full(&self) -> bool {
        self.loc >= self.size()
    }

    /// Reset the row cursor to the first row.
    pub fn clear(&mut self) {
        self.loc = 0;
    }

    /// Return the row cursor.
    pub fn loc(&self) -> usize {
        self.loc
    }

    /// Add `column` as field `name`.
    ///
    /// A table without size takes the length of the column.
    /// Otherwise, if the length of the column differs from the size,
    /// a warning is logged and either the table is resized to the column
    /// (with `adopt_column_size`) or the column is resized to the table.
    ///
    /// # Errors
    /// Returns [Error::UnsupportedColumnType] if `column` has no row length.
    pub fn add_field(
        &mut self,
        name: impl Into<String>,
        column: LgdoRef,
        adopt_column_size: bool,
    ) -> Result<(), Error> {
        let name = name.into();
        let length = column_length(&column.borrow())?;

        self.fields.add_field(name.clone(), column.clone());

        match self.size {
            None => self.size = Some(length),
            Some(size) if size != length => {
                log::warn!(
                    "adding column \"{name}\" with length {length} to a table with size {size} might lose data: \
                    with adopt_column_size the table is padded or clipped to {length}, \
                    otherwise \"{name}\" is padded or clipped to {size}"
                );

                if adopt_column_size {
                    self.resize(Some(length), false)?;
                } else {
                    self.resize(Some(size), false)?;
                }
            }
            Some(_) => {}
        }

        Ok(())
    }

    /// Alias of [Table::add_field].
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        column: LgdoRef,
        adopt_column_size: bool,
    ) -> Result<(), Error> {
        self.add_field(name, column, adopt_column_size)
    }

    /// Remove field `name` and return it, if it exists.
    ///
    /// The size of the table does not change.
    pub fn remove_field(&mut self, name: &str) -> Option<LgdoRef> {
        self.fields.remove_field(name)
    }

    /// Alias of [Table::remove_field].
    pub fn remove_column(&mut self, name: &str) -> Option<LgdoRef> {
        self.remove_field(name)
    }

    /// Add the columns `columns` of `other`, or all of its columns, to this table.
    ///
    /// The columns are not copied: both tables refer to the same objects afterwards.
    /// Length mismatches are resolved as in [Table::add_field].
    /// If `warn_on_mismatch` is set, a warning is logged when the row cursors differ.
    ///
    /// # Errors
    /// Returns [Error::MissingField] if `other` has no column of a requested name.
    /// Nothing is joined in that case.
    pub fn join(
        &mut self,
        other: &Table,
        columns: Option<&[&str]>,
        warn_on_mismatch: bool,
    ) -> Result<(), Error> {
        let names: Vec<&str> = match columns {
            Some(columns) => columns.to_vec(),
            None => other.keys().collect(),
        };

        let joined = names
            .into_iter()
            .map(|name| {
                other
                    .get(name)
                    .map(|column| (name.to_string(), column.clone()))
                    .ok_or_else(|| Error::MissingField(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if other.loc != self.loc && warn_on_mismatch {
            log::warn!(
                "joining a table at loc {} into a table at loc {}",
                other.loc,
                self.loc
            );
        }

        for (name, column) in joined {
            self.add_column(name, column, false)?;
        }

        Ok(())
    }

    /// Return the underlying collection of columns.
    pub fn fields(&self) -> &Struct {
        &self.fields
    }

    delegate! {
        to self.fields {
            /// Return the column `name`, if it exists.
            pub fn get(&self, name: &str) -> Option<&LgdoRef>;
            /// Return whether there is a column `name`.
            pub fn contains(&self, name: &str) -> bool;
            /// Iterate over the column names in order.
            pub fn keys(&self) -> impl Iterator<Item = &str>;
            /// Iterate over the columns in order.
            pub fn iter(&self) -> impl Iterator<Item = (&str, &LgdoRef)>;
            /// Return the number of columns.
            #[call(len)]
            pub fn num_columns(&self) -> usize;
        }
    }
}

/// Row length of `object`, which is required of table columns.
fn column_length(object: &Lgdo) -> Result<usize, Error> {
    object
        .length()
        .ok_or_else(|| Error::UnsupportedColumnType(object.datatype_name().to_string()))
}

impl Default for Table {
    fn default() -> Self {
        Self {
            fields: Struct::with_kind("table", Attrs::new()),
            size: None,
            loc: 0,
        }
    }
}

impl LgdoType for Table {
    fn datatype_name(&self) -> &'static str {
        "table"
    }

    fn form_datatype(&self) -> String {
        self.fields.form_datatype()
    }

    fn attrs(&self) -> &Attrs {
        self.fields.attrs()
    }

    fn attrs_mut(&mut self) -> &mut Attrs {
        self.fields.attrs_mut()
    }

    fn length(&self) -> Option<usize> {
        Some(self.size())
    }

    fn resize(&mut self, length: usize) -> Result<(), Error> {
        Table::resize(self, Some(length), false)
    }

    fn view_as(&self, format: ViewFormat, parameters: &ViewParameters) -> Result<View, Error> {
        self.view(format, parameters)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::Error,
        types::{Array, Attrs, Lgdo, LgdoRef, LgdoType, Scalar, VectorOfVectors},
    };

    use super::Table;
    use test_log::test;

    fn column(data: Vec<i64>) -> LgdoRef {
        LgdoRef::new(Array::from(data))
    }

    #[test]
    fn construction_sets_size() {
        let table = Table::default();
        assert_eq!(table.size(), Table::DEFAULT_SIZE);
        assert_eq!(table.form_datatype(), "table{}");

        let table = Table::with_size(7);
        assert_eq!(table.size(), 7);

        let a = column(vec![1, 2, 3]);
        let b = column(vec![1, 2]);
        let table = Table::from_columns([("a", a.clone()), ("b", b.clone())]).unwrap();
        assert_eq!(table.size(), 3);
        assert_eq!(b.length(), Some(3));
        assert_eq!(table.attrs()["datatype"], "table{a,b}");

        let table = Table::new(Some(5), [("a", a.clone())], Attrs::new()).unwrap();
        assert_eq!(table.size(), 5);
        assert_eq!(a.length(), Some(5));
    }

    #[test]
    fn rowless_columns_are_rejected() {
        let result = Table::from_columns([("s", LgdoRef::new(Scalar::new(1i64)))]);
        assert!(matches!(result, Err(Error::UnsupportedColumnType(name)) if name == "real"));

        let a = column(vec![1, 2]);
        let result = Table::new(
            Some(5),
            [("a", a.clone()), ("s", LgdoRef::new(Scalar::new(1i64)))],
            Attrs::new(),
        );
        assert!(matches!(result, Err(Error::UnsupportedColumnType(_))));
        assert_eq!(a.length(), Some(2));

        let mut table = Table::with_size(2);
        let result = table.add_field("s", LgdoRef::new(Scalar::new(1.0)), false);
        assert!(matches!(result, Err(Error::UnsupportedColumnType(_))));
        assert_eq!(table.num_columns(), 0);
    }

    #[test]
    fn add_field_policies() {
        let mut table = Table::default();
        table.add_field("a", column(vec![1, 2, 3]), false).unwrap();
        assert_eq!(table.size(), 3);

        let b = column(vec![1]);
        table.add_field("b", b.clone(), false).unwrap();
        assert_eq!(table.size(), 3);
        assert_eq!(b.length(), Some(3));

        let c = LgdoRef::new(VectorOfVectors::from(vec![
            vec![1i64],
            vec![],
            vec![2, 3],
            vec![4],
            vec![5],
        ]));
        table.add_column("c", c.clone(), true).unwrap();
        assert_eq!(table.size(), 5);
        assert_eq!(b.length(), Some(5));
        assert_eq!(c.length(), Some(5));
    }

    #[test]
    fn nested_tables_resize_recursively() {
        let inner_column = column(vec![1, 2]);
        let inner = Table::from_columns([("x", inner_column.clone())]).unwrap();

        let mut outer = Table::with_size(4);
        outer
            .add_field("inner", LgdoRef::new(inner), false)
            .unwrap();

        assert_eq!(inner_column.length(), Some(4));
        let column = outer.get("inner").unwrap().borrow();
        match &*column {
            Lgdo::Table(inner) => assert_eq!(inner.size(), 4),
            other => panic!("unexpected column {other:?}"),
        }
    }

    #[test]
    fn cursor() {
        let mut table = Table::with_size(2);
        assert_eq!(table.loc(), 0);
        assert!(!table.is_full());

        table.push_row();
        table.push_row();
        assert!(table.is_full());
        table.push_row();
        assert_eq!(table.loc(), 3);

        table.clear();
        assert!(!table.is_full());
    }

    #[test]
    fn join_shares_columns() {
        let a = column(vec![1, 2, 3]);
        let first = Table::from_columns([("a", a.clone()), ("b", column(vec![4, 5, 6]))]).unwrap();
        let mut second = Table::from_columns([("c", column(vec![7, 8, 9]))]).unwrap();

        second.join(&first, Some(&["a"]), true).unwrap();
        assert_eq!(second.keys().collect::<Vec<_>>(), vec!["c", "a"]);
        assert!(second.get("a").unwrap().ptr_eq(&a));

        {
            let mut column = first.get("a").unwrap().borrow_mut();
            if let Lgdo::Array(array) = &mut *column {
                array.set(0, 10i64);
            }
        }
        {
            let column = second.get("a").unwrap().borrow();
            match &*column {
                Lgdo::Array(array) => assert_eq!(array.get(0), Some(10i64.into())),
                other => panic!("unexpected column {other:?}"),
            }
        }

        let result = second.join(&first, Some(&["b", "missing"]), true);
        assert!(matches!(result, Err(Error::MissingField(name)) if name == "missing"));
        assert!(!second.contains("b"));
    }

    #[test]
    fn remove_keeps_size() {
        let mut table = Table::from_columns([("a", column(vec![1, 2]))]).unwrap();
        assert!(table.remove_column("a").is_some());
        assert!(table.remove_column("a").is_none());
        assert_eq!(table.size(), 2);
        assert_eq!(table.form_datatype(), "table{}");
    }
}
