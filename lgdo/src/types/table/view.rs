//! This module implements the views of a [Table].

use std::{fmt::Display, sync::Arc};

use arrow::{
    array::{Array as _, ArrayRef, StructArray},
    datatypes::{Field, Fields, Schema},
    record_batch::{RecordBatch, RecordBatchOptions},
    util::pretty::pretty_format_batches,
};

use crate::{
    error::Error,
    types::{Attrs, Lgdo, LgdoRef, LgdoType, DATATYPE_ATTRIBUTE},
    view::{View, ViewFormat, ViewParameters},
};

use super::Table;

impl Table {
    /// Return the selected columns, or all of them, in order.
    fn selected_columns(&self, parameters: &ViewParameters) -> Result<Vec<(String, LgdoRef)>, Error> {
        match parameters.columns() {
            Some(names) => names
                .iter()
                .map(|name| {
                    self.get(name)
                        .map(|column| (name.clone(), column.clone()))
                        .ok_or_else(|| Error::MissingField(name.clone()))
                })
                .collect(),
            None => Ok(self
                .iter()
                .map(|(name, column)| (name.to_string(), column.clone()))
                .collect()),
        }
    }

    /// Flat Arrow fields and columns, nested tables being expanded into prefixed columns.
    fn tabular_columns(
        &self,
        parameters: &ViewParameters,
        fields: &mut Vec<Field>,
        arrays: &mut Vec<ArrayRef>,
    ) -> Result<(), Error> {
        let column_parameters = ViewParameters::default().with_units(parameters.units());

        for (name, column) in self.selected_columns(parameters)? {
            let name = format!("{}{name}", parameters.prefix());

            let object = column.borrow();
            match &*object {
                Lgdo::Table(table) => {
                    let nested = ViewParameters::default()
                        .with_units(parameters.units())
                        .with_prefix(format!("{name}_"));
                    table.tabular_columns(&nested, fields, arrays)?;
                }
                other => {
                    let view = other.view_as(ViewFormat::Tabular, &column_parameters)?;
                    let Some((field, array)) = view.into_series() else {
                        return Err(Error::FormatNotSupported {
                            format: ViewFormat::Tabular,
                            datatype: other.form_datatype(),
                        });
                    };

                    fields.push(field.as_ref().clone().with_name(name));
                    arrays.push(array);
                }
            }
        }

        Ok(())
    }

    fn record_batch(&self, parameters: &ViewParameters) -> Result<RecordBatch, Error> {
        let mut fields = Vec::new();
        let mut arrays = Vec::new();
        self.tabular_columns(parameters, &mut fields, &mut arrays)?;

        let options = RecordBatchOptions::new().with_row_count(Some(self.size()));
        Ok(RecordBatch::try_new_with_options(
            Arc::new(Schema::new(fields)),
            arrays,
            &options,
        )?)
    }

    fn struct_array(&self, parameters: &ViewParameters) -> Result<StructArray, Error> {
        let mut fields = Vec::new();
        let mut arrays = Vec::<ArrayRef>::new();

        for (name, column) in self.selected_columns(parameters)? {
            let array: ArrayRef = match &*column.borrow() {
                Lgdo::Table(table) => Arc::new(table.struct_array(&ViewParameters::default())?),
                other => {
                    let view = other.view_as(ViewFormat::Tabular, &ViewParameters::default())?;
                    match view.into_series() {
                        Some((_, array)) => array,
                        None => {
                            return Err(Error::FormatNotSupported {
                                format: ViewFormat::Records,
                                datatype: other.form_datatype(),
                            })
                        }
                    }
                }
            };

            fields.push(Field::new(name, array.data_type().clone(), array.null_count() > 0));
            arrays.push(array);
        }

        if fields.is_empty() {
            return Ok(StructArray::new_empty_fields(self.size(), None));
        }

        Ok(StructArray::try_new(Fields::from(fields), arrays, None)?)
    }

    /// View this table in `format`.
    ///
    /// * [ViewFormat::Tabular] gives a [RecordBatch] of flat columns,
    ///   where the columns of nested tables are named `<prefix><table>_<column>`.
    ///   Units are stored as field metadata.
    /// * [ViewFormat::Records] gives a [StructArray] with nested tables as struct columns.
    ///   It cannot carry units.
    /// * [ViewFormat::Array] is not supported.
    pub(crate) fn view(&self, format: ViewFormat, parameters: &ViewParameters) -> Result<View, Error> {
        match format {
            ViewFormat::Tabular => self.record_batch(parameters).map(View::Frame),
            ViewFormat::Records => {
                if parameters.units() {
                    return Err(Error::UnitsNotSupported(format));
                }

                self.struct_array(parameters).map(View::Records)
            }
            ViewFormat::Array => Err(Error::FormatNotSupported {
                format,
                datatype: self.datatype_name().to_string(),
            }),
        }
    }

    /// Return the selected columns, or all of them, as a [RecordBatch].
    #[deprecated(note = "use `view_as` with `ViewFormat::Tabular` instead")]
    pub fn get_dataframe(&self, columns: Option<&[&str]>, prefix: &str) -> Result<RecordBatch, Error> {
        log::warn!(
            "get_dataframe is deprecated and will be removed in a future release, \
            use view_as to get the table data as a record batch or struct array"
        );

        let mut parameters = ViewParameters::default().with_prefix(prefix);
        if let Some(columns) = columns {
            parameters = parameters.with_columns(columns.iter().copied());
        }

        self.record_batch(&parameters)
    }
}

/// Attributes worth printing, i.e. any besides the datatype.
fn user_attrs(attrs: &Attrs) -> Option<String> {
    if attrs.keys().all(|key| key == DATATYPE_ATTRIBUTE) {
        return None;
    }

    serde_json::to_string(attrs).ok()
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let formatted = self
            .record_batch(&ViewParameters::default())
            .and_then(|batch| Ok(pretty_format_batches(&[batch])?));

        match formatted {
            Ok(table) => writeln!(f, "{table}")?,
            Err(error) => writeln!(f, "cannot print table: {error}")?,
        }

        for (name, column) in self.iter() {
            if let Some(attrs) = user_attrs(column.borrow().attrs()) {
                write!(f, "\nwith attrs['{name}']={attrs}")?;
            }
        }

        if let Some(attrs) = user_attrs(self.attrs()) {
            write!(f, "\nwith attrs={attrs}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use arrow::{
        array::{Array as _, AsArray},
        datatypes::{DataType, Int64Type},
    };

    use crate::{
        error::Error,
        types::{Array, Attrs, LgdoRef, LgdoType, VectorOfVectors},
        view::{ViewFormat, ViewParameters, UNITS_METADATA_KEY},
    };

    use super::Table;
    use test_log::test;

    fn table() -> Table {
        let mut energy = Array::from(vec![1.5, 2.5]);
        energy
            .attrs_mut()
            .insert("units".to_string(), "keV".into());

        let inner = Table::from_columns([
            ("x", LgdoRef::new(Array::from(vec![1i64, 2]))),
            ("y", LgdoRef::new(Array::from(vec![true, false]))),
        ])
        .unwrap();

        Table::from_columns([
            ("energy", LgdoRef::new(energy)),
            (
                "hits",
                LgdoRef::new(VectorOfVectors::from(vec![vec![1i64], vec![2, 3]])),
            ),
            ("inner", LgdoRef::new(inner)),
        ])
        .unwrap()
    }

    #[test]
    fn tabular_flattens_nested_tables() {
        let batch = table()
            .view_as(
                ViewFormat::Tabular,
                &ViewParameters::default().with_units(true),
            )
            .unwrap()
            .into_frame()
            .unwrap();

        let names = batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["energy", "hits", "inner_x", "inner_y"]);
        assert_eq!(batch.num_rows(), 2);

        let schema = batch.schema();
        let energy = schema.field_with_name("energy").unwrap();
        assert_eq!(
            energy.metadata().get(UNITS_METADATA_KEY).map(String::as_str),
            Some("keV")
        );
        assert!(matches!(
            schema.field_with_name("hits").unwrap().data_type(),
            DataType::LargeList(_)
        ));
    }

    #[test]
    fn tabular_respects_columns_and_prefix() {
        let parameters = ViewParameters::default()
            .with_columns(["inner", "energy"])
            .with_prefix("evt_");
        let batch = table()
            .view_as(ViewFormat::Tabular, &parameters)
            .unwrap()
            .into_frame()
            .unwrap();

        let names = batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["evt_inner_x", "evt_inner_y", "evt_energy"]);

        let missing = table().view_as(
            ViewFormat::Tabular,
            &ViewParameters::default().with_columns(["nope"]),
        );
        assert!(matches!(missing, Err(Error::MissingField(name)) if name == "nope"));
    }

    #[test]
    fn records_nest_tables() {
        let records = table()
            .view_as(ViewFormat::Records, &ViewParameters::default())
            .unwrap()
            .into_records()
            .unwrap();

        assert_eq!(records.len(), 2);
        let inner = records.column_by_name("inner").unwrap().as_struct();
        let x = inner.column_by_name("x").unwrap().as_primitive::<Int64Type>();
        assert_eq!(x.values().to_vec(), vec![1, 2]);

        let empty = Table::with_size(3)
            .view_as(ViewFormat::Records, &ViewParameters::default())
            .unwrap()
            .into_records()
            .unwrap();
        assert_eq!(empty.len(), 3);
    }

    #[test]
    fn unsupported_views() {
        assert!(matches!(
            table().view_as(ViewFormat::Array, &ViewParameters::default()),
            Err(Error::FormatNotSupported { .. })
        ));
        assert!(matches!(
            table().view_as(
                ViewFormat::Records,
                &ViewParameters::default().with_units(true)
            ),
            Err(Error::UnitsNotSupported(ViewFormat::Records))
        ));
    }

    #[test]
    #[allow(deprecated)]
    fn dataframe_alias() {
        let batch = table().get_dataframe(Some(&["energy"]), "t_").unwrap();
        assert_eq!(batch.num_columns(), 1);
        assert_eq!(batch.schema().field(0).name(), "t_energy");
    }

    #[test]
    fn display_lists_attributes() {
        let mut attrs = Attrs::new();
        attrs.insert("run".to_string(), 7.into());
        let table = Table::new(
            None,
            [("a", LgdoRef::new(Array::from(vec![1i64, 2])))],
            attrs,
        )
        .unwrap();

        let printed = table.to_string();
        assert!(printed.contains("| a |"));
        assert!(printed.contains("with attrs={\"datatype\":\"table{a}\",\"run\":7}"));
        assert!(!printed.contains("with attrs['a']"));
    }
}
