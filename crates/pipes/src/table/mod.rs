//! Immutable, row-aligned columnar tables.
//!
//! A [`DataTable`] is an ordered set of uniquely named [`Column`]s of equal
//! length.  Column payloads are reference counted: projecting, renaming or
//! passing a table through a pipe never copies values.

mod column;
mod key;
mod value;

pub use column::{ArrayRef, Column, ColumnData};
pub use key::{row_key, KeyValue, Partitioning, RowKey};
pub use value::{DataType, ScalarValue};

use crate::error::SchemaError;
use arcstr::ArcStr;
use indexmap::IndexMap;
use itertools::Itertools;
use pipes_types::WireTable;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTable {
    columns: IndexMap<String, Column>,
    num_rows: usize,
}

impl DataTable {
    /// Builds a table from columns, in order.
    ///
    /// Fails if two columns share a name or their lengths differ.
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Result<Self, SchemaError> {
        let mut table = Self::default();
        for (i, column) in columns.into_iter().enumerate() {
            if i == 0 {
                table.num_rows = column.len();
            }
            table.check_length(&column)?;
            if table.columns.contains_key(column.name()) {
                return Err(SchemaError::DuplicateColumn {
                    column: column.name().to_string(),
                });
            }
            table.columns.insert(column.name().to_string(), column);
        }
        Ok(table)
    }

    /// A table with `num_rows` rows and no columns.
    pub fn empty(num_rows: usize) -> Self {
        Self {
            columns: IndexMap::new(),
            num_rows,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Looks up a column, failing with [`SchemaError::MissingColumn`].
    pub fn column(&self, name: &str) -> Result<&Column, SchemaError> {
        self.columns
            .get(name)
            .ok_or_else(|| SchemaError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Value at `row` of column `name`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.num_rows()`.
    pub fn value(&self, row: usize, name: &str) -> Result<ScalarValue, SchemaError> {
        Ok(self.column(name)?.value(row))
    }

    /// All values of one row, in column order.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.num_rows()` and the table has columns.
    pub fn row(&self, row: usize) -> Vec<ScalarValue> {
        self.columns.values().map(|c| c.value(row)).collect()
    }

    /// The named columns, in the given order.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, SchemaError> {
        let columns = names
            .iter()
            .map(|name| self.column(name.as_ref()).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let mut table = Self::new(columns)?;
        table.num_rows = self.num_rows;
        Ok(table)
    }

    /// Returns a table with `column` added.  A column with the same name is
    /// replaced in place, otherwise `column` is appended.
    pub fn with_column(&self, column: Column) -> Result<Self, SchemaError> {
        let mut table = self.clone();
        if table.columns.is_empty() && table.num_rows == 0 {
            table.num_rows = column.len();
        }
        table.check_length(&column)?;
        table.columns.insert(column.name().to_string(), column);
        Ok(table)
    }

    /// Rows of `self` followed by rows of `other`.
    ///
    /// Both tables must have the same column names in the same order.
    /// Column types must unify; an all-null column adopts the type of its
    /// counterpart.
    pub fn concat(&self, other: &Self) -> Result<Self, SchemaError> {
        let mismatch = || SchemaError::SchemaMismatch {
            left: self.schema_string(),
            right: other.schema_string(),
        };
        if !self.column_names().eq(other.column_names()) {
            return Err(mismatch());
        }

        let mut columns = Vec::with_capacity(self.num_columns());
        for (left, right) in self.columns().zip(other.columns()) {
            let data_type = unify_columns(left.data(), right.data()).ok_or_else(mismatch)?;
            let a = left.data().retype(data_type).ok_or_else(mismatch)?;
            let b = right.data().retype(data_type).ok_or_else(mismatch)?;
            let data = a.concat(&b).ok_or_else(mismatch)?;
            columns.push(Column::new(left.name(), data));
        }
        let mut table = Self::new(columns)?;
        table.num_rows = self.num_rows + other.num_rows;
        Ok(table)
    }

    /// Rows at `indices`, in order.
    pub fn take(&self, indices: &[usize]) -> Self {
        self.map_columns(indices.len(), |data| data.take(indices))
    }

    /// Rows at `indices`; `None` produces a row of nulls.
    pub fn take_opt(&self, indices: &[Option<usize>]) -> Self {
        self.map_columns(indices.len(), |data| data.take_opt(indices))
    }

    /// Rows whose `mask` entry is true.
    pub fn filter(&self, mask: &[bool]) -> Self {
        let num_rows = mask.iter().filter(|keep| **keep).count();
        self.map_columns(num_rows, |data| data.filter(mask))
    }

    /// Builds a table from its wire form.  Columns are taken group by group:
    /// float64, int64, string, datetime, then bool.
    pub fn from_wire(wire: WireTable) -> Result<Self, SchemaError> {
        let float64 = wire.float64.into_iter().map(|(n, v)| Column::new(n, v));
        let int64 = wire.int64.into_iter().map(|(n, v)| Column::new(n, v));
        let string = wire.string.into_iter().map(|(n, v)| Column::new(n, v));
        let datetime = wire
            .datetime
            .into_iter()
            .map(|(n, v)| Column::new(n, ColumnData::DateTime(v)));
        let bool = wire.bool.into_iter().map(|(n, v)| Column::new(n, v));
        Self::new(float64.chain(int64).chain(string).chain(datetime).chain(bool))
    }

    /// The wire form of the table.  Column order is kept within each type
    /// group.
    pub fn to_wire(&self) -> WireTable {
        let mut wire = WireTable::default();
        for column in self.columns() {
            let name = column.name().to_string();
            match column.data() {
                ColumnData::Float64(values) => {
                    wire.float64.insert(name, values.clone());
                }
                ColumnData::Int64(values) => {
                    wire.int64.insert(name, values.clone());
                }
                ColumnData::String(values) => {
                    let values = values
                        .iter()
                        .map(|v| v.as_ref().map(ArcStr::to_string))
                        .collect();
                    wire.string.insert(name, values);
                }
                ColumnData::DateTime(values) => {
                    wire.datetime.insert(name, values.clone());
                }
                ColumnData::Bool(values) => {
                    wire.bool.insert(name, values.clone());
                }
            }
        }
        wire
    }

    fn check_length(&self, column: &Column) -> Result<(), SchemaError> {
        if column.len() != self.num_rows {
            return Err(SchemaError::LengthMismatch {
                column: column.name().to_string(),
                expected: self.num_rows,
                actual: column.len(),
            });
        }
        Ok(())
    }

    fn map_columns(&self, num_rows: usize, f: impl Fn(&ColumnData) -> ColumnData) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| (name.clone(), Column::new(name.clone(), f(column.data()))))
            .collect();
        Self { columns, num_rows }
    }

    fn schema_string(&self) -> String {
        self.columns()
            .map(|c| format!("{}: {}", c.name(), c.data_type()))
            .join(", ")
    }
}

/// Common type of two columns, treating all-null columns as untyped.
pub fn unify_columns(a: &ColumnData, b: &ColumnData) -> Option<DataType> {
    match (a.is_all_null(), b.is_all_null()) {
        (true, _) => Some(b.data_type()),
        (false, true) => Some(a.data_type()),
        (false, false) => a.data_type().unify(b.data_type()),
    }
}

#[cfg(test)]
mod test {
    use super::{Column, ColumnData, DataTable, DataType, ScalarValue};
    use crate::error::SchemaError;
    use pipes_types::WireTable;
    use pretty_assertions::assert_eq;

    fn revenue() -> DataTable {
        DataTable::new([
            Column::new("year", vec![Some(2021i64), Some(2022), Some(2023)]),
            Column::new("revenue", vec![Some(100.0), None, Some(300.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn reject_bad_shapes() {
        let err = DataTable::new([
            Column::new("a", vec![Some(1i64)]),
            Column::new("b", vec![Some(1i64), Some(2)]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::LengthMismatch {
                column: "b".to_string(),
                expected: 1,
                actual: 2
            }
        );

        let err = DataTable::new([
            Column::new("a", vec![Some(1i64)]),
            Column::new("a", vec![Some(2i64)]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateColumn {
                column: "a".to_string()
            }
        );
    }

    #[test]
    fn lookup() {
        let table = revenue();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.value(2, "revenue").unwrap(), ScalarValue::Float64(300.0));
        assert_eq!(
            table.column("cost").unwrap_err(),
            SchemaError::MissingColumn {
                column: "cost".to_string()
            }
        );
        assert_eq!(table.row(1), vec![ScalarValue::Int64(2022), ScalarValue::Null]);
    }

    #[test]
    #[should_panic]
    fn value_out_of_range() {
        let _ = revenue().value(3, "year");
    }

    #[test]
    fn with_column_keeps_position() {
        let table = revenue()
            .with_column(Column::new("year", vec![Some("a"), Some("b"), Some("c")]))
            .unwrap()
            .with_column(Column::new("cost", vec![Some(1.0), Some(2.0), Some(3.0)]))
            .unwrap();
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["year", "revenue", "cost"]);
        assert_eq!(table.column("year").unwrap().data_type(), DataType::String);
        assert!(revenue()
            .with_column(Column::new("cost", vec![Some(1.0)]))
            .is_err());
    }

    #[test]
    fn gather_and_filter() {
        let table = revenue();
        assert_eq!(table.take(&[2, 0]).row(0), vec![ScalarValue::Int64(2023), ScalarValue::Float64(300.0)]);
        let padded = table.take_opt(&[None, Some(1)]);
        assert_eq!(padded.num_rows(), 2);
        assert_eq!(padded.row(0), vec![ScalarValue::Null, ScalarValue::Null]);
        let filtered = table.filter(&[false, true, true]);
        assert_eq!(filtered.num_rows(), 2);
        assert_eq!(filtered.value(0, "year").unwrap(), ScalarValue::Int64(2022));
        assert_eq!(table.project(&["revenue"]).unwrap().num_columns(), 1);
    }

    #[test]
    fn concat() {
        let table = revenue();
        let nulls = DataTable::new([
            Column::new("year", vec![Some(2020i64)]),
            Column::from_array("revenue", ColumnData::nulls(DataType::String, 1).into()),
        ])
        .unwrap();
        let both = table.concat(&nulls).unwrap();
        assert_eq!(both.num_rows(), 4);
        assert_eq!(both.column("revenue").unwrap().data_type(), DataType::Float64);

        let other = table.project(&["revenue", "year"]).unwrap();
        assert!(matches!(
            table.concat(&other),
            Err(SchemaError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn wire_roundtrip() {
        let wire: WireTable = serde_json::from_str(
            r#"{"int64": {"year": [2021, null]}, "string": {"name": ["a", "b"]}, "datetime": {"day": [0, 86400000]}}"#,
        )
        .unwrap();
        let table = DataTable::from_wire(wire.clone()).unwrap();
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["year", "name", "day"]);
        assert_eq!(table.column("day").unwrap().data_type(), DataType::DateTime);
        assert_eq!(table.to_wire(), wire);

        let wire: WireTable =
            serde_json::from_str(r#"{"int64": {"a": [1]}, "bool": {"a": [true]}}"#).unwrap();
        assert!(DataTable::from_wire(wire).is_err());
    }
}
