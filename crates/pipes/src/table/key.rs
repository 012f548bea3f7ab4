//! Hashable row keys: join keys, group-by tuples and window partitions.

use crate::table::Column;
use hashbrown::HashMap;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;

/// A borrowed, hashable cell value.
///
/// Floats are compared through `OrderedFloat`, so `0.0` and `-0.0` are the
/// same key and `NaN` equals itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyValue<'a> {
    Null,
    Float64(OrderedFloat<f64>),
    Int64(i64),
    String(&'a str),
    DateTime(i64),
    Bool(bool),
}

impl KeyValue<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Values of the key columns of one row.
pub type RowKey<'a> = SmallVec<[KeyValue<'a>; 4]>;

/// Builds the key of `row` from `columns`.
pub fn row_key<'a>(columns: &[&'a Column], row: usize) -> RowKey<'a> {
    columns.iter().map(|column| column.data().key(row)).collect()
}

/// Assignment of rows to groups of equal key tuples.
///
/// Groups are numbered in order of their first row.  Null key values are
/// equal to each other for grouping purposes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partitioning {
    group_ids: Vec<usize>,
    first_rows: Vec<usize>,
}

impl Partitioning {
    /// Partitions `num_rows` rows by the values of `columns`.  Without
    /// columns, all rows form a single group.
    pub fn new(columns: &[&Column], num_rows: usize) -> Self {
        let mut group_ids = Vec::with_capacity(num_rows);
        let mut first_rows = Vec::new();

        if columns.is_empty() {
            group_ids.resize(num_rows, 0);
            if num_rows > 0 {
                first_rows.push(0);
            }
            return Self {
                group_ids,
                first_rows,
            };
        }

        let mut groups: HashMap<RowKey<'_>, usize> = HashMap::new();
        for row in 0..num_rows {
            let next = first_rows.len();
            let group = *groups.entry(row_key(columns, row)).or_insert(next);
            if group == next {
                first_rows.push(row);
            }
            group_ids.push(group);
        }

        Self {
            group_ids,
            first_rows,
        }
    }

    pub fn num_groups(&self) -> usize {
        self.first_rows.len()
    }

    /// Group of every row.
    pub fn group_ids(&self) -> &[usize] {
        &self.group_ids
    }

    /// First row of every group, in group order.
    pub fn first_rows(&self) -> &[usize] {
        &self.first_rows
    }
}
