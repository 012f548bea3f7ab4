//! Hash equi-join of two tables on equally named key columns.

use crate::error::SchemaError;
use crate::table::{row_key, unify_columns, Column, DataTable, KeyValue, RowKey};
use hashbrown::HashMap;
use pipes_types::JoinKind;
use smallvec::SmallVec;
use tracing::warn;

/// Suffix given to a non-key right column whose name is taken on the left.
pub const RIGHT_SUFFIX: &str = "_right";

/// Joins `left` and `right` on the `on` columns.
///
/// The output holds every left column followed by the non-key right
/// columns.  Key columns carry the left value where a left row exists and
/// the right value otherwise.  Rows are ordered by left row then right row,
/// except for [`JoinKind::Right`] which orders by right row then left row.
/// An outer join is the left join concatenated with the right rows that
/// matched nothing.
pub fn join(
    left: &DataTable,
    right: &DataTable,
    on: &[String],
    how: JoinKind,
) -> Result<DataTable, SchemaError> {
    if on.is_empty() {
        return Err(SchemaError::EmptyJoinKeys);
    }
    let left_keys = on
        .iter()
        .map(|name| left.column(name))
        .collect::<Result<Vec<_>, _>>()?;
    let right_keys = on
        .iter()
        .map(|name| right.column(name))
        .collect::<Result<Vec<_>, _>>()?;
    for (l, r) in left_keys.iter().zip(&right_keys) {
        let compatible = l.data_type() == r.data_type()
            || l.data().is_all_null()
            || r.data().is_all_null();
        if !compatible {
            return Err(SchemaError::IncompatibleJoinKeys {
                column: l.name().to_string(),
                left: l.data_type(),
                right: r.data_type(),
            });
        }
    }

    let mut pairs = match_pairs(&left_keys, left.num_rows(), &right_keys, right.num_rows());
    let rows = match how {
        JoinKind::Inner => pairs.iter().map(|&(l, r)| (Some(l), Some(r))).collect(),
        JoinKind::Left => left_rows(&pairs, left.num_rows()),
        JoinKind::Right => {
            pairs.sort_unstable_by_key(|&(l, r)| (r, l));
            let mirrored: Vec<_> = pairs.iter().map(|&(l, r)| (r, l)).collect();
            left_rows(&mirrored, right.num_rows())
                .into_iter()
                .map(|(r, l)| (l, r))
                .collect()
        }
        JoinKind::Outer => {
            let mut matched = vec![false; right.num_rows()];
            for &(_, r) in &pairs {
                matched[r] = true;
            }
            let unmatched: Vec<_> = matched
                .iter()
                .enumerate()
                .filter(|(_, matched)| !**matched)
                .map(|(r, _)| (None, Some(r)))
                .collect();
            let left_join = assemble(left, right, on, &left_rows(&pairs, left.num_rows()))?;
            let right_only = assemble(left, right, on, &unmatched)?;
            return left_join.concat(&right_only);
        }
    };

    assemble(left, right, on, &rows)
}

/// All `(left, right)` row pairs with equal, non-null keys, sorted by left
/// row then right row.  The hash table is built on the smaller side.
fn match_pairs(
    left_keys: &[&Column],
    left_rows: usize,
    right_keys: &[&Column],
    right_rows: usize,
) -> Vec<(usize, usize)> {
    let build_left = left_rows <= right_rows;
    let (build, build_rows, probe, probe_rows) = if build_left {
        (left_keys, left_rows, right_keys, right_rows)
    } else {
        (right_keys, right_rows, left_keys, left_rows)
    };

    let non_null = |key: &RowKey<'_>| !key.iter().any(KeyValue::is_null);
    let mut table: HashMap<RowKey<'_>, SmallVec<[usize; 1]>> = HashMap::with_capacity(build_rows);
    for row in 0..build_rows {
        let key = row_key(build, row);
        if non_null(&key) {
            table.entry(key).or_default().push(row);
        }
    }

    let mut pairs = Vec::new();
    for row in 0..probe_rows {
        let key = row_key(probe, row);
        if !non_null(&key) {
            continue;
        }
        if let Some(matches) = table.get(&key) {
            pairs.extend(matches.iter().map(|&m| if build_left { (m, row) } else { (row, m) }));
        }
    }
    pairs.sort_unstable();
    pairs
}

/// Rows of a left join: every left row in order, fanned out over its
/// matches, or paired with nothing.  `pairs` must be sorted by left row.
fn left_rows(pairs: &[(usize, usize)], num_left: usize) -> Vec<(Option<usize>, Option<usize>)> {
    let mut rows = Vec::with_capacity(pairs.len().max(num_left));
    let mut pairs = pairs.iter().peekable();
    for l in 0..num_left {
        let mut matched = false;
        while let Some(&(_, r)) = pairs.next_if(|(pl, _)| *pl == l) {
            rows.push((Some(l), Some(r)));
            matched = true;
        }
        if !matched {
            rows.push((Some(l), None));
        }
    }
    rows
}

fn assemble(
    left: &DataTable,
    right: &DataTable,
    on: &[String],
    rows: &[(Option<usize>, Option<usize>)],
) -> Result<DataTable, SchemaError> {
    let left_index: Vec<_> = rows.iter().map(|(l, _)| *l).collect();
    let right_index: Vec<_> = rows.iter().map(|(_, r)| *r).collect();
    let is_key = |name: &str| on.iter().any(|key| key == name);

    let mut columns = Vec::with_capacity(left.num_columns() + right.num_columns());
    for column in left.columns() {
        let values = column.data().take_opt(&left_index);
        if !is_key(column.name()) {
            columns.push(Column::new(column.name(), values));
            continue;
        }
        let other = right.column(column.name())?.data();
        let mismatch = || SchemaError::IncompatibleJoinKeys {
            column: column.name().to_string(),
            left: column.data_type(),
            right: other.data_type(),
        };
        let data_type = unify_columns(column.data(), other).ok_or_else(mismatch)?;
        let values = values.retype(data_type).ok_or_else(mismatch)?;
        let fallback = other
            .take_opt(&right_index)
            .retype(data_type)
            .ok_or_else(mismatch)?;
        let merged = values.coalesce(&fallback).ok_or_else(mismatch)?;
        columns.push(Column::new(column.name(), merged));
    }

    for column in right.columns().filter(|c| !is_key(c.name())) {
        let name = if left.contains(column.name()) {
            let suffixed = format!("{}{RIGHT_SUFFIX}", column.name());
            warn!(
                "join: right column '{}' collides with a left column, renamed to '{suffixed}'",
                column.name()
            );
            suffixed
        } else {
            column.name().to_string()
        };
        columns.push(Column::new(name, column.data().take_opt(&right_index)));
    }

    DataTable::new(columns)
}
