//! Vectorized expression evaluation.
//!
//! An [`Expression`] is evaluated against a whole [`DataTable`] at once and
//! yields one value per row.  Operands are evaluated into columns first,
//! then combined by a kernel for the operator.  Nulls propagate through
//! arithmetic and comparisons, follow three-valued logic in `And`/`Or`/`Not`
//! and are ignored by reductions.

mod aggregate;
mod arithmetic;
mod compare;
mod logic;

pub use aggregate::reduce;

use crate::error::{ErrorKind, EvaluationError};
use crate::table::{ArrayRef, ColumnData, DataTable, DataType, Partitioning, ScalarValue};
use pipes_types::{Expression, Operator};
use std::borrow::Cow;
use std::sync::Arc;

/// Evaluates `expr` against `table`, yielding a column of
/// `table.num_rows()` values.
pub fn evaluate(expr: &Expression, table: &DataTable) -> Result<ArrayRef, ErrorKind> {
    match expr {
        Expression::Literal(literal) => Ok(Arc::new(ColumnData::broadcast(
            &ScalarValue::from(literal),
            table.num_rows(),
        ))),
        Expression::Property(name) => Ok(table.column(name)?.array().clone()),
        Expression::Operation { operator, operands } => {
            check_arity(*operator, operands.len())?;
            let operands = operands
                .iter()
                .map(|operand| evaluate(operand, table))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Arc::new(apply(*operator, &operands)?))
        }
        Expression::WindowAggregation {
            operator,
            operand,
            over,
        } => {
            let operand = evaluate(operand, table)?;
            let columns = over
                .iter()
                .map(|name| table.column(name))
                .collect::<Result<Vec<_>, _>>()?;
            let partitioning = Partitioning::new(&columns, table.num_rows());
            let reduced = reduce(*operator, &operand, &partitioning)?;
            Ok(Arc::new(reduced.take(partitioning.group_ids())))
        }
    }
}

fn apply(operator: Operator, operands: &[ArrayRef]) -> Result<ColumnData, EvaluationError> {
    match operator {
        Operator::Sum | Operator::Subtract | Operator::Multiply | Operator::Divide => {
            arithmetic::fold(operator, operands)
        }
        Operator::Min | Operator::Max => arithmetic::extremum(operator, operands),
        Operator::LessThan
        | Operator::LessThanEq
        | Operator::GreaterThan
        | Operator::GreaterThanEq => compare::compare(operator, &operands[0], &operands[1]),
        Operator::And | Operator::Or => logic::connective(operator, operands),
        Operator::Not => logic::not(&operands[0]),
        Operator::IfThenElse => logic::if_then_else(operands),
    }
}

/// Checks operator arity in every node of `expr`.
pub fn validate(expr: &Expression) -> Result<(), EvaluationError> {
    let mut result = Ok(());
    expr.walk(&mut |node| {
        if let (Ok(()), Expression::Operation { operator, operands }) = (&result, node) {
            result = check_arity(*operator, operands.len());
        }
    });
    result
}

fn check_arity(operator: Operator, actual: usize) -> Result<(), EvaluationError> {
    let (valid, expected) = match operator {
        Operator::Sum
        | Operator::Subtract
        | Operator::Multiply
        | Operator::Divide
        | Operator::Min
        | Operator::Max
        | Operator::And
        | Operator::Or => (actual >= 2, "at least 2"),
        Operator::LessThan
        | Operator::LessThanEq
        | Operator::GreaterThan
        | Operator::GreaterThanEq => (actual == 2, "exactly 2"),
        Operator::Not => (actual == 1, "exactly 1"),
        Operator::IfThenElse => (actual >= 3 && actual % 2 == 1, "an odd number of at least 3"),
    };
    if valid {
        Ok(())
    } else {
        Err(EvaluationError::Arity {
            operator: operator.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Common type of `columns`, ignoring all-null columns.  `None` when the
/// types do not unify; all-null inputs yield the type of the first column.
fn common_type<'a>(columns: impl IntoIterator<Item = &'a ColumnData>) -> Option<DataType> {
    let mut first = None;
    let mut unified: Option<DataType> = None;
    for column in columns {
        first.get_or_insert(column.data_type());
        if column.is_all_null() {
            continue;
        }
        unified = match unified {
            None => Some(column.data_type()),
            Some(data_type) => Some(data_type.unify(column.data_type())?),
        };
    }
    unified.or(first)
}

/// Numeric view of a column as floats.  Non-numeric columns must be all
/// null.
fn float_values(data: &ColumnData) -> Cow<'_, [Option<f64>]> {
    match data {
        ColumnData::Float64(values) => Cow::Borrowed(values),
        ColumnData::Int64(values) => Cow::Owned(values.iter().map(|v| v.map(|v| v as f64)).collect()),
        other => Cow::Owned(vec![None; other.len()]),
    }
}

/// Integer view of a column.  Non-integer columns must be all null.
fn int_values(data: &ColumnData) -> Cow<'_, [Option<i64>]> {
    match data {
        ColumnData::Int64(values) => Cow::Borrowed(values),
        other => Cow::Owned(vec![None; other.len()]),
    }
}

/// Boolean view of an operand.
fn bool_values(operator: Operator, data: &ColumnData) -> Result<Cow<'_, [Option<bool>]>, EvaluationError> {
    match data {
        ColumnData::Bool(values) => Ok(Cow::Borrowed(values)),
        other if other.is_all_null() => Ok(Cow::Owned(vec![None; other.len()])),
        other => Err(EvaluationError::type_mismatch(operator, "bool operands", other.data_type())),
    }
}

/// Borrows the payloads of `columns` as slices of one variant, failing on
/// the first column of another type.
macro_rules! typed_slices {
    ($columns:expr, $variant:ident, $err:expr) => {
        $columns
            .iter()
            .map(|column| match column {
                $crate::table::ColumnData::$variant(values) => Ok(values.as_slice()),
                other => Err($err(other.data_type())),
            })
            .collect::<Result<Vec<_>, $crate::error::EvaluationError>>()
    };
}

/// Dispatches on `$data_type`, binding `$slices` to the payloads of
/// `$columns` as slices of that type and wrapping the vector produced by
/// `$body` into the matching variant.
macro_rules! map_typed {
    ($data_type:expr, $columns:expr, $err:expr, $slices:ident => $body:expr) => {{
        use $crate::table::{ColumnData, DataType};
        match $data_type {
            DataType::Float64 => ColumnData::Float64({
                let $slices = $crate::expr::typed_slices!($columns, Float64, $err)?;
                $body
            }),
            DataType::Int64 => ColumnData::Int64({
                let $slices = $crate::expr::typed_slices!($columns, Int64, $err)?;
                $body
            }),
            DataType::String => ColumnData::String({
                let $slices = $crate::expr::typed_slices!($columns, String, $err)?;
                $body
            }),
            DataType::DateTime => ColumnData::DateTime({
                let $slices = $crate::expr::typed_slices!($columns, DateTime, $err)?;
                $body
            }),
            DataType::Bool => ColumnData::Bool({
                let $slices = $crate::expr::typed_slices!($columns, Bool, $err)?;
                $body
            }),
        }
    }};
}

pub(crate) use {map_typed, typed_slices};
