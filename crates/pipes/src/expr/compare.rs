use super::float_values;
use crate::error::EvaluationError;
use crate::table::ColumnData;
use pipes_types::Operator;
use std::cmp::Ordering;

fn holds(operator: Operator, ordering: Option<Ordering>) -> bool {
    match operator {
        Operator::LessThan => ordering == Some(Ordering::Less),
        Operator::LessThanEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        Operator::GreaterThan => ordering == Some(Ordering::Greater),
        _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
    }
}

fn zip_compare<T: PartialOrd>(operator: Operator, lhs: &[Option<T>], rhs: &[Option<T>]) -> Vec<Option<bool>> {
    lhs.iter()
        .zip(rhs)
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some(holds(operator, a.partial_cmp(b))),
            _ => None,
        })
        .collect()
}

/// Row-wise ordering comparison.  `Int64` and `Float64` compare
/// numerically; other types only compare with themselves.  A null on
/// either side yields null, and NaN compares false.
pub(super) fn compare(operator: Operator, lhs: &ColumnData, rhs: &ColumnData) -> Result<ColumnData, EvaluationError> {
    let values = match (lhs, rhs) {
        _ if lhs.is_all_null() || rhs.is_all_null() => vec![None; lhs.len()],
        (ColumnData::Int64(a), ColumnData::Int64(b)) => zip_compare(operator, a, b),
        (ColumnData::Float64(_) | ColumnData::Int64(_), ColumnData::Float64(_) | ColumnData::Int64(_)) => {
            zip_compare(operator, &float_values(lhs), &float_values(rhs))
        }
        (ColumnData::String(a), ColumnData::String(b)) => zip_compare(operator, a, b),
        (ColumnData::DateTime(a), ColumnData::DateTime(b)) => zip_compare(operator, a, b),
        (ColumnData::Bool(a), ColumnData::Bool(b)) => zip_compare(operator, a, b),
        (lhs, rhs) => {
            return Err(EvaluationError::type_mismatch(
                operator,
                format!("an operand comparable with {}", lhs.data_type()),
                rhs.data_type(),
            ))
        }
    };
    Ok(ColumnData::Bool(values))
}
