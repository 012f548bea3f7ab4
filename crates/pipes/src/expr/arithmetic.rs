//! `Sum`, `Subtract`, `Multiply`, `Divide`, and element-wise `Min`/`Max`.

use super::{common_type, float_values, int_values, map_typed};
use crate::error::EvaluationError;
use crate::table::{ArrayRef, ColumnData, DataType};
use pipes_types::{AggregateOp, Operator};

/// Left-associative fold of `operands` with an arithmetic operator.
pub(super) fn fold(operator: Operator, operands: &[ArrayRef]) -> Result<ColumnData, EvaluationError> {
    let (first, rest) = match operands {
        [first, second, rest @ ..] => (binary(operator, first, second)?, rest),
        _ => {
            return Err(EvaluationError::Arity {
                operator: operator.to_string(),
                expected: "at least 2".to_string(),
                actual: operands.len(),
            })
        }
    };
    rest.iter()
        .try_fold(first, |acc, operand| binary(operator, &acc, operand))
}

/// Type of an arithmetic operand; `None` for an all-null operand, which
/// adapts to the other side.
fn operand_type(operator: Operator, data: &ColumnData) -> Result<Option<DataType>, EvaluationError> {
    if data.is_all_null() {
        Ok(None)
    } else if data.data_type().is_numeric() {
        Ok(Some(data.data_type()))
    } else {
        Err(EvaluationError::type_mismatch(
            operator,
            "numeric operands",
            data.data_type(),
        ))
    }
}

fn binary(operator: Operator, lhs: &ColumnData, rhs: &ColumnData) -> Result<ColumnData, EvaluationError> {
    let integral = match (operand_type(operator, lhs)?, operand_type(operator, rhs)?) {
        _ if operator == Operator::Divide => false,
        (Some(DataType::Int64), Some(DataType::Int64))
        | (Some(DataType::Int64), None)
        | (None, Some(DataType::Int64)) => true,
        (None, None) => lhs.data_type() == DataType::Int64 && rhs.data_type() == DataType::Int64,
        _ => false,
    };

    if integral {
        let overflow = || EvaluationError::ArithmeticOverflow {
            operator: operator.to_string(),
        };
        let checked = match operator {
            Operator::Sum => i64::checked_add,
            Operator::Subtract => i64::checked_sub,
            _ => i64::checked_mul,
        };
        let values = int_values(lhs)
            .iter()
            .zip(int_values(rhs).iter())
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => checked(*a, *b).map(Some).ok_or_else(overflow),
                _ => Ok(None),
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ColumnData::Int64(values));
    }

    let values = float_values(lhs)
        .iter()
        .zip(float_values(rhs).iter())
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => match operator {
                Operator::Sum => Some(a + b),
                Operator::Subtract => Some(a - b),
                Operator::Multiply => Some(a * b),
                _ if *b == 0.0 => None,
                _ => Some(a / b),
            },
            _ => None,
        })
        .collect();
    Ok(ColumnData::Float64(values))
}

/// Row-wise `Min` or `Max` across operands, ignoring nulls.
pub(super) fn extremum(operator: Operator, operands: &[ArrayRef]) -> Result<ColumnData, EvaluationError> {
    let op = if operator == Operator::Min {
        AggregateOp::Min
    } else {
        AggregateOp::Max
    };
    let mismatch = |actual| EvaluationError::type_mismatch(operator, "operands of one type", actual);

    let data_type = match common_type(operands.iter().map(|o| o.as_ref())) {
        Some(data_type) => data_type,
        None => {
            let actual = operands
                .iter()
                .map(|o| o.data_type())
                .find(|t| Some(*t) != operands.first().map(|o| o.data_type()))
                .unwrap_or(DataType::Float64);
            return Err(mismatch(actual));
        }
    };
    let columns = operands
        .iter()
        .map(|operand| operand.retype(data_type).ok_or_else(|| mismatch(operand.data_type())))
        .collect::<Result<Vec<_>, _>>()?;
    let len = columns.first().map_or(0, ColumnData::len);

    Ok(map_typed!(data_type, columns, mismatch, slices => (0..len)
        .map(|row| {
            slices
                .iter()
                .filter_map(|values| values[row].clone())
                .reduce(|a, b| super::aggregate::pick(op, a, b))
        })
        .collect()))
}
