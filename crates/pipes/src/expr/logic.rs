//! Three-valued logic and `IfThenElse`.

use super::{bool_values, common_type, map_typed};
use crate::error::EvaluationError;
use crate::table::{ArrayRef, ColumnData};
use pipes_types::Operator;

fn and(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

/// `And` or `Or` across all operands.  A determining operand (`false` for
/// `And`, `true` for `Or`) wins over null.
pub(super) fn connective(operator: Operator, operands: &[ArrayRef]) -> Result<ColumnData, EvaluationError> {
    let combine = if operator == Operator::And { and } else { or };
    let mut operands = operands.iter();
    let mut acc = match operands.next() {
        Some(first) => bool_values(operator, first)?.into_owned(),
        None => Vec::new(),
    };
    for operand in operands {
        let values = bool_values(operator, operand)?;
        for (acc, value) in acc.iter_mut().zip(values.iter()) {
            *acc = combine(*acc, *value);
        }
    }
    Ok(ColumnData::Bool(acc))
}

pub(super) fn not(operand: &ColumnData) -> Result<ColumnData, EvaluationError> {
    let values = bool_values(Operator::Not, operand)?;
    Ok(ColumnData::Bool(values.iter().map(|v| v.map(|v| !v)).collect()))
}

/// `(cond1, value1, ..., condN, valueN, default)`: per row, the value of
/// the first true condition, else the default.  Every branch is evaluated.
pub(super) fn if_then_else(operands: &[ArrayRef]) -> Result<ColumnData, EvaluationError> {
    let operator = Operator::IfThenElse;
    let Some((default, pairs)) = operands.split_last() else {
        return Err(EvaluationError::Arity {
            operator: operator.to_string(),
            expected: "an odd number of at least 3".to_string(),
            actual: 0,
        });
    };
    let conditions = pairs
        .iter()
        .step_by(2)
        .map(|condition| bool_values(operator, condition))
        .collect::<Result<Vec<_>, _>>()?;
    let branches: Vec<&ColumnData> = pairs
        .iter()
        .skip(1)
        .step_by(2)
        .chain([default])
        .map(|branch| branch.as_ref())
        .collect();

    let len = default.len();
    let choice: Vec<usize> = (0..len)
        .map(|row| {
            conditions
                .iter()
                .position(|condition| condition[row] == Some(true))
                .unwrap_or(conditions.len())
        })
        .collect();

    let mismatch = |actual| EvaluationError::type_mismatch(operator, "branches of one type", actual);
    let data_type = match common_type(branches.iter().copied()) {
        Some(data_type) => data_type,
        None => {
            let first = branches.iter().find(|b| !b.is_all_null()).map(|b| b.data_type());
            let actual = branches
                .iter()
                .filter(|b| !b.is_all_null())
                .map(|b| b.data_type())
                .find(|t| first.and_then(|f| f.unify(*t)).is_none())
                .unwrap_or(default.data_type());
            return Err(mismatch(actual));
        }
    };
    let branches = branches
        .iter()
        .map(|branch| branch.retype(data_type).ok_or_else(|| mismatch(branch.data_type())))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(map_typed!(data_type, branches, mismatch, slices => choice
        .iter()
        .enumerate()
        .map(|(row, &branch)| slices[branch][row].clone())
        .collect()))
}
