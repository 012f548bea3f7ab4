//! Per-partition reductions shared by window aggregation and
//! `GroupAndReduce`.

use crate::error::EvaluationError;
use crate::table::{ColumnData, DataType, Partitioning};
use pipes_types::AggregateOp;

/// Keeps the smaller (`Min`) or larger (`Max`) of two values; `a` on ties
/// and for incomparable values.
pub(super) fn pick<T: PartialOrd>(op: AggregateOp, a: T, b: T) -> T {
    let replace = match op {
        AggregateOp::Max => b > a,
        AggregateOp::Min | AggregateOp::Sum => b < a,
    };
    if replace {
        b
    } else {
        a
    }
}

/// Reduces `data` within every group of `partitioning`, returning one value
/// per group in group order.
///
/// Nulls are skipped and a group without values reduces to null.  `Sum`
/// accepts numeric columns only and keeps their type, failing on `Int64`
/// overflow; `Min` and `Max` accept any type.
pub fn reduce(
    op: AggregateOp,
    data: &ColumnData,
    partitioning: &Partitioning,
) -> Result<ColumnData, EvaluationError> {
    let groups = partitioning.group_ids();
    let num_groups = partitioning.num_groups();

    match (op, data) {
        (AggregateOp::Sum, ColumnData::Int64(values)) => {
            let mut sums: Vec<Option<i64>> = vec![None; num_groups];
            for (value, &group) in values.iter().zip(groups) {
                if let Some(value) = value {
                    let sum = sums[group].unwrap_or(0).checked_add(*value).ok_or_else(|| {
                        EvaluationError::ArithmeticOverflow {
                            operator: op.to_string(),
                        }
                    })?;
                    sums[group] = Some(sum);
                }
            }
            Ok(ColumnData::Int64(sums))
        }
        (AggregateOp::Sum, ColumnData::Float64(values)) => {
            let mut sums: Vec<Option<f64>> = vec![None; num_groups];
            for (value, &group) in values.iter().zip(groups) {
                if let Some(value) = value {
                    sums[group] = Some(sums[group].unwrap_or(0.0) + value);
                }
            }
            Ok(ColumnData::Float64(sums))
        }
        (AggregateOp::Sum, other) if other.is_all_null() => {
            Ok(ColumnData::nulls(DataType::Float64, num_groups))
        }
        (AggregateOp::Sum, other) => Err(EvaluationError::type_mismatch(
            op,
            "a numeric column",
            other.data_type(),
        )),
        (AggregateOp::Min | AggregateOp::Max, data) => {
            macro_rules! extremes {
                ($variant:ident, $values:expr) => {{
                    let mut acc = vec![None; num_groups];
                    for (value, &group) in $values.iter().zip(groups) {
                        if let Some(value) = value {
                            let current: &mut Option<_> = &mut acc[group];
                            *current = Some(match current.take() {
                                Some(best) => pick(op, best, value.clone()),
                                None => value.clone(),
                            });
                        }
                    }
                    ColumnData::$variant(acc)
                }};
            }
            Ok(match data {
                ColumnData::Float64(values) => extremes!(Float64, values),
                ColumnData::Int64(values) => extremes!(Int64, values),
                ColumnData::String(values) => extremes!(String, values),
                ColumnData::DateTime(values) => extremes!(DateTime, values),
                ColumnData::Bool(values) => extremes!(Bool, values),
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::reduce;
    use crate::error::EvaluationError;
    use crate::table::{Column, ColumnData, DataType, Partitioning};
    use pipes_types::AggregateOp;
    use pretty_assertions::assert_eq;

    fn by_year() -> Partitioning {
        let year = Column::new("year", vec![Some(2021i64), Some(2022), Some(2021), Some(2023)]);
        Partitioning::new(&[&year], 4)
    }

    #[test]
    fn sums() {
        let partitioning = by_year();
        assert_eq!(
            reduce(
                AggregateOp::Sum,
                &ColumnData::from(vec![Some(1i64), Some(2), Some(3), None]),
                &partitioning
            )
            .unwrap(),
            ColumnData::from(vec![Some(4i64), Some(2), None])
        );
        assert_eq!(
            reduce(
                AggregateOp::Sum,
                &ColumnData::from(vec![Some(0.5), None, Some(0.25), None]),
                &partitioning
            )
            .unwrap(),
            ColumnData::from(vec![Some(0.75), None, None])
        );
        assert!(matches!(
            reduce(
                AggregateOp::Sum,
                &ColumnData::from(vec![Some("a"), None, None, None]),
                &partitioning
            ),
            Err(EvaluationError::TypeMismatch { actual: DataType::String, .. })
        ));
        assert!(matches!(
            reduce(
                AggregateOp::Sum,
                &ColumnData::from(vec![Some(i64::MAX), None, Some(1), None]),
                &partitioning
            ),
            Err(EvaluationError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn extremes() {
        let partitioning = by_year();
        let names = ColumnData::from(vec![Some("b"), Some("x"), Some("a"), None]);
        assert_eq!(
            reduce(AggregateOp::Min, &names, &partitioning).unwrap(),
            ColumnData::from(vec![Some("a"), Some("x"), None])
        );
        assert_eq!(
            reduce(AggregateOp::Max, &names, &partitioning).unwrap(),
            ColumnData::from(vec![Some("b"), Some("x"), None])
        );
        let flags = ColumnData::from(vec![Some(false), None, Some(true), None]);
        assert_eq!(
            reduce(AggregateOp::Max, &flags, &partitioning).unwrap(),
            ColumnData::from(vec![Some(true), None, None])
        );
    }
}
