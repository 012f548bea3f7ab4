use crate::error::{ErrorKind, EvaluationError};
use crate::expr::evaluate;
use crate::table::{ColumnData, DataTable};
use pipes_types::Expression;

/// Keeps the rows for which every predicate is true.  Rows where a
/// predicate is false or null are dropped.
pub fn filter(table: &DataTable, filters: &[Expression]) -> Result<DataTable, ErrorKind> {
    let mut mask = vec![true; table.num_rows()];
    for predicate in filters {
        let values = evaluate(predicate, table)?;
        match values.as_ref() {
            ColumnData::Bool(values) => {
                for (keep, value) in mask.iter_mut().zip(values) {
                    *keep &= *value == Some(true);
                }
            }
            other if other.is_all_null() => mask.fill(false),
            other => {
                return Err(EvaluationError::type_mismatch(
                    "Filter",
                    "a bool predicate",
                    other.data_type(),
                )
                .into())
            }
        }
    }
    Ok(table.filter(&mask))
}

#[cfg(test)]
mod test {
    use super::filter;
    use crate::error::{ErrorKind, EvaluationError};
    use crate::table::{Column, ColumnData, DataTable, DataType};
    use pipes_types::{Expression, Operator};
    use pretty_assertions::assert_eq;

    fn semesters() -> DataTable {
        DataTable::new([Column::new(
            "semester",
            (895..915).map(Some).chain([None]).collect::<Vec<Option<i64>>>(),
        )])
        .unwrap()
    }

    fn compare(operator: Operator, bound: i64) -> Expression {
        Expression::operation(
            operator,
            vec![Expression::property("semester"), Expression::literal(bound)],
        )
    }

    #[test]
    fn conjunction() {
        let result = filter(
            &semesters(),
            &[
                compare(Operator::GreaterThan, 900),
                compare(Operator::LessThan, 910),
            ],
        )
        .unwrap();
        assert_eq!(
            *result.column("semester").unwrap().data(),
            ColumnData::from((901..910).map(Some).collect::<Vec<Option<i64>>>())
        );
        assert_eq!(filter(&semesters(), &[]).unwrap(), semesters());
    }

    #[test]
    fn predicate_must_be_bool() {
        let err = filter(&semesters(), &[Expression::property("semester")]).unwrap_err();
        assert!(matches!(
            err,
            ErrorKind::Evaluation(EvaluationError::TypeMismatch {
                actual: DataType::Int64,
                ..
            })
        ));
    }
}
