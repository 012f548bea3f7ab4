use crate::error::ErrorKind;
use crate::expr::reduce;
use crate::table::{Column, DataTable, Partitioning};
use pipes_types::AggConfig;

/// Collapses `table` to one row per distinct `group_by` tuple, in order of
/// first appearance, with one column per aggregate after the group-by
/// columns.
pub fn group_and_reduce(
    table: &DataTable,
    group_by: &[String],
    aggs: &[AggConfig],
) -> Result<DataTable, ErrorKind> {
    let keys = group_by
        .iter()
        .map(|name| table.column(name))
        .collect::<Result<Vec<_>, _>>()?;
    let partitioning = Partitioning::new(&keys, table.num_rows());

    let mut columns: Vec<Column> = keys
        .iter()
        .map(|key| Column::new(key.name(), key.data().take(partitioning.first_rows())))
        .collect();
    for agg in aggs {
        let source = table.column(&agg.agg_property)?;
        let reduced = reduce(agg.op, source.data(), &partitioning)?;
        columns.push(Column::new(agg.name.as_str(), reduced));
    }

    if columns.is_empty() {
        return Ok(DataTable::empty(partitioning.num_groups()));
    }
    Ok(DataTable::new(columns)?)
}

#[cfg(test)]
mod test {
    use super::group_and_reduce;
    use crate::error::{ErrorKind, SchemaError};
    use crate::table::{Column, ColumnData, DataTable};
    use pipes_types::{AggConfig, AggregateOp};
    use pretty_assertions::assert_eq;

    fn agg(name: &str, op: AggregateOp, property: &str) -> AggConfig {
        AggConfig {
            name: name.to_string(),
            op,
            agg_property: property.to_string(),
        }
    }

    fn sales() -> DataTable {
        DataTable::new([
            Column::new("year", vec![Some(2022i64), Some(2021), Some(2022), None, Some(2023)]),
            Column::new("revenue", vec![Some(10.0), Some(20.0), Some(5.0), Some(1.0), None]),
        ])
        .unwrap()
    }

    #[test]
    fn groups_in_first_seen_order() {
        let result = group_and_reduce(
            &sales(),
            &["year".to_string()],
            &[
                agg("total", AggregateOp::Sum, "revenue"),
                agg("best", AggregateOp::Max, "revenue"),
            ],
        )
        .unwrap();
        assert_eq!(
            result.column_names().collect::<Vec<_>>(),
            vec!["year", "total", "best"]
        );
        assert_eq!(
            *result.column("year").unwrap().data(),
            ColumnData::from(vec![Some(2022i64), Some(2021), None, Some(2023)])
        );
        assert_eq!(
            *result.column("total").unwrap().data(),
            ColumnData::from(vec![Some(15.0), Some(20.0), Some(1.0), None])
        );
        assert_eq!(
            *result.column("best").unwrap().data(),
            ColumnData::from(vec![Some(10.0), Some(20.0), Some(1.0), None])
        );
    }

    #[test]
    fn whole_table() {
        let result =
            group_and_reduce(&sales(), &[], &[agg("total", AggregateOp::Sum, "revenue")]).unwrap();
        assert_eq!(result.num_rows(), 1);
        assert_eq!(
            *result.column("total").unwrap().data(),
            ColumnData::from(vec![Some(36.0)])
        );

        let empty = sales().filter(&[false; 5]);
        let result =
            group_and_reduce(&empty, &[], &[agg("total", AggregateOp::Sum, "revenue")]).unwrap();
        assert_eq!(result.num_rows(), 0);
    }

    #[test]
    fn missing_column() {
        let err = group_and_reduce(&sales(), &["region".to_string()], &[]).unwrap_err();
        assert_eq!(
            err,
            ErrorKind::Schema(SchemaError::MissingColumn {
                column: "region".to_string()
            })
        );
    }
}
