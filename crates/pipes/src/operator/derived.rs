use crate::error::ErrorKind;
use crate::expr::evaluate;
use crate::table::{Column, DataTable};
use pipes_types::DerivedValueConfig;

/// Evaluates `calcs` in order, each against the table produced so far, and
/// appends the results.  A calc named like an existing column replaces it
/// in place.
pub fn derive_values(table: &DataTable, calcs: &[DerivedValueConfig]) -> Result<DataTable, ErrorKind> {
    calcs.iter().try_fold(table.clone(), |table, calc| {
        let values = evaluate(&calc.expression, &table)?;
        Ok(table.with_column(Column::from_array(calc.name.as_str(), values))?)
    })
}
