use crate::error::{ConfigError, ErrorKind};
use crate::table::DataTable;
use hashbrown::{HashMap, HashSet};
use pipes_types::RenameProperty;

/// Relabels columns in place.  All pairs apply at once, so columns may
/// swap names.
pub fn rename(table: &DataTable, properties: &[RenameProperty]) -> Result<DataTable, ErrorKind> {
    let mut renames: HashMap<&str, &str> = HashMap::with_capacity(properties.len());
    for property in properties {
        table.column(&property.from)?;
        if renames.insert(&property.from, &property.to).is_some() {
            return Err(ConfigError::AmbiguousColumnName {
                column: property.from.clone(),
            }
            .into());
        }
    }

    let mut names = HashSet::with_capacity(table.num_columns());
    let mut columns = Vec::with_capacity(table.num_columns());
    for column in table.columns() {
        let name = renames.get(column.name()).copied().unwrap_or(column.name());
        if !names.insert(name) {
            return Err(ConfigError::AmbiguousColumnName {
                column: name.to_string(),
            }
            .into());
        }
        columns.push(column.renamed(name));
    }

    if columns.is_empty() {
        return Ok(table.clone());
    }
    Ok(DataTable::new(columns)?)
}
