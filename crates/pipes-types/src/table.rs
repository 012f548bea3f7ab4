//! Columnar wire format for tables.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A table as exchanged with the host application: columns grouped by
/// primitive type, each a list of nullable values.
///
/// Converting between this shape and row-oriented records is up to the
/// caller.  Groups that are absent on the wire are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireTable {
    #[serde(alias = "f64")]
    pub float64: IndexMap<String, Vec<Option<f64>>>,
    #[serde(alias = "i64")]
    pub int64: IndexMap<String, Vec<Option<i64>>>,
    #[serde(alias = "str")]
    pub string: IndexMap<String, Vec<Option<String>>>,
    /// Milliseconds since the Unix epoch.
    pub datetime: IndexMap<String, Vec<Option<i64>>>,
    pub bool: IndexMap<String, Vec<Option<bool>>>,
}

impl WireTable {
    /// Number of columns across all type groups.
    pub fn num_columns(&self) -> usize {
        self.float64.len()
            + self.int64.len()
            + self.string.len()
            + self.datetime.len()
            + self.bool.len()
    }
}
