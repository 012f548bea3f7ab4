//! An in-memory, DAG-structured columnar data transformation engine.
//!
//! A pipeline is a set of named *pipes*, declared with
//! [`PipeConfig`](pipes_types::PipeConfig)s, that read caller-supplied
//! tables ([`Source`](pipes_types::SourcePipeConfig)) or transform the
//! output of other pipes: joins, computed columns, grouped aggregation,
//! filtering, renaming and date-time parsing.  A run evaluates exactly the
//! pipes the requested outputs depend on, each once, and returns the
//! requested tables.
//!
//! ```
//! use pipes::{run_pipeline, Column, DataTable, InputTables};
//! use pipes_types::PipeConfigs;
//!
//! let configs: PipeConfigs = serde_json::from_str(r#"{
//!     "sales": {"type": "Source", "sourceId": "sales"},
//!     "big": {"type": "Filter", "pipeId": "sales", "filters": [
//!         {"operation": "GreaterThan", "operands": [{"property": "amount"}, 10]}
//!     ]}
//! }"#).unwrap();
//!
//! let mut inputs = InputTables::new();
//! inputs.insert(
//!     "sales".to_string(),
//!     DataTable::new([Column::new("amount", vec![Some(5i64), Some(50), None])]).unwrap(),
//! );
//!
//! let outputs = run_pipeline(&["big"], &inputs, &configs).unwrap();
//! assert_eq!(outputs["big"].num_rows(), 1);
//! ```

pub mod circuit;
pub mod error;
pub mod expr;
pub mod operator;
pub mod table;

pub use circuit::{list_source_references, run_pipeline, Engine};
pub use error::{ConfigError, Error, ErrorKind, EvaluationError, SchemaError};
pub use operator::InputTables;
pub use table::{Column, ColumnData, DataTable, DataType, ScalarValue};
