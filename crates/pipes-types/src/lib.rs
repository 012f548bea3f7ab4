//! Public API types for the pipes engine.
//!
//! Everything a host application sends to or receives from the engine lives
//! here: pipe configurations, expression trees, the columnar wire table and
//! the engine configuration.  All of it is (de)serializable with serde so
//! that a configuration tree can be read straight from JSON or YAML.

pub mod config;
pub mod error;
pub mod expression;
pub mod pipe;
pub mod table;

pub use config::EngineConfig;
pub use error::{DetailedError, ErrorResponse};
pub use expression::{AggregateOp, Expression, Literal, Operator};
pub use pipe::{
    AggConfig, DerivedValueConfig, DerivedValuesPipeConfig, FilterPipeConfig,
    GroupAndReducePipeConfig, JoinKind, JoinPipeConfig, ParseDateTimePipeConfig, PipeConfig,
    PipeConfigs, PipeId, RenamePipeConfig, RenameProperty, SourceId, SourcePipeConfig,
};
pub use table::WireTable;
