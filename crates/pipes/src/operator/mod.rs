//! Pipe evaluators, one per [`PipeConfig`] variant.
//!
//! Each evaluator is a pure function from its upstream tables to a new
//! table; the circuit decides when to call it and caches the result.

mod derived;
mod filter;
mod group;
mod join;
mod parse_datetime;
mod rename;

pub use derived::derive_values;
pub use filter::filter;
pub use group::group_and_reduce;
pub use join::{join, RIGHT_SUFFIX};
pub use parse_datetime::{parse_datetime, parse_timestamp};
pub use rename::rename;

use crate::error::{ConfigError, ErrorKind};
use crate::table::DataTable;
use hashbrown::HashMap;
use pipes_types::{PipeConfig, PipeId, SourceId};
use std::sync::Arc;

/// Caller-supplied tables, keyed by the ids that `Source` pipes refer to.
pub type InputTables = std::collections::HashMap<SourceId, DataTable>;

/// Tables computed so far in one run.
pub(crate) type Memo = HashMap<PipeId, Arc<DataTable>>;

fn upstream<'a>(memo: &'a Memo, pipe_id: &str) -> Result<&'a DataTable, ErrorKind> {
    memo.get(pipe_id)
        .map(Arc::as_ref)
        .ok_or_else(|| {
            ConfigError::UnknownPipeReference {
                pipe_id: pipe_id.to_string(),
            }
            .into()
        })
}

/// Computes the table of one pipe.  Upstream tables must already be in
/// `memo`.
pub(crate) fn evaluate_pipe(
    config: &PipeConfig,
    memo: &Memo,
    inputs: &InputTables,
) -> Result<Arc<DataTable>, ErrorKind> {
    let table = match config {
        PipeConfig::Source(source) => {
            return inputs
                .get(&source.source_id)
                .map(|table| Arc::new(table.clone()))
                .ok_or_else(|| {
                    ConfigError::UnknownSourceId {
                        source_id: source.source_id.clone(),
                    }
                    .into()
                })
        }
        PipeConfig::Join(config) => join(
            upstream(memo, &config.left_pipe_id)?,
            upstream(memo, &config.right_pipe_id)?,
            &config.on,
            config.how,
        )?,
        PipeConfig::DerivedValues(config) => {
            derive_values(upstream(memo, &config.pipe_id)?, &config.calcs)?
        }
        PipeConfig::GroupAndReduce(config) => group_and_reduce(
            upstream(memo, &config.pipe_id)?,
            &config.group_by,
            &config.aggs,
        )?,
        PipeConfig::Filter(config) => filter(upstream(memo, &config.pipe_id)?, &config.filters)?,
        PipeConfig::Rename(config) => rename(upstream(memo, &config.pipe_id)?, &config.properties)?,
        PipeConfig::ParseDateTime(config) => {
            parse_datetime(upstream(memo, &config.pipe_id)?, config)?
        }
    };
    Ok(Arc::new(table))
}
