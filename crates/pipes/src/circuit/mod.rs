//! Graph resolution and orchestration of a pipeline run.
//!
//! A run takes the ids of the requested output pipes, the caller's input
//! tables and the pipe configurations.  It resolves the pipes the outputs
//! depend on, validates their configuration, evaluates each of them exactly
//! once in dependency order and returns the requested tables.  Nothing is
//! kept between runs.

mod resolve;
mod schedule;

use crate::error::{ConfigError, Error};
use crate::operator::InputTables;
use crate::table::DataTable;
use indexmap::IndexMap;
use pipes_types::{EngineConfig, PipeConfig, PipeConfigs, PipeId, SourceId};
use resolve::Plan;
use schedule::{Scheduler, SequentialScheduler, WaveScheduler};
use std::sync::Arc;
use tracing::info;

/// Runs pipelines with a fixed [`EngineConfig`].
#[derive(Clone, Debug, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Computes the tables of the `outputs` pipes.
    ///
    /// Only pipes that some output depends on are evaluated, each of them
    /// once.  The result maps every requested id to its table, in request
    /// order.  Any failure aborts the whole run.
    pub fn run<S: AsRef<str>>(
        &self,
        outputs: &[S],
        inputs: &InputTables,
        configs: &PipeConfigs,
    ) -> Result<IndexMap<PipeId, Arc<DataTable>>, Error> {
        let plan = Plan::resolve(outputs, configs)?;
        plan.validate(configs, inputs, self.config.validate_expressions)?;

        let workers = self.config.effective_workers();
        info!(
            "running pipeline: {} output(s), {} pipe(s) to evaluate in {} wave(s), {workers} worker(s)",
            outputs.len(),
            plan.order().len(),
            plan.waves().len()
        );

        let memo = if workers == 1 {
            SequentialScheduler.execute(&plan, configs, inputs)?
        } else {
            WaveScheduler::new(workers).execute(&plan, configs, inputs)?
        };

        outputs
            .iter()
            .map(|output| {
                let output = output.as_ref();
                memo.get(output)
                    .map(|table| (output.to_string(), table.clone()))
                    .ok_or_else(|| {
                        Error::new(
                            None,
                            ConfigError::UnknownPipeReference {
                                pipe_id: output.to_string(),
                            },
                        )
                    })
            })
            .collect()
    }

    /// Computes the table of a single pipe.
    pub fn run_one(
        &self,
        output: &str,
        inputs: &InputTables,
        configs: &PipeConfigs,
    ) -> Result<Arc<DataTable>, Error> {
        let mut tables = self.run(&[output], inputs, configs)?;
        tables.swap_remove(output).ok_or_else(|| {
            Error::new(
                None,
                ConfigError::UnknownPipeReference {
                    pipe_id: output.to_string(),
                },
            )
        })
    }
}

/// Runs a pipeline with the default [`EngineConfig`].
pub fn run_pipeline<S: AsRef<str>>(
    outputs: &[S],
    inputs: &InputTables,
    configs: &PipeConfigs,
) -> Result<IndexMap<PipeId, Arc<DataTable>>, Error> {
    Engine::default().run(outputs, inputs, configs)
}

/// `(pipe id, source id)` of every `Source` pipe, in configuration order.
/// Nothing is evaluated or validated.
pub fn list_source_references(configs: &PipeConfigs) -> Vec<(PipeId, SourceId)> {
    configs
        .iter()
        .filter_map(|(pipe_id, config)| match config {
            PipeConfig::Source(source) => Some((pipe_id.clone(), source.source_id.clone())),
            _ => None,
        })
        .collect()
}
