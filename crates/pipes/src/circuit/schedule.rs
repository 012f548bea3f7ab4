//! Schedulers decide in which order, and on which threads, the pipes of a
//! [`Plan`] are evaluated.
//!
//! A valid schedule evaluates each pipe exactly once, after all of its
//! upstream pipes have been evaluated.  Schedulers do not affect results:
//! every scheduler produces the same tables and, on failure, the same
//! error for a given run.

use super::resolve::Plan;
use crate::error::{ConfigError, Error, ErrorKind};
use crate::operator::{evaluate_pipe, InputTables, Memo};
use crate::table::DataTable;
use pipes_types::PipeConfigs;
use std::panic::resume_unwind;
use std::sync::Arc;
use tracing::{debug, trace};

pub(crate) trait Scheduler {
    /// Evaluates every pipe of `plan`, returning all computed tables.
    fn execute(&self, plan: &Plan<'_>, configs: &PipeConfigs, inputs: &InputTables) -> Result<Memo, Error>;
}

/// Evaluates one pipe against the tables computed so far.
fn evaluate(
    pipe_id: &str,
    configs: &PipeConfigs,
    memo: &Memo,
    inputs: &InputTables,
) -> Result<Arc<DataTable>, ErrorKind> {
    let config = configs.get(pipe_id).ok_or_else(|| {
        ErrorKind::from(ConfigError::UnknownPipeReference {
            pipe_id: pipe_id.to_string(),
        })
    })?;
    let table = evaluate_pipe(config, memo, inputs)?;
    debug!(
        "pipe '{pipe_id}' ({}): {} rows, {} columns",
        config.kind(),
        table.num_rows(),
        table.num_columns()
    );
    Ok(table)
}

/// Evaluates pipes one by one on the calling thread, in topological order.
pub(crate) struct SequentialScheduler;

impl Scheduler for SequentialScheduler {
    fn execute(&self, plan: &Plan<'_>, configs: &PipeConfigs, inputs: &InputTables) -> Result<Memo, Error> {
        let mut memo = Memo::with_capacity(plan.order().len());
        for &pipe_id in plan.order() {
            let table =
                evaluate(pipe_id, configs, &memo, inputs).map_err(|kind| Error::in_pipe(pipe_id, kind))?;
            memo.insert(pipe_id.to_string(), table);
        }
        Ok(memo)
    }
}

/// Evaluates the plan wave by wave, spreading the pipes of a wave over
/// scoped worker threads.
///
/// A wave starts once the previous wave has completed.  On failure the
/// reported error is the one of the first failing pipe in topological order,
/// as with [`SequentialScheduler`].
pub(crate) struct WaveScheduler {
    workers: usize,
}

impl WaveScheduler {
    pub(crate) fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }
}

impl Scheduler for WaveScheduler {
    fn execute(&self, plan: &Plan<'_>, configs: &PipeConfigs, inputs: &InputTables) -> Result<Memo, Error> {
        let mut memo = Memo::with_capacity(plan.order().len());
        for (n, wave) in plan.waves().iter().enumerate() {
            trace!("wave {n}: {} pipe(s) {wave:?}", wave.len());

            let results: Vec<(&str, Result<Arc<DataTable>, ErrorKind>)> = if wave.len() == 1 {
                wave.iter()
                    .map(|&pipe_id| (pipe_id, evaluate(pipe_id, configs, &memo, inputs)))
                    .collect()
            } else {
                let chunk_size = wave.len().div_ceil(self.workers);
                let memo = &memo;
                crossbeam::thread::scope(|scope| {
                    let handles: Vec<_> = wave
                        .chunks(chunk_size)
                        .map(|chunk| {
                            scope.spawn(move |_| {
                                chunk
                                    .iter()
                                    .map(|&pipe_id| (pipe_id, evaluate(pipe_id, configs, memo, inputs)))
                                    .collect::<Vec<_>>()
                            })
                        })
                        .collect();
                    handles
                        .into_iter()
                        .flat_map(|handle| handle.join().unwrap_or_else(|panic| resume_unwind(panic)))
                        .collect()
                })
                .unwrap_or_else(|panic| resume_unwind(panic))
            };

            let mut failed = None;
            for (pipe_id, result) in results {
                match result {
                    Ok(table) => {
                        memo.insert(pipe_id.to_string(), table);
                    }
                    Err(kind) if failed.is_none() => failed = Some((pipe_id, kind)),
                    Err(_) => {}
                }
            }
            if let Some((pipe_id, kind)) = failed {
                return Err(earliest_error(plan, configs, &mut memo, inputs, pipe_id, kind));
            }
        }
        Ok(memo)
    }
}

/// Picks the error a sequential run would report once `failed` failed.
///
/// Pipes of later waves may precede `failed` in topological order.  Those
/// are evaluated here, in order, and the first of them to fail wins.
fn earliest_error(
    plan: &Plan<'_>,
    configs: &PipeConfigs,
    memo: &mut Memo,
    inputs: &InputTables,
    failed: &str,
    kind: ErrorKind,
) -> Error {
    let position = plan
        .order()
        .iter()
        .position(|&pipe_id| pipe_id == failed)
        .unwrap_or(0);
    for &pipe_id in &plan.order()[..position] {
        if memo.contains_key(pipe_id) {
            continue;
        }
        match evaluate(pipe_id, configs, memo, inputs) {
            Ok(table) => {
                memo.insert(pipe_id.to_string(), table);
            }
            Err(kind) => return Error::in_pipe(pipe_id, kind),
        }
    }
    Error::in_pipe(failed, kind)
}
