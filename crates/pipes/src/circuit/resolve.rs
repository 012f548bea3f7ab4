//! Dependency resolution: which pipes a run needs and in what order.

use crate::error::{ConfigError, Error};
use crate::expr;
use crate::operator::InputTables;
use hashbrown::HashMap;
use pipes_types::{PipeConfig, PipeConfigs};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current DFS path.
    Visiting,
    Done,
}

/// The pipes reachable from the requested outputs, topologically sorted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Plan<'a> {
    order: Vec<&'a str>,
    waves: Vec<Vec<&'a str>>,
}

impl<'a> Plan<'a> {
    /// Collects the pipes `outputs` depend on by depth-first traversal of
    /// upstream references.
    ///
    /// Pipes that no requested output depends on are not part of the plan.
    /// Fails on an unknown pipe id and on a cycle, reporting the cycle as a
    /// path that starts and ends with the same pipe.
    pub(crate) fn resolve<S: AsRef<str>>(outputs: &[S], configs: &'a PipeConfigs) -> Result<Self, Error> {
        let mut marks: HashMap<&'a str, Mark> = HashMap::with_capacity(configs.len());
        let mut order = Vec::new();

        for output in outputs {
            let output = output.as_ref();
            let Some((output, config)) = configs.get_key_value(output) else {
                return Err(Error::new(
                    None,
                    ConfigError::UnknownPipeReference {
                        pipe_id: output.to_string(),
                    },
                ));
            };
            if marks.contains_key(output.as_str()) {
                continue;
            }

            // (pipe, its inputs, index of the next input to visit)
            let mut stack: Vec<(&'a str, Vec<&'a str>, usize)> = vec![(output.as_str(), config.inputs(), 0)];
            marks.insert(output.as_str(), Mark::Visiting);

            while let Some((pipe_id, inputs, next)) = stack.last_mut() {
                let pipe_id: &'a str = *pipe_id;
                let Some(&input) = inputs.get(*next) else {
                    marks.insert(pipe_id, Mark::Done);
                    order.push(pipe_id);
                    stack.pop();
                    continue;
                };
                *next += 1;

                match marks.get(input) {
                    Some(Mark::Done) => {}
                    Some(Mark::Visiting) => {
                        let start = stack.iter().position(|(id, ..)| *id == input).unwrap_or(0);
                        let path = stack[start..]
                            .iter()
                            .map(|(id, ..)| id.to_string())
                            .chain([input.to_string()])
                            .collect();
                        return Err(Error::in_pipe(pipe_id, ConfigError::CycleDetected { path }));
                    }
                    None => {
                        let Some((input, config)) = configs.get_key_value(input) else {
                            return Err(Error::in_pipe(
                                pipe_id,
                                ConfigError::UnknownPipeReference {
                                    pipe_id: input.to_string(),
                                },
                            ));
                        };
                        marks.insert(input.as_str(), Mark::Visiting);
                        stack.push((input.as_str(), config.inputs(), 0));
                    }
                }
            }
        }

        let waves = waves(&order, configs);
        Ok(Self { order, waves })
    }

    /// Pipe ids, every pipe after all of its upstreams.
    pub(crate) fn order(&self) -> &[&'a str] {
        &self.order
    }

    /// The topological order split into waves: every pipe of a wave only
    /// depends on pipes of earlier waves.  Within a wave pipes keep their
    /// topological order.
    pub(crate) fn waves(&self) -> &[Vec<&'a str>] {
        &self.waves
    }

    /// Checks the configuration of every planned pipe before anything is
    /// evaluated: source ids must name an input table and, if
    /// `check_expressions` is set, every expression must have valid arity.
    pub(crate) fn validate(
        &self,
        configs: &PipeConfigs,
        inputs: &InputTables,
        check_expressions: bool,
    ) -> Result<(), Error> {
        for &pipe_id in &self.order {
            let Some(config) = configs.get(pipe_id) else {
                continue;
            };
            if let PipeConfig::Source(source) = config {
                if !inputs.contains_key(&source.source_id) {
                    return Err(Error::in_pipe(
                        pipe_id,
                        ConfigError::UnknownSourceId {
                            source_id: source.source_id.clone(),
                        },
                    ));
                }
            }
            if check_expressions {
                for expression in config.expressions() {
                    expr::validate(expression).map_err(|e| Error::in_pipe(pipe_id, e))?;
                }
            }
        }
        Ok(())
    }
}

fn waves<'a>(order: &[&'a str], configs: &PipeConfigs) -> Vec<Vec<&'a str>> {
    let mut depth: HashMap<&str, usize> = HashMap::with_capacity(order.len());
    let mut waves: Vec<Vec<&'a str>> = Vec::new();
    for &pipe_id in order {
        let wave = configs
            .get(pipe_id)
            .map(|config| {
                config
                    .inputs()
                    .iter()
                    .filter_map(|input| depth.get(input))
                    .map(|d| d + 1)
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        depth.insert(pipe_id, wave);
        if waves.len() <= wave {
            waves.resize_with(wave + 1, Vec::new);
        }
        waves[wave].push(pipe_id);
    }
    waves
}

#[cfg(test)]
mod test {
    use super::Plan;
    use crate::error::{ConfigError, Error, ErrorKind};
    use pipes_types::PipeConfigs;
    use pretty_assertions::assert_eq;

    fn configs(json: &str) -> PipeConfigs {
        serde_json::from_str(json).unwrap()
    }

    const DIAMOND: &str = r#"{
        "a": {"type": "Source", "sourceId": "a"},
        "b": {"type": "Source", "sourceId": "b"},
        "left": {"type": "Filter", "pipeId": "a", "filters": []},
        "right": {"type": "Rename", "pipeId": "a", "properties": []},
        "joined": {"type": "Join", "leftPipeId": "left", "rightPipeId": "right", "on": ["id"]},
        "unused": {"type": "Filter", "pipeId": "b", "filters": []}
    }"#;

    #[test]
    fn reachable_in_dependency_order() {
        let configs = configs(DIAMOND);
        let outputs = ["joined"];
        let plan = Plan::resolve(&outputs, &configs).unwrap();
        assert_eq!(plan.order(), &["a", "left", "right", "joined"]);
        assert_eq!(
            plan.waves(),
            &[vec!["a"], vec!["left", "right"], vec!["joined"]]
        );
    }

    #[test]
    fn cycle_path() {
        let configs = configs(
            r#"{
                "a": {"type": "Filter", "pipeId": "c", "filters": []},
                "b": {"type": "Filter", "pipeId": "a", "filters": []},
                "c": {"type": "Filter", "pipeId": "b", "filters": []},
                "d": {"type": "Filter", "pipeId": "d", "filters": []}
            }"#,
        );
        let outputs = ["a"];
        let err = Plan::resolve(&outputs, &configs).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::Config(ConfigError::CycleDetected {
                path: vec!["a".into(), "c".into(), "b".into(), "a".into()]
            })
        );

        let outputs = ["d"];
        let err = Plan::resolve(&outputs, &configs).unwrap_err();
        assert_eq!(
            err,
            Error::in_pipe(
                "d",
                ConfigError::CycleDetected {
                    path: vec!["d".into(), "d".into()]
                }
            )
        );
    }

    #[test]
    fn unknown_references() {
        let configs = configs(DIAMOND);
        let outputs = ["missing"];
        assert_eq!(
            Plan::resolve(&outputs, &configs).unwrap_err(),
            Error::new(
                None,
                ConfigError::UnknownPipeReference {
                    pipe_id: "missing".to_string()
                }
            )
        );

        let mut dangling = configs.clone();
        dangling.insert(
            "dangling".to_string(),
            serde_json::from_str(r#"{"type": "Filter", "pipeId": "nowhere", "filters": []}"#)
                .unwrap(),
        );
        let outputs = ["dangling"];
        let err = Plan::resolve(&outputs, &dangling).unwrap_err();
        assert_eq!(err.pipe_id.as_deref(), Some("dangling"));
        assert!(err.is_config_error());
    }
}
