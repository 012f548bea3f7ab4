//! Pipe configurations.
//!
//! A pipeline is an ordered map from pipe id to [`PipeConfig`].  Pipes name
//! their upstream pipes by id, which makes the map a dependency graph; the
//! engine requires that graph to be acyclic.

use crate::expression::{AggregateOp, Expression};
use core::fmt;
use indexmap::IndexMap;
use serde::de::{self, value::MapAccessDeserializer, value::SeqAccessDeserializer, MapAccess};
use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a pipe in a [`PipeConfigs`] map.
pub type PipeId = String;

/// Identifier of an input table supplied by the caller.
pub type SourceId = String;

/// All pipes of a pipeline, keyed by pipe id.
///
/// The map preserves insertion order, which is the order in which
/// configuration-level utilities report pipes.
pub type PipeConfigs = IndexMap<PipeId, PipeConfig>;

/// Declarative description of one pipe, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipeConfig {
    Source(SourcePipeConfig),
    Join(JoinPipeConfig),
    DerivedValues(DerivedValuesPipeConfig),
    GroupAndReduce(GroupAndReducePipeConfig),
    Filter(FilterPipeConfig),
    Rename(RenamePipeConfig),
    ParseDateTime(ParseDateTimePipeConfig),
}

impl PipeConfig {
    /// Name of the pipe kind, as used in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Source(_) => "Source",
            Self::Join(_) => "Join",
            Self::DerivedValues(_) => "DerivedValues",
            Self::GroupAndReduce(_) => "GroupAndReduce",
            Self::Filter(_) => "Filter",
            Self::Rename(_) => "Rename",
            Self::ParseDateTime(_) => "ParseDateTime",
        }
    }

    /// Upstream pipe ids this pipe consumes, left before right for joins.
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Self::Source(_) => Vec::new(),
            Self::Join(config) => vec![config.left_pipe_id.as_str(), config.right_pipe_id.as_str()],
            Self::DerivedValues(config) => vec![config.pipe_id.as_str()],
            Self::GroupAndReduce(config) => vec![config.pipe_id.as_str()],
            Self::Filter(config) => vec![config.pipe_id.as_str()],
            Self::Rename(config) => vec![config.pipe_id.as_str()],
            Self::ParseDateTime(config) => vec![config.pipe_id.as_str()],
        }
    }

    /// Expressions owned by this pipe.
    pub fn expressions(&self) -> Vec<&Expression> {
        match self {
            Self::DerivedValues(config) => config.calcs.iter().map(|c| &c.expression).collect(),
            Self::Filter(config) => config.filters.iter().collect(),
            Self::Source(_)
            | Self::Join(_)
            | Self::GroupAndReduce(_)
            | Self::Rename(_)
            | Self::ParseDateTime(_) => Vec::new(),
        }
    }
}

/// Exposes a caller-supplied input table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePipeConfig {
    pub source_id: SourceId,
}

/// Join flavor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKind {
    #[default]
    Left,
    Right,
    Inner,
    Outer,
}

/// Equi-join of two upstream pipes on equally named key columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPipeConfig {
    pub left_pipe_id: PipeId,
    pub right_pipe_id: PipeId,
    /// Key columns, present under the same name on both sides.
    pub on: Vec<String>,
    /// Join flavor; defaults to a left join.
    #[serde(default)]
    pub how: JoinKind,
}

/// One computed column of a `DerivedValues` pipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedValueConfig {
    pub name: String,
    pub expression: Expression,
}

/// Appends computed columns to the upstream table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedValuesPipeConfig {
    pub pipe_id: PipeId,
    /// Evaluated in order; a calc may reference columns produced by
    /// earlier calcs.
    pub calcs: Vec<DerivedValueConfig>,
}

/// One aggregate column of a `GroupAndReduce` pipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggConfig {
    /// Output column name.
    pub name: String,
    #[serde(rename = "type")]
    pub op: AggregateOp,
    /// Column being reduced.
    pub agg_property: String,
}

/// Collapses the upstream table to one row per distinct group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAndReducePipeConfig {
    pub pipe_id: PipeId,
    pub group_by: Vec<String>,
    pub aggs: Vec<AggConfig>,
}

/// Keeps the rows for which every filter evaluates to `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPipeConfig {
    pub pipe_id: PipeId,
    pub filters: Vec<Expression>,
}

/// A single column relabeling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameProperty {
    pub from: String,
    pub to: String,
}

/// Relabels columns of the upstream table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamePipeConfig {
    pub pipe_id: PipeId,
    #[serde(deserialize_with = "deserialize_rename_properties")]
    pub properties: Vec<RenameProperty>,
}

/// Parses a string column into a date-time column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseDateTimePipeConfig {
    pub pipe_id: PipeId,
    pub column_from: String,
    pub column_to: String,
    /// `strftime`-style format, e.g. `%Y-%m-%d`.
    pub format: String,
}

/// Deserializes rename properties given either as a list of `{from, to}`
/// objects or as a single object.
fn deserialize_rename_properties<'de, D>(deserializer: D) -> Result<Vec<RenameProperty>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OneOrMany;

    impl<'de> Visitor<'de> for OneOrMany {
        type Value = Vec<RenameProperty>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a {from, to} object or a list of them")
        }

        fn visit_map<M>(self, map: M) -> Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            Ok(vec![RenameProperty::deserialize(
                MapAccessDeserializer::new(map),
            )?])
        }

        fn visit_seq<S>(self, seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            Vec::<RenameProperty>::deserialize(SeqAccessDeserializer::new(seq))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(OneOrMany)
}
