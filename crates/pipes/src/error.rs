//! Error taxonomy of a pipeline run.
//!
//! Every failure aborts the whole run.  Errors fall in three families:
//! [`ConfigError`] (the pipe graph itself is wrong), [`SchemaError`] (a table
//! does not have the shape an operation needs) and [`EvaluationError`] (an
//! expression cannot be computed).  [`Error`] adds the id of the pipe that
//! failed.

use crate::table::DataType;
use pipes_types::{DetailedError, PipeId, SourceId};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt::{Display, Error as FmtError, Formatter};
use thiserror::Error as ThisError;

/// The pipe graph or a pipe configuration is invalid.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, ThisError)]
pub enum ConfigError {
    /// The reachable pipe graph contains a cycle.  `path` starts and ends
    /// with the same pipe id.
    #[error("cycle in the pipe graph: {}", path.join(" -> "))]
    CycleDetected { path: Vec<PipeId> },
    #[error("reference to unknown pipe '{pipe_id}'")]
    UnknownPipeReference { pipe_id: PipeId },
    #[error("reference to unknown input table '{source_id}'")]
    UnknownSourceId { source_id: SourceId },
    /// A rename would produce two columns with the same name.
    #[error("renaming produces more than one column named '{column}'")]
    AmbiguousColumnName { column: String },
}

/// A table does not have the columns or types an operation requires.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, ThisError)]
pub enum SchemaError {
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },
    #[error("column '{column}' not found")]
    MissingColumn { column: String },
    #[error("join key '{column}' has type {left} on the left and {right} on the right")]
    IncompatibleJoinKeys {
        column: String,
        left: DataType,
        right: DataType,
    },
    #[error("join requires at least one key column")]
    EmptyJoinKeys,
    /// Row sets with different columns cannot be concatenated.
    #[error("cannot concatenate tables with schemas [{left}] and [{right}]")]
    SchemaMismatch { left: String, right: String },
}

/// An expression cannot be evaluated.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, ThisError)]
pub enum EvaluationError {
    #[error("operator {operator} expects {expected} operands, got {actual}")]
    Arity {
        operator: String,
        expected: String,
        actual: usize,
    },
    #[error("operator {operator} expects {expected}, got {actual}")]
    TypeMismatch {
        operator: String,
        expected: String,
        actual: DataType,
    },
    #[error("integer overflow in {operator}")]
    ArithmeticOverflow { operator: String },
    #[error("cannot parse '{value}' as a date-time with format '{format}'")]
    InvalidDateTime { value: String, format: String },
}

impl EvaluationError {
    pub(crate) fn type_mismatch(
        operator: impl ToString,
        expected: impl ToString,
        actual: DataType,
    ) -> Self {
        Self::TypeMismatch {
            operator: operator.to_string(),
            expected: expected.to_string(),
            actual,
        }
    }
}

/// Cause of a failed run, without the pipe context.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, ThisError)]
#[serde(untagged)]
pub enum ErrorKind {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// A failed pipeline run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Error {
    /// Pipe whose evaluation or configuration failed.  `None` when the
    /// request itself is invalid, e.g. names an output pipe that does not
    /// exist.
    pub pipe_id: Option<PipeId>,
    pub kind: ErrorKind,
}

impl Error {
    pub fn new(pipe_id: Option<PipeId>, kind: impl Into<ErrorKind>) -> Self {
        Self {
            pipe_id,
            kind: kind.into(),
        }
    }

    pub(crate) fn in_pipe(pipe_id: &str, kind: impl Into<ErrorKind>) -> Self {
        Self::new(Some(pipe_id.to_string()), kind)
    }

    pub fn is_config_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Config(_))
    }

    pub fn is_schema_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Schema(_))
    }

    pub fn is_evaluation_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Evaluation(_))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match &self.pipe_id {
            Some(pipe_id) => write!(f, "pipe '{pipe_id}': {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl DetailedError for ConfigError {
    fn error_code(&self) -> Cow<'static, str> {
        match self {
            Self::CycleDetected { .. } => Cow::from("CycleDetected"),
            Self::UnknownPipeReference { .. } => Cow::from("UnknownPipeReference"),
            Self::UnknownSourceId { .. } => Cow::from("UnknownSourceId"),
            Self::AmbiguousColumnName { .. } => Cow::from("AmbiguousColumnName"),
        }
    }
}

impl DetailedError for SchemaError {
    fn error_code(&self) -> Cow<'static, str> {
        match self {
            Self::LengthMismatch { .. } => Cow::from("LengthMismatch"),
            Self::DuplicateColumn { .. } => Cow::from("DuplicateColumn"),
            Self::MissingColumn { .. } => Cow::from("MissingColumn"),
            Self::IncompatibleJoinKeys { .. } => Cow::from("IncompatibleJoinKeys"),
            Self::EmptyJoinKeys => Cow::from("EmptyJoinKeys"),
            Self::SchemaMismatch { .. } => Cow::from("SchemaMismatch"),
        }
    }
}

impl DetailedError for EvaluationError {
    fn error_code(&self) -> Cow<'static, str> {
        match self {
            Self::Arity { .. } => Cow::from("Arity"),
            Self::TypeMismatch { .. } => Cow::from("TypeMismatch"),
            Self::ArithmeticOverflow { .. } => Cow::from("ArithmeticOverflow"),
            Self::InvalidDateTime { .. } => Cow::from("InvalidDateTime"),
        }
    }
}

impl DetailedError for ErrorKind {
    fn error_code(&self) -> Cow<'static, str> {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Schema(e) => e.error_code(),
            Self::Evaluation(e) => e.error_code(),
        }
    }
}

impl DetailedError for Error {
    fn error_code(&self) -> Cow<'static, str> {
        self.kind.error_code()
    }
}
