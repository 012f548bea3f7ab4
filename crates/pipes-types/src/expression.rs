//! Expression trees evaluated by `DerivedValues` and `Filter` pipes.
//!
//! On the wire an expression is one of
//!
//! * a JSON scalar (`1`, `2.5`, `"abc"`, `true`, `null`): a literal,
//! * `{"property": "revenue"}`: a column reference,
//! * `{"operation": "Sum", "operands": [...]}`: an operator application,
//! * `{"operation": "Max", "operand": ..., "over": ["year"]}`: a window
//!   aggregation.
//!
//! Operator names are checked while deserializing, so an unknown operator
//! never reaches the evaluator.

use core::fmt;
use serde::de::{self, value::StrDeserializer, IntoDeserializer, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// Operators accepted in `{"operation": ..., "operands": [...]}` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Sum,
    Subtract,
    Multiply,
    Divide,
    Min,
    Max,
    Not,
    And,
    Or,
    LessThan,
    LessThanEq,
    GreaterThan,
    GreaterThanEq,
    IfThenElse,
}

impl Operator {
    /// Name of the operator as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sum => "Sum",
            Self::Subtract => "Subtract",
            Self::Multiply => "Multiply",
            Self::Divide => "Divide",
            Self::Min => "Min",
            Self::Max => "Max",
            Self::Not => "Not",
            Self::And => "And",
            Self::Or => "Or",
            Self::LessThan => "LessThan",
            Self::LessThanEq => "LessThanEq",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanEq => "GreaterThanEq",
            Self::IfThenElse => "IfThenElse",
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reductions used by window aggregations and `GroupAndReduce` pipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateOp {
    Sum,
    Max,
    Min,
}

impl AggregateOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sum => "Sum",
            Self::Max => "Max",
            Self::Min => "Min",
        }
    }
}

impl Display for AggregateOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A constant value in an expression tree.
///
/// JSON integers become [`Literal::Int64`], every other number becomes
/// [`Literal::Float64`].
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
}

impl Serialize for Literal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int64(i) => serializer.serialize_i64(*i),
            Self::Float64(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
        }
    }
}

struct LiteralVisitor;

impl<'de> Visitor<'de> for LiteralVisitor {
    type Value = Literal;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number, string, boolean or null")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Literal::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Literal::Int64(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        // Integers beyond `i64::MAX` cannot be represented exactly.
        Ok(i64::try_from(v)
            .map(Literal::Int64)
            .unwrap_or(Literal::Float64(v as f64)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Literal::Float64(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Literal::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Literal::String(v))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Literal::Null)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Literal::Null)
    }
}

impl<'de> Deserialize<'de> for Literal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LiteralVisitor)
    }
}

/// A node of an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A constant broadcast to every row.
    Literal(Literal),
    /// Reference to a column of the table the expression is evaluated
    /// against.
    Property(String),
    /// Application of an operator to a list of operands.
    Operation {
        operator: Operator,
        operands: Vec<Expression>,
    },
    /// Aggregate `operand` within partitions of rows sharing the values of
    /// the `over` columns and broadcast the result back to every row of the
    /// partition.
    WindowAggregation {
        operator: AggregateOp,
        operand: Box<Expression>,
        over: Vec<String>,
    },
}

impl Expression {
    pub fn literal(literal: impl Into<Literal>) -> Self {
        Self::Literal(literal.into())
    }

    pub fn property(name: impl Into<String>) -> Self {
        Self::Property(name.into())
    }

    pub fn operation(operator: Operator, operands: Vec<Expression>) -> Self {
        Self::Operation { operator, operands }
    }

    pub fn window(operator: AggregateOp, operand: Expression, over: Vec<String>) -> Self {
        Self::WindowAggregation {
            operator,
            operand: Box::new(operand),
            over,
        }
    }

    /// Calls `f` on this node and every node below it, parents first.
    pub fn walk<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a Expression),
    {
        f(self);
        match self {
            Self::Literal(_) | Self::Property(_) => {}
            Self::Operation { operands, .. } => {
                for operand in operands {
                    operand.walk(f);
                }
            }
            Self::WindowAggregation { operand, .. } => operand.walk(f),
        }
    }

    /// Columns referenced anywhere in the expression, in first-seen order.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        self.walk(&mut |expr| match expr {
            Expression::Property(name) => {
                if !columns.contains(&name.as_str()) {
                    columns.push(name.as_str());
                }
            }
            Expression::WindowAggregation { over, .. } => {
                for name in over {
                    if !columns.contains(&name.as_str()) {
                        columns.push(name.as_str());
                    }
                }
            }
            Expression::Literal(_) | Expression::Operation { .. } => {}
        });
        columns
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl Serialize for Expression {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Literal(literal) => literal.serialize(serializer),
            Self::Property(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("property", name)?;
                map.end()
            }
            Self::Operation { operator, operands } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("operation", operator)?;
                map.serialize_entry("operands", operands)?;
                map.end()
            }
            Self::WindowAggregation {
                operator,
                operand,
                over,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("operation", operator)?;
                map.serialize_entry("operand", operand)?;
                map.serialize_entry("over", over)?;
                map.end()
            }
        }
    }
}

struct ExpressionVisitor;

impl<'de> Visitor<'de> for ExpressionVisitor {
    type Value = Expression;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(
            "a literal, {\"property\": ..}, {\"operation\": .., \"operands\": [..]} or {\"operation\": .., \"operand\": .., \"over\": [..]}",
        )
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        LiteralVisitor.visit_bool(v).map(Expression::Literal)
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        LiteralVisitor.visit_i64(v).map(Expression::Literal)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        LiteralVisitor.visit_u64(v).map(Expression::Literal)
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        LiteralVisitor.visit_f64(v).map(Expression::Literal)
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        LiteralVisitor.visit_str(v).map(Expression::Literal)
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        LiteralVisitor.visit_string(v).map(Expression::Literal)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Expression::Literal(Literal::Null))
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Expression::Literal(Literal::Null))
    }

    fn visit_map<M>(self, mut map: M) -> Result<Expression, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut property: Option<String> = None;
        let mut operation: Option<String> = None;
        let mut operands: Option<Vec<Expression>> = None;
        let mut operand: Option<Expression> = None;
        let mut over: Option<Vec<String>> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "property" => property = Some(map.next_value()?),
                "operation" => operation = Some(map.next_value()?),
                "operands" => operands = Some(map.next_value()?),
                "operand" => operand = Some(map.next_value()?),
                "over" => over = Some(map.next_value()?),
                other => {
                    return Err(de::Error::unknown_field(
                        other,
                        &["property", "operation", "operands", "operand", "over"],
                    ))
                }
            }
        }

        match (property, operation) {
            (Some(_), Some(_)) => Err(de::Error::custom(
                "expression cannot have both 'property' and 'operation'",
            )),
            (Some(name), None) => {
                if operands.is_some() || operand.is_some() || over.is_some() {
                    return Err(de::Error::custom(
                        "a property reference takes no operands",
                    ));
                }
                Ok(Expression::Property(name))
            }
            (None, Some(name)) => match (operands, operand) {
                (Some(_), Some(_)) => Err(de::Error::custom(
                    "expression cannot have both 'operands' and 'operand'",
                )),
                (Some(operands), None) => {
                    if over.is_some() {
                        return Err(de::Error::custom(
                            "'over' is only valid for window aggregations",
                        ));
                    }
                    let name: StrDeserializer<'_, M::Error> = name.as_str().into_deserializer();
                    let operator = Operator::deserialize(name)?;
                    Ok(Expression::Operation { operator, operands })
                }
                (None, Some(operand)) => {
                    let name: StrDeserializer<'_, M::Error> = name.as_str().into_deserializer();
                    let operator = AggregateOp::deserialize(name)?;
                    Ok(Expression::WindowAggregation {
                        operator,
                        operand: Box::new(operand),
                        over: over.unwrap_or_default(),
                    })
                }
                (None, None) => Err(de::Error::missing_field("operands")),
            },
            (None, None) => Err(de::Error::missing_field("operation")),
        }
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ExpressionVisitor)
    }
}
