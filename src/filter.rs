//! Filter selector expressions and their evaluation.
use std::{cmp::Ordering, fmt};

use itertools::Itertools;
use serde_json::Value;

use crate::{
    env::Environment,
    errors::NodeLimitError,
    function::ExpressionType,
    node::{Node, NodeList},
    query::Query,
};

#[derive(Debug, Clone)]
pub enum FilterExpression {
    True,
    False,
    Null,
    String { value: String },
    Int { value: i64 },
    Float { value: f64 },
    Not { expression: Box<FilterExpression> },
    Logical {
        left: Box<FilterExpression>,
        operator: LogicalOperator,
        right: Box<FilterExpression>,
    },
    Comparison {
        left: Box<FilterExpression>,
        operator: ComparisonOperator,
        right: Box<FilterExpression>,
    },
    RelativeQuery { query: Box<Query> },
    RootQuery { query: Box<Query> },
    Function {
        name: String,
        args: Vec<FilterExpression>,
    },
}

use FilterExpression as Expr;
use FilterExpressionResult as Res;

impl FilterExpression {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expr::True
                | Expr::False
                | Expr::Null
                | Expr::String { .. }
                | Expr::Int { .. }
                | Expr::Float { .. }
        )
    }

    /// Evaluate this expression as the test of a filter selector, with
    /// `current` bound to `@`.
    pub fn test(
        &self,
        env: &Environment,
        root: &Value,
        current: &Value,
    ) -> Result<bool, NodeLimitError> {
        Ok(self.evaluate(env, root, current)?.is_truthy())
    }

    pub fn evaluate<'v>(
        &self,
        env: &Environment,
        root: &'v Value,
        current: &'v Value,
    ) -> Result<Res<'v>, NodeLimitError> {
        let rv = match self {
            Expr::True => Res::Bool(true),
            Expr::False => Res::Bool(false),
            Expr::Null => Res::Null,
            Expr::String { value } => Res::String(value.clone()),
            Expr::Int { value } => Res::Int(*value),
            Expr::Float { value } => Res::Float(*value),
            Expr::Not { expression } => Res::Bool(!expression.test(env, root, current)?),
            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = left.test(env, root, current)?;
                Res::Bool(match operator {
                    LogicalOperator::And => left && right.test(env, root, current)?,
                    LogicalOperator::Or => left || right.test(env, root, current)?,
                })
            }
            Expr::Comparison {
                left,
                operator,
                right,
            } => {
                let left = left.evaluate(env, root, current)?.into_value();
                let right = right.evaluate(env, root, current)?.into_value();
                Res::Bool(operator.apply(&left, &right))
            }
            Expr::RelativeQuery { query } => {
                Res::Nodes(query.resolve(vec![Node::root(current)], env, root)?)
            }
            Expr::RootQuery { query } => {
                Res::Nodes(query.resolve(vec![Node::root(root)], env, root)?)
            }
            Expr::Function { name, args } => {
                // Unknown names are rejected by the parser.
                let Some(ext) = env.function_register.get(name) else {
                    return Ok(Res::Nothing);
                };

                let params = ext.sig().param_types;
                let args = args
                    .iter()
                    .zip(params)
                    .map(|(arg, param)| {
                        let rv = arg.evaluate(env, root, current)?;
                        Ok(match param {
                            ExpressionType::Nodes => rv,
                            ExpressionType::Logical => Res::Bool(rv.is_truthy()),
                            ExpressionType::Value => rv.into_value(),
                        })
                    })
                    .collect::<Result<_, NodeLimitError>>()?;

                ext.call(args)
            }
        };

        Ok(rv)
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::True => f.write_str("true"),
            Expr::False => f.write_str("false"),
            Expr::Null => f.write_str("null"),
            Expr::String { value } => write!(f, "'{value}'"),
            Expr::Int { value } => write!(f, "{value}"),
            Expr::Float { value } => write!(f, "{value}"),
            Expr::Not { expression } => write!(f, "!{expression}"),
            Expr::Logical {
                left,
                operator,
                right,
            } => write!(f, "({left} {} {right})", operator.as_str()),
            Expr::Comparison {
                left,
                operator,
                right,
            } => write!(f, "{left} {} {right}", operator.as_str()),
            Expr::RelativeQuery { query } => write!(f, "@{}", query.segments.iter().join("")),
            Expr::RootQuery { query } => write!(f, "${}", query.segments.iter().join("")),
            Expr::Function { name, args } => write!(f, "{}({})", name, args.iter().join(", ")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "==",
            ComparisonOperator::Ne => "!=",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Lt => "<",
        }
    }

    pub fn apply(&self, left: &Res, right: &Res) -> bool {
        let ord = left.relate(right);
        match self {
            ComparisonOperator::Eq => ord == Some(Ordering::Equal),
            ComparisonOperator::Ne => ord != Some(Ordering::Equal),
            ComparisonOperator::Lt => ord == Some(Ordering::Less),
            ComparisonOperator::Gt => ord == Some(Ordering::Greater),
            ComparisonOperator::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
            ComparisonOperator::Ge => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

/// The result of evaluating a filter expression.
#[derive(Debug, PartialEq)]
pub enum FilterExpressionResult<'v> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Null,
    String(String),
    Array(&'v Value),
    Object(&'v Value),
    Nodes(NodeList<'v>),
    Nothing,
}

impl<'v> FilterExpressionResult<'v> {
    pub fn from_json_value(value: &'v Value) -> Self {
        match value {
            Value::Null => Res::Null,
            Value::Bool(b) => Res::Bool(*b),
            // Unsigned integers too big for an i64 become floats.
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Res::Float(n.as_f64().unwrap_or(f64::NAN)), Res::Int),
            Value::String(s) => Res::String(s.clone()),
            Value::Array(_) => Res::Array(value),
            Value::Object(_) => Res::Object(value),
        }
    }

    /// Node lists are truthy when they are not empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Res::Nothing => false,
            Res::Bool(b) => *b,
            Res::Nodes(nodes) => !nodes.is_empty(),
            _ => true,
        }
    }

    /// Replace a node list with the value of its only node, or with Nothing
    /// if it is empty. Longer lists are left alone.
    pub fn into_value(self) -> Self {
        match self {
            Res::Nodes(nodes) if nodes.len() <= 1 => nodes
                .first()
                .map_or(Res::Nothing, |node| Res::from_json_value(node.value)),
            rv => rv,
        }
    }

    /// How two comparison operands relate. Only numbers and strings are
    /// ordered. Other values are either equal or unrelated.
    fn relate(&self, other: &Self) -> Option<Ordering> {
        let equal = |eq: bool| eq.then_some(Ordering::Equal);

        match (self, other) {
            (Res::Int(l), Res::Int(r)) => Some(l.cmp(r)),
            (Res::Float(l), Res::Float(r)) => l.partial_cmp(r),
            (Res::Int(l), Res::Float(r)) => (*l as f64).partial_cmp(r),
            (Res::Float(l), Res::Int(r)) => l.partial_cmp(&(*r as f64)),
            (Res::String(l), Res::String(r)) => Some(l.cmp(r)),
            (Res::Null, Res::Null) | (Res::Nothing, Res::Nothing) => Some(Ordering::Equal),
            (Res::Bool(l), Res::Bool(r)) => equal(l == r),
            (Res::Array(l), Res::Array(r)) | (Res::Object(l), Res::Object(r)) => equal(l == r),
            _ => None,
        }
    }
}
