use std::fmt;

use itertools::Itertools;
use lazy_static::lazy_static;
use serde_json::Value;

use crate::{
    env::Environment,
    errors::{JSONPathError, NodeLimitError},
    lexer::lex,
    node::{Node, NodeList},
    parser::Parser,
    segment::Segment,
};

lazy_static! {
    static ref PARSER: Parser = Parser::new();
}

#[derive(Debug, Clone)]
pub struct Query {
    pub segments: Vec<Segment>,
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.segments.iter().join(""))
    }
}

impl Query {
    pub fn new(segments: Vec<Segment>) -> Self {
        Query { segments }
    }

    /// Parse `expr` using the standard function extensions.
    pub fn standard(expr: &str) -> Result<Self, JSONPathError> {
        PARSER.parse(lex(expr)?)
    }

    /// Nodes in `value` matched by this query, in the order they were found.
    pub fn find<'v>(
        &self,
        value: &'v Value,
        env: &Environment,
    ) -> Result<NodeList<'v>, NodeLimitError> {
        self.resolve(vec![Node::root(value)], env, value)
    }

    /// Apply this query's segments to `nodes`. `root` is the target of `$`
    /// queries inside filters.
    pub fn resolve<'v>(
        &self,
        nodes: NodeList<'v>,
        env: &Environment,
        root: &'v Value,
    ) -> Result<NodeList<'v>, NodeLimitError> {
        self.segments
            .iter()
            .try_fold(nodes, |nodes, segment| segment.resolve(nodes, env, root))
    }

    pub fn is_singular(&self) -> bool {
        self.segments.iter().all(Segment::is_singular)
    }
}
