use serde_json::Value;

use crate::{
    errors::JSONPathError, function::FunctionRegister, node::NodeList, query::Query,
    standard_functions,
};

/// The most nodes a single segment may select before evaluation is abandoned.
pub const DEFAULT_NODE_LIMIT: usize = 1_000_000;

/// Function extensions and resource limits used at evaluation time.
#[derive(Debug, Clone)]
pub struct Environment {
    pub function_register: FunctionRegister,
    pub node_limit: usize,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            function_register: standard_functions::register(),
            node_limit: DEFAULT_NODE_LIMIT,
        }
    }

    pub fn with_node_limit(mut self, limit: usize) -> Self {
        self.node_limit = limit;
        self
    }

    /// Parse `expr` and evaluate it against `value`.
    pub fn find<'v>(&self, expr: &str, value: &'v Value) -> Result<NodeList<'v>, JSONPathError> {
        Query::standard(expr)?
            .find(value, self)
            .map_err(|err| JSONPathError::limit(err.to_string(), (0, expr.len())))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
