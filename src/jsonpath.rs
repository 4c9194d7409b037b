use lazy_static::lazy_static;
use serde_json::Value;

use crate::{env::Environment, errors::JSONPathError, node::NodeList};

lazy_static! {
    pub static ref ENV: Environment = Environment::new();
}

/// Find all nodes in `value` matching the JSONPath expression `expr`.
pub fn find<'a>(expr: &str, value: &'a Value) -> Result<NodeList<'a>, JSONPathError> {
    ENV.find(expr, value)
}
