//! Filter function extension points.
use std::{collections::HashMap, fmt, sync::Arc};

use crate::filter::FilterExpressionResult;

/// The declared type of a function parameter or result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionType {
    Logical,
    Nodes,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSignature {
    pub param_types: &'static [ExpressionType],
    pub return_type: ExpressionType,
}

impl FunctionSignature {
    pub const fn new(param_types: &'static [ExpressionType], return_type: ExpressionType) -> Self {
        Self {
            param_types,
            return_type,
        }
    }
}

pub trait FunctionExtension: Send + Sync {
    fn sig(&self) -> FunctionSignature;

    /// `args` have already been checked against `sig()` by the parser.
    fn call<'a>(&self, args: Vec<FilterExpressionResult<'a>>) -> FilterExpressionResult<'a>;
}

impl fmt::Debug for dyn FunctionExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sig = self.sig();
        write!(f, "fn{:?} -> {:?}", sig.param_types, sig.return_type)
    }
}

/// Function extensions by name.
pub type FunctionRegister = HashMap<String, Arc<dyn FunctionExtension>>;

/// The signatures of every function in `register`, as the parser needs them.
pub fn signatures(register: &FunctionRegister) -> HashMap<String, FunctionSignature> {
    register
        .iter()
        .map(|(name, ext)| (name.clone(), ext.sig()))
        .collect()
}
