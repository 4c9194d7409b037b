use std::fmt::{self, Write};

use serde_json::Value;

use crate::{
    env::Environment,
    errors::NodeLimitError,
    filter::FilterExpression,
    node::{write_quoted, Node, NodeList},
};

#[derive(Debug, Clone)]
pub enum Selector {
    Name {
        name: String,
    },
    Index {
        index: i64,
    },
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
    Wild,
    Filter {
        expression: Box<FilterExpression>,
    },
}

impl Selector {
    /// Select children of `node`. `root` is the target of `$` inside filters.
    ///
    /// Only filters can fail, when a query inside the filter selects too many nodes.
    pub fn resolve<'v>(
        &self,
        env: &Environment,
        node: &Node<'v>,
        root: &'v Value,
    ) -> Result<NodeList<'v>, NodeLimitError> {
        let nodes = match self {
            Selector::Name { name } => node
                .value
                .as_object()
                .and_then(|obj| obj.get_key_value(name))
                .map(|(k, v)| node.member(v, k))
                .into_iter()
                .collect(),
            Selector::Index { index } => node
                .value
                .as_array()
                .and_then(|arr| {
                    let i = normalize_index(*index, arr.len())?;
                    arr.get(i).map(|v| node.element(v, i))
                })
                .into_iter()
                .collect(),
            Selector::Slice { start, stop, step } => match node.value {
                Value::Array(arr) => slice_indices(arr.len(), *start, *stop, *step)
                    .into_iter()
                    .filter_map(|i| arr.get(i).map(|v| node.element(v, i)))
                    .collect(),
                _ => Vec::new(),
            },
            Selector::Wild => node.children(),
            Selector::Filter { expression } => {
                let mut nodes = Vec::new();
                for child in node.children() {
                    if expression.test(env, root, child.value)? {
                        nodes.push(child);
                    }
                }
                nodes
            }
        };

        Ok(nodes)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name { name } => write_quoted(f, name),
            Selector::Index { index } => write!(f, "{index}"),
            Selector::Slice { start, stop, step } => {
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                f.write_char(':')?;
                if let Some(stop) = stop {
                    write!(f, "{stop}")?;
                }
                write!(f, ":{}", step.unwrap_or(1))
            }
            Selector::Wild => f.write_char('*'),
            Selector::Filter { expression } => write!(f, "?{expression}"),
        }
    }
}

/// Negative indices count back from the end of the array.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    match usize::try_from(index) {
        Ok(i) => Some(i),
        Err(_) => usize::try_from(index.unsigned_abs())
            .ok()
            .and_then(|back| len.checked_sub(back)),
    }
}

/// Array indices selected by a slice, in selection order. A zero step
/// selects nothing.
fn slice_indices(
    len: usize,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> Vec<usize> {
    // i128 so that bounds near i64::MIN or i64::MAX can't overflow.
    let len = len as i128;
    let step = i128::from(step.unwrap_or(1));
    let bound = |i: i64| {
        let i = i128::from(i);
        if i < 0 {
            len + i
        } else {
            i
        }
    };

    let indices: Vec<i128> = match step.cmp(&0) {
        std::cmp::Ordering::Equal => return Vec::new(),
        std::cmp::Ordering::Greater => {
            let lower = start.map_or(0, bound).clamp(0, len);
            let upper = stop.map_or(len, bound).clamp(0, len);
            std::iter::successors(Some(lower), |i| Some(i + step))
                .take_while(|i| *i < upper)
                .collect()
        }
        std::cmp::Ordering::Less => {
            let upper = start.map_or(len - 1, bound).clamp(-1, len - 1);
            let lower = stop.map_or(-1, bound).clamp(-1, len - 1);
            std::iter::successors(Some(upper), |i| Some(i + step))
                .take_while(|i| *i > lower)
                .collect()
        }
    };

    indices
        .into_iter()
        .filter_map(|i| usize::try_from(i).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_forwards() {
        assert_eq!(slice_indices(6, Some(1), Some(4), None), [1, 2, 3]);
        assert_eq!(slice_indices(6, None, None, Some(2)), [0, 2, 4]);
    }

    #[test]
    fn slice_backwards() {
        assert_eq!(slice_indices(6, None, None, Some(-2)), [5, 3, 1]);
        assert_eq!(slice_indices(6, Some(3), Some(0), Some(-1)), [3, 2, 1]);
    }

    #[test]
    fn slice_negative_bounds() {
        assert_eq!(slice_indices(6, Some(-2), None, None), [4, 5]);
        assert_eq!(slice_indices(6, Some(-100), Some(2), None), [0, 1]);
    }

    #[test]
    fn slice_extreme_bounds() {
        let (min, max) = (Some(i64::MIN), Some(i64::MAX));
        assert_eq!(slice_indices(3, min, max, max), [0]);
        assert_eq!(slice_indices(3, max, min, min), [2]);
    }

    #[test]
    fn slice_zero_step() {
        assert!(slice_indices(3, None, None, Some(0)).is_empty());
        assert!(slice_indices(0, None, None, None).is_empty());
    }

    #[test]
    fn negative_index() {
        assert_eq!(normalize_index(-1, 3), Some(2));
        assert_eq!(normalize_index(-3, 3), Some(0));
        assert_eq!(normalize_index(-4, 3), None);
        assert_eq!(normalize_index(1, 3), Some(1));
        assert_eq!(normalize_index(i64::MIN, 3), None);
    }

    #[test]
    fn display() {
        let slice = Selector::Slice {
            start: Some(-1),
            stop: None,
            step: None,
        };
        assert_eq!(slice.to_string(), "-1::1");
        let name = Selector::Name {
            name: String::from("wrapped 'btc'"),
        };
        assert_eq!(name.to_string(), "'wrapped \\'btc\\''");
    }
}
