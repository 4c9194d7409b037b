use std::fmt;

use itertools::Itertools;
use serde_json::Value;

use crate::{
    env::Environment,
    errors::NodeLimitError,
    node::{Node, NodeList},
    selector::Selector,
};

#[derive(Debug, Clone)]
pub enum Segment {
    Child { selectors: Vec<Selector> },
    Recursive { selectors: Vec<Selector> },
}

impl Segment {
    pub fn selectors(&self) -> &[Selector] {
        match self {
            Segment::Child { selectors } | Segment::Recursive { selectors } => selectors,
        }
    }

    /// A child segment with exactly one name or index selector.
    pub fn is_singular(&self) -> bool {
        match self {
            Segment::Child { selectors } => matches!(
                selectors.as_slice(),
                [Selector::Name { .. } | Selector::Index { .. }]
            ),
            Segment::Recursive { .. } => false,
        }
    }

    /// Apply this segment to each of `nodes`. Fails if more than
    /// `env.node_limit` nodes are selected.
    pub fn resolve<'v>(
        &self,
        nodes: NodeList<'v>,
        env: &Environment,
        root: &'v Value,
    ) -> Result<NodeList<'v>, NodeLimitError> {
        let mut found = Found {
            nodes: Vec::new(),
            limit: env.node_limit,
        };

        match self {
            Segment::Child { selectors } => {
                for node in &nodes {
                    for selector in selectors {
                        found.extend(selector.resolve(env, node, root)?)?;
                    }
                }
            }
            Segment::Recursive { selectors } => {
                // Depth first, each node before its descendants.
                for node in nodes {
                    let mut pending = vec![node];
                    while let Some(node) = pending.pop() {
                        for selector in selectors {
                            found.extend(selector.resolve(env, &node, root)?)?;
                        }
                        pending.extend(node.children().into_iter().rev());
                    }
                }
            }
        }

        Ok(found.nodes)
    }
}

struct Found<'v> {
    nodes: NodeList<'v>,
    limit: usize,
}

impl<'v> Found<'v> {
    fn extend(&mut self, nodes: Vec<Node<'v>>) -> Result<(), NodeLimitError> {
        if self.nodes.len() + nodes.len() > self.limit {
            return Err(NodeLimitError { limit: self.limit });
        }
        self.nodes.extend(nodes);
        Ok(())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Segment::Recursive { .. } = self {
            f.write_str("..")?;
        }
        write!(f, "[{}]", self.selectors().iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(nodes: &NodeList) -> Vec<String> {
        nodes.iter().map(Node::path).collect()
    }

    #[test]
    fn descendants_in_document_order() {
        let doc = json!({"a": {"b": [1, {"c": 2}]}, "d": 3});
        let segment = Segment::Recursive {
            selectors: vec![Selector::Wild],
        };
        let nodes = segment
            .resolve(vec![Node::root(&doc)], &Environment::new(), &doc)
            .unwrap();
        assert_eq!(
            paths(&nodes),
            [
                "$['a']",
                "$['d']",
                "$['a']['b']",
                "$['a']['b'][0]",
                "$['a']['b'][1]",
                "$['a']['b'][1]['c']",
            ]
        );
    }

    #[test]
    fn child_selectors_apply_in_order() {
        let doc = json!({"usd": 1, "aud": 2});
        let segment = Segment::Child {
            selectors: vec![
                Selector::Name {
                    name: String::from("aud"),
                },
                Selector::Name {
                    name: String::from("usd"),
                },
            ],
        };
        let nodes = segment
            .resolve(vec![Node::root(&doc)], &Environment::new(), &doc)
            .unwrap();
        assert_eq!(paths(&nodes), ["$['aud']", "$['usd']"]);
        assert!(!segment.is_singular());
        assert_eq!(segment.to_string(), "['aud', 'usd']");
    }
}
