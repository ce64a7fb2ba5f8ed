// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Serializable tree input: adjacency rows, root id and per-node attributes.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use crate::error::Result;
use crate::tree::TreeBuilder;
use crate::types::NodeAttributes;

/// Tree description as produced by an external parser.
///
/// ```json
/// {
///   "tree": [[0, 1, 2], [1], [2]],
///   "root": 0,
///   "attributes": { "1": { "weight": 3.0, "name": "left" } }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct TreeData {
    /// Row `i` is `[i, child₁, …, childₖ]`.
    pub tree: Vec<Vec<u32>>,
    /// Root id.
    pub root: u32,
    /// Optional per-node attributes; unknown ids are skipped with a warning.
    pub attributes: BTreeMap<u32, NodeAttributes>,
}

impl TreeData {
    /// Create tree data without attributes.
    pub fn new(tree: impl Into<Vec<Vec<u32>>>, root: u32) -> Self {
        Self {
            tree: tree.into(),
            root,
            attributes: BTreeMap::new(),
        }
    }

    /// Attach attributes to one node.
    #[must_use]
    pub fn with_attributes(mut self, id: u32, attributes: NodeAttributes) -> Self {
        self.attributes.insert(id, attributes);
        self
    }

    /// A builder seeded with these rows and attributes.
    pub fn builder(&self) -> TreeBuilder {
        TreeBuilder::new(self.tree.clone(), self.root).attributes(
            self.attributes
                .iter()
                .map(|(&id, attrs)| (id, attrs.clone())),
        )
    }

    /// Parse tree data from JSON.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<TreeData> for TreeBuilder {
    fn from(data: TreeData) -> Self {
        Self::new(data.tree, data.root).attributes(data.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    #[test]
    fn builder_carries_attributes() {
        let tree = TreeData::new(vec![vec![0, 1, 2], vec![1], vec![2]], 0)
            .with_attributes(1, NodeAttributes::weighted(3.0))
            .with_attributes(2, NodeAttributes::named("right"))
            .builder()
            .build()
            .unwrap();
        assert_eq!(tree.wanted_fraction(NodeId::new(1)), Some(0.75));
        assert_eq!(tree.name(NodeId::new(2)), Some("right"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn parses_json() {
        let data = TreeData::from_json_str(
            r#"{
                "tree": [[0, 1, 2], [1], [2]],
                "root": 0,
                "attributes": {
                    "1": { "weight": 3.0, "name": "left" },
                    "9": { "weight": 1.0 }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(data.tree.len(), 3);
        assert_eq!(data.attributes[&1].name.as_deref(), Some("left"));
        let tree = TreeBuilder::from(data).build().unwrap();
        assert_eq!(tree.weight(NodeId::new(1)), Some(3.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn malformed_json_is_an_error() {
        let err = TreeData::from_json_str("{ \"tree\": 5 }").unwrap_err();
        assert!(matches!(err, crate::TreemapError::Json(_)));
    }
}
