use std::collections::HashSet;

use crate::node::NodeId;
use crate::tree_item::TreeItem;

/// A flattened item of all visible [`TreeItem`]s.
///
/// Generated via [`TreeState::flatten`](crate::TreeState::flatten).
#[must_use]
pub struct Flattened<'a> {
    pub identifier: Vec<NodeId>,
    pub item: &'a TreeItem<'a>,
}

impl<'a> Flattened<'a> {
    /// Zero based depth. Depth 0 means top level with 0 indentation.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.identifier.len() - 1
    }
}

/// Get a flat list of all visible [`TreeItem`]s.
///
/// Children are only included when their parent is in `opened`.
#[must_use]
pub fn flatten<'a>(opened: &HashSet<Vec<NodeId>>, items: &'a [TreeItem<'a>]) -> Vec<Flattened<'a>> {
    flatten_below(opened, items, &[])
}

fn flatten_below<'a>(
    opened: &HashSet<Vec<NodeId>>,
    items: &'a [TreeItem<'a>],
    current: &[NodeId],
) -> Vec<Flattened<'a>> {
    let mut result = Vec::new();
    for item in items {
        let mut child_identifier = current.to_vec();
        child_identifier.push(item.identifier);

        let child_result = opened
            .contains(&child_identifier)
            .then(|| flatten_below(opened, &item.children, &child_identifier));

        result.push(Flattened {
            identifier: child_identifier,
            item,
        });

        if let Some(mut child_result) = child_result {
            result.append(&mut child_result);
        }
    }
    result
}
