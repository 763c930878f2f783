use crate::NodeRef;

/// Where a node landed in its sibling list
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Insertion {
    pub index: usize,

    /// Sibling right before the new node, if any
    pub preceding: Option<String>,

    /// Sibling right after the new node, if any
    pub following: Option<String>,
}

/// Inserts `node` into `siblings`, which must be sorted by creation time
///
/// Nodes with the same creation time keep their arrival order: the new node
/// goes after all the ones already there with an equal timestamp.
pub fn insert_sorted(siblings: &mut Vec<NodeRef>, node: NodeRef) -> Insertion {
    let index = siblings.partition_point(|s| s.created_at <= node.created_at);
    siblings.insert(index, node);
    Insertion {
        index,
        preceding: index.checked_sub(1).map(|i| siblings[i].path.clone()),
        following: siblings.get(index + 1).map(|s| s.path.clone()),
    }
}
