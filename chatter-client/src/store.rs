use std::collections::HashMap;

use crate::api::{Post, Time};

/// Reference to a node from its parent's children list or from the top-level list
///
/// The creation time is cached here so that sibling lists can be searched
/// without going back to the store. It never changes for a given path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NodeRef {
    pub path: String,
    pub created_at: Time,
}

impl NodeRef {
    pub fn of(post: &Post) -> NodeRef {
        NodeRef {
            path: post.path.clone(),
            created_at: post.created_at(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThreadNode {
    pub message: Post,

    /// Direct replies, by increasing creation time then arrival order
    pub children: Vec<NodeRef>,
}

impl ThreadNode {
    pub fn new(message: Post) -> ThreadNode {
        ThreadNode {
            message,
            children: Vec::new(),
        }
    }
}

/// Every message seen so far in a channel, keyed by path
///
/// Nodes only point to their children by path, the way back up being the
/// message's parent path, so there is no ownership cycle.
#[derive(Clone, Debug, Default)]
pub struct NodeStore {
    nodes: HashMap<String, ThreadNode>,

    /// Parentless nodes, by increasing creation time then arrival order
    top_level: Vec<NodeRef>,
}

impl NodeStore {
    pub fn new() -> NodeStore {
        NodeStore::default()
    }

    pub fn get(&self, path: &str) -> Option<&ThreadNode> {
        self.nodes.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut ThreadNode> {
        self.nodes.get_mut(path)
    }

    pub fn set(&mut self, path: String, node: ThreadNode) {
        self.nodes.insert(path, node);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn top_level(&self) -> &[NodeRef] {
        &self.top_level
    }

    pub(crate) fn top_level_mut(&mut self) -> &mut Vec<NodeRef> {
        &mut self.top_level
    }

    /// Number of replies between this message and its top-level ancestor
    pub fn depth(&self, path: &str) -> usize {
        let mut depth = 0;
        let mut current = self.nodes.get(path).and_then(|n| n.message.parent_path());
        while let Some(parent) = current {
            let node = match self.nodes.get(parent) {
                Some(node) => node,
                None => break,
            };
            depth += 1;
            if depth > self.nodes.len() {
                tracing::error!(path, "parent chain loops back onto itself");
                break;
            }
            current = node.message.parent_path();
        }
        depth
    }

    /// Last child's last child's ... last child of `path`, or `path` itself
    ///
    /// This is the last element of the subtree in reading order.
    pub fn deepest_descendant<'a>(&'a self, path: &'a str) -> &'a str {
        let mut current = path;
        while let Some(last) = self.nodes.get(current).and_then(|n| n.children.last()) {
            current = &last.path;
        }
        current
    }

    /// Depth-first reading order of the whole channel, with each message's depth
    pub fn render_order(&self) -> Vec<(&str, usize)> {
        let mut res = Vec::with_capacity(self.nodes.len());
        let mut stack = self
            .top_level
            .iter()
            .rev()
            .map(|r| (r.path.as_str(), 0))
            .collect::<Vec<_>>();
        while let Some((path, depth)) = stack.pop() {
            res.push((path, depth));
            if let Some(node) = self.nodes.get(path) {
                stack.extend(node.children.iter().rev().map(|c| (c.path.as_str(), depth + 1)));
            }
        }
        res
    }
}
