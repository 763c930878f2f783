use std::collections::{hash_map, HashMap};

use crate::{api::Post, NodeRef, NodeStore, RetryQueue, ThreadNode};

/// A whole channel, rebuilt from one full fetch
#[derive(Clone, Debug, Default)]
pub struct BulkLoad {
    pub store: NodeStore,

    /// Messages whose parent was not part of the batch
    pub orphans: RetryQueue,

    /// Depth-first reading order, with each message's depth
    pub order: Vec<(String, usize)>,
}

impl BulkLoad {
    pub fn new(mut posts: Vec<Post>) -> BulkLoad {
        // Stable, so equal timestamps keep the order the server gave
        posts.sort_by_key(|p| p.created_at());

        let mut by_path = HashMap::with_capacity(posts.len());
        let mut children: HashMap<String, Vec<NodeRef>> = HashMap::new();
        let mut top_level = Vec::new();
        for post in posts {
            match by_path.entry(post.path.clone()) {
                hash_map::Entry::Occupied(mut e) => {
                    tracing::warn!(path = %post.path, "post listed twice in channel fetch");
                    e.insert(post);
                }
                hash_map::Entry::Vacant(e) => {
                    let node_ref = NodeRef::of(&post);
                    match post.parent_path() {
                        None => top_level.push(node_ref),
                        Some(parent) => children
                            .entry(String::from(parent))
                            .or_default()
                            .push(node_ref),
                    }
                    e.insert(post);
                }
            }
        }

        let mut res = BulkLoad::default();
        let mut stack = top_level.iter().rev().map(|r| (r.path.clone(), 0)).collect::<Vec<_>>();
        *res.store.top_level_mut() = top_level;
        while let Some((path, depth)) = stack.pop() {
            let message = match by_path.remove(&path) {
                Some(message) => message,
                None => continue,
            };
            let kids = children.remove(&path).unwrap_or_default();
            stack.extend(kids.iter().rev().map(|c| (c.path.clone(), depth + 1)));
            res.store.set(
                path.clone(),
                ThreadNode {
                    message,
                    children: kids,
                },
            );
            res.order.push((path, depth));
        }

        // Whatever was not reached from a top-level message hangs off a missing parent
        let mut orphans = by_path.into_values().collect::<Vec<_>>();
        orphans.sort_by_key(|p| p.created_at());
        if !orphans.is_empty() {
            tracing::debug!(num_orphans = orphans.len(), "channel fetch has replies to unknown posts");
        }
        for p in orphans {
            res.orphans.enqueue(p);
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(load: &BulkLoad) -> Vec<(&str, usize)> {
        load.order.iter().map(|(p, d)| (p.as_str(), *d)).collect()
    }

    #[test]
    fn example_channel() {
        let load = BulkLoad::new(vec![
            Post::stub("1", None, 10),
            Post::stub("2", Some("1"), 20),
            Post::stub("3", None, 5),
        ]);
        assert_eq!(order(&load), vec![("3", 0), ("1", 0), ("2", 1)]);
        assert_eq!(
            load.store.top_level().iter().map(|r| r.path.as_str()).collect::<Vec<_>>(),
            vec!["3", "1"]
        );
        assert_eq!(load.store.get("1").unwrap().children, vec![NodeRef::of(&Post::stub("2", Some("1"), 20))]);
        assert_eq!(order(&load), load.store.render_order());
        assert!(load.orphans.is_empty());
    }

    #[test]
    fn replies_before_next_sibling() {
        let load = BulkLoad::new(vec![
            Post::stub("b", None, 2),
            Post::stub("a1", Some("a"), 3),
            Post::stub("a", None, 1),
            Post::stub("a1x", Some("a1"), 6),
            Post::stub("b1", Some("b"), 4),
            Post::stub("a2", Some("a"), 5),
        ]);
        assert_eq!(
            order(&load),
            vec![("a", 0), ("a1", 1), ("a1x", 2), ("a2", 1), ("b", 0), ("b1", 1)]
        );
    }

    #[test]
    fn orphans_are_queued_not_rendered() {
        let load = BulkLoad::new(vec![
            Post::stub("a", None, 1),
            Post::stub("x", Some("missing"), 2),
            Post::stub("x1", Some("x"), 3),
        ]);
        assert_eq!(order(&load), vec![("a", 0)]);
        assert_eq!(load.store.len(), 1);
        assert_eq!(load.orphans.len(), 2);
        assert!(load.orphans.contains("x") && load.orphans.contains("x1"));
    }

    #[test]
    fn duplicates_keep_first_position_last_content() {
        let mut edited = Post::stub("a", None, 1);
        edited.doc.msg = Some(String::from("edited"));
        let load = BulkLoad::new(vec![Post::stub("a", None, 1), Post::stub("b", None, 2), edited]);
        assert_eq!(order(&load), vec![("a", 0), ("b", 0)]);
        assert_eq!(load.store.get("a").unwrap().message.text(), "edited");
    }
}
