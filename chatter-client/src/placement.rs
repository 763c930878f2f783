use crate::{Insertion, NodeStore};

/// Existing element next to which a new element gets inserted
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Anchor {
    /// Very beginning of the channel view
    Start,
    After(String),
    Before(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Placement {
    pub path: String,
    pub anchor: Anchor,

    /// Reply depth, used for indentation
    pub depth: usize,
}

/// Computes where the element of `path` goes, once it is in `store` at `insertion`
///
/// The view lists messages depth-first, so a new message goes right after
/// the whole subtree of its preceding sibling. A new first reply goes before
/// the previous first reply, which is also right after the parent.
pub fn resolve(store: &NodeStore, path: &str, insertion: &Insertion) -> Placement {
    let parent = store.get(path).and_then(|n| n.message.parent_path());
    let anchor = match (&insertion.preceding, parent, &insertion.following) {
        (Some(preceding), _, _) => Anchor::After(String::from(store.deepest_descendant(preceding))),
        (None, None, _) => Anchor::Start,
        (None, Some(_), Some(previous_first)) => Anchor::Before(previous_first.clone()),
        (None, Some(parent), None) => Anchor::After(String::from(parent)),
    };
    Placement {
        path: String::from(path),
        anchor,
        depth: store.depth(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::Post, insert_sorted, NodeRef, ThreadNode};

    fn add(store: &mut NodeStore, post: Post) -> Placement {
        let node_ref = NodeRef::of(&post);
        let insertion = match post.parent_path() {
            None => insert_sorted(store.top_level_mut(), node_ref),
            Some(parent) => insert_sorted(&mut store.get_mut(parent).unwrap().children, node_ref),
        };
        let path = post.path.clone();
        store.set(path.clone(), ThreadNode::new(post));
        resolve(store, &path, &insertion)
    }

    fn after(path: &str) -> Anchor {
        Anchor::After(String::from(path))
    }

    #[test]
    fn top_level() {
        let mut store = NodeStore::new();
        assert_eq!(add(&mut store, Post::stub("b", None, 20)).anchor, Anchor::Start);
        assert_eq!(add(&mut store, Post::stub("a", None, 10)).anchor, Anchor::Start);
        assert_eq!(add(&mut store, Post::stub("c", None, 30)).anchor, after("b"));
    }

    #[test]
    fn first_reply_goes_after_parent() {
        let mut store = NodeStore::new();
        add(&mut store, Post::stub("a", None, 10));
        let p = add(&mut store, Post::stub("r", Some("a"), 20));
        assert_eq!(p.anchor, after("a"));
        assert_eq!(p.depth, 1);
    }

    #[test]
    fn earlier_reply_goes_before_previous_first() {
        let mut store = NodeStore::new();
        add(&mut store, Post::stub("a", None, 10));
        add(&mut store, Post::stub("r2", Some("a"), 30));
        add(&mut store, Post::stub("r2.1", Some("r2"), 40));
        let p = add(&mut store, Post::stub("r1", Some("a"), 20));
        assert_eq!(p.anchor, Anchor::Before(String::from("r2")));
    }

    #[test]
    fn after_deepest_descendant_of_preceding() {
        // a
        // +- b
        // |  +- b1
        // |     +- b11
        // +- c      <- new
        let mut store = NodeStore::new();
        add(&mut store, Post::stub("a", None, 1));
        add(&mut store, Post::stub("b", Some("a"), 2));
        add(&mut store, Post::stub("b1", Some("b"), 3));
        add(&mut store, Post::stub("b11", Some("b1"), 4));
        let p = add(&mut store, Post::stub("c", Some("a"), 5));
        assert_eq!(p.anchor, after("b11"));
        assert_eq!(p.depth, 1);

        // New top-level message goes after the whole thread of a
        let p = add(&mut store, Post::stub("z", None, 6));
        assert_eq!(p.anchor, after("c"));
        assert_eq!(p.depth, 0);
    }
}
