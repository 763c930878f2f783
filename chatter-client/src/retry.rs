use crate::api::Post;

/// Messages waiting for their parent to show up
#[derive(Clone, Debug, Default)]
pub struct RetryQueue {
    pending: Vec<Post>,
}

impl RetryQueue {
    pub fn new() -> RetryQueue {
        RetryQueue::default()
    }

    /// Queues `post`, replacing any queued message with the same path
    ///
    /// Returns `false` if a message with this path was already queued.
    pub fn enqueue(&mut self, post: Post) -> bool {
        match self.pending.iter_mut().find(|p| p.path == post.path) {
            Some(queued) => {
                *queued = post;
                false
            }
            None => {
                self.pending.push(post);
                true
            }
        }
    }

    pub fn remove(&mut self, path: &str) -> Option<Post> {
        let idx = self.pending.iter().position(|p| p.path == path)?;
        Some(self.pending.remove(idx))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.pending.iter().any(|p| p.path == path)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.pending.iter()
    }

    /// Offers every queued message to `attempt` until a whole pass resolves nothing
    ///
    /// `attempt` hands the message back when it still cannot be placed. Each
    /// pass can unblock messages of the next one, so chains of replies that
    /// arrived before their ancestors all resolve in a single call. Returns
    /// the number of messages that left the queue.
    pub fn drain_with<F>(&mut self, mut attempt: F) -> usize
    where
        F: FnMut(Post) -> Result<(), Post>,
    {
        let mut resolved = 0;
        loop {
            let mut progress = false;
            for post in std::mem::take(&mut self.pending) {
                match attempt(post) {
                    Ok(()) => {
                        resolved += 1;
                        progress = true;
                    }
                    Err(post) => self.pending.push(post),
                }
            }
            if !progress || self.pending.is_empty() {
                return resolved;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn no_duplicate_paths() {
        let mut q = RetryQueue::new();
        assert!(q.enqueue(Post::stub("a", Some("p"), 1)));
        let mut newer = Post::stub("a", Some("p"), 1);
        newer.doc.msg = Some(String::from("edited"));
        assert!(!q.enqueue(newer));
        assert_eq!(q.len(), 1);
        assert_eq!(q.iter().next().unwrap().text(), "edited");
    }

    #[test]
    fn remove_keeps_arrival_order() {
        let mut q = RetryQueue::new();
        for path in ["a", "b", "c", "d"] {
            q.enqueue(Post::stub(path, Some("p"), 1));
        }
        assert_eq!(q.remove("a").unwrap().path, "a");
        assert!(q.remove("a").is_none());
        let order = q.iter().map(|p| p.path.as_str()).collect::<Vec<_>>();
        assert_eq!(order, vec!["b", "c", "d"]);
    }

    #[test]
    fn drain_resolves_chains_in_one_call() {
        // c waits for b which waits for a, queued in the worst order
        let mut q = RetryQueue::new();
        q.enqueue(Post::stub("c", Some("b"), 3));
        q.enqueue(Post::stub("b", Some("a"), 2));
        q.enqueue(Post::stub("orphan", Some("nowhere"), 4));

        let mut known = HashSet::from([String::from("a")]);
        let mut passes = Vec::new();
        let resolved = q.drain_with(|post| {
            passes.push(post.path.clone());
            match known.contains(post.parent_path().unwrap()) {
                true => {
                    known.insert(post.path);
                    Ok(())
                }
                false => Err(post),
            }
        });

        assert_eq!(resolved, 2);
        assert!(known.contains("c"));
        assert_eq!(q.len(), 1);
        assert!(q.contains("orphan"));
        // c, b, orphan, then c, orphan, then orphan alone finds nothing
        assert_eq!(passes.len(), 6);
    }

    #[test]
    fn drain_stops_when_nothing_resolves() {
        let mut q = RetryQueue::new();
        q.enqueue(Post::stub("x", Some("y"), 1));
        let mut calls = 0;
        assert_eq!(
            q.drain_with(|p| {
                calls += 1;
                Err(p)
            }),
            0
        );
        assert_eq!(calls, 1);
        assert_eq!(q.len(), 1);
    }
}
