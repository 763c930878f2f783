use crate::{
    api::Post, insert_sorted, placement, BulkLoad, MessageView, NodeRef, NodeStore, Placement,
    RetryQueue, Surface, ThreadNode,
};

/// What happened to a message handed to [`ChannelSession::render_message`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Arrival {
    /// Already known, its contents and reactions got refreshed in place
    Updated,

    /// Added to the thread tree
    Inserted,

    /// Its parent is not known yet, it waits in the retry queue
    Queued,
}

/// Everything displayed for one channel
///
/// Switching channels means dropping the session and building a new one, so
/// nothing of the previous channel can leak into the new view.
#[derive(Debug)]
pub struct ChannelSession<S> {
    workspace: String,
    channel: String,
    store: NodeStore,
    retry: RetryQueue,
    surface: S,
}

impl<S: Surface> ChannelSession<S> {
    pub fn new(workspace: String, channel: String, mut surface: S) -> ChannelSession<S> {
        surface.clear();
        ChannelSession {
            workspace,
            channel,
            store: NodeStore::new(),
            retry: RetryQueue::new(),
            surface,
        }
    }

    /// Builds the session from a full fetch of the channel
    pub fn from_posts(
        workspace: String,
        channel: String,
        posts: Vec<Post>,
        surface: S,
    ) -> ChannelSession<S> {
        let mut res = ChannelSession::new(workspace, channel, surface);
        res.display_posts(posts);
        res
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn retry_queue(&self) -> &RetryQueue {
        &self.retry
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn post(&self, path: &str) -> Option<&Post> {
        self.store.get(path).map(|n| &n.message)
    }

    /// Replaces the whole view with `posts`
    pub fn display_posts(&mut self, posts: Vec<Post>) {
        let BulkLoad {
            store,
            orphans,
            order,
        } = BulkLoad::new(posts);
        self.surface.clear();
        for (path, depth) in order {
            if let Some(node) = store.get(&path) {
                self.surface.append(MessageView::new(&node.message, depth));
            }
        }
        tracing::debug!(
            workspace = %self.workspace,
            channel = %self.channel,
            num_posts = store.len(),
            num_orphans = orphans.len(),
            "displayed channel",
        );
        self.store = store;
        self.retry = orphans;
    }

    /// Handles one message coming from the live feed
    pub fn render_message(&mut self, post: Post) -> Arrival {
        let path = post.path.clone();
        match self.try_insert(post) {
            Ok(arrival) => {
                // An older copy might still wait for a parent that will never be used
                self.retry.remove(&path);
                if arrival == Arrival::Inserted {
                    let resolved = self.process_retry_queue();
                    if resolved > 0 {
                        tracing::debug!(%path, resolved, "arrival unblocked queued messages");
                    }
                }
                arrival
            }
            Err(post) => {
                tracing::debug!(%path, parent = ?post.parent_path(), "parent not known yet, queueing message");
                self.retry.enqueue(post);
                Arrival::Queued
            }
        }
    }

    fn process_retry_queue(&mut self) -> usize {
        if self.retry.is_empty() {
            return 0;
        }
        let mut queue = std::mem::take(&mut self.retry);
        let resolved = queue.drain_with(|post| self.try_insert(post).map(|_| ()));
        self.retry = queue;
        resolved
    }

    /// Updates or inserts `post`, handing it back if its parent is unknown
    fn try_insert(&mut self, post: Post) -> Result<Arrival, Post> {
        if let Some(node) = self.store.get_mut(&post.path) {
            if node.message.created_at() != post.created_at() {
                tracing::warn!(
                    path = %post.path,
                    old = node.message.created_at(),
                    new = post.created_at(),
                    "creation time changed, keeping the message where it is",
                );
            }
            if node.message.parent_path() != post.parent_path() {
                tracing::warn!(
                    path = %post.path,
                    old = ?node.message.parent_path(),
                    new = ?post.parent_path(),
                    "parent changed, keeping the message where it is",
                );
            }
            // Position in the tree is fixed: only content and reactions move over
            let Post { doc, meta, .. } = post;
            let stored = &mut node.message;
            stored.doc.msg = doc.msg;
            stored.doc.reactions = doc.reactions;
            stored.doc.extensions = doc.extensions;
            stored.meta.last_modified_by = meta.last_modified_by;
            stored.meta.last_modified_at = meta.last_modified_at;
            if let Err(err) = self.surface.update(&node.message) {
                tracing::warn!(%err, "failed refreshing reactions");
            }
            return Ok(Arrival::Updated);
        }

        let node_ref = NodeRef::of(&post);
        let insertion = match post.parent_path().map(String::from) {
            None => insert_sorted(self.store.top_level_mut(), node_ref),
            Some(parent) => match self.store.get_mut(&parent) {
                Some(parent) => insert_sorted(&mut parent.children, node_ref),
                None => return Err(post),
            },
        };
        let path = post.path.clone();
        self.store.set(path.clone(), ThreadNode::new(post));
        let placement = placement::resolve(&self.store, &path, &insertion);
        self.place(placement);
        Ok(Arrival::Inserted)
    }

    fn place(&mut self, placement: Placement) {
        let node = match self.store.get(&placement.path) {
            Some(node) => node,
            None => return,
        };
        let view = MessageView::new(&node.message, placement.depth);
        if let Err(err) = self.surface.insert(view, &placement.anchor) {
            // eg. the view got swapped for another channel's in the meantime
            tracing::warn!(path = %placement.path, %err, "aborting placement of message");
        }
    }
}
