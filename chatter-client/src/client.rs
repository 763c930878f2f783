use anyhow::{anyhow, Context};

use crate::{
    api::{Error, NewPost, PatchOp, ReactionKind, Uri},
    Arrival, ChannelSession, Feed, Surface, Transport,
};

/// Keeps one channel on display and in sync with the server
pub struct Client<T, S> {
    transport: T,
    session: Option<ChannelSession<S>>,
    feed: Option<Feed>,
}

impl<T: Transport, S: Surface + Default> Client<T, S> {
    pub fn new(transport: T) -> Client<T, S> {
        Client {
            transport,
            session: None,
            feed: None,
        }
    }

    pub fn session(&self) -> Option<&ChannelSession<S>> {
        self.session.as_ref()
    }

    /// Displays `channel` and starts following its live feed
    ///
    /// The previous channel's feed is cancelled first, so none of its
    /// messages can end up in the new view.
    pub async fn open_channel(&mut self, workspace: &str, channel: &str) -> anyhow::Result<()> {
        self.close_channel();
        let posts = self
            .transport
            .fetch_posts(workspace, channel)
            .await
            .with_context(|| format!("fetching posts of channel {workspace}/{channel}"))?;
        let session = ChannelSession::from_posts(
            String::from(workspace),
            String::from(channel),
            posts,
            S::default(),
        );
        let stream = self
            .transport
            .subscribe(workspace, channel)
            .await
            .with_context(|| format!("subscribing to channel {workspace}/{channel}"))?;
        tracing::info!(
            %workspace,
            %channel,
            num_posts = session.store().len(),
            "opened channel",
        );
        self.session = Some(session);
        self.feed = Some(Feed::new(stream));
        Ok(())
    }

    /// Stops following the open channel, whether or not its feed already ended
    pub fn close_channel(&mut self) {
        let feed_was_live = match self.feed.take() {
            Some(feed) => {
                feed.cancel();
                true
            }
            None => false,
        };
        if let Some(session) = self.session.take() {
            tracing::debug!(
                workspace = %session.workspace(),
                channel = %session.channel(),
                feed_was_live,
                "closed channel",
            );
        }
    }

    /// Waits for the next live message and renders it
    ///
    /// Returns `None` once there is no open channel or its feed is over.
    pub async fn next_arrival(&mut self) -> Option<Arrival> {
        let post = match self.feed.as_mut()?.next_post().await {
            Some(post) => post,
            None => {
                self.feed = None;
                return None;
            }
        };
        let session = self.session.as_mut()?;
        Some(session.render_message(post))
    }

    /// Renders live messages until the feed ends, returning how many were handled
    pub async fn run_feed(&mut self) -> usize {
        let mut handled = 0;
        while self.next_arrival().await.is_some() {
            handled += 1;
        }
        tracing::debug!(handled, "live feed ended");
        handled
    }

    /// Posts `msg` in the open channel, as a reply to `parent` if set
    pub async fn post_message(&self, msg: String, parent: Option<String>) -> anyhow::Result<Uri> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| anyhow!("no channel is open"))?;
        let post = NewPost { msg, parent };
        post.validate()?;
        self.transport
            .create_post(session.workspace(), session.channel(), post)
            .await
            .context("creating post")
    }

    /// Adds `user`'s `kind` reaction to the post, or removes it if already there
    ///
    /// Returns whether the reaction is now set.
    pub async fn toggle_reaction(
        &self,
        path: &str,
        kind: ReactionKind,
        user: &str,
    ) -> anyhow::Result<bool> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| anyhow!("no channel is open"))?;
        // The displayed copy may be stale, so decide on a fresh one
        let posts = self
            .transport
            .fetch_posts(session.workspace(), session.channel())
            .await
            .context("fetching posts to react to")?;
        let post = posts
            .iter()
            .find(|p| p.path == path)
            .ok_or_else(|| Error::NotFound(String::from(path)))?;
        let remove = post.has_reacted(kind.as_str(), user);
        let res = self
            .transport
            .patch_post(path, PatchOp::reaction(kind.as_str(), user, remove))
            .await
            .with_context(|| format!("patching reactions of {path}"))?;
        if res.patch_failed {
            return Err(Error::PatchFailed(res.message).into());
        }
        tracing::debug!(%path, %kind, %user, remove, "toggled reaction");
        Ok(!remove)
    }
}

impl<T, S> Drop for Client<T, S> {
    fn drop(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.cancel();
        }
    }
}
