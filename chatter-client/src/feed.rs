use futures::{
    stream::{AbortHandle, Abortable},
    StreamExt,
};

use crate::{api::Post, PayloadStream};

/// Live subscription to a channel
pub struct Feed {
    stream: Abortable<PayloadStream>,
    handle: AbortHandle,
}

impl Feed {
    pub fn new(stream: PayloadStream) -> Feed {
        let (handle, registration) = AbortHandle::new_pair();
        Feed {
            stream: Abortable::new(stream, registration),
            handle,
        }
    }

    /// Handle that can cancel this feed from elsewhere
    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.clone()
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Next well-formed post, or `None` once the feed is over
    ///
    /// Empty payloads are keep-alives, malformed ones get dropped: neither
    /// stops the feed. A connection error does.
    pub async fn next_post(&mut self) -> Option<Post> {
        loop {
            let payload = match self.stream.next().await? {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::error!(?err, "live feed connection error");
                    self.cancel();
                    return None;
                }
            };
            if payload.trim().is_empty() {
                continue;
            }
            match Post::parse(&payload) {
                Ok(post) => return Some(post),
                Err(err) => tracing::warn!(%err, "dropping malformed live feed payload"),
            }
        }
    }
}

impl std::fmt::Debug for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feed").finish_non_exhaustive()
    }
}
