use std::sync::Arc;

use async_trait::async_trait;
use chatter_client::{
    api::{AuthToken, NewPost, PatchOp, PatchResponse, Post, Uri},
    PayloadStream, Transport,
};
use futures::StreamExt;
use tokio::sync::Mutex;

use crate::MockServer;

/// Talks to a [`MockServer`] living in the same process, as one logged-in user
#[derive(Clone)]
pub struct MockTransport {
    server: Arc<Mutex<MockServer>>,
    token: AuthToken,
}

impl MockTransport {
    pub fn new(server: Arc<Mutex<MockServer>>, token: AuthToken) -> MockTransport {
        MockTransport { server, token }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch_posts(&self, workspace: &str, channel: &str) -> anyhow::Result<Vec<Post>> {
        let server = self.server.lock().await;
        Ok(server.fetch_posts(&self.token, workspace, channel)?)
    }

    async fn subscribe(&self, workspace: &str, channel: &str) -> anyhow::Result<PayloadStream> {
        let receiver = self
            .server
            .lock()
            .await
            .subscribe(&self.token, workspace, channel)?;
        Ok(futures::stream::unfold(receiver, |mut r| async move {
            r.recv().await.map(|payload| (Ok(payload), r))
        })
        .boxed())
    }

    async fn create_post(
        &self,
        workspace: &str,
        channel: &str,
        post: NewPost,
    ) -> anyhow::Result<Uri> {
        let mut server = self.server.lock().await;
        Ok(server.create_post(&self.token, workspace, channel, post)?)
    }

    async fn patch_post(&self, path: &str, ops: Vec<PatchOp>) -> anyhow::Result<PatchResponse> {
        let mut server = self.server.lock().await;
        Ok(server.patch_post(&self.token, path, ops)?)
    }
}
