use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::api::{NewPost, PatchOp, PatchResponse, Post, Uri};

/// Raw payloads of a live feed, in the order the server sent them
///
/// An error item means the connection is lost.
pub type PayloadStream = BoxStream<'static, anyhow::Result<String>>;

/// Whatever carries requests to the chat server
#[async_trait]
pub trait Transport {
    /// All the posts of a channel, in no particular order
    async fn fetch_posts(&self, workspace: &str, channel: &str) -> anyhow::Result<Vec<Post>>;

    async fn subscribe(&self, workspace: &str, channel: &str) -> anyhow::Result<PayloadStream>;

    async fn create_post(
        &self,
        workspace: &str,
        channel: &str,
        post: NewPost,
    ) -> anyhow::Result<Uri>;

    async fn patch_post(&self, path: &str, ops: Vec<PatchOp>) -> anyhow::Result<PatchResponse>;
}
