use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chatter_client::{
    api::{self, Error, NewPost, PatchOp, PatchResponse, Post, Uri},
    PayloadStream, Transport,
};
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use reqwest::header;

use crate::config::ClientConfig;

/// Talks to the chat server over HTTP
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> HttpTransport {
        HttpTransport {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn channel_url(&self, workspace: &str, channel: &str) -> anyhow::Result<reqwest::Url> {
        self.config.posts_url(&api::channel_posts_path(workspace, channel))
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> anyhow::Result<reqwest::Response> {
        let resp = req
            .bearer_auth(&self.config.token.token)
            .send()
            .await
            .context("sending request to server")?;
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.bytes().await.context("reading error body")?;
        match Error::parse(&body) {
            Ok(err) => Err(err.into()),
            Err(parse_err) => {
                tracing::debug!(?parse_err, "server error body is not a known error");
                Err(anyhow!("server answered with status {status}"))
            }
        }
    }
}

/// Data of each server-sent event, keep-alives included as empty strings
pub fn sse_payloads<S, B, E>(bytes: S) -> impl Stream<Item = anyhow::Result<String>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    bytes.eventsource().map(|event| match event {
        Ok(event) => Ok(event.data),
        Err(e) => Err(anyhow!("reading event stream: {e}")),
    })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_posts(&self, workspace: &str, channel: &str) -> anyhow::Result<Vec<Post>> {
        let url = self.channel_url(workspace, channel)?;
        let posts: Vec<Post> = self
            .send(self.client.get(url))
            .await?
            .json()
            .await
            .context("parsing channel posts")?;
        for p in posts.iter() {
            p.validate()?;
        }
        Ok(posts)
    }

    async fn subscribe(&self, workspace: &str, channel: &str) -> anyhow::Result<PayloadStream> {
        let url = self.channel_url(workspace, channel)?;
        let resp = self
            .send(
                self.client
                    .get(url)
                    .query(&[("mode", "subscribe")])
                    .header(header::ACCEPT, "text/event-stream"),
            )
            .await?;
        Ok(sse_payloads(resp.bytes_stream()).boxed())
    }

    async fn create_post(
        &self,
        workspace: &str,
        channel: &str,
        post: NewPost,
    ) -> anyhow::Result<Uri> {
        let url = self.channel_url(workspace, channel)?;
        self.send(self.client.post(url).json(&post))
            .await?
            .json()
            .await
            .context("parsing created post location")
    }

    async fn patch_post(&self, path: &str, ops: Vec<PatchOp>) -> anyhow::Result<PatchResponse> {
        let url = self.config.posts_url(path)?;
        self.send(self.client.patch(url).json(&ops))
            .await?
            .json()
            .await
            .context("parsing patch response")
    }
}
