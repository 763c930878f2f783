use anyhow::{anyhow, Context};
use chatter_client::api::AuthToken;
use reqwest::Url;

/// Where the chat server lives and how to talk to it
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub host: Url,

    /// Prefix of every post path on the server, eg. `/posts`
    pub posts_base: String,

    pub token: AuthToken,

    /// Spaces of indentation per reply level when printing a channel
    pub indent: usize,
}

impl ClientConfig {
    pub fn new(
        host: &str,
        posts_base: String,
        token: AuthToken,
        indent: usize,
    ) -> anyhow::Result<ClientConfig> {
        let host = Url::parse(host).with_context(|| format!("parsing host URL {host:?}"))?;
        if host.cannot_be_a_base() {
            return Err(anyhow!("host URL {host} cannot hold paths"));
        }
        Ok(ClientConfig {
            host,
            posts_base,
            token,
            indent,
        })
    }

    /// URL of `path` below the posts base, every segment percent-encoded
    pub fn posts_url(&self, path: &str) -> anyhow::Result<Url> {
        let mut url = self.host.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("host URL {} cannot hold paths", self.host))?
            .pop_if_empty()
            .extend(self.posts_base.split('/').filter(|s| !s.is_empty()))
            .extend(path.split('/').filter(|s| !s.is_empty()));
        if path.ends_with('/') {
            url.path_segments_mut()
                .map_err(|()| anyhow!("host URL {} cannot hold paths", self.host))?
                .push("");
        }
        Ok(url)
    }
}

/// Token to send to the server, from the `CHATTER_TOKEN` environment variable
pub fn env_token() -> anyhow::Result<AuthToken> {
    let token =
        std::env::var("CHATTER_TOKEN").context("retrieving CHATTER_TOKEN environment variable")?;
    Ok(AuthToken { token })
}
