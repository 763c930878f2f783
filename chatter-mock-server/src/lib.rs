use std::collections::{btree_map, BTreeMap, HashSet};

use chatter_client::api::{
    self, AuthToken, Error, NewPost, NewSession, PatchOp, PatchOpKind, PatchResponse, Post,
    PostDoc, PostMeta, Time, Uri, Uuid,
};
use tokio::sync::mpsc;

mod transport;
pub use transport::MockTransport;

#[cfg(test)]
mod tests;

/// First timestamp handed out by [`MockServer::create_post`]
pub const START_TIME: Time = 1_600_000_000_000;

pub struct MockServer {
    users: BTreeMap<String, DbUser>,
    channels: BTreeMap<(String, String), DbChannel>,
    now: Time,
}

#[derive(Debug)]
struct DbUser {
    pass: String,
    sessions: HashSet<AuthToken>,
}

#[derive(Debug, Default)]
struct DbChannel {
    // in creation order, which is what a real server sends too
    posts: Vec<Post>,
    feeds: Vec<mpsc::UnboundedSender<String>>,
}

impl DbChannel {
    fn relay(&mut self, payload: String) {
        self.feeds.retain_mut(|f| matches!(f.send(payload.clone()), Ok(())));
    }

    fn relay_post(&mut self, post: &Post) {
        match serde_json::to_string(post) {
            Ok(payload) => self.relay(payload),
            Err(err) => tracing::error!(?err, path = %post.path, "failed serializing post"),
        }
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            users: BTreeMap::new(),
            channels: BTreeMap::new(),
            now: START_TIME,
        }
    }

    /// Return the number of live feeds still registered on a channel
    pub fn test_num_feeds(&self, workspace: &str, channel: &str) -> usize {
        self.channel(workspace, channel)
            .map(|c| c.feeds.len())
            .unwrap_or(0)
    }

    /// Send `payload` as-is to everyone following the channel
    pub fn test_inject_raw(&mut self, workspace: &str, channel: &str, payload: &str) {
        if let Ok(c) = self.channel_mut(workspace, channel) {
            c.relay(String::from(payload));
        }
    }

    pub fn admin_create_user(&mut self, name: String, password: String) -> Result<(), Error> {
        api::validate_string(&name)?;
        api::validate_string(&password)?;
        match self.users.entry(name) {
            btree_map::Entry::Occupied(e) => Err(Error::NameAlreadyUsed(e.key().clone())),
            btree_map::Entry::Vacant(e) => {
                e.insert(DbUser {
                    pass: password,
                    sessions: HashSet::new(),
                });
                Ok(())
            }
        }
    }

    pub fn auth(&mut self, s: NewSession) -> Result<AuthToken, Error> {
        s.validate()?;
        match self.users.get_mut(&s.username) {
            Some(u) if u.pass == s.password => {
                let tok = AuthToken::generate();
                u.sessions.insert(tok.clone());
                Ok(tok)
            }
            _ => Err(Error::PermissionDenied),
        }
    }

    pub fn unauth(&mut self, tok: &AuthToken) -> Result<(), Error> {
        for u in self.users.values_mut() {
            if u.sessions.remove(tok) {
                return Ok(());
            }
        }
        Err(Error::PermissionDenied)
    }

    /// Name of the user owning `tok`
    pub fn whoami(&self, tok: &AuthToken) -> Result<&str, Error> {
        self.users
            .iter()
            .find(|(_, u)| u.sessions.contains(tok))
            .map(|(name, _)| name.as_str())
            .ok_or(Error::PermissionDenied)
    }

    fn channel(&self, workspace: &str, channel: &str) -> Result<&DbChannel, Error> {
        self.channels
            .get(&(String::from(workspace), String::from(channel)))
            .ok_or_else(|| Error::NotFound(api::channel_posts_path(workspace, channel)))
    }

    fn channel_mut(&mut self, workspace: &str, channel: &str) -> Result<&mut DbChannel, Error> {
        self.channels
            .get_mut(&(String::from(workspace), String::from(channel)))
            .ok_or_else(|| Error::NotFound(api::channel_posts_path(workspace, channel)))
    }

    pub fn create_channel(
        &mut self,
        tok: &AuthToken,
        workspace: &str,
        channel: &str,
    ) -> Result<(), Error> {
        self.whoami(tok)?;
        api::validate_string(workspace)?;
        api::validate_string(channel)?;
        match self
            .channels
            .entry((String::from(workspace), String::from(channel)))
        {
            btree_map::Entry::Occupied(_) => Err(Error::NameAlreadyUsed(format!(
                "{workspace}/{channel}"
            ))),
            btree_map::Entry::Vacant(e) => {
                e.insert(DbChannel::default());
                Ok(())
            }
        }
    }

    pub fn fetch_posts(
        &self,
        tok: &AuthToken,
        workspace: &str,
        channel: &str,
    ) -> Result<Vec<Post>, Error> {
        self.whoami(tok)?;
        Ok(self.channel(workspace, channel)?.posts.clone())
    }

    pub fn create_post(
        &mut self,
        tok: &AuthToken,
        workspace: &str,
        channel: &str,
        p: NewPost,
    ) -> Result<Uri, Error> {
        self.now += 1000;
        let now = self.now;
        self.create_post_at(tok, workspace, channel, p, now)
    }

    /// Same as [`MockServer::create_post`], with a chosen creation time
    pub fn create_post_at(
        &mut self,
        tok: &AuthToken,
        workspace: &str,
        channel: &str,
        p: NewPost,
        created_at: Time,
    ) -> Result<Uri, Error> {
        p.validate()?;
        let user = String::from(self.whoami(tok)?);
        let c = self.channel_mut(workspace, channel)?;
        let post = Post {
            path: format!(
                "{}{}",
                api::channel_posts_path(workspace, channel),
                Uuid::new_v4()
            ),
            doc: PostDoc {
                msg: Some(p.msg),
                parent: p.parent,
                reactions: None,
                extensions: serde_json::Map::new(),
            },
            meta: PostMeta {
                created_by: user.clone(),
                created_at,
                last_modified_by: user,
                last_modified_at: created_at,
            },
        };
        c.relay_post(&post);
        let uri = Uri {
            uri: post.path.clone(),
        };
        c.posts.push(post);
        Ok(uri)
    }

    /// Applies `ops` to the post's document, all or nothing
    ///
    /// An operation that cannot apply is reported through `patch_failed`, the
    /// way the real server does, not as an error.
    pub fn patch_post(
        &mut self,
        tok: &AuthToken,
        path: &str,
        ops: Vec<PatchOp>,
    ) -> Result<PatchResponse, Error> {
        let user = String::from(self.whoami(tok)?);
        let now = self.now;
        let c = self
            .channels
            .values_mut()
            .find(|c| c.posts.iter().any(|p| p.path == path))
            .ok_or_else(|| Error::NotFound(String::from(path)))?;
        let post = c
            .posts
            .iter_mut()
            .find(|p| p.path == path)
            .ok_or_else(|| Error::NotFound(String::from(path)))?;

        let mut doc = serde_json::to_value(&post.doc)
            .map_err(|e| Error::Unknown(format!("serializing post doc: {e}")))?;
        let applied = ops.iter().try_for_each(|op| apply_op(&mut doc, op));
        let new_doc = applied.and_then(|()| {
            serde_json::from_value::<PostDoc>(doc)
                .map_err(|e| format!("patched document is not a post: {e}"))
        });
        let new_doc = match new_doc {
            Ok(d) => d,
            Err(message) => {
                tracing::debug!(%path, %message, "rejecting patch");
                return Ok(PatchResponse {
                    uri: String::from(path),
                    patch_failed: true,
                    message,
                });
            }
        };
        post.doc = new_doc;
        post.meta.last_modified_by = user;
        post.meta.last_modified_at = now;
        let post = post.clone();
        c.relay_post(&post);
        Ok(PatchResponse {
            uri: post.path,
            patch_failed: false,
            message: String::new(),
        })
    }

    /// Opens a live feed, starting with every post the channel already has
    pub fn subscribe(
        &mut self,
        tok: &AuthToken,
        workspace: &str,
        channel: &str,
    ) -> Result<mpsc::UnboundedReceiver<String>, Error> {
        self.whoami(tok)?;
        let c = self.channel_mut(workspace, channel)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        for p in c.posts.iter() {
            let payload = serde_json::to_string(p)
                .map_err(|e| Error::Unknown(format!("serializing post: {e}")))?;
            // the receiver is still in our hands
            let _ = sender.send(payload);
        }
        c.feeds.push(sender);
        Ok(receiver)
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

fn apply_op(doc: &mut serde_json::Value, op: &PatchOp) -> Result<(), String> {
    let (parent, key) = op
        .path
        .rsplit_once('/')
        .ok_or_else(|| format!("invalid pointer {:?}", op.path))?;
    let key = key.replace("~1", "/").replace("~0", "~");
    let parent = doc
        .pointer_mut(parent)
        .and_then(|p| p.as_object_mut())
        .ok_or_else(|| format!("no object at {parent:?}"))?;
    match op.op {
        PatchOpKind::ObjectAdd => {
            parent.entry(key).or_insert_with(|| op.value.clone());
        }
        PatchOpKind::ArrayAdd | PatchOpKind::ArrayRemove => {
            let array = parent
                .get_mut(&key)
                .and_then(|a| a.as_array_mut())
                .ok_or_else(|| format!("no array at {:?}", op.path))?;
            let pos = array.iter().position(|v| *v == op.value);
            match (op.op, pos) {
                (PatchOpKind::ArrayAdd, None) => array.push(op.value.clone()),
                (PatchOpKind::ArrayAdd, Some(_)) => (),
                (_, Some(pos)) => {
                    array.remove(pos);
                }
                (_, None) => return Err(format!("{} is not in {:?}", op.value, op.path)),
            }
        }
    }
    Ok(())
}
