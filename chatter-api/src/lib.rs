pub use uuid::{uuid, Uuid};

/// Milliseconds since the unix epoch, as sent by the server
pub type Time = i64;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

mod auth;
pub use auth::{AuthToken, NewSession};

mod error;
pub use error::Error;

mod patch;
pub use patch::{PatchOp, PatchOpKind, PatchResponse};

mod post;
pub use post::{NewPost, Post, PostDoc, PostMeta, Reactions, Uri};

mod reaction;
pub use reaction::ReactionKind;

// All strings coming from the outside world go through this before being stored
pub fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(String::from(s))),
        false => Ok(()),
    }
}

/// Path of the post collection of a channel, relative to the posts root
///
/// Post paths assigned by the server live below this prefix.
pub fn channel_posts_path(workspace: &str, channel: &str) -> String {
    format!("/{workspace}/channels/{channel}/posts/")
}
