use std::{fmt, str::FromStr};

use crate::Error;

/// Reactions the client offers a button for
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ReactionKind {
    Smile,
    Frown,
    Like,
    Celebrate,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 4] = [
        ReactionKind::Smile,
        ReactionKind::Frown,
        ReactionKind::Like,
        ReactionKind::Celebrate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Smile => ":smile:",
            ReactionKind::Frown => ":frown:",
            ReactionKind::Like => ":like:",
            ReactionKind::Celebrate => ":celebrate:",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = Error;

    /// Accepts both `:like:` and `like`
    fn from_str(s: &str) -> Result<ReactionKind, Error> {
        let bare = s.trim_matches(':');
        ReactionKind::ALL
            .into_iter()
            .find(|k| k.as_str().trim_matches(':') == bare)
            .ok_or_else(|| Error::UnknownReaction(String::from(s)))
    }
}
