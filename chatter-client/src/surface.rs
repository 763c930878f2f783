use std::fmt::Write;

use chrono::{TimeZone, Utc};

use crate::{
    api::{Post, ReactionKind, Time},
    Anchor,
};

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    #[error("anchor element {0:?} is not on the surface")]
    AnchorMissing(String),

    #[error("element {0:?} is not on the surface")]
    ElementMissing(String),
}

/// What gets displayed for one message
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageView {
    pub path: String,
    pub depth: usize,
    pub author: String,
    pub created_at: Time,
    pub text: String,
    pub reactions: Vec<(ReactionKind, usize)>,
}

impl MessageView {
    pub fn new(post: &Post, depth: usize) -> MessageView {
        MessageView {
            path: post.path.clone(),
            depth,
            author: String::from(post.created_by()),
            created_at: post.created_at(),
            text: String::from(post.text()),
            reactions: reaction_counts(post),
        }
    }
}

fn reaction_counts(post: &Post) -> Vec<(ReactionKind, usize)> {
    ReactionKind::ALL
        .into_iter()
        .map(|k| (k, post.reaction_count(k.as_str())))
        .collect()
}

/// Something that displays the elements of a channel, keyed by message path
pub trait Surface {
    fn contains(&self, path: &str) -> bool;

    /// Adds `view` next to `anchor`, which must already be displayed
    fn insert(&mut self, view: MessageView, anchor: &Anchor) -> Result<(), SurfaceError>;

    /// Adds `view` after everything else
    fn append(&mut self, view: MessageView);

    /// Refreshes the reactions of an already displayed message
    fn update(&mut self, post: &Post) -> Result<(), SurfaceError>;

    fn clear(&mut self);
}

/// Surface keeping the elements as an ordered list
#[derive(Clone, Debug, Default)]
pub struct ListSurface {
    views: Vec<MessageView>,
}

impl ListSurface {
    pub fn new() -> ListSurface {
        ListSurface::default()
    }

    pub fn views(&self) -> &[MessageView] {
        &self.views
    }

    pub fn paths(&self) -> Vec<&str> {
        self.views.iter().map(|v| v.path.as_str()).collect()
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.views.iter().position(|v| v.path == path)
    }

    /// Renders the channel as text, indenting replies by `indent` spaces per level
    pub fn render_text(&self, indent: usize) -> String {
        let mut res = String::new();
        for v in self.views.iter() {
            let pad = " ".repeat(v.depth * indent);
            let date = match Utc.timestamp_millis_opt(v.created_at).single() {
                Some(d) => d.format("%a %b %e %Y %H:%M:%S UTC").to_string(),
                None => v.created_at.to_string(),
            };
            let _ = writeln!(res, "{pad}{} - {date}:", v.author);
            for line in v.text.lines() {
                let _ = writeln!(res, "{pad}  {line}");
            }
            let reactions = v
                .reactions
                .iter()
                .map(|(k, n)| format!("{k} {n}"))
                .collect::<Vec<_>>()
                .join("  ");
            let _ = writeln!(res, "{pad}  [{reactions}]");
        }
        res
    }
}

impl Surface for ListSurface {
    fn contains(&self, path: &str) -> bool {
        self.position(path).is_some()
    }

    fn insert(&mut self, view: MessageView, anchor: &Anchor) -> Result<(), SurfaceError> {
        let idx = match anchor {
            Anchor::Start => 0,
            Anchor::After(path) => {
                self.position(path)
                    .ok_or_else(|| SurfaceError::AnchorMissing(path.clone()))?
                    + 1
            }
            Anchor::Before(path) => self
                .position(path)
                .ok_or_else(|| SurfaceError::AnchorMissing(path.clone()))?,
        };
        self.views.insert(idx, view);
        Ok(())
    }

    fn append(&mut self, view: MessageView) {
        self.views.push(view);
    }

    fn update(&mut self, post: &Post) -> Result<(), SurfaceError> {
        let idx = self
            .position(&post.path)
            .ok_or_else(|| SurfaceError::ElementMissing(post.path.clone()))?;
        self.views[idx].reactions = reaction_counts(post);
        Ok(())
    }

    fn clear(&mut self) {
        self.views.clear();
    }
}
