use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::youtube::CommentThread;

pub const LOCAL_AUTHOR: &str = "You";

/// A mirrored platform comment. Held in dashboard state only, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author_name: String,
    pub text_display: String,
    pub like_count: i64,
    pub published_at: DateTime<Utc>,
}

impl Comment {
    /// A comment authored through the dashboard, shown before the platform lists it.
    pub fn local(text: &str) -> Self {
        Self {
            id: format!("local-{}", Uuid::new_v4()),
            author_name: LOCAL_AUTHOR.to_string(),
            text_display: text.to_string(),
            like_count: 0,
            published_at: Utc::now(),
        }
    }
}

impl From<CommentThread> for Comment {
    fn from(thread: CommentThread) -> Self {
        let top = thread.snippet.top_level_comment.snippet;
        Self {
            id: thread.id,
            author_name: top.author_display_name,
            text_display: top.text_display,
            like_count: top.like_count,
            published_at: top.published_at,
        }
    }
}
