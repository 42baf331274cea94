use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub youtube_video_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied on ingest. Owner and timestamps are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVideo {
    pub youtube_video_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
}

impl VideoUpdate {
    pub fn metadata(title: String, description: String) -> Self {
        Self {
            title: Some(title),
            description: Some(description),
            ..Self::default()
        }
    }

    pub fn counts(view_count: i64, like_count: i64, comment_count: i64) -> Self {
        Self {
            view_count: Some(view_count),
            like_count: Some(like_count),
            comment_count: Some(comment_count),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, video: &mut VideoRow) {
        if let Some(title) = &self.title {
            video.title = title.clone();
        }
        if let Some(description) = &self.description {
            video.description = description.clone();
        }
        if let Some(n) = self.view_count {
            video.view_count = n;
        }
        if let Some(n) = self.like_count {
            video.like_count = n;
        }
        if let Some(n) = self.comment_count {
            video.comment_count = n;
        }
    }
}
