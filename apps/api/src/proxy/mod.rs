//! Video-ingest proxy: one entry point, five actions, JSON out.
//!
//! Reads go to the platform with the server-held key. Writes need OAuth
//! credentials that are never provisioned, so they are acknowledged as
//! `Simulated` and nothing on the platform changes.

pub mod handlers;
pub mod transport;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::youtube::{CommentThread, VideoDetails, VideoPlatform, YouTubeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProxyAction {
    FetchVideoDetails,
    FetchVideoComments,
    UpdateVideoDetails,
    PostComment,
    DeleteComment,
}

impl ProxyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyAction::FetchVideoDetails => "fetchVideoDetails",
            ProxyAction::FetchVideoComments => "fetchVideoComments",
            ProxyAction::UpdateVideoDetails => "updateVideoDetails",
            ProxyAction::PostComment => "postComment",
            ProxyAction::DeleteComment => "deleteComment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    pub action: ProxyAction,
    pub video_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<String>,
    /// Target of `deleteComment`; `video_id` is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
}

impl ProxyRequest {
    pub fn new(action: ProxyAction, video_id: impl Into<String>) -> Self {
        Self {
            action,
            video_id: video_id.into(),
            title: None,
            description: None,
            comment_text: None,
            parent_comment_id: None,
            comment_id: None,
        }
    }
}

/// Whether a write reached the platform or was only acknowledged by the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStatus {
    Simulated,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteOutcome {
    pub success: bool,
    pub outcome: MutationStatus,
    pub message: String,
}

impl WriteOutcome {
    fn simulated(message: &str) -> Self {
        Self {
            success: true,
            outcome: MutationStatus::Simulated,
            message: message.to_string(),
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.outcome == MutationStatus::Simulated
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProxyResponse {
    VideoDetails(VideoDetails),
    Comments(Vec<CommentThread>),
    Write(WriteOutcome),
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Platform(#[from] YouTubeError),

    #[error("Proxy returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Proxy transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected proxy payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Every proxy failure is a `400 {error}`, upstream and configuration errors included.
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!("YouTube proxy error: {self}");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

/// Runs one proxy action. `user_token` is the caller's bearer token, if any.
pub async fn dispatch(
    platform: &dyn VideoPlatform,
    request: ProxyRequest,
    user_token: Option<&str>,
) -> Result<ProxyResponse, ProxyError> {
    if !platform.is_configured() {
        return Err(YouTubeError::Configuration.into());
    }

    let action = request.action;
    let video_id = request.video_id.as_str();

    let response = match action {
        ProxyAction::FetchVideoDetails => {
            ProxyResponse::VideoDetails(platform.video_details(video_id).await?)
        }
        ProxyAction::FetchVideoComments => {
            ProxyResponse::Comments(platform.comment_threads(video_id).await?)
        }
        ProxyAction::UpdateVideoDetails => {
            info!(
                video_id,
                title = request.title.as_deref().unwrap_or_default(),
                has_user_token = user_token.is_some(),
                "Updating video details (simulated)"
            );
            ProxyResponse::Write(WriteOutcome::simulated("Video updated (demo mode)"))
        }
        ProxyAction::PostComment => {
            let text = request
                .comment_text
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| ProxyError::InvalidRequest("commentText is required".to_string()))?;
            info!(
                video_id,
                text,
                parent_comment_id = request.parent_comment_id.as_deref(),
                has_user_token = user_token.is_some(),
                "Posting comment (simulated)"
            );
            ProxyResponse::Write(WriteOutcome::simulated("Comment posted (demo mode)"))
        }
        ProxyAction::DeleteComment => {
            let comment_id = request.comment_id.as_deref().unwrap_or(video_id);
            info!(
                comment_id,
                has_user_token = user_token.is_some(),
                "Deleting comment (simulated)"
            );
            ProxyResponse::Write(WriteOutcome::simulated("Comment deleted (demo mode)"))
        }
    };

    info!("YouTube API {} completed for video {video_id}", action.as_str());
    Ok(response)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::youtube::{
        CommentSnippet, CommentThreadSnippet, Statistics, Thumbnail, TopLevelComment,
    };

    /// In-memory platform with one known video and a fixed comment list.
    pub struct FakePlatform {
        pub configured: bool,
        pub known_id: String,
        pub comments: Vec<CommentThread>,
        pub views: String,
        pub fail_with_status: Option<u16>,
        pub calls: AtomicUsize,
    }

    impl FakePlatform {
        pub fn new(known_id: &str) -> Self {
            Self {
                configured: true,
                known_id: known_id.to_string(),
                comments: vec![comment_thread("c1", "Jane Smith", "Great video!", 12)],
                views: "1234567".to_string(),
                fail_with_status: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    pub fn comment_thread(id: &str, author: &str, text: &str, likes: i64) -> CommentThread {
        CommentThread {
            id: id.to_string(),
            snippet: CommentThreadSnippet {
                top_level_comment: TopLevelComment {
                    id: id.to_string(),
                    snippet: CommentSnippet {
                        author_display_name: author.to_string(),
                        text_display: text.to_string(),
                        like_count: likes,
                        published_at: Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap(),
                    },
                },
                total_reply_count: 0,
            },
        }
    }

    #[async_trait]
    impl VideoPlatform for FakePlatform {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn video_details(&self, video_id: &str) -> Result<VideoDetails, YouTubeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.fail_with_status {
                return Err(YouTubeError::Upstream {
                    status,
                    message: "quotaExceeded".to_string(),
                });
            }
            if video_id != self.known_id {
                return Err(YouTubeError::NotFound);
            }
            let mut thumbnails = std::collections::BTreeMap::new();
            thumbnails.insert(
                "maxres".to_string(),
                Thumbnail {
                    url: format!("https://i.ytimg.com/vi/{video_id}/maxresdefault.jpg"),
                    width: Some(1280),
                    height: Some(720),
                },
            );
            Ok(VideoDetails {
                id: video_id.to_string(),
                title: "Sample YouTube Video".to_string(),
                description: "A sample description".to_string(),
                thumbnails,
                statistics: Statistics {
                    view_count: Some(self.views.clone()),
                    like_count: Some("89012".to_string()),
                    comment_count: Some("3456".to_string()),
                },
                published_at: None,
            })
        }

        async fn comment_threads(
            &self,
            _video_id: &str,
        ) -> Result<Vec<CommentThread>, YouTubeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.fail_with_status {
                return Err(YouTubeError::Upstream {
                    status,
                    message: "quotaExceeded".to_string(),
                });
            }
            Ok(self.comments.clone())
        }
    }
}
