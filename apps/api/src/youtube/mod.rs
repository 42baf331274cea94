/// YouTube client: the single point of entry for YouTube Data API calls.
///
/// Only read endpoints are reachable with an API key. Write endpoints need
/// OAuth credentials the service does not hold; see `proxy::dispatch`.
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod video_id;

/// Platform cap for `commentThreads.list`.
pub const MAX_COMMENT_RESULTS: u32 = 100;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("YouTube API key not configured")]
    Configuration,

    #[error("YouTube API error: {message}")]
    Upstream { status: u16, message: String },

    #[error("Video not found")]
    NotFound,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Counts arrive as numeric strings. Hidden counters are omitted entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default)]
    pub view_count: Option<String>,
    #[serde(default)]
    pub like_count: Option<String>,
    #[serde(default)]
    pub comment_count: Option<String>,
}

/// Parsed counters; missing or malformed values read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
}

impl Statistics {
    pub fn counts(&self) -> Counts {
        fn parse(v: &Option<String>) -> i64 {
            v.as_deref()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .unwrap_or(0)
        }
        Counts {
            views: parse(&self.view_count),
            likes: parse(&self.like_count),
            comments: parse(&self.comment_count),
        }
    }
}

/// Normalized `fetchVideoDetails` payload returned by the proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnails: BTreeMap<String, Thumbnail>,
    pub statistics: Statistics,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl VideoDetails {
    /// Highest available resolution, falling back to the static image host.
    pub fn best_thumbnail_url(&self) -> String {
        ["maxres", "standard", "high", "medium", "default"]
            .iter()
            .find_map(|k| self.thumbnails.get(*k))
            .map(|t| t.url.clone())
            .unwrap_or_else(|| format!("https://img.youtube.com/vi/{}/hqdefault.jpg", self.id))
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: BTreeMap<String, Thumbnail>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub id: String,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadSnippet {
    pub top_level_comment: TopLevelComment,
    #[serde(default)]
    pub total_reply_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopLevelComment {
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    pub author_display_name: String,
    pub text_display: String,
    #[serde(default)]
    pub like_count: i64,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct CommentThreadListResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Platform trait
// ────────────────────────────────────────────────────────────────────────────

/// Read access to the video platform. Carried by the proxy as `Arc<dyn VideoPlatform>`.
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Whether a server-held credential is present.
    fn is_configured(&self) -> bool;

    async fn video_details(&self, video_id: &str) -> Result<VideoDetails, YouTubeError>;

    async fn comment_threads(&self, video_id: &str) -> Result<Vec<CommentThread>, YouTubeError>;
}

/// reqwest-backed client for the YouTube Data API v3.
#[derive(Clone)]
pub struct YouTubeClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<T, YouTubeError> {
        let api_key = self.api_key.as_deref().ok_or(YouTubeError::Configuration)?;
        let url = format!("{}/{}", self.base_url, resource);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", api_key)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(upstream_error(status.as_u16(), &body));
        }

        debug!("YouTube {resource} returned {} bytes", body.len());
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl VideoPlatform for YouTubeClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn video_details(&self, video_id: &str) -> Result<VideoDetails, YouTubeError> {
        let list: VideoListResponse = self
            .get_json("videos", &[("part", "snippet,statistics"), ("id", video_id)])
            .await?;
        first_video(list)
    }

    async fn comment_threads(&self, video_id: &str) -> Result<Vec<CommentThread>, YouTubeError> {
        let max_results = MAX_COMMENT_RESULTS.to_string();
        let list: CommentThreadListResponse = self
            .get_json(
                "commentThreads",
                &[
                    ("part", "snippet"),
                    ("videoId", video_id),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;
        Ok(list.items)
    }
}

/// Zero items means the platform does not know the ID.
fn first_video(list: VideoListResponse) -> Result<VideoDetails, YouTubeError> {
    let item = list.items.into_iter().next().ok_or(YouTubeError::NotFound)?;
    Ok(VideoDetails {
        id: item.id,
        title: item.snippet.title,
        description: item.snippet.description,
        thumbnails: item.snippet.thumbnails,
        statistics: item.statistics,
        published_at: item.snippet.published_at,
    })
}

fn upstream_error(status: u16, body: &str) -> YouTubeError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| "Unknown error".to_string());
    YouTubeError::Upstream { status, message }
}
