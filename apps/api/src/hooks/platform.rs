use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::warn;

use crate::events::EventLogger;
use crate::hooks::LoadingFlag;
use crate::models::comment::Comment;
use crate::proxy::transport::ProxyTransport;
use crate::proxy::{ProxyAction, ProxyError, ProxyRequest, WriteOutcome};
use crate::youtube::{CommentThread, VideoDetails};

/// Wraps the five proxy actions. Failures are logged and turned into
/// sentinels (`None`, empty list) instead of errors.
pub struct PlatformApi {
    transport: Arc<dyn ProxyTransport>,
    events: EventLogger,
    access_token: Option<String>,
    loading: LoadingFlag,
}

impl PlatformApi {
    pub fn new(
        transport: Arc<dyn ProxyTransport>,
        events: EventLogger,
        access_token: Option<String>,
    ) -> Self {
        Self {
            transport,
            events,
            access_token,
            loading: LoadingFlag::default(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: ProxyRequest,
        endpoint: &str,
        method: &str,
        data: Value,
    ) -> Result<T, ProxyError> {
        let _loading = self.loading.begin();
        let action = request.action;

        let result = async {
            let value = self
                .transport
                .invoke(request, self.access_token.as_deref())
                .await?;
            Ok::<T, ProxyError>(serde_json::from_value(value)?)
        }
        .await;

        let status = match &result {
            Ok(_) => 200,
            Err(ProxyError::Remote { status, .. }) => *status,
            Err(_) => 400,
        };
        self.events.log_api_call(endpoint, method, status, data).await;

        if let Err(e) = &result {
            warn!("YouTube {} failed: {e}", action.as_str());
        }
        result
    }

    async fn log_failure(&self, message: &str, context: Value, error: &ProxyError) {
        self.events
            .log_error(message, json!({ "details": context, "error": error.to_string() }))
            .await;
    }

    pub async fn fetch_video_details(&self, video_id: &str) -> Option<VideoDetails> {
        let request = ProxyRequest::new(ProxyAction::FetchVideoDetails, video_id);
        let context = json!({ "videoId": video_id });
        match self
            .call(request, "/youtube/videos", "GET", context.clone())
            .await
        {
            Ok(details) => Some(details),
            Err(e) => {
                self.log_failure("Failed to fetch video details", context, &e)
                    .await;
                None
            }
        }
    }

    pub async fn fetch_video_comments(&self, video_id: &str) -> Vec<Comment> {
        let request = ProxyRequest::new(ProxyAction::FetchVideoComments, video_id);
        let context = json!({ "videoId": video_id });
        match self
            .call::<Vec<CommentThread>>(request, "/youtube/commentThreads", "GET", context.clone())
            .await
        {
            Ok(threads) => threads.into_iter().map(Comment::from).collect(),
            Err(e) => {
                self.log_failure("Failed to fetch video comments", context, &e)
                    .await;
                Vec::new()
            }
        }
    }

    pub async fn update_video_details(
        &self,
        video_id: &str,
        title: &str,
        description: &str,
    ) -> Option<WriteOutcome> {
        let mut request = ProxyRequest::new(ProxyAction::UpdateVideoDetails, video_id);
        request.title = Some(title.to_string());
        request.description = Some(description.to_string());
        let context = json!({ "videoId": video_id, "title": title, "description": description });
        self.write(request, "/youtube/videos", "PUT", context, "Failed to update video details")
            .await
    }

    pub async fn post_comment(
        &self,
        video_id: &str,
        text: &str,
        parent_comment_id: Option<&str>,
    ) -> Option<WriteOutcome> {
        let mut request = ProxyRequest::new(ProxyAction::PostComment, video_id);
        request.comment_text = Some(text.to_string());
        request.parent_comment_id = parent_comment_id.map(str::to_string);
        let context = json!({ "videoId": video_id, "text": text, "parentCommentId": parent_comment_id });
        self.write(request, "/youtube/commentThreads", "POST", context, "Failed to post comment")
            .await
    }

    pub async fn delete_comment(&self, comment_id: &str) -> Option<WriteOutcome> {
        let mut request = ProxyRequest::new(ProxyAction::DeleteComment, comment_id);
        request.comment_id = Some(comment_id.to_string());
        let context = json!({ "commentId": comment_id });
        self.write(request, "/youtube/comments", "DELETE", context, "Failed to delete comment")
            .await
    }

    async fn write(
        &self,
        request: ProxyRequest,
        endpoint: &str,
        method: &str,
        context: Value,
        failure: &str,
    ) -> Option<WriteOutcome> {
        match self
            .call::<WriteOutcome>(request, endpoint, method, context.clone())
            .await
        {
            Ok(outcome) if outcome.success => Some(outcome),
            Ok(outcome) => {
                warn!("{failure}: proxy reported {}", outcome.message);
                self.events
                    .log_error(failure, json!({ "details": context, "error": outcome.message }))
                    .await;
                None
            }
            Err(e) => {
                self.log_failure(failure, context, &e).await;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{LocalBufferSink, StoreSink};
    use crate::proxy::test_support::FakePlatform;
    use crate::proxy::transport::LocalProxy;
    use crate::proxy::MutationStatus;
    use crate::store::MemoryStore;

    const ID: &str = "dQw4w9WgXcQ";

    fn api(platform: FakePlatform) -> (PlatformApi, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let events = EventLogger::new(
            Arc::new(StoreSink::new(store.clone())),
            Arc::new(LocalBufferSink::new(16)),
            "test",
        );
        let transport = Arc::new(LocalProxy::new(Arc::new(platform)));
        (PlatformApi::new(transport, events, None), store)
    }

    #[tokio::test]
    async fn test_fetch_details_success_logs_api_call() {
        let (api, store) = api(FakePlatform::new(ID));
        let details = api.fetch_video_details(ID).await.unwrap();
        assert_eq!(details.statistics.counts().views, 1_234_567);
        assert!(!api.is_loading());

        let events = store.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "api_call");
        assert_eq!(events[0].event_data["status"], 200);
    }

    #[tokio::test]
    async fn test_fetch_details_failure_is_none_and_logged() {
        let (api, store) = api(FakePlatform::new(ID));
        assert!(api.fetch_video_details("missing0000").await.is_none());
        assert!(!api.is_loading());

        let events = store.events();
        assert!(events
            .iter()
            .any(|e| e.event_type == "error"
                && e.event_data["error"] == "Failed to fetch video details"
                && e.event_data["context"]["error"] == "Video not found"));
    }

    #[tokio::test]
    async fn test_fetch_comments_maps_threads() {
        let (api, _) = api(FakePlatform::new(ID));
        let comments = api.fetch_video_comments(ID).await;
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author_name, "Jane Smith");
        assert_eq!(comments[0].like_count, 12);
    }

    #[tokio::test]
    async fn test_fetch_comments_failure_is_empty() {
        let mut platform = FakePlatform::new(ID);
        platform.fail_with_status = Some(500);
        let (api, _) = api(platform);
        assert!(api.fetch_video_comments(ID).await.is_empty());
    }

    #[tokio::test]
    async fn test_post_comment_outcome_is_simulated() {
        let (api, _) = api(FakePlatform::new(ID));
        let outcome = api.post_comment(ID, "Nice video", None).await.unwrap();
        assert_eq!(outcome.outcome, MutationStatus::Simulated);
    }

    #[tokio::test]
    async fn test_unconfigured_write_is_none() {
        let mut platform = FakePlatform::new(ID);
        platform.configured = false;
        let (api, _) = api(platform);
        assert!(api.update_video_details(ID, "t", "d").await.is_none());
        assert!(api.delete_comment("c1").await.is_none());
    }
}
