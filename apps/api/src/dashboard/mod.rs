//! Dashboard orchestration: one instance per signed-in session.
//!
//! ```text
//! Loading ──load──▶ Empty ──add_video──▶ Browsing ◀──cancel/save── EditingVideo
//!    ▲                                      │  ▲                        ▲
//!    └──────────────sign_out────────────────┘  └──select_video          └──begin_edit
//! ```
//!
//! Hook failures become notices for the caller to display. Only precondition
//! violations (nothing selected, unknown video, lost session) are errors.

pub mod handlers;
pub mod search;
pub mod sessions;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::EventLogger;
use crate::hooks::{PlatformApi, StoreData};
use crate::models::comment::Comment;
use crate::models::note::{parse_tags, NewNote, NoteRow};
use crate::models::video::{NewVideo, VideoRow, VideoUpdate};
use crate::proxy::transport::ProxyTransport;
use crate::proxy::WriteOutcome;
use crate::store::Store;
use crate::youtube::video_id::extract_video_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDraft {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DashboardState {
    Loading,
    Empty,
    Browsing { video_id: Uuid },
    EditingVideo { video_id: Uuid, draft: VideoDraft },
}

impl DashboardState {
    fn selected(&self) -> Option<Uuid> {
        match self {
            DashboardState::Browsing { video_id } | DashboardState::EditingVideo { video_id, .. } => {
                Some(*video_id)
            }
            DashboardState::Loading | DashboardState::Empty => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Everything a client needs to render the dashboard.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    #[serde(flatten)]
    pub state: DashboardState,
    pub is_loading: bool,
    pub videos: Vec<VideoRow>,
    pub selected_video: Option<VideoRow>,
    pub notes: Vec<NoteRow>,
    pub comments: Vec<Comment>,
    pub notices: Vec<Notice>,
}

pub struct Dashboard {
    data: StoreData,
    platform: PlatformApi,
    events: EventLogger,
    state: DashboardState,
    comments: Vec<Comment>,
    notices: Vec<Notice>,
}

impl Dashboard {
    pub fn new(
        store: Arc<dyn Store>,
        transport: Arc<dyn ProxyTransport>,
        events: EventLogger,
        access_token: Option<String>,
    ) -> Self {
        Self {
            data: StoreData::new(store, events.clone(), access_token.clone()),
            platform: PlatformApi::new(transport, events.clone(), access_token),
            events,
            state: DashboardState::Loading,
            comments: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn is_loading(&self) -> bool {
        self.data.is_loading() || self.platform.is_loading()
    }

    pub fn selected_video(&self) -> Option<&VideoRow> {
        let id = self.state.selected()?;
        self.data.videos().iter().find(|v| v.id == id)
    }

    pub fn filtered_notes(&self, query: &str) -> Vec<&NoteRow> {
        search::filter_notes(self.data.notes(), query)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Snapshot for rendering. Drains pending notices.
    pub fn view(&mut self) -> DashboardView {
        DashboardView {
            state: self.state.clone(),
            is_loading: self.is_loading(),
            videos: self.data.videos().to_vec(),
            selected_video: self.selected_video().cloned(),
            notes: self.data.notes().to_vec(),
            comments: self.comments().to_vec(),
            notices: self.take_notices(),
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    /// Turns a hook failure into an error notice. A lost session stays an error.
    fn absorb<T>(&mut self, result: Result<T, AppError>, failure: &str) -> Result<Option<T>, AppError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(AppError::AuthenticationRequired) => Err(AppError::AuthenticationRequired),
            Err(_) => {
                self.notify(NoticeLevel::Error, failure);
                Ok(None)
            }
        }
    }

    fn require_selected(&self) -> Result<VideoRow, AppError> {
        self.selected_video()
            .cloned()
            .ok_or_else(|| AppError::Validation("No video selected".to_string()))
    }

    pub async fn load(&mut self) -> Result<(), AppError> {
        self.events
            .log_user_action("dashboard_visited", json!({}))
            .await;

        let newest = self
            .data
            .fetch_videos()
            .await
            .map(|videos| videos.first().map(|v| v.id));

        match self.absorb(newest, "Failed to load your videos")? {
            Some(Some(video_id)) => self.select_video(video_id).await,
            Some(None) => {
                self.state = DashboardState::Empty;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Ingests a pasted URL or bare ID and selects the new video.
    pub async fn add_video(&mut self, input: &str) -> Result<Option<VideoRow>, AppError> {
        let input = input.trim();
        if input.is_empty() {
            self.notify(NoticeLevel::Error, "Please enter a YouTube video URL or ID");
            return Ok(None);
        }
        let Some(youtube_id) = extract_video_id(input) else {
            self.notify(
                NoticeLevel::Error,
                "Invalid YouTube URL format. Please enter a valid YouTube video URL or ID.",
            );
            return Ok(None);
        };

        let Some(details) = self.platform.fetch_video_details(&youtube_id).await else {
            self.notify(
                NoticeLevel::Error,
                "Failed to add video. Please check the URL and try again.",
            );
            return Ok(None);
        };

        let counts = details.statistics.counts();
        let new_video = NewVideo {
            thumbnail_url: details.best_thumbnail_url(),
            youtube_video_id: details.id,
            title: details.title,
            description: details.description,
            view_count: counts.views,
            like_count: counts.likes,
            comment_count: counts.comments,
        };

        let inserted = self.data.add_video(new_video).await;
        let Some(video) = self.absorb(inserted, "Failed to add video. Please try again.")? else {
            return Ok(None);
        };

        self.notify(NoticeLevel::Success, "Video added successfully!");
        self.select_video(video.id).await?;
        Ok(Some(video))
    }

    /// Makes `video_id` current and reloads its notes and comments.
    pub async fn select_video(&mut self, video_id: Uuid) -> Result<(), AppError> {
        let video = self
            .data
            .videos()
            .iter()
            .find(|v| v.id == video_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Video {video_id} not found")))?;

        self.state = DashboardState::Browsing { video_id };
        self.comments.clear();

        let notes = self.data.fetch_notes(Some(video_id)).await.map(|_| ());
        self.absorb(notes, "Failed to load notes")?;
        self.comments = self
            .platform
            .fetch_video_comments(&video.youtube_video_id)
            .await;
        Ok(())
    }

    /// Pulls fresh counters from the platform and writes them back to the store.
    pub async fn refresh(&mut self) -> Result<(), AppError> {
        let video = self.require_selected()?;
        self.events
            .log_user_action("data_refresh_requested", json!({ "videoId": video.id }))
            .await;

        let Some(details) = self
            .platform
            .fetch_video_details(&video.youtube_video_id)
            .await
        else {
            self.notify(NoticeLevel::Error, "Failed to refresh data. Please try again.");
            return Ok(());
        };

        let counts = details.statistics.counts();
        let updated = self
            .data
            .update_video(
                video.id,
                VideoUpdate::counts(counts.views, counts.likes, counts.comments),
            )
            .await;
        if self
            .absorb(updated, "Failed to save refreshed data")?
            .is_some()
        {
            self.notify(NoticeLevel::Success, "Data refreshed successfully!");
        }
        Ok(())
    }

    pub fn begin_edit(&mut self) -> Result<(), AppError> {
        let video = self.require_selected()?;
        if let DashboardState::Browsing { .. } = self.state {
            self.state = DashboardState::EditingVideo {
                video_id: video.id,
                draft: VideoDraft {
                    title: video.title,
                    description: video.description,
                },
            };
        }
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        if let DashboardState::EditingVideo { video_id, .. } = self.state {
            self.state = DashboardState::Browsing { video_id };
        }
    }

    /// Sends the edit through the proxy, then persists it. Stays in
    /// `EditingVideo` with the draft kept when either step fails.
    pub async fn save_edit(
        &mut self,
        title: &str,
        description: &str,
    ) -> Result<Option<WriteOutcome>, AppError> {
        let DashboardState::EditingVideo { video_id, .. } = self.state else {
            return Err(AppError::Validation("Video is not being edited".to_string()));
        };
        let video = self.require_selected()?;

        self.state = DashboardState::EditingVideo {
            video_id,
            draft: VideoDraft {
                title: title.to_string(),
                description: description.to_string(),
            },
        };
        if title.trim().is_empty() {
            self.notify(NoticeLevel::Error, "Title cannot be empty.");
            return Ok(None);
        }

        self.events
            .log_user_action("video_edit_attempted", json!({ "videoId": video_id }))
            .await;

        let Some(outcome) = self
            .platform
            .update_video_details(&video.youtube_video_id, title, description)
            .await
        else {
            self.notify(
                NoticeLevel::Error,
                "Failed to update video details. Please try again.",
            );
            self.events
                .log_user_action("video_edit_failed", json!({ "videoId": video_id }))
                .await;
            return Ok(None);
        };

        let updated = self
            .data
            .update_video(
                video_id,
                VideoUpdate::metadata(title.to_string(), description.to_string()),
            )
            .await;
        if self
            .absorb(updated, "Failed to save video details. Please try again.")?
            .is_none()
        {
            return Ok(None);
        }

        self.state = DashboardState::Browsing { video_id };
        let message = if outcome.is_simulated() {
            "Video details saved. The YouTube update was simulated and did not reach the platform."
        } else {
            "Video details updated successfully!"
        };
        self.notify(NoticeLevel::Success, message);
        self.events
            .log_user_action(
                "video_edit_completed",
                json!({ "videoId": video_id, "outcome": outcome.outcome }),
            )
            .await;
        Ok(Some(outcome))
    }

    /// Blank title or content is a no-op. Otherwise both are stored as entered.
    pub async fn add_note(
        &mut self,
        title: &str,
        content: &str,
        tags: &str,
    ) -> Result<Option<NoteRow>, AppError> {
        if title.trim().is_empty() || content.trim().is_empty() {
            return Ok(None);
        }
        let video = self.require_selected()?;

        let inserted = self
            .data
            .add_note(NewNote {
                video_id: video.id,
                title: title.to_string(),
                content: content.to_string(),
                tags: parse_tags(tags),
            })
            .await;
        let note = self.absorb(inserted, "Failed to add note. Please try again.")?;
        if note.is_some() {
            self.notify(NoticeLevel::Success, "Note added successfully!");
        }
        Ok(note)
    }

    /// Returns whether a note was removed. Unknown ids are a no-op.
    pub async fn delete_note(&mut self, note_id: Uuid) -> Result<bool, AppError> {
        let deleted = self.data.delete_note(note_id).await;
        let removed = self
            .absorb(deleted, "Failed to delete note. Please try again.")?
            .unwrap_or(false);
        if removed {
            self.notify(NoticeLevel::Success, "Note deleted successfully!");
        }
        Ok(removed)
    }

    /// Blank text is a no-op. On acknowledgement the comment is shown
    /// immediately, whether or not the platform really stored it.
    pub async fn post_comment(&mut self, text: &str) -> Result<Option<Comment>, AppError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let video = self.require_selected()?;
        self.events
            .log_user_action("comment_post_attempted", json!({ "videoId": video.id }))
            .await;

        let Some(outcome) = self
            .platform
            .post_comment(&video.youtube_video_id, text, None)
            .await
        else {
            self.notify(NoticeLevel::Error, "Failed to post comment. Please try again.");
            self.events
                .log_user_action("comment_post_failed", json!({ "videoId": video.id }))
                .await;
            return Ok(None);
        };

        let comment = Comment::local(text);
        self.comments.insert(0, comment.clone());
        let message = if outcome.is_simulated() {
            "Comment added locally. Posting to YouTube was simulated."
        } else {
            "Comment posted successfully!"
        };
        self.notify(NoticeLevel::Success, message);
        self.events
            .log_user_action(
                "comment_posted",
                json!({ "videoId": video.id, "outcome": outcome.outcome }),
            )
            .await;
        Ok(Some(comment))
    }

    /// Returns whether a comment was removed from the list.
    pub async fn delete_comment(&mut self, comment_id: &str) -> Result<bool, AppError> {
        if !self.comments.iter().any(|c| c.id == comment_id) {
            return Ok(false);
        }

        if self.platform.delete_comment(comment_id).await.is_none() {
            self.notify(NoticeLevel::Error, "Failed to delete comment. Please try again.");
            return Ok(false);
        }

        self.comments.retain(|c| c.id != comment_id);
        self.notify(NoticeLevel::Success, "Comment deleted.");
        self.events
            .log_user_action("comment_deleted", json!({ "commentId": comment_id }))
            .await;
        Ok(true)
    }

    pub async fn sign_out(&mut self) {
        self.events.log_user_action("signed_out", json!({})).await;
        self.data.clear();
        self.comments.clear();
        self.notices.clear();
        self.state = DashboardState::Loading;
    }
}
