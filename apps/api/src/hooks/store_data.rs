use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::EventLogger;
use crate::hooks::LoadingFlag;
use crate::models::note::{NewNote, NoteRow};
use crate::models::video::{NewVideo, VideoRow, VideoUpdate};
use crate::store::Store;

/// User-scoped CRUD over videos and notes, mirrored into in-memory lists.
///
/// Writes re-derive the user from the session token every time. Failures are
/// logged to the event sink and returned to the caller.
pub struct StoreData {
    store: Arc<dyn Store>,
    events: EventLogger,
    access_token: Option<String>,
    loading: LoadingFlag,
    videos: Vec<VideoRow>,
    notes: Vec<NoteRow>,
}

impl StoreData {
    pub fn new(store: Arc<dyn Store>, events: EventLogger, access_token: Option<String>) -> Self {
        Self {
            store,
            events,
            access_token,
            loading: LoadingFlag::default(),
            videos: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn videos(&self) -> &[VideoRow] {
        &self.videos
    }

    pub fn notes(&self) -> &[NoteRow] {
        &self.notes
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// Drops the session and all mirrored rows.
    pub fn clear(&mut self) {
        self.access_token = None;
        self.videos.clear();
        self.notes.clear();
    }

    /// Fails fast without a token; otherwise asks the store who the token belongs to.
    async fn current_user(&self) -> Result<Uuid, AppError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(AppError::AuthenticationRequired)?;
        self.store
            .authenticated_user(token)
            .await?
            .ok_or(AppError::AuthenticationRequired)
    }

    async fn report<T>(
        &self,
        message: &str,
        context: Value,
        result: Result<T, AppError>,
    ) -> Result<T, AppError> {
        if let Err(e) = &result {
            warn!("{message}: {e}");
            self.events
                .log_error(message, json!({ "details": context, "error": e.to_string() }))
                .await;
        }
        result
    }

    pub async fn fetch_videos(&mut self) -> Result<&[VideoRow], AppError> {
        let _loading = self.loading.begin();
        let result = async {
            let user_id = self.current_user().await?;
            self.store.list_videos(user_id).await
        }
        .await;
        self.videos = self
            .report("Failed to fetch videos", Value::Null, result)
            .await?;
        Ok(&self.videos)
    }

    pub async fn fetch_notes(&mut self, video_id: Option<Uuid>) -> Result<&[NoteRow], AppError> {
        let _loading = self.loading.begin();
        let result = async {
            let user_id = self.current_user().await?;
            self.store.list_notes(user_id, video_id).await
        }
        .await;
        self.notes = self
            .report("Failed to fetch notes", json!({ "videoId": video_id }), result)
            .await?;
        Ok(&self.notes)
    }

    pub async fn add_video(&mut self, video: NewVideo) -> Result<VideoRow, AppError> {
        let result = async {
            let user_id = self.current_user().await?;
            self.store.insert_video(user_id, &video).await
        }
        .await;
        let row = self
            .report(
                "Failed to add video",
                json!({ "youtubeVideoId": video.youtube_video_id }),
                result,
            )
            .await?;

        self.videos.insert(0, row.clone());
        self.events
            .log_user_action(
                "video_added",
                json!({ "videoId": row.id, "youtubeVideoId": row.youtube_video_id }),
            )
            .await;
        Ok(row)
    }

    pub async fn update_video(
        &mut self,
        video_id: Uuid,
        update: VideoUpdate,
    ) -> Result<VideoRow, AppError> {
        let result = async {
            let user_id = self.current_user().await?;
            self.store
                .update_video(user_id, video_id, &update)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Video {video_id} not found")))
        }
        .await;
        let row = self
            .report("Failed to update video", json!({ "videoId": video_id }), result)
            .await?;

        if let Some(existing) = self.videos.iter_mut().find(|v| v.id == video_id) {
            *existing = row.clone();
        }
        self.events
            .log_user_action("video_updated", json!({ "videoId": video_id }))
            .await;
        Ok(row)
    }

    pub async fn add_note(&mut self, note: NewNote) -> Result<NoteRow, AppError> {
        let result = async {
            let user_id = self.current_user().await?;
            self.store.insert_note(user_id, &note).await
        }
        .await;
        let row = self
            .report("Failed to add note", json!({ "videoId": note.video_id }), result)
            .await?;

        self.notes.insert(0, row.clone());
        self.events
            .log_user_action(
                "note_created",
                json!({ "noteId": row.id, "videoId": row.video_id, "tags": row.tags }),
            )
            .await;
        Ok(row)
    }

    /// Returns `false`, and logs nothing, when the note was already gone.
    pub async fn delete_note(&mut self, note_id: Uuid) -> Result<bool, AppError> {
        let result = async {
            let user_id = self.current_user().await?;
            self.store.delete_note(user_id, note_id).await
        }
        .await;
        let removed = self
            .report("Failed to delete note", json!({ "noteId": note_id }), result)
            .await?;

        let before = self.notes.len();
        self.notes.retain(|n| n.id != note_id);
        let removed = removed || self.notes.len() < before;
        if removed {
            self.events
                .log_user_action("note_deleted", json!({ "noteId": note_id }))
                .await;
        }
        Ok(removed)
    }
}
