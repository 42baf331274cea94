//! Backend store: user-scoped persistence for videos, notes, event logs and
//! session lookup. `AppState` carries it as `Arc<dyn Store>`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::event::EventLogEntry;
use crate::models::note::{NewNote, NoteRow};
use crate::models::video::{NewVideo, VideoRow, VideoUpdate};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Resolves an access token to its user. `None` for unknown or expired tokens.
    async fn authenticated_user(&self, access_token: &str) -> Result<Option<Uuid>, AppError>;

    /// Newest first.
    async fn list_videos(&self, user_id: Uuid) -> Result<Vec<VideoRow>, AppError>;

    async fn insert_video(&self, user_id: Uuid, video: &NewVideo) -> Result<VideoRow, AppError>;

    /// `None` when the video does not exist or belongs to someone else.
    async fn update_video(
        &self,
        user_id: Uuid,
        video_id: Uuid,
        update: &VideoUpdate,
    ) -> Result<Option<VideoRow>, AppError>;

    /// Newest first; all of the user's notes when `video_id` is `None`.
    async fn list_notes(
        &self,
        user_id: Uuid,
        video_id: Option<Uuid>,
    ) -> Result<Vec<NoteRow>, AppError>;

    async fn insert_note(&self, user_id: Uuid, note: &NewNote) -> Result<NoteRow, AppError>;

    /// Returns whether a row was removed.
    async fn delete_note(&self, user_id: Uuid, note_id: Uuid) -> Result<bool, AppError>;

    async fn insert_event(&self, entry: &EventLogEntry) -> Result<(), AppError>;
}
