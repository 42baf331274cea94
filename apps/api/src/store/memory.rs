use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::event::EventLogEntry;
use crate::models::note::{NewNote, NoteRow};
use crate::models::video::{NewVideo, VideoRow, VideoUpdate};
use crate::store::Store;

#[derive(Default)]
struct Tables {
    sessions: HashMap<String, Uuid>,
    // Rows are kept newest first.
    videos: Vec<VideoRow>,
    notes: Vec<NoteRow>,
    events: Vec<EventLogEntry>,
}

/// Process-local store for `STORE_BACKEND=memory` and tests. Sessions never expire.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_session(&self, access_token: impl Into<String>, user_id: Uuid) {
        if let Ok(mut tables) = self.tables.write() {
            tables.sessions.insert(access_token.into(), user_id);
        }
    }

    #[cfg(test)]
    pub fn remove_session(&self, access_token: &str) {
        if let Ok(mut tables) = self.tables.write() {
            tables.sessions.remove(access_token);
        }
    }

    /// Makes every subsequent call fail, as if the backend were unreachable.
    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn events(&self) -> Vec<EventLogEntry> {
        self.tables
            .read()
            .map(|t| t.events.clone())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn note_count(&self) -> usize {
        self.tables.read().map(|t| t.notes.len()).unwrap_or_default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.check_available()?;
        self.tables
            .read()
            .map_err(|_| AppError::Internal(anyhow!("memory store lock poisoned")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.check_available()?;
        self.tables
            .write()
            .map_err(|_| AppError::Internal(anyhow!("memory store lock poisoned")))
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow!("memory store unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn authenticated_user(&self, access_token: &str) -> Result<Option<Uuid>, AppError> {
        Ok(self.read()?.sessions.get(access_token).copied())
    }

    async fn list_videos(&self, user_id: Uuid) -> Result<Vec<VideoRow>, AppError> {
        Ok(self
            .read()?
            .videos
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_video(&self, user_id: Uuid, video: &NewVideo) -> Result<VideoRow, AppError> {
        let row = VideoRow {
            id: Uuid::new_v4(),
            user_id,
            youtube_video_id: video.youtube_video_id.clone(),
            title: video.title.clone(),
            description: video.description.clone(),
            thumbnail_url: video.thumbnail_url.clone(),
            view_count: video.view_count,
            like_count: video.like_count,
            comment_count: video.comment_count,
            created_at: Utc::now(),
        };
        self.write()?.videos.insert(0, row.clone());
        Ok(row)
    }

    async fn update_video(
        &self,
        user_id: Uuid,
        video_id: Uuid,
        update: &VideoUpdate,
    ) -> Result<Option<VideoRow>, AppError> {
        let mut tables = self.write()?;
        Ok(tables
            .videos
            .iter_mut()
            .find(|v| v.id == video_id && v.user_id == user_id)
            .map(|v| {
                update.apply_to(v);
                v.clone()
            }))
    }

    async fn list_notes(
        &self,
        user_id: Uuid,
        video_id: Option<Uuid>,
    ) -> Result<Vec<NoteRow>, AppError> {
        Ok(self
            .read()?
            .notes
            .iter()
            .filter(|n| n.user_id == user_id && video_id.map_or(true, |id| n.video_id == id))
            .cloned()
            .collect())
    }

    async fn insert_note(&self, user_id: Uuid, note: &NewNote) -> Result<NoteRow, AppError> {
        let mut tables = self.write()?;
        let owns_video = tables
            .videos
            .iter()
            .any(|v| v.id == note.video_id && v.user_id == user_id);
        if !owns_video {
            return Err(AppError::NotFound(format!("Video {} not found", note.video_id)));
        }

        let row = NoteRow {
            id: Uuid::new_v4(),
            user_id,
            video_id: note.video_id,
            title: note.title.clone(),
            content: note.content.clone(),
            tags: note.tags.clone(),
            created_at: Utc::now(),
        };
        tables.notes.insert(0, row.clone());
        Ok(row)
    }

    async fn delete_note(&self, user_id: Uuid, note_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        let before = tables.notes.len();
        tables
            .notes
            .retain(|n| !(n.id == note_id && n.user_id == user_id));
        Ok(tables.notes.len() < before)
    }

    async fn insert_event(&self, entry: &EventLogEntry) -> Result<(), AppError> {
        self.write()?.events.push(entry.clone());
        Ok(())
    }
}
