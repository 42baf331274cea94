use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::event::EventLogEntry;
use crate::models::note::{NewNote, NoteRow};
use crate::models::video::{NewVideo, VideoRow, VideoUpdate};
use crate::store::Store;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn authenticated_user(&self, access_token: &str) -> Result<Option<Uuid>, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT user_id FROM user_sessions WHERE access_token = $1 AND expires_at > now()",
        )
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_videos(&self, user_id: Uuid) -> Result<Vec<VideoRow>, AppError> {
        Ok(sqlx::query_as::<_, VideoRow>(
            "SELECT * FROM videos WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_video(&self, user_id: Uuid, video: &NewVideo) -> Result<VideoRow, AppError> {
        let row = sqlx::query_as::<_, VideoRow>(
            r#"
            INSERT INTO videos
                (user_id, youtube_video_id, title, description, thumbnail_url,
                 view_count, like_count, comment_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&video.youtube_video_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(video.view_count)
        .bind(video.like_count)
        .bind(video.comment_count)
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted video {} ({}) for user {user_id}", row.id, row.youtube_video_id);
        Ok(row)
    }

    async fn update_video(
        &self,
        user_id: Uuid,
        video_id: Uuid,
        update: &VideoUpdate,
    ) -> Result<Option<VideoRow>, AppError> {
        Ok(sqlx::query_as::<_, VideoRow>(
            r#"
            UPDATE videos SET
                title         = COALESCE($3, title),
                description   = COALESCE($4, description),
                view_count    = COALESCE($5, view_count),
                like_count    = COALESCE($6, like_count),
                comment_count = COALESCE($7, comment_count)
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(video_id)
        .bind(user_id)
        .bind(update.title.as_deref())
        .bind(update.description.as_deref())
        .bind(update.view_count)
        .bind(update.like_count)
        .bind(update.comment_count)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_notes(
        &self,
        user_id: Uuid,
        video_id: Option<Uuid>,
    ) -> Result<Vec<NoteRow>, AppError> {
        Ok(sqlx::query_as::<_, NoteRow>(
            r#"
            SELECT * FROM notes
            WHERE user_id = $1 AND ($2::uuid IS NULL OR video_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(video_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_note(&self, user_id: Uuid, note: &NewNote) -> Result<NoteRow, AppError> {
        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            INSERT INTO notes (user_id, video_id, title, content, tags)
            SELECT $1, v.id, $3, $4, $5
            FROM videos v
            WHERE v.id = $2 AND v.user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(note.video_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.tags)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", note.video_id)))?;

        info!("Inserted note {} on video {} for user {user_id}", row.id, row.video_id);
        Ok(row)
    }

    async fn delete_note(&self, user_id: Uuid, note_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(note_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_event(&self, entry: &EventLogEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO event_logs (user_id, event_type, event_data, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.event_type)
        .bind(&entry.event_data)
        .bind(&entry.user_agent)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
