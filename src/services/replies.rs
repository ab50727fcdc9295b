use chrono::Utc;
use sqlx::SqlitePool;

use crate::auth::Principal;
use crate::db::replies::{self, NewReply};
use crate::db::{topics, users};
use crate::error::AppError;
use crate::models::{Page, PageRequest, Reply, ReplyInput, ReplyUpdate};

#[derive(Clone)]
pub struct ReplyService {
    pool: SqlitePool,
}

impl ReplyService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Answers an active topic. The author defaults to the caller.
    pub async fn create(&self, caller: &Principal, input: ReplyInput) -> Result<Reply, AppError> {
        let author_id = input.author_id.unwrap_or(caller.user_id);

        let mut tx = self.pool.begin().await?;

        let author = users::find_by_id(&mut *tx, author_id).await?;
        if !author.map_or(false, |author| author.active) {
            return Err(AppError::NotFound(format!("User {} not found", author_id)));
        }
        if topics::find_active_by_id(&mut *tx, input.topic_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Topic {} not found", input.topic_id)));
        }

        let reply = replies::insert(
            &mut *tx,
            NewReply {
                message: input.message.trim(),
                author_id,
                topic_id: input.topic_id,
                created_at: Utc::now(),
            },
        )
        .await?;
        tx.commit().await?;

        log::info!("reply {} added to topic {} by user {}", reply.id, reply.topic_id, author_id);
        Ok(reply)
    }

    /// Active replies of a topic in id order.
    pub async fn list_by_topic(&self, topic_id: i64, request: PageRequest) -> Result<Page<Reply>, AppError> {
        let mut tx = self.pool.begin().await?;
        let (content, total) = replies::list_active_by_topic(&mut *tx, topic_id, request).await?;
        tx.commit().await?;

        Ok(Page::new(content, request, total))
    }

    pub async fn get(&self, id: i64) -> Result<Reply, AppError> {
        let mut tx = self.pool.begin().await?;
        let reply = replies::find_by_id(&mut *tx, id).await?;
        tx.commit().await?;

        reply.filter(|reply| reply.active).ok_or_else(|| reply_not_found(id))
    }

    pub async fn update(&self, id: i64, update: ReplyUpdate) -> Result<Reply, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut reply = active_reply(&mut tx, id).await?;

        let message = update.message.trim();
        replies::update_message(&mut *tx, id, message).await?;
        tx.commit().await?;

        reply.message = message.to_string();
        log::info!("reply {} updated", id);
        Ok(reply)
    }

    pub async fn soft_delete(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        active_reply(&mut tx, id).await?;
        replies::set_active(&mut *tx, id, false).await?;
        tx.commit().await?;

        log::info!("reply {} deactivated", id);
        Ok(())
    }

    /// Restores a reply without looking at its topic. Idempotent.
    pub async fn reactivate(&self, id: i64) -> Result<Reply, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut reply = replies::find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| reply_not_found(id))?;

        if !reply.active {
            replies::set_active(&mut *tx, id, true).await?;
            reply.active = true;
            log::info!("reply {} reactivated", id);
        }
        tx.commit().await?;

        Ok(reply)
    }
}

async fn active_reply(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>, id: i64) -> Result<Reply, AppError> {
    replies::find_by_id(&mut **tx, id)
        .await?
        .filter(|reply| reply.active)
        .ok_or_else(|| reply_not_found(id))
}

fn reply_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Reply {} not found", id))
}
