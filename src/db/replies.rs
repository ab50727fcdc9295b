use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::models::{PageRequest, Reply};

const SELECT_REPLY: &str = "SELECT r.id, r.message, r.created_at, r.author_id, \
     u.name AS author_name, r.topic_id, r.active \
     FROM replies r JOIN users u ON u.id = r.author_id";

pub struct NewReply<'a> {
    pub message: &'a str,
    pub author_id: i64,
    pub topic_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Looks a reply up regardless of its active flag.
pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Reply>, sqlx::Error> {
    sqlx::query_as::<_, Reply>(&format!("{} WHERE r.id = ?", SELECT_REPLY))
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn insert(conn: &mut SqliteConnection, reply: NewReply<'_>) -> Result<Reply, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO replies (message, created_at, author_id, topic_id, active) VALUES (?, ?, ?, ?, 1)",
    )
    .bind(reply.message)
    .bind(reply.created_at)
    .bind(reply.author_id)
    .bind(reply.topic_id)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    find_by_id(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_message(conn: &mut SqliteConnection, id: i64, message: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE replies SET message = ? WHERE id = ?")
        .bind(message)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_active(conn: &mut SqliteConnection, id: i64, active: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE replies SET active = ? WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// One page of a topic's active replies in id order, plus the total.
pub async fn list_active_by_topic(
    conn: &mut SqliteConnection,
    topic_id: i64,
    page: PageRequest,
) -> Result<(Vec<Reply>, i64), sqlx::Error> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM replies WHERE topic_id = ? AND active = 1",
    )
    .bind(topic_id)
    .fetch_one(&mut *conn)
    .await?;

    let replies = sqlx::query_as::<_, Reply>(&format!(
        "{} WHERE r.topic_id = ? AND r.active = 1 ORDER BY r.id ASC LIMIT ? OFFSET ?",
        SELECT_REPLY
    ))
    .bind(topic_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&mut *conn)
    .await?;

    Ok((replies, total))
}
