use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteConnection};

use crate::models::{PageRequest, Topic};

const SELECT_TOPIC: &str = "SELECT t.id, t.title, t.message, t.created_at, t.status, t.author_id, \
     u.name AS author_name, t.course, t.active \
     FROM topics t JOIN users u ON u.id = t.author_id";

/// Column values for a new topic row.
pub struct NewTopic<'a> {
    pub title: &'a str,
    pub message: &'a str,
    pub status: &'a str,
    pub author_id: i64,
    pub course: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Restrictions applied on top of `active = 1` when listing.
#[derive(Debug, Default, Clone)]
pub struct TopicFilter {
    pub course: Option<String>,
    /// Half-open creation interval `[from, to)`.
    pub created_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

/// Looks a topic up regardless of its active flag.
pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Topic>, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!("{} WHERE t.id = ?", SELECT_TOPIC))
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_active_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Topic>, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!("{} WHERE t.id = ? AND t.active = 1", SELECT_TOPIC))
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Whether any topic, active or not, already has this exact title and message.
/// `excluding` leaves one topic id out of the comparison.
pub async fn exists_by_title_and_message(
    conn: &mut SqliteConnection,
    title: &str,
    message: &str,
    excluding: Option<i64>,
) -> Result<bool, sqlx::Error> {
    match excluding {
        Some(id) => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM topics WHERE title = ? AND message = ? AND id <> ?)",
            )
            .bind(title)
            .bind(message)
            .bind(id)
            .fetch_one(conn)
            .await
        }
        None => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM topics WHERE title = ? AND message = ?)",
            )
            .bind(title)
            .bind(message)
            .fetch_one(conn)
            .await
        }
    }
}

/// Inserts an active topic and returns it joined with its author.
pub async fn insert(conn: &mut SqliteConnection, topic: NewTopic<'_>) -> Result<Topic, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO topics (title, message, created_at, status, author_id, course, active) \
         VALUES (?, ?, ?, ?, ?, ?, 1)",
    )
    .bind(topic.title)
    .bind(topic.message)
    .bind(topic.created_at)
    .bind(topic.status)
    .bind(topic.author_id)
    .bind(topic.course)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    find_by_id(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    title: &str,
    message: &str,
    status: &str,
    course: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE topics SET title = ?, message = ?, status = ?, course = ? WHERE id = ?")
        .bind(title)
        .bind(message)
        .bind(status)
        .bind(course)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_active(conn: &mut SqliteConnection, id: i64, active: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE topics SET active = ? WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// One page of active topics in id order, plus the total number of matches.
pub async fn list_active(
    conn: &mut SqliteConnection,
    filter: &TopicFilter,
    page: PageRequest,
) -> Result<(Vec<Topic>, i64), sqlx::Error> {
    let mut conditions = vec!["t.active = 1"];
    if filter.course.is_some() {
        conditions.push("t.course = ?");
    }
    if filter.created_between.is_some() {
        conditions.push("t.created_at >= ?");
        conditions.push("t.created_at < ?");
    }
    let where_clause = conditions.join(" AND ");

    let count_sql = format!("SELECT COUNT(*) FROM topics t WHERE {}", where_clause);
    let list_sql = format!(
        "{} WHERE {} ORDER BY t.id ASC LIMIT ? OFFSET ?",
        SELECT_TOPIC, where_clause
    );

    let mut count_query = sqlx::query_scalar::<Sqlite, i64>(&count_sql);
    let mut list_query = sqlx::query_as::<Sqlite, Topic>(&list_sql);

    if let Some(course) = &filter.course {
        count_query = count_query.bind(course.clone());
        list_query = list_query.bind(course.clone());
    }
    if let Some((from, to)) = filter.created_between {
        count_query = count_query.bind(from).bind(to);
        list_query = list_query.bind(from).bind(to);
    }

    let total = count_query.fetch_one(&mut *conn).await?;
    let topics = list_query
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

    Ok((topics, total))
}

/// The earliest active topics by creation time.
pub async fn first_active_by_creation(
    conn: &mut SqliteConnection,
    limit: i64,
) -> Result<Vec<Topic>, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!(
        "{} WHERE t.active = 1 ORDER BY t.created_at ASC, t.id ASC LIMIT ?",
        SELECT_TOPIC
    ))
    .bind(limit)
    .fetch_all(conn)
    .await
}
