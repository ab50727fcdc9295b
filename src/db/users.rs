use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::models::{Role, User};

/// Column values for a new user row.
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, name, password_hash, role, active, created_at \
         FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn find_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, name, password_hash, role, active, created_at \
         FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(conn)
    .await
}

pub async fn exists_by_username(conn: &mut SqliteConnection, username: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
        .bind(username)
        .fetch_one(conn)
        .await
}

pub async fn exists_by_email(conn: &mut SqliteConnection, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
        .bind(email)
        .fetch_one(conn)
        .await
}

/// Inserts the user and returns the stored row.
pub async fn insert(conn: &mut SqliteConnection, user: NewUser<'_>) -> Result<User, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO users (username, email, name, password_hash, role, active, created_at) \
         VALUES (?, ?, ?, ?, ?, 1, ?)",
    )
    .bind(user.username)
    .bind(user.email)
    .bind(user.name)
    .bind(user.password_hash)
    .bind(user.role.as_str())
    .bind(user.created_at)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    find_by_id(conn, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn set_role(conn: &mut SqliteConnection, id: i64, role: Role) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_active(conn: &mut SqliteConnection, id: i64, active: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET active = ? WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
