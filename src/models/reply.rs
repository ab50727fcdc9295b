use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::not_blank;

/// A reply as stored and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reply {
    pub id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
    pub author_name: String,
    pub topic_id: i64,
    pub active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplyInput {
    #[validate(custom = "not_blank")]
    pub message: String,
    /// Defaults to the authenticated caller when omitted.
    pub author_id: Option<i64>,
    pub topic_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplyUpdate {
    #[validate(custom = "not_blank")]
    pub message: String,
}

/// Query parameters for listing the replies of a topic.
#[derive(Debug, Deserialize)]
pub struct ReplyQuery {
    #[serde(rename = "topicId", alias = "topic_id")]
    pub topic_id: i64,
    pub page: Option<u32>,
    pub size: Option<u32>,
}
