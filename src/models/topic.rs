use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::not_blank;

/// Status given to every new topic.
pub const DEFAULT_STATUS: &str = "OPEN";

/// A topic as stored and returned by the API, joined with its author's display name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Topic {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    /// Free-text status such as "OPEN", "CLOSED" or "ANSWERED".
    pub status: String,
    pub author_id: i64,
    pub author_name: String,
    pub course: String,
    /// `false` once soft-deleted.
    pub active: bool,
}

/// Payload for creating a topic.
#[derive(Debug, Deserialize, Validate)]
pub struct TopicInput {
    #[validate(
        custom = "not_blank",
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub title: String,
    #[validate(custom = "not_blank")]
    pub message: String,
    /// Defaults to the authenticated caller when omitted.
    pub author_id: Option<i64>,
    #[validate(
        custom = "not_blank",
        length(max = 150, message = "must be at most 150 characters")
    )]
    pub course: String,
}

/// Payload for replacing a topic's editable fields.
#[derive(Debug, Deserialize, Validate)]
pub struct TopicUpdate {
    #[validate(
        custom = "not_blank",
        length(max = 255, message = "must be at most 255 characters")
    )]
    pub title: String,
    #[validate(custom = "not_blank")]
    pub message: String,
    #[validate(
        custom = "not_blank",
        length(max = 50, message = "must be at most 50 characters")
    )]
    pub status: String,
    #[validate(
        custom = "not_blank",
        length(max = 150, message = "must be at most 150 characters")
    )]
    pub course: String,
}

/// Query parameters for listing topics.
#[derive(Debug, Default, Deserialize)]
pub struct TopicQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// Exact course name.
    pub course: Option<String>,
    /// Creation year (UTC).
    pub year: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> TopicInput {
        TopicInput {
            title: "Borrow checker".to_string(),
            message: "Why does this not compile?".to_string(),
            author_id: None,
            course: "Rust".to_string(),
        }
    }

    #[test]
    fn test_topic_input_validation() {
        assert!(valid_input().validate().is_ok());

        let blank_title = TopicInput {
            title: "   ".to_string(),
            ..valid_input()
        };
        let errors = blank_title.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));

        let long_course = TopicInput {
            course: "c".repeat(151),
            ..valid_input()
        };
        let errors = long_course.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("course"));
    }

    #[test]
    fn test_topic_update_validation() {
        let update = TopicUpdate {
            title: "Title".to_string(),
            message: "Message".to_string(),
            status: "s".repeat(51),
            course: "".to_string(),
        };
        let errors = update.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("status"));
        assert!(fields.contains_key("course"));
        assert!(!fields.contains_key("title"));
    }
}
