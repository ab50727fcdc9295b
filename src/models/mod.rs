pub mod page;
pub mod reply;
pub mod topic;
pub mod user;

pub use page::{Page, PageRequest};
pub use reply::{Reply, ReplyInput, ReplyQuery, ReplyUpdate};
pub use topic::{Topic, TopicInput, TopicQuery, TopicUpdate};
pub use user::{Role, User, UserView};

use validator::ValidationError;

/// Rejects empty and whitespace-only strings; the services persist trimmed values.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}
