//! Business rules for topics and replies.
//!
//! Each operation runs in a single transaction; returning early with an error drops the
//! transaction, which rolls it back.

pub mod replies;
pub mod topics;

pub use replies::ReplyService;
pub use topics::TopicService;
