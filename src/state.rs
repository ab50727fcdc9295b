use sqlx::SqlitePool;

use crate::auth::{CredentialStore, TokenService};
use crate::services::{ReplyService, TopicService};

/// Shared application state, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenService,
    pub credentials: CredentialStore,
    pub topics: TopicService,
    pub replies: ReplyService,
}

impl AppState {
    pub fn new(pool: SqlitePool, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            tokens,
            credentials: CredentialStore::new(pool.clone(), bcrypt_cost),
            topics: TopicService::new(pool.clone()),
            replies: ReplyService::new(pool),
        }
    }
}
