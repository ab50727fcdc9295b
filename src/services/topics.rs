use chrono::{TimeZone, Utc};
use sqlx::SqlitePool;

use crate::auth::Principal;
use crate::db::topics::{self, NewTopic, TopicFilter};
use crate::db::users;
use crate::error::AppError;
use crate::models::topic::DEFAULT_STATUS;
use crate::models::{Page, PageRequest, Topic, TopicInput, TopicQuery, TopicUpdate};

/// Size of the `first-ten` listing.
const FIRST_TOPICS_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct TopicService {
    pool: SqlitePool,
}

impl TopicService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a topic. The author defaults to the caller.
    pub async fn create(&self, caller: &Principal, input: TopicInput) -> Result<Topic, AppError> {
        let author_id = input.author_id.unwrap_or(caller.user_id);
        let title = input.title.trim();
        let message = input.message.trim();

        let mut tx = self.pool.begin().await?;

        let author = users::find_by_id(&mut *tx, author_id).await?;
        if !author.map_or(false, |author| author.active) {
            return Err(AppError::NotFound(format!("User {} not found", author_id)));
        }
        if topics::exists_by_title_and_message(&mut *tx, title, message, None).await? {
            return Err(duplicate_topic());
        }

        let topic = topics::insert(
            &mut *tx,
            NewTopic {
                title,
                message,
                status: DEFAULT_STATUS,
                author_id,
                course: input.course.trim(),
                created_at: Utc::now(),
            },
        )
        .await?;
        tx.commit().await?;

        log::info!("topic {} created by user {}", topic.id, author_id);
        Ok(topic)
    }

    /// Active topics in id order, optionally narrowed by course and creation year.
    pub async fn list(&self, query: &TopicQuery) -> Result<Page<Topic>, AppError> {
        let request = PageRequest::new(query.page, query.size);
        let filter = TopicFilter {
            course: query
                .course
                .as_deref()
                .map(str::trim)
                .filter(|course| !course.is_empty())
                .map(str::to_string),
            created_between: match query.year {
                Some(year) => Some(year_range(year)?),
                None => None,
            },
        };

        let mut tx = self.pool.begin().await?;
        let (content, total) = topics::list_active(&mut *tx, &filter, request).await?;
        tx.commit().await?;

        Ok(Page::new(content, request, total))
    }

    /// The ten oldest active topics.
    pub async fn first_ten(&self) -> Result<Vec<Topic>, AppError> {
        let mut tx = self.pool.begin().await?;
        let topics = topics::first_active_by_creation(&mut *tx, FIRST_TOPICS_LIMIT).await?;
        tx.commit().await?;
        Ok(topics)
    }

    pub async fn get(&self, id: i64) -> Result<Topic, AppError> {
        let mut tx = self.pool.begin().await?;
        let topic = topics::find_active_by_id(&mut *tx, id).await?;
        tx.commit().await?;
        topic.ok_or_else(|| topic_not_found(id))
    }

    /// Replaces the editable fields. Only the author or an administrator may do this.
    pub async fn update(
        &self,
        caller: &Principal,
        id: i64,
        update: TopicUpdate,
    ) -> Result<Topic, AppError> {
        let title = update.title.trim();
        let message = update.message.trim();

        let mut tx = self.pool.begin().await?;

        let existing = topics::find_active_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| topic_not_found(id))?;
        if !caller.can_modify(existing.author_id) {
            return Err(AppError::Forbidden(
                "Only the author or an administrator can modify this topic".into(),
            ));
        }
        if topics::exists_by_title_and_message(&mut *tx, title, message, Some(id)).await? {
            return Err(duplicate_topic());
        }

        topics::update(
            &mut *tx,
            id,
            title,
            message,
            update.status.trim(),
            update.course.trim(),
        )
        .await?;
        let topic = topics::find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| topic_not_found(id))?;
        tx.commit().await?;

        log::info!("topic {} updated by {}", id, caller.username);
        Ok(topic)
    }

    /// Hides an active topic.
    pub async fn soft_delete(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        if topics::find_active_by_id(&mut *tx, id).await?.is_none() {
            return Err(topic_not_found(id));
        }
        topics::set_active(&mut *tx, id, false).await?;
        tx.commit().await?;

        log::info!("topic {} deactivated", id);
        Ok(())
    }

    /// Makes a topic visible again. Reactivating an active topic changes nothing.
    pub async fn reactivate(&self, id: i64) -> Result<Topic, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut topic = topics::find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| topic_not_found(id))?;

        if !topic.active {
            topics::set_active(&mut *tx, id, true).await?;
            topic.active = true;
            log::info!("topic {} reactivated", id);
        }
        tx.commit().await?;

        Ok(topic)
    }
}

fn topic_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Topic {} not found", id))
}

fn duplicate_topic() -> AppError {
    AppError::Duplicate("A topic with the same title and message already exists".into())
}

fn year_range(year: i32) -> Result<(chrono::DateTime<Utc>, chrono::DateTime<Utc>), AppError> {
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single();
    let end = year
        .checked_add(1)
        .and_then(|next| Utc.with_ymd_and_hms(next, 1, 1, 0, 0, 0).single());

    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(AppError::BadRequest(format!("Invalid year: {}", year))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::services::testing;
    use pretty_assertions::assert_eq;

    fn input(title: &str, message: &str) -> TopicInput {
        TopicInput {
            title: title.to_string(),
            message: message.to_string(),
            author_id: None,
            course: "Rust".to_string(),
        }
    }

    fn update(title: &str, message: &str) -> TopicUpdate {
        TopicUpdate {
            title: title.to_string(),
            message: message.to_string(),
            status: "ANSWERED".to_string(),
            course: "Rust".to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_create_defaults_author_and_status() {
        let pool = testing::pool().await;
        let ada = testing::principal(&pool, "ada", Role::User).await;
        let service = TopicService::new(pool);

        let topic = service
            .create(&ada, input("  Lifetimes  ", "What does 'a mean?"))
            .await
            .unwrap();

        assert_eq!(topic.title, "Lifetimes");
        assert_eq!(topic.status, "OPEN");
        assert_eq!(topic.author_id, ada.user_id);
        assert_eq!(topic.author_name, "ada");
        assert!(topic.active);
    }

    #[actix_rt::test]
    async fn test_create_with_unknown_author_is_not_found() {
        let pool = testing::pool().await;
        let ada = testing::principal(&pool, "ada", Role::User).await;
        let service = TopicService::new(pool);

        let result = service
            .create(
                &ada,
                TopicInput {
                    author_id: Some(9999),
                    ..input("Lifetimes", "What does 'a mean?")
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn test_create_for_inactive_author_is_not_found() {
        let pool = testing::pool().await;
        let ada = testing::principal(&pool, "ada", Role::User).await;
        let grace = testing::principal(&pool, "grace", Role::User).await;
        testing::deactivate(&pool, grace.user_id).await;
        let service = TopicService::new(pool);

        let result = service
            .create(
                &ada,
                TopicInput {
                    author_id: Some(grace.user_id),
                    ..input("Lifetimes", "What does 'a mean?")
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn test_duplicate_title_and_message_is_rejected_even_when_inactive() {
        let pool = testing::pool().await;
        let ada = testing::principal(&pool, "ada", Role::User).await;
        let grace = testing::principal(&pool, "grace", Role::User).await;
        let service = TopicService::new(pool);

        let topic = service.create(&ada, input("Traits", "Static or dynamic?")).await.unwrap();
        let again = service.create(&grace, input("Traits", " Static or dynamic? ")).await;
        assert!(matches!(again, Err(AppError::Duplicate(_))));

        service.soft_delete(topic.id).await.unwrap();
        let after_delete = service.create(&grace, input("Traits", "Static or dynamic?")).await;
        assert!(matches!(after_delete, Err(AppError::Duplicate(_))));

        let different_message = service.create(&grace, input("Traits", "Object safety?")).await;
        assert!(different_message.is_ok());
    }

    #[actix_rt::test]
    async fn test_update_requires_author_or_admin() {
        let pool = testing::pool().await;
        let ada = testing::principal(&pool, "ada", Role::User).await;
        let grace = testing::principal(&pool, "grace", Role::User).await;
        let admin = testing::principal(&pool, "root", Role::Admin).await;
        let service = TopicService::new(pool);

        let topic = service.create(&ada, input("Macros", "macro_rules or proc?")).await.unwrap();

        let forbidden = service.update(&grace, topic.id, update("Macros", "Hijacked")).await;
        assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

        let by_author = service
            .update(&ada, topic.id, update("Macros", " Declarative macros "))
            .await
            .unwrap();
        assert_eq!(by_author.message, "Declarative macros");
        assert_eq!(by_author.status, "ANSWERED");

        let by_admin = service
            .update(&admin, topic.id, update("Macros 2", "Declarative macros"))
            .await
            .unwrap();
        assert_eq!(by_admin.title, "Macros 2");
        assert_eq!(by_admin.author_id, ada.user_id);
    }

    #[actix_rt::test]
    async fn test_update_checks_duplicates_against_other_topics_only() {
        let pool = testing::pool().await;
        let ada = testing::principal(&pool, "ada", Role::User).await;
        let service = TopicService::new(pool);

        let first = service.create(&ada, input("Async", "Pin?")).await.unwrap();
        let second = service.create(&ada, input("Async", "Send?")).await.unwrap();

        let unchanged = service.update(&ada, first.id, update("Async", "Pin?")).await;
        assert!(unchanged.is_ok());

        let clash = service.update(&ada, second.id, update("Async", "Pin?")).await;
        assert!(matches!(clash, Err(AppError::Duplicate(_))));

        let missing = service.update(&ada, 4242, update("Async", "Waker?")).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn test_soft_delete_hides_topic_until_reactivated() {
        let pool = testing::pool().await;
        let ada = testing::principal(&pool, "ada", Role::User).await;
        let service = TopicService::new(pool);

        let topic = service.create(&ada, input("Iterators", "Lazy?")).await.unwrap();
        service.soft_delete(topic.id).await.unwrap();

        assert!(matches!(service.get(topic.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.soft_delete(topic.id).await, Err(AppError::NotFound(_))));
        let page = service.list(&TopicQuery::default()).await.unwrap();
        assert_eq!(page.total_elements, 0);
        assert!(page.content.is_empty());

        let reactivated = service.reactivate(topic.id).await.unwrap();
        assert!(reactivated.active);
        assert_eq!(service.get(topic.id).await.unwrap().id, topic.id);
    }

    #[actix_rt::test]
    async fn test_reactivate_is_idempotent() {
        let pool = testing::pool().await;
        let ada = testing::principal(&pool, "ada", Role::User).await;
        let service = TopicService::new(pool);

        let topic = service.create(&ada, input("Closures", "Fn vs FnMut")).await.unwrap();
        let first = service.reactivate(topic.id).await.unwrap();
        let second = service.reactivate(topic.id).await.unwrap();

        assert!(first.active && second.active);
        assert_eq!(first.title, second.title);
        assert!(matches!(service.reactivate(777).await, Err(AppError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn test_list_paginates_and_filters() {
        let pool = testing::pool().await;
        let ada = testing::principal(&pool, "ada", Role::User).await;
        let service = TopicService::new(pool);

        for i in 0..5 {
            let mut topic = input(&format!("Topic {}", i), "body");
            if i % 2 == 0 {
                topic.course = "Databases".to_string();
            }
            service.create(&ada, topic).await.unwrap();
        }

        let page = service
            .list(&TopicQuery {
                page: Some(1),
                size: Some(2),
                ..TopicQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(
            page.content.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
            vec!["Topic 2", "Topic 3"]
        );

        let databases = service
            .list(&TopicQuery {
                course: Some("Databases".to_string()),
                ..TopicQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(databases.total_elements, 3);

        let this_year = chrono::Datelike::year(&Utc::now());
        let current = service
            .list(&TopicQuery {
                course: Some("Rust".to_string()),
                year: Some(this_year),
                ..TopicQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(current.total_elements, 2);

        let long_ago = service
            .list(&TopicQuery {
                year: Some(1999),
                ..TopicQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(long_ago.total_elements, 0);
    }

    #[actix_rt::test]
    async fn test_first_ten_skips_inactive_topics() {
        let pool = testing::pool().await;
        let ada = testing::principal(&pool, "ada", Role::User).await;
        let service = TopicService::new(pool);

        let mut ids = Vec::new();
        for i in 0..12 {
            let topic = service.create(&ada, input(&format!("T{}", i), "m")).await.unwrap();
            ids.push(topic.id);
        }
        service.soft_delete(ids[0]).await.unwrap();

        let first = service.first_ten().await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].id, ids[1]);
        assert!(first.iter().all(|t| t.active));
    }
}
