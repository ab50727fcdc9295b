pub mod auth;
pub mod health;
pub mod replies;
pub mod topics;

use actix_web::web;

use crate::error::{json_error_handler, query_error_handler};

/// Registers every route plus the payload configs that turn malformed input into 400s.
///
/// Authentication is not enforced here: wrap the app in [`AccessFilter`](crate::auth::AccessFilter)
/// and let the `Principal` extractors decide per route.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(health::health)
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .service(auth::login)
                        .service(auth::register),
                )
                .service(
                    web::scope("/topics")
                        .service(topics::list_topics)
                        .service(topics::create_topic)
                        // before "/{id}"
                        .service(topics::first_ten)
                        .service(topics::get_topic)
                        .service(topics::update_topic)
                        .service(topics::delete_topic)
                        .service(topics::reactivate_topic),
                )
                .service(
                    web::scope("/replies")
                        .service(replies::list_replies)
                        .service(replies::create_reply)
                        .service(replies::get_reply)
                        .service(replies::update_reply)
                        .service(replies::delete_reply)
                        .service(replies::reactivate_reply),
                ),
        );
}
