#![doc = "The `forumhub` library crate."]
#![doc = ""]
#![doc = "A forum backend: users open topics, others reply, and a bearer token gates every"]
#![doc = "change. Handlers in `routes` call the services, which apply the business rules"]
#![doc = "inside one database transaction per operation."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use crate::error::AppError;
pub use crate::state::AppState;
