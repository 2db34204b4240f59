//! # slackterm-store
//!
//! Durable identity cache for slack-term, backed by SQLite.
//!
//! The store is deliberately narrow: a single `users` table mapping a remote
//! user id to a display name and the epoch second it was last resolved.
//! Freshness (the 7 day TTL) is applied on read.

pub mod database;
pub mod migrations;
pub mod models;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
