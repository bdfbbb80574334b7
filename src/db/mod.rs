//! Database module: row models, the `Store` seam and its Postgres backing.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring the hosted database rows
//! - `schema.rs`: bootstrap DDL for local development databases
//! - `postgres.rs`: `Store` implementation over a sqlx Postgres pool

pub mod models;
pub mod postgres;
pub mod schema;

use async_trait::async_trait;

use crate::error::AmurexError;
pub use models::{
    DbDocument, DbMeeting, DbUser, GoogleConnection, GoogleTokenVersion, NewDocument,
    NotionConnection,
};
pub use postgres::{PgStore, connect};
pub use schema::POSTGRES_INIT;

/// Data access used by the route handlers.
///
/// Update methods return `false` when no row matched the id.
#[async_trait]
pub trait Store: Send + Sync {
    async fn user(&self, user_id: &str) -> Result<Option<DbUser>, AmurexError>;

    async fn save_google_connection(
        &self,
        user_id: &str,
        conn: &GoogleConnection,
    ) -> Result<bool, AmurexError>;

    /// Replace the stored access token after a refresh.
    async fn update_google_access_token(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<bool, AmurexError>;

    async fn save_notion_connection(
        &self,
        user_id: &str,
        conn: &NotionConnection,
    ) -> Result<bool, AmurexError>;

    async fn meeting(&self, id: &str) -> Result<Option<DbMeeting>, AmurexError>;

    async fn documents_for_user(&self, user_id: &str) -> Result<Vec<DbDocument>, AmurexError>;

    async fn search_documents(
        &self,
        user_id: &str,
        query: &str,
        limit: i64,
    ) -> Result<Vec<DbDocument>, AmurexError>;

    /// Insert or update by `(user_id, url)`. Returns the row id.
    async fn upsert_document(&self, doc: &NewDocument) -> Result<String, AmurexError>;
}
