use crate::db::Store;
use crate::db::models::{
    DbDocument, DbMeeting, DbUser, GoogleConnection, NewDocument, NotionConnection,
};
use crate::db::schema::POSTGRES_INIT;
use crate::error::AmurexError;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

pub type PgPool = Pool<Postgres>;

const USER_COLUMNS: &str = r#"id::text AS id, email, google_access_token, google_refresh_token,
    google_token_version, google_docs_connected, notion_access_token,
    notion_workspace_id, notion_workspace_name, notion_connected"#;

const DOCUMENT_COLUMNS: &str =
    "id::text AS id, user_id::text AS user_id, title, text, url, type, created_at";

/// Open a pool against the hosted database.
pub async fn connect(database_url: &str) -> Result<PgPool, AmurexError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), AmurexError> {
        for stmt in POSTGRES_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        info!("database schema initialized");
        Ok(())
    }
}

/// Ids arrive from the browser as strings; anything that is not a uuid cannot
/// match a row.
fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id.trim()).ok()
}

/// Escape LIKE metacharacters so the query is matched literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl Store for PgStore {
    async fn user(&self, user_id: &str) -> Result<Option<DbUser>, AmurexError> {
        let Some(id) = parse_id(user_id) else {
            return Ok(None);
        };
        let user = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn save_google_connection(
        &self,
        user_id: &str,
        conn: &GoogleConnection,
    ) -> Result<bool, AmurexError> {
        let Some(id) = parse_id(user_id) else {
            return Ok(false);
        };
        let res = sqlx::query(
            r#"UPDATE users SET
                google_access_token = $1,
                google_refresh_token = $2,
                google_token_version = $3,
                google_docs_connected = TRUE
              WHERE id = $4"#,
        )
        .bind(&conn.access_token)
        .bind(&conn.refresh_token)
        .bind(conn.version.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn update_google_access_token(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<bool, AmurexError> {
        let Some(id) = parse_id(user_id) else {
            return Ok(false);
        };
        let res = sqlx::query("UPDATE users SET google_access_token = $1 WHERE id = $2")
            .bind(access_token)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn save_notion_connection(
        &self,
        user_id: &str,
        conn: &NotionConnection,
    ) -> Result<bool, AmurexError> {
        let Some(id) = parse_id(user_id) else {
            return Ok(false);
        };
        let res = sqlx::query(
            r#"UPDATE users SET
                notion_access_token = $1,
                notion_workspace_id = $2,
                notion_workspace_name = $3,
                notion_connected = TRUE
              WHERE id = $4"#,
        )
        .bind(&conn.access_token)
        .bind(&conn.workspace_id)
        .bind(&conn.workspace_name)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn meeting(&self, id: &str) -> Result<Option<DbMeeting>, AmurexError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let meeting = sqlx::query_as::<_, DbMeeting>(
            r#"SELECT id::text AS id, user_id::text AS user_id, meeting_id, summary,
               transcript, action_items, created_at
               FROM late_meeting WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(meeting)
    }

    async fn documents_for_user(&self, user_id: &str) -> Result<Vec<DbDocument>, AmurexError> {
        let Some(id) = parse_id(user_id) else {
            return Ok(Vec::new());
        };
        let docs = sqlx::query_as::<_, DbDocument>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    async fn search_documents(
        &self,
        user_id: &str,
        query: &str,
        limit: i64,
    ) -> Result<Vec<DbDocument>, AmurexError> {
        let Some(id) = parse_id(user_id) else {
            return Ok(Vec::new());
        };
        let docs = sqlx::query_as::<_, DbDocument>(&format!(
            r#"SELECT {DOCUMENT_COLUMNS} FROM documents
               WHERE user_id = $1
                 AND (title ILIKE $2 ESCAPE '\' OR text ILIKE $2 ESCAPE '\')
               ORDER BY created_at DESC
               LIMIT $3"#
        ))
        .bind(id)
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    async fn upsert_document(&self, doc: &NewDocument) -> Result<String, AmurexError> {
        let user_id = parse_id(&doc.user_id)
            .ok_or_else(|| AmurexError::BadRequest("Invalid user id".to_string()))?;
        let rec: (String,) = sqlx::query_as(
            r#"
            INSERT INTO documents (user_id, title, text, url, type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, url) DO UPDATE SET
                title = excluded.title,
                text = excluded.text,
                type = excluded.type
            RETURNING id::text
            "#,
        )
        .bind(user_id)
        .bind(&doc.title)
        .bind(&doc.text)
        .bind(&doc.url)
        .bind(doc.doc_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(rec.0)
    }
}
