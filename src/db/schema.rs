//! Bootstrap DDL for a local Postgres.
//! The hosted database owns the real schema; this mirrors only the columns
//! the service reads and writes.

pub const POSTGRES_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email TEXT NULL,
    google_access_token TEXT NULL,
    google_refresh_token TEXT NULL,
    google_token_version TEXT NULL, -- 'old' | 'new'
    google_docs_connected BOOLEAN NULL DEFAULT FALSE,
    notion_access_token TEXT NULL,
    notion_workspace_id TEXT NULL,
    notion_workspace_name TEXT NULL,
    notion_connected BOOLEAN NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS documents (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title TEXT NULL,
    text TEXT NULL,
    url TEXT NULL,
    type TEXT NULL, -- 'google_docs' | 'notion'
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (user_id, url)
);

CREATE INDEX IF NOT EXISTS idx_documents_user_id ON documents(user_id);

CREATE TABLE IF NOT EXISTS late_meeting (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NULL REFERENCES users(id) ON DELETE SET NULL,
    meeting_id TEXT NULL,
    summary TEXT NULL,
    transcript TEXT NULL,
    action_items TEXT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;
