use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored flag selecting which Google OAuth client a user is bound to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoogleTokenVersion {
    /// Users connected through the legacy Google Cloud project.
    Old,
    #[default]
    New,
}

impl GoogleTokenVersion {
    /// Unset or unrecognised values map to the current client.
    pub fn from_column(value: Option<&str>) -> Self {
        match value {
            Some("old") => Self::Old,
            _ => Self::New,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Old => "old",
            Self::New => "new",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbUser {
    pub id: String,
    pub email: Option<String>,
    pub google_access_token: Option<String>,
    pub google_refresh_token: Option<String>,
    pub google_token_version: Option<String>,
    pub google_docs_connected: Option<bool>,
    pub notion_access_token: Option<String>,
    pub notion_workspace_id: Option<String>,
    pub notion_workspace_name: Option<String>,
    pub notion_connected: Option<bool>,
}

impl DbUser {
    pub fn token_version(&self) -> GoogleTokenVersion {
        GoogleTokenVersion::from_column(self.google_token_version.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoogleConnection {
    pub access_token: String,
    pub refresh_token: String,
    pub version: GoogleTokenVersion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotionConnection {
    pub access_token: String,
    pub workspace_id: Option<String>,
    pub workspace_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbDocument {
    pub id: String,
    pub user_id: String,
    pub title: Option<String>,
    pub text: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub doc_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub user_id: String,
    pub title: String,
    pub text: String,
    pub url: String,
    pub doc_type: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbMeeting {
    pub id: String,
    pub user_id: Option<String>,
    pub meeting_id: Option<String>,
    pub summary: Option<String>,
    pub transcript: Option<String>,
    pub action_items: Option<String>,
    pub created_at: DateTime<Utc>,
}
