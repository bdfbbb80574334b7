use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Success,
    Error,
}

/// Outcome of importing one document, returned by the import routes and
/// echoed back by the browser to the notification route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub status: ImportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportResult {
    pub fn success(id: String, title: String, url: String) -> Self {
        Self {
            id: Some(id),
            title,
            url: Some(url),
            status: ImportStatus::Success,
            error: None,
        }
    }

    pub fn failed(title: String, url: Option<String>, error: impl ToString) -> Self {
        Self {
            id: None,
            title,
            url,
            status: ImportStatus::Error,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ImportStatus::Success
    }
}

/// Response body shared by the Google and Notion import routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub success: bool,
    pub results: Vec<ImportResult>,
}
