#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use amurex_api::config::Config;
use amurex_api::db::{
    DbDocument, DbMeeting, DbUser, GoogleConnection, NewDocument, NotionConnection, Store,
};
use amurex_api::{AmurexError, AmurexState, amurex_router};
use async_trait::async_trait;
use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::{Path, Query, State},
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine;
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

pub const USER_ID: &str = "5f0c1a8e-2b7d-4c3e-9a61-0d4b8e2f7c11";
pub const LEGACY_USER_ID: &str = "9b2e4d6f-8a1c-4e3b-b5d7-1f3a5c7e9b20";
pub const OTHER_USER_ID: &str = "c4d5e6f7-0a1b-4c2d-8e3f-a4b5c6d7e8f9";
pub const MEETING_ID: &str = "0e7d1c2b-3a4f-4e5d-8c6b-7a8f9e0d1c2b";
pub const VALID_BEARER: &str = "valid-session-token";
pub const OUTAGE_BEARER: &str = "token-during-outage";
pub const THROTTLED_BEARER: &str = "token-while-throttled";
pub const OPENAI_KEY: &str = "sk-test";

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    pub users: Mutex<HashMap<String, DbUser>>,
    pub meetings: Mutex<HashMap<String, DbMeeting>>,
    pub documents: Mutex<Vec<DbDocument>>,
}

pub fn user(id: &str, version: Option<&str>) -> DbUser {
    DbUser {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        google_access_token: None,
        google_refresh_token: None,
        google_token_version: version.map(str::to_string),
        google_docs_connected: Some(false),
        notion_access_token: None,
        notion_workspace_id: None,
        notion_workspace_name: None,
        notion_connected: Some(false),
    }
}

pub fn document(user_id: &str, title: &str, text: &str) -> DbDocument {
    DbDocument {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        title: Some(title.to_string()),
        text: Some(text.to_string()),
        url: Some(format!("https://docs.example.com/{title}")),
        doc_type: Some("google_docs".to_string()),
        created_at: Utc::now(),
    }
}

impl MemoryStore {
    pub fn seeded() -> Self {
        let store = Self::default();
        {
            let mut users = store.users.lock().unwrap();
            users.insert(USER_ID.to_string(), user(USER_ID, Some("new")));
            users.insert(LEGACY_USER_ID.to_string(), user(LEGACY_USER_ID, Some("old")));
            users.insert(OTHER_USER_ID.to_string(), user(OTHER_USER_ID, None));
        }
        store.meetings.lock().unwrap().insert(
            MEETING_ID.to_string(),
            DbMeeting {
                id: MEETING_ID.to_string(),
                user_id: Some(USER_ID.to_string()),
                meeting_id: Some("abc-defg-hij".to_string()),
                summary: Some("Agreed on the Q3 roadmap".to_string()),
                transcript: Some("Alice: let's ship it".to_string()),
                action_items: Some("- Draft launch post".to_string()),
                created_at: Utc::now(),
            },
        );
        store
    }

    pub fn user_row(&self, id: &str) -> DbUser {
        self.users.lock().unwrap().get(id).cloned().unwrap()
    }

    pub fn update_user(&self, id: &str, f: impl FnOnce(&mut DbUser)) {
        let mut users = self.users.lock().unwrap();
        f(users.get_mut(id).unwrap());
    }

    pub fn add_document(&self, doc: DbDocument) {
        self.documents.lock().unwrap().push(doc);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn user(&self, user_id: &str) -> Result<Option<DbUser>, AmurexError> {
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }

    async fn save_google_connection(
        &self,
        user_id: &str,
        conn: &GoogleConnection,
    ) -> Result<bool, AmurexError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };
        user.google_access_token = Some(conn.access_token.clone());
        user.google_refresh_token = Some(conn.refresh_token.clone());
        user.google_token_version = Some(conn.version.as_str().to_string());
        user.google_docs_connected = Some(true);
        Ok(true)
    }

    async fn update_google_access_token(
        &self,
        user_id: &str,
        access_token: &str,
    ) -> Result<bool, AmurexError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };
        user.google_access_token = Some(access_token.to_string());
        Ok(true)
    }

    async fn save_notion_connection(
        &self,
        user_id: &str,
        conn: &NotionConnection,
    ) -> Result<bool, AmurexError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };
        user.notion_access_token = Some(conn.access_token.clone());
        user.notion_workspace_id = conn.workspace_id.clone();
        user.notion_workspace_name = conn.workspace_name.clone();
        user.notion_connected = Some(true);
        Ok(true)
    }

    async fn meeting(&self, id: &str) -> Result<Option<DbMeeting>, AmurexError> {
        Ok(self.meetings.lock().unwrap().get(id).cloned())
    }

    async fn documents_for_user(&self, user_id: &str) -> Result<Vec<DbDocument>, AmurexError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn search_documents(
        &self,
        user_id: &str,
        query: &str,
        limit: i64,
    ) -> Result<Vec<DbDocument>, AmurexError> {
        let needle = query.to_lowercase();
        let hit = |field: &Option<String>| {
            field
                .as_deref()
                .is_some_and(|v| v.to_lowercase().contains(&needle))
        };
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.user_id == user_id && (hit(&d.title) || hit(&d.text)))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn upsert_document(&self, doc: &NewDocument) -> Result<String, AmurexError> {
        let mut docs = self.documents.lock().unwrap();
        if let Some(existing) = docs
            .iter_mut()
            .find(|d| d.user_id == doc.user_id && d.url.as_deref() == Some(doc.url.as_str()))
        {
            existing.title = Some(doc.title.clone());
            existing.text = Some(doc.text.clone());
            return Ok(existing.id.clone());
        }
        let id = uuid::Uuid::new_v4().to_string();
        docs.push(DbDocument {
            id: id.clone(),
            user_id: doc.user_id.clone(),
            title: Some(doc.title.clone()),
            text: Some(doc.text.clone()),
            url: Some(doc.url.clone()),
            doc_type: Some(doc.doc_type.to_string()),
            created_at: Utc::now(),
        });
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Fake upstream providers
// ---------------------------------------------------------------------------

/// Requests received by the fake upstream, for assertions.
#[derive(Clone, Default)]
pub struct Recorded {
    pub emails: Arc<Mutex<Vec<Value>>>,
    pub completions: Arc<Mutex<Vec<Value>>>,
    pub token_requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

fn basic_auth_user(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD.decode(raw).ok()?;
    let pair = String::from_utf8(decoded).ok()?;
    pair.split(':').next().map(str::to_string)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

async fn chat_completions(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if bearer(&headers).as_deref() != Some(OPENAI_KEY) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}})),
        )
            .into_response();
    }
    rec.completions.lock().unwrap().push(body.clone());
    let prompt = body
        .pointer("/messages/1/content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if prompt.contains("overload") {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": {"message": "The engine is currently overloaded"}})),
        )
            .into_response();
    }
    let sse = [
        r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
        r#"{"choices":[{"delta":{"content":"The launch"}}]}"#,
        r#"{"choices":[{"delta":{"content":" went well."}}]}"#,
        r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        "[DONE]",
    ]
    .iter()
    .map(|e| format!("data: {e}\n\n"))
    .collect::<String>();
    ([(header::CONTENT_TYPE, "text/event-stream")], sse).into_response()
}

async fn google_token(State(rec): State<Recorded>, headers: HeaderMap, body: String) -> Response {
    let form: HashMap<String, String> = url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect();
    rec.token_requests.lock().unwrap().push(form.clone());
    let client_id = basic_auth_user(&headers)
        .or_else(|| form.get("client_id").cloned())
        .unwrap_or_default();

    let grant = form.get("grant_type").map(String::as_str);
    let rejected = match grant {
        Some("authorization_code") => form.get("code").map(String::as_str) == Some("bad-code"),
        Some("refresh_token") => {
            form.get("refresh_token").map(String::as_str) == Some("revoked-refresh")
        }
        _ => true,
    };
    if rejected {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Bad Request"})),
        )
            .into_response();
    }

    let mut token = json!({
        "access_token": format!("access-for-{client_id}"),
        "expires_in": 3599,
        "token_type": "Bearer",
        "scope": "https://www.googleapis.com/auth/drive.readonly https://www.googleapis.com/auth/userinfo.email",
    });
    if grant == Some("authorization_code") {
        token["refresh_token"] = json!(format!("refresh-for-{client_id}"));
    }
    Json(token).into_response()
}

async fn drive_files(headers: HeaderMap) -> Response {
    if bearer(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "files": [
            {"id": "doc-1", "name": "Q3 plan", "webViewLink": "https://docs.google.com/document/d/doc-1/edit"},
            {"id": "doc-locked", "name": "Payroll"}
        ]
    }))
    .into_response()
}

async fn drive_export(Path(id): Path<String>, headers: HeaderMap) -> Response {
    if bearer(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match id.as_str() {
        "doc-1" => "Ship the importer by September.".into_response(),
        _ => (
            StatusCode::FORBIDDEN,
            Json(json!({"error": {"code": 403, "message": "Export of this file is not allowed"}})),
        )
            .into_response(),
    }
}

async fn supabase_user(headers: HeaderMap) -> Response {
    match bearer(&headers).as_deref() {
        Some(VALID_BEARER) => Json(json!({"id": USER_ID, "email": "owner@example.com"})).into_response(),
        Some(OUTAGE_BEARER) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"message": "upstream connect error"})),
        )
            .into_response(),
        Some(THROTTLED_BEARER) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"message": "Request rate limit reached"})),
        )
            .into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": 401, "msg": "invalid JWT: unable to parse or verify signature"})),
        )
            .into_response(),
    }
}

async fn resend_emails(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if bearer(&headers).is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"statusCode": 401, "message": "Missing API key in the authorization header"})),
        )
            .into_response();
    }
    let to = body.pointer("/to/0").and_then(Value::as_str).unwrap_or_default();
    if to.starts_with("bounce@") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"statusCode": 422, "name": "validation_error", "message": "Invalid `to` field."})),
        )
            .into_response();
    }
    rec.emails.lock().unwrap().push(body);
    Json(json!({"id": "49a3999c-0ce1-4ea6-ab68-afcd6dc2e794"})).into_response()
}

async fn notion_token(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if basic_auth_user(&headers).as_deref() != Some("notion-client") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"object": "error", "code": "unauthorized", "message": "Invalid client."})),
        )
            .into_response();
    }
    if body.get("code").and_then(Value::as_str) == Some("bad-code") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid code."})),
        )
            .into_response();
    }
    Json(json!({
        "access_token": "secret_notion_token",
        "token_type": "bearer",
        "bot_id": "bot-1",
        "workspace_id": "ws-1",
        "workspace_name": "Acme HQ",
        "workspace_icon": null,
        "owner": {"type": "user"}
    }))
    .into_response()
}

async fn notion_search(headers: HeaderMap) -> Response {
    if bearer(&headers).as_deref() != Some("secret_notion_token") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"object": "error", "code": "unauthorized", "message": "API token is invalid."})),
        )
            .into_response();
    }
    Json(json!({
        "object": "list",
        "results": [
            {
                "object": "page",
                "id": "page-1",
                "url": "https://www.notion.so/Team-notes-page1",
                "properties": {"Name": {"type": "title", "title": [{"plain_text": "Team notes"}]}}
            },
            {
                "object": "page",
                "id": "page-gone",
                "url": "https://www.notion.so/Archived-pagegone",
                "properties": {"title": {"type": "title", "title": [{"plain_text": "Archived"}]}}
            }
        ],
        "has_more": false,
        "next_cursor": null
    }))
    .into_response()
}

async fn notion_children(
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    match (id.as_str(), query.get("start_cursor").map(String::as_str)) {
        ("page-1", None) => Json(json!({
            "object": "list",
            "results": [
                {"type": "heading_1", "heading_1": {"rich_text": [{"plain_text": "Standup"}]}},
                {"type": "divider", "divider": {}}
            ],
            "has_more": true,
            "next_cursor": "cursor-2"
        }))
        .into_response(),
        ("page-1", Some("cursor-2")) => Json(json!({
            "object": "list",
            "results": [
                {"type": "paragraph", "paragraph": {"rich_text": [{"plain_text": "Ship "}, {"plain_text": "Friday"}]}}
            ],
            "has_more": false,
            "next_cursor": null
        }))
        .into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"object": "error", "code": "object_not_found", "message": "Could not find block."})),
        )
            .into_response(),
    }
}

/// Serve every fake provider on an ephemeral port; returns its base URL.
pub async fn spawn_upstream(rec: Recorded) -> Url {
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/google/token", post(google_token))
        .route("/drive/v3/files", get(drive_files))
        .route("/drive/v3/files/{id}/export", get(drive_export))
        .route("/supabase/auth/v1/user", get(supabase_user))
        .route("/resend/emails", post(resend_emails))
        .route("/notion/v1/oauth/token", post(notion_token))
        .route("/notion/v1/search", post(notion_search))
        .route("/notion/v1/blocks/{id}/children", get(notion_children))
        .with_state(rec);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind fake upstream");
    let addr = listener.local_addr().expect("no local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake upstream crashed");
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

/// Google token endpoint that closes the first `drops` connections without
/// replying, then answers every refresh. Returns its URL and a connection count.
pub async fn spawn_flaky_token_endpoint(drops: usize) -> (Url, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind flaky token endpoint");
    let addr = listener.local_addr().expect("no local addr");
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !String::from_utf8_lossy(&request).contains("grant_type") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            if attempt < drops {
                continue;
            }
            let body = json!({
                "access_token": "access-after-retry",
                "expires_in": 3599,
                "token_type": "Bearer",
            })
            .to_string();
            let resp = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(resp.as_bytes()).await;
        }
    });
    (Url::parse(&format!("http://{addr}/token")).unwrap(), hits)
}

// ---------------------------------------------------------------------------
// App under test
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub recorded: Recorded,
    pub config: Config,
}

pub fn test_config(upstream: &Url) -> Config {
    let at = |path: &str| upstream.join(path).unwrap();
    let mut cfg = Config::default();
    cfg.cookie_secret = "k".repeat(64);
    cfg.insecure_cookie = true;
    cfg.openai.api_key = OPENAI_KEY.to_string();
    cfg.openai.base_url = at("v1/");
    cfg.openai.daily_limit = 0;
    cfg.google.primary.client_id = "primary-client".to_string();
    cfg.google.primary.client_secret = "primary-secret".to_string();
    cfg.google.legacy.client_id = "legacy-client".to_string();
    cfg.google.legacy.client_secret = "legacy-secret".to_string();
    cfg.google.token_url = at("google/token");
    cfg.google.drive_api_base = at("drive/v3/");
    cfg.notion.client_id = "notion-client".to_string();
    cfg.notion.client_secret = "notion-secret".to_string();
    cfg.notion.api_base = at("notion/v1/");
    cfg.resend.api_key = "re_test".to_string();
    cfg.resend.base_url = at("resend/");
    cfg.supabase.url = at("supabase/");
    cfg.supabase.anon_key = "anon".to_string();
    cfg
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(tweak: impl FnOnce(&mut Config)) -> Self {
        let recorded = Recorded::default();
        let upstream = spawn_upstream(recorded.clone()).await;
        let mut config = test_config(&upstream);
        tweak(&mut config);

        let store = Arc::new(MemoryStore::seeded());
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("failed to build client");
        let state = AmurexState::new(store.clone(), client, config.clone());
        Self {
            router: amurex_router(state),
            store,
            recorded,
            config,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("request failed")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub async fn body_bytes(resp: Response) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body")
        .to_vec()
}

pub async fn body_json(resp: Response) -> Value {
    let bytes = body_bytes(resp).await;
    serde_json::from_slice(&bytes).expect("response body was not json")
}

pub async fn error_message(resp: Response) -> String {
    body_json(resp)
        .await
        .get("error")
        .and_then(Value::as_str)
        .expect("missing error field")
        .to_string()
}
