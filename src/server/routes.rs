use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;

use roster::record::{FieldMap, UserId};
use roster::{StoreError, UserRecord, UserStore};

use crate::error::ApiError;
use crate::request_log;
use crate::upload;

pub(crate) type SharedStore = Arc<RwLock<UserStore>>;

/// Shared state handed to every handler. Mutating routes take the store's
/// write lock, so id assignment and the file rewrite are serialized;
/// readers share the read lock and never see a half-applied update.
#[derive(Clone)]
pub(crate) struct AppState {
    pub store: SharedStore,
    pub upload_dir: PathBuf,
    pub request_log: PathBuf,
}

pub(crate) fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.upload_dir);
    Router::new()
        .route("/", get(homepage))
        .route("/users", get(list_users_html))
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/api/log", get(read_request_log))
        .route("/upload", post(upload::upload_profile_image))
        .nest_service("/uploads", uploads)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            request_log::log_request,
        ))
        .with_state(state)
}

const HOMEPAGE: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Roster</title></head>
  <body>
    <h1>Roster</h1>
    <p><a href="/users">User list</a> | <a href="/api/users">API</a></p>
    <form action="/upload" method="post" enctype="multipart/form-data">
      <input type="file" name="profileImage" />
      <button type="submit">Upload profile image</button>
    </form>
  </body>
</html>
"#;

async fn homepage() -> Html<&'static str> {
    Html(HOMEPAGE)
}

async fn list_users_html(State(state): State<AppState>) -> Html<String> {
    let store = state.store.read().await;
    let items: String = store
        .records()
        .iter()
        .map(|record| format!("<li>{}</li>", record.field("first_name").unwrap_or("")))
        .collect();
    Html(format!("<ul>{}</ul>", items))
}

async fn list_users(State(state): State<AppState>) -> Json<Vec<UserRecord>> {
    let store = state.store.read().await;
    Json(store.records().to_vec())
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserRecord>, ApiError> {
    let store = state.store.read().await;
    let record = store.find_by_id(id).ok_or(StoreError::UnknownId(id))?;
    Ok(Json(record.clone()))
}

async fn create_user(
    State(state): State<AppState>,
    Json(fields): Json<FieldMap>,
) -> Result<impl IntoResponse, ApiError> {
    let mut store = state.store.write().await;
    let record = store.insert(fields)?;
    log::info!("created user {}", record.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "id": record.id })),
    ))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(fields): Json<FieldMap>,
) -> Result<impl IntoResponse, ApiError> {
    let mut store = state.store.write().await;
    let record = store.update(id, fields)?;
    log::info!("updated user {}", id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": record })),
    ))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut store = state.store.write().await;
    store.remove(id)?;
    log::info!("deleted user {}", id);
    Ok(Json(
        json!({ "status": "success", "message": "deleted succcessfully" }),
    ))
}

async fn read_request_log(State(state): State<AppState>) -> Result<String, ApiError> {
    let contents = tokio::fs::read_to_string(&state.request_log)
        .await
        .context("failed to read request log")?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use roster::JsonStore;

    use super::*;

    fn seed_app(dir: &TempDir) -> Router {
        let data_file = dir.path().join("users.json");
        std::fs::write(
            &data_file,
            json!([
                { "id": 1, "first_name": "Bilbo", "email": "bilbo@shire.me" },
                { "id": 2, "first_name": "Frodo", "email": "frodo@shire.me", "job_title": "Ringbearer" }
            ])
            .to_string(),
        )
        .unwrap();
        let upload_dir = dir.path().join("uploads");
        std::fs::create_dir_all(&upload_dir).unwrap();

        let store = UserStore::open(JsonStore::new(&data_file)).unwrap();
        router(AppState {
            store: Arc::new(RwLock::new(store)),
            upload_dir,
            request_log: dir.path().join("log.txt"),
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn parse(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn list_users_returns_all() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(seed_app(&dir), get_request("/api/users")).await;

        assert_eq!(status, StatusCode::OK);
        let users = parse(&body);
        assert_eq!(users.as_array().unwrap().len(), 2);
        assert_eq!(users[0]["first_name"], "Bilbo");
    }

    #[tokio::test]
    async fn get_user_by_id() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(seed_app(&dir), get_request("/api/users/2")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse(&body)["job_title"], "Ringbearer");
    }

    #[tokio::test]
    async fn get_unknown_user_is_a_client_error() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(seed_app(&dir), get_request("/api/users/99")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            parse(&body),
            json!({ "status": "error", "message": "No user exists with ID : 99" })
        );
    }

    #[tokio::test]
    async fn create_user_assigns_next_id() {
        let dir = TempDir::new().unwrap();
        let app = seed_app(&dir);

        let (status, body) = send(
            app.clone(),
            json_request(
                Method::POST,
                "/api/users",
                json!({ "first_name": "Sam", "email": "sam@shire.me" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(parse(&body), json!({ "status": "success", "id": 3 }));

        let (_, body) = send(app, get_request("/api/users")).await;
        assert_eq!(parse(&body).as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn create_duplicate_email_already_reported() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(
            seed_app(&dir),
            json_request(
                Method::POST,
                "/api/users",
                json!({ "first_name": "Impostor", "email": "bilbo@shire.me" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::ALREADY_REPORTED);
        assert_eq!(
            parse(&body),
            json!({ "status": "error", "message": "Email already exists" })
        );
    }

    #[tokio::test]
    async fn create_with_empty_body_rejected() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(
            seed_app(&dir),
            json_request(Method::POST, "/api/users", json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            parse(&body),
            json!({ "status": "error", "message": "No data provided for append" })
        );
    }

    #[tokio::test]
    async fn patch_updates_only_named_fields() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(
            seed_app(&dir),
            json_request(
                Method::PATCH,
                "/api/users/1",
                json!({ "job_title": "Burglar" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        let reply = parse(&body);
        assert_eq!(reply["status"], "success");
        assert_eq!(reply["data"]["job_title"], "Burglar");
        assert_eq!(reply["data"]["first_name"], "Bilbo");
    }

    #[tokio::test]
    async fn patch_with_empty_body_rejected() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(
            seed_app(&dir),
            json_request(Method::PATCH, "/api/users/1", json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            parse(&body),
            json!({ "status": "error", "message": "No data provided for edit" })
        );
    }

    #[tokio::test]
    async fn patch_unknown_user_is_a_client_error() {
        let dir = TempDir::new().unwrap();
        let (status, _) = send(
            seed_app(&dir),
            json_request(
                Method::PATCH,
                "/api/users/99",
                json!({ "first_name": "Nobody" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_user_then_lookup_fails() {
        let dir = TempDir::new().unwrap();
        let app = seed_app(&dir);

        let (status, body) = send(
            app.clone(),
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/users/2")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            parse(&body),
            json!({ "status": "success", "message": "deleted succcessfully" })
        );

        let (status, _) = send(app, get_request("/api/users/2")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mutations_survive_a_reload() {
        let dir = TempDir::new().unwrap();
        let app = seed_app(&dir);

        send(
            app,
            json_request(
                Method::POST,
                "/api/users",
                json!({ "first_name": "Sam", "email": "sam@shire.me" }),
            ),
        )
        .await;

        let reloaded = UserStore::open(JsonStore::new(dir.path().join("users.json"))).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.find_by_email("sam@shire.me").unwrap().id, 3);
    }

    #[tokio::test]
    async fn users_page_lists_first_names() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(seed_app(&dir), get_request("/users")).await;

        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("<li>Bilbo</li>"));
        assert!(html.contains("<li>Frodo</li>"));
    }

    #[tokio::test]
    async fn every_request_is_logged() {
        let dir = TempDir::new().unwrap();
        send(seed_app(&dir), get_request("/users")).await;

        let log = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert!(log.contains("GET    /users"));
    }

    #[tokio::test]
    async fn log_route_returns_the_request_log() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(seed_app(&dir), get_request("/api/log")).await;

        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("/api/log"));
    }

    fn multipart_request(file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
        let boundary = "roster-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; \
                 name=\"profileImage\"; filename=\"{file_name}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn upload_stores_a_png_and_redirects_home() {
        let dir = TempDir::new().unwrap();
        let (status, _) = send(
            seed_app(&dir),
            multipart_request("avatar.png", "image/png", b"not really a png"),
        )
        .await;

        assert_eq!(status, StatusCode::SEE_OTHER);

        let stored: Vec<_> = std::fs::read_dir(dir.path().join("uploads"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].ends_with("-avatar.png"));
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_filetype() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(
            seed_app(&dir),
            multipart_request("avatar.gif", "image/gif", b"gif bytes"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("only supports the following filetypes"));
    }

    #[tokio::test]
    async fn upload_rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let too_big = vec![0u8; 1_000_001];
        let (status, body) = send(
            seed_app(&dir),
            multipart_request("avatar.png", "image/png", &too_big),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let text = String::from_utf8(body).unwrap();
        assert_eq!(text, "File size limit exceeded (1MB max)");
    }

    #[tokio::test]
    async fn upload_without_profile_image_field_rejected() {
        let dir = TempDir::new().unwrap();
        let boundary = "roster-test-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nhello\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(seed_app(&dir), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(String::from_utf8(body).unwrap(), "Error: No file uploaded");
    }
}
