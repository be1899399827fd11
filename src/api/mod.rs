// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::AuthenticatedUser,
    models::{
        CreatePublicShareRequest, CreateShareRequest, FileResponse, ShareResponse,
        SharedWithMeEntry, UpdateFileRequest, UploadFileForm,
    },
    sharing::Disposition,
    state::AppState,
    storage::envelope_store::DEFAULT_CONTENT_TYPE,
};

pub mod files;
pub mod health;
pub mod shares;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/files", get(files::list_files).post(files::upload_file))
        .route(
            "/files/{file_id}",
            patch(files::update_file).delete(files::delete_file),
        )
        .route("/files/{file_id}/view", get(files::view_file))
        .route("/files/{file_id}/download", get(files::download_file))
        .route("/shares", post(shares::create_share))
        .route(
            "/shares/public",
            get(shares::get_public_share).post(shares::create_public_share),
        )
        .route("/shares/shared-with-me", get(shares::shared_with_me))
        .route("/shared/{token}", get(shares::access_private_share))
        .route(
            "/shared/public/{token}/{passphrase}",
            get(shares::access_public_share),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.max_upload_bytes))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Decrypted file bytes with presentation headers.
pub(crate) fn file_body(
    bytes: Vec<u8>,
    content_type: &str,
    disposition: Disposition,
    file_name: &str,
) -> Response {
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let content_disposition = HeaderValue::from_str(&disposition.header_value(file_name))
        .unwrap_or_else(|_| HeaderValue::from_static(disposition.as_str()));

    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_DISPOSITION, content_disposition),
            (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        bytes,
    )
        .into_response()
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        files::upload_file,
        files::list_files,
        files::update_file,
        files::delete_file,
        files::view_file,
        files::download_file,
        shares::create_share,
        shares::create_public_share,
        shares::get_public_share,
        shares::shared_with_me,
        shares::access_private_share,
        shares::access_public_share,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            AuthenticatedUser,
            FileResponse,
            UploadFileForm,
            UpdateFileRequest,
            CreateShareRequest,
            CreatePublicShareRequest,
            ShareResponse,
            SharedWithMeEntry,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Files", description = "Encrypted file storage"),
        (name = "Shares", description = "Share link management"),
        (name = "Shared", description = "Opening share links"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header::AUTHORIZATION, Method, Request},
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::auth::extractor::issue_test_token;
    use crate::notify::RecordingNotifier;
    use crate::state::test_state;
    use crate::storage::{FileRecord, NewUpload};

    const SECRET: &str = "router-test-secret";
    const BOUNDARY: &str = "XBOUNDARYX";

    struct TestApp {
        router: Router,
        state: AppState,
        _dir: TempDir,
    }

    fn app() -> TestApp {
        let (state, dir) = test_state(Arc::new(RecordingNotifier::new()), SECRET);
        TestApp {
            router: router(state.clone()),
            state,
            _dir: dir,
        }
    }

    fn bearer(user_id: &str, email: &str) -> String {
        format!("Bearer {}", issue_test_token(SECRET, user_id, email))
    }

    fn seed_file(state: &AppState, owner: &str, bytes: &[u8]) -> FileRecord {
        state
            .envelopes
            .seal_upload(NewUpload {
                owner_id: owner.to_string(),
                name: "report.pdf".to_string(),
                description: String::new(),
                content_type: Some("application/pdf".to_string()),
                bytes: bytes.to_vec(),
            })
            .unwrap()
    }

    async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn json_request(method: Method, uri: &str, auth: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, auth)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_upload(auth: &str, file_name: &str, bytes: &[u8], description: &str) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(
            format!(
                "\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\n{description}\r\n--{BOUNDARY}--\r\n"
            )
            .as_bytes(),
        );

        Request::builder()
            .method(Method::POST)
            .uri("/v1/files")
            .header(AUTHORIZATION, auth)
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn json_body(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn health_endpoints_report_ok() {
        let app = app();
        for uri in ["/health", "/health/live", "/health/ready"] {
            let (status, _, body) = send(&app, get(uri, None)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(json_body(&body)["status"], "ok");
        }
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = app();
        let (status, _, body) = send(&app, get("/api-doc/openapi.json", None)).await;
        assert_eq!(status, StatusCode::OK);
        let doc = json_body(&body);
        assert!(doc["paths"]["/v1/shared/public/{token}/{passphrase}"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
    }

    #[tokio::test]
    async fn file_routes_require_auth() {
        let app = app();
        let (status, _, body) = send(&app, get("/v1/files", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(&body)["error_code"], "missing_auth_header");

        let (status, _, _) = send(&app, get("/v1/files", Some("Bearer not-a-jwt"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn upload_list_and_view() {
        let app = app();
        let alice = bearer("alice", "alice@x.com");

        let (status, _, body) = send(
            &app,
            multipart_upload(&alice, "notes.txt", b"eighteen byte body", "draft"),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created = json_body(&body);
        assert_eq!(created["name"], "notes.txt");
        assert_eq!(created["size_bytes"], 18);
        assert_eq!(created["description"], "draft");
        assert!(created.get("wrapped_key").is_none());
        let file_id = created["id"].as_str().unwrap().to_string();

        let (status, _, body) = send(&app, get("/v1/files", Some(&alice))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body).as_array().unwrap().len(), 1);

        let (status, headers, body) =
            send(&app, get(&format!("/v1/files/{file_id}/view"), Some(&alice))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"eighteen byte body");
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
        assert_eq!(headers[CONTENT_DISPOSITION], "inline; filename=\"notes.txt\"");

        let (_, headers, _) =
            send(&app, get(&format!("/v1/files/{file_id}/download"), Some(&alice))).await;
        assert_eq!(
            headers[CONTENT_DISPOSITION],
            "attachment; filename=\"notes.txt\""
        );
    }

    #[tokio::test]
    async fn upload_without_file_part_is_bad_request() {
        let app = app();
        let alice = bearer("alice", "alice@x.com");
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\nx\r\n--{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/files")
            .header(AUTHORIZATION, &alice)
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();

        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn other_users_cannot_see_or_change_a_file() {
        let app = app();
        let file = seed_file(&app.state, "alice", b"secret");
        let mallory = bearer("mallory", "m@x.com");

        let (status, _, _) =
            send(&app, get(&format!("/v1/files/{}/view", file.id), Some(&mallory))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(
            &app,
            json_request(
                Method::PATCH,
                &format!("/v1/files/{}", file.id),
                &mallory,
                json!({"name": "pwned"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rename_then_delete() {
        let app = app();
        let file = seed_file(&app.state, "alice", b"contents");
        let alice = bearer("alice", "alice@x.com");

        let (status, _, body) = send(
            &app,
            json_request(
                Method::PATCH,
                &format!("/v1/files/{}", file.id),
                &alice,
                json!({"name": "final.pdf", "description": "signed"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["name"], "final.pdf");

        let request = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/v1/files/{}", file.id))
            .header(AUTHORIZATION, &alice)
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, _) =
            send(&app, get(&format!("/v1/files/{}/view", file.id), Some(&alice))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn private_share_end_to_end() {
        let app = app();
        let file = seed_file(&app.state, "alice", b"eighteen byte body");
        let alice = bearer("alice", "alice@x.com");

        let (status, _, body) = send(
            &app,
            json_request(
                Method::POST,
                "/v1/shares",
                &alice,
                json!({"file_id": file.id, "share_type": "view", "shared_with": "bob@x.com", "ttl_hours": 1}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let share = json_body(&body);
        let token = share["token"].as_str().unwrap().to_string();
        assert!(share.get("passphrase").is_none());
        assert!(share["link"].as_str().unwrap().ends_with(&format!("/v1/shared/{token}")));

        let bob = bearer("bob", "bob@x.com");
        let (status, headers, body) =
            send(&app, get(&format!("/v1/shared/{token}"), Some(&bob))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"eighteen byte body");
        assert!(headers[CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("inline"));

        let carol = bearer("carol", "carol@x.com");
        let (status, _, body) =
            send(&app, get(&format!("/v1/shared/{token}"), Some(&carol))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json_body(&body)["error_code"], "forbidden");

        let (status, _, body) =
            send(&app, get(&format!("/v1/shared/public/{token}/anything"), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body)["error_code"], "wrong_channel");

        let (status, _, body) = send(&app, get("/v1/shares/shared-with-me", Some(&bob))).await;
        assert_eq!(status, StatusCode::OK);
        let listed = json_body(&body);
        assert_eq!(listed[0]["token"], token.as_str());
        assert_eq!(listed[0]["file_name"], "report.pdf");
        assert_eq!(listed[0]["shared_by"], "alice");
    }

    #[tokio::test]
    async fn public_download_needs_passphrase() {
        let app = app();
        let file = seed_file(&app.state, "alice", b"public bytes");
        let alice = bearer("alice", "alice@x.com");

        let (status, _, body) = send(
            &app,
            json_request(
                Method::POST,
                "/v1/shares",
                &alice,
                json!({"file_id": file.id, "share_type": "download", "public": true}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let share = json_body(&body);
        let token = share["token"].as_str().unwrap();
        let passphrase = share["passphrase"].as_str().unwrap();

        let (status, headers, body) = send(
            &app,
            get(&format!("/v1/shared/public/{token}/{passphrase}"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"public bytes");
        assert_eq!(
            headers[CONTENT_DISPOSITION],
            "attachment; filename=\"report.pdf\""
        );

        let (status, _, _) =
            send(&app, get(&format!("/v1/shared/public/{token}/wrongpass"), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, body) = send(&app, get(&format!("/v1/shared/{token}"), Some(&alice))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body)["error_code"], "wrong_channel");
    }

    #[tokio::test]
    async fn one_time_public_link_is_gone_after_use() {
        let app = app();
        let file = seed_file(&app.state, "alice", b"once");
        let alice = bearer("alice", "alice@x.com");

        let (_, _, body) = send(
            &app,
            json_request(
                Method::POST,
                "/v1/shares",
                &alice,
                json!({"file_id": file.id, "share_type": "view", "public": true, "one_time": true}),
            ),
        )
        .await;
        let share = json_body(&body);
        let uri = format!(
            "/v1/shared/public/{}/{}",
            share["token"].as_str().unwrap(),
            share["passphrase"].as_str().unwrap()
        );

        let (status, _, _) = send(&app, get(&uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, body) = send(&app, get(&uri, None)).await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(json_body(&body)["error_code"], "consumed");
    }

    #[tokio::test]
    async fn invalid_share_type_is_rejected() {
        let app = app();
        let file = seed_file(&app.state, "alice", b"x");
        let alice = bearer("alice", "alice@x.com");

        let (status, _, body) = send(
            &app,
            json_request(
                Method::POST,
                "/v1/shares",
                &alice,
                json!({"file_id": file.id, "share_type": "edit", "shared_with": "bob@x.com"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body)["error_code"], "validation_error");
    }

    #[tokio::test]
    async fn public_link_is_reused_and_retrievable() {
        let app = app();
        let file = seed_file(&app.state, "alice", b"x");
        let alice = bearer("alice", "alice@x.com");
        let body = json!({"file_id": file.id, "share_type": "view", "ttl_hours": 24});

        let (status, _, first) = send(
            &app,
            json_request(Method::POST, "/v1/shares/public", &alice, body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _, second) =
            send(&app, json_request(Method::POST, "/v1/shares/public", &alice, body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&first)["token"], json_body(&second)["token"]);

        let (status, _, details) = send(
            &app,
            get(&format!("/v1/shares/public?file_id={}", file.id), Some(&alice)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&details)["token"], json_body(&first)["token"]);
    }

    #[tokio::test]
    async fn public_share_through_either_endpoint_is_the_same_link() {
        let app = app();
        let file = seed_file(&app.state, "alice", b"x");
        let alice = bearer("alice", "alice@x.com");
        let body = json!({"file_id": file.id, "share_type": "view", "public": true});

        let (status, _, first) =
            send(&app, json_request(Method::POST, "/v1/shares", &alice, body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _, second) =
            send(&app, json_request(Method::POST, "/v1/shares", &alice, body)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, third) = send(
            &app,
            json_request(
                Method::POST,
                "/v1/shares/public",
                &alice,
                json!({"file_id": file.id, "share_type": "download"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let token = json_body(&first)["token"].clone();
        assert_eq!(json_body(&second)["token"], token);
        assert_eq!(json_body(&third)["token"], token);
    }

    #[tokio::test]
    async fn deleting_a_file_kills_its_links() {
        let app = app();
        let file = seed_file(&app.state, "alice", b"x");
        let alice = bearer("alice", "alice@x.com");

        let (_, _, body) = send(
            &app,
            json_request(
                Method::POST,
                "/v1/shares",
                &alice,
                json!({"file_id": file.id, "share_type": "view", "shared_with": "bob@x.com"}),
            ),
        )
        .await;
        let token = json_body(&body)["token"].as_str().unwrap().to_string();

        app.state.envelopes.delete("alice", &file.id).unwrap();

        let bob = bearer("bob", "bob@x.com");
        let (status, _, _) = send(&app, get(&format!("/v1/shared/{token}"), Some(&bob))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn file_body_falls_back_on_bad_content_type() {
        let response = file_body(b"x".to_vec(), "bad\nvalue", Disposition::Inline, "a.txt");
        assert_eq!(response.headers()[CONTENT_TYPE], DEFAULT_CONTENT_TYPE);
        assert_eq!(response.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");
    }
}
