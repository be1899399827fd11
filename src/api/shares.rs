// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::file_body;
use crate::{
    auth::Auth,
    error::ApiError,
    models::{CreatePublicShareRequest, CreateShareRequest, ShareResponse, SharedWithMeEntry},
    sharing::{CreateShare, Requester},
    state::AppState,
};

#[derive(Deserialize, IntoParams)]
pub struct PublicShareQuery {
    pub file_id: String,
}

/// Share a file with one recipient, or publicly behind a passphrase.
#[utoipa::path(
    post,
    path = "/v1/shares",
    request_body = CreateShareRequest,
    tag = "Shares",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active reusable public link returned", body = ShareResponse),
        (status = 201, description = "New share created", body = ShareResponse),
        (status = 400, description = "Invalid share_type, recipient or ttl_hours"),
        (status = 404, description = "No such file for this user")
    )
)]
pub async fn create_share(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateShareRequest>,
) -> Result<(StatusCode, Json<ShareResponse>), ApiError> {
    let issued = state.shares.create(
        &user,
        CreateShare {
            file_id: request.file_id,
            operation: request.share_type,
            shared_with: request.shared_with,
            ttl_hours: request.ttl_hours,
            one_time: request.one_time,
            public: request.public,
        },
    )?;
    let status = if issued.reused {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(issued.into())))
}

/// Get or create the reusable public link for a file.
#[utoipa::path(
    post,
    path = "/v1/shares/public",
    request_body = CreatePublicShareRequest,
    tag = "Shares",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Existing active link returned", body = ShareResponse),
        (status = 201, description = "New link created", body = ShareResponse),
        (status = 404, description = "No such file for this user")
    )
)]
pub async fn create_public_share(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreatePublicShareRequest>,
) -> Result<(StatusCode, Json<ShareResponse>), ApiError> {
    let issued = state.shares.create_or_reuse_public(
        &user,
        &request.file_id,
        &request.share_type,
        request.ttl_hours,
    )?;
    let status = if issued.reused {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(issued.into())))
}

#[utoipa::path(
    get,
    path = "/v1/shares/public",
    params(PublicShareQuery),
    tag = "Shares",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = ShareResponse),
        (status = 404, description = "No public link for this file"),
        (status = 410, description = "The public link has expired")
    )
)]
pub async fn get_public_share(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(params): Query<PublicShareQuery>,
) -> Result<Json<ShareResponse>, ApiError> {
    let issued = state.shares.public_share_details(&user, &params.file_id)?;
    Ok(Json(issued.into()))
}

#[utoipa::path(
    get,
    path = "/v1/shares/shared-with-me",
    tag = "Shares",
    security(("bearer_auth" = [])),
    responses((status = 200, body = [SharedWithMeEntry]))
)]
pub async fn shared_with_me(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<SharedWithMeEntry>>, ApiError> {
    let received = state.shares.shared_with_me(&user)?;
    Ok(Json(received.into_iter().map(Into::into).collect()))
}

/// Open a private share as its recipient.
#[utoipa::path(
    get,
    path = "/v1/shared/{token}",
    params(("token" = String, Path, description = "Share token")),
    tag = "Shared",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Decrypted file", content_type = "application/octet-stream"),
        (status = 400, description = "Public link opened on the private endpoint"),
        (status = 403, description = "Not the recipient"),
        (status = 404, description = "Unknown link"),
        (status = 410, description = "Expired or already used")
    )
)]
pub async fn access_private_share(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let content = state.access.evaluate(&token, Requester::Private(&user))?;
    Ok(file_body(
        content.bytes,
        &content.content_type,
        content.disposition,
        &content.file_name,
    ))
}

/// Open a public share. No account needed, only the passphrase.
#[utoipa::path(
    get,
    path = "/v1/shared/public/{token}/{passphrase}",
    params(
        ("token" = String, Path, description = "Share token"),
        ("passphrase" = String, Path, description = "Passphrase issued with the link")
    ),
    tag = "Shared",
    responses(
        (status = 200, description = "Decrypted file", content_type = "application/octet-stream"),
        (status = 400, description = "Private link opened on the public endpoint"),
        (status = 403, description = "Wrong passphrase"),
        (status = 404, description = "Unknown link"),
        (status = 410, description = "Expired or already used")
    )
)]
pub async fn access_public_share(
    State(state): State<AppState>,
    Path((token, passphrase)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let content = state.access.evaluate(
        &token,
        Requester::Public {
            passphrase: &passphrase,
        },
    )?;
    Ok(file_body(
        content.bytes,
        &content.content_type,
        content.disposition,
        &content.file_name,
    ))
}
