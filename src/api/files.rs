// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};

use super::file_body;
use crate::{
    auth::Auth,
    error::ApiError,
    models::{FileResponse, UpdateFileRequest, UploadFileForm},
    sharing::Disposition,
    state::AppState,
    storage::{MetadataUpdate, NewUpload},
};

/// Upload a file. The body is sealed before anything is written to disk.
#[utoipa::path(
    post,
    path = "/v1/files",
    request_body(content = UploadFileForm, content_type = "multipart/form-data"),
    tag = "Files",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "File stored", body = FileResponse),
        (status = 400, description = "Missing or malformed file part"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn upload_file(
    Auth(user): Auth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), ApiError> {
    let mut upload: Option<NewUpload> = None;
    let mut description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let name = field.file_name().unwrap_or("upload.bin").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
                upload = Some(NewUpload {
                    owner_id: user.user_id.clone(),
                    name,
                    description: String::new(),
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("description") => {
                description = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid description: {e}")))?;
            }
            _ => {}
        }
    }

    let mut upload = upload.ok_or_else(|| ApiError::bad_request("Missing 'file' part"))?;
    upload.description = description;

    let record = state.envelopes.seal_upload(upload)?;
    Ok((StatusCode::CREATED, Json(FileResponse::from(&record))))
}

#[utoipa::path(
    get,
    path = "/v1/files",
    tag = "Files",
    security(("bearer_auth" = [])),
    responses((status = 200, body = [FileResponse]))
)]
pub async fn list_files(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<FileResponse>>, ApiError> {
    let files = state.envelopes.list_for_owner(&user.user_id)?;
    Ok(Json(files.iter().map(FileResponse::from).collect()))
}

#[utoipa::path(
    patch,
    path = "/v1/files/{file_id}",
    params(("file_id" = String, Path, description = "File identifier")),
    request_body = UpdateFileRequest,
    tag = "Files",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = FileResponse),
        (status = 404, description = "No such file for this user")
    )
)]
pub async fn update_file(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Json(request): Json<UpdateFileRequest>,
) -> Result<Json<FileResponse>, ApiError> {
    let record = state.envelopes.update_metadata(
        &user.user_id,
        &file_id,
        MetadataUpdate {
            name: request.name,
            description: request.description,
        },
    )?;
    Ok(Json(FileResponse::from(&record)))
}

/// Delete a file, its blob and every share of it.
#[utoipa::path(
    delete,
    path = "/v1/files/{file_id}",
    params(("file_id" = String, Path, description = "File identifier")),
    tag = "Files",
    security(("bearer_auth" = [])),
    responses(
        (status = 204),
        (status = 404, description = "No such file for this user")
    )
)]
pub async fn delete_file(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.envelopes.delete(&user.user_id, &file_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/files/{file_id}/view",
    params(("file_id" = String, Path, description = "File identifier")),
    tag = "Files",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Decrypted file, inline", content_type = "application/octet-stream"),
        (status = 404, description = "No such file for this user"),
        (status = 500, description = "Stored file failed integrity verification")
    )
)]
pub async fn view_file(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    let (record, bytes) = state.envelopes.read_owned(&user.user_id, &file_id)?;
    Ok(file_body(bytes, &record.content_type, Disposition::Inline, &record.name))
}

#[utoipa::path(
    get,
    path = "/v1/files/{file_id}/download",
    params(("file_id" = String, Path, description = "File identifier")),
    tag = "Files",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Decrypted file, as attachment", content_type = "application/octet-stream"),
        (status = 404, description = "No such file for this user"),
        (status = 500, description = "Stored file failed integrity verification")
    )
)]
pub async fn download_file(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    let (record, bytes) = state.envelopes.read_owned(&user.user_id, &file_id)?;
    Ok(file_body(bytes, &record.content_type, Disposition::Attachment, &record.name))
}
