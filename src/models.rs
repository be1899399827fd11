// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. Types derive `Serialize`/`Deserialize` and `ToSchema`
//! for JSON handling and OpenAPI documentation.
//!
//! Responses never carry ciphertext, wrapped keys or blob handles.
//!
//! ## Model Categories
//!
//! - **Files**: upload, listing, metadata edits
//! - **Shares**: grant creation and the shared-with-me listing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::sharing::{IssuedShare, ReceivedShare};
use crate::storage::FileRecord;

// =============================================================================
// File Models
// =============================================================================

/// File metadata as returned to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FileResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Content type declared at upload.
    pub content_type: String,
    /// Plaintext size in bytes.
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&FileRecord> for FileResponse {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            content_type: record.content_type.clone(),
            size_bytes: record.size_bytes,
            uploaded_at: record.uploaded_at,
        }
    }
}

/// Multipart body for `POST /v1/files`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileForm {
    /// File contents. The part's filename and content type are recorded.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Optional free-text description.
    pub description: Option<String>,
}

/// Owner metadata edit. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateFileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// Share Models
// =============================================================================

/// Request to share a file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateShareRequest {
    pub file_id: String,
    /// `view` or `download`.
    pub share_type: String,
    /// Recipient email. Required unless `public` is set.
    #[serde(default)]
    pub shared_with: Option<String>,
    /// Hours until the link stops working. Omit for no expiry.
    #[serde(default)]
    pub ttl_hours: Option<i64>,
    /// Link works for exactly one successful access.
    #[serde(default)]
    pub one_time: bool,
    /// Anyone with the link and passphrase may use it.
    #[serde(default)]
    pub public: bool,
}

/// Request for the reusable public link of a file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePublicShareRequest {
    pub file_id: String,
    /// `view` or `download`. Ignored when an active link already exists.
    pub share_type: String,
    #[serde(default)]
    pub ttl_hours: Option<i64>,
}

/// A grant as seen by its creator.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareResponse {
    pub token: String,
    pub file_id: String,
    pub share_type: String,
    /// `public` or `private:<email>`.
    pub audience: String,
    /// Link to hand to the recipient.
    pub link: String,
    /// Present for public grants only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub one_time: bool,
    pub created_at: DateTime<Utc>,
    /// True when an existing public link was returned.
    pub reused: bool,
}

impl From<IssuedShare> for ShareResponse {
    fn from(issued: IssuedShare) -> Self {
        let grant = issued.grant;
        Self {
            audience: grant.audience.to_string(),
            token: grant.token,
            file_id: grant.file_id,
            share_type: grant.operation,
            link: issued.link,
            passphrase: grant.passphrase,
            expires_at: grant.expires_at,
            one_time: grant.one_time,
            created_at: grant.created_at,
            reused: issued.reused,
        }
    }
}

/// A private share addressed to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SharedWithMeEntry {
    pub token: String,
    pub file_id: String,
    pub file_name: String,
    /// User ID of the owner who shared it.
    pub shared_by: String,
    pub share_type: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub one_time: bool,
}

impl From<ReceivedShare> for SharedWithMeEntry {
    fn from(received: ReceivedShare) -> Self {
        let grant = received.grant;
        Self {
            token: grant.token,
            file_id: grant.file_id,
            file_name: received.file_name,
            shared_by: grant.created_by,
            share_type: grant.operation,
            link: received.link,
            created_at: grant.created_at,
            expires_at: grant.expires_at,
            one_time: grant.one_time,
        }
    }
}
