// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Share grant model and lifecycle.
//!
//! ```text
//!            now > expires_at
//!   Active ───────────────────▶ Expired   (derived, never stored)
//!     │
//!     │ one-time grant, first successful access
//!     ▼
//!   Consumed                               (stored, terminal)
//! ```
//!
//! Neither `Expired` nor `Consumed` has an outgoing transition.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{DomainError, DomainResult};

const PUBLIC_AUDIENCE: &str = "public";
const PRIVATE_PREFIX: &str = "private:";

/// What a grant lets the holder do with the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShareOperation {
    View,
    Download,
}

impl ShareOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareOperation::View => "view",
            ShareOperation::Download => "download",
        }
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            ShareOperation::View => Disposition::Inline,
            ShareOperation::Download => Disposition::Attachment,
        }
    }
}

impl FromStr for ShareOperation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(ShareOperation::View),
            "download" => Ok(ShareOperation::Download),
            _ => Err(DomainError::Validation(
                "Invalid share_type. Use 'view' or 'download'.".to_string(),
            )),
        }
    }
}

impl fmt::Display for ShareOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How decrypted bytes are presented to the accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }

    /// `Content-Disposition` header value. Quotes and control characters in
    /// the file name are replaced so the header cannot be split or forged.
    pub fn header_value(&self, file_name: &str) -> String {
        let safe: String = file_name
            .chars()
            .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
            .collect();
        format!("{}; filename=\"{safe}\"", self.as_str())
    }
}

/// Who may use a grant. Persisted as `public` or `private:<email>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Audience {
    Public,
    Private(String),
}

impl Audience {
    pub fn is_public(&self) -> bool {
        matches!(self, Audience::Public)
    }

    /// Recipient email for private grants.
    pub fn email(&self) -> Option<&str> {
        match self {
            Audience::Public => None,
            Audience::Private(email) => Some(email),
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Audience::Public => f.write_str(PUBLIC_AUDIENCE),
            Audience::Private(email) => write!(f, "{PRIVATE_PREFIX}{email}"),
        }
    }
}

impl From<Audience> for String {
    fn from(value: Audience) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Audience {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == PUBLIC_AUDIENCE {
            return Ok(Audience::Public);
        }
        match value.strip_prefix(PRIVATE_PREFIX) {
            Some(email) if !email.is_empty() => Ok(Audience::Private(email.to_string())),
            _ => Err(format!("invalid audience: {value}")),
        }
    }
}

/// Lifecycle state at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GrantState {
    Active,
    Expired,
    Consumed,
}

/// One sharing policy bound to one file.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShareGrant {
    /// Unlinkable random token; doubles as the public link identifier.
    pub token: String,
    pub file_id: String,
    /// User ID of the file owner who created the grant.
    pub created_by: String,
    pub audience: Audience,
    /// Kept as the raw persisted string so an unknown value is caught at
    /// access time instead of failing deserialization of the whole record.
    pub operation: String,
    pub created_at: DateTime<Utc>,
    /// `None` never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub one_time: bool,
    pub consumed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_at: Option<DateTime<Utc>>,
    /// Required for public grants, absent for private ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
}

impl ShareGrant {
    pub fn is_public(&self) -> bool {
        self.audience.is_public()
    }

    /// `expires_at` is set and `now` is strictly past it.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> GrantState {
        if self.consumed {
            GrantState::Consumed
        } else if self.is_expired_at(now) {
            GrantState::Expired
        } else {
            GrantState::Active
        }
    }

    /// Usable for access or reuse right now.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == GrantState::Active
    }

    /// Parse the stored operation. Rejects anything outside view/download
    /// even if such a value made it into storage.
    pub fn operation(&self) -> DomainResult<ShareOperation> {
        self.operation.parse()
    }

    /// Token prefix that is safe to put in logs.
    pub fn log_id(&self) -> &str {
        self.token.get(..8).unwrap_or(&self.token)
    }
}

impl fmt::Debug for ShareGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareGrant")
            .field("token", &self.log_id())
            .field("file_id", &self.file_id)
            .field("created_by", &self.created_by)
            .field("audience", &self.audience)
            .field("operation", &self.operation)
            .field("expires_at", &self.expires_at)
            .field("one_time", &self.one_time)
            .field("consumed", &self.consumed)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
