// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Share creation and owner-side queries.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use super::grant::{Audience, ShareGrant, ShareOperation};
use super::passphrase::{generate_passphrase, generate_token, PASSPHRASE_LEN};
use crate::auth::AuthenticatedUser;
use crate::error::{DomainError, DomainResult};
use crate::notify::{send_best_effort, Notifier};
use crate::storage::{EnvelopeStore, FileRecord, GrantRepository, StorageError};

/// Request to share one file.
#[derive(Debug, Clone)]
pub struct CreateShare {
    pub file_id: String,
    /// `view` or `download`; anything else is a validation error.
    pub operation: String,
    /// Recipient email. Required unless `public`.
    pub shared_with: Option<String>,
    pub ttl_hours: Option<i64>,
    pub one_time: bool,
    pub public: bool,
}

/// A grant as handed back to its creator, with the link to distribute.
#[derive(Debug, Clone)]
pub struct IssuedShare {
    pub grant: ShareGrant,
    pub link: String,
    /// True when an existing public grant was returned instead of a new one.
    pub reused: bool,
}

/// A private grant addressed to the caller, joined with its file name.
#[derive(Debug, Clone)]
pub struct ReceivedShare {
    pub grant: ShareGrant,
    pub file_name: String,
    pub link: String,
}

pub struct ShareService {
    envelopes: Arc<EnvelopeStore>,
    notifier: Arc<dyn Notifier>,
    base_url: String,
}

impl ShareService {
    pub fn new(envelopes: Arc<EnvelopeStore>, notifier: Arc<dyn Notifier>, base_url: &str) -> Self {
        Self {
            envelopes,
            notifier,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn grants(&self) -> GrantRepository<'_> {
        GrantRepository::new(self.envelopes.db())
    }

    /// Create a grant for a file the caller owns.
    ///
    /// Checks run in order: operation, ownership, expiry window, audience.
    /// A reusable public grant goes through the same index as
    /// [`create_or_reuse_public`](Self::create_or_reuse_public), so an active
    /// one comes back unchanged. One-time public grants stay standalone.
    pub fn create(&self, creator: &AuthenticatedUser, request: CreateShare) -> DomainResult<IssuedShare> {
        let operation: ShareOperation = request.operation.parse()?;
        let file = self.envelopes.get_owned(&creator.user_id, &request.file_id)?;
        let now = Utc::now();
        let expires_at = expiry(now, request.ttl_hours)?;

        let (audience, passphrase) = if request.public {
            (Audience::Public, Some(generate_passphrase(PASSPHRASE_LEN)?))
        } else {
            (Audience::Private(recipient(request.shared_with.as_deref())?), None)
        };

        let grant = ShareGrant {
            token: generate_token()?,
            file_id: file.id.clone(),
            created_by: creator.user_id.clone(),
            audience,
            operation: operation.as_str().to_string(),
            created_at: now,
            expires_at,
            one_time: request.one_time,
            consumed: false,
            consumed_at: None,
            passphrase,
        };

        if grant.is_public() && !grant.one_time {
            return self.publish(creator, &file, grant, now);
        }

        self.grants().create(&grant).map_err(token_collision)?;

        tracing::info!(
            token = %grant.log_id(),
            file_id = %grant.file_id,
            public = grant.is_public(),
            one_time = grant.one_time,
            "Share created"
        );

        self.announce(creator, &file, &grant);
        Ok(self.issued(grant, false))
    }

    /// Return the active public grant for this file and creator, or create one.
    ///
    /// Reused grants come back unchanged, including their operation and
    /// expiry. Grants made here are never one-time.
    pub fn create_or_reuse_public(
        &self,
        creator: &AuthenticatedUser,
        file_id: &str,
        operation: &str,
        ttl_hours: Option<i64>,
    ) -> DomainResult<IssuedShare> {
        let operation: ShareOperation = operation.parse()?;
        let file = self.envelopes.get_owned(&creator.user_id, file_id)?;
        let now = Utc::now();

        let candidate = ShareGrant {
            token: generate_token()?,
            file_id: file.id.clone(),
            created_by: creator.user_id.clone(),
            audience: Audience::Public,
            operation: operation.as_str().to_string(),
            created_at: now,
            expires_at: expiry(now, ttl_hours)?,
            one_time: false,
            consumed: false,
            consumed_at: None,
            passphrase: Some(generate_passphrase(PASSPHRASE_LEN)?),
        };

        self.publish(creator, &file, candidate, now)
    }

    /// Store a reusable public grant through the `(file, creator)` index, or
    /// hand back the one already active there.
    fn publish(
        &self,
        creator: &AuthenticatedUser,
        file: &FileRecord,
        candidate: ShareGrant,
        now: DateTime<Utc>,
    ) -> DomainResult<IssuedShare> {
        let (grant, reused) = self
            .grants()
            .find_or_create_public(&candidate, now)
            .map_err(token_collision)?;
        if reused {
            tracing::info!(token = %grant.log_id(), file_id = %grant.file_id, "Public share reused");
        } else {
            tracing::info!(token = %grant.log_id(), file_id = %grant.file_id, "Public share created");
            self.announce(creator, file, &grant);
        }
        Ok(self.issued(grant, reused))
    }

    pub fn is_expired(&self, grant: &ShareGrant) -> bool {
        grant.is_expired()
    }

    /// The reusable public grant for a file the caller owns.
    pub fn public_share_details(
        &self,
        creator: &AuthenticatedUser,
        file_id: &str,
    ) -> DomainResult<IssuedShare> {
        self.envelopes.get_owned(&creator.user_id, file_id)?;
        let grant = self
            .grants()
            .current_public(file_id, &creator.user_id)
            .map_err(DomainError::lookup("Public share"))?;
        if self.is_expired(&grant) {
            return Err(DomainError::Expired);
        }
        Ok(self.issued(grant, true))
    }

    /// Active private grants addressed to the caller's email.
    pub fn shared_with_me(&self, user: &AuthenticatedUser) -> DomainResult<Vec<ReceivedShare>> {
        if user.email.is_empty() {
            return Ok(Vec::new());
        }
        let files = crate::storage::FileRepository::new(self.envelopes.db());
        let mut received = Vec::new();
        for grant in self.grants().list_for_recipient(&user.email, Utc::now())? {
            match files.get(&grant.file_id) {
                Ok(file) => received.push(ReceivedShare {
                    link: self.share_link(&grant),
                    file_name: file.name,
                    grant,
                }),
                Err(StorageError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(received)
    }

    /// External link for a grant. Public links carry the passphrase as a
    /// separate path segment.
    pub fn share_link(&self, grant: &ShareGrant) -> String {
        match (&grant.audience, &grant.passphrase) {
            (Audience::Public, Some(passphrase)) => {
                format!("{}/v1/shared/public/{}/{}", self.base_url, grant.token, passphrase)
            }
            _ => format!("{}/v1/shared/{}", self.base_url, grant.token),
        }
    }

    fn issued(&self, grant: ShareGrant, reused: bool) -> IssuedShare {
        IssuedShare {
            link: self.share_link(&grant),
            grant,
            reused,
        }
    }

    /// Private shares notify the recipient, public shares the creator.
    /// The passphrase never goes into a notification.
    fn announce(&self, creator: &AuthenticatedUser, file: &FileRecord, grant: &ShareGrant) {
        let expiry = grant
            .expires_at
            .map(|at| format!("until {}", at.format("%Y-%m-%d %H:%M UTC")))
            .unwrap_or_else(|| "with no expiry".to_string());

        let (to, subject, body) = match &grant.audience {
            Audience::Private(email) => (
                email.clone(),
                format!("A file was shared with you: {}", file.name),
                format!(
                    "You can {} \"{}\" {expiry}.\n\nOpen it at {}",
                    grant.operation,
                    file.name,
                    self.share_link(grant)
                ),
            ),
            Audience::Public => {
                if creator.email.is_empty() {
                    return;
                }
                (
                    creator.email.clone(),
                    format!("Public link created for {}", file.name),
                    format!(
                        "A public {} link for \"{}\" is active {expiry}.\n\nLink: {}/v1/shared/public/{}/<passphrase>",
                        grant.operation, file.name, self.base_url, grant.token
                    ),
                )
            }
        };
        send_best_effort(self.notifier.as_ref(), &[to], &subject, &body);
    }
}

fn expiry(now: DateTime<Utc>, ttl_hours: Option<i64>) -> DomainResult<Option<DateTime<Utc>>> {
    let Some(hours) = ttl_hours else {
        return Ok(None);
    };
    if hours <= 0 {
        return Err(DomainError::Validation("ttl_hours must be a positive integer".to_string()));
    }
    TimeDelta::try_hours(hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .map(Some)
        .ok_or_else(|| DomainError::Validation("ttl_hours is too large".to_string()))
}

fn token_collision(e: StorageError) -> DomainError {
    match e {
        StorageError::AlreadyExists(_) => DomainError::Internal("share token collision".to_string()),
        other => DomainError::Storage(other),
    }
}

fn recipient(shared_with: Option<&str>) -> DomainResult<String> {
    let email = shared_with.map(str::trim).unwrap_or_default();
    if email.is_empty() || !email.contains('@') {
        return Err(DomainError::Validation(
            "shared_with must be a recipient email for private shares".to_string(),
        ));
    }
    Ok(email.to_string())
}
