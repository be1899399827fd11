// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access evaluation for share links.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. the grant exists
//! 2. it has not expired
//! 3. it has not been consumed
//! 4. the entry point matches the audience, then the passphrase or the
//!    recipient email matches
//! 5. the stored operation is `view` or `download`
//!
//! Only then are bytes decrypted. A one-time grant is consumed after a
//! successful decrypt, atomically; a caller that loses that race is denied.

use std::sync::Arc;

use chrono::Utc;

use super::grant::{Audience, Disposition, ShareGrant, ShareOperation};
use super::passphrase::passphrase_matches;
use crate::auth::AuthenticatedUser;
use crate::error::{DomainError, DomainResult};
use crate::storage::{ConsumeOutcome, EnvelopeStore, FileRepository, GrantRepository};

/// The entry point a share link was opened through.
#[derive(Clone, Copy)]
pub enum Requester<'a> {
    /// Bearer-authenticated private endpoint.
    Private(&'a AuthenticatedUser),
    /// Anonymous public endpoint carrying a passphrase.
    Public { passphrase: &'a str },
}

/// Decrypted bytes plus how to present them.
#[derive(Debug)]
pub struct SharedContent {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
    pub operation: ShareOperation,
    pub disposition: Disposition,
}

pub struct AccessEvaluator {
    envelopes: Arc<EnvelopeStore>,
}

impl AccessEvaluator {
    pub fn new(envelopes: Arc<EnvelopeStore>) -> Self {
        Self { envelopes }
    }

    pub fn evaluate(&self, token: &str, requester: Requester<'_>) -> DomainResult<SharedContent> {
        let db = self.envelopes.db();
        let grant = GrantRepository::new(db)
            .get(token)
            .map_err(DomainError::lookup("Share"))?;

        let now = Utc::now();
        if grant.is_expired_at(now) {
            tracing::debug!(token = %grant.log_id(), "Share link expired");
            return Err(DomainError::Expired);
        }
        if grant.consumed {
            tracing::debug!(token = %grant.log_id(), "Share link already used");
            return Err(DomainError::Consumed);
        }

        authorize(&grant, requester)?;
        let operation = grant.operation()?;

        let file = FileRepository::new(db)
            .get(&grant.file_id)
            .map_err(DomainError::lookup("Share"))?;
        let bytes = self.envelopes.open_for_read(&file)?;

        if grant.one_time {
            match GrantRepository::new(db).consume(&grant.token, Utc::now())? {
                ConsumeOutcome::Consumed => {}
                ConsumeOutcome::Expired => {
                    tracing::debug!(token = %grant.log_id(), "Share link expired during access");
                    return Err(DomainError::Expired);
                }
                ConsumeOutcome::AlreadyConsumed => {
                    tracing::info!(token = %grant.log_id(), "Lost race for one-time share");
                    return Err(DomainError::Consumed);
                }
                ConsumeOutcome::Missing => return Err(DomainError::NotFound("Share")),
            }
        }

        tracing::info!(
            token = %grant.log_id(),
            file_id = %file.id,
            operation = %operation,
            one_time = grant.one_time,
            "Shared file accessed"
        );

        Ok(SharedContent {
            bytes,
            file_name: file.name,
            content_type: file.content_type,
            operation,
            disposition: operation.disposition(),
        })
    }
}

/// Channel, then credential. Public grants take a passphrase, private
/// grants an exact email match.
fn authorize(grant: &ShareGrant, requester: Requester<'_>) -> DomainResult<()> {
    match (&grant.audience, requester) {
        (Audience::Public, Requester::Private(_)) => Err(DomainError::WrongChannel(
            "This is a public share. Use the public link with its passphrase.",
        )),
        (Audience::Private(_), Requester::Public { .. }) => Err(DomainError::WrongChannel(
            "This is a private share. Sign in and use the private link.",
        )),
        (Audience::Public, Requester::Public { passphrase }) => {
            let matches = grant
                .passphrase
                .as_deref()
                .is_some_and(|expected| passphrase_matches(expected, passphrase));
            if matches {
                Ok(())
            } else {
                tracing::info!(token = %grant.log_id(), "Wrong passphrase for public share");
                Err(DomainError::Forbidden("Invalid passphrase"))
            }
        }
        (Audience::Private(email), Requester::Private(user)) => {
            if !user.email.is_empty() && user.email == *email {
                Ok(())
            } else {
                tracing::info!(
                    token = %grant.log_id(),
                    user_id = %user.user_id,
                    "Share opened by someone other than its recipient"
                );
                Err(DomainError::Forbidden("This file was not shared with you"))
            }
        }
    }
}
