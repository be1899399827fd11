// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Share grant repository.
//!
//! Grants are keyed by their token. Reusable public grants are additionally
//! indexed by `(file, creator)` so repeated public-share requests converge on
//! one grant.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};

use super::super::metadata_db::{public_index_key, GRANTS, PUBLIC_GRANT_INDEX};
use super::super::{MetadataDb, StorageError, StorageResult};
use crate::sharing::{Audience, ShareGrant};

/// Result of the atomic one-time consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// This caller flipped `consumed` from false to true.
    Consumed,
    /// Someone else already did.
    AlreadyConsumed,
    /// The grant lapsed before it could be consumed; it is left untouched.
    Expired,
    /// No grant with that token.
    Missing,
}

/// Repository for share grants.
pub struct GrantRepository<'a> {
    db: &'a MetadataDb,
}

impl<'a> GrantRepository<'a> {
    pub fn new(db: &'a MetadataDb) -> Self {
        Self { db }
    }

    /// Insert a new grant. Fails if the token is already in use.
    pub fn create(&self, grant: &ShareGrant) -> StorageResult<()> {
        let json = serde_json::to_vec(grant)?;

        let write_txn = self.db.database().begin_write()?;
        {
            let mut table = write_txn.open_table(GRANTS)?;
            if table.get(grant.token.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists("Share token".to_string()));
            }
            table.insert(grant.token.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a grant by token.
    pub fn get(&self, token: &str) -> StorageResult<ShareGrant> {
        let read_txn = self.db.database().begin_read()?;
        let table = read_txn.open_table(GRANTS)?;
        match table.get(token)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StorageError::NotFound("Share".to_string())),
        }
    }

    /// The indexed public grant for `(file, creator)`, whatever its state.
    pub fn current_public(&self, file_id: &str, creator: &str) -> StorageResult<ShareGrant> {
        let read_txn = self.db.database().begin_read()?;
        let index = read_txn.open_table(PUBLIC_GRANT_INDEX)?;
        let token = index
            .get(public_index_key(file_id, creator).as_str())?
            .map(|v| v.value().to_string())
            .ok_or_else(|| StorageError::NotFound("Public share".to_string()))?;

        let grants = read_txn.open_table(GRANTS)?;
        match grants.get(token.as_str())? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StorageError::NotFound("Public share".to_string())),
        }
    }

    /// Return the active public grant for `(file, creator)` if there is one,
    /// otherwise persist `candidate` and index it.
    ///
    /// Runs in a single write transaction, so concurrent callers end up with
    /// the same grant. The boolean is `true` when an existing grant was reused.
    pub fn find_or_create_public(
        &self,
        candidate: &ShareGrant,
        now: DateTime<Utc>,
    ) -> StorageResult<(ShareGrant, bool)> {
        let key = public_index_key(&candidate.file_id, &candidate.created_by);
        let json = serde_json::to_vec(candidate)?;

        let write_txn = self.db.database().begin_write()?;
        {
            let mut index = write_txn.open_table(PUBLIC_GRANT_INDEX)?;
            let mut grants = write_txn.open_table(GRANTS)?;

            let existing_token = index.get(key.as_str())?.map(|v| v.value().to_string());
            if let Some(token) = existing_token {
                let existing = grants
                    .get(token.as_str())?
                    .map(|v| serde_json::from_slice::<ShareGrant>(v.value()))
                    .transpose()?;
                if let Some(grant) = existing.filter(|g| g.is_active_at(now)) {
                    return Ok((grant, true));
                }
            }

            if grants.get(candidate.token.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists("Share token".to_string()));
            }
            grants.insert(candidate.token.as_str(), json.as_slice())?;
            index.insert(key.as_str(), candidate.token.as_str())?;
        }
        write_txn.commit()?;
        Ok((candidate.clone(), false))
    }

    /// Flip `consumed` to true if, and only if, it is currently false and
    /// the grant has not expired at `now`.
    ///
    /// The read and the write happen inside one write transaction; two
    /// callers racing on the same token get exactly one `Consumed`.
    pub fn consume(&self, token: &str, now: DateTime<Utc>) -> StorageResult<ConsumeOutcome> {
        let write_txn = self.db.database().begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(GRANTS)?;
            let existing = table.get(token)?.map(|v| v.value().to_vec());
            match existing {
                None => ConsumeOutcome::Missing,
                Some(bytes) => {
                    let mut grant: ShareGrant = serde_json::from_slice(&bytes)?;
                    if grant.consumed {
                        ConsumeOutcome::AlreadyConsumed
                    } else if grant.is_expired_at(now) {
                        ConsumeOutcome::Expired
                    } else {
                        grant.consumed = true;
                        grant.consumed_at = Some(now);
                        let json = serde_json::to_vec(&grant)?;
                        table.insert(token, json.as_slice())?;
                        ConsumeOutcome::Consumed
                    }
                }
            }
        };
        if outcome == ConsumeOutcome::Consumed {
            write_txn.commit()?;
        }
        Ok(outcome)
    }

    /// Active private grants addressed to `email`.
    pub fn list_for_recipient(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<Vec<ShareGrant>> {
        let read_txn = self.db.database().begin_read()?;
        let table = read_txn.open_table(GRANTS)?;

        let mut grants = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let grant: ShareGrant = serde_json::from_slice(value.value())?;
            let addressed = matches!(&grant.audience, Audience::Private(to) if to == email);
            if addressed && grant.is_active_at(now) {
                grants.push(grant);
            }
        }
        grants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(grants)
    }
}
