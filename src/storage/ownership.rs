// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for file operations.
//!
//! A file that exists but belongs to someone else is reported exactly like a
//! file that does not exist, so callers cannot probe for other users' ids.

use super::StorageError;
use crate::error::{DomainError, DomainResult};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_user_id(&self) -> &str;

    fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_user_id() == user_id
    }
}

/// Ownership check on the result of a storage lookup.
pub trait OwnershipCheck<T> {
    /// Return the resource if `user_id` owns it, `NotFound(resource)` otherwise.
    fn verify_owner(self, user_id: &str, resource: &'static str) -> DomainResult<T>;
}

impl<T: OwnedResource> OwnershipCheck<T> for Result<T, StorageError> {
    fn verify_owner(self, user_id: &str, resource: &'static str) -> DomainResult<T> {
        let found = self.map_err(DomainError::lookup(resource))?;
        if found.is_owned_by(user_id) {
            Ok(found)
        } else {
            tracing::debug!(user_id = %user_id, resource, "Ownership mismatch reported as not found");
            Err(DomainError::NotFound(resource))
        }
    }
}
