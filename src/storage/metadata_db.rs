// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded metadata database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `files`: file_id → serialized FileRecord
//! - `grants`: token → serialized ShareGrant
//! - `public_grant_index`: `file_id|creator` → token of the current public grant
//!
//! redb serializes write transactions, so any read-check-write done inside
//! one `begin_write()` is atomic with respect to every other writer.

use std::path::Path;

use redb::{Database, ReadableDatabase, TableDefinition};

use super::StorageResult;

/// Primary table: file_id → FileRecord (JSON bytes).
pub(crate) const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// Primary table: share token → ShareGrant (JSON bytes).
pub(crate) const GRANTS: TableDefinition<&str, &[u8]> = TableDefinition::new("grants");

/// Uniqueness index: `file_id|creator` → token of the public grant.
pub(crate) const PUBLIC_GRANT_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("public_grant_index");

/// Build the `public_grant_index` key.
pub(crate) fn public_index_key(file_id: &str, creator: &str) -> String {
    format!("{file_id}|{creator}")
}

pub struct MetadataDb {
    db: Database,
}

impl MetadataDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(FILES)?;
            let _ = write_txn.open_table(GRANTS)?;
            let _ = write_txn.open_table(PUBLIC_GRANT_INDEX)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Metadata database opened");
        Ok(Self { db })
    }

    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    /// Confirm a read transaction can be opened against every table.
    pub fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(FILES)?;
        let _ = read_txn.open_table(GRANTS)?;
        let _ = read_txn.open_table(PUBLIC_GRANT_INDEX)?;
        Ok(())
    }
}
