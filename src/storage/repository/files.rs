// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File record repository.
//!
//! A record holds everything needed to read a file back except the master
//! key: the blob handle of the sealed body and the wrapped content key.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use super::super::metadata_db::{public_index_key, FILES, GRANTS, PUBLIC_GRANT_INDEX};
use super::super::{BlobHandle, MetadataDb, OwnedResource, StorageError, StorageResult};
use crate::sharing::ShareGrant;

/// File metadata as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    /// Random 128-bit identifier (UUID v4).
    pub id: String,
    pub owner_id: String,
    /// Display name supplied at upload.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Client-declared content type, returned as a hint on read.
    pub content_type: String,
    /// Plaintext length in bytes.
    pub size_bytes: u64,
    /// Sealed body in the blob store.
    pub blob: BlobHandle,
    /// Content key wrapped under the master key.
    #[serde(with = "hex::serde")]
    pub wrapped_key: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

impl OwnedResource for FileRecord {
    fn owner_user_id(&self) -> &str {
        &self.owner_id
    }
}

/// Repository for file records.
pub struct FileRepository<'a> {
    db: &'a MetadataDb,
}

impl<'a> FileRepository<'a> {
    pub fn new(db: &'a MetadataDb) -> Self {
        Self { db }
    }

    /// Insert a new record. Fails if the id is already taken.
    pub fn create(&self, record: &FileRecord) -> StorageResult<()> {
        let json = serde_json::to_vec(record)?;

        let write_txn = self.db.database().begin_write()?;
        {
            let mut table = write_txn.open_table(FILES)?;
            if table.get(record.id.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!("File {}", record.id)));
            }
            table.insert(record.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a record by id.
    pub fn get(&self, file_id: &str) -> StorageResult<FileRecord> {
        let read_txn = self.db.database().begin_read()?;
        let table = read_txn.open_table(FILES)?;
        match table.get(file_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StorageError::NotFound(format!("File {file_id}"))),
        }
    }

    /// Replace an existing record.
    pub fn update(&self, record: &FileRecord) -> StorageResult<()> {
        let json = serde_json::to_vec(record)?;

        let write_txn = self.db.database().begin_write()?;
        {
            let mut table = write_txn.open_table(FILES)?;
            if table.get(record.id.as_str())?.is_none() {
                return Err(StorageError::NotFound(format!("File {}", record.id)));
            }
            table.insert(record.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove a record together with every grant that points at it.
    ///
    /// Returns the removed record so the caller can release its blob.
    pub fn delete_with_grants(&self, file_id: &str) -> StorageResult<FileRecord> {
        let write_txn = self.db.database().begin_write()?;
        let record = {
            let mut files = write_txn.open_table(FILES)?;
            let bytes = files
                .remove(file_id)?
                .map(|v| v.value().to_vec())
                .ok_or_else(|| StorageError::NotFound(format!("File {file_id}")))?;
            let record: FileRecord = serde_json::from_slice(&bytes)?;

            let mut grants = write_txn.open_table(GRANTS)?;
            let mut doomed = Vec::new();
            for entry in grants.iter()? {
                let (token, value) = entry?;
                let grant: ShareGrant = serde_json::from_slice(value.value())?;
                if grant.file_id == file_id {
                    doomed.push((token.value().to_string(), grant.created_by));
                }
            }

            let mut index = write_txn.open_table(PUBLIC_GRANT_INDEX)?;
            for (token, creator) in &doomed {
                grants.remove(token.as_str())?;
                index.remove(public_index_key(file_id, creator).as_str())?;
            }

            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// All files owned by a user, newest first.
    pub fn list_by_owner(&self, owner_id: &str) -> StorageResult<Vec<FileRecord>> {
        let read_txn = self.db.database().begin_read()?;
        let table = read_txn.open_table(FILES)?;

        let mut files = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let record: FileRecord = serde_json::from_slice(value.value())?;
            if record.owner_id == owner_id {
                files.push(record);
            }
        }
        files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(files)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sharing::grant::tests::grant;
    use crate::sharing::Audience;
    use crate::storage::metadata_db::tests::test_db;
    use crate::storage::repository::GrantRepository;
    use chrono::Duration;

    pub(crate) fn test_record(id: &str, owner: &str) -> FileRecord {
        FileRecord {
            id: id.to_string(),
            owner_id: owner.to_string(),
            name: format!("{id}.txt"),
            description: String::new(),
            content_type: "text/plain".to_string(),
            size_bytes: 18,
            blob: BlobHandle::generate(),
            wrapped_key: vec![0xab; 60],
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_get_file() {
        let (db, _dir) = test_db();
        let repo = FileRepository::new(&db);

        let record = test_record("file-1", "alice");
        repo.create(&record).unwrap();

        assert_eq!(repo.get("file-1").unwrap(), record);
    }

    #[test]
    fn wrapped_key_is_stored_as_hex() {
        let record = test_record("file-hex", "alice");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["wrapped_key"], "ab".repeat(60));
    }

    #[test]
    fn duplicate_id_rejected() {
        let (db, _dir) = test_db();
        let repo = FileRepository::new(&db);

        repo.create(&test_record("dup", "alice")).unwrap();
        let result = repo.create(&test_record("dup", "bob"));
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
        assert_eq!(repo.get("dup").unwrap().owner_id, "alice");
    }

    #[test]
    fn missing_file_is_not_found() {
        let (db, _dir) = test_db();
        let repo = FileRepository::new(&db);
        assert!(matches!(repo.get("nope"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn update_changes_metadata() {
        let (db, _dir) = test_db();
        let repo = FileRepository::new(&db);

        let mut record = test_record("upd", "alice");
        repo.create(&record).unwrap();

        record.name = "renamed.txt".to_string();
        record.description = "quarterly numbers".to_string();
        repo.update(&record).unwrap();

        let loaded = repo.get("upd").unwrap();
        assert_eq!(loaded.name, "renamed.txt");
        assert_eq!(loaded.description, "quarterly numbers");
    }

    #[test]
    fn update_of_missing_file_fails() {
        let (db, _dir) = test_db();
        let repo = FileRepository::new(&db);
        let result = repo.update(&test_record("ghost", "alice"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn list_by_owner_filters_and_orders() {
        let (db, _dir) = test_db();
        let repo = FileRepository::new(&db);

        let mut older = test_record("older", "alice");
        older.uploaded_at = Utc::now() - Duration::hours(2);
        let newer = test_record("newer", "alice");
        repo.create(&older).unwrap();
        repo.create(&newer).unwrap();
        repo.create(&test_record("other", "bob")).unwrap();

        let ids: Vec<String> = repo
            .list_by_owner("alice")
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["newer".to_string(), "older".to_string()]);
    }

    #[test]
    fn delete_removes_grants_for_that_file_only() {
        let (db, _dir) = test_db();
        let files = FileRepository::new(&db);
        let grants = GrantRepository::new(&db);

        files.create(&test_record("file-1", "owner-1")).unwrap();
        files.create(&test_record("file-2", "owner-1")).unwrap();

        let mut private = grant(Audience::Private("bob@x.com".into()), None);
        private.token = "tok-private".into();
        grants.create(&private).unwrap();

        let now = Utc::now();
        let mut candidate = grant(Audience::Public, None);
        candidate.token = "tok-public".into();
        let (public, _) = grants.find_or_create_public(&candidate, now).unwrap();

        let mut other = grant(Audience::Private("bob@x.com".into()), None);
        other.token = "tok-other".into();
        other.file_id = "file-2".into();
        grants.create(&other).unwrap();

        let removed = files.delete_with_grants("file-1").unwrap();
        assert_eq!(removed.id, "file-1");

        assert!(matches!(files.get("file-1"), Err(StorageError::NotFound(_))));
        assert!(matches!(grants.get("tok-private"), Err(StorageError::NotFound(_))));
        assert!(matches!(grants.get(&public.token), Err(StorageError::NotFound(_))));
        assert!(matches!(
            grants.current_public("file-1", "owner-1"),
            Err(StorageError::NotFound(_))
        ));
        assert!(grants.get("tok-other").is_ok());
    }
}
