// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Envelope store: binds content-key generation, file encryption and key
//! wrapping into a file's lifecycle.
//!
//! Upload order is key → encrypt → wrap → blob → record. Nothing is written
//! until all crypto has succeeded, and a blob whose record could not be
//! inserted is removed again, so a record never points at a missing blob and
//! a blob is never left without its wrapped key.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::ownership::OwnershipCheck;
use super::{BlobStore, FileRecord, FileRepository, MetadataDb};
use crate::crypto::{ContentKey, CryptoError, FileCipher, KeyWrapCipher};
use crate::error::{DomainError, DomainResult};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Input to [`EnvelopeStore::seal_upload`].
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Owner-editable metadata. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct MetadataUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub struct EnvelopeStore {
    blobs: Arc<dyn BlobStore>,
    db: Arc<MetadataDb>,
    key_wrap: KeyWrapCipher,
    cipher: FileCipher,
}

impl EnvelopeStore {
    pub fn new(blobs: Arc<dyn BlobStore>, db: Arc<MetadataDb>, key_wrap: KeyWrapCipher) -> Self {
        Self {
            blobs,
            db,
            key_wrap,
            cipher: FileCipher::new(),
        }
    }

    pub fn db(&self) -> &Arc<MetadataDb> {
        &self.db
    }

    fn files(&self) -> FileRepository<'_> {
        FileRepository::new(&self.db)
    }

    /// Encrypt and persist an upload. Returns the stored record.
    pub fn seal_upload(&self, upload: NewUpload) -> DomainResult<FileRecord> {
        let name = validated_name(&upload.name)?;

        let key = ContentKey::generate()?;
        let sealed = self.cipher.encrypt(&key, &upload.bytes)?;
        let wrapped_key = self.key_wrap.wrap(&key)?;
        drop(key);

        let blob = self.blobs.put(&sealed)?;
        let record = FileRecord {
            id: Uuid::new_v4().to_string(),
            owner_id: upload.owner_id,
            name,
            description: upload.description.trim().to_string(),
            content_type: upload
                .content_type
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            size_bytes: upload.bytes.len() as u64,
            blob,
            wrapped_key,
            uploaded_at: Utc::now(),
        };

        if let Err(e) = self.files().create(&record) {
            if let Err(cleanup) = self.blobs.delete(&record.blob) {
                tracing::warn!(
                    blob = %record.blob,
                    error = %cleanup,
                    "Failed to remove blob after record insert failure"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            file_id = %record.id,
            owner_id = %record.owner_id,
            size_bytes = record.size_bytes,
            "File sealed and stored"
        );
        Ok(record)
    }

    /// Unwrap the content key and decrypt the blob.
    ///
    /// Authentication failures surface as [`DomainError::Integrity`] and are
    /// never retried. A missing blob is a storage failure, not `NotFound`.
    pub fn open_for_read(&self, file: &FileRecord) -> DomainResult<Vec<u8>> {
        let sealed = self.blobs.get(&file.blob)?;

        let plaintext = self
            .key_wrap
            .unwrap(&file.wrapped_key)
            .and_then(|key| self.cipher.decrypt(&key, &sealed));

        plaintext.map_err(|e| {
            if matches!(e, CryptoError::Integrity) {
                tracing::error!(file_id = %file.id, "Stored file failed integrity verification");
            }
            DomainError::from(e)
        })
    }

    /// A record owned by `owner_id`. Someone else's file is `NotFound`.
    pub fn get_owned(&self, owner_id: &str, file_id: &str) -> DomainResult<FileRecord> {
        self.files().get(file_id).verify_owner(owner_id, "File")
    }

    /// Owner read: the record and its decrypted bytes.
    pub fn read_owned(&self, owner_id: &str, file_id: &str) -> DomainResult<(FileRecord, Vec<u8>)> {
        let record = self.get_owned(owner_id, file_id)?;
        let bytes = self.open_for_read(&record)?;
        Ok((record, bytes))
    }

    /// Rename or re-describe a file. The sealed blob is untouched.
    pub fn update_metadata(
        &self,
        owner_id: &str,
        file_id: &str,
        update: MetadataUpdate,
    ) -> DomainResult<FileRecord> {
        let mut record = self.get_owned(owner_id, file_id)?;
        if let Some(name) = update.name {
            record.name = validated_name(&name)?;
        }
        if let Some(description) = update.description {
            record.description = description.trim().to_string();
        }
        self.files()
            .update(&record)
            .map_err(DomainError::lookup("File"))?;

        tracing::info!(file_id = %record.id, "File metadata updated");
        Ok(record)
    }

    /// Remove the record, every grant on it, and then the blob.
    pub fn delete(&self, owner_id: &str, file_id: &str) -> DomainResult<()> {
        self.get_owned(owner_id, file_id)?;
        let record = self
            .files()
            .delete_with_grants(file_id)
            .map_err(DomainError::lookup("File"))?;

        if let Err(e) = self.blobs.delete(&record.blob) {
            tracing::warn!(file_id = %record.id, error = %e, "Blob removal failed after delete");
        }
        tracing::info!(file_id = %record.id, owner_id = %owner_id, "File deleted");
        Ok(())
    }

    pub fn list_for_owner(&self, owner_id: &str) -> DomainResult<Vec<FileRecord>> {
        Ok(self.files().list_by_owner(owner_id)?)
    }

    /// Blob store writable and every metadata table readable.
    pub fn health_check(&self) -> DomainResult<()> {
        self.blobs.health_check()?;
        self.db.health_check()?;
        Ok(())
    }
}

fn validated_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::Validation("File name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::crypto::{MasterKey, KEY_LEN};
    use crate::storage::{BlobHandle, FsBlobStore, StorageError, StoragePaths, StorageResult};
    use tempfile::TempDir;

    pub(crate) fn test_envelope_store() -> (EnvelopeStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let paths = StoragePaths::new(temp_dir.path());
        let mut blobs = FsBlobStore::new(paths.clone());
        blobs.initialize().expect("Failed to initialize blob store");
        let db = MetadataDb::open(&paths.metadata_db()).expect("Failed to open metadata db");
        let master = MasterKey::from_bytes(&[0x42; KEY_LEN]).expect("valid key");

        let store = EnvelopeStore::new(
            Arc::new(blobs),
            Arc::new(db),
            KeyWrapCipher::new(Arc::new(master)),
        );
        (store, temp_dir)
    }

    pub(crate) fn upload(owner: &str, bytes: &[u8]) -> NewUpload {
        NewUpload {
            owner_id: owner.to_string(),
            name: "notes.txt".to_string(),
            description: String::new(),
            content_type: Some("text/plain".to_string()),
            bytes: bytes.to_vec(),
        }
    }

    /// Blob store whose writes always fail.
    struct BrokenBlobStore;

    impl BlobStore for BrokenBlobStore {
        fn put(&self, _bytes: &[u8]) -> StorageResult<BlobHandle> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }
        fn get(&self, handle: &BlobHandle) -> StorageResult<Vec<u8>> {
            Err(StorageError::NotFound(handle.to_string()))
        }
        fn delete(&self, _handle: &BlobHandle) -> StorageResult<()> {
            Ok(())
        }
        fn health_check(&self) -> StorageResult<()> {
            Err(StorageError::NotInitialized)
        }
    }

    #[test]
    fn eighteen_bytes_round_trip() {
        let (store, _dir) = test_envelope_store();
        let payload = b"eighteen byte body";
        assert_eq!(payload.len(), 18);

        let record = store.seal_upload(upload("alice", payload)).unwrap();
        assert_eq!(record.size_bytes, 18);
        assert_eq!(record.content_type, "text/plain");
        assert_eq!(store.open_for_read(&record).unwrap(), payload);
    }

    #[test]
    fn blob_on_disk_is_ciphertext() {
        let (store, dir) = test_envelope_store();
        let payload = b"the quick brown fox jumps";
        let record = store.seal_upload(upload("alice", payload)).unwrap();

        let on_disk = std::fs::read(StoragePaths::new(dir.path()).blob(record.blob.as_str())).unwrap();
        assert_eq!(on_disk.len(), 12 + payload.len() + 16);
        assert!(!on_disk.windows(payload.len()).any(|w| w == payload));
    }

    #[test]
    fn missing_content_type_defaults() {
        let (store, _dir) = test_envelope_store();
        let mut input = upload("alice", b"x");
        input.content_type = None;
        let record = store.seal_upload(input).unwrap();
        assert_eq!(record.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn empty_name_is_rejected_before_anything_is_written() {
        let (store, _dir) = test_envelope_store();
        let mut input = upload("alice", b"x");
        input.name = "   ".to_string();
        assert!(matches!(store.seal_upload(input), Err(DomainError::Validation(_))));
        assert!(store.list_for_owner("alice").unwrap().is_empty());
    }

    #[test]
    fn failed_blob_write_leaves_no_record() {
        let (fs_store, _dir) = test_envelope_store();
        let store = EnvelopeStore::new(
            Arc::new(BrokenBlobStore),
            Arc::clone(fs_store.db()),
            fs_store.key_wrap.clone(),
        );

        let result = store.seal_upload(upload("alice", b"payload"));
        assert!(matches!(result, Err(DomainError::Storage(_))));
        assert!(store.list_for_owner("alice").unwrap().is_empty());
    }

    #[test]
    fn tampered_blob_is_integrity_failure() {
        let (store, dir) = test_envelope_store();
        let record = store.seal_upload(upload("alice", b"sensitive")).unwrap();

        let path = StoragePaths::new(dir.path()).blob(record.blob.as_str());
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[14] ^= 0x01;
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(store.open_for_read(&record), Err(DomainError::Integrity)));
    }

    #[test]
    fn tampered_wrapped_key_is_integrity_failure() {
        let (store, _dir) = test_envelope_store();
        let mut record = store.seal_upload(upload("alice", b"sensitive")).unwrap();
        record.wrapped_key[20] ^= 0x80;
        assert!(matches!(store.open_for_read(&record), Err(DomainError::Integrity)));
    }

    #[test]
    fn missing_blob_is_storage_failure_not_not_found() {
        let (store, dir) = test_envelope_store();
        let record = store.seal_upload(upload("alice", b"sensitive")).unwrap();
        std::fs::remove_file(StoragePaths::new(dir.path()).blob(record.blob.as_str())).unwrap();

        assert!(matches!(
            store.open_for_read(&record),
            Err(DomainError::Storage(StorageError::NotFound(_)))
        ));
    }

    #[test]
    fn other_users_file_looks_missing() {
        let (store, _dir) = test_envelope_store();
        let record = store.seal_upload(upload("alice", b"mine")).unwrap();

        assert!(store.get_owned("alice", &record.id).is_ok());
        assert!(matches!(
            store.get_owned("mallory", &record.id),
            Err(DomainError::NotFound("File"))
        ));
        assert!(matches!(
            store.get_owned("alice", "no-such-file"),
            Err(DomainError::NotFound("File"))
        ));
    }

    #[test]
    fn update_metadata_keeps_ciphertext() {
        let (store, _dir) = test_envelope_store();
        let record = store.seal_upload(upload("alice", b"contents")).unwrap();

        let updated = store
            .update_metadata(
                "alice",
                &record.id,
                MetadataUpdate {
                    name: Some(" report.pdf ".to_string()),
                    description: Some("Q3".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.name, "report.pdf");
        assert_eq!(updated.description, "Q3");
        assert_eq!(updated.blob, record.blob);
        assert_eq!(updated.wrapped_key, record.wrapped_key);
        assert_eq!(store.open_for_read(&updated).unwrap(), b"contents");

        assert!(matches!(
            store.update_metadata("mallory", &record.id, MetadataUpdate::default()),
            Err(DomainError::NotFound("File"))
        ));
    }

    #[test]
    fn delete_removes_record_and_blob() {
        let (store, dir) = test_envelope_store();
        let record = store.seal_upload(upload("alice", b"bye")).unwrap();
        let path = StoragePaths::new(dir.path()).blob(record.blob.as_str());
        assert!(path.exists());

        assert!(matches!(
            store.delete("mallory", &record.id),
            Err(DomainError::NotFound("File"))
        ));
        store.delete("alice", &record.id).unwrap();

        assert!(!path.exists());
        assert!(matches!(
            store.get_owned("alice", &record.id),
            Err(DomainError::NotFound("File"))
        ));
    }

    #[test]
    fn read_owned_returns_plaintext() {
        let (store, _dir) = test_envelope_store();
        let record = store.seal_upload(upload("alice", b"plain")).unwrap();
        let (found, bytes) = store.read_owned("alice", &record.id).unwrap();
        assert_eq!(found.id, record.id);
        assert_eq!(bytes, b"plain");
    }

    #[test]
    fn health_check_passes() {
        let (store, _dir) = test_envelope_store();
        store.health_check().unwrap();
    }
}
