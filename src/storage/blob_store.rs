// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Byte-addressable blob storage.
//!
//! Blobs are opaque: the store never sees plaintext, only sealed envelopes
//! produced by the [`FileCipher`](crate::crypto::FileCipher). It therefore does
//! no encryption of its own and can be any byte store addressable by handle.

use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{StorageError, StoragePaths, StorageResult};

/// Opaque reference to a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobHandle(String);

impl BlobHandle {
    /// Allocate a fresh random handle.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Handles are lowercase hex; anything else cannot have come from
    /// [`BlobHandle::generate`] and must not reach the filesystem.
    fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlobHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Storage for sealed file bodies.
pub trait BlobStore: Send + Sync {
    /// Store bytes under a newly allocated handle.
    fn put(&self, bytes: &[u8]) -> StorageResult<BlobHandle>;

    /// Read back a blob.
    fn get(&self, handle: &BlobHandle) -> StorageResult<Vec<u8>>;

    /// Remove a blob. Removing a missing blob is not an error.
    fn delete(&self, handle: &BlobHandle) -> StorageResult<()>;

    /// Verify the store is reachable and writable.
    fn health_check(&self) -> StorageResult<()>;
}

/// Filesystem-backed blob store.
///
/// Writes go to a temp file that is renamed into place, so a crash mid-write
/// never leaves a partially written blob under a live handle.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    paths: StoragePaths,
    initialized: bool,
}

impl FsBlobStore {
    /// Does NOT create the directory structure. Call `initialize()` first.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create the blob directory. Safe to call multiple times.
    pub fn initialize(&mut self) -> StorageResult<()> {
        fs::create_dir_all(self.paths.blobs_dir())?;
        self.initialized = true;
        Ok(())
    }

    fn ensure_initialized(&self) -> StorageResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StorageError::NotInitialized)
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Write and fsync `temp`, then rename it over `dest`. On any failure the
/// temp file is removed before the error is returned.
fn write_atomically(temp: &Path, dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let result = write_synced(temp, bytes).and_then(|()| fs::rename(temp, dest));
    if result.is_err() {
        if let Err(e) = fs::remove_file(temp) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %temp.display(), error = %e, "Failed to remove partial blob");
            }
        }
    }
    result
}

impl BlobStore for FsBlobStore {
    fn put(&self, bytes: &[u8]) -> StorageResult<BlobHandle> {
        self.ensure_initialized()?;

        let handle = BlobHandle::generate();
        let path = self.paths.blob(handle.as_str());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        write_atomically(&path.with_extension("tmp"), &path, bytes)?;

        Ok(handle)
    }

    fn get(&self, handle: &BlobHandle) -> StorageResult<Vec<u8>> {
        self.ensure_initialized()?;
        if !handle.is_well_formed() {
            return Err(StorageError::NotFound(format!("Blob {handle}")));
        }

        let mut file = File::open(self.paths.blob(handle.as_str())).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(format!("Blob {handle}"))
            } else {
                StorageError::Io(e)
            }
        })?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    fn delete(&self, handle: &BlobHandle) -> StorageResult<()> {
        self.ensure_initialized()?;
        if !handle.is_well_formed() {
            return Ok(());
        }

        match fs::remove_file(self.paths.blob(handle.as_str())) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write-read-delete probe under the blob directory.
    fn health_check(&self) -> StorageResult<()> {
        self.ensure_initialized()?;

        let probe = b"health_check_data";
        let handle = self.put(probe)?;
        let read_back = self.get(&handle);
        self.delete(&handle)?;

        if read_back? != probe {
            return Err(StorageError::Io(std::io::Error::other(
                "health check data mismatch",
            )));
        }
        Ok(())
    }
}
