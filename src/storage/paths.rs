// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the on-disk storage layout.

use std::path::{Path, PathBuf};

/// Default base directory for all persistent storage.
pub const DATA_ROOT: &str = "/data";

/// File name of the embedded metadata database.
pub const METADATA_DB_FILE: &str = "metadata.redb";

/// Extension used for sealed blobs.
pub const BLOB_EXTENSION: &str = "bin";

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Blob Paths ==========

    /// Directory containing all sealed blobs.
    pub fn blobs_dir(&self) -> PathBuf {
        self.root.join("blobs")
    }

    /// Path to a specific blob.
    ///
    /// Blobs are fanned out by the first two characters of the handle so no
    /// single directory grows unbounded.
    pub fn blob(&self, handle: &str) -> PathBuf {
        let shard = handle.get(..2).unwrap_or("__");
        self.blobs_dir()
            .join(shard)
            .join(format!("{handle}.{BLOB_EXTENSION}"))
    }

    // ========== Metadata Paths ==========

    /// Path to the metadata database.
    pub fn metadata_db(&self) -> PathBuf {
        self.root.join(METADATA_DB_FILE)
    }
}
