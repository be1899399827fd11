// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Envelope Storage Module
//!
//! File bodies are sealed under a per-file content key before they ever touch
//! disk; the content key is itself sealed under the process-wide master key
//! and stored with the file's metadata.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   metadata.redb           # file records, share grants, public grant index
//!   blobs/{ab}/{handle}.bin # nonce || ciphertext || tag
//! ```
//!
//! ## Important Notes
//!
//! - Blob bytes are opaque to the blob store; it never sees a key
//! - The master key is never persisted by this module
//! - Every grant mutation that must be atomic happens inside one redb
//!   write transaction

pub mod blob_store;
pub mod envelope_store;
pub mod error;
pub mod metadata_db;
pub mod ownership;
pub mod paths;
pub mod repository;

pub use blob_store::{BlobHandle, BlobStore, FsBlobStore};
pub use envelope_store::{EnvelopeStore, MetadataUpdate, NewUpload};
pub use error::{StorageError, StorageResult};
pub use metadata_db::MetadataDb;
pub use ownership::{OwnedResource, OwnershipCheck};
pub use paths::StoragePaths;
pub use repository::{ConsumeOutcome, FileRecord, FileRepository, GrantRepository};
