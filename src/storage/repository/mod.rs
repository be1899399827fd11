// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the metadata database.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! using the MetadataDb for all table access.

pub mod files;
pub mod grants;

pub use files::{FileRecord, FileRepository};
pub use grants::{ConsumeOutcome, GrantRepository};
