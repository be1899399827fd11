// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Secure Share - Encrypted File Storage & Sharing Service
//!
//! Every upload is sealed under its own AES-256-GCM content key, which is
//! itself wrapped by a process-wide master key before it touches disk.
//! Owners hand out share grants that expire, burn after one use, or sit
//! behind a generated passphrase.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer token authentication (HS256 JWT)
//! - `crypto` - Content encryption and key wrapping
//! - `sharing` - Share grants and access evaluation
//! - `storage` - Blob files and the redb metadata database

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod notify;
pub mod sharing;
pub mod state;
pub mod storage;
