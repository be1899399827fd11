// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Sharing
//!
//! Owners hand out share grants; anyone holding a grant's link asks the
//! access evaluator for the file. Grants never expose key material, only
//! policy: audience, operation, expiry and one-time use.

pub mod access;
pub mod grant;
pub mod passphrase;
pub mod service;

pub use access::{AccessEvaluator, Requester, SharedContent};
pub use grant::{Audience, Disposition, GrantState, ShareGrant, ShareOperation};
pub use service::{CreateShare, IssuedShare, ReceivedShare, ShareService};
