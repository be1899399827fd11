// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication for the file API.
//!
//! ## Auth Flow
//!
//! 1. The identity service signs an HS256 JWT for the user
//! 2. Client sends `Authorization: Bearer <JWT>`
//! 3. The server:
//!    - Verifies signature, expiry and (if configured) issuer
//!    - Extracts:
//!      - `sub` → canonical `user_id`
//!      - `email` → audience match for private shares
//!
//! ## Security
//!
//! - Every endpoint except health, docs and the public share link requires
//!   authentication
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;

pub use claims::{AuthenticatedUser, JwtClaims};
pub use error::AuthError;
pub use extractor::Auth;
