// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::{AppConfig, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PUBLIC_BASE_URL};
use crate::crypto::KeyWrapCipher;
use crate::notify::{LogNotifier, Notifier};
use crate::sharing::{AccessEvaluator, ShareService};
use crate::storage::{EnvelopeStore, FsBlobStore, MetadataDb, StoragePaths, StorageResult};

/// Bearer token verification settings.
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 secret
    pub secret: Arc<[u8]>,
    /// Expected issuer (optional)
    pub issuer: Option<String>,
}

impl AuthConfig {
    pub fn new(secret: impl AsRef<[u8]>, issuer: Option<String>) -> Self {
        Self {
            secret: Arc::from(secret.as_ref()),
            issuer,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub envelopes: Arc<EnvelopeStore>,
    pub shares: Arc<ShareService>,
    pub access: Arc<AccessEvaluator>,
    pub auth_config: AuthConfig,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(envelopes: EnvelopeStore, notifier: Arc<dyn Notifier>, base_url: &str) -> Self {
        let envelopes = Arc::new(envelopes);
        Self {
            shares: Arc::new(ShareService::new(Arc::clone(&envelopes), notifier, base_url)),
            access: Arc::new(AccessEvaluator::new(Arc::clone(&envelopes))),
            envelopes,
            auth_config: AuthConfig::new(b"", None),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Open storage under `config.data_dir` and wire every service.
    pub fn from_config(config: &AppConfig) -> StorageResult<Self> {
        let paths = StoragePaths::new(&config.data_dir);
        let mut blobs = FsBlobStore::new(paths.clone());
        blobs.initialize()?;
        let db = MetadataDb::open(&paths.metadata_db())?;

        let envelopes = EnvelopeStore::new(
            Arc::new(blobs),
            Arc::new(db),
            KeyWrapCipher::new(Arc::new(config.master_key.clone())),
        );

        Ok(Self::new(envelopes, Arc::new(LogNotifier), &config.public_base_url)
            .with_auth_config(AuthConfig::new(&config.jwt_secret, config.jwt_issuer.clone()))
            .with_max_upload_bytes(config.max_upload_bytes))
    }

    pub fn with_auth_config(mut self, auth_config: AuthConfig) -> Self {
        self.auth_config = auth_config;
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Storage, services and auth rooted in a temp directory.
#[cfg(test)]
pub(crate) fn test_state(
    notifier: Arc<dyn Notifier>,
    jwt_secret: &str,
) -> (AppState, tempfile::TempDir) {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let paths = StoragePaths::new(temp_dir.path());
    let mut blobs = FsBlobStore::new(paths.clone());
    blobs.initialize().expect("Failed to initialize blob store");
    let db = MetadataDb::open(&paths.metadata_db()).expect("Failed to open metadata db");
    let master = crate::crypto::MasterKey::from_bytes(&[0x11; crate::crypto::KEY_LEN]).expect("valid key");

    let envelopes = EnvelopeStore::new(
        Arc::new(blobs),
        Arc::new(db),
        KeyWrapCipher::new(Arc::new(master)),
    );
    let state = AppState::new(envelopes, notifier, DEFAULT_PUBLIC_BASE_URL)
        .with_auth_config(AuthConfig::new(jwt_secret, None));
    (state, temp_dir)
}
