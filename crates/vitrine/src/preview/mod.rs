//! Preview Tokens
//!
//! Short-lived, theme-scoped credentials that let someone view a theme before
//! it is activated. Tokens are never revoked explicitly; they expire, and
//! expired tokens are reclaimed whenever a new one is issued.

mod token;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use token::generate_token;

use crate::common::{ThemeError, ThemeResult};
use crate::store::{DocumentStore, PreviewToken, StoreError};

/// Attempts before giving up on a colliding token (64 hex chars, so in
/// practice never more than one)
const ISSUE_ATTEMPTS: usize = 3;

/// What a valid token grants
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewGrant {
    pub theme_name: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PreviewTokenService {
    store: Arc<dyn DocumentStore>,
    ttl: Duration,
}

impl PreviewTokenService {
    pub fn new(store: Arc<dyn DocumentStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for an installed theme.
    pub async fn issue(&self, theme_name: &str, issued_by: &str) -> ThemeResult<PreviewToken> {
        match self.store.find_plugin(theme_name).await? {
            Some(record) if record.installed => {}
            _ => return Err(ThemeError::PluginNotInstalled(theme_name.to_string())),
        }

        if let Err(e) = self.purge_expired().await {
            warn!("Failed to purge expired preview tokens: {}", e);
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let now = Utc::now();
            let token = PreviewToken {
                token: generate_token(),
                theme_name: theme_name.to_string(),
                issued_by: issued_by.to_string(),
                expires_at: now + self.ttl,
                created_at: now,
            };

            match self.store.insert_token(token.clone()).await {
                Ok(()) => {
                    info!(
                        "Issued preview token for theme '{}' to '{}' (expires {})",
                        theme_name,
                        issued_by,
                        token.expires_at.to_rfc3339()
                    );
                    return Ok(token);
                }
                Err(StoreError::DuplicateToken) if attempt < ISSUE_ATTEMPTS => {
                    warn!("Preview token collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Check `token` against `requested_theme`.
    ///
    /// Expiry is checked before the theme, so an expired token always reports
    /// `TokenExpired` whatever theme it is presented for. Validation never
    /// deletes: an expired link keeps reporting `TokenExpired` until it is
    /// purged.
    pub async fn validate(&self, token: &str, requested_theme: &str) -> ThemeResult<PreviewGrant> {
        let Some(stored) = self.store.find_token(token).await? else {
            debug!("Preview token not found");
            return Err(ThemeError::TokenNotFound);
        };

        if stored.is_expired_at(Utc::now()) {
            debug!("Preview token for '{}' has expired", stored.theme_name);
            return Err(ThemeError::TokenExpired {
                expired_at: stored.expires_at,
            });
        }

        if stored.theme_name != requested_theme {
            debug!(
                "Preview token for '{}' presented for '{}'",
                stored.theme_name, requested_theme
            );
            return Err(ThemeError::TokenThemeMismatch {
                issued_for: stored.theme_name,
                requested: requested_theme.to_string(),
            });
        }

        Ok(PreviewGrant {
            theme_name: stored.theme_name,
            expires_at: stored.expires_at,
        })
    }

    /// Delete every expired token; returns how many were removed.
    pub async fn purge_expired(&self) -> ThemeResult<usize> {
        let now = Utc::now();
        let removed = self
            .store
            .delete_tokens(&move |token: &PreviewToken| token.is_expired_at(now))
            .await?;
        if removed > 0 {
            info!("Purged {} expired preview token(s)", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{record, token};
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    async fn service() -> (Arc<MemoryStore>, PreviewTokenService) {
        let store = Arc::new(MemoryStore::new());
        store.upsert_plugin(record("alpha", false)).await.unwrap();
        store.upsert_plugin(record("beta", true)).await.unwrap();
        let service = PreviewTokenService::new(store.clone(), Duration::hours(1));
        (store, service)
    }

    #[tokio::test]
    async fn test_issue_and_validate() {
        let (_, service) = service().await;
        let issued = service.issue("alpha", "admin").await.unwrap();
        assert_eq!(issued.token.len(), 64);
        assert_eq!(issued.expires_at - issued.created_at, Duration::hours(1));

        let grant = service.validate(&issued.token, "alpha").await.unwrap();
        assert_eq!(grant.theme_name, "alpha");
        assert_eq!(grant.expires_at, issued.expires_at);
    }

    #[tokio::test]
    async fn test_issue_requires_installed_theme() {
        let (store, service) = service().await;
        let err = service.issue("missing", "admin").await.unwrap_err();
        assert!(matches!(err, ThemeError::PluginNotInstalled(name) if name == "missing"));

        let mut gone = record("gone", true);
        gone.installed = false;
        store.upsert_plugin(gone).await.unwrap();
        let err = service.issue("gone", "admin").await.unwrap_err();
        assert!(matches!(err, ThemeError::PluginNotInstalled(_)));
    }

    #[tokio::test]
    async fn test_token_is_scoped_to_its_theme() {
        let (_, service) = service().await;
        let issued = service.issue("alpha", "admin").await.unwrap();

        let err = service.validate(&issued.token, "beta").await.unwrap_err();
        match err {
            ThemeError::TokenThemeMismatch {
                issued_for,
                requested,
            } => {
                assert_eq!(issued_for, "alpha");
                assert_eq!(requested, "beta");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let (_, service) = service().await;
        let err = service.validate("nope", "alpha").await.unwrap_err();
        assert!(matches!(err, ThemeError::TokenNotFound));
    }

    #[tokio::test]
    async fn test_expiry_is_checked_before_theme() {
        let (store, service) = service().await;
        store
            .insert_token(token("stale", "alpha", Duration::seconds(-5)))
            .await
            .unwrap();

        let err = service.validate("stale", "beta").await.unwrap_err();
        assert!(matches!(err, ThemeError::TokenExpired { .. }));
    }

    #[tokio::test]
    async fn test_expired_token_keeps_reporting_expired() {
        let (store, service) = service().await;
        store
            .insert_token(token("stale", "alpha", Duration::seconds(-5)))
            .await
            .unwrap();

        for _ in 0..2 {
            let err = service.validate("stale", "alpha").await.unwrap_err();
            assert_eq!(err.reason(), "expired");
        }
        assert!(store.find_token("stale").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_issue_reclaims_expired_tokens() {
        let (store, service) = service().await;
        for i in 0..50 {
            store
                .insert_token(token(&format!("stale-{i}"), "alpha", Duration::hours(-2)))
                .await
                .unwrap();
        }
        store
            .insert_token(token("live", "alpha", Duration::minutes(30)))
            .await
            .unwrap();

        let issued = service.issue("beta", "admin").await.unwrap();

        for i in 0..50 {
            let value = format!("stale-{i}");
            assert!(store.find_token(&value).await.unwrap().is_none());
        }
        assert!(store.find_token("live").await.unwrap().is_some());
        assert!(store.find_token(&issued.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (store, service) = service().await;
        store
            .insert_token(token("stale-1", "alpha", Duration::minutes(-1)))
            .await
            .unwrap();
        store
            .insert_token(token("stale-2", "beta", Duration::hours(-2)))
            .await
            .unwrap();
        let live = service.issue("alpha", "admin").await.unwrap();

        assert_eq!(service.purge_expired().await.unwrap(), 2);
        assert_eq!(service.purge_expired().await.unwrap(), 0);
        assert!(service.validate(&live.token, "alpha").await.is_ok());
    }
}
