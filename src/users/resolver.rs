use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::repository::{CreateUser, UserRepository};
use super::types::User;
use crate::events::{EventRegistry, TeamEvent};
use crate::store::{Store, StoreTransaction};
use crate::validators::ValidationError;
use crate::TeamError;

/// Maps an identity-provider subject to a local user.
///
/// Callers resolve the acting user once per request and pass its `id` into
/// every team, membership and comment operation.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_user(
        &self,
        external_id: &str,
        display_name_hint: Option<&str>,
        email_hint: Option<&str>,
    ) -> Result<User, TeamError>;
}

/// [`IdentityResolver`] that provisions users in the backing store on first sight.
pub struct StoreIdentityResolver<S: Store> {
    store: S,
    events: Arc<EventRegistry>,
}

impl<S: Store> StoreIdentityResolver<S> {
    pub fn new(store: S, events: Arc<EventRegistry>) -> Self {
        Self { store, events }
    }

    async fn refresh_profile(
        &self,
        user: User,
        display_name_hint: Option<&str>,
        email_hint: Option<&str>,
    ) -> Result<User, TeamError> {
        let username = display_name_hint.unwrap_or(user.username.as_str());
        let email = email_hint.or(user.email.as_deref());
        if username == user.username && email == user.email.as_deref() {
            return Ok(user);
        }

        let mut tx = self.store.begin().await?;
        let updated = tx.update_user_profile(user.id, username, email).await?;
        tx.commit().await?;

        log::debug!(target: "doc_teams", "msg=\"user profile refreshed\", user_id={}", user.id);
        Ok(updated)
    }
}

#[async_trait]
impl<S: Store> IdentityResolver for StoreIdentityResolver<S> {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "resolve_user", skip_all, err)
    )]
    async fn resolve_user(
        &self,
        external_id: &str,
        display_name_hint: Option<&str>,
        email_hint: Option<&str>,
    ) -> Result<User, TeamError> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(ValidationError::ExternalIdEmpty.into());
        }
        let display_name_hint = non_blank(display_name_hint);
        let email_hint = non_blank(email_hint);

        let existing = {
            let mut tx = self.store.begin().await?;
            tx.find_user_by_external_id(external_id).await?
        };
        if let Some(user) = existing {
            return self.refresh_profile(user, display_name_hint, email_hint).await;
        }

        let username = display_name_hint.or(email_hint).unwrap_or(external_id);

        let mut tx = self.store.begin().await?;
        let created = tx
            .create_user(CreateUser {
                external_id: external_id.to_owned(),
                username: username.to_owned(),
                email: email_hint.map(str::to_owned),
            })
            .await;

        let user = match created {
            Ok(user) => {
                tx.commit().await?;
                user
            }
            Err(TeamError::InvalidState(_)) => {
                // lost the race to a concurrent first sight
                drop(tx);
                let mut tx = self.store.begin().await?;
                return tx
                    .find_user_by_external_id(external_id)
                    .await?
                    .ok_or_else(|| {
                        TeamError::DatabaseError(format!(
                            "user {external_id} vanished after a unique violation"
                        ))
                    });
            }
            Err(e) => return Err(e),
        };

        log::info!(
            target: "doc_teams",
            "msg=\"user provisioned\", user_id={}, external_id=\"{external_id}\"",
            user.id
        );

        self.events
            .dispatch(TeamEvent::UserProvisioned {
                user_id: user.id,
                external_id: user.external_id.clone(),
                at: Utc::now(),
            })
            .await;

        Ok(user)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
