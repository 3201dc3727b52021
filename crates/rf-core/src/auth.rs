//! # Authorization Gate
//!
//! Ownership/moderation/ban checks over the [`IdentityResolver`] port.
//! Resolver failures surface as Unauthorized/Forbidden; there is no
//! default-allow path.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::traits::{IdentityResolver, RelationKind};

pub struct AuthGate {
    resolver: Arc<dyn IdentityResolver>,
}

impl AuthGate {
    pub fn new(resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { resolver }
    }

    /// Resolves an external identity token to a user id.
    pub async fn authenticate(&self, token: &str) -> Result<Uuid> {
        self.resolver
            .resolve_user_id(token)
            .await
            .map_err(|err| AppError::Unauthorized(format!("identity resolution failed: {err}")))
    }

    /// Whether the user holds moderator status for the topic. A resolver
    /// failure is Forbidden, not "no".
    pub async fn moderator_status(&self, user_id: Uuid, topic_id: Uuid) -> Result<bool> {
        self.resolver
            .has_relationship(user_id, topic_id, RelationKind::Moderator)
            .await
            .map_err(|err| AppError::Forbidden(format!("moderator status unavailable: {err}")))
    }

    /// Rejects banned users before any mutating operation on the topic.
    pub async fn ensure_not_banned(&self, user_id: Uuid, topic_id: Uuid) -> Result<()> {
        let banned = self
            .resolver
            .has_relationship(user_id, topic_id, RelationKind::Banned)
            .await
            .map_err(|err| AppError::Forbidden(format!("ban status unavailable: {err}")))?;
        if banned {
            return Err(AppError::Forbidden(format!(
                "user {user_id} is banned from topic {topic_id}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockIdentityResolver;
    use mockall::predicate::*;

    #[tokio::test]
    async fn authenticate_maps_resolver_failure_to_unauthorized() {
        let mut resolver = MockIdentityResolver::new();
        resolver
            .expect_resolve_user_id()
            .withf(|token| token == "bad-token")
            .returning(|_| Err(AppError::Internal("identity service down".into())));

        let gate = AuthGate::new(Arc::new(resolver));
        let err = gate.authenticate("bad-token").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn moderator_check_never_defaults_to_allow() {
        let user = Uuid::now_v7();
        let topic = Uuid::now_v7();

        let mut resolver = MockIdentityResolver::new();
        resolver
            .expect_has_relationship()
            .returning(|_, _, _| Err(AppError::Internal("timeout".into())));

        let gate = AuthGate::new(Arc::new(resolver));
        let err = gate.moderator_status(user, topic).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn banned_user_is_rejected() {
        let user = Uuid::now_v7();
        let topic = Uuid::now_v7();

        let mut resolver = MockIdentityResolver::new();
        resolver
            .expect_has_relationship()
            .with(eq(user), eq(topic), eq(RelationKind::Banned))
            .returning(|_, _, _| Ok(true));

        let gate = AuthGate::new(Arc::new(resolver));
        let err = gate.ensure_not_banned(user, topic).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn clean_user_passes_ban_check() {
        let mut resolver = MockIdentityResolver::new();
        resolver
            .expect_has_relationship()
            .returning(|_, _, _| Ok(false));

        let gate = AuthGate::new(Arc::new(resolver));
        assert!(gate
            .ensure_not_banned(Uuid::now_v7(), Uuid::now_v7())
            .await
            .is_ok());
    }
}
