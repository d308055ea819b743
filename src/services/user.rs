//! User service
//!
//! Resolves authenticated identities from session tokens. Account creation
//! and login flows live with the external identity provider; validating the
//! session it issued is the only auth concern this system keeps.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::User;

/// User service
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            user_repo,
            session_repo,
        }
    }

    /// Resolve a session token to its user.
    ///
    /// Returns `None` for unknown or expired tokens; expired sessions are
    /// cleaned up on the way out.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Look up a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo
            .get_by_username(username)
            .await
            .context("Failed to find user by username")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::Session;
    use chrono::{Duration, Utc};

    async fn setup() -> (UserService, Arc<dyn UserRepository>, Arc<dyn SessionRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool);
        let service = UserService::new(user_repo.clone(), session_repo.clone());
        (service, user_repo, session_repo)
    }

    #[tokio::test]
    async fn test_validate_session_success() {
        let (service, user_repo, session_repo) = setup().await;

        let user = user_repo.create("anna", "anna@example.com").await.unwrap();
        session_repo
            .create(&Session {
                id: "token-1".to_string(),
                user_id: user.id,
                expires_at: Utc::now() + Duration::days(1),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let found = service
            .validate_session("token-1")
            .await
            .expect("Validation failed")
            .expect("Session should resolve");
        assert_eq!(found.username, "anna");
    }

    #[tokio::test]
    async fn test_validate_unknown_token_returns_none() {
        let (service, _, _) = setup().await;

        let found = service.validate_session("no-such-token").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_validate_expired_session_returns_none_and_cleans_up() {
        let (service, user_repo, session_repo) = setup().await;

        let user = user_repo.create("anna", "anna@example.com").await.unwrap();
        session_repo
            .create(&Session {
                id: "stale".to_string(),
                user_id: user.id,
                expires_at: Utc::now() - Duration::hours(1),
                created_at: Utc::now() - Duration::days(2),
            })
            .await
            .unwrap();

        let found = service.validate_session("stale").await.unwrap();
        assert!(found.is_none());

        // Expired session was removed
        let gone = session_repo.get_by_id("stale").await.unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_find_by_username() {
        let (service, user_repo, _) = setup().await;

        user_repo.create("boris", "boris@example.com").await.unwrap();

        let found = service.find_by_username("boris").await.unwrap();
        assert!(found.is_some());

        let missing = service.find_by_username("nobody").await.unwrap();
        assert!(missing.is_none());
    }
}
