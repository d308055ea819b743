//! Response service
//!
//! The moderation workflow for responses:
//! - Creation freezes the recipient to the advertisement's author
//! - Only the recipient may accept or reject, and only from `new`;
//!   a transition attempted from a terminal state is a conflict and
//!   leaves the stored status untouched
//! - A response is visible only to its sender or recipient; everyone else
//!   sees not-found, so existence is never leaked

use std::sync::Arc;

use anyhow::Context;

use crate::db::repositories::{AdvertisementRepository, ResponseRepository};
use crate::models::{CreateResponseInput, Response, ResponseStatus, ResponseWithMeta};

/// Error types for response service operations
#[derive(Debug, thiserror::Error)]
pub enum ResponseServiceError {
    /// Response or advertisement not found (or not visible to the caller)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Acting identity is not the recipient
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Transition attempted from a terminal state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Response service
pub struct ResponseService {
    repo: Arc<dyn ResponseRepository>,
    ad_repo: Arc<dyn AdvertisementRepository>,
}

impl ResponseService {
    pub fn new(
        repo: Arc<dyn ResponseRepository>,
        ad_repo: Arc<dyn AdvertisementRepository>,
    ) -> Self {
        Self { repo, ad_repo }
    }

    /// Submit a response to the advertisement with the given slug.
    ///
    /// The recipient is the advertisement's author at this moment and is
    /// never re-resolved, even if authorship later changes.
    pub async fn create(
        &self,
        advertisement_slug: &str,
        sender_id: i64,
        text: &str,
    ) -> Result<Response, ResponseServiceError> {
        if text.trim().is_empty() {
            return Err(ResponseServiceError::ValidationError(
                "Response text cannot be empty".to_string(),
            ));
        }

        let advertisement = self
            .ad_repo
            .get_by_slug(advertisement_slug)
            .await
            .context("Failed to get advertisement")?
            .ok_or_else(|| ResponseServiceError::NotFound(advertisement_slug.to_string()))?;

        self.repo
            .create(&CreateResponseInput {
                advertisement_id: advertisement.id,
                sender_id,
                recipient_id: advertisement.author_id,
                text: text.trim().to_string(),
            })
            .await
            .context("Failed to create response")
            .map_err(Into::into)
    }

    /// Fetch a response for display. Participants only; anyone else gets
    /// not-found.
    pub async fn get(
        &self,
        id: i64,
        viewer_id: i64,
    ) -> Result<ResponseWithMeta, ResponseServiceError> {
        let meta = self
            .repo
            .get_with_meta(id)
            .await
            .context("Failed to get response")?
            .ok_or_else(|| ResponseServiceError::NotFound(id.to_string()))?;

        if !meta.response.is_participant(viewer_id) {
            return Err(ResponseServiceError::NotFound(id.to_string()));
        }

        Ok(meta)
    }

    /// Accept a response. Recipient only, from `new` only.
    pub async fn accept(
        &self,
        id: i64,
        acting_user_id: i64,
    ) -> Result<Response, ResponseServiceError> {
        self.transition(id, acting_user_id, ResponseStatus::Accepted)
            .await
    }

    /// Reject a response. Recipient only, from `new` only.
    pub async fn reject(
        &self,
        id: i64,
        acting_user_id: i64,
    ) -> Result<Response, ResponseServiceError> {
        self.transition(id, acting_user_id, ResponseStatus::Rejected)
            .await
    }

    /// Responses received by a user, newest first
    pub async fn received(&self, user_id: i64) -> Result<Vec<ResponseWithMeta>, ResponseServiceError> {
        self.repo
            .list_by_recipient(user_id)
            .await
            .context("Failed to list received responses")
            .map_err(Into::into)
    }

    /// Responses sent by a user, newest first
    pub async fn sent(&self, user_id: i64) -> Result<Vec<ResponseWithMeta>, ResponseServiceError> {
        self.repo
            .list_by_sender(user_id)
            .await
            .context("Failed to list sent responses")
            .map_err(Into::into)
    }

    /// The guarded state machine: `new -> accepted | rejected`, recipient only.
    async fn transition(
        &self,
        id: i64,
        acting_user_id: i64,
        target: ResponseStatus,
    ) -> Result<Response, ResponseServiceError> {
        let response = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get response")?
            .ok_or_else(|| ResponseServiceError::NotFound(id.to_string()))?;

        if response.recipient_id != acting_user_id {
            return Err(ResponseServiceError::Forbidden(
                "Only the recipient can moderate this response".to_string(),
            ));
        }

        if response.status.is_terminal() {
            return Err(ResponseServiceError::Conflict(format!(
                "Response is already {}",
                response.status
            )));
        }

        self.repo
            .set_status(id, target)
            .await
            .context("Failed to set response status")?;

        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get response")?
            .ok_or_else(|| ResponseServiceError::NotFound(id.to_string()))
    }
}
