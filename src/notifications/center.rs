use async_trait::async_trait;

use crate::error::SchedulingError;

use super::NotificationRequest;

/// Platform notification service.
///
/// Adding a request whose identifier is already pending replaces it.
/// Removing an identifier that is not pending is not an error.
#[async_trait]
pub trait NotificationCenter: Send + Sync {
    /// Ask the user for permission to show alerts. Returns whether it was granted.
    async fn request_authorization(&self) -> Result<bool, SchedulingError>;

    async fn add(&self, request: NotificationRequest) -> Result<(), SchedulingError>;

    async fn remove_pending(&self, identifiers: &[String]) -> Result<(), SchedulingError>;

    async fn remove_all_pending(&self) -> Result<(), SchedulingError>;

    async fn set_badge_count(&self, count: u32) -> Result<(), SchedulingError>;

    async fn pending_requests(&self) -> Result<Vec<NotificationRequest>, SchedulingError>;
}
