//! Collaborator traits the runtime drives.
//!
//! The core never talks to the network itself. A transport crate implements
//! these traits for a concrete platform; tests use in-memory versions.

use std::sync::Arc;

use async_trait::async_trait;

use crate::answer::{MessageReceipt, OutgoingMessage};
use crate::error::ApiResult;
use crate::message::{SelfIdentity, Timestamp, UserInfo};

/// Outgoing chat operations.
///
/// Calls may block on network I/O; the runtime awaits each one before
/// processing the next event. Timeouts are the driver's responsibility.
#[async_trait]
pub trait ChatDriver: Send + Sync {
    /// Posts a new message to `channel`.
    async fn send_message(
        &self,
        channel: &str,
        message: &OutgoingMessage,
    ) -> ApiResult<MessageReceipt>;

    /// Replaces the content of the message at `timestamp` in `channel`.
    async fn update_message(
        &self,
        channel: &str,
        timestamp: &Timestamp,
        message: &OutgoingMessage,
    ) -> ApiResult<MessageReceipt>;

    /// Deletes the message at `timestamp` in `channel`.
    async fn delete_message(&self, channel: &str, timestamp: &Timestamp) -> ApiResult<()>;
}

/// Resolves user identifiers to user information.
#[async_trait]
pub trait UserInfoFinder: Send + Sync {
    /// Looks up the user with the given identifier.
    async fn user_info(&self, user_id: &str) -> ApiResult<UserInfo>;
}

/// Provides the runtime's own identity once connected.
#[async_trait]
pub trait SelfInfoFinder: Send + Sync {
    /// Returns the identity the session is connected as.
    async fn self_info(&self) -> ApiResult<SelfIdentity>;
}

/// Shared chat driver handle.
pub type BoxedChatDriver = Arc<dyn ChatDriver>;

/// Shared user info finder handle.
pub type BoxedUserInfoFinder = Arc<dyn UserInfoFinder>;

/// Shared self info finder handle.
pub type BoxedSelfInfoFinder = Arc<dyn SelfInfoFinder>;
