//! Chat platform seam.
//!
//! The relocator only talks to the platform through [`ChatApi`], so the
//! workflow can run against the Discord REST client or a recording mock.

use std::fmt;

use async_trait::async_trait;

use super::message::{Attachment, ChannelKind, ChatMessage, CreatedThread, Embed, FileUpload};

/// Failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The target (message, channel, file) no longer exists.
    NotFound,
    /// The bot lacks permission for the call.
    Forbidden,
    /// Any other transport or API failure.
    Http(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::Http(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn fetch_message(&self, channel_id: u64, message_id: u64) -> Result<ChatMessage, ApiError>;

    /// Every message posted in `channel_id` after `after_id` up to and
    /// including `until_id`. Order is unspecified.
    async fn history_between(
        &self,
        channel_id: u64,
        after_id: u64,
        until_id: u64,
    ) -> Result<Vec<ChatMessage>, ApiError>;

    /// Resolve a channel; `Ok(None)` when it does not exist or is not visible.
    async fn channel_kind(&self, channel_id: u64) -> Result<Option<ChannelKind>, ApiError>;

    async fn create_forum_thread(
        &self,
        forum_id: u64,
        title: &str,
        content: &str,
        files: Vec<FileUpload>,
    ) -> Result<CreatedThread, ApiError>;

    async fn send_message(&self, channel_id: u64, content: &str) -> Result<u64, ApiError>;

    async fn send_embed(&self, channel_id: u64, embed: &Embed) -> Result<u64, ApiError>;

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), ApiError>;

    async fn fetch_attachment(&self, attachment: &Attachment) -> Result<FileUpload, ApiError>;
}
