//! Platform-neutral message types the relocator works on.

use chrono::{DateTime, Utc};

/// Discord epoch (2015-01-01T00:00:00Z) in unix milliseconds.
const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

/// Creation time encoded in a snowflake id.
pub fn snowflake_time(id: u64) -> DateTime<Utc> {
    let ms = (id >> 22) as i64 + DISCORD_EPOCH_MS;
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

/// Render a user mention.
pub fn mention(user_id: u64) -> String {
    format!("<@{user_id}>")
}

/// `"1 file"` / `"3 files"`.
pub fn file_count(n: usize) -> String {
    format!("{n} {}", if n == 1 { "file" } else { "files" })
}

/// Author of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: u64,
    pub name: String,
}

/// A file attached to a message, not yet downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
    pub size: u64,
}

/// Attachment bytes ready to be uploaded with a new post.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub data: Vec<u8>,
}

/// A message as read back from channel history.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub channel_id: u64,
    pub author: Author,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub attachments: Vec<Attachment>,
}

/// An inbound message event, reduced to what trigger validation needs.
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    pub message: ChatMessage,
    /// Id of the message this one replies to.
    pub reference_id: Option<u64>,
    pub mentioned_user_ids: Vec<u64>,
    /// Role ids of the author in the guild (empty outside guilds).
    pub author_role_ids: Vec<u64>,
}

impl TriggerEvent {
    pub fn mentions(&self, user_id: u64) -> bool {
        self.mentioned_user_ids.contains(&user_id)
    }

    pub fn author_has_role(&self, role_id: u64) -> bool {
        self.author_role_ids.contains(&role_id)
    }
}

/// Kind of a resolved channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Forum,
    Thread,
    Other,
}

/// Root message of a freshly created forum thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarterMessage {
    pub jump_url: String,
}

/// Result of creating a forum thread.
#[derive(Debug, Clone)]
pub struct CreatedThread {
    pub thread_id: u64,
    pub starter: Option<StarterMessage>,
}

/// Embed content independent of the platform builder types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    /// (name, value); all fields render non-inline.
    pub fields: Vec<(String, String)>,
}

impl Embed {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    #[cfg(test)]
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
