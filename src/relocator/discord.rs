//! Discord client using serenity.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serenity::all::{
    Channel, ChannelId, ChannelType, CreateAttachment, CreateEmbed, CreateForumPost,
    CreateMessage, GetMessages, Message as SerenityMessage, MessageId,
};
use serenity::http::Http;
use tracing::{debug, info};

use super::api::{ApiError, ChatApi};
use super::message::{
    Attachment, Author, ChannelKind, ChatMessage, CreatedThread, Embed, FileUpload,
    StarterMessage, TriggerEvent, snowflake_time,
};

/// Discord caps history pages at 100 messages.
const HISTORY_PAGE: u8 = 100;

fn api_error(err: serenity::Error) -> ApiError {
    if let serenity::Error::Http(http) = &err {
        match http.status_code().map(|s| s.as_u16()) {
            Some(404) => return ApiError::NotFound,
            Some(403) => return ApiError::Forbidden,
            _ => {}
        }
    }
    ApiError::Http(err.to_string())
}

/// Convert a serenity message into the relocator's message type.
pub fn to_chat_message(msg: &SerenityMessage) -> ChatMessage {
    ChatMessage {
        id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        author: Author {
            id: msg.author.id.get(),
            name: msg.author.name.clone(),
        },
        content: msg.content.clone(),
        created_at: snowflake_time(msg.id.get()),
        attachments: msg
            .attachments
            .iter()
            .map(|a| Attachment {
                filename: a.filename.clone(),
                url: a.url.clone(),
                size: u64::from(a.size),
            })
            .collect(),
    }
}

/// Convert a gateway message event into a trigger candidate.
pub fn to_trigger_event(msg: &SerenityMessage) -> TriggerEvent {
    TriggerEvent {
        message: to_chat_message(msg),
        reference_id: msg
            .message_reference
            .as_ref()
            .and_then(|r| r.message_id)
            .map(|id| id.get()),
        mentioned_user_ids: msg.mentions.iter().map(|u| u.id.get()).collect(),
        author_role_ids: msg
            .member
            .as_ref()
            .map(|m| m.roles.iter().map(|r| r.get()).collect())
            .unwrap_or_default(),
    }
}

fn to_create_embed(embed: &Embed) -> CreateEmbed {
    let mut out = CreateEmbed::new();
    if let Some(title) = &embed.title {
        out = out.title(title);
    }
    if let Some(description) = &embed.description {
        out = out.description(description);
    }
    for (name, value) in &embed.fields {
        out = out.field(name, value, false);
    }
    out
}

/// Discord REST client.
pub struct DiscordClient {
    http: Arc<Http>,
    downloads: reqwest::Client,
}

impl DiscordClient {
    pub fn new(http: Arc<Http>) -> Self {
        let downloads = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self { http, downloads }
    }
}

#[async_trait]
impl ChatApi for DiscordClient {
    async fn fetch_message(&self, channel_id: u64, message_id: u64) -> Result<ChatMessage, ApiError> {
        let msg = self
            .http
            .get_message(ChannelId::new(channel_id), MessageId::new(message_id))
            .await
            .map_err(api_error)?;
        Ok(to_chat_message(&msg))
    }

    async fn history_between(
        &self,
        channel_id: u64,
        after_id: u64,
        until_id: u64,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        let channel = ChannelId::new(channel_id);
        let mut cursor = after_id;
        let mut collected = Vec::new();

        loop {
            let batch = channel
                .messages(
                    &self.http,
                    GetMessages::new().after(MessageId::new(cursor)).limit(HISTORY_PAGE),
                )
                .await
                .map_err(api_error)?;
            let Some(newest) = batch.iter().map(|m| m.id.get()).max() else {
                break;
            };

            collected.extend(
                batch
                    .iter()
                    .filter(|m| m.id.get() <= until_id)
                    .map(to_chat_message),
            );

            if newest >= until_id || batch.len() < usize::from(HISTORY_PAGE) {
                break;
            }
            cursor = newest;
        }

        debug!("Read {} messages of history in channel {}", collected.len(), channel_id);
        Ok(collected)
    }

    async fn channel_kind(&self, channel_id: u64) -> Result<Option<ChannelKind>, ApiError> {
        let channel = match self.http.get_channel(ChannelId::new(channel_id)).await {
            Ok(channel) => channel,
            Err(e) => {
                return match api_error(e) {
                    ApiError::NotFound => Ok(None),
                    other => Err(other),
                };
            }
        };
        let kind = match channel {
            Channel::Guild(gc) => match gc.kind {
                ChannelType::Forum => ChannelKind::Forum,
                ChannelType::Text | ChannelType::News => ChannelKind::Text,
                ChannelType::PublicThread | ChannelType::PrivateThread | ChannelType::NewsThread => {
                    ChannelKind::Thread
                }
                _ => ChannelKind::Other,
            },
            _ => ChannelKind::Other,
        };
        Ok(Some(kind))
    }

    async fn create_forum_thread(
        &self,
        forum_id: u64,
        title: &str,
        content: &str,
        files: Vec<FileUpload>,
    ) -> Result<CreatedThread, ApiError> {
        let attachments = files
            .into_iter()
            .map(|f| CreateAttachment::bytes(f.data, f.filename))
            .collect::<Vec<_>>();
        let message = CreateMessage::new().content(content).add_files(attachments);

        let thread = ChannelId::new(forum_id)
            .create_forum_post(&self.http, CreateForumPost::new(title, message))
            .await
            .map_err(api_error)?;

        // A forum post's starter message shares the thread's id
        let thread_id = thread.id.get();
        let jump_url = format!(
            "https://discord.com/channels/{}/{}/{}",
            thread.guild_id.get(),
            thread_id,
            thread_id
        );
        Ok(CreatedThread {
            thread_id,
            starter: Some(StarterMessage { jump_url }),
        })
    }

    async fn send_message(&self, channel_id: u64, content: &str) -> Result<u64, ApiError> {
        ChannelId::new(channel_id)
            .say(&self.http, content)
            .await
            .map(|m| m.id.get())
            .map_err(api_error)
    }

    async fn send_embed(&self, channel_id: u64, embed: &Embed) -> Result<u64, ApiError> {
        ChannelId::new(channel_id)
            .send_message(&self.http, CreateMessage::new().embed(to_create_embed(embed)))
            .await
            .map(|m| m.id.get())
            .map_err(api_error)
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), ApiError> {
        info!("🗑️ Deleting message {} in channel {}", message_id, channel_id);
        ChannelId::new(channel_id)
            .delete_message(&self.http, MessageId::new(message_id))
            .await
            .map_err(api_error)
    }

    async fn fetch_attachment(&self, attachment: &Attachment) -> Result<FileUpload, ApiError> {
        let response = self
            .downloads
            .get(&attachment.url)
            .send()
            .await
            .map_err(|e| ApiError::Http(format!("Failed to download: {e}")))?;

        match response.status().as_u16() {
            404 => return Err(ApiError::NotFound),
            403 => return Err(ApiError::Forbidden),
            _ => {}
        }
        let response = response
            .error_for_status()
            .map_err(|e| ApiError::Http(e.to_string()))?;
        let data = response
            .bytes()
            .await
            .map_err(|e| ApiError::Http(format!("Failed to read body: {e}")))?;

        debug!("📥 Downloaded {} ({} bytes)", attachment.filename, data.len());
        Ok(FileUpload {
            filename: attachment.filename.clone(),
            data: data.to_vec(),
        })
    }
}
