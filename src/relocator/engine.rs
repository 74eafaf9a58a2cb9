//! Support request relocation workflow.
//!
//! One call to [`SupportRelocator::handle_message`] per inbound message. No
//! state survives between calls, so events can be handled concurrently.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::api::{ApiError, ChatApi};
use super::error::{RelocationError, Step};
use super::message::{ChannelKind, ChatMessage, Embed, FileUpload, TriggerEvent, mention};
use super::span::{
    attachments_field, collect_span, compile_content, generate_title, initial_post, moved_notice,
};

/// Identifiers and texts the relocator is configured with.
#[derive(Debug, Clone)]
pub struct RelocatorConfig {
    /// Channel watched for the ping-reply gesture.
    pub origin_channel_id: u64,
    /// Forum channel that receives relocated requests.
    pub support_forum_id: u64,
    /// Role allowed to trigger a relocation.
    pub authorized_role_id: u64,
    /// Channel (or thread) for relocation logs and error reports.
    pub log_channel_id: u64,
    pub project_name: String,
    pub docs_url: String,
    /// Attachments above this size are skipped without downloading.
    pub max_attachment_bytes: u64,
}

/// What handling one inbound message amounted to.
#[derive(Debug)]
pub enum Outcome {
    /// Not a relocation request.
    Ignored,
    /// Author lacks the authorized role; the trigger was deleted.
    Rejected,
    /// The reply pointed at one of the bot's own messages; the trigger was deleted.
    SelfReference,
    Relocated(Relocation),
    /// Reported to the console and the log channel.
    Failed(RelocationError),
}

/// Summary of a completed relocation.
#[derive(Debug, Clone)]
pub struct Relocation {
    pub thread_id: u64,
    pub jump_url: Option<String>,
    pub title: String,
    pub moved_message_ids: Vec<u64>,
    pub characters: usize,
    pub attachments: usize,
    pub skipped_attachments: usize,
}

pub struct SupportRelocator {
    config: RelocatorConfig,
    api: Arc<dyn ChatApi>,
    bot_user_id: u64,
}

impl SupportRelocator {
    pub fn new(config: RelocatorConfig, api: Arc<dyn ChatApi>, bot_user_id: u64) -> Self {
        Self {
            config,
            api,
            bot_user_id,
        }
    }

    fn is_trigger(&self, event: &TriggerEvent) -> bool {
        event.message.channel_id == self.config.origin_channel_id
            && event.reference_id.is_some()
            && event.mentions(self.bot_user_id)
    }

    pub async fn handle_message(&self, event: TriggerEvent) -> Outcome {
        if event.message.author.id == self.bot_user_id || !self.is_trigger(&event) {
            return Outcome::Ignored;
        }

        let trigger = &event.message;
        if !event.author_has_role(self.config.authorized_role_id) {
            debug!("Discarding relocation ping from unauthorized {}", trigger.author.name);
            self.delete_quietly(trigger.channel_id, trigger.id).await;
            return Outcome::Rejected;
        }

        info!("📦 Relocation requested by {} ({})", trigger.author.name, trigger.author.id);
        let outcome = match self.relocate(&event).await {
            Ok(Some(relocation)) => Outcome::Relocated(relocation),
            Ok(None) => Outcome::SelfReference,
            Err(e) => {
                self.report_error(&e).await;
                Outcome::Failed(e)
            }
        };

        // The ping itself never moves
        self.delete_quietly(trigger.channel_id, trigger.id).await;
        outcome
    }

    /// Run the workflow for an authorized trigger. `Ok(None)` when the reply
    /// points at the bot itself.
    pub async fn relocate(&self, event: &TriggerEvent) -> Result<Option<Relocation>, RelocationError> {
        let trigger = &event.message;
        let reference_id = event.reference_id.ok_or(RelocationError::ReferenceMissing)?;

        let referenced = self
            .api
            .fetch_message(trigger.channel_id, reference_id)
            .await
            .map_err(RelocationError::api(Step::FetchReference))?;
        if referenced.author.id == self.bot_user_id {
            debug!("Reply targets the bot's own message {}, ignoring", referenced.id);
            return Ok(None);
        }

        let history = self
            .api
            .history_between(trigger.channel_id, referenced.id, trigger.id)
            .await
            .map_err(RelocationError::api(Step::ScanHistory))?;
        let span = collect_span(referenced, trigger, history);
        let content = compile_content(&span);
        let owner = span[0].author.clone();

        self.ensure_forum().await?;

        let title = generate_title(&span);
        let (files, skipped_attachments) = self.collect_files(&span).await;
        let attachments = files.len();

        let post = initial_post(owner.id, &self.config.project_name, &content, attachments);
        let thread = self
            .api
            .create_forum_thread(self.config.support_forum_id, &title, &post, files)
            .await
            .map_err(RelocationError::api(Step::CreateThread))?;
        info!("🧵 Created support thread {} \"{}\" for {}", thread.thread_id, title, owner.name);

        let mut relocation = Relocation {
            thread_id: thread.thread_id,
            jump_url: None,
            title,
            moved_message_ids: Vec::new(),
            characters: content.chars().count(),
            attachments,
            skipped_attachments,
        };

        let Some(starter) = thread.starter else {
            warn!("Thread {} has no retrievable starter message, skipping follow-ups", thread.thread_id);
            return Ok(Some(relocation));
        };

        self.api
            .send_embed(thread.thread_id, &self.guidance_embed())
            .await
            .map_err(RelocationError::api(Step::PostGuidance))?;

        self.notify_origin(owner.id, &starter.jump_url).await?;

        let log = Embed::titled("Message moved to Support channel successfully.")
            .field("Message Owner", mention(owner.id))
            .field("Moved by", mention(trigger.author.id))
            .field("Total Characters", relocation.characters.to_string())
            .field("Total Attachments", attachments_field(attachments))
            .field("Support Post", starter.jump_url.clone());
        if self.resolve(self.config.log_channel_id, Step::Log).await?.is_some() {
            self.api
                .send_embed(self.config.log_channel_id, &log)
                .await
                .map_err(RelocationError::api(Step::Log))?;
        }

        for msg in &span {
            self.delete_quietly(msg.channel_id, msg.id).await;
        }

        relocation.jump_url = Some(starter.jump_url);
        relocation.moved_message_ids = span.iter().map(|m| m.id).collect();
        Ok(Some(relocation))
    }

    async fn ensure_forum(&self) -> Result<(), RelocationError> {
        let channel_id = self.config.support_forum_id;
        match self.resolve(channel_id, Step::ResolveForum).await? {
            Some(ChannelKind::Forum) => Ok(()),
            Some(_) => Err(RelocationError::NotAForum { channel_id }),
            None => Err(RelocationError::ForumUnavailable { channel_id }),
        }
    }

    async fn resolve(&self, channel_id: u64, step: Step) -> Result<Option<ChannelKind>, RelocationError> {
        match self.api.channel_kind(channel_id).await {
            Ok(kind) => Ok(kind),
            Err(ApiError::NotFound) | Err(ApiError::Forbidden) => Ok(None),
            Err(e) => Err(RelocationError::Api { step, source: e }),
        }
    }

    /// Download every attachment in the span. Failures are skipped.
    async fn collect_files(&self, span: &[ChatMessage]) -> (Vec<FileUpload>, usize) {
        let mut files = Vec::new();
        let mut skipped = 0;
        for attachment in span.iter().flat_map(|m| &m.attachments) {
            if attachment.size > self.config.max_attachment_bytes {
                warn!(
                    "Skipping attachment {} ({} bytes over the {} byte limit)",
                    attachment.filename, attachment.size, self.config.max_attachment_bytes
                );
                skipped += 1;
                continue;
            }
            match self.api.fetch_attachment(attachment).await {
                Ok(file) => files.push(file),
                Err(e) => {
                    warn!("Failed to download attachment: {} ({e})", attachment.filename);
                    skipped += 1;
                }
            }
        }
        (files, skipped)
    }

    async fn notify_origin(&self, owner_id: u64, jump_url: &str) -> Result<(), RelocationError> {
        let channel_id = self.config.origin_channel_id;
        if self.resolve(channel_id, Step::Notify).await?.is_none() {
            warn!("Origin channel with ID {channel_id} not found, skipping notification");
            return Ok(());
        }
        self.api
            .send_message(channel_id, &moved_notice(owner_id, jump_url))
            .await
            .map_err(RelocationError::api(Step::Notify))?;
        Ok(())
    }

    fn guidance_embed(&self) -> Embed {
        Embed::titled("Note").description(format!(
            "Please remember that everyone in this server helps others voluntarily.\n\n \
             Do not ping anyone (including Admins, Mods, Community Experts, or Developers) for attention, \
             and avoid posting your question or request in any other channel.\n\n\
             Failure to follow these guidelines may result in temporary exclusion from the server.\n\n\
             While you wait, you can refer to our documentation for potential solutions to your issue view our [documentation]({})",
            self.config.docs_url
        ))
    }

    /// Console plus a best-effort embed in the log channel.
    async fn report_error(&self, err: &RelocationError) {
        let text = format!("An error occurred while handling a support request: {err}");
        error!("{text}");

        let channel_id = self.config.log_channel_id;
        if !matches!(self.api.channel_kind(channel_id).await, Ok(Some(_))) {
            return;
        }
        if let Err(e) = self.api.send_embed(channel_id, &Embed::default().description(text)).await {
            warn!("Failed to report error to log channel {channel_id}: {e}");
        }
    }

    /// Delete a message, treating "already gone" and "forbidden" as done.
    async fn delete_quietly(&self, channel_id: u64, message_id: u64) {
        match self.api.delete_message(channel_id, message_id).await {
            Ok(()) => {}
            Err(ApiError::NotFound) | Err(ApiError::Forbidden) => {
                debug!("Message {message_id} already gone or not deletable");
            }
            Err(e) => warn!("Failed to delete message {message_id}: {e}"),
        }
    }
}
