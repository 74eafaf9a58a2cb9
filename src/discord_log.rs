use std::sync::Arc;
use std::time::Duration;

use serenity::all::ChannelId;
use serenity::http::Http;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Discord rejects longer message content.
const MAX_LOG_CHARS: usize = 1990;

/// Log message with priority.
enum LogMessage {
    /// High priority (WARN/ERROR) - send immediately
    Urgent(String),
    /// Low priority (INFO) - batch and send periodically
    Info(String),
}

/// Mirrors operator console output into a Discord channel.
pub struct DiscordLogLayer {
    tx: mpsc::UnboundedSender<LogMessage>,
}

impl DiscordLogLayer {
    pub fn new(http: Arc<Http>, channel_id: u64) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<LogMessage>();
        let channel = ChannelId::new(channel_id);

        tokio::spawn(async move {
            let mut info_buffer: Vec<String> = Vec::new();
            let mut interval = tokio::time::interval(Duration::from_secs(5));

            loop {
                tokio::select! {
                    msg = rx.recv() => {
                        match msg {
                            Some(LogMessage::Urgent(text)) => {
                                send_log(&http, channel, &text).await;
                            }
                            Some(LogMessage::Info(text)) => {
                                info_buffer.push(text);
                                if info_buffer.len() >= 50 {
                                    flush_buffer(&http, channel, &mut info_buffer).await;
                                }
                            }
                            None => break,
                        }
                    }
                    _ = interval.tick() => {
                        if !info_buffer.is_empty() {
                            flush_buffer(&http, channel, &mut info_buffer).await;
                        }
                    }
                }
            }
        });

        Self { tx }
    }
}

fn clip(text: &str) -> String {
    if text.chars().count() > MAX_LOG_CHARS {
        let truncated: String = text.chars().take(MAX_LOG_CHARS).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

async fn send_log(http: &Http, channel: ChannelId, text: &str) {
    // Going through tracing here would feed back into this layer
    if let Err(e) = channel.say(http, clip(text)).await {
        eprintln!("Failed to send log to Discord: {e}");
    }
}

async fn flush_buffer(http: &Http, channel: ChannelId, buffer: &mut Vec<String>) {
    if buffer.is_empty() {
        return;
    }
    let combined = buffer.join("\n");
    buffer.clear();
    send_log(http, channel, &combined).await;
}

struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else if self.message.is_empty() {
            self.message = format!("{} = {:?}", field.name(), value);
        } else {
            self.message
                .push_str(&format!(", {} = {:?}", field.name(), value));
        }
    }
}

impl<S: Subscriber> Layer<S> for DiscordLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();

        if level > Level::INFO {
            return;
        }
        // serenity's own gateway chatter would drown the channel
        if event.metadata().target().starts_with("serenity") {
            return;
        }

        let mut visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut visitor);

        let msg = match level {
            Level::ERROR => LogMessage::Urgent(format!("❌ {}", visitor.message)),
            Level::WARN => LogMessage::Urgent(format!("⚠️ {}", visitor.message)),
            _ => LogMessage::Info(visitor.message),
        };

        if self.tx.send(msg).is_err() {
            eprintln!("Log channel closed, message dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_short_text_untouched() {
        assert_eq!(clip("hello"), "hello");
    }

    #[test]
    fn test_clip_long_text() {
        let long = "ä".repeat(3000);
        let clipped = clip(&long);
        assert_eq!(clipped.chars().count(), MAX_LOG_CHARS + 3);
        assert!(clipped.ends_with("..."));
    }
}
