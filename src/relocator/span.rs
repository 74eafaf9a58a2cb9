//! Message span collection and content compilation.
//!
//! A span is the referenced message plus every later message by the same
//! author sent strictly before the trigger, in ascending creation order.

use super::message::{ChatMessage, file_count, mention};

/// Forum thread titles are capped at this many characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Discord rejects message content longer than this.
pub const MAX_MESSAGE_CHARS: usize = 2000;

const DEFAULT_TITLE: &str = "Support Request";

/// Build the span from the referenced message and the channel history read after it.
///
/// `history` may arrive in any order; it is scanned oldest first and the scan
/// stops at the trigger.
pub fn collect_span(
    referenced: ChatMessage,
    trigger: &ChatMessage,
    mut history: Vec<ChatMessage>,
) -> Vec<ChatMessage> {
    history.sort_by_key(|m| (m.created_at, m.id));

    let author_id = referenced.author.id;
    let mut span = vec![referenced];
    for msg in history {
        if msg.id == trigger.id {
            break;
        }
        if msg.author.id == author_id
            && msg.created_at < trigger.created_at
            && !span.iter().any(|m| m.id == msg.id)
        {
            span.push(msg);
        }
    }

    span.sort_by_key(|m| (m.created_at, m.id));
    span
}

/// Join the non-blank message bodies with a blank line between them.
pub fn compile_content(span: &[ChatMessage]) -> String {
    span.iter()
        .map(|m| m.content.as_str())
        .filter(|c| !c.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Thread title from the first span message.
pub fn generate_title(span: &[ChatMessage]) -> String {
    let Some(first) = span.first() else {
        return DEFAULT_TITLE.to_string();
    };
    let candidate = if first.content.trim().is_empty() {
        format!("Support request from {}", first.author.name)
    } else {
        first.content.clone()
    };
    let title = truncate_chars(&candidate, MAX_TITLE_CHARS).trim().to_string();
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}

/// Text of the thread's root post.
pub fn initial_post(author_id: u64, project_name: &str, content: &str, files: usize) -> String {
    let mut post = format!("{} need some assistance with {}!", mention(author_id), project_name);
    if !content.is_empty() {
        post.push_str("\n\n__**Original Message:**__\n");
        post.push_str(content);
    }
    let note = if files > 0 {
        format!("\n\nAttached **{files}** {}", if files == 1 { "file" } else { "files" })
    } else {
        String::new()
    };

    // Keep the attachment note visible when the body has to be cut
    let budget = MAX_MESSAGE_CHARS - note.chars().count();
    if post.chars().count() > budget {
        let mut cut = truncate_chars(&post, budget - 1).to_string();
        cut.push('…');
        post = cut;
    }
    post.push_str(&note);
    post
}

/// Notification left in the origin channel.
pub fn moved_notice(author_id: u64, jump_url: &str) -> String {
    format!(
        "Hey {} to prevent your question from getting lost we moved it to {}, please continue the conversation in that post.",
        mention(author_id),
        jump_url
    )
}

/// Value for the log embed's attachment field.
pub fn attachments_field(files: usize) -> String {
    file_count(files)
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relocator::message::Author;
    use chrono::{DateTime, Duration, Utc};

    fn base_time() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn msg(id: u64, author: u64, secs: i64, content: &str) -> ChatMessage {
        ChatMessage {
            id,
            channel_id: 1,
            author: Author {
                id: author,
                name: format!("user{author}"),
            },
            content: content.to_string(),
            created_at: base_time() + Duration::seconds(secs),
            attachments: Vec::new(),
        }
    }

    fn ids(span: &[ChatMessage]) -> Vec<u64> {
        span.iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_span_collects_same_author_before_trigger() {
        let referenced = msg(1, 7, 0, "help: X");
        let trigger = msg(5, 9, 40, "<@bot>");
        let history = vec![
            msg(2, 8, 10, "someone else"),
            msg(3, 7, 20, "also Y"),
            msg(4, 7, 30, "and Z"),
            trigger.clone(),
        ];

        let span = collect_span(referenced, &trigger, history);
        assert_eq!(ids(&span), vec![1, 3, 4]);
    }

    #[test]
    fn test_span_ignores_history_order() {
        let referenced = msg(1, 7, 0, "first");
        let trigger = msg(5, 9, 40, "<@bot>");
        let history = vec![trigger.clone(), msg(4, 7, 30, "third"), msg(3, 7, 20, "second")];

        let span = collect_span(referenced, &trigger, history);
        assert_eq!(ids(&span), vec![1, 3, 4]);
    }

    #[test]
    fn test_span_stops_at_trigger() {
        let referenced = msg(1, 7, 0, "first");
        let trigger = msg(5, 9, 40, "<@bot>");
        let history = vec![msg(3, 7, 20, "second"), trigger.clone(), msg(6, 7, 50, "after")];

        let span = collect_span(referenced, &trigger, history);
        assert_eq!(ids(&span), vec![1, 3]);
    }

    #[test]
    fn test_span_excludes_trigger_from_same_author() {
        // Author replying to their own message still never moves the trigger
        let referenced = msg(1, 7, 0, "first");
        let trigger = msg(5, 7, 40, "<@bot>");
        let span = collect_span(referenced, &trigger, vec![trigger.clone()]);
        assert_eq!(ids(&span), vec![1]);
    }

    #[test]
    fn test_span_excludes_messages_at_trigger_time() {
        let referenced = msg(1, 7, 0, "first");
        let trigger = msg(5, 9, 40, "<@bot>");
        let history = vec![msg(4, 7, 40, "same instant")];
        let span = collect_span(referenced, &trigger, history);
        assert_eq!(ids(&span), vec![1]);
    }

    #[test]
    fn test_span_with_empty_history() {
        let referenced = msg(1, 7, 0, "only");
        let trigger = msg(5, 9, 40, "<@bot>");
        let span = collect_span(referenced, &trigger, Vec::new());
        assert_eq!(ids(&span), vec![1]);
    }

    #[test]
    fn test_compile_skips_blank_bodies() {
        let span = vec![
            msg(1, 7, 0, "help: X"),
            msg(2, 7, 1, "   "),
            msg(3, 7, 2, ""),
            msg(4, 7, 3, "also Y"),
        ];
        let content = compile_content(&span);
        assert_eq!(content, "help: X\n\nalso Y");
        assert_eq!(compile_content(&span), content);
    }

    #[test]
    fn test_compile_all_blank() {
        let span = vec![msg(1, 7, 0, ""), msg(2, 7, 1, "\n")];
        assert_eq!(compile_content(&span), "");
    }

    #[test]
    fn test_title_from_first_message() {
        let span = vec![msg(1, 7, 0, "help: X"), msg(2, 7, 1, "also Y")];
        assert_eq!(generate_title(&span), "help: X");
    }

    #[test]
    fn test_title_truncated_to_100_chars() {
        let long = "é".repeat(250);
        let span = vec![msg(1, 7, 0, &long)];
        let title = generate_title(&span);
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_title_is_stripped() {
        let span = vec![msg(1, 7, 0, "   padded   ")];
        assert_eq!(generate_title(&span), "padded");
    }

    #[test]
    fn test_title_fallback_for_empty_content() {
        let span = vec![msg(1, 7, 0, ""), msg(2, 7, 1, "later text")];
        assert_eq!(generate_title(&span), "Support request from user7");
    }

    #[test]
    fn test_title_fallback_for_whitespace_content() {
        let span = vec![msg(1, 7, 0, " \n\t ")];
        assert_eq!(generate_title(&span), "Support request from user7");
    }

    #[test]
    fn test_title_default_when_nothing_left() {
        let mut first = msg(1, 7, 0, "");
        first.author.name = String::new();
        // "Support request from " trims to a non-empty string, so only an empty span hits the default
        assert_eq!(generate_title(&[first]), "Support request from");
        assert_eq!(generate_title(&[]), "Support Request");
    }

    #[test]
    fn test_initial_post_layout() {
        let post = initial_post(7, "Coolify", "help: X\n\nalso Y", 0);
        assert_eq!(
            post,
            "<@7> need some assistance with Coolify!\n\n__**Original Message:**__\nhelp: X\n\nalso Y"
        );
    }

    #[test]
    fn test_initial_post_without_body_with_files() {
        assert_eq!(
            initial_post(7, "Coolify", "", 1),
            "<@7> need some assistance with Coolify!\n\nAttached **1** file"
        );
        assert!(initial_post(7, "Coolify", "", 2).ends_with("Attached **2** files"));
    }

    #[test]
    fn test_initial_post_capped_keeps_file_note() {
        let body = "x".repeat(5000);
        let post = initial_post(7, "Coolify", &body, 3);
        assert!(post.chars().count() <= MAX_MESSAGE_CHARS);
        assert!(post.ends_with("Attached **3** files"));
    }

    #[test]
    fn test_moved_notice() {
        let text = moved_notice(7, "https://discord.com/channels/1/2/2");
        assert!(text.starts_with("Hey <@7> to prevent"));
        assert!(text.contains("https://discord.com/channels/1/2/2"));
    }
}
