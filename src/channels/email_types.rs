//! Helpers that turn a raw RFC 822 message into a [`FetchedMessage`].

use chrono::{DateTime, FixedOffset, Utc};
use mail_parser::MessageParser;

use super::mailbox::FetchedMessage;

/// Parse a raw message. Returns `None` when the bytes are not a message.
pub fn parse_message(uid: u32, raw: &[u8]) -> Option<FetchedMessage> {
    let parsed = MessageParser::default().parse(raw)?;
    Some(FetchedMessage {
        uid,
        subject: parsed.subject().unwrap_or_default().to_string(),
        sender: extract_sender(&parsed),
        date: message_date(&parsed).unwrap_or_else(|| Utc::now().fixed_offset()),
        body_text: extract_text(&parsed),
    })
}

/// Sender address of a parsed email, falling back to the display name.
pub fn extract_sender(parsed: &mail_parser::Message) -> String {
    let Some(first) = parsed.from().and_then(|addr| addr.first()) else {
        return "unknown".into();
    };
    first
        .address()
        .or_else(|| first.name())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".into())
}

/// Plain-text body, or tag-stripped HTML when there is no text part.
pub fn extract_text(parsed: &mail_parser::Message) -> String {
    if let Some(text) = parsed.body_text(0) {
        return text.to_string();
    }
    if let Some(html) = parsed.body_html(0) {
        return strip_html(html.as_ref());
    }
    String::new()
}

/// Header date with the sender's UTC offset preserved.
pub fn message_date(parsed: &mail_parser::Message) -> Option<DateTime<FixedOffset>> {
    let d = parsed.date()?;
    let sign = if d.tz_before_gmt { -1 } else { 1 };
    let offset_secs = sign * (i32::from(d.tz_hour) * 3600 + i32::from(d.tz_minute) * 60);
    let offset = FixedOffset::east_opt(offset_secs)?;
    DateTime::from_timestamp(d.to_timestamp(), 0).map(|utc| utc.with_timezone(&offset))
}

/// Strip HTML tags from content (basic).
///
/// Block-level tags become whitespace so adjacent paragraphs and table
/// cells don't run together.
pub fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut tag = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                if is_block_tag(&tag) {
                    result.push(' ');
                }
            }
            _ if in_tag => tag.push(ch),
            _ => result.push(ch),
        }
    }
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_block_tag(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    matches!(
        name.as_str(),
        "p" | "br" | "div" | "li" | "tr" | "td" | "th" | "table" | "h1" | "h2" | "h3"
    )
}
