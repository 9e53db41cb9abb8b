//! Text shaping for Telegram HTML messages

use std::iter::Peekable;
use std::str::Chars;

/// Telegram rejects messages over 4096 characters; stay under with headroom
pub const TELEGRAM_CHUNK_CHARS: usize = 4000;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape, then turn `**bold**`, `` `code` `` and fenced blocks into HTML tags
pub fn markdown_to_html(text: &str) -> String {
    let escaped = escape_html(text);
    let mut out = String::with_capacity(escaped.len() + 16);
    let mut chars = escaped.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '`' if next_is(&mut chars, '`') => {
                chars.next();
                if next_is(&mut chars, '`') {
                    chars.next();
                    wrap_until(&mut chars, &mut out, "pre", "```");
                } else {
                    out.push_str("``");
                }
            }
            '`' => wrap_until(&mut chars, &mut out, "code", "`"),
            '*' if next_is(&mut chars, '*') => {
                chars.next();
                wrap_until(&mut chars, &mut out, "b", "**");
            }
            _ => out.push(ch),
        }
    }

    out
}

fn next_is(chars: &mut Peekable<Chars>, expected: char) -> bool {
    chars.peek() == Some(&expected)
}

/// Consume up to `closer` (or end of input) and emit it inside `<tag>`
fn wrap_until(chars: &mut Peekable<Chars>, out: &mut String, tag: &str, closer: &str) {
    let mut content = String::new();

    while let Some(ch) = chars.next() {
        content.push(ch);
        if content.ends_with(closer) {
            content.truncate(content.len() - closer.len());
            break;
        }
    }

    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&content);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Split into pieces of at most `max` characters, preferring line breaks
pub fn chunk_message(text: &str, max: usize) -> Vec<String> {
    if max == 0 {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max {
        let hard_end = rest
            .char_indices()
            .nth(max)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());

        let cut = match rest[..hard_end].rfind('\n') {
            Some(idx) if idx > 0 => idx + 1,
            _ => hard_end,
        };

        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }

    chunks
}
