use regex::Regex;
use std::sync::OnceLock;

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Replaces every tag with a space and collapses runs of whitespace.
pub fn strip_html(html: &str) -> String {
    let text = tag_re().replace_all(html, " ");
    whitespace_re().replace_all(&text, " ").trim().to_string()
}

/// Text up to and including the first `.` when it sits within `max_len`
/// characters, otherwise a hard cut to `max_len - 1` characters plus `...`.
pub fn first_sentence(text: &str, max_len: usize) -> String {
    if let Some(dot) = text.chars().position(|c| c == '.') {
        if dot < max_len {
            return text.chars().take(dot + 1).collect();
        }
    }
    if text.chars().count() > max_len {
        let cut: String = text.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
