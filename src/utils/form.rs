use regex::Regex;
use std::sync::OnceLock;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

/// Permissive `local@domain.tld` shape check.
pub fn is_email(value: &str) -> bool {
    email_re().is_match(value)
}

/// Form checkboxes arrive as strings; only a case-insensitive `"true"` counts.
pub fn to_bool(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
