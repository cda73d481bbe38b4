const NAME_COMPONENT_MAX: usize = 30;

/// Lowercases and replaces every character outside `[a-z0-9]` with `-`,
/// keeping at most 30 characters.
pub fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '-' })
        .take(NAME_COMPONENT_MAX)
        .collect()
}

/// Lowercased extension of `filename`, if it has one.
pub fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_company_names() {
        assert_eq!(sanitize_name("Thuisbezorgd.nl"), "thuisbezorgd-nl");
        assert_eq!(sanitize_name("Café & Co"), "caf----co");
        assert_eq!(sanitize_name(&"X".repeat(50)).len(), 30);
    }

    #[test]
    fn extracts_extensions() {
        assert_eq!(file_extension("CV.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension("logo.final.webp").as_deref(), Some("webp"));
        assert_eq!(file_extension("resume"), None);
        assert_eq!(file_extension(".hidden"), None);
    }
}
