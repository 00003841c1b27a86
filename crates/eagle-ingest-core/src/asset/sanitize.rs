/// Punctuation kept as-is in stored filenames, besides alphanumerics.
const ALLOWED_PUNCTUATION: &[char] = &[' ', '-', '_', '(', ')', '【', '】', '《', '》', '「', '」'];

/// Extensions stored verbatim; anything else is recorded as `jpg`.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];
pub const FALLBACK_EXTENSION: &str = "jpg";

/// Replace every character that is not alphanumeric or allow-listed
/// punctuation with `_`, keep at most `max_len` characters, then trim.
pub fn sanitize_filename(name: &str, max_len: usize) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || ALLOWED_PUNCTUATION.contains(&c) {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();
    replaced.trim().to_string()
}

/// Lower-cased extension of `file_name` if it is on the allow-list.
pub fn stored_extension(file_name: &str) -> &'static str {
    let ext = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return FALLBACK_EXTENSION,
    };
    ALLOWED_EXTENSIONS
        .iter()
        .find(|allowed| **allowed == ext)
        .copied()
        .unwrap_or(FALLBACK_EXTENSION)
}
