use html2text::from_read;

use once_cell::sync::Lazy;
use regex::Regex;

static IMG_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img\s+[^>]*alt=["']([^"']*)["'][^>]*>"#).unwrap());

/// Escape a string for interpolation into markup text or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Plain-text rendition of built markup, used by the harness to preview
/// fetched content. <img> tags become [Image: alt] placeholders.
pub fn text_preview(markup: &str) -> String {
    let with_placeholders = IMG_TAG.replace_all(markup, "[Image: $1]");
    from_read(with_placeholders.as_bytes(), 80).unwrap_or_default()
}
