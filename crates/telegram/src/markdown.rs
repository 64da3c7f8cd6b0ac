/// Characters Telegram's MarkdownV2 treats as markup.
///
/// The backslash is included because MarkdownV2 uses it as the escape marker.
pub const MARKDOWN_V2_RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape text so Telegram renders it literally under `ParseMode::MarkdownV2`.
///
/// Apply once to fully assembled text; re-escaping already escaped output
/// doubles the markers.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for ch in text.chars() {
        if MARKDOWN_V2_RESERVED.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
