//! Heading/divider detection for YAML leading comments.

const SEPARATORS: [&str; 5] = ["===", "---", "***", "###", "~~~"];
const GLYPHS: [char; 8] = ['→', '•', '★', '▶', '◆', '■', '▲', '►'];
const MARKER_WORDS: [&str; 5] = ["TODO", "FIXME", "HACK", "NOTE", "WARNING"];

const EMOJI_RANGES: [(u32, u32); 6] = [
    (0x1F600, 0x1F64F),
    (0x1F300, 0x1F5FF),
    (0x1F680, 0x1F6FF),
    (0x2600, 0x26FF),
    (0x2700, 0x27BF),
    (0x1F900, 0x1F9FF),
];

/// Whether a leading comment reads as a heading or divider rather than prose.
///
/// `comment` is the comment text starting at its `#`.
pub fn is_structural(comment: &str) -> bool {
    let trimmed = comment.trim();
    let body = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
    if body.is_empty() {
        return false;
    }

    contains_emoji(body)
        || SEPARATORS.iter().any(|sep| body.contains(sep))
        || body.starts_with(|c: char| c.is_ascii_digit())
        || (body.chars().count() <= 15 && body.contains(GLYPHS))
        || is_shouted(body)
}

pub fn contains_emoji(text: &str) -> bool {
    text.chars().any(|c| {
        let code = c as u32;
        EMOJI_RANGES
            .iter()
            .any(|&(lo, hi)| (lo..=hi).contains(&code))
    })
}

fn is_shouted(body: &str) -> bool {
    let len = body.chars().count();
    let mut letters = body.chars().filter(|c| c.is_alphabetic()).peekable();

    (3..=20).contains(&len)
        && letters.peek().is_some()
        && letters.all(char::is_uppercase)
        && !MARKER_WORDS.iter().any(|word| body.contains(word))
}
