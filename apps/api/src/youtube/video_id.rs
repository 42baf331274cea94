use std::sync::OnceLock;

use regex::Regex;

/// Ordered; the first pattern that matches wins.
const VIDEO_ID_PATTERNS: [&str; 2] = [
    r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)",
    r"^([a-zA-Z0-9_-]{11})$",
];

fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        VIDEO_ID_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("video id pattern must compile"))
            .collect()
    })
}

/// Extracts a platform video ID from a pasted URL or bare ID.
///
/// Accepts `watch?v=`, `youtu.be/` and `embed/` URLs, or an exact
/// 11-character token. IDs taken from URLs are not length-checked.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    patterns()
        .iter()
        .find_map(|re| re.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
