use chrono::DateTime;

pub fn init_log() {
    let _lg = flexi_logger::Logger::try_with_env_or_str("info")
        .unwrap()
        .log_to_stdout()
        .start()
        .unwrap();
}

/// Maps an arbitrary title to a name safe as a single path segment.
/// Pure; callers substitute a fallback when the result is empty.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<&str>>().join(" ");
    collapsed.chars().take(200).collect()
}

// RFC 2822 is what feeds put in pubDate; anything else gets no prefix
pub fn date_prefix(pub_date: &str) -> Option<String> {
    DateTime::parse_from_rfc2822(pub_date.trim())
        .ok()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
}
