//! Traffic logging for LLM API calls
//!
//! Appends one line per request, completion and failure to traffic.log.
//! Content is truncated so conversation text does not end up in logs verbatim.

use config::PathManager;
use std::io::Write;

/// Maximum characters to log for content
const MAX_CONTENT_LOG_CHARS: usize = 200;

/// Truncate a string for logging, adding ellipsis if truncated
pub fn truncate_for_log(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}... ({} chars total)", truncated, char_count)
    }
}

fn summarize(value: &impl serde::Serialize) -> String {
    let json =
        serde_json::to_string(value).unwrap_or_else(|_| "<serialization error>".to_string());
    truncate_for_log(&json, MAX_CONTENT_LOG_CHARS)
}

pub fn log_stream_start(model: &str, request: &impl serde::Serialize) {
    log_traffic("STREAM_START", &format!("[{}] {}", model, summarize(request)));
}

pub fn log_stream_response(model: &str, response: &impl serde::Serialize) {
    log_traffic("STREAM_RESPONSE", &format!("[{}] {}", model, summarize(response)));
}

pub fn log_error(model: &str, error: &str) {
    log_traffic("ERROR", &format!("[{}] {}", model, error));
}

fn log_traffic(event_type: &str, message: &str) {
    let Some(log_path) = PathManager::traffic_log_path() else {
        return;
    };
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(
            file,
            "[{}] [TRAFFIC] [LLM] [{}] {}",
            timestamp, event_type, message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string_unchanged() {
        assert_eq!(truncate_for_log("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let s = "é".repeat(12);
        let out = truncate_for_log(&s, 10);
        assert!(out.starts_with(&"é".repeat(10)));
        assert!(out.ends_with("(12 chars total)"));
    }
}
