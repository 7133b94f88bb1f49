use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_FILE_NAME: &str = "app.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber: one timestamped line per event appended to
/// `<log_dir>/app.log`. Falls back to stderr when the directory is unusable.
pub fn init(log_dir: &Path) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let (file_layer, stderr_layer) = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let _ = LOG_GUARD.set(guard);
            let layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking);
            (Some(layer), None)
        }
        Err(err) => {
            eprintln!(
                "log write failed: cannot create {} ({}), logging to stderr",
                log_dir.display(),
                err
            );
            let layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr);
            (None, Some(layer))
        }
    };

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();
}

/// Shorten text for a log line, marking the cut with an ellipsis.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_for_log("hello", 400), "hello");
        assert_eq!(truncate_for_log("", 400), "");
    }

    #[test]
    fn long_text_is_cut_with_ellipsis() {
        let text = "x".repeat(450);
        let out = truncate_for_log(&text, 400);
        assert_eq!(out.len(), 403);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn cut_respects_char_boundaries() {
        let text = "é".repeat(10);
        assert_eq!(truncate_for_log(&text, 3), "ééé...");
    }

    #[test]
    fn init_creates_the_log_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log_dir = dir.path().join("logs");
        init(&log_dir);
        assert!(log_dir.is_dir());
    }
}
