use std::fs;
use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "blog_service=info,tower_http=info";
const LOG_FILE_PREFIX: &str = "blog_service.log";

/// Console output always; JSON lines in a daily rolling file when `log_dir` is set.
fn build_subscriber(
    filter: EnvFilter,
    log_dir: Option<&Path>,
) -> (impl Subscriber + Send + Sync + 'static, Option<WorkerGuard>) {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let _ = fs::create_dir_all(dir);
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().json().with_writer(non_blocking_writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // Create a formatted layer for console logging
    let console_layer = fmt::layer().with_writer(std::io::stdout);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer);
    (subscriber, guard)
}

/// Initializes console logging and, when `log_dir` is given, a JSON file layer
/// with daily rotation. Keep the returned guard alive for the life of the
/// process so buffered file logs are flushed on exit.
pub fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let (subscriber, guard) = build_subscriber(filter, log_dir);
    subscriber.init();
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_layer_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let (subscriber, guard) = build_subscriber(EnvFilter::new("info"), Some(dir.path()));
        assert!(guard.is_some());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(account = 7, "created account");
        });
        drop(guard);

        let written: String = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
            .collect();
        let line = written.lines().next().unwrap();
        let json: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(json["fields"]["message"], "created account");
    }

    #[test]
    fn console_only_without_a_directory() {
        let (_subscriber, guard) = build_subscriber(EnvFilter::new("info"), None);
        assert!(guard.is_none());
    }
}
