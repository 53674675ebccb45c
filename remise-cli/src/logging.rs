use std::io::stderr;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

pub fn parse_log_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" => Some(LevelFilter::WARN),
        "error" => Some(LevelFilter::ERROR),
        "off" => Some(LevelFilter::OFF),
        _ => None,
    }
}

/// Flag beats config; `verbose` raises the result to at least info.
pub fn resolve_level(flag: Option<&str>, config: &str, verbose: bool) -> LevelFilter {
    let requested = flag.unwrap_or(config);
    let level = parse_log_level(requested).unwrap_or_else(|| {
        eprintln!("Invalid log level '{}', defaulting to 'warn'", requested);
        LevelFilter::WARN
    });
    if verbose { level.max(LevelFilter::INFO) } else { level }
}

pub fn setup_logging(level: LevelFilter) {
    // stdout carries the report (or JSON), logs go to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry().with(terminal_log).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_beats_config() {
        assert_eq!(resolve_level(Some("debug"), "error", false), LevelFilter::DEBUG);
        assert_eq!(resolve_level(None, "error", false), LevelFilter::ERROR);
    }

    #[test]
    fn test_verbose_raises_to_info() {
        assert_eq!(resolve_level(None, "warn", true), LevelFilter::INFO);
        assert_eq!(resolve_level(Some("trace"), "warn", true), LevelFilter::TRACE);
    }

    #[test]
    fn test_invalid_level_defaults_to_warn() {
        assert_eq!(parse_log_level("loud"), None);
        assert_eq!(resolve_level(Some("loud"), "info", false), LevelFilter::WARN);
        assert_eq!(parse_log_level(" INFO "), Some(LevelFilter::INFO));
    }
}
