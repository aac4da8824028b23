//! Tracing subscriber setup
//!
//! Logs go to stderr so stdout stays clean for piped output.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Verbosity requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// Pick the filter directive. Flags win over `QMS_LOG`/config, which win over the default.
pub fn filter_directive(verbosity: Verbosity, configured: Option<&str>) -> String {
    match verbosity {
        Verbosity::Verbose => "debug".to_string(),
        Verbosity::Quiet => "error".to_string(),
        Verbosity::Normal => configured
            .map(str::trim)
            .filter(|level| !level.is_empty())
            .unwrap_or("warn")
            .to_string(),
    }
}

/// Install the global subscriber. Calling twice is a no-op.
pub fn init(verbosity: Verbosity, configured: Option<&str>) {
    let directive = filter_directive(verbosity, configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let layer = fmt::layer()
        .with_target(verbosity == Verbosity::Verbose)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    let _ = tracing_subscriber::registry().with(layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_configured_level() {
        assert_eq!(filter_directive(Verbosity::Verbose, Some("error")), "debug");
        assert_eq!(filter_directive(Verbosity::Quiet, Some("trace")), "error");
    }

    #[test]
    fn test_configured_level_and_default() {
        assert_eq!(filter_directive(Verbosity::Normal, Some("qms=info")), "qms=info");
        assert_eq!(filter_directive(Verbosity::Normal, Some(" ")), "warn");
        assert_eq!(filter_directive(Verbosity::Normal, None), "warn");
    }
}
