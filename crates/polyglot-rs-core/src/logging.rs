//! Logging integration for the polyglot-rs engine.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-site spans.

use crate::settings::Settings;
use crate::SiteId;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The log level is read from `settings.log_level` (e.g. "debug", "info", "warn",
/// "error"). In debug mode a pretty, human-readable format is used; in production
/// a structured JSON format is used. Calling this more than once is harmless:
/// the first installed subscriber wins.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for work done on behalf of one site.
///
/// # Examples
///
/// ```
/// use polyglot_rs_core::logging::site_span;
///
/// let span = site_span(2);
/// let _guard = span.enter();
/// tracing::info!("assigning default language");
/// ```
pub fn site_span(site_id: SiteId) -> tracing::Span {
    tracing::info_span!("site", id = site_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_twice_is_harmless() {
        let mut settings = Settings::default();
        settings.log_level = "not a valid filter ===".to_string();
        setup_logging(&settings);
        settings.debug = false;
        setup_logging(&settings);
    }

    #[test]
    fn test_site_span_enter() {
        let span = site_span(7);
        let _guard = span.enter();
        tracing::debug!("inside site span");
    }
}
