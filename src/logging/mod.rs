use crate::config::LogFormat;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "chatrelay=info,tower_http=info";

pub fn init(format: LogFormat) {
    let filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Defaults first, then the user's directives, so `RUST_LOG` can raise or
/// lower any target while unrelated defaults stay in place.
fn build_filter(user: Option<&str>) -> EnvFilter {
    match user.map(str::trim).filter(|s| !s.is_empty()) {
        Some(user) => EnvFilter::try_new(format!("{DEFAULT_FILTER},{user}")).unwrap_or_else(|e| {
            eprintln!("ignoring invalid {}: {}", EnvFilter::DEFAULT_ENV, e);
            EnvFilter::new(DEFAULT_FILTER)
        }),
        None => EnvFilter::new(DEFAULT_FILTER),
    }
}
