use anyhow::Result;
use std::env::var;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Start the telemetry layer. `LOG_LEVEL` takes precedence over the `-v`
/// verbosity flags; `RUST_LOG` directives still apply when `LOG_LEVEL` is
/// unset.
///
/// # Errors
///
/// Will return an error if the subscriber is already installed
pub fn init(verbosity_level: Option<Level>) -> Result<()> {
    let verbosity_level = verbosity_level.unwrap_or(Level::ERROR);

    let fmt_layer = fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .pretty();

    let filter = match var("LOG_LEVEL") {
        Ok(level) if !level.trim().is_empty() => EnvFilter::builder().parse_lossy(level.trim()),
        _ => EnvFilter::builder()
            .with_default_directive(verbosity_level.into())
            .from_env_lossy(),
    };

    let subscriber = Registry::default().with(fmt_layer).with(filter);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
