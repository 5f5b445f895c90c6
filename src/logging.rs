//! Rotating log system
//!
//! Console output plus rolling files under the configured log directory.
//! Level, rotation period and retention come from the process environment.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Environment;

/// Rotation period by name; `None` for anything unrecognized
pub fn rotation_for(name: &str) -> Option<Rotation> {
    match name.trim().to_ascii_lowercase().as_str() {
        "minutely" => Some(Rotation::MINUTELY),
        "hourly" => Some(Rotation::HOURLY),
        "daily" => Some(Rotation::DAILY),
        "never" => Some(Rotation::NEVER),
        _ => None,
    }
}

/// Initialize the logging system with rotating file logs
pub fn init_logging(env: &Environment) -> anyhow::Result<()> {
    std::fs::create_dir_all(&env.log_dir)?;

    let rotation = rotation_for(&env.log_rotation);
    let mut builder = RollingFileAppender::builder()
        .rotation(rotation.clone().unwrap_or(Rotation::DAILY))
        .filename_prefix("constellation")
        .filename_suffix("log");
    if let Some(keep) = env.log_keep {
        builder = builder.max_log_files(keep);
    }
    let (non_blocking, guard) = tracing_appender::non_blocking(builder.build(&env.log_dir)?);

    // The writer must outlive the event loop, which never hands control back
    std::mem::forget(guard);

    // RUST_LOG wins over the configured directives
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&env.log_filter))?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    if rotation.is_none() {
        tracing::warn!("Unknown log rotation '{}', rotating daily", env.log_rotation);
    }
    tracing::info!(
        "Logging initialized. Log directory: {}, rotation: {}",
        env.log_dir,
        env.log_rotation
    );
    Ok(())
}

/// Log a frame-level event with the node it concerns
#[macro_export]
macro_rules! log_node_event {
    ($event:expr, $node:expr) => {
        tracing::debug!(event = %$event, node = %$node, "Node event");
    };
    ($event:expr, $node:expr, $($field:tt)*) => {
        tracing::debug!(event = %$event, node = %$node, $($field)*, "Node event");
    };
}
