//! CLI logging initialization
//!
//! Staged log control on top of `tracing-subscriber`: one global level,
//! with per-subsystem targets so a single stage can be turned up without
//! drowning in the rest.

use std::io;

use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer,
};

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Colored, multi-line (development)
    Pretty,
    /// Compact single-line
    Compact,
    /// JSON (tool integration)
    Json,
}

/// Initialize the logging system with the given level and format
pub fn init(level: LevelFilter, format: LogFormat) {
    let targets = Targets::new()
        .with_default(level)
        .with_target("klaso::registry", level)
        .with_target("klaso::dispatch", level)
        .with_target("klaso::instance", level)
        .with_target("klaso::api", level)
        .with_target("klaso::cli", level);

    let stdout_layer = create_format_layer(format, io::stderr).with_filter(targets);
    tracing_subscriber::registry().with(stdout_layer).init();
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(
    format: LogFormat,
    make_writer: F,
) -> impl Layer<tracing_subscriber::Registry>
where
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}
