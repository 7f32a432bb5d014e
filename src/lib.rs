pub mod clock;
pub mod config;
pub mod error;
pub mod pose;
pub mod protocol;
pub mod render;
pub mod tracker;

pub use error::TrackerError;

/// Build version embedded by build.rs
pub const GIT_VERSION: &str = env!("GIT_VERSION");

/// Install the fmt subscriber for binaries. Unknown levels fall back to INFO.
pub fn init_tracing(level: &str) {
    let level = level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
