/// Errors surfaced to the caller of a [`RepTracker`](crate::tracker::RepTracker).
///
/// Missing or noisy landmarks are not errors; they produce
/// [`FrameOutcome::NoSignal`](crate::tracker::FrameOutcome::NoSignal).
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The pose source failed to initialize or start capturing.
    #[error("tracking unavailable, retry: {0}")]
    Unavailable(String),

    /// `start()` while a session is already running. The tracker treats a
    /// repeated start as a no-op, so it never returns this itself; it is
    /// available to hosts that want to reject the second start.
    #[error("tracking already active")]
    AlreadyTracking,
}

impl TrackerError {
    pub(crate) fn unavailable(err: anyhow::Error) -> Self {
        Self::Unavailable(format!("{:#}", err))
    }
}
