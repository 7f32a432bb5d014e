use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::angle::joint_angle;
use super::counter::{RepCounter, Stage};
use super::one_euro::AngleFilter;
use super::telemetry::{SessionSummary, Telemetry};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, PoseConfig};
use crate::error::TrackerError;
use crate::pose::{LandmarkFrame, LandmarkIndex, PoseSource};

/// Authoritative session state of one tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerState {
    pub stage: Stage,
    pub rep_count: u32,
    pub is_tracking: bool,
    pub session_start: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Angles computed and the stage machine stepped
    Tracked,
    /// Shoulder, elbow or wrist missing; state unchanged
    NoSignal,
    /// Frame arrived while stopped and was ignored
    Idle,
}

/// Result of one `process_frame` step
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    pub outcome: FrameOutcome,
    pub elbow_angle: Option<f64>,
    pub body_angle: Option<f64>,
    pub stage: Stage,
    pub rep_count: u32,
    pub counted_this_frame: bool,
}

/// Immutable view published after every state change.
/// Stage and count always come from the same step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerSnapshot {
    pub stage: Stage,
    pub rep_count: u32,
    pub is_tracking: bool,
    pub elbow_angle: Option<f64>,
    pub body_angle: Option<f64>,
    pub frames_processed: u64,
}

/// Push-up repetition tracker over the left arm.
///
/// Frames come either pushed by the host through [`process_frame`] or
/// pulled from the injected [`PoseSource`] through [`poll`].
///
/// [`process_frame`]: RepTracker::process_frame
/// [`poll`]: RepTracker::poll
pub struct RepTracker<S, C = SystemClock> {
    source: S,
    clock: C,
    pose_config: PoseConfig,
    min_confidence: f32,
    counter: RepCounter,
    filter: Option<AngleFilter>,
    source_initialized: bool,
    is_tracking: bool,
    session_start: Option<Instant>,
    stopped_at: Option<Instant>,
    last_elbow: Option<f64>,
    last_body: Option<f64>,
    frames_processed: u64,
    snapshot_tx: watch::Sender<TrackerSnapshot>,
}

impl<S: PoseSource> RepTracker<S, SystemClock> {
    pub fn new(source: S, config: &Config) -> Self {
        Self::with_clock(source, config, SystemClock)
    }
}

impl<S: PoseSource, C: Clock> RepTracker<S, C> {
    pub fn with_clock(source: S, config: &Config, clock: C) -> Self {
        let (snapshot_tx, _) = watch::channel(TrackerSnapshot::default());
        Self {
            source,
            clock,
            pose_config: config.pose.clone(),
            min_confidence: config.counter.min_confidence,
            counter: RepCounter::from_config(&config.counter),
            filter: config.smooth.enabled.then(|| AngleFilter::from_config(&config.smooth)),
            source_initialized: false,
            is_tracking: false,
            session_start: None,
            stopped_at: None,
            last_elbow: None,
            last_body: None,
            frames_processed: 0,
            snapshot_tx,
        }
    }

    /// Begin consuming frames. A second call while tracking does nothing.
    pub fn start(&mut self) -> Result<(), TrackerError> {
        if self.is_tracking {
            debug!("start ignored: already tracking");
            return Ok(());
        }

        if !self.source_initialized {
            self.source.initialize(&self.pose_config).map_err(|e| {
                warn!(error = %e, "pose source failed to initialize");
                TrackerError::unavailable(e)
            })?;
            self.source_initialized = true;
        }
        self.source.start().map_err(|e| {
            warn!(error = %e, "pose source failed to start");
            TrackerError::unavailable(e)
        })?;

        self.session_start = Some(self.clock.now());
        self.stopped_at = None;
        self.is_tracking = true;
        self.publish();
        info!(rep_count = self.counter.count(), "tracking started");
        Ok(())
    }

    /// Replace the pose model options. Applied on the next `start()`;
    /// counters and stage are kept.
    pub fn configure(&mut self, pose: PoseConfig) -> Result<(), TrackerError> {
        if self.is_tracking {
            return Err(TrackerError::AlreadyTracking);
        }
        self.pose_config = pose;
        self.source_initialized = false;
        debug!("pose configuration replaced");
        Ok(())
    }

    /// Stop consuming frames. Counters are kept; the duration freezes.
    pub fn stop(&mut self) -> SessionSummary {
        if self.is_tracking {
            self.is_tracking = false;
            self.stopped_at = Some(self.clock.now());
            self.source.stop();
            self.publish();
            let summary = self.summary();
            info!(
                total_reps = summary.total_reps,
                duration_seconds = summary.duration_seconds,
                "tracking stopped"
            );
            summary
        } else {
            self.summary()
        }
    }

    /// Zero the count, forget the stage and angle history.
    /// While tracking the session clock restarts; otherwise it is cleared.
    pub fn reset(&mut self) {
        self.counter.reset();
        if let Some(filter) = &mut self.filter {
            filter.reset();
        }
        self.last_elbow = None;
        self.last_body = None;
        self.stopped_at = None;
        self.session_start = if self.is_tracking {
            Some(self.clock.now())
        } else {
            None
        };
        self.publish();
        debug!("tracker reset");
    }

    pub fn process_frame(&mut self, frame: &LandmarkFrame) -> FrameResult {
        if !self.is_tracking {
            return self.result(FrameOutcome::Idle, None, None, false);
        }
        self.frames_processed += 1;

        let threshold = self.min_confidence;
        let (shoulder, elbow, wrist) = match (
            frame.valid(LandmarkIndex::LeftShoulder, threshold),
            frame.valid(LandmarkIndex::LeftElbow, threshold),
            frame.valid(LandmarkIndex::LeftWrist, threshold),
        ) {
            (Some(s), Some(e), Some(w)) => (s, e, w),
            _ => return self.no_signal(),
        };

        // 上腕か前腕が潰れている場合は角度が定まらない
        let Some(raw) = joint_angle(shoulder, elbow, wrist) else {
            return self.no_signal();
        };
        let elbow_angle = match &mut self.filter {
            Some(filter) => filter.apply(raw, frame.timestamp_us),
            None => raw,
        };
        let body_angle = frame
            .valid(LandmarkIndex::LeftHip, threshold)
            .and_then(|hip| joint_angle(elbow, shoulder, hip));

        let counted = self.counter.update(elbow_angle);
        if counted {
            debug!(rep_count = self.counter.count(), elbow_angle, "rep counted");
        }

        self.last_elbow = Some(elbow_angle);
        self.last_body = body_angle;
        self.publish();
        self.result(FrameOutcome::Tracked, Some(elbow_angle), body_angle, counted)
    }

    /// Pull one frame from the source and process it.
    /// `None` when stopped or when the source has nothing ready.
    pub fn poll(&mut self) -> Option<FrameResult> {
        if !self.is_tracking {
            return None;
        }
        let frame = self.source.next_frame()?;
        Some(self.process_frame(&frame))
    }

    /// Elapsed time of the current session; frozen once stopped.
    pub fn session_duration(&self) -> Duration {
        match (self.session_start, self.is_tracking, self.stopped_at) {
            (Some(start), true, _) => self.clock.now().saturating_duration_since(start),
            (Some(start), false, Some(stopped)) => stopped.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.is_tracking
    }

    pub fn state(&self) -> TrackerState {
        TrackerState {
            stage: self.counter.stage(),
            rep_count: self.counter.count(),
            is_tracking: self.is_tracking,
            session_start: self.session_start,
        }
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry::new(
            self.last_elbow,
            self.last_body,
            self.counter.stage(),
            self.counter.count(),
            self.session_duration(),
        )
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::new(self.counter.count(), self.session_duration())
    }

    /// Receiver of the snapshots published after each step.
    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            stage: self.counter.stage(),
            rep_count: self.counter.count(),
            is_tracking: self.is_tracking,
            elbow_angle: self.last_elbow,
            body_angle: self.last_body,
            frames_processed: self.frames_processed,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn no_signal(&self) -> FrameResult {
        self.publish();
        self.result(FrameOutcome::NoSignal, None, None, false)
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn result(
        &self,
        outcome: FrameOutcome,
        elbow_angle: Option<f64>,
        body_angle: Option<f64>,
        counted_this_frame: bool,
    ) -> FrameResult {
        FrameResult {
            outcome,
            elbow_angle,
            body_angle,
            stage: self.counter.stage(),
            rep_count: self.counter.count(),
            counted_this_frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::pose::synthetic::{arm_frame, arm_sequence};
    use crate::pose::{ExternalSource, Landmark, ScriptedSource};

    const FRAME_US: u64 = 33_333;

    fn started() -> RepTracker<ExternalSource> {
        let mut tracker = RepTracker::new(ExternalSource::new(), &Config::default());
        tracker.start().unwrap();
        tracker
    }

    fn feed(tracker: &mut RepTracker<ExternalSource>, angles: &[f64]) -> Vec<FrameResult> {
        arm_sequence(angles, FRAME_US)
            .iter()
            .map(|f| tracker.process_frame(f))
            .collect()
    }

    #[test]
    fn test_frames_ignored_before_start() {
        let mut tracker = RepTracker::new(ExternalSource::new(), &Config::default());
        let result = tracker.process_frame(&arm_frame(170.0, 0));
        assert_eq!(result.outcome, FrameOutcome::Idle);
        assert_eq!(result.stage, Stage::Unknown);
        assert_eq!(tracker.snapshot().frames_processed, 0);
    }

    #[test]
    fn test_single_cycle_counts_once() {
        let mut tracker = started();
        let results = feed(&mut tracker, &[170.0, 170.0, 80.0, 80.0, 170.0]);
        let counts: Vec<u32> = results.iter().map(|r| r.rep_count).collect();
        assert_eq!(counts, vec![0, 0, 1, 1, 1]);
        assert!(results[2].counted_this_frame);
        assert!(!results[3].counted_this_frame);
        assert_eq!(tracker.state().stage, Stage::Up);
    }

    #[test]
    fn test_body_angle_reported() {
        let mut tracker = started();
        let result = tracker.process_frame(&arm_frame(120.0, 0));
        assert_eq!(result.outcome, FrameOutcome::Tracked);
        assert!((result.body_angle.unwrap() - 90.0).abs() < 1e-3);
        assert!((result.elbow_angle.unwrap() - 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_missing_hip_still_counts() {
        let mut tracker = started();
        for &deg in &[170.0, 80.0] {
            let mut frame = arm_frame(deg, 0);
            frame.set(LandmarkIndex::LeftHip, None);
            let result = tracker.process_frame(&frame);
            assert_eq!(result.outcome, FrameOutcome::Tracked);
            assert!(result.body_angle.is_none());
        }
        assert_eq!(tracker.state().rep_count, 1);
    }

    #[test]
    fn test_no_signal_preserves_state() {
        let mut tracker = started();
        feed(&mut tracker, &[170.0]);

        for missing in [
            LandmarkIndex::LeftShoulder,
            LandmarkIndex::LeftElbow,
            LandmarkIndex::LeftWrist,
        ] {
            let mut frame = arm_frame(80.0, 0);
            frame.set(missing, None);
            let result = tracker.process_frame(&frame);
            assert_eq!(result.outcome, FrameOutcome::NoSignal);
            assert_eq!(result.stage, Stage::Up);
            assert_eq!(result.rep_count, 0);
            assert!(!result.counted_this_frame);
        }
    }

    #[test]
    fn test_low_visibility_is_no_signal() {
        let mut tracker = started();
        let mut frame = arm_frame(170.0, 0);
        frame.set(
            LandmarkIndex::LeftWrist,
            Some(Landmark::new(0.5, 0.7, 0.1)),
        );
        assert_eq!(tracker.process_frame(&frame).outcome, FrameOutcome::NoSignal);
        assert_eq!(tracker.state().stage, Stage::Unknown);
    }

    #[test]
    fn test_non_finite_coordinates_are_no_signal() {
        let mut tracker = started();
        let mut frame = arm_frame(170.0, 0);
        frame.set(
            LandmarkIndex::LeftElbow,
            Some(Landmark::new(f32::NAN, 0.5, 1.0)),
        );
        assert_eq!(tracker.process_frame(&frame).outcome, FrameOutcome::NoSignal);
    }

    #[test]
    fn test_stop_blocks_next_frame() {
        let mut tracker = started();
        feed(&mut tracker, &[170.0]);
        tracker.stop();
        let result = tracker.process_frame(&arm_frame(80.0, FRAME_US));
        assert_eq!(result.outcome, FrameOutcome::Idle);
        assert_eq!(result.rep_count, 0);
        assert_eq!(result.stage, Stage::Up);
    }

    #[test]
    fn test_stop_keeps_counters_and_restart_continues() {
        let mut tracker = started();
        feed(&mut tracker, &[170.0, 80.0]);
        let summary = tracker.stop();
        assert_eq!(summary.total_reps, 1);
        assert!(!tracker.is_tracking());

        tracker.start().unwrap();
        feed(&mut tracker, &[170.0, 80.0]);
        assert_eq!(tracker.state().rep_count, 2);
    }

    #[test]
    fn test_configure_after_stop_keeps_count() {
        let mut tracker = started();
        feed(&mut tracker, &[170.0, 80.0]);
        tracker.stop();

        let pose = PoseConfig {
            model_complexity: 2,
            ..PoseConfig::default()
        };
        tracker.configure(pose).unwrap();
        assert_eq!(tracker.state().rep_count, 1);
        assert_eq!(tracker.state().stage, Stage::Down);

        tracker.start().unwrap();
        feed(&mut tracker, &[170.0, 80.0]);
        assert_eq!(tracker.state().rep_count, 2);
    }

    #[test]
    fn test_configure_while_tracking_rejected() {
        let mut tracker = started();
        let err = tracker.configure(PoseConfig::default()).unwrap_err();
        assert!(matches!(err, TrackerError::AlreadyTracking));
        assert!(tracker.is_tracking());
    }

    #[test]
    fn test_invalid_configure_fails_on_next_start() {
        let mut tracker = started();
        tracker.stop();
        let pose = PoseConfig {
            min_detection_confidence: 1.5,
            ..PoseConfig::default()
        };
        tracker.configure(pose).unwrap();
        assert!(matches!(tracker.start(), Err(TrackerError::Unavailable(_))));
        assert!(!tracker.is_tracking());
    }

    #[test]
    fn test_collapsed_arm_is_no_signal() {
        let mut tracker = started();
        feed(&mut tracker, &[170.0]);

        let point = Landmark::new(0.5, 0.5, 0.99);
        let frame = LandmarkFrame::empty(FRAME_US)
            .with(LandmarkIndex::LeftShoulder, point)
            .with(LandmarkIndex::LeftElbow, point)
            .with(LandmarkIndex::LeftWrist, point);
        let result = tracker.process_frame(&frame);
        assert_eq!(result.outcome, FrameOutcome::NoSignal);
        assert_eq!(result.elbow_angle, None);
        assert!(!result.counted_this_frame);
        assert_eq!(result.rep_count, 0);
        assert_eq!(result.stage, Stage::Up);

        // 肘が手首と重なる場合も同様
        let mut frame = arm_frame(80.0, 2 * FRAME_US);
        let elbow = *frame.get(LandmarkIndex::LeftElbow).unwrap();
        frame.set(LandmarkIndex::LeftWrist, Some(elbow));
        assert_eq!(tracker.process_frame(&frame).outcome, FrameOutcome::NoSignal);
        assert_eq!(tracker.state().rep_count, 0);
    }

    #[test]
    fn test_collapsed_hip_segment_drops_body_angle() {
        let mut tracker = started();
        let mut frame = arm_frame(120.0, 0);
        let shoulder = *frame.get(LandmarkIndex::LeftShoulder).unwrap();
        frame.set(LandmarkIndex::LeftHip, Some(shoulder));
        let result = tracker.process_frame(&frame);
        assert_eq!(result.outcome, FrameOutcome::Tracked);
        assert!(result.body_angle.is_none());
    }

    #[test]
    fn test_stop_when_stopped_is_noop() {
        let mut tracker = RepTracker::new(ExternalSource::new(), &Config::default());
        let summary = tracker.stop();
        assert_eq!(summary.total_reps, 0);
        assert_eq!(summary.duration_seconds, 0);
    }

    #[test]
    fn test_start_twice_is_noop() {
        let clock = ManualClock::new();
        let mut tracker =
            RepTracker::with_clock(ExternalSource::new(), &Config::default(), clock.clone());
        tracker.start().unwrap();
        let first = tracker.state().session_start;
        clock.advance(Duration::from_secs(2));
        tracker.start().unwrap();
        assert_eq!(tracker.state().session_start, first);
        assert_eq!(tracker.session_duration(), Duration::from_secs(2));
    }

    #[test]
    fn test_unavailable_source() {
        let mut tracker = RepTracker::new(ScriptedSource::failing("model load failed"), &Config::default());
        let err = tracker.start().unwrap_err();
        assert!(matches!(err, TrackerError::Unavailable(ref m) if m.contains("model load failed")));
        assert!(!tracker.is_tracking());
        assert_eq!(
            tracker.process_frame(&arm_frame(170.0, 0)).outcome,
            FrameOutcome::Idle
        );
    }

    #[test]
    fn test_invalid_pose_config_unavailable() {
        let mut config = Config::default();
        config.pose.model_complexity = 7;
        let mut tracker = RepTracker::new(ExternalSource::new(), &config);
        assert!(matches!(tracker.start(), Err(TrackerError::Unavailable(_))));
    }

    #[test]
    fn test_reset_while_tracking() {
        let clock = ManualClock::new();
        let mut tracker =
            RepTracker::with_clock(ExternalSource::new(), &Config::default(), clock.clone());
        tracker.start().unwrap();
        feed_generic(&mut tracker, &[170.0, 80.0, 170.0, 80.0]);
        clock.advance(Duration::from_secs(10));

        tracker.reset();
        let state = tracker.state();
        assert_eq!(state.rep_count, 0);
        assert_eq!(state.stage, Stage::Unknown);
        assert!(state.is_tracking);
        assert_eq!(tracker.session_duration(), Duration::ZERO);
        assert_eq!(tracker.telemetry().elbow_angle_degrees, None);
    }

    #[test]
    fn test_reset_when_stopped_clears_duration() {
        let clock = ManualClock::new();
        let mut tracker =
            RepTracker::with_clock(ExternalSource::new(), &Config::default(), clock.clone());
        tracker.start().unwrap();
        clock.advance(Duration::from_secs(4));
        tracker.stop();
        assert_eq!(tracker.session_duration(), Duration::from_secs(4));
        tracker.reset();
        assert_eq!(tracker.session_duration(), Duration::ZERO);
    }

    #[test]
    fn test_duration_frozen_after_stop() {
        let clock = ManualClock::new();
        let mut tracker =
            RepTracker::with_clock(ExternalSource::new(), &Config::default(), clock.clone());
        assert_eq!(tracker.session_duration(), Duration::ZERO);
        tracker.start().unwrap();
        clock.advance(Duration::from_secs(30));
        assert_eq!(tracker.session_duration(), Duration::from_secs(30));
        let summary = tracker.stop();
        clock.advance(Duration::from_secs(30));
        assert_eq!(tracker.session_duration(), Duration::from_secs(30));
        assert_eq!(summary.duration_seconds, 30);
    }

    #[test]
    fn test_summary_rate() {
        let clock = ManualClock::new();
        let mut tracker =
            RepTracker::with_clock(ExternalSource::new(), &Config::default(), clock.clone());
        tracker.start().unwrap();
        feed_generic(&mut tracker, &[170.0, 80.0, 170.0, 80.0, 170.0, 80.0]);
        clock.advance(Duration::from_secs(60));
        let summary = tracker.stop();
        assert_eq!(summary.total_reps, 3);
        assert!((summary.reps_per_minute - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_published_atomically() {
        let mut tracker = started();
        let rx = tracker.subscribe();
        feed(&mut tracker, &[170.0, 80.0]);
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.rep_count, 1);
        assert_eq!(snapshot.stage, Stage::Down);
        assert_eq!(snapshot.frames_processed, 2);
        assert!(snapshot.is_tracking);
    }

    #[test]
    fn test_snapshot_reflects_stop() {
        let mut tracker = started();
        let rx = tracker.subscribe();
        tracker.stop();
        assert!(!rx.borrow().is_tracking);
    }

    #[test]
    fn test_poll_pulls_from_source() {
        let source = ScriptedSource::new(arm_sequence(&[170.0, 80.0, 170.0], FRAME_US));
        let mut tracker = RepTracker::new(source, &Config::default());
        assert!(tracker.poll().is_none());
        tracker.start().unwrap();
        let mut results = Vec::new();
        while let Some(r) = tracker.poll() {
            results.push(r);
        }
        assert_eq!(results.len(), 3);
        assert_eq!(tracker.state().rep_count, 1);
        tracker.stop();
        assert!(!tracker.source().is_capturing());
    }

    #[test]
    fn test_smoothing_delays_count() {
        let mut config = Config::default();
        config.smooth.enabled = true;
        config.smooth.beta = 0.0;
        let mut tracker = RepTracker::new(ExternalSource::new(), &config);
        tracker.start().unwrap();

        let frames = arm_sequence(&[170.0, 170.0, 80.0], FRAME_US);
        let results: Vec<FrameResult> = frames.iter().map(|f| tracker.process_frame(f)).collect();
        // 一回の急落ではフィルタ後の角度が 90° を下回らない
        assert!(results[2].elbow_angle.unwrap() > 90.0);
        assert_eq!(tracker.state().rep_count, 0);

        let more = arm_sequence(&[80.0; 60], FRAME_US);
        for (i, f) in more.iter().enumerate() {
            let mut f = f.clone();
            f.timestamp_us = (3 + i as u64) * FRAME_US;
            tracker.process_frame(&f);
        }
        assert_eq!(tracker.state().rep_count, 1);
    }

    fn feed_generic<C: Clock>(tracker: &mut RepTracker<ExternalSource, C>, angles: &[f64]) {
        for f in arm_sequence(angles, FRAME_US) {
            tracker.process_frame(&f);
        }
    }
}
