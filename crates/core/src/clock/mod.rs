use std::{
    fmt,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::{resolve, PacerError, Result, Schedule, Snapshot};

/// Provider of monotonic time readings.
pub trait TimeSource: Send + 'static {
    /// Returns the current instant, or [`PacerError::ClockUnavailable`] when
    /// the host cannot supply one.
    fn now(&self) -> Result<Instant>;
}

/// Production time source backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicTimeSource;

impl TimeSource for MonotonicTimeSource {
    fn now(&self) -> Result<Instant> {
        Ok(Instant::now())
    }
}

/// Hand-driven time source. Clones share the same reading, so a test can keep
/// one copy and advance time underneath a clock that owns another.
#[derive(Clone)]
pub struct ManualTimeSource {
    now: Arc<Mutex<Instant>>,
    available: bool,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
            available: true,
        }
    }

    /// A source whose every reading fails.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn advance(&self, delta: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += delta;
        }
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Result<Instant> {
        if !self.available {
            return Err(PacerError::ClockUnavailable(
                "manual time source disabled".to_string(),
            ));
        }
        self.now
            .lock()
            .map(|now| *now)
            .map_err(|_| PacerError::channel("manual time source has been poisoned"))
    }
}

impl fmt::Debug for ManualTimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTimeSource")
            .field("available", &self.available)
            .finish()
    }
}

/// Wall-clock bookkeeping for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockState {
    /// Captured once on first activation and never reset.
    pub start_instant: Option<Instant>,
    pub accumulated_pause: Duration,
    pub pause_started_at: Option<Instant>,
}

impl ClockState {
    /// Effective session time at `now`. While paused the reading is frozen at
    /// the moment the pause began.
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        let Some(start) = self.start_instant else {
            return Duration::ZERO;
        };
        let reference = self.pause_started_at.unwrap_or(now);
        reference
            .saturating_duration_since(start)
            .saturating_sub(self.accumulated_pause)
    }
}

/// Measures elapsed session time against absolute readings of a
/// [`TimeSource`] rather than summing tick deltas, so long gaps between ticks
/// never make the session lag behind real time.
#[derive(Debug)]
pub struct DriftCorrectedClock<S: TimeSource> {
    source: S,
    schedule: Schedule,
    state: ClockState,
    active: bool,
    finished: bool,
}

impl<S: TimeSource> DriftCorrectedClock<S> {
    pub fn new(schedule: Schedule, source: S) -> Self {
        Self {
            source,
            schedule,
            state: ClockState::default(),
            active: false,
            finished: false,
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn state(&self) -> &ClockState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn has_started(&self) -> bool {
        self.state.start_instant.is_some()
    }

    /// Starts the clock, or resumes it after a pause. Fails without touching
    /// any state when the time source is unavailable.
    pub fn activate(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }
        let now = self.source.now()?;

        match (self.state.start_instant, self.state.pause_started_at.take()) {
            (None, _) => {
                self.state.start_instant = Some(now);
                tracing::info!("session clock started");
            }
            (Some(_), Some(paused_at)) => {
                let paused_for = now.saturating_duration_since(paused_at);
                self.state.accumulated_pause += paused_for;
                tracing::info!(paused_secs = paused_for.as_secs_f64(), "session clock resumed");
            }
            (Some(_), None) => {}
        }

        self.active = true;
        Ok(())
    }

    /// Stops ticking. A pause interval is only opened while the session is
    /// still running; deactivating a finished session just stops the clock.
    pub fn deactivate(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        if self.has_started() && !self.finished {
            self.state.pause_started_at = Some(self.source.now()?);
            tracing::info!("session clock paused");
        }
        self.active = false;
        Ok(())
    }

    /// Effective elapsed seconds, excluding every pause.
    pub fn elapsed_seconds(&self) -> Result<f64> {
        if !self.has_started() {
            return Ok(0.0);
        }
        let now = self.source.now()?;
        Ok(self.state.elapsed_at(now).as_secs_f64())
    }

    /// Samples the time source and resolves a fresh snapshot. Returns `None`
    /// while the clock is not active.
    pub fn tick(&mut self) -> Result<Option<Snapshot>> {
        if !self.active {
            return Ok(None);
        }
        let snapshot = resolve(&self.schedule, self.elapsed_seconds()?);
        self.finished = snapshot.is_finished;
        Ok(Some(snapshot))
    }

    /// Resolves the snapshot at the current effective time without requiring
    /// the clock to be active.
    pub fn snapshot(&self) -> Result<Snapshot> {
        if !self.has_started() {
            return Ok(Snapshot::initial(&self.schedule));
        }
        Ok(resolve(&self.schedule, self.elapsed_seconds()?))
    }

    /// Discards all clock state. Consuming `self` guarantees no further
    /// snapshots come from this clock.
    pub fn dispose(self) -> ClockState {
        tracing::debug!("session clock disposed");
        self.state
    }
}
