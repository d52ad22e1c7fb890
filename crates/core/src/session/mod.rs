use serde::{Deserialize, Serialize};

use crate::{
    plan, CueEdgeDetector, CueEvent, CueSink, DriftCorrectedClock, Result, Schedule,
    SessionParameters, Snapshot, TimeSource,
};

/// Output of one resolve-and-detect cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub snapshot: Snapshot,
    pub cues: Vec<CueEvent>,
}

/// What is left of a session once it has been exited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub params: SessionParameters,
    pub schedule: Schedule,
    pub last_snapshot: Snapshot,
    pub completed: bool,
    pub paused_secs: f64,
}

/// Owns everything a running workout needs: the schedule, the clock, the
/// single-slot edge detector and the cue sink. All of it is driven from one
/// place, so each [`WorkoutSession::tick`] finishes before the next begins.
#[derive(Debug)]
pub struct WorkoutSession<S: TimeSource, K: CueSink> {
    params: SessionParameters,
    clock: DriftCorrectedClock<S>,
    detector: CueEdgeDetector,
    sink: K,
}

impl<S: TimeSource, K: CueSink> WorkoutSession<S, K> {
    /// Plans the session. Invalid parameters fail here, before any clock
    /// exists.
    pub fn new(params: SessionParameters, source: S, sink: K) -> Result<Self> {
        let schedule = plan(&params)?;
        Ok(Self {
            params,
            clock: DriftCorrectedClock::new(schedule, source),
            detector: CueEdgeDetector::new(Snapshot::initial(&schedule)),
            sink,
        })
    }

    pub fn params(&self) -> &SessionParameters {
        &self.params
    }

    pub fn schedule(&self) -> &Schedule {
        self.clock.schedule()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Most recent snapshot produced by a tick.
    pub fn latest(&self) -> &Snapshot {
        self.detector.previous()
    }

    pub fn is_active(&self) -> bool {
        self.clock.is_active()
    }

    pub fn is_finished(&self) -> bool {
        self.latest().is_finished
    }

    /// Starts or resumes the session. A finished session stays stopped.
    pub fn activate(&mut self) -> Result<()> {
        if self.is_finished() {
            return Ok(());
        }
        self.clock.activate()
    }

    pub fn deactivate(&mut self) -> Result<()> {
        self.clock.deactivate()
    }

    /// Pauses a running session or resumes a paused one.
    pub fn toggle(&mut self) -> Result<()> {
        if self.is_active() {
            self.deactivate()
        } else {
            self.activate()
        }
    }

    /// Resolves the current snapshot, derives its cues and hands them to the
    /// sink. Returns `None` while paused. The tick that reaches the end of the
    /// session also stops the clock.
    pub fn tick(&mut self) -> Result<Option<Tick>> {
        let Some(snapshot) = self.clock.tick()? else {
            return Ok(None);
        };

        let previous_set = self.detector.previous().current_set;
        let cues = self.detector.observe(snapshot);

        if snapshot.current_set != previous_set && !snapshot.is_finished {
            tracing::debug!(set = snapshot.current_set, "entered set");
        }
        for cue in &cues {
            tracing::debug!(?cue, elapsed = snapshot.elapsed_time, "cue");
            self.sink.handle(*cue);
        }

        if snapshot.is_finished {
            tracing::info!(reps = snapshot.total_reps_completed, "session finished");
            self.clock.deactivate()?;
        }

        Ok(Some(Tick { snapshot, cues }))
    }

    /// Ends the session, discarding the clock.
    pub fn exit(self) -> SessionSummary {
        let last_snapshot = *self.detector.previous();
        let schedule = *self.clock.schedule();
        let state = self.clock.dispose();

        tracing::info!(
            completed = last_snapshot.is_finished,
            reps = last_snapshot.total_reps_completed,
            "session exited"
        );

        SessionSummary {
            params: self.params,
            schedule,
            last_snapshot,
            completed: last_snapshot.is_finished,
            paused_secs: state.accumulated_pause.as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualTimeSource, PacerError, Phase, SESSION_DURATION_SECS};

    fn session(
        total_reps: u32,
        set_size: u32,
        ratio: f64,
    ) -> (WorkoutSession<ManualTimeSource, Vec<CueEvent>>, ManualTimeSource) {
        let source = ManualTimeSource::new();
        let params = SessionParameters::new(total_reps, set_size, ratio).unwrap();
        let session = WorkoutSession::new(params, source.clone(), Vec::new()).unwrap();
        (session, source)
    }

    #[test]
    fn invalid_parameters_never_build_a_session() {
        let params = SessionParameters {
            total_reps: 0,
            set_size: 10,
            ratio: 1.0,
        };
        let err = WorkoutSession::new(params, ManualTimeSource::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, PacerError::InvalidParameters(_)));
    }

    #[test]
    fn pause_and_resume_do_not_count_paused_time() {
        let (mut session, source) = session(100, 10, 1.0);

        session.activate().unwrap();
        source.advance_secs(5.0);
        session.tick().unwrap();
        session.deactivate().unwrap();

        source.advance_secs(10.0);
        assert!(session.tick().unwrap().is_none());

        session.activate().unwrap();
        source.advance_secs(5.0);
        let tick = session.tick().unwrap().unwrap();

        assert!((tick.snapshot.elapsed_time - 10.0).abs() < 1e-6);
        assert_eq!(tick.snapshot.current_rep_in_set, 2);
        assert_eq!(tick.cues, vec![CueEvent::RepAdvanced]);
    }

    #[test]
    fn cues_reach_the_sink_in_order() {
        let (mut session, source) = session(20, 10, 1.0);
        let work = session.schedule().work_duration_for_set(1);

        session.activate().unwrap();
        source.advance_secs(work + 0.5);
        let tick = session.tick().unwrap().unwrap();

        assert_eq!(tick.cues, vec![CueEvent::PhaseEntered(Phase::Rest)]);
        assert_eq!(session.sink(), &vec![CueEvent::PhaseEntered(Phase::Rest)]);
    }

    #[test]
    fn finishing_stops_the_clock() {
        let (mut session, source) = session(30, 10, 2.0);

        session.activate().unwrap();
        source.advance_secs(SESSION_DURATION_SECS - 1.0);
        session.tick().unwrap();
        source.advance_secs(2.0);

        let tick = session.tick().unwrap().unwrap();
        assert!(tick.snapshot.is_finished);
        assert_eq!(tick.cues.last(), Some(&CueEvent::Finished));
        assert!(!session.is_active());
        assert!(session.tick().unwrap().is_none());

        session.activate().unwrap();
        assert!(!session.is_active());

        let summary = session.exit();
        assert!(summary.completed);
        assert_eq!(summary.last_snapshot.total_reps_completed, 30);
        assert_eq!(summary.paused_secs, 0.0);
    }

    #[test]
    fn toggle_flips_between_running_and_paused() {
        let (mut session, source) = session(50, 5, 2.0);

        session.toggle().unwrap();
        assert!(session.is_active());
        source.advance_secs(3.0);
        session.toggle().unwrap();
        assert!(!session.is_active());
        source.advance_secs(4.0);
        session.toggle().unwrap();

        session.tick().unwrap();
        let summary = session.exit();
        assert!(!summary.completed);
        assert!((summary.paused_secs - 4.0).abs() < 1e-6);
        assert!((summary.last_snapshot.elapsed_time - 3.0).abs() < 1e-6);
    }
}
