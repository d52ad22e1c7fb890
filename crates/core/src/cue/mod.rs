use serde::{Deserialize, Serialize};

use crate::{Phase, Snapshot};

/// Rest countdown cues fire only for the last few seconds of a rest.
pub const REST_COUNTDOWN_SECS: u32 = 3;

/// Discrete cue produced when consecutive snapshots differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CueEvent {
    RepAdvanced,
    PhaseEntered(Phase),
    SetAdvanced,
    RestCountdownTick(u32),
    Finished,
}

/// Compares two consecutive snapshots and returns the cues for the
/// transition, in a fixed order with at most one cue of each kind.
pub fn detect_edges(previous: &Snapshot, current: &Snapshot) -> Vec<CueEvent> {
    let mut cues = Vec::new();

    // No cue on the first rep of a set; nothing has advanced yet.
    if current.is_work_phase
        && current.current_rep_in_set != previous.current_rep_in_set
        && current.current_rep_in_set > 1
    {
        cues.push(CueEvent::RepAdvanced);
    }

    if current.is_work_phase != previous.is_work_phase {
        let phase = if current.is_work_phase {
            Phase::Work
        } else {
            Phase::Rest
        };
        cues.push(CueEvent::PhaseEntered(phase));
    }

    if current.current_set != previous.current_set {
        cues.push(CueEvent::SetAdvanced);
    }

    if let Some(seconds_left) = rest_countdown(previous, current) {
        cues.push(CueEvent::RestCountdownTick(seconds_left));
    }

    if current.is_finished && !previous.is_finished {
        cues.push(CueEvent::Finished);
    }

    cues
}

fn rest_countdown(previous: &Snapshot, current: &Snapshot) -> Option<u32> {
    if current.is_work_phase || current.is_finished {
        return None;
    }

    let left = current.phase_remaining().ceil();
    let previous_left = if !previous.is_work_phase
        && !previous.is_finished
        && previous.current_set == current.current_set
    {
        previous.phase_remaining().ceil()
    } else {
        current.phase_duration.ceil()
    };

    let seconds_left = left as u32;
    (left < previous_left && (1..=REST_COUNTDOWN_SECS).contains(&seconds_left))
        .then_some(seconds_left)
}

/// Single-slot edge detector: remembers only the last snapshot it saw.
#[derive(Debug, Clone)]
pub struct CueEdgeDetector {
    previous: Snapshot,
}

impl CueEdgeDetector {
    pub fn new(initial: Snapshot) -> Self {
        Self { previous: initial }
    }

    pub fn previous(&self) -> &Snapshot {
        &self.previous
    }

    /// Emits the cues between the stored snapshot and `current`, then stores
    /// `current` in its place.
    pub fn observe(&mut self, current: Snapshot) -> Vec<CueEvent> {
        let cues = detect_edges(&self.previous, &current);
        self.previous = current;
        cues
    }
}
