use serde::{Deserialize, Serialize};

use crate::{Schedule, Snapshot};

/// Formats seconds as `m:ss`, rounding up so a countdown never shows `0:00`
/// while time remains.
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).ceil() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

/// Position of the metronome bar within the current rep. Odd reps sweep up,
/// even reps sweep back down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepProgress {
    pub fraction: f64,
    pub direction: Direction,
}

impl RepProgress {
    pub fn from_snapshot(snapshot: &Snapshot, schedule: &Schedule) -> Self {
        let fraction = if snapshot.is_work_phase && schedule.time_per_rep > 0.0 {
            (snapshot.phase_time_elapsed % schedule.time_per_rep) / schedule.time_per_rep
        } else {
            0.0
        };
        let direction = if snapshot.current_rep_in_set % 2 != 0 {
            Direction::Up
        } else {
            Direction::Down
        };
        Self {
            fraction,
            direction,
        }
    }

    /// Bar height in `[0, 1]` after applying the sweep direction.
    pub fn level(&self) -> f64 {
        match self.direction {
            Direction::Up => self.fraction,
            Direction::Down => 1.0 - self.fraction,
        }
    }
}

/// One-line textual view of a snapshot.
pub fn status_line(snapshot: &Snapshot, schedule: &Schedule) -> String {
    if snapshot.is_finished {
        return format!(
            "Workout complete! {} reps in {} sets",
            snapshot.total_reps_completed, schedule.num_sets
        );
    }

    let remaining = format_clock(snapshot.session_remaining());
    if snapshot.is_work_phase {
        format!(
            "WORK  Rep {}/{}  Set {}/{}  Total {}  [{}]",
            snapshot.current_rep_in_set,
            schedule.reps_in_set(snapshot.current_set),
            snapshot.current_set,
            schedule.num_sets,
            snapshot.total_reps_completed,
            remaining
        )
    } else {
        format!(
            "REST  {}  Next set {}/{}  Total {}  [{}]",
            format_clock(snapshot.phase_remaining()),
            snapshot.current_set + 1,
            schedule.num_sets,
            snapshot.total_reps_completed,
            remaining
        )
    }
}
