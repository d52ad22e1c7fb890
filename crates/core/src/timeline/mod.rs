use serde::{Deserialize, Serialize};

use crate::{Schedule, SESSION_DURATION_SECS};

/// Which kind of phase a snapshot sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Work,
    Rest,
}

/// Position within a [`Schedule`] at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub elapsed_time: f64,
    /// 1-indexed.
    pub current_set: u32,
    /// 1-indexed, 0 while resting or finished.
    pub current_rep_in_set: u32,
    pub total_reps_completed: u32,
    pub is_work_phase: bool,
    pub is_finished: bool,
    pub phase_time_elapsed: f64,
    pub phase_duration: f64,
}

impl Snapshot {
    /// State shown before the first tick: first rep of the first set.
    pub fn initial(schedule: &Schedule) -> Self {
        Self {
            elapsed_time: 0.0,
            current_set: 1,
            current_rep_in_set: 1,
            total_reps_completed: 0,
            is_work_phase: true,
            is_finished: false,
            phase_time_elapsed: 0.0,
            phase_duration: schedule.work_duration_for_set(1),
        }
    }

    /// Terminal snapshot, returned for any time at or past the session end.
    pub fn finished(schedule: &Schedule) -> Self {
        Self {
            elapsed_time: SESSION_DURATION_SECS,
            current_set: schedule.num_sets,
            current_rep_in_set: 0,
            total_reps_completed: schedule.total_reps,
            is_work_phase: false,
            is_finished: true,
            phase_time_elapsed: 0.0,
            phase_duration: 0.0,
        }
    }

    /// Current phase, or `None` once the session is over.
    pub fn phase(&self) -> Option<Phase> {
        match (self.is_finished, self.is_work_phase) {
            (true, _) => None,
            (false, true) => Some(Phase::Work),
            (false, false) => Some(Phase::Rest),
        }
    }

    pub fn phase_remaining(&self) -> f64 {
        (self.phase_duration - self.phase_time_elapsed).max(0.0)
    }

    pub fn session_remaining(&self) -> f64 {
        (SESSION_DURATION_SECS - self.elapsed_time).max(0.0)
    }
}

/// Maps an elapsed time onto the schedule in a single pass over the sets.
///
/// Every phase window is half-open, so a sample sitting exactly on a boundary
/// belongs to the later phase. Anything at or past the session duration, or a
/// sample that slips past the last window through rounding, resolves to the
/// terminal snapshot.
pub fn resolve(schedule: &Schedule, elapsed_seconds: f64) -> Snapshot {
    let elapsed = elapsed_seconds.max(0.0);
    if elapsed >= SESSION_DURATION_SECS {
        return Snapshot::finished(schedule);
    }

    let mut acc = 0.0;
    let mut prior_reps = 0;

    for set in 1..=schedule.num_sets {
        let reps_in_set = schedule.reps_in_set(set);
        let work_duration = f64::from(reps_in_set) * schedule.time_per_rep;

        if elapsed < acc + work_duration {
            let phase_time_elapsed = elapsed - acc;
            // A rep only counts once its full duration has passed.
            let reps_done = ((phase_time_elapsed / schedule.time_per_rep).floor() as u32)
                .min(reps_in_set);

            return Snapshot {
                elapsed_time: elapsed,
                current_set: set,
                current_rep_in_set: (reps_done + 1).min(reps_in_set),
                total_reps_completed: prior_reps + reps_done,
                is_work_phase: true,
                is_finished: false,
                phase_time_elapsed,
                phase_duration: work_duration,
            };
        }

        acc += work_duration;
        prior_reps += reps_in_set;

        if set < schedule.num_sets {
            if elapsed < acc + schedule.rest_per_set {
                return Snapshot {
                    elapsed_time: elapsed,
                    current_set: set,
                    current_rep_in_set: 0,
                    total_reps_completed: prior_reps,
                    is_work_phase: false,
                    is_finished: false,
                    phase_time_elapsed: elapsed - acc,
                    phase_duration: schedule.rest_per_set,
                };
            }
            acc += schedule.rest_per_set;
        }
    }

    Snapshot::finished(schedule)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{plan, SessionParameters};

    fn schedule(total_reps: u32, set_size: u32, ratio: f64) -> Schedule {
        plan(&SessionParameters::new(total_reps, set_size, ratio).unwrap()).unwrap()
    }

    #[test]
    fn starts_on_first_rep_of_first_set() {
        let schedule = schedule(100, 10, 1.0);
        let snapshot = resolve(&schedule, 0.0);

        assert_eq!(snapshot.current_set, 1);
        assert_eq!(snapshot.current_rep_in_set, 1);
        assert_eq!(snapshot.total_reps_completed, 0);
        assert!(snapshot.is_work_phase);
        assert!(!snapshot.is_finished);
        assert_eq!(snapshot, Snapshot::initial(&schedule));
    }

    #[test]
    fn counts_completed_reps_with_floor() {
        let schedule = schedule(100, 10, 1.0);
        let snapshot = resolve(&schedule, schedule.time_per_rep * 2.5);

        assert_eq!(snapshot.current_rep_in_set, 3);
        assert_eq!(snapshot.total_reps_completed, 2);
        assert!((snapshot.phase_time_elapsed - schedule.time_per_rep * 2.5).abs() < 1e-9);
    }

    #[test]
    fn rest_follows_work_and_reports_rep_zero() {
        let schedule = schedule(100, 10, 1.0);
        let work = schedule.work_duration_for_set(1);
        let snapshot = resolve(&schedule, work + 1.0);

        assert!(!snapshot.is_work_phase);
        assert_eq!(snapshot.phase(), Some(Phase::Rest));
        assert_eq!(snapshot.current_set, 1);
        assert_eq!(snapshot.current_rep_in_set, 0);
        assert_eq!(snapshot.total_reps_completed, 10);
        assert!((snapshot.phase_duration - schedule.rest_per_set).abs() < 1e-9);
        assert!((snapshot.phase_remaining() - (schedule.rest_per_set - 1.0)).abs() < 1e-9);
    }

    #[test]
    fn boundary_sample_belongs_to_next_phase() {
        let schedule = schedule(20, 10, 1.0);
        let work = schedule.work_duration_for_set(1);

        let at_rest = resolve(&schedule, work);
        assert!(!at_rest.is_work_phase);
        assert_eq!(at_rest.phase_time_elapsed, 0.0);

        let at_second_set = resolve(&schedule, work + schedule.rest_per_set);
        assert!(at_second_set.is_work_phase);
        assert_eq!(at_second_set.current_set, 2);
        assert_eq!(at_second_set.current_rep_in_set, 1);
    }

    #[test]
    fn session_end_is_exact() {
        let schedule = schedule(55, 10, 3.0);

        let terminal = resolve(&schedule, SESSION_DURATION_SECS);
        assert!(terminal.is_finished);
        assert_eq!(terminal.current_set, 6);
        assert_eq!(terminal.total_reps_completed, 55);
        assert!(!terminal.is_work_phase);
        assert_eq!(terminal.phase_duration, 0.0);
        assert_eq!(terminal.phase(), None);

        let almost = resolve(&schedule, SESSION_DURATION_SECS - 1e-6);
        assert!(!almost.is_finished);
        assert!(almost.is_work_phase);
        assert_eq!(almost.current_set, 6);
        assert_eq!(almost.current_rep_in_set, 5);

        assert!(resolve(&schedule, SESSION_DURATION_SECS * 3.0).is_finished);
    }

    #[test]
    fn negative_time_clamps_to_start() {
        let schedule = schedule(30, 10, 2.0);
        assert_eq!(resolve(&schedule, -4.0), Snapshot::initial(&schedule));
    }

    #[test]
    fn single_set_runs_work_until_end() {
        let schedule = schedule(5, 10, 2.0);
        let snapshot = resolve(&schedule, 1199.0);

        assert!(snapshot.is_work_phase);
        assert_eq!(snapshot.current_rep_in_set, 5);
        assert_eq!(snapshot.total_reps_completed, 4);
    }

    #[test]
    fn dense_sweep_is_monotonic_and_visits_every_rep_once() {
        for (reps, size, ratio) in [(100, 10, 1.0), (55, 10, 3.0), (200, 10, 9.0), (7, 3, 0.5)] {
            let schedule = schedule(reps, size, ratio);
            let mut previous = resolve(&schedule, 0.0);
            let mut visited = HashSet::new();

            let mut t = 0.0;
            while t <= SESSION_DURATION_SECS + 1.0 {
                let snapshot = resolve(&schedule, t);

                assert!(snapshot.current_set >= previous.current_set);
                assert!(snapshot.total_reps_completed >= previous.total_reps_completed);
                assert!(!(previous.is_finished && !snapshot.is_finished));
                assert!(snapshot.phase_time_elapsed >= 0.0);
                assert!(snapshot.phase_time_elapsed <= snapshot.phase_duration);

                if snapshot.is_work_phase {
                    assert!(snapshot.current_rep_in_set >= 1);
                    visited.insert((snapshot.current_set, snapshot.current_rep_in_set));
                }

                previous = snapshot;
                t += 0.05;
            }

            assert!(previous.is_finished);
            assert_eq!(previous.total_reps_completed, reps);
            assert_eq!(visited.len(), reps as usize);
        }
    }
}
