use serde::{Deserialize, Serialize};

use crate::{PacerError, Result};

/// Fixed length of every session, in seconds (20 minutes).
pub const SESSION_DURATION_SECS: f64 = 1200.0;

/// User supplied description of a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionParameters {
    pub total_reps: u32,
    pub set_size: u32,
    /// Work:rest ratio, applied to the work time of a nominal set.
    pub ratio: f64,
}

impl Default for SessionParameters {
    fn default() -> Self {
        Self {
            total_reps: 100,
            set_size: 10,
            ratio: 3.0,
        }
    }
}

impl SessionParameters {
    /// Builds validated parameters.
    pub fn new(total_reps: u32, set_size: u32, ratio: f64) -> Result<Self> {
        let params = Self {
            total_reps,
            set_size,
            ratio,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_reps == 0 {
            return Err(PacerError::invalid("total reps must be greater than zero"));
        }
        if self.set_size == 0 {
            return Err(PacerError::invalid("set size must be greater than zero"));
        }
        if !self.ratio.is_finite() || self.ratio <= 0.0 {
            return Err(PacerError::invalid(format!(
                "work:rest ratio must be a positive number, got {}",
                self.ratio
            )));
        }
        Ok(())
    }
}

/// Work and rest durations derived from [`SessionParameters`]. Immutable for
/// the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub total_reps: u32,
    pub set_size: u32,
    pub time_per_rep: f64,
    /// Rest after each set except the last. Zero for single-set sessions.
    pub rest_per_set: f64,
    pub num_sets: u32,
    pub total_work_time: f64,
    pub total_rest_time: f64,
}

impl Schedule {
    /// Number of reps in the 1-indexed `set`. The final set holds the
    /// remainder when `total_reps` is not a multiple of `set_size`.
    pub fn reps_in_set(&self, set: u32) -> u32 {
        let previous = set.saturating_sub(1).saturating_mul(self.set_size);
        self.set_size.min(self.total_reps.saturating_sub(previous))
    }

    pub fn work_duration_for_set(&self, set: u32) -> f64 {
        f64::from(self.reps_in_set(set)) * self.time_per_rep
    }

    /// Sum of every work and rest phase; equals [`SESSION_DURATION_SECS`]
    /// up to floating point error.
    pub fn total_duration(&self) -> f64 {
        self.time_per_rep * f64::from(self.total_reps)
            + self.rest_per_set * f64::from(self.num_sets.saturating_sub(1))
    }
}

/// Derives a [`Schedule`] that fits the fixed session duration.
///
/// The ratio compares the work time of a full-size set with the rest that
/// follows it, so `rest_per_set = time_per_rep * set_size / ratio` and
///
/// ```text
/// time_per_rep * (total_reps + (num_sets - 1) * set_size / ratio) = D
/// ```
///
/// A short final set keeps the same `time_per_rep`; it simply finishes sooner.
pub fn plan(params: &SessionParameters) -> Result<Schedule> {
    params.validate()?;

    let num_sets = params.total_reps.div_ceil(params.set_size);
    let set_size = f64::from(params.set_size);
    let rest_units = f64::from(num_sets - 1) * (set_size / params.ratio);
    let time_per_rep = SESSION_DURATION_SECS / (f64::from(params.total_reps) + rest_units);

    let rest_per_set = if num_sets > 1 {
        time_per_rep * set_size / params.ratio
    } else {
        0.0
    };

    // Extreme ratios overflow the rest term and collapse the schedule to zero.
    if !(time_per_rep.is_finite() && time_per_rep > 0.0 && rest_per_set.is_finite()) {
        return Err(PacerError::invalid(format!(
            "work:rest ratio {} cannot fit the session into {SESSION_DURATION_SECS}s",
            params.ratio
        )));
    }

    let total_work_time = time_per_rep * f64::from(params.total_reps);
    let schedule = Schedule {
        total_reps: params.total_reps,
        set_size: params.set_size,
        time_per_rep,
        rest_per_set,
        num_sets,
        total_work_time,
        total_rest_time: SESSION_DURATION_SECS - total_work_time,
    };

    tracing::info!(num_sets, time_per_rep, rest_per_set, "planned session");

    Ok(schedule)
}
