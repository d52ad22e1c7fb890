//! Core library for the Interval Pacer workout timer.
//!
//! A session is planned once from its parameters into an immutable
//! [`Schedule`], then a drift-corrected clock samples real time, resolves it
//! onto the schedule and turns consecutive snapshots into cue events for the
//! audio and display layers.

pub mod audio;
pub mod clock;
pub mod config;
pub mod cue;
pub mod error;
pub mod plan;
pub mod render;
pub mod runtime;
pub mod session;
pub mod timeline;

pub use audio::{AudioEngine, CueSink, NullSink, RenderedTone, Tone, UnlockState};
pub use clock::{
    ClockState, DriftCorrectedClock, ManualTimeSource, MonotonicTimeSource, TimeSource,
};
pub use config::{AppConfig, AudioConfig};
pub use cue::{detect_edges, CueEdgeDetector, CueEvent};
pub use error::{PacerError, Result};
pub use plan::{plan, Schedule, SessionParameters, SESSION_DURATION_SECS};
pub use render::{format_clock, status_line, RepProgress};
pub use runtime::{Command, FixedTicker, SessionHandle, Ticker, Update};
pub use session::{SessionSummary, Tick, WorkoutSession};
pub use timeline::{resolve, Phase, Snapshot};
