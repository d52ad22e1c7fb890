use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{CueSink, PacerError, Result, SessionSummary, Tick, TimeSource, WorkoutSession};

/// Control requests from the UI layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Activate,
    Deactivate,
    Toggle,
    Exit,
}

/// Messages published by the timer thread.
#[derive(Debug)]
pub enum Update {
    Tick(Tick),
    /// The session stopped on an error, e.g. the clock became unavailable.
    Failed(PacerError),
    Exited(SessionSummary),
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis.max(1)))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Caller side of a session running on its own timer thread.
#[derive(Debug)]
pub struct SessionHandle {
    commands: Sender<Command>,
    updates: Receiver<Update>,
    thread: JoinHandle<()>,
}

impl SessionHandle {
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PacerError::channel("session thread has stopped"))
    }

    /// Extra command sender for input threads.
    pub fn commander(&self) -> Sender<Command> {
        self.commands.clone()
    }

    pub fn updates(&self) -> &Receiver<Update> {
        &self.updates
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Update> {
        self.updates.recv_timeout(timeout).ok()
    }

    /// Asks the thread to exit and waits for its summary.
    pub fn shutdown(self) -> Result<SessionSummary> {
        // The thread may already be gone after a failure; the summary, if
        // any, is still in the channel.
        let _ = self.commands.send(Command::Exit);
        let summary = self.updates.iter().find_map(|update| match update {
            Update::Exited(summary) => Some(summary),
            _ => None,
        });
        self.thread
            .join()
            .map_err(|_| PacerError::channel("session thread panicked"))?;
        summary.ok_or_else(|| PacerError::channel("session thread exited without a summary"))
    }
}

/// Moves `session` onto a dedicated timer thread. Every interval, or right
/// after a command arrives, the thread runs one full tick and publishes it.
/// The session itself is only ever touched from that thread.
pub fn spawn<S, K, T>(session: WorkoutSession<S, K>, ticker: T) -> SessionHandle
where
    S: TimeSource,
    K: CueSink + Send + 'static,
    T: Ticker,
{
    let (command_tx, command_rx) = mpsc::channel();
    let (update_tx, update_rx) = mpsc::channel();

    let thread = thread::spawn(move || run(session, ticker, command_rx, update_tx));

    SessionHandle {
        commands: command_tx,
        updates: update_rx,
        thread,
    }
}

fn run<S, K, T>(
    mut session: WorkoutSession<S, K>,
    ticker: T,
    commands: Receiver<Command>,
    updates: Sender<Update>,
) where
    S: TimeSource,
    K: CueSink,
    T: Ticker,
{
    loop {
        let applied = match commands.recv_timeout(ticker.interval()) {
            Ok(Command::Exit) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(Command::Activate) => session.activate(),
            Ok(Command::Deactivate) => session.deactivate(),
            Ok(Command::Toggle) => session.toggle(),
            Err(RecvTimeoutError::Timeout) => Ok(()),
        };

        let ticked = applied.and_then(|_| session.tick());
        match ticked {
            Ok(Some(tick)) => {
                if updates.send(Update::Tick(tick)).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(%err, "session stopped");
                let _ = updates.send(Update::Failed(err));
                break;
            }
        }
    }

    let _ = updates.send(Update::Exited(session.exit()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualTimeSource, NullSink, SessionParameters};

    fn spawn_manual(source: &ManualTimeSource) -> SessionHandle {
        let session =
            WorkoutSession::new(SessionParameters::default(), source.clone(), NullSink).unwrap();
        spawn(session, FixedTicker::from_millis(1))
    }

    #[test]
    fn idle_session_publishes_nothing() {
        let handle = spawn_manual(&ManualTimeSource::new());
        assert!(handle.recv_timeout(Duration::from_millis(20)).is_none());

        let summary = handle.shutdown().unwrap();
        assert!(!summary.completed);
    }

    #[test]
    fn activation_starts_ticking() {
        let handle = spawn_manual(&ManualTimeSource::new());
        handle.send(Command::Activate).unwrap();

        match handle.recv_timeout(Duration::from_secs(2)) {
            Some(Update::Tick(tick)) => assert_eq!(tick.snapshot.current_set, 1),
            other => panic!("expected a tick, got {other:?}"),
        }
        handle.shutdown().unwrap();
    }

    #[test]
    fn unavailable_clock_reports_failure() {
        let handle = spawn_manual(&ManualTimeSource::unavailable());
        handle.send(Command::Activate).unwrap();

        match handle.recv_timeout(Duration::from_secs(2)) {
            Some(Update::Failed(err)) => assert!(matches!(err, PacerError::ClockUnavailable(_))),
            other => panic!("expected a failure, got {other:?}"),
        }
        assert!(handle.shutdown().is_ok());
    }
}
