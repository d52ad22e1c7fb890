use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::mpsc::Sender,
    thread,
    time::{Duration, Instant},
};

use clap::{Parser, Subcommand};
use interval_pacer_core::{
    format_clock, plan, runtime, status_line, AppConfig, AudioEngine, Command, CueEvent, CueSink,
    FixedTicker, MonotonicTimeSource, PacerError, SessionParameters, Tone, Update, WorkoutSession,
};
use tracing_subscriber::EnvFilter;

const STATUS_REFRESH: Duration = Duration::from_millis(200);

fn main() -> interval_pacer_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { session, json } => {
            run_plan(&session.apply(SessionParameters::default()), json)
        }
        Commands::Run {
            config,
            session,
            lead_in,
            mute,
        } => run_session(config, &session, lead_in, mute),
    }
}

fn run_plan(params: &SessionParameters, json: bool) -> interval_pacer_core::Result<()> {
    let schedule = plan(params)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
        return Ok(());
    }

    println!("sets:          {}", schedule.num_sets);
    println!("time per rep:  {:.3}s", schedule.time_per_rep);
    println!("rest per set:  {:.3}s", schedule.rest_per_set);
    println!("work total:    {}", format_clock(schedule.total_work_time));
    println!("rest total:    {}", format_clock(schedule.total_rest_time));
    Ok(())
}

fn run_session(
    config_path: Option<PathBuf>,
    overrides: &SessionArgs,
    lead_in: Option<u32>,
    mute: bool,
) -> interval_pacer_core::Result<()> {
    let mut config = match config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    config.session = overrides.apply(config.session);
    if let Some(secs) = lead_in {
        config.lead_in_secs = secs;
    }
    if mute {
        config.audio.enabled = false;
    }
    tracing::info!(?config, "starting session");

    // Reject bad parameters before the lead-in starts.
    config.session.validate()?;

    let mut audio = AudioEngine::new(&config.audio);
    // Launching the command is the user's go-ahead for sound.
    audio.unlock();
    let mut bell = TerminalBell { audio };
    count_in(&mut bell, config.lead_in_secs)?;

    let session = WorkoutSession::new(config.session, MonotonicTimeSource, bell)?;
    let schedule = *session.schedule();
    let handle = runtime::spawn(session, FixedTicker::from_millis(config.tick_interval_ms));
    handle.send(Command::Activate)?;
    spawn_input(handle.commander());

    let mut last_draw: Option<Instant> = None;
    let finished = loop {
        let update = handle
            .updates()
            .recv()
            .map_err(|_| PacerError::channel("session thread stopped unexpectedly"))?;

        match update {
            Update::Tick(tick) => {
                let changed = !tick.cues.is_empty() || tick.snapshot.is_finished;
                let due = last_draw.map_or(true, |at| at.elapsed() >= STATUS_REFRESH);
                if changed || due {
                    draw(&status_line(&tick.snapshot, &schedule))?;
                    last_draw = Some(Instant::now());
                }
                if tick.snapshot.is_finished {
                    break None;
                }
            }
            Update::Failed(err) => return Err(err),
            Update::Exited(summary) => break Some(summary),
        }
    };

    let summary = match finished {
        Some(summary) => summary,
        None => handle.shutdown()?,
    };

    println!();
    println!(
        "{} reps completed, {} paused{}",
        summary.last_snapshot.total_reps_completed,
        format_clock(summary.paused_secs),
        if summary.completed { "" } else { " (stopped early)" }
    );
    Ok(())
}

/// "Get ready" countdown before the clock starts: a tick each second, then
/// the start chime.
fn count_in(bell: &mut TerminalBell, secs: u32) -> io::Result<()> {
    for remaining in (1..=secs).rev() {
        draw(&format!("Get ready... {remaining}"))?;
        bell.ring(Tone::Countdown);
        thread::sleep(Duration::from_secs(1));
    }
    bell.ring(Tone::Success);
    Ok(())
}

/// Reads stdin lines: `q` exits, anything else toggles pause.
fn spawn_input(commands: Sender<Command>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "q" | "quit" => Command::Exit,
                _ => Command::Toggle,
            };
            if commands.send(command).is_err() || command == Command::Exit {
                break;
            }
        }
    });
}

fn draw(line: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "\r\x1b[2K{line}")?;
    stdout.flush()
}

/// Cue sink that renders tones through the audio engine and rings the
/// terminal bell for each one produced.
#[derive(Debug)]
struct TerminalBell {
    audio: AudioEngine,
}

impl TerminalBell {
    fn ring(&mut self, tone: Tone) {
        self.audio.play(tone);
        self.flush();
    }

    fn flush(&mut self) {
        let tones = self.audio.drain();
        if tones.is_empty() {
            return;
        }
        let mut stderr = io::stderr().lock();
        for tone in tones {
            tracing::trace!(tone = ?tone.tone, samples = tone.samples.len(), "ring");
            let _ = write!(stderr, "\x07");
        }
        let _ = stderr.flush();
    }
}

impl CueSink for TerminalBell {
    fn handle(&mut self, cue: CueEvent) {
        self.audio.handle(cue);
        self.flush();
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Fixed-length interval workout timer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct SessionArgs {
    /// Total number of reps in the session.
    #[arg(short, long)]
    reps: Option<u32>,
    /// Reps per set.
    #[arg(short, long)]
    set_size: Option<u32>,
    /// Work:rest ratio per set, e.g. 3 for 3:1.
    #[arg(long)]
    ratio: Option<f64>,
}

impl SessionArgs {
    fn apply(&self, base: SessionParameters) -> SessionParameters {
        SessionParameters {
            total_reps: self.reps.unwrap_or(base.total_reps),
            set_size: self.set_size.unwrap_or(base.set_size),
            ratio: self.ratio.unwrap_or(base.ratio),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the work and rest durations for a session.
    Plan {
        #[command(flatten)]
        session: SessionArgs,
        /// Emit the schedule as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run a session in the terminal. Press enter to pause or resume, `q` to stop.
    Run {
        /// Optional JSON config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        session: SessionArgs,
        /// Seconds of "get ready" countdown before the session starts.
        #[arg(long)]
        lead_in: Option<u32>,
        /// Disable all sounds.
        #[arg(long)]
        mute: bool,
    },
}
