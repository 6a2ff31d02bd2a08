use std::sync::Arc;

use clap::Args;
use shadowbox_core::storage::MemoryStore;
use shadowbox_core::{
    ComboMode, Config, Database, Difficulty, Event, PersistenceStore, PhaseState,
    SystemClock, WorkoutController,
};

use super::live::{self, LiveSession};

#[derive(Args)]
pub struct WorkoutArgs {
    /// Round length in seconds
    #[arg(long)]
    round: Option<u64>,
    /// Rest length in seconds
    #[arg(long)]
    rest: Option<u64>,
    /// Number of rounds
    #[arg(long)]
    rounds: Option<u32>,
    /// easy, medium or hard
    #[arg(long)]
    difficulty: Option<Difficulty>,
    /// Seconds between combo calls
    #[arg(long)]
    interval: Option<u64>,
    /// library or procedural
    #[arg(long)]
    mode: Option<ComboMode>,
    /// Call one combo per round
    #[arg(long)]
    single_combo: bool,
    /// Don't read combos out
    #[arg(long)]
    no_voice: bool,
    /// Seed for reproducible combos
    #[arg(long)]
    seed: Option<u64>,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

struct WorkoutSession {
    controller: WorkoutController,
}

impl LiveSession for WorkoutSession {
    fn help(&self) -> &'static str {
        "p pause, r resume, s resync, q quit (each followed by Enter)"
    }

    fn start(&mut self) -> Option<Event> {
        self.controller.start()
    }

    fn pump(&mut self) -> Vec<Event> {
        self.controller.pump()
    }

    fn command(&mut self, input: &str) -> Result<Option<Event>, String> {
        match input {
            "p" => Ok(self.controller.pause()),
            "r" => Ok(self.controller.resume()),
            "s" => Ok(self.controller.resync()),
            "" => Ok(None),
            other => Err(format!("unknown command '{other}'")),
        }
    }

    fn stop(&mut self) -> Option<Event> {
        self.controller.stop()
    }

    fn status(&self) -> String {
        let snap = self.controller.snapshot();
        let label = match snap.phase {
            Some(phase) if snap.state == PhaseState::Paused => format!("{} (paused)", phase.label()),
            Some(phase) => phase.label().to_string(),
            None => format!("{:?}", snap.state),
        };
        let warn = if snap.warning { " !" } else { "" };
        format!(
            "{label} {}{warn}  round {}/{}",
            snap.remaining, snap.round, snap.total_rounds
        )
    }

    fn is_finished(&self) -> bool {
        self.controller.state() == PhaseState::Finished
    }
}

fn open_store() -> Box<dyn PersistenceStore> {
    match Database::open() {
        Ok(db) => Box::new(db),
        Err(e) => {
            tracing::warn!(error = %e, "database unavailable; completion will not be saved");
            Box::new(MemoryStore::new())
        }
    }
}

pub fn run(args: WorkoutArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut workout = config.workout.clone();
    if let Some(secs) = args.round {
        workout.round_secs = secs;
    }
    if let Some(secs) = args.rest {
        workout.rest_secs = secs;
    }
    if let Some(rounds) = args.rounds {
        workout.total_rounds = rounds;
    }
    if let Some(difficulty) = args.difficulty {
        workout.difficulty = difficulty;
    }
    if let Some(secs) = args.interval {
        workout.combo_interval_secs = secs;
    }
    if let Some(mode) = args.mode {
        workout.combo_mode = mode;
    }
    workout.single_combo_per_round |= args.single_combo;
    workout.voice_announcements &= !args.no_voice;

    let outputs = live::terminal_outputs(&config.audio);
    let mut controller = WorkoutController::new(workout.validated(), Arc::new(SystemClock))
        .with_outputs(outputs)
        .with_store(open_store());
    if let Some(seed) = args.seed {
        controller = controller.with_seed(seed);
    }

    let mut session = WorkoutSession { controller };
    live::run(&mut session, args.json)
}
