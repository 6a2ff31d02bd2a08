use std::sync::Arc;

use clap::Args;
use shadowbox_core::{
    BreathingController, BreathingState, Config, Event, Exercise, SystemClock,
};

use super::live::{self, LiveSession};

#[derive(Args)]
pub struct BreatheArgs {
    /// box, 478 or resonant
    #[arg(long)]
    exercise: Option<Exercise>,
    /// Number of cycles (1-20)
    #[arg(long)]
    cycles: Option<u32>,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

struct BreathingSession {
    controller: BreathingController,
}

impl LiveSession for BreathingSession {
    fn help(&self) -> &'static str {
        "p pause, r resume, q quit (each followed by Enter)"
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
            "" => Ok(None),
            other => Err(format!("unknown command '{other}'")),
        }
    }

    fn stop(&mut self) -> Option<Event> {
        self.controller.stop()
    }

    fn status(&self) -> String {
        let snap = self.controller.snapshot();
        format!(
            "{} {}s  cycle {}/{}",
            snap.phase.name(),
            snap.phase_remaining_secs,
            (snap.cycle + 1).min(snap.total_cycles),
            snap.total_cycles
        )
    }

    fn is_finished(&self) -> bool {
        self.controller.state() == BreathingState::Completed
    }
}

pub fn run(args: BreatheArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let exercise = args.exercise.unwrap_or(config.breathing.exercise);
    let cycles = args.cycles.unwrap_or(config.breathing.cycles);

    let outputs = live::terminal_outputs(&config.audio);
    let controller =
        BreathingController::new(exercise, cycles, Arc::new(SystemClock)).with_outputs(outputs);

    let mut session = BreathingSession { controller };
    live::run(&mut session, args.json)
}
