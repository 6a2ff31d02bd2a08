use clap::Args;
use shadowbox_core::clock::{format_elapsed, Clock};
use shadowbox_core::{Event, RoundStopwatch, SystemClock};

use super::live::{self, LiveSession};

#[derive(Args)]
pub struct StopwatchArgs {
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

struct StopwatchSession {
    clock: SystemClock,
    stopwatch: RoundStopwatch,
}

impl LiveSession for StopwatchSession {
    fn help(&self) -> &'static str {
        "l mark round, p pause, r resume, x reset, q quit (each followed by Enter)"
    }

    fn start(&mut self) -> Option<Event> {
        self.stopwatch.start(self.clock.now_ms())
    }

    fn pump(&mut self) -> Vec<Event> {
        Vec::new()
    }

    fn command(&mut self, input: &str) -> Result<Option<Event>, String> {
        let now = self.clock.now_ms();
        match input {
            "l" => Ok(self.stopwatch.mark_round(now)),
            "p" => Ok(self.stopwatch.pause(now)),
            "r" => Ok(self.stopwatch.resume(now)),
            "x" => {
                let event = self.stopwatch.reset(now);
                self.stopwatch.start(now);
                Ok(event)
            }
            "" => Ok(None),
            other => Err(format!("unknown command '{other}'")),
        }
    }

    fn stop(&mut self) -> Option<Event> {
        self.stopwatch.pause(self.clock.now_ms())
    }

    fn status(&self) -> String {
        let now = self.clock.now_ms();
        format!(
            "{}  round {} ({})",
            format_elapsed(self.stopwatch.elapsed_ms(now)),
            self.stopwatch.current_round(),
            format_elapsed(self.stopwatch.current_split_ms(now))
        )
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn ends_by_itself(&self) -> bool {
        false
    }
}

pub fn run(args: StopwatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = StopwatchSession {
        clock: SystemClock,
        stopwatch: RoundStopwatch::new(),
    };
    live::run(&mut session, args.json)?;

    let splits = session.stopwatch.splits();
    if args.json {
        println!("{}", serde_json::to_string(splits)?);
    } else {
        for split in splits {
            println!(
                "Round {:>2}  {}  ({})",
                split.round,
                format_elapsed(split.split_ms),
                format_elapsed(split.elapsed_ms)
            );
        }
    }
    Ok(())
}
