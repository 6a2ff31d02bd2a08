//! Shared driver for interactive sessions.
//!
//! A session is pumped on a 50 ms interval while single-letter commands are
//! read from stdin. Events go to stdout (JSON lines with `--json`); the
//! status line and bells go to stderr.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use shadowbox_core::clock::{format_elapsed, format_mm_ss};
use shadowbox_core::cues::NoWakeLock;
use shadowbox_core::storage::AudioConfig;
use shadowbox_core::{AudioCueEmitter, Cue, CueOutputs, Event, Haptic, HapticEmitter, Phase};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

const PUMP_INTERVAL: Duration = Duration::from_millis(50);

pub trait LiveSession {
    /// Key help printed before the session starts.
    fn help(&self) -> &'static str;
    fn start(&mut self) -> Option<Event>;
    fn pump(&mut self) -> Vec<Event>;
    /// Handle one stdin command other than `q`.
    fn command(&mut self, input: &str) -> Result<Option<Event>, String>;
    fn stop(&mut self) -> Option<Event>;
    fn status(&self) -> String;
    fn is_finished(&self) -> bool;

    /// Whether the session ends without user input. Sessions that don't are
    /// stopped once stdin closes.
    fn ends_by_itself(&self) -> bool {
        true
    }
}

/// Rings the terminal bell for priority cues.
pub struct TerminalCues;

impl AudioCueEmitter for TerminalCues {
    fn play(&self, cue: Cue, priority: bool) {
        if !priority {
            return;
        }
        let mut err = std::io::stderr();
        if let Err(e) = err.write_all(b"\x07").and_then(|_| err.flush()) {
            tracing::warn!(cue = cue.id(), error = %e, "could not ring terminal bell");
        }
    }
}

/// A terminal can't vibrate; pulses only show up in the debug log.
pub struct TerminalHaptics;

impl HapticEmitter for TerminalHaptics {
    fn pulse(&self, haptic: Haptic) {
        tracing::debug!(?haptic, "haptic pulse");
    }
}

/// Terminal collaborators, gated by the `[audio]` config section. There is no
/// wake lock to take from a terminal.
pub fn terminal_outputs(config: &AudioConfig) -> CueOutputs {
    CueOutputs::configured(
        config,
        Arc::new(TerminalCues),
        Arc::new(TerminalHaptics),
        Box::new(NoWakeLock),
    )
}

/// Run `session` until it finishes or the user quits.
pub fn run<S: LiveSession>(session: &mut S, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(drive(session, json));
    // A pending stdin read would otherwise hold the runtime open.
    rt.shutdown_background();
    result
}

async fn drive<S: LiveSession>(session: &mut S, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !json {
        eprintln!("{}", session.help());
    }
    if let Some(event) = session.start() {
        emit(&event, json)?;
    }

    let mut interval = tokio::time::interval(PUMP_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut last_status = String::new();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                for event in session.pump() {
                    emit(&event, json)?;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => {
                        let input = line.trim();
                        if input == "q" {
                            if let Some(event) = session.stop() {
                                emit(&event, json)?;
                            }
                            break;
                        }
                        match session.command(input) {
                            Ok(Some(event)) => emit(&event, json)?,
                            Ok(None) => tracing::debug!(input, "command had no effect"),
                            Err(message) => eprintln!("{message}"),
                        }
                    }
                    None => {
                        stdin_open = false;
                        if !session.ends_by_itself() {
                            tracing::debug!("stdin closed; stopping session");
                            if let Some(event) = session.stop() {
                                emit(&event, json)?;
                            }
                            break;
                        }
                    }
                }
            }
        }

        if session.is_finished() {
            break;
        }
        if !json {
            let status = session.status();
            if status != last_status {
                eprint!("\r{status}   ");
                last_status = status;
            }
        }
    }
    if !json {
        eprintln!();
    }
    Ok(())
}

fn emit(event: &Event, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(event)?);
    } else if let Some(line) = describe(event) {
        eprint!("\r");
        println!("{line}");
    }
    Ok(())
}

/// Human-readable line for an event, if it deserves one.
pub fn describe(event: &Event) -> Option<String> {
    let line = match event {
        Event::PhaseStarted {
            phase,
            round,
            total_rounds,
            duration_ms,
            ..
        } => match phase {
            Phase::Prepare => format!("Get ready ({})", format_mm_ss(*duration_ms)),
            Phase::Work => format!(
                "Round {round}/{total_rounds} ({})",
                format_mm_ss(*duration_ms)
            ),
            Phase::Rest => format!("Rest ({})", format_mm_ss(*duration_ms)),
        },
        Event::ComboCalled { display, .. } => format!("  {display}"),
        Event::TimerPaused { remaining_ms, .. } => {
            format!("Paused at {}", format_mm_ss(*remaining_ms))
        }
        Event::TimerResumed { .. } | Event::BreathingResumed { .. } => "Resumed".to_string(),
        Event::TimerResynced { remaining_ms, .. } => {
            format!("Resynced to {}", format_mm_ss(*remaining_ms))
        }
        Event::TimerStopped { .. } | Event::BreathingStopped { .. } => "Stopped".to_string(),
        Event::WorkoutFinished { rounds, .. } => format!("Workout complete: {rounds} rounds"),
        Event::CompletionRecorded {
            current_streak,
            total_workouts,
            ..
        } => format!("Streak: {current_streak} day(s), {total_workouts} workout(s) total"),
        Event::BreathingStarted {
            exercise,
            total_cycles,
            ..
        } => format!("{} x{total_cycles}", exercise.label()),
        Event::BreathingPhaseAdvanced {
            next: Some(next), ..
        } => format!("  {}", next.name()),
        Event::BreathingPaused { .. } => "Paused".to_string(),
        Event::BreathingCompleted { cycles, .. } => format!("Breathing complete: {cycles} cycles"),
        Event::StopwatchStarted { .. } => "Stopwatch started".to_string(),
        Event::StopwatchPaused { elapsed_ms, .. } => {
            format!("Paused at {}", format_elapsed(*elapsed_ms))
        }
        Event::StopwatchResumed { .. } => "Resumed".to_string(),
        Event::RoundMarked {
            round, split_ms, ..
        } => format!("Round {round}: {}", format_elapsed(*split_ms)),
        Event::StopwatchReset { .. } => "Reset".to_string(),
        Event::CountdownCue { .. }
        | Event::ComboSkipped { .. }
        | Event::BreathingPhaseAdvanced { next: None, .. } => return None,
    };
    Some(line)
}
