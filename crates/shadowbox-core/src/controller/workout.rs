use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CueOutputs;
use crate::clock::{format_mm_ss, local_date, to_datetime, Clock};
use crate::combo::{Combo, ComboGenerator, ComboMode, ComboScheduler, FireDecision, TOKEN_GAP_MS};
use crate::cues::{Cue, Haptic};
use crate::events::Event;
use crate::stats::{CompletionLog, CompletionStats};
use crate::storage::{MemoryStore, PersistenceStore};
use crate::timer::{
    Countdown, Phase, PhaseState, PhaseTimer, RawWorkoutSettings, TimerKey, TimerQueue,
    WorkoutConfig,
};

/// Read-only view of a workout for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSnapshot {
    pub state: PhaseState,
    /// Phase running or paused in.
    pub phase: Option<Phase>,
    pub remaining_ms: u64,
    /// `MM:SS`, partial seconds rounded up.
    pub remaining: String,
    pub round: u32,
    pub total_rounds: u32,
    pub combo: Option<String>,
    pub warning: bool,
    pub session_id: Option<Uuid>,
}

/// Owns one workout session: the phase timer, the combo schedule and
/// generator, the collaborators and the completion log.
pub struct WorkoutController {
    clock: Arc<dyn Clock>,
    queue: TimerQueue<TimerKey>,
    timer: PhaseTimer,
    scheduler: ComboScheduler,
    generator: Box<dyn ComboGenerator>,
    /// Mode the generator was built for; a config change away from it
    /// swaps the generator when the change takes effect.
    generator_mode: ComboMode,
    /// Set when the generator came from `with_generator`.
    custom_generator: bool,
    seed: Option<u64>,
    outputs: CueOutputs,
    store: Box<dyn PersistenceStore>,
    log: CompletionLog,
    session_id: Option<Uuid>,
    current_combo: Option<Combo>,
    combo_seq: u64,
}

impl WorkoutController {
    pub fn new(config: WorkoutConfig, clock: Arc<dyn Clock>) -> Self {
        let generator_mode = config.combo_mode;
        let generator = generator_mode.generator(None);
        Self {
            clock,
            queue: TimerQueue::new(),
            timer: PhaseTimer::new(config),
            scheduler: ComboScheduler::new(None),
            generator,
            generator_mode,
            custom_generator: false,
            seed: None,
            outputs: CueOutputs::default(),
            store: Box::new(MemoryStore::new()),
            log: CompletionLog::new(),
            session_id: None,
            current_combo: None,
            combo_seq: 0,
        }
    }

    pub fn with_outputs(mut self, outputs: CueOutputs) -> Self {
        self.outputs = outputs;
        self
    }

    /// Use `store` for the completion log and load what it already holds.
    pub fn with_store(mut self, store: Box<dyn PersistenceStore>) -> Self {
        self.log = CompletionLog::load(&*store);
        self.store = store;
        self
    }

    /// Install a custom generator. It is kept until the configured
    /// `combo_mode` changes, and `with_seed` leaves it alone.
    pub fn with_generator(mut self, generator: Box<dyn ComboGenerator>) -> Self {
        self.generator = generator;
        self.generator_mode = self.timer.config().combo_mode;
        self.custom_generator = true;
        self
    }

    /// Make combo selection and jitter reproducible. Generators built later
    /// for a new `combo_mode` reuse the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        if !self.custom_generator {
            self.generator = self.generator_mode.generator(Some(seed));
        }
        self.scheduler = ComboScheduler::new(Some(seed.wrapping_add(1)));
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> PhaseState {
        self.timer.state()
    }

    pub fn config(&self) -> &WorkoutConfig {
        self.timer.config()
    }

    pub fn round(&self) -> u32 {
        self.timer.round()
    }

    pub fn remaining_ms(&self) -> u64 {
        self.timer.remaining_ms(self.clock.now_ms())
    }

    pub fn current_combo(&self) -> Option<&Combo> {
        self.current_combo.as_ref()
    }

    pub fn completion_log(&self) -> &CompletionLog {
        &self.log
    }

    pub fn completion_stats(&self) -> CompletionStats {
        self.log.stats(local_date(self.clock.now_ms()))
    }

    pub fn wake_lock_held(&self) -> bool {
        self.outputs.wake_lock_held()
    }

    /// Entries still registered in the timer queue.
    pub fn pending_timers(&self) -> usize {
        self.queue.len()
    }

    pub fn snapshot(&self) -> WorkoutSnapshot {
        let now = self.clock.now_ms();
        let remaining_ms = self.timer.remaining_ms(now);
        WorkoutSnapshot {
            state: self.timer.state(),
            phase: self.timer.phase(),
            remaining_ms,
            remaining: format_mm_ss(remaining_ms),
            round: self.timer.round(),
            total_rounds: self.timer.total_rounds(),
            combo: self.current_combo.as_ref().map(Combo::display_text),
            warning: self.timer.in_warning(now),
            session_id: self.session_id,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the settings. Mid-session changes land at the next work phase.
    pub fn set_config(&mut self, config: WorkoutConfig) {
        self.timer.set_config(config);
    }

    /// Merge loosely-typed settings over the current ones, keeping the last
    /// good value for anything unreadable.
    pub fn update_config(&mut self, raw: &RawWorkoutSettings) {
        let merged = self.timer.config().merged(raw);
        self.timer.set_config(merged);
    }

    pub fn start(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let event = self.timer.start(now, &mut self.queue)?;
        self.session_id = Some(Uuid::new_v4());
        self.current_combo = None;
        self.sync_generator();
        self.generator.reset();
        self.outputs.wake().acquire();
        self.outputs.play(Cue::GetReady, true);
        self.outputs.pulse(Haptic::Medium);
        Some(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let event = self.timer.pause(now, &mut self.queue)?;
        self.scheduler.suspend(now, &mut self.queue);
        self.cancel_combo_tokens();
        self.outputs.pulse(Haptic::Light);
        Some(event)
    }

    pub fn resume(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let event = self.timer.resume(now, &mut self.queue)?;
        if self.timer.phase() == Some(Phase::Work) {
            self.scheduler.resume(now, &mut self.queue);
        }
        self.outputs.pulse(Haptic::Light);
        Some(event)
    }

    pub fn resync(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let event = self.timer.resync(now)?;
        self.outputs.pulse(Haptic::Light);
        Some(event)
    }

    pub fn stop(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let event = self.timer.stop(now, &mut self.queue);
        self.scheduler.cancel(&mut self.queue);
        self.queue.clear();
        self.current_combo = None;
        self.session_id = None;
        self.outputs.wake().release();
        event
    }

    /// The app was hidden or shown. The timer keeps running either way.
    pub fn on_visibility_change(&mut self, visible: bool) {
        let active = !matches!(self.timer.state(), PhaseState::Idle | PhaseState::Finished);
        self.outputs.wake().on_visibility_change(visible, active);
    }

    /// Process everything that has come due.
    pub fn pump(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        while let Some((_, key)) = self.queue.pop_due(now) {
            match key {
                TimerKey::PhaseTick => {
                    if let Some(event) = self.timer.tick(now, &mut self.queue) {
                        let follow_up = self.react(&event, now);
                        events.push(event);
                        events.extend(follow_up);
                    }
                }
                TimerKey::ComboFire => {
                    if let Some(event) = self.fire_combo(now) {
                        events.push(event);
                    }
                }
                TimerKey::ComboToken { seq, index } => self.speak_token(seq, index),
                TimerKey::BreathTick => {
                    tracing::debug!("stray breathing tick in workout queue");
                }
            }
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Side effects of a timer event. Returns the completion record when the
    /// workout just finished.
    fn react(&mut self, event: &Event, now: u64) -> Option<Event> {
        match event {
            Event::PhaseStarted {
                phase: Phase::Work,
                ..
            } => {
                self.current_combo = None;
                self.sync_generator();
                self.outputs.play(Cue::RoundStart, true);
                self.outputs.pulse(Haptic::Heavy);
                self.scheduler
                    .begin_work(now, self.timer.config(), &mut self.queue);
            }
            Event::PhaseStarted {
                phase: Phase::Rest,
                ..
            } => {
                self.end_combos();
                self.outputs.play(Cue::RoundEnd, true);
                self.outputs.pulse(Haptic::Heavy);
            }
            Event::CountdownCue { cue, .. } => {
                self.outputs.play(Cue::Countdown(*cue), true);
                let haptic = match cue {
                    Countdown::TenSeconds => Haptic::Medium,
                    _ => Haptic::Light,
                };
                self.outputs.pulse(haptic);
            }
            Event::WorkoutFinished { .. } => {
                self.end_combos();
                self.outputs.play(Cue::WorkoutComplete, true);
                self.outputs.pulse(Haptic::Success);
                self.outputs.wake().release();
                return Some(self.record_completion(now));
            }
            _ => {}
        }
        None
    }

    fn fire_combo(&mut self, now: u64) -> Option<Event> {
        if self.timer.state() != PhaseState::Work {
            return None;
        }
        let remaining_ms = self.timer.remaining_ms(now);
        let round = self.timer.round();
        match self.scheduler.on_fire(now, remaining_ms, &mut self.queue) {
            FireDecision::Skip => Some(Event::ComboSkipped {
                round,
                remaining_ms,
                at: to_datetime(now),
            }),
            FireDecision::Call => {
                let combo = self.generator.next_combo(self.timer.config().difficulty);
                self.cancel_combo_tokens();
                self.combo_seq += 1;
                if self.timer.config().voice_announcements {
                    for index in 0..combo.len() {
                        self.queue.schedule_once(
                            TimerKey::ComboToken {
                                seq: self.combo_seq,
                                index,
                            },
                            now + index as u64 * TOKEN_GAP_MS,
                        );
                    }
                }
                self.outputs.pulse(Haptic::Medium);
                let text = combo.display_text();
                tracing::info!(round, combo = %text, "combo called");
                self.current_combo = Some(combo.clone());
                Some(Event::ComboCalled {
                    combo,
                    display: text,
                    round,
                    at: to_datetime(now),
                })
            }
        }
    }

    /// Rebuild the generator if the active config selects another mode.
    fn sync_generator(&mut self) {
        let mode = self.timer.config().combo_mode;
        if mode == self.generator_mode {
            return;
        }
        tracing::debug!(?mode, "switching combo generator");
        self.generator = mode.generator(self.seed);
        self.generator_mode = mode;
        self.custom_generator = false;
    }

    fn speak_token(&mut self, seq: u64, index: usize) {
        if seq != self.combo_seq {
            return;
        }
        if let Some(m) = self.current_combo.as_ref().and_then(|c| c.moves.get(index)) {
            self.outputs.play(Cue::Move(*m), false);
        }
    }

    fn cancel_combo_tokens(&mut self) {
        self.queue
            .cancel_matching(|k| matches!(k, TimerKey::ComboToken { .. }));
    }

    fn end_combos(&mut self) {
        self.scheduler.cancel(&mut self.queue);
        self.cancel_combo_tokens();
        self.current_combo = None;
    }

    fn record_completion(&mut self, now: u64) -> Event {
        let date = local_date(now);
        if self.log.record(date) {
            if let Err(e) = self.log.save(self.store.as_mut()) {
                tracing::warn!(error = %e, "could not persist completion log");
            }
        }
        let current_streak = self.log.current_streak(date);
        let total_workouts = self.log.total_workouts();
        tracing::info!(%date, current_streak, total_workouts, "workout completion recorded");
        Event::CompletionRecorded {
            date,
            current_streak,
            total_workouts,
            at: to_datetime(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::combo::{library_for, Move};
    use crate::cues::{CountingWakeLock, Recorder};
    use crate::timer::{Difficulty, TICK_MS};

    fn controller(config: WorkoutConfig) -> (WorkoutController, ManualClock, Recorder) {
        let clock = ManualClock::new(1_700_000_000_000);
        let rec = Recorder::new();
        let outputs = CueOutputs::new(
            Arc::new(rec.clone()),
            Arc::new(rec.clone()),
            Box::new(CountingWakeLock::new()),
        );
        let ctl = WorkoutController::new(config, Arc::new(clock.clone()))
            .with_outputs(outputs)
            .with_seed(11);
        (ctl, clock, rec)
    }

    fn step(ctl: &mut WorkoutController, clock: &ManualClock, ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        let mut left = ms;
        while left > 0 {
            let dt = left.min(TICK_MS);
            clock.advance(dt);
            left -= dt;
            events.extend(ctl.pump());
        }
        events
    }

    #[test]
    fn combos_are_called_during_work_only() {
        let cfg = WorkoutConfig {
            round_secs: 60,
            rest_secs: 20,
            total_rounds: 2,
            ..WorkoutConfig::default()
        };
        let (mut ctl, clock, _rec) = controller(cfg);
        ctl.start();
        let events = step(&mut ctl, &clock, 3_000 + 60_000 + 20_000 + 60_000 + 100);
        let mut in_work = false;
        let mut calls = 0;
        for e in &events {
            match e {
                Event::PhaseStarted { phase, .. } => in_work = *phase == Phase::Work,
                Event::WorkoutFinished { .. } => in_work = false,
                Event::ComboCalled { .. } => {
                    assert!(in_work, "combo called outside work");
                    calls += 1;
                }
                _ => {}
            }
        }
        assert!(calls >= 2 * 6, "only {calls} combos called");
        assert_eq!(ctl.state(), PhaseState::Finished);
        assert_eq!(ctl.pending_timers(), 0);
    }

    #[test]
    fn first_combo_follows_settle_delay_and_is_spoken() {
        let (mut ctl, clock, rec) = controller(WorkoutConfig::default());
        ctl.start();
        step(&mut ctl, &clock, 3_000);
        assert_eq!(ctl.state(), PhaseState::Work);
        rec.clear();
        let events = step(&mut ctl, &clock, 1_950);
        assert!(!events.iter().any(|e| matches!(e, Event::ComboCalled { .. })));
        let events = step(&mut ctl, &clock, 100);
        assert!(events.iter().any(|e| matches!(e, Event::ComboCalled { .. })));
        let combo = ctl.current_combo().cloned().unwrap();
        step(&mut ctl, &clock, TOKEN_GAP_MS * combo.len() as u64);
        let spoken: Vec<Cue> = rec
            .cues()
            .into_iter()
            .filter(|(_, priority)| !priority)
            .map(|(c, _)| c)
            .collect();
        let expected: Vec<Cue> = combo.moves.iter().map(|m| Cue::Move(*m)).collect();
        assert_eq!(spoken, expected);
        assert!(rec.pulses().contains(&Haptic::Medium));
    }

    #[test]
    fn voice_off_suppresses_tokens_but_keeps_bells() {
        let cfg = WorkoutConfig {
            voice_announcements: false,
            ..WorkoutConfig::default()
        };
        let (mut ctl, clock, rec) = controller(cfg);
        ctl.start();
        step(&mut ctl, &clock, 20_000);
        assert!(ctl.current_combo().is_some());
        assert!(rec.cues().iter().all(|(_, priority)| *priority));
        assert!(rec.cues().contains(&(Cue::RoundStart, true)));
    }

    #[test]
    fn pause_suspends_combos_and_resume_restores_them() {
        let (mut ctl, clock, _rec) = controller(WorkoutConfig::default());
        ctl.start();
        step(&mut ctl, &clock, 4_000);
        ctl.pause();
        assert_eq!(ctl.pending_timers(), 0);
        let events = step(&mut ctl, &clock, 120_000);
        assert!(events.is_empty());
        ctl.resume();
        assert_eq!(ctl.state(), PhaseState::Work);
        let events = step(&mut ctl, &clock, 2_000);
        assert!(events.iter().any(|e| matches!(e, Event::ComboCalled { .. })));
    }

    #[test]
    fn stop_clears_every_scheduled_entry() {
        let (mut ctl, clock, _rec) = controller(WorkoutConfig::default());
        ctl.start();
        step(&mut ctl, &clock, 7_000);
        assert!(ctl.pending_timers() > 0);
        assert!(ctl.stop().is_some());
        assert_eq!(ctl.pending_timers(), 0);
        assert_eq!(ctl.snapshot().round, 0);
        assert!(ctl.snapshot().combo.is_none());
        assert!(step(&mut ctl, &clock, 60_000).is_empty());
        assert!(!ctl.wake_lock_held());
    }

    #[test]
    fn finishing_records_completion_once() {
        let cfg = WorkoutConfig {
            round_secs: 10,
            rest_secs: 0,
            total_rounds: 1,
            ..WorkoutConfig::default()
        };
        let (mut ctl, clock, rec) = controller(cfg);
        ctl.start();
        let events = step(&mut ctl, &clock, 14_000);
        let finished = events
            .iter()
            .filter(|e| matches!(e, Event::WorkoutFinished { .. }))
            .count();
        let recorded = events
            .iter()
            .filter(|e| matches!(e, Event::CompletionRecorded { .. }))
            .count();
        assert_eq!((finished, recorded), (1, 1));
        assert_eq!(ctl.completion_log().total_workouts(), 1);
        assert!(rec.pulses().contains(&Haptic::Success));

        // Same day again: still one logged date.
        ctl.start();
        step(&mut ctl, &clock, 14_000);
        assert_eq!(ctl.completion_log().total_workouts(), 1);
        assert_eq!(ctl.completion_stats().current_streak, 1);
    }

    #[test]
    fn unreadable_settings_keep_previous_values() {
        let (mut ctl, _clock, _rec) = controller(WorkoutConfig::default());
        ctl.update_config(&RawWorkoutSettings {
            round_secs: Some(f64::NAN),
            rest_secs: Some(0.0),
            total_rounds: Some(-2.0),
            combo_interval_secs: Some(f64::INFINITY),
            ..RawWorkoutSettings::default()
        });
        let cfg = ctl.config();
        assert_eq!(cfg.round_secs, 180);
        assert_eq!(cfg.rest_secs, 0);
        assert_eq!(cfg.total_rounds, 3);
        assert_eq!(cfg.combo_interval_secs, 6);
    }

    #[test]
    fn snapshot_formats_remaining_time() {
        let (mut ctl, clock, _rec) = controller(WorkoutConfig::default());
        ctl.start();
        step(&mut ctl, &clock, 3_000);
        let snap = ctl.snapshot();
        assert_eq!(snap.state, PhaseState::Work);
        assert_eq!(snap.remaining, "03:00");
        assert_eq!((snap.round, snap.total_rounds), (1, 3));
        assert!(!snap.warning);
        assert!(snap.session_id.is_some());
    }

    #[test]
    fn wake_lock_follows_session_and_visibility() {
        let clock = ManualClock::new(0);
        let lock = CountingWakeLock::new();
        let outputs = CueOutputs::new(
            Arc::new(Recorder::new()),
            Arc::new(Recorder::new()),
            Box::new(lock.clone()),
        );
        let mut ctl = WorkoutController::new(WorkoutConfig::default(), Arc::new(clock.clone()))
            .with_outputs(outputs);
        ctl.on_visibility_change(true);
        assert_eq!(lock.counts().requests, 0);
        ctl.start();
        assert!(ctl.wake_lock_held());
        ctl.on_visibility_change(false);
        ctl.on_visibility_change(true);
        assert_eq!(lock.counts().requests, 2);
        ctl.stop();
        assert!(!lock.counts().held);
    }

    #[test]
    fn wake_lock_failure_is_not_fatal() {
        let clock = ManualClock::new(0);
        let lock = CountingWakeLock::new();
        lock.set_failing(true);
        let outputs = CueOutputs::new(
            Arc::new(Recorder::new()),
            Arc::new(Recorder::new()),
            Box::new(lock.clone()),
        );
        let mut ctl = WorkoutController::new(WorkoutConfig::default(), Arc::new(clock.clone()))
            .with_outputs(outputs);
        assert!(ctl.start().is_some());
        assert!(!ctl.wake_lock_held());
        clock.advance(3_000);
        ctl.pump();
        assert_eq!(ctl.state(), PhaseState::Work);
    }

    fn called(events: &[Event]) -> Vec<Combo> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::ComboCalled { combo, .. } => Some(combo.clone()),
                _ => None,
            })
            .collect()
    }

    fn in_library(combo: &Combo) -> bool {
        library_for(Difficulty::Medium)
            .iter()
            .any(|entry| *entry == combo.moves.as_slice())
    }

    #[test]
    fn combo_mode_change_switches_the_generator() {
        let cfg = WorkoutConfig {
            round_secs: 60,
            rest_secs: 10,
            total_rounds: 2,
            ..WorkoutConfig::default()
        };
        let (mut ctl, clock, _rec) = controller(cfg);
        ctl.start();
        let first = step(&mut ctl, &clock, 3_000 + 30_000);
        ctl.update_config(&RawWorkoutSettings {
            combo_mode: Some(ComboMode::Procedural),
            ..RawWorkoutSettings::default()
        });
        let rest_of_round = step(&mut ctl, &clock, 30_000);
        let library_round: Vec<Combo> = called(&first)
            .into_iter()
            .chain(called(&rest_of_round))
            .collect();
        assert!(!library_round.is_empty());
        assert!(library_round.iter().all(in_library));

        let second = called(&step(&mut ctl, &clock, 10_000 + 60_000 + 100));
        assert!(!second.is_empty());
        assert!(second.iter().any(|c| !in_library(c)), "{second:?}");
        assert_eq!(ctl.config().combo_mode, ComboMode::Procedural);
    }

    #[test]
    fn mode_chosen_while_idle_applies_at_start() {
        let (mut ctl, clock, _rec) = controller(WorkoutConfig::default());
        ctl.update_config(&RawWorkoutSettings {
            combo_mode: Some(ComboMode::Procedural),
            ..RawWorkoutSettings::default()
        });
        ctl.start();
        let combos = called(&step(&mut ctl, &clock, 60_000));
        assert!(combos.iter().any(|c| !in_library(c)), "{combos:?}");
    }

    struct Jab;

    impl ComboGenerator for Jab {
        fn next_combo(&mut self, _tier: Difficulty) -> Combo {
            Combo::new(vec![Move::Punch(1)])
        }
    }

    #[test]
    fn seeding_keeps_an_installed_generator() {
        let clock = ManualClock::new(0);
        let mut ctl = WorkoutController::new(WorkoutConfig::default(), Arc::new(clock.clone()))
            .with_generator(Box::new(Jab))
            .with_seed(4);
        ctl.start();
        let combos = called(&step(&mut ctl, &clock, 20_000));
        assert!(!combos.is_empty());
        assert!(combos.iter().all(|c| c.moves == vec![Move::Punch(1)]));
    }

    #[test]
    fn stop_after_hide_releases_the_wake_lock() {
        let clock = ManualClock::new(0);
        let lock = CountingWakeLock::new();
        let outputs = CueOutputs::new(
            Arc::new(Recorder::new()),
            Arc::new(Recorder::new()),
            Box::new(lock.clone()),
        );
        let mut ctl = WorkoutController::new(WorkoutConfig::default(), Arc::new(clock.clone()))
            .with_outputs(outputs);
        ctl.start();
        ctl.on_visibility_change(false);
        assert!(!ctl.wake_lock_held());
        ctl.stop();
        let counts = lock.counts();
        assert_eq!((counts.requests, counts.releases), (1, 1));
        assert!(!counts.held);
    }
}
