//! Breathing cycle runner.
//!
//! Unlike the workout timer this one counts whole-second ticks; breathing
//! guidance does not need sub-second accuracy.

use serde::{Deserialize, Serialize};

use super::pattern::{BreathPhase, Exercise};
use crate::clock::to_datetime;
use crate::events::Event;
use crate::timer::{TimerHandle, TimerKey, TimerQueue};

pub const BREATH_TICK_MS: u64 = 1_000;
pub const MAX_CYCLES: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreathingState {
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Clone)]
pub struct BreathingRunner {
    exercise: Exercise,
    total_cycles: u32,
    current_cycle: u32,
    phase_index: usize,
    phase_remaining_secs: u32,
    state: BreathingState,
    tick: Option<TimerHandle>,
}

impl BreathingRunner {
    /// `total_cycles` is clamped to 1..=20.
    pub fn new(exercise: Exercise, total_cycles: u32) -> Self {
        Self {
            exercise,
            total_cycles: total_cycles.clamp(1, MAX_CYCLES),
            current_cycle: 0,
            phase_index: 0,
            phase_remaining_secs: exercise.pattern()[0].secs,
            state: BreathingState::Idle,
            tick: None,
        }
    }

    pub fn exercise(&self) -> Exercise {
        self.exercise
    }

    pub fn state(&self) -> BreathingState {
        self.state
    }

    /// Completed cycles.
    pub fn current_cycle(&self) -> u32 {
        self.current_cycle
    }

    pub fn total_cycles(&self) -> u32 {
        self.total_cycles
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn current_phase(&self) -> BreathPhase {
        self.exercise.pattern()[self.phase_index]
    }

    pub fn phase_remaining_secs(&self) -> u32 {
        self.phase_remaining_secs
    }

    /// Change the exercise or cycle count. Only allowed while not running.
    pub fn configure(&mut self, exercise: Exercise, total_cycles: u32) -> bool {
        if matches!(self.state, BreathingState::Running | BreathingState::Paused) {
            return false;
        }
        *self = Self::new(exercise, total_cycles);
        true
    }

    pub fn start(&mut self, now_ms: u64, queue: &mut TimerQueue<TimerKey>) -> Option<Event> {
        if !matches!(self.state, BreathingState::Idle | BreathingState::Completed) {
            tracing::debug!(state = ?self.state, "breathing start ignored");
            return None;
        }
        self.current_cycle = 0;
        self.phase_index = 0;
        self.phase_remaining_secs = self.current_phase().secs;
        self.state = BreathingState::Running;
        self.schedule_tick(now_ms, queue);
        tracing::info!(exercise = ?self.exercise, cycles = self.total_cycles, "breathing started");
        Some(Event::BreathingStarted {
            exercise: self.exercise,
            total_cycles: self.total_cycles,
            at: to_datetime(now_ms),
        })
    }

    pub fn pause(&mut self, now_ms: u64, queue: &mut TimerQueue<TimerKey>) -> Option<Event> {
        if self.state != BreathingState::Running {
            return None;
        }
        self.state = BreathingState::Paused;
        self.cancel_tick(queue);
        Some(Event::BreathingPaused {
            at: to_datetime(now_ms),
        })
    }

    pub fn resume(&mut self, now_ms: u64, queue: &mut TimerQueue<TimerKey>) -> Option<Event> {
        if self.state != BreathingState::Paused {
            return None;
        }
        self.state = BreathingState::Running;
        self.schedule_tick(now_ms, queue);
        Some(Event::BreathingResumed {
            at: to_datetime(now_ms),
        })
    }

    pub fn stop(&mut self, now_ms: u64, queue: &mut TimerQueue<TimerKey>) -> Option<Event> {
        self.cancel_tick(queue);
        let was_active = matches!(self.state, BreathingState::Running | BreathingState::Paused);
        *self = Self::new(self.exercise, self.total_cycles);
        was_active.then(|| Event::BreathingStopped {
            at: to_datetime(now_ms),
        })
    }

    /// One-second tick. Returns the phase advance and, after the last phase
    /// of the last cycle, the completion.
    pub fn tick(&mut self, now_ms: u64, queue: &mut TimerQueue<TimerKey>) -> Vec<Event> {
        if self.state != BreathingState::Running {
            return Vec::new();
        }
        self.phase_remaining_secs = self.phase_remaining_secs.saturating_sub(1);
        if self.phase_remaining_secs > 0 {
            return Vec::new();
        }

        let at = to_datetime(now_ms);
        let completed = self.current_phase().kind;
        let cycle = self.current_cycle + 1;
        let pattern = self.exercise.pattern();

        self.phase_index += 1;
        if self.phase_index == pattern.len() {
            self.phase_index = 0;
            self.current_cycle += 1;
        }

        if self.current_cycle >= self.total_cycles {
            self.state = BreathingState::Completed;
            self.phase_index = pattern.len() - 1;
            self.cancel_tick(queue);
            tracing::info!(cycles = self.current_cycle, "breathing completed");
            return vec![
                Event::BreathingPhaseAdvanced {
                    cycle,
                    completed,
                    next: None,
                    at,
                },
                Event::BreathingCompleted {
                    exercise: self.exercise,
                    cycles: self.current_cycle,
                    at,
                },
            ];
        }

        let next = self.current_phase();
        self.phase_remaining_secs = next.secs;
        vec![Event::BreathingPhaseAdvanced {
            cycle,
            completed,
            next: Some(next.kind),
            at,
        }]
    }

    fn schedule_tick(&mut self, now_ms: u64, queue: &mut TimerQueue<TimerKey>) {
        self.cancel_tick(queue);
        self.tick = Some(queue.schedule_repeating(
            TimerKey::BreathTick,
            now_ms + BREATH_TICK_MS,
            BREATH_TICK_MS,
        ));
    }

    fn cancel_tick(&mut self, queue: &mut TimerQueue<TimerKey>) {
        if let Some(handle) = self.tick.take() {
            queue.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breathing::BreathKind;

    fn run_to_completion(runner: &mut BreathingRunner) -> Vec<Event> {
        let mut q = TimerQueue::new();
        let mut events = Vec::new();
        let mut now = 0;
        runner.start(now, &mut q);
        while runner.state() == BreathingState::Running {
            now += BREATH_TICK_MS;
            while let Some((_, key)) = q.pop_due(now) {
                assert_eq!(key, TimerKey::BreathTick);
                events.extend(runner.tick(now, &mut q));
            }
        }
        assert!(q.is_empty());
        events
    }

    #[test]
    fn box_three_cycles_has_twelve_advances() {
        let mut runner = BreathingRunner::new(Exercise::Box, 3);
        let events = run_to_completion(&mut runner);
        let advances = events
            .iter()
            .filter(|e| matches!(e, Event::BreathingPhaseAdvanced { .. }))
            .count();
        assert_eq!(advances, 12);
        assert!(matches!(
            events.last(),
            Some(Event::BreathingCompleted { cycles: 3, .. })
        ));
        assert_eq!(runner.current_cycle(), 3);
    }

    #[test]
    fn phases_wrap_in_pattern_order() {
        let mut runner = BreathingRunner::new(Exercise::FourSevenEight, 2);
        let events = run_to_completion(&mut runner);
        let completed: Vec<BreathKind> = events
            .iter()
            .filter_map(|e| match e {
                Event::BreathingPhaseAdvanced { completed, .. } => Some(*completed),
                _ => None,
            })
            .collect();
        assert_eq!(
            completed,
            vec![
                BreathKind::Inhale,
                BreathKind::Hold,
                BreathKind::Exhale,
                BreathKind::Inhale,
                BreathKind::Hold,
                BreathKind::Exhale,
            ]
        );
    }

    #[test]
    fn pause_cancels_tick_and_freezes_countdown() {
        let mut q = TimerQueue::new();
        let mut runner = BreathingRunner::new(Exercise::Resonant, 1);
        runner.start(0, &mut q);
        q.pop_due(1_000);
        runner.tick(1_000, &mut q);
        assert_eq!(runner.phase_remaining_secs(), 4);
        assert!(runner.pause(1_500, &mut q).is_some());
        assert!(q.is_empty());
        assert!(runner.tick(2_000, &mut q).is_empty());
        assert_eq!(runner.phase_remaining_secs(), 4);
        assert!(runner.resume(9_000, &mut q).is_some());
        assert_eq!(q.next_due_ms(), Some(10_000));
    }

    #[test]
    fn cycles_are_clamped() {
        assert_eq!(BreathingRunner::new(Exercise::Box, 0).total_cycles(), 1);
        assert_eq!(BreathingRunner::new(Exercise::Box, 99).total_cycles(), 20);
    }

    #[test]
    fn stop_resets_and_is_idempotent() {
        let mut q = TimerQueue::new();
        let mut runner = BreathingRunner::new(Exercise::Box, 2);
        assert!(runner.stop(0, &mut q).is_none());
        runner.start(0, &mut q);
        assert!(runner.stop(500, &mut q).is_some());
        assert!(q.is_empty());
        assert_eq!(runner.state(), BreathingState::Idle);
        assert_eq!(runner.current_cycle(), 0);
    }
}
