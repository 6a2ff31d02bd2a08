use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::CueOutputs;
use crate::breathing::{BreathKind, BreathingRunner, BreathingState, Exercise, RingState};
use crate::clock::Clock;
use crate::cues::{Cue, Haptic};
use crate::events::Event;
use crate::timer::{TimerKey, TimerQueue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathingSnapshot {
    pub state: BreathingState,
    pub exercise: Exercise,
    pub phase: BreathKind,
    pub ring: RingState,
    pub phase_remaining_secs: u32,
    /// Completed cycles.
    pub cycle: u32,
    pub total_cycles: u32,
}

/// Drives a guided breathing session.
pub struct BreathingController {
    clock: Arc<dyn Clock>,
    queue: TimerQueue<TimerKey>,
    runner: BreathingRunner,
    outputs: CueOutputs,
}

impl BreathingController {
    pub fn new(exercise: Exercise, cycles: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            queue: TimerQueue::new(),
            runner: BreathingRunner::new(exercise, cycles),
            outputs: CueOutputs::default(),
        }
    }

    pub fn with_outputs(mut self, outputs: CueOutputs) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn state(&self) -> BreathingState {
        self.runner.state()
    }

    pub fn wake_lock_held(&self) -> bool {
        self.outputs.wake_lock_held()
    }

    pub fn pending_timers(&self) -> usize {
        self.queue.len()
    }

    pub fn snapshot(&self) -> BreathingSnapshot {
        let phase = self.runner.current_phase();
        BreathingSnapshot {
            state: self.runner.state(),
            exercise: self.runner.exercise(),
            phase: phase.kind,
            ring: phase.ring,
            phase_remaining_secs: self.runner.phase_remaining_secs(),
            cycle: self.runner.current_cycle(),
            total_cycles: self.runner.total_cycles(),
        }
    }

    /// Pick a different exercise or cycle count. Rejected mid-session.
    pub fn configure(&mut self, exercise: Exercise, cycles: u32) -> bool {
        self.runner.configure(exercise, cycles)
    }

    pub fn start(&mut self) -> Option<Event> {
        let event = self.runner.start(self.clock.now_ms(), &mut self.queue)?;
        self.outputs.wake().acquire();
        self.announce(self.runner.current_phase().kind);
        Some(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.runner.pause(self.clock.now_ms(), &mut self.queue)
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.runner.resume(self.clock.now_ms(), &mut self.queue)
    }

    pub fn stop(&mut self) -> Option<Event> {
        let event = self.runner.stop(self.clock.now_ms(), &mut self.queue);
        self.queue.clear();
        self.outputs.wake().release();
        event
    }

    pub fn on_visibility_change(&mut self, visible: bool) {
        let active = matches!(
            self.runner.state(),
            BreathingState::Running | BreathingState::Paused
        );
        self.outputs.wake().on_visibility_change(visible, active);
    }

    pub fn pump(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        while let Some((_, key)) = self.queue.pop_due(now) {
            if key != TimerKey::BreathTick {
                tracing::debug!(?key, "stray entry in breathing queue");
                continue;
            }
            for event in self.runner.tick(now, &mut self.queue) {
                match &event {
                    Event::BreathingPhaseAdvanced {
                        next: Some(next), ..
                    } => self.announce(*next),
                    Event::BreathingCompleted { .. } => {
                        self.outputs.play(Cue::BreathingComplete, true);
                        self.outputs.pulse(Haptic::Success);
                        self.outputs.wake().release();
                    }
                    _ => {}
                }
                events.push(event);
            }
        }
        events
    }

    fn announce(&self, kind: BreathKind) {
        self.outputs.play(Cue::Breath(kind), true);
        self.outputs.pulse(Haptic::Light);
    }
}
