//! Collaborators the controllers talk to: audio, haptics and the screen wake
//! lock. All of them are best effort; nothing here can stall a timer.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::breathing::BreathKind;
use crate::combo::Move;
use crate::error::WakeLockError;
use crate::timer::Countdown;

/// An audio cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "cue", content = "value", rename_all = "snake_case")]
pub enum Cue {
    GetReady,
    /// Bell at the start of a work phase.
    RoundStart,
    /// Bell at the end of a work phase.
    RoundEnd,
    Countdown(Countdown),
    Move(Move),
    Breath(BreathKind),
    BreathingComplete,
    WorkoutComplete,
}

impl Cue {
    /// Asset id the audio layer resolves.
    pub fn id(&self) -> &'static str {
        match self {
            Cue::GetReady => "get-ready",
            Cue::RoundStart => "bell-start",
            Cue::RoundEnd => "bell-end",
            Cue::Countdown(Countdown::TenSeconds) => "ten-seconds",
            Cue::Countdown(_) => "beep",
            Cue::Move(m) => m.cue_id(),
            Cue::Breath(kind) => kind.cue_id(),
            Cue::BreathingComplete => "breathing-complete",
            Cue::WorkoutComplete => "workout-complete",
        }
    }
}

/// Plays audio cues.
///
/// A priority cue preempts whatever is currently playing; other cues are
/// best effort and may be dropped. Playback failures are the implementor's
/// to log and swallow.
pub trait AudioCueEmitter: Send + Sync {
    fn play(&self, cue: Cue, priority: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Haptic {
    Light,
    Medium,
    Heavy,
    Success,
}

/// Fire-and-forget vibration.
pub trait HapticEmitter: Send + Sync {
    fn pulse(&self, haptic: Haptic);
}

/// Keeps the screen awake while a session runs.
pub trait WakeLock: Send {
    fn request(&mut self) -> Result<(), WakeLockError>;
    fn release(&mut self);
}

/// Audio sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl AudioCueEmitter for Silent {
    fn play(&self, _cue: Cue, _priority: bool) {}
}

/// Haptics for devices without a vibration motor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl HapticEmitter for NoHaptics {
    fn pulse(&self, _haptic: Haptic) {}
}

/// Wake lock for platforms without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWakeLock;

impl WakeLock for NoWakeLock {
    fn request(&mut self) -> Result<(), WakeLockError> {
        Ok(())
    }

    fn release(&mut self) {}
}

/// Captures cues and pulses in memory, for headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    cues: Arc<Mutex<Vec<(Cue, bool)>>>,
    pulses: Arc<Mutex<Vec<Haptic>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cues played so far with their priority flag.
    pub fn cues(&self) -> Vec<(Cue, bool)> {
        self.cues.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn pulses(&self) -> Vec<Haptic> {
        self.pulses.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut c) = self.cues.lock() {
            c.clear();
        }
        if let Ok(mut p) = self.pulses.lock() {
            p.clear();
        }
    }
}

impl AudioCueEmitter for Recorder {
    fn play(&self, cue: Cue, priority: bool) {
        if let Ok(mut cues) = self.cues.lock() {
            cues.push((cue, priority));
        }
    }
}

impl HapticEmitter for Recorder {
    fn pulse(&self, haptic: Haptic) {
        if let Ok(mut pulses) = self.pulses.lock() {
            pulses.push(haptic);
        }
    }
}

/// Wake lock that counts requests and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct CountingWakeLock {
    inner: Arc<Mutex<WakeLockCounts>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WakeLockCounts {
    pub requests: u32,
    pub releases: u32,
    pub held: bool,
    pub fail_requests: bool,
}

impl CountingWakeLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> WakeLockCounts {
        self.inner.lock().map(|c| *c).unwrap_or_default()
    }

    pub fn set_failing(&self, fail: bool) {
        if let Ok(mut c) = self.inner.lock() {
            c.fail_requests = fail;
        }
    }
}

impl WakeLock for CountingWakeLock {
    fn request(&mut self) -> Result<(), WakeLockError> {
        let mut c = self
            .inner
            .lock()
            .map_err(|_| WakeLockError::Unavailable("lock poisoned".into()))?;
        c.requests += 1;
        if c.fail_requests {
            return Err(WakeLockError::Denied("request refused".into()));
        }
        c.held = true;
        Ok(())
    }

    fn release(&mut self) {
        if let Ok(mut c) = self.inner.lock() {
            c.releases += 1;
            c.held = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_ids() {
        assert_eq!(Cue::Countdown(Countdown::TenSeconds).id(), "ten-seconds");
        assert_eq!(Cue::Countdown(Countdown::Two).id(), "beep");
        assert_eq!(Cue::Move(Move::Punch(2)).id(), "cross");
        assert_eq!(Cue::Breath(BreathKind::HoldOut).id(), "hold");
    }

    #[test]
    fn recorder_clones_share_storage() {
        let rec = Recorder::new();
        let audio: Arc<dyn AudioCueEmitter> = Arc::new(rec.clone());
        audio.play(Cue::RoundStart, true);
        assert_eq!(rec.cues(), vec![(Cue::RoundStart, true)]);
        rec.clear();
        assert!(rec.cues().is_empty());
    }

    #[test]
    fn counting_wake_lock_reports_failures() {
        let mut lock = CountingWakeLock::new();
        lock.set_failing(true);
        assert!(lock.request().is_err());
        lock.set_failing(false);
        assert!(lock.request().is_ok());
        lock.release();
        let c = lock.counts();
        assert_eq!((c.requests, c.releases, c.held), (2, 1, false));
    }
}
