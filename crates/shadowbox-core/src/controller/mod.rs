//! Session orchestration.
//!
//! Controllers own everything a session needs (clock, timer queue, timers,
//! collaborators) and are the only place state changes happen. Front-ends
//! issue commands and call `pump()` on a short interval; each call processes
//! every queue entry that has come due and returns the resulting events.

mod breathing;
mod workout;

use std::sync::Arc;

pub use breathing::{BreathingController, BreathingSnapshot};
pub use workout::{WorkoutController, WorkoutSnapshot};

use crate::cues::{AudioCueEmitter, Cue, Haptic, HapticEmitter, NoHaptics, NoWakeLock, Silent, WakeLock};
use crate::storage::AudioConfig;

/// The audio, haptic and wake-lock collaborators of a controller.
pub struct CueOutputs {
    audio: Arc<dyn AudioCueEmitter>,
    haptics: Arc<dyn HapticEmitter>,
    wake: WakeGuard,
}

impl Default for CueOutputs {
    fn default() -> Self {
        Self::new(Arc::new(Silent), Arc::new(NoHaptics), Box::new(NoWakeLock))
    }
}

impl CueOutputs {
    pub fn new(
        audio: Arc<dyn AudioCueEmitter>,
        haptics: Arc<dyn HapticEmitter>,
        wake_lock: Box<dyn WakeLock>,
    ) -> Self {
        Self {
            audio,
            haptics,
            wake: WakeGuard {
                lock: wake_lock,
                requested: false,
                held: false,
            },
        }
    }

    /// Like [`CueOutputs::new`], but any collaborator switched off in
    /// `config` is replaced by its silent counterpart.
    pub fn configured(
        config: &AudioConfig,
        audio: Arc<dyn AudioCueEmitter>,
        haptics: Arc<dyn HapticEmitter>,
        wake_lock: Box<dyn WakeLock>,
    ) -> Self {
        let audio: Arc<dyn AudioCueEmitter> = if config.enabled { audio } else { Arc::new(Silent) };
        let haptics: Arc<dyn HapticEmitter> = if config.haptics { haptics } else { Arc::new(NoHaptics) };
        let wake_lock: Box<dyn WakeLock> = if config.keep_awake { wake_lock } else { Box::new(NoWakeLock) };
        Self::new(audio, haptics, wake_lock)
    }

    pub(crate) fn play(&self, cue: Cue, priority: bool) {
        tracing::trace!(cue = cue.id(), priority, "cue");
        self.audio.play(cue, priority);
    }

    pub(crate) fn pulse(&self, haptic: Haptic) {
        self.haptics.pulse(haptic);
    }

    pub(crate) fn wake(&mut self) -> &mut WakeGuard {
        &mut self.wake
    }

    pub fn wake_lock_held(&self) -> bool {
        self.wake.held
    }
}

/// Tracks the wake lock. `requested` is an outstanding successful request
/// that still owes a release; `held` is whether the platform still honours it.
pub(crate) struct WakeGuard {
    lock: Box<dyn WakeLock>,
    requested: bool,
    held: bool,
}

impl WakeGuard {
    pub(crate) fn acquire(&mut self) {
        if self.held {
            return;
        }
        match self.lock.request() {
            Ok(()) => {
                self.requested = true;
                self.held = true;
            }
            Err(e) => tracing::warn!(error = %e, "wake lock request failed; continuing without it"),
        }
    }

    pub(crate) fn release(&mut self) {
        if self.requested {
            self.lock.release();
        }
        self.requested = false;
        self.held = false;
    }

    /// Hiding the app drops any platform wake lock; regaining visibility
    /// while `active` takes it again. A request made before hiding is still
    /// released on stop.
    pub(crate) fn on_visibility_change(&mut self, visible: bool, active: bool) {
        if !visible {
            self.held = false;
        } else if active {
            self.acquire();
        }
    }
}
