//! The per-weapon control state machine.
//!
//! State-change execution is serialized by an operation mutex; the current
//! state and the `launched` / `fire_solution_ready` flags are atomics for
//! lock-free reads. The POC delay and the launch steps are the only
//! blocking regions, and both poll their cancellation tokens every 50 ms.
//! ABORT preempts: it cancels the in-flight operation's token before
//! taking its turn on the mutex.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info};

use wcs_core::constants::CANCEL_POLL_INTERVAL;
use wcs_core::enums::{ControlState, WeaponKind};
use wcs_core::errors::{WcsError, WcsResult};
use wcs_core::events::WcsEvent;

use crate::cancel::CancelToken;
use crate::kinds::WeaponSpec;

/// One step of the launch sequence.
#[derive(Debug, Clone)]
pub struct LaunchStep {
    pub description: String,
    pub duration: Duration,
}

pub struct Weapon {
    kind: WeaponKind,
    tube_no: u16,
    spec: WeaponSpec,
    state: AtomicU8,
    launched: AtomicBool,
    fire_solution_ready: AtomicBool,
    on_delay: Duration,
    launch_steps: Vec<LaunchStep>,
    /// Serializes state-change execution. Held for the full duration of
    /// the POC wait and the launch sequence.
    op_lock: Mutex<()>,
    /// Token of the operation currently in flight. Replaced by every
    /// accepted request.
    current_token: Mutex<CancelToken>,
    state_entered_at: Mutex<Instant>,
    events: mpsc::Sender<WcsEvent>,
}

impl Weapon {
    pub fn new(
        kind: WeaponKind,
        tube_no: u16,
        spec: WeaponSpec,
        launch_steps: Vec<LaunchStep>,
        events: mpsc::Sender<WcsEvent>,
    ) -> Self {
        let on_delay = Duration::from_secs_f64(spec.launch_delay_s);
        Self {
            kind,
            tube_no,
            spec,
            state: AtomicU8::new(ControlState::Off.as_u8()),
            launched: AtomicBool::new(false),
            fire_solution_ready: AtomicBool::new(false),
            on_delay,
            launch_steps,
            op_lock: Mutex::new(()),
            current_token: Mutex::new(CancelToken::new()),
            state_entered_at: Mutex::new(Instant::now()),
            events,
        }
    }

    pub fn kind(&self) -> WeaponKind {
        self.kind
    }

    pub fn tube_no(&self) -> u16 {
        self.tube_no
    }

    pub fn spec(&self) -> &WeaponSpec {
        &self.spec
    }

    pub fn current_state(&self) -> ControlState {
        ControlState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn state_entered_at(&self) -> Instant {
        *self.state_entered_at.lock()
    }

    pub fn is_launched(&self) -> bool {
        self.launched.load(Ordering::Acquire)
    }

    pub fn is_fire_solution_ready(&self) -> bool {
        self.fire_solution_ready.load(Ordering::Acquire)
    }

    pub fn set_fire_solution_ready(&self, ready: bool) {
        self.fire_solution_ready.store(ready, Ordering::Release);
    }

    /// Interlock predicate gating RTL. The base condition is the fire
    /// solution flag; no current kind adds more.
    pub fn interlock_satisfied(&self) -> bool {
        self.is_fire_solution_ready()
    }

    /// The legal committed transitions, internal edges included.
    pub fn valid_transition(from: ControlState, to: ControlState) -> bool {
        use ControlState::*;
        matches!(
            (from, to),
            (Off, Poc)
                | (Off, On)
                | (Poc, On)
                | (Poc, Off)
                | (On, Off)
                | (On, Rtl)
                | (Rtl, On)
                | (Rtl, Launch)
                | (Rtl, Off)
                | (Launch, Abort)
                | (Launch, PostLaunch)
                | (Abort, Off)
                | (PostLaunch, Off)
        )
    }

    /// Request a state change. ABORT is accepted from any state and
    /// preempts in-flight work; everything else validates against the
    /// transition table. Blocking requests (ON, LAUNCH) run on the calling
    /// thread and hold the operation mutex for their full duration.
    pub fn request_state_change(&self, target: ControlState, token: CancelToken) -> WcsResult<()> {
        match target {
            ControlState::Abort => {
                self.cancel_current();
                let _guard = self.op_lock.lock();
                self.set_current_token(token);
                self.commit(ControlState::Abort);
                Ok(())
            }
            ControlState::Off => {
                let from = self.current_state();
                if from == ControlState::Off {
                    return Ok(());
                }
                if !Self::valid_transition(from, ControlState::Off) {
                    return Err(WcsError::InvalidTransition {
                        from,
                        to: ControlState::Off,
                    });
                }
                // An OFF request during the power-on check cancels it.
                if from == ControlState::Poc {
                    self.cancel_current();
                }
                let _guard = self.op_lock.lock();
                self.set_current_token(token);
                if self.current_state() != ControlState::Off {
                    self.commit(ControlState::Off);
                }
                Ok(())
            }
            ControlState::On => {
                let guard = self.acquire_for(ControlState::Off, ControlState::On)?;
                self.set_current_token(token.clone());
                let result = self.enter_on(&token);
                drop(guard);
                result
            }
            ControlState::Launch => {
                let guard = self.acquire_for(ControlState::Rtl, ControlState::Launch)?;
                self.set_current_token(token.clone());
                let result = self.run_launch_sequence(&token);
                drop(guard);
                result
            }
            ControlState::Poc | ControlState::Rtl | ControlState::PostLaunch => {
                Err(WcsError::InvalidTransition {
                    from: self.current_state(),
                    to: target,
                })
            }
        }
    }

    /// Take the operation mutex for a request that requires `expected` as
    /// the current state. The bounded wait absorbs micro-contention from
    /// the tick; a weapon busy with real work fails against its live state.
    fn acquire_for(
        &self,
        expected: ControlState,
        target: ControlState,
    ) -> WcsResult<parking_lot::MutexGuard<'_, ()>> {
        let from = self.current_state();
        if from != expected {
            return Err(WcsError::InvalidTransition { from, to: target });
        }
        let guard = self
            .op_lock
            .try_lock_for(CANCEL_POLL_INTERVAL)
            .ok_or_else(|| WcsError::InvalidTransition {
                from: self.current_state(),
                to: target,
            })?;
        // Re-validate now that we hold the mutex.
        let from = self.current_state();
        if from != expected {
            return Err(WcsError::InvalidTransition { from, to: target });
        }
        Ok(guard)
    }

    /// ON entry: POC sub-state, cancellation-polled delay, then ON.
    fn enter_on(&self, token: &CancelToken) -> WcsResult<()> {
        self.commit(ControlState::Poc);
        debug!(tube_no = self.tube_no, kind = %self.kind, "power-on check started");

        if !self.sleep_with_cancel_check(self.on_delay, token) {
            self.commit(ControlState::Off);
            return Err(WcsError::Cancelled);
        }

        self.commit(ControlState::On);
        Ok(())
    }

    /// LAUNCH: run the ordered step list; cancellation mid-step aborts.
    fn run_launch_sequence(&self, token: &CancelToken) -> WcsResult<()> {
        self.commit(ControlState::Launch);
        info!(tube_no = self.tube_no, kind = %self.kind, "launch sequence started");

        for step in &self.launch_steps {
            debug!(
                tube_no = self.tube_no,
                step = %step.description,
                duration_s = step.duration.as_secs_f64(),
                "launch step"
            );
            if !self.sleep_with_cancel_check(step.duration, token) {
                self.commit(ControlState::Abort);
                return Err(WcsError::Aborted);
            }
        }

        self.set_launched(true);
        info!(tube_no = self.tube_no, kind = %self.kind, "launch complete");
        Ok(())
    }

    /// Flip the launched flag. The rising edge drives LAUNCH ->
    /// POST_LAUNCH and notifies the launch observer.
    pub fn set_launched(&self, launched: bool) {
        let old = self.launched.swap(launched, Ordering::AcqRel);
        if old == launched {
            return;
        }
        self.send(WcsEvent::LaunchStatusChanged {
            tube_no: self.tube_no,
            launched,
        });
        if launched {
            self.commit(ControlState::PostLaunch);
        }
    }

    /// Periodic update: the ON<->RTL auto-transitions. Skipped while a
    /// state-change operation is in flight.
    pub fn tick(&self) {
        let Some(_guard) = self.op_lock.try_lock() else {
            return;
        };
        match self.current_state() {
            ControlState::On if self.interlock_satisfied() => {
                self.commit(ControlState::Rtl);
            }
            ControlState::Rtl if !self.interlock_satisfied() => {
                self.commit(ControlState::On);
            }
            _ => {}
        }
    }

    /// Cancel the operation currently in flight, if any.
    pub fn cancel_current(&self) {
        self.current_token.lock().cancel();
    }

    /// Teardown: cancel in-flight work and force OFF without notifying.
    pub fn reset(&self) {
        self.cancel_current();
        let _guard = self.op_lock.lock();
        self.state.store(ControlState::Off.as_u8(), Ordering::Release);
        self.launched.store(false, Ordering::Release);
        self.fire_solution_ready.store(false, Ordering::Release);
        *self.state_entered_at.lock() = Instant::now();
    }

    fn set_current_token(&self, token: CancelToken) {
        *self.current_token.lock() = token;
    }

    /// Sleep in <= 50 ms slices, checking both the caller-supplied token
    /// and the weapon's current-operation token between slices.
    fn sleep_with_cancel_check(&self, duration: Duration, token: &CancelToken) -> bool {
        let mut remaining = duration;
        loop {
            if token.is_cancelled() || self.current_token.lock().is_cancelled() {
                return false;
            }
            if remaining.is_zero() {
                return true;
            }
            let slice = remaining.min(CANCEL_POLL_INTERVAL);
            std::thread::sleep(slice);
            remaining -= slice;
        }
    }

    /// Commit a state, restamp the entry instant, and notify on change.
    fn commit(&self, new: ControlState) {
        let old = ControlState::from_u8(self.state.swap(new.as_u8(), Ordering::AcqRel));
        *self.state_entered_at.lock() = Instant::now();
        if old != new {
            info!(tube_no = self.tube_no, kind = %self.kind, %old, %new, "weapon state changed");
            self.send(WcsEvent::StateChanged {
                tube_no: self.tube_no,
                old,
                new,
            });
        }
    }

    fn send(&self, event: WcsEvent) {
        let _ = self.events.send(event);
    }
}
