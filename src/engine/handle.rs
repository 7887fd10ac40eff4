//! EngineHandle: thread-safe orchestration around `GestureEngine`.
//!
//! The frame loop calls `tick` while a UI or IPC thread may call
//! `reconfigure`, `recalibrate` or flip the tracking gate. Every engine
//! operation takes the single mutex once, so a tick never observes a
//! half-applied config or a half-reset detector. The gate is flipped and
//! read under the same mutex: once `stop` returns, no later tick reaches the
//! engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;

use super::core::GestureEngine;
use crate::analysis::{EventBatch, PoseSample};
use crate::config::DetectionConfig;
use crate::error::{log_engine_error, EngineError};
use crate::ipc::ControlCommand;
use crate::telemetry;

/// Cloneable handle shared between the frame loop and control surfaces
#[derive(Clone)]
pub struct EngineHandle {
    engine: Arc<Mutex<GestureEngine>>,
    tracking_active: Arc<AtomicBool>,
}

impl EngineHandle {
    /// Build a handle; tracking starts active
    pub fn new(config: &DetectionConfig) -> Result<Self, EngineError> {
        let engine = GestureEngine::new(config).inspect_err(|err| {
            telemetry::hub().record_config_rejected(err);
        })?;
        Ok(Self::from_engine(engine))
    }

    pub fn from_engine(engine: GestureEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            tracking_active: Arc::new(AtomicBool::new(true)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, GestureEngine>, EngineError> {
        self.engine.lock().map_err(|_| EngineError::LockPoisoned {
            component: "GestureEngine".to_string(),
        })
    }

    // Flipping the gate never touches engine state, so a poisoned lock is
    // still usable for ordering against ticks.
    fn gate_lock(&self) -> MutexGuard<'_, GestureEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resume tracking; returns false if it was already active
    pub fn start(&self) -> bool {
        let was_active = {
            let _engine = self.gate_lock();
            self.tracking_active.swap(true, Ordering::SeqCst)
        };
        if !was_active {
            info!("[EngineHandle] Tracking started");
            telemetry::hub().record_tracking(true);
        }
        !was_active
    }

    /// Pause tracking; returns false if it was already paused
    pub fn stop(&self) -> bool {
        let was_active = {
            let _engine = self.gate_lock();
            self.tracking_active.swap(false, Ordering::SeqCst)
        };
        if was_active {
            info!("[EngineHandle] Tracking stopped");
            telemetry::hub().record_tracking(false);
        }
        was_active
    }

    /// Flip the tracking gate and return the new state
    pub fn toggle(&self) -> bool {
        let active = {
            let _engine = self.gate_lock();
            !self.tracking_active.fetch_xor(true, Ordering::SeqCst)
        };
        info!(
            "[EngineHandle] Tracking {}",
            if active { "resumed" } else { "paused" }
        );
        telemetry::hub().record_tracking(active);
        active
    }

    pub fn is_active(&self) -> bool {
        self.tracking_active.load(Ordering::SeqCst)
    }

    /// Run one frame through the engine
    ///
    /// While tracking is paused the sample is discarded and engine state is
    /// left untouched.
    pub fn tick(&self, sample: &PoseSample) -> Result<EventBatch, EngineError> {
        if !self.is_active() {
            return Ok(EventBatch::new());
        }

        let (events, rejected) = {
            let mut engine = self.lock().inspect_err(|err| {
                log_engine_error(err, "EngineHandle::tick");
            })?;
            // A stop may have landed while this thread waited for the lock.
            if !self.is_active() {
                return Ok(EventBatch::new());
            }
            let before = engine.rejected_samples();
            let events = engine.tick(sample);
            let after = engine.rejected_samples();
            (events, (after > before).then_some(after))
        };

        let hub = telemetry::hub();
        if let Some(total) = rejected {
            hub.record_rejected_sample(sample.timestamp_ms, total);
        }
        for event in &events {
            hub.record_gesture(event);
        }
        Ok(events)
    }

    /// Swap detection settings atomically
    ///
    /// # Errors
    /// `EngineError::Config` when validation fails; the previous settings stay
    /// in effect.
    pub fn reconfigure(&self, config: &DetectionConfig) -> Result<(), EngineError> {
        let result = self.lock()?.reconfigure(config);
        match result {
            Ok(()) => {
                telemetry::hub().record_reconfigured();
                Ok(())
            }
            Err(err) => {
                telemetry::hub().record_config_rejected(&err);
                Err(err.into())
            }
        }
    }

    /// Recenter on the next sample
    pub fn recalibrate(&self) -> Result<(), EngineError> {
        self.lock()?.recalibrate();
        telemetry::hub().record_recalibration();
        Ok(())
    }

    /// Apply a control command received from the host
    pub fn apply_command(&self, command: ControlCommand) -> Result<(), EngineError> {
        match command {
            ControlCommand::Recalibrate => self.recalibrate(),
            ControlCommand::Toggle => {
                self.toggle();
                Ok(())
            }
        }
    }

    /// Run a closure against the locked engine (state inspection)
    pub fn with_engine<R>(&self, f: impl FnOnce(&GestureEngine) -> R) -> Result<R, EngineError> {
        let engine = self.lock()?;
        Ok(f(&engine))
    }
}
