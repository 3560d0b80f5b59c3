// Offline backends - manual-clock backend for tests and a wall-clock
// backend for running the engine without an audio device

use super::backend::{AudioBackend, EngineError, ToneSpec};
use std::time::Instant;

/// Backend with a manually driven clock that records every scheduled tone.
///
/// Lets tests advance time deterministically and inspect exactly what the
/// engine scheduled and when.
#[derive(Debug, Default)]
pub struct OfflineBackend {
    now: f64,
    running: bool,
    scheduled: Vec<ToneSpec>,
}

impl OfflineBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `dt` seconds
    pub fn advance(&mut self, dt: f64) {
        self.now += dt;
    }

    /// Jump the clock to an absolute time
    pub fn set_time(&mut self, now: f64) {
        self.now = now;
    }

    /// Tones scheduled so far, in scheduling order
    pub fn scheduled(&self) -> &[ToneSpec] {
        &self.scheduled
    }

    pub fn clear_scheduled(&mut self) {
        self.scheduled.clear();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl AudioBackend for OfflineBackend {
    fn ensure_running(&mut self) -> Result<(), EngineError> {
        self.running = true;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.now
    }

    fn schedule_tone(&mut self, tone: ToneSpec) -> Result<(), EngineError> {
        if !self.running {
            return Err(EngineError::NotRunning);
        }
        self.scheduled.push(tone);
        Ok(())
    }
}

/// Backend backed by the process monotonic clock. Tones are logged and
/// discarded; rendering is someone else's job.
#[derive(Debug)]
pub struct WallClockBackend {
    epoch: Instant,
    running: bool,
}

impl WallClockBackend {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            running: false,
        }
    }
}

impl Default for WallClockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for WallClockBackend {
    fn ensure_running(&mut self) -> Result<(), EngineError> {
        self.running = true;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn schedule_tone(&mut self, tone: ToneSpec) -> Result<(), EngineError> {
        if !self.running {
            return Err(EngineError::NotRunning);
        }
        log::debug!(
            "tone {} {:.1} Hz at {:.3}s..{:.3}s",
            tone.waveform,
            tone.frequency,
            tone.start_time,
            tone.stop_time
        );
        Ok(())
    }
}
