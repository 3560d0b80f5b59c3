// AudioBackend - contract between the scheduling engine and the audio renderer
// Supplies a monotonic clock and absolute-time tone scheduling

use std::fmt;

/// Errors surfaced by the audio collaborator
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("audio backend error: {0}")]
    Backend(String),

    #[error("audio backend is not running")]
    NotRunning,
}

/// Oscillator waveform shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Waveform {
    Sine,
    Square,
    Saw,
    Triangle,
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Saw => "saw",
            Waveform::Triangle => "triangle",
        };
        write!(f, "{}", name)
    }
}

/// A tone placed at absolute clock times.
///
/// This is the oscillator -> gain -> master-input pattern collapsed into a
/// single scheduling call: the backend creates the nodes and arms
/// start/stop at the given times. Events are never fired at tick time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub waveform: Waveform,
    /// Oscillator frequency in Hz
    pub frequency: f64,
    /// Gain level (0.0 to 1.0)
    pub level: f32,
    /// Absolute clock time at which the tone starts, in seconds
    pub start_time: f64,
    /// Absolute clock time at which the tone stops, in seconds
    pub stop_time: f64,
}

/// External audio collaborator: monotonic time source plus node creation.
///
/// The engine owns a single backend handle for the process lifetime and
/// never performs synthesis itself.
pub trait AudioBackend {
    /// Initialize or resume the backend. Idempotent; must succeed before
    /// playback starts.
    fn ensure_running(&mut self) -> Result<(), EngineError>;

    /// Monotonic time in seconds. Only differences are meaningful.
    fn current_time(&self) -> f64;

    /// Schedule a tone at absolute clock times.
    fn schedule_tone(&mut self, tone: ToneSpec) -> Result<(), EngineError>;
}
