// LoopDeck - Library exports for tests and the demo binary

pub mod audio;
pub mod playback;
pub mod project;
pub mod session;

// Re-export commonly used types for convenience
pub use audio::{AudioBackend, EngineError, OfflineBackend, ToneSpec, WallClockBackend, Waveform};
pub use playback::{
    BeatWindow, ListenerHandle, LoopRegion, Metronome, MusicalTime, Tempo, TimeSignature,
    Transport, TransportState,
};
pub use project::{
    Clip, ClipId, ClipInstance, Note, Project, ProjectError, ScheduledNote, Track, TrackId,
    TrackKind,
};
pub use session::Session;
