// Playback module - transport, musical time, and metronome

pub mod metronome;
pub mod timeline;
pub mod transport;

pub use metronome::Metronome;
pub use timeline::{LoopRegion, MusicalTime, Tempo, TimeSignature, MAX_BPM, MIN_BPM};
pub use transport::{
    BeatWindow, ListenerHandle, Transport, TransportState, SCHEDULER_INTERVAL, SCHEDULE_AHEAD,
};
