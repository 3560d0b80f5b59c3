// Audio module - external audio-clock / node-factory collaborator boundary
// The engine decides *when* events happen; rendering lives behind AudioBackend

pub mod backend;
pub mod offline;

pub use backend::{AudioBackend, EngineError, ToneSpec, Waveform};
pub use offline::{OfflineBackend, WallClockBackend};
