// Project module - tracks, clips, undo history, and persistence

pub mod history;
pub mod project;
pub mod serialization;
pub mod track;

pub use history::{History, MAX_HISTORY};
pub use project::{Project, ProjectError};
pub use serialization::{ProjectFile, TrackFile};
pub use track::{
    Clip, ClipId, ClipInstance, Note, ScheduledNote, Track, TrackId, TrackKind,
};
