// Project - track/clip aggregate with selection, persistence, and
// snapshot-based undo/redo
// Subscribes to transport beat windows and fans them out to tracks

use crate::playback::timeline::{TimeSignature, MAX_BPM, MIN_BPM};
use crate::playback::transport::BeatWindow;
use crate::project::history::History;
use crate::project::serialization::{ProjectFile, TrackFile};
use crate::project::track::{
    Clip, ClipId, ClipInstance, Note, ScheduledNote, Track, TrackId, TrackKind,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

/// Project error types
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("track not found: {0}")]
    TrackNotFound(TrackId),

    #[error("clip not found: {0}")]
    ClipNotFound(ClipId),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

/// The editing-session document: an ordered track list, the shared clip
/// library, selection state, and undo/redo history.
pub struct Project {
    id: Uuid,
    name: String,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    bpm: f64,
    time_signature: TimeSignature,
    tracks: Vec<Track>,
    clips: HashMap<ClipId, Clip>,
    selected_track_id: Option<TrackId>,
    history: History,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created: now,
            modified: now,
            bpm: 120.0,
            time_signature: TimeSignature::default(),
            tracks: Vec::new(),
            clips: HashMap::new(),
            selected_track_id: None,
            history: History::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Document tempo, clamped like the transport's
    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        self.touch();
    }

    pub fn time_signature(&self) -> &TimeSignature {
        &self.time_signature
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
        self.touch();
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    // ---- tracks ----

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    pub fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id() == id)
    }

    pub fn create_midi_track(&mut self, name: impl Into<String>) -> TrackId {
        self.create_track(TrackKind::Midi, name)
    }

    pub fn create_audio_track(&mut self, name: impl Into<String>) -> TrackId {
        self.create_track(TrackKind::Audio, name)
    }

    fn create_track(&mut self, kind: TrackKind, name: impl Into<String>) -> TrackId {
        let mut track = Track::new(kind, name);
        track.init();
        let id = track.id();
        self.tracks.push(track);
        if self.selected_track_id.is_none() {
            self.selected_track_id = Some(id);
        }
        self.touch();
        id
    }

    /// Dispose and remove a track. When it was the selected one, selection
    /// falls back to the first remaining track.
    pub fn delete_track(&mut self, id: TrackId) -> Result<(), ProjectError> {
        let index = self
            .tracks
            .iter()
            .position(|t| t.id() == id)
            .ok_or(ProjectError::TrackNotFound(id))?;
        self.tracks[index].dispose();
        self.tracks.remove(index);

        if self.selected_track_id == Some(id) {
            self.selected_track_id = self.tracks.first().map(|t| t.id());
        }
        self.touch();
        Ok(())
    }

    pub fn selected_track_id(&self) -> Option<TrackId> {
        self.selected_track_id
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.selected_track_id.and_then(|id| self.track(id))
    }

    pub fn select_track(&mut self, id: TrackId) -> Result<(), ProjectError> {
        if self.track(id).is_none() {
            return Err(ProjectError::TrackNotFound(id));
        }
        self.selected_track_id = Some(id);
        Ok(())
    }

    // ---- clips ----

    pub fn clips(&self) -> &HashMap<ClipId, Clip> {
        &self.clips
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.get(&id)
    }

    pub fn create_clip(&mut self, name: impl Into<String>, length_beats: f64) -> ClipId {
        let clip = Clip::new(name, length_beats);
        let id = clip.id;
        self.clips.insert(id, clip);
        self.touch();
        id
    }

    pub fn add_note_to_clip(&mut self, clip_id: ClipId, note: Note) -> Result<(), ProjectError> {
        let clip = self
            .clips
            .get_mut(&clip_id)
            .ok_or(ProjectError::ClipNotFound(clip_id))?;
        clip.add_note(note);
        self.touch();
        Ok(())
    }

    /// Place a clip on a track
    pub fn add_clip_to_track(
        &mut self,
        track_id: TrackId,
        clip_id: ClipId,
        start_beat: f64,
    ) -> Result<ClipInstance, ProjectError> {
        let Self { tracks, clips, .. } = self;
        let clip = clips
            .get(&clip_id)
            .ok_or(ProjectError::ClipNotFound(clip_id))?;
        let track = tracks
            .iter_mut()
            .find(|t| t.id() == track_id)
            .ok_or(ProjectError::TrackNotFound(track_id))?;
        let instance = track.add_clip_instance(clip, start_beat);
        self.touch();
        Ok(instance)
    }

    /// Remove a clip and every instance referencing it, across all tracks
    pub fn delete_clip(&mut self, id: ClipId) -> Result<(), ProjectError> {
        if !self.clips.contains_key(&id) {
            return Err(ProjectError::ClipNotFound(id));
        }
        for track in &mut self.tracks {
            track.remove_instances_of(id);
        }
        self.clips.remove(&id);
        self.touch();
        Ok(())
    }

    // ---- playback ----

    /// Transport beat-listener body: fan the window out to every audible
    /// track. Runs on the scheduler's tight interval; synchronous, no I/O.
    ///
    /// Solo resolution: while any track is solo, every non-solo track is
    /// effectively muted. The stored `muted` flags are never touched, so
    /// clearing solo recovers the previous mute state by construction.
    pub fn schedule_playback(&mut self, window: &BeatWindow) -> Vec<ScheduledNote> {
        let any_solo = self.tracks.iter().any(|t| t.solo());
        let Self { tracks, clips, .. } = self;

        let mut notes = Vec::new();
        for track in tracks.iter_mut() {
            let effectively_muted = if any_solo { !track.solo() } else { track.muted() };
            if effectively_muted {
                continue;
            }

            let instances: Vec<ClipInstance> =
                track.instances_in_range(window.from, window.to).copied().collect();
            for instance in instances {
                let Some(clip) = clips.get(&instance.clip_id) else {
                    continue;
                };
                notes.extend(track.schedule_clip(&instance, clip, window));
            }
        }
        notes
    }

    /// Whether the track would sound right now, given solo state
    pub fn is_effectively_muted(&self, id: TrackId) -> Option<bool> {
        let any_solo = self.tracks.iter().any(|t| t.solo());
        let track = self.track(id)?;
        Some(if any_solo { !track.solo() } else { track.muted() })
    }

    pub fn stop_all_voices(&mut self) {
        for track in &mut self.tracks {
            track.stop_all_voices();
        }
    }

    // ---- undo/redo ----

    /// Snapshot the whole project before a mutating user action
    pub fn save_state(&mut self) -> Result<(), ProjectError> {
        let snapshot = self.to_json()?;
        self.history.push(snapshot);
        Ok(())
    }

    pub fn undo(&mut self) -> Result<(), ProjectError> {
        let current = self.to_json()?;
        let snapshot = self
            .history
            .undo(current)
            .ok_or(ProjectError::NothingToUndo)?;
        self.restore_from_json(&snapshot)
    }

    pub fn redo(&mut self) -> Result<(), ProjectError> {
        let current = self.to_json()?;
        let snapshot = self
            .history
            .redo(current)
            .ok_or(ProjectError::NothingToRedo)?;
        self.restore_from_json(&snapshot)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn restore_from_json(&mut self, json: &str) -> Result<(), ProjectError> {
        let file: ProjectFile = serde_json::from_str(json)?;
        for track in &mut self.tracks {
            track.dispose();
        }
        let history = std::mem::take(&mut self.history);
        *self = Self::from_file(file);
        self.history = history;
        Ok(())
    }

    // ---- persistence ----

    pub fn to_file(&self) -> ProjectFile {
        let mut clips: Vec<Clip> = self.clips.values().cloned().collect();
        // Deterministic output: the clip map has no inherent order
        clips.sort_by_key(|c| c.id);

        ProjectFile {
            id: self.id,
            name: self.name.clone(),
            created: self.created.to_rfc3339(),
            modified: self.modified.to_rfc3339(),
            bpm: self.bpm,
            time_signature: self.time_signature,
            tracks: self
                .tracks
                .iter()
                .map(|t| TrackFile {
                    id: t.id(),
                    name: t.name().to_string(),
                    kind: t.kind(),
                    muted: t.muted(),
                    solo: t.solo(),
                    volume: t.volume(),
                    pan: t.pan(),
                    clip_instances: t.clip_instances().to_vec(),
                })
                .collect(),
            clips,
        }
    }

    /// Rebuild a project from its file form: clips first, then tracks.
    /// Instances referencing a missing clip id are dropped with a warning
    /// rather than failing the load.
    pub fn from_file(file: ProjectFile) -> Self {
        let clips: HashMap<ClipId, Clip> =
            file.clips.into_iter().map(|c| (c.id, c)).collect();

        let mut tracks = Vec::with_capacity(file.tracks.len());
        for track_file in file.tracks {
            let mut track = Track::new(track_file.kind, track_file.name);
            track.set_id(track_file.id);
            track.set_muted(track_file.muted);
            track.set_solo(track_file.solo);
            track.set_volume(track_file.volume);
            track.set_pan(track_file.pan);
            for instance in track_file.clip_instances {
                if clips.contains_key(&instance.clip_id) {
                    track.push_instance(instance);
                } else {
                    log::warn!(
                        "dropping clip instance referencing missing clip {}",
                        instance.clip_id
                    );
                }
            }
            track.init();
            tracks.push(track);
        }

        let selected_track_id = tracks.first().map(|t| t.id());
        Self {
            id: file.id,
            name: file.name,
            created: parse_timestamp(&file.created),
            modified: parse_timestamp(&file.modified),
            bpm: file.bpm.clamp(MIN_BPM, MAX_BPM),
            time_signature: file.time_signature,
            tracks,
            clips,
            selected_track_id,
            history: History::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(&self.to_file())?)
    }

    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        let file: ProjectFile = serde_json::from_str(json)?;
        Ok(Self::from_file(file))
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ProjectError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ProjectError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn touch(&mut self) {
        self.modified = Utc::now();
    }
}

/// Files from older builds may carry malformed timestamps; fall back to
/// now rather than refusing the load.
fn parse_timestamp(value: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(e) => {
            log::warn!("unreadable timestamp {:?}: {}", value, e);
            Utc::now()
        }
    }
}
