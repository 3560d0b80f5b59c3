// Track and clip data model
// Clips are shared content stored once per project; ClipInstances place
// them on tracks by id (many instances may reference one clip)

use crate::playback::transport::BeatWindow;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique clip identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClipId(Uuid);

impl ClipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique track identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TrackId(Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One note inside a clip, positioned relative to the clip start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// MIDI note number (0-127)
    pub pitch: u8,
    /// MIDI velocity (0-127)
    pub velocity: u8,
    /// Start offset from the clip start, in beats
    pub start_beat: f64,
    pub duration_beats: f64,
}

impl Note {
    pub fn new(pitch: u8, velocity: u8, start_beat: f64, duration_beats: f64) -> Self {
        Self {
            pitch: pitch.min(127),
            velocity: velocity.min(127),
            start_beat: start_beat.max(0.0),
            duration_beats: duration_beats.max(0.0),
        }
    }
}

/// Reusable musical content, referenced by id from clip instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: ClipId,
    pub name: String,
    /// Length in beats
    pub length_beats: f64,
    pub notes: Vec<Note>,
}

impl Clip {
    pub fn new(name: impl Into<String>, length_beats: f64) -> Self {
        Self {
            id: ClipId::new(),
            name: name.into(),
            length_beats: length_beats.max(0.0),
            notes: Vec::new(),
        }
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }
}

/// A placement of a clip on a track. The clip length is copied in at
/// placement time so range queries never need the clip map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipInstance {
    pub clip_id: ClipId,
    pub start_beat: f64,
    pub duration_beats: f64,
}

impl ClipInstance {
    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.duration_beats
    }
}

/// Track variant discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Midi,
    Audio,
}

/// A note handed to the renderer, pinned to absolute clock times
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    pub track_id: TrackId,
    pub clip_id: ClipId,
    pub pitch: u8,
    pub velocity: u8,
    /// Absolute clock time, seconds
    pub start_time: f64,
    pub stop_time: f64,
}

/// A track: ordered clip placements plus mix state. Midi tracks schedule
/// their clip content ahead of time; audio tracks stream on their own and
/// need no pre-scheduling.
#[derive(Debug, Clone)]
pub struct Track {
    id: TrackId,
    name: String,
    kind: TrackKind,
    muted: bool,
    solo: bool,
    volume: f32,
    pan: f32,
    clip_instances: Vec<ClipInstance>,
    /// Notes handed to the renderer and believed to be sounding
    in_flight: Vec<ScheduledNote>,
    active: bool,
}

impl Track {
    pub fn new(kind: TrackKind, name: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            kind,
            muted: false,
            solo: false,
            volume: 1.0,
            pan: 0.0,
            clip_instances: Vec::new(),
            in_flight: Vec::new(),
            active: false,
        }
    }

    /// Bring the track online. Called before it joins the project.
    pub fn init(&mut self) {
        self.active = true;
    }

    /// Release owned resources. Called before removal from the project.
    pub fn dispose(&mut self) {
        self.stop_all_voices();
        self.clip_instances.clear();
        self.active = false;
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: TrackId) {
        self.id = id;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn solo(&self) -> bool {
        self.solo
    }

    pub fn set_solo(&mut self, solo: bool) {
        self.solo = solo;
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 2.0);
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
    }

    pub fn clip_instances(&self) -> &[ClipInstance] {
        &self.clip_instances
    }

    /// Place a clip at `start_beat`, copying its length into the instance
    pub fn add_clip_instance(&mut self, clip: &Clip, start_beat: f64) -> ClipInstance {
        let instance = ClipInstance {
            clip_id: clip.id,
            start_beat: start_beat.max(0.0),
            duration_beats: clip.length_beats,
        };
        self.clip_instances.push(instance);
        instance
    }

    pub(crate) fn push_instance(&mut self, instance: ClipInstance) {
        self.clip_instances.push(instance);
    }

    /// Instances whose `[start_beat, end_beat)` intersects `[from, to)`.
    /// The instance list may be in any order after edits; this is a plain
    /// scan on purpose.
    pub fn instances_in_range(
        &self,
        from: f64,
        to: f64,
    ) -> impl Iterator<Item = &ClipInstance> {
        self.clip_instances
            .iter()
            .filter(move |i| i.start_beat < to && i.end_beat() > from)
    }

    /// Remove every instance referencing `clip_id`; returns how many were
    /// dropped
    pub fn remove_instances_of(&mut self, clip_id: ClipId) -> usize {
        let before = self.clip_instances.len();
        self.clip_instances.retain(|i| i.clip_id != clip_id);
        before - self.clip_instances.len()
    }

    /// Schedule the notes of one clip placement that fall inside the
    /// window. Returns the notes for the renderer; audio tracks return
    /// nothing (they stream continuously).
    pub fn schedule_clip(
        &mut self,
        instance: &ClipInstance,
        clip: &Clip,
        window: &BeatWindow,
    ) -> Vec<ScheduledNote> {
        if self.kind != TrackKind::Midi {
            return Vec::new();
        }

        let mut notes = Vec::new();
        for note in &clip.notes {
            if note.start_beat >= instance.duration_beats {
                continue; // truncated by the placement
            }
            let beat = instance.start_beat + note.start_beat;
            if !window.contains(beat) {
                continue;
            }
            let start_time = window.time_at(beat);
            let scheduled = ScheduledNote {
                track_id: self.id,
                clip_id: clip.id,
                pitch: note.pitch,
                velocity: note.velocity,
                start_time,
                stop_time: start_time + note.duration_beats * 60.0 / window.bpm,
            };
            self.in_flight.push(scheduled);
            notes.push(scheduled);
        }
        notes
    }

    /// Notes handed out since the last `stop_all_voices`
    pub fn in_flight(&self) -> &[ScheduledNote] {
        &self.in_flight
    }

    /// Forget every sounding note; the renderer is expected to silence its
    /// voices in response
    pub fn stop_all_voices(&mut self) {
        self.in_flight.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(from: f64, to: f64) -> BeatWindow {
        BeatWindow {
            from,
            to,
            bpm: 120.0,
            origin_beat: 0.0,
            origin_time: 0.0,
        }
    }

    #[test]
    fn test_note_clamps() {
        let note = Note::new(200, 255, -1.0, -2.0);
        assert_eq!(note.pitch, 127);
        assert_eq!(note.velocity, 127);
        assert_eq!(note.start_beat, 0.0);
        assert_eq!(note.duration_beats, 0.0);
    }

    #[test]
    fn test_add_clip_instance_copies_length() {
        let clip = Clip::new("Riff", 4.0);
        let mut track = Track::new(TrackKind::Midi, "Lead");
        let instance = track.add_clip_instance(&clip, 8.0);

        assert_eq!(instance.clip_id, clip.id);
        assert_eq!(instance.start_beat, 8.0);
        assert_eq!(instance.end_beat(), 12.0);
        assert_eq!(track.clip_instances().len(), 1);
    }

    #[test]
    fn test_range_query_tolerates_unsorted_instances() {
        let clip = Clip::new("Riff", 2.0);
        let mut track = Track::new(TrackKind::Midi, "Lead");
        // Deliberately out of start order
        track.add_clip_instance(&clip, 8.0);
        track.add_clip_instance(&clip, 0.0);
        track.add_clip_instance(&clip, 4.0);

        let hits: Vec<f64> = track
            .instances_in_range(3.0, 9.0)
            .map(|i| i.start_beat)
            .collect();
        assert_eq!(hits, vec![8.0, 4.0]);
    }

    #[test]
    fn test_range_query_half_open() {
        let clip = Clip::new("Riff", 2.0);
        let mut track = Track::new(TrackKind::Midi, "Lead");
        track.add_clip_instance(&clip, 4.0);

        // [2, 4) does not touch an instance starting at 4
        assert_eq!(track.instances_in_range(2.0, 4.0).count(), 0);
        // [4, 5) does
        assert_eq!(track.instances_in_range(4.0, 5.0).count(), 1);
        // An instance ending at 4 does not reach into [4, 6)
        let mut track2 = Track::new(TrackKind::Midi, "Other");
        track2.add_clip_instance(&clip, 2.0);
        assert_eq!(track2.instances_in_range(4.0, 6.0).count(), 0);
    }

    #[test]
    fn test_schedule_clip_emits_notes_in_window() {
        let mut clip = Clip::new("Riff", 4.0);
        clip.add_note(Note::new(60, 100, 0.0, 1.0));
        clip.add_note(Note::new(64, 100, 2.0, 1.0));

        let mut track = Track::new(TrackKind::Midi, "Lead");
        let instance = track.add_clip_instance(&clip, 4.0);

        // Window [4, 5): only the note at clip offset 0 (absolute beat 4)
        let notes = track.schedule_clip(&instance, &clip, &window(4.0, 5.0));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].pitch, 60);
        // Beat 4 at 120 BPM = 2.0s; one beat long = until 2.5s
        assert_eq!(notes[0].start_time, 2.0);
        assert_eq!(notes[0].stop_time, 2.5);
        assert_eq!(track.in_flight().len(), 1);
    }

    #[test]
    fn test_schedule_clip_skips_truncated_notes() {
        let mut clip = Clip::new("Riff", 4.0);
        clip.add_note(Note::new(60, 100, 3.0, 1.0));

        let mut track = Track::new(TrackKind::Midi, "Lead");
        // Shorten the placement below the note offset
        let mut instance = track.add_clip_instance(&clip, 0.0);
        instance.duration_beats = 2.0;

        let notes = track.schedule_clip(&instance, &clip, &window(0.0, 8.0));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_audio_track_does_not_preschedule() {
        let mut clip = Clip::new("Loop", 4.0);
        clip.add_note(Note::new(60, 100, 0.0, 1.0));

        let mut track = Track::new(TrackKind::Audio, "Drums");
        let instance = track.add_clip_instance(&clip, 0.0);

        let notes = track.schedule_clip(&instance, &clip, &window(0.0, 8.0));
        assert!(notes.is_empty());
        assert!(track.in_flight().is_empty());
    }

    #[test]
    fn test_stop_all_voices() {
        let mut clip = Clip::new("Riff", 4.0);
        clip.add_note(Note::new(60, 100, 0.0, 1.0));
        let mut track = Track::new(TrackKind::Midi, "Lead");
        let instance = track.add_clip_instance(&clip, 0.0);
        track.schedule_clip(&instance, &clip, &window(0.0, 4.0));
        assert!(!track.in_flight().is_empty());

        track.stop_all_voices();
        assert!(track.in_flight().is_empty());
    }

    #[test]
    fn test_mix_state_clamps() {
        let mut track = Track::new(TrackKind::Midi, "Lead");
        track.set_volume(5.0);
        assert_eq!(track.volume(), 2.0);
        track.set_pan(-3.0);
        assert_eq!(track.pan(), -1.0);
    }

    #[test]
    fn test_lifecycle() {
        let clip = Clip::new("Riff", 4.0);
        let mut track = Track::new(TrackKind::Midi, "Lead");
        assert!(!track.is_active());

        track.init();
        assert!(track.is_active());

        track.add_clip_instance(&clip, 0.0);
        track.dispose();
        assert!(!track.is_active());
        assert!(track.clip_instances().is_empty());
    }

    #[test]
    fn test_remove_instances_of() {
        let clip_a = Clip::new("A", 1.0);
        let clip_b = Clip::new("B", 1.0);
        let mut track = Track::new(TrackKind::Midi, "Lead");
        track.add_clip_instance(&clip_a, 0.0);
        track.add_clip_instance(&clip_b, 1.0);
        track.add_clip_instance(&clip_a, 2.0);

        assert_eq!(track.remove_instances_of(clip_a.id), 2);
        assert_eq!(track.clip_instances().len(), 1);
        assert_eq!(track.clip_instances()[0].clip_id, clip_b.id);
    }
}
