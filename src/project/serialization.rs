// Serializable project file format
// camelCase keys matching the persisted format:
// {id, name, created, modified, bpm, timeSignature, tracks, clips}

use crate::playback::timeline::TimeSignature;
use crate::project::track::{Clip, ClipInstance, TrackId, TrackKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// On-disk project document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub id: Uuid,
    pub name: String,
    /// RFC 3339 timestamps
    pub created: String,
    pub modified: String,
    pub bpm: f64,
    pub time_signature: TimeSignature,
    /// Track order is display/mix order and must round-trip exactly
    pub tracks: Vec<TrackFile>,
    pub clips: Vec<Clip>,
}

/// Serialized track state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackFile {
    pub id: TrackId,
    pub name: String,
    pub kind: TrackKind,
    pub muted: bool,
    pub solo: bool,
    pub volume: f32,
    pub pan: f32,
    pub clip_instances: Vec<ClipInstance>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::track::{ClipId, Note};

    #[test]
    fn test_project_file_keys_are_camel_case() {
        let file = ProjectFile {
            id: Uuid::new_v4(),
            name: "Demo".into(),
            created: "2024-01-01T00:00:00+00:00".into(),
            modified: "2024-01-01T00:00:00+00:00".into(),
            bpm: 120.0,
            time_signature: TimeSignature::four_four(),
            tracks: vec![TrackFile {
                id: TrackId::new(),
                name: "Lead".into(),
                kind: TrackKind::Midi,
                muted: false,
                solo: false,
                volume: 1.0,
                pan: 0.0,
                clip_instances: vec![ClipInstance {
                    clip_id: ClipId::new(),
                    start_beat: 0.0,
                    duration_beats: 4.0,
                }],
            }],
            clips: vec![],
        };

        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains("\"timeSignature\""));
        assert!(json.contains("\"clipInstances\""));
        assert!(json.contains("\"startBeat\""));
        assert!(json.contains("\"durationBeats\""));
        assert!(json.contains("\"kind\":\"midi\""));
    }

    #[test]
    fn test_clip_round_trip() {
        let mut clip = Clip::new("Riff", 4.0);
        clip.add_note(Note::new(60, 100, 0.5, 1.0));

        let json = serde_json::to_string(&clip).unwrap();
        assert!(json.contains("\"lengthBeats\""));

        let back: Clip = serde_json::from_str(&json).unwrap();
        assert_eq!(back, clip);
    }

    #[test]
    fn test_track_file_round_trip() {
        let track = TrackFile {
            id: TrackId::new(),
            name: "Bass".into(),
            kind: TrackKind::Audio,
            muted: true,
            solo: false,
            volume: 0.8,
            pan: -0.25,
            clip_instances: vec![],
        };

        let json = serde_json::to_string(&track).unwrap();
        let back: TrackFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, track.id);
        assert_eq!(back.kind, TrackKind::Audio);
        assert!(back.muted);
        assert_eq!(back.pan, -0.25);
    }
}
