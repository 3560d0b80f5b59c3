// Metronome - click scheduling on beat boundaries
// Clicks are placed at absolute clock times derived from the transport
// anchor, with an accented click on downbeats

use crate::audio::{AudioBackend, EngineError, ToneSpec, Waveform};
use crate::playback::timeline::TimeSignature;
use crate::playback::transport::BeatWindow;

/// Downbeat click frequency in Hz
const ACCENT_FREQUENCY: f64 = 1000.0;
/// Regular click frequency in Hz
const REGULAR_FREQUENCY: f64 = 800.0;
/// Gain reduction applied to non-accented clicks
const REGULAR_LEVEL_SCALE: f32 = 0.6;
/// Click length in seconds
const CLICK_DURATION: f64 = 0.05;

/// Metronome state. Holds no playback position of its own; each scheduling
/// window tells it exactly which beats to click on.
#[derive(Debug, Clone)]
pub struct Metronome {
    enabled: bool,
    volume: f32,
}

impl Metronome {
    pub fn new() -> Self {
        Self {
            enabled: false,
            volume: 0.5,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Schedule one click for every integer beat inside `[window.from,
    /// window.to)`. Click times come from `BeatWindow::time_at`, so timer
    /// jitter in the tick that produced the window does not move them.
    pub fn schedule_clicks(
        &self,
        window: &BeatWindow,
        time_signature: &TimeSignature,
        backend: &mut dyn AudioBackend,
    ) -> Result<(), EngineError> {
        if !self.enabled {
            return Ok(());
        }

        let beats_per_bar = time_signature.numerator as i64;
        let mut beat = window.from.ceil();
        while beat < window.to {
            let downbeat = (beat as i64).rem_euclid(beats_per_bar) == 0;
            let (frequency, level) = if downbeat {
                (ACCENT_FREQUENCY, self.volume)
            } else {
                (REGULAR_FREQUENCY, self.volume * REGULAR_LEVEL_SCALE)
            };

            let start_time = window.time_at(beat);
            backend.schedule_tone(ToneSpec {
                waveform: Waveform::Square,
                frequency,
                level,
                start_time,
                stop_time: start_time + CLICK_DURATION,
            })?;

            beat += 1.0;
        }

        Ok(())
    }
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::OfflineBackend;

    fn test_window(from: f64, to: f64) -> BeatWindow {
        // Anchored at beat 0 / time 0 at 120 BPM: one beat every 0.5s
        BeatWindow {
            from,
            to,
            bpm: 120.0,
            origin_beat: 0.0,
            origin_time: 0.0,
        }
    }

    #[test]
    fn test_disabled_schedules_nothing() {
        let metronome = Metronome::new();
        let mut backend = OfflineBackend::new();
        backend.ensure_running().unwrap();

        metronome
            .schedule_clicks(&test_window(0.0, 4.0), &TimeSignature::four_four(), &mut backend)
            .unwrap();
        assert!(backend.scheduled().is_empty());
    }

    #[test]
    fn test_clicks_on_integer_beats() {
        let mut metronome = Metronome::new();
        metronome.set_enabled(true);
        let mut backend = OfflineBackend::new();
        backend.ensure_running().unwrap();

        // [0.0, 2.1) covers beats 0, 1, 2
        metronome
            .schedule_clicks(&test_window(0.0, 2.1), &TimeSignature::four_four(), &mut backend)
            .unwrap();

        let tones = backend.scheduled();
        assert_eq!(tones.len(), 3);
        assert_eq!(tones[0].start_time, 0.0);
        assert_eq!(tones[1].start_time, 0.5);
        assert_eq!(tones[2].start_time, 1.0);
    }

    #[test]
    fn test_half_open_window() {
        let mut metronome = Metronome::new();
        metronome.set_enabled(true);
        let mut backend = OfflineBackend::new();
        backend.ensure_running().unwrap();

        // Beat 2 sits exactly on the end bound and must not click
        metronome
            .schedule_clicks(&test_window(0.5, 2.0), &TimeSignature::four_four(), &mut backend)
            .unwrap();

        let tones = backend.scheduled();
        assert_eq!(tones.len(), 1);
        assert_eq!(tones[0].start_time, 0.5);
    }

    #[test]
    fn test_downbeat_accent() {
        let mut metronome = Metronome::new();
        metronome.set_enabled(true);
        metronome.set_volume(1.0);
        let mut backend = OfflineBackend::new();
        backend.ensure_running().unwrap();

        // Beats 0..=4 in 4/4: downbeats at 0 and 4
        metronome
            .schedule_clicks(&test_window(0.0, 4.5), &TimeSignature::four_four(), &mut backend)
            .unwrap();

        let tones = backend.scheduled();
        assert_eq!(tones.len(), 5);
        assert_eq!(tones[0].frequency, ACCENT_FREQUENCY);
        assert_eq!(tones[1].frequency, REGULAR_FREQUENCY);
        assert_eq!(tones[4].frequency, ACCENT_FREQUENCY);
        assert!(tones[0].level > tones[1].level);
    }

    #[test]
    fn test_volume_clamped() {
        let mut metronome = Metronome::new();
        metronome.set_volume(3.0);
        assert_eq!(metronome.volume(), 1.0);
        metronome.set_volume(-1.0);
        assert_eq!(metronome.volume(), 0.0);
    }
}
