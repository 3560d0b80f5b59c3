// Timeline - musical time representation
// Tempo, time signature, bar:beat:tick display, and the loop region

use std::fmt;

/// Lowest accepted tempo
pub const MIN_BPM: f64 = 20.0;
/// Highest accepted tempo
pub const MAX_BPM: f64 = 300.0;

/// Tempo in BPM. Out-of-range values are clamped on every write, never
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
    }

    pub fn beats_per_second(&self) -> f64 {
        self.bpm / 60.0
    }

    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats * self.seconds_per_beat()
    }

    pub fn seconds_to_beats(&self, seconds: f64) -> f64 {
        seconds * self.beats_per_second()
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(120.0)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Time signature (numerator/denominator)
/// Example: 4/4 time = TimeSignature { numerator: 4, denominator: 4 }
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    /// Creates a time signature; both components are clamped to at least 1
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator: numerator.max(1),
            denominator: denominator.max(1),
        }
    }

    pub fn four_four() -> Self {
        Self::new(4, 4)
    }

    pub fn three_four() -> Self {
        Self::new(3, 4)
    }

    pub fn beats_per_bar(&self) -> f64 {
        self.numerator as f64
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Position rendered as bars, beats, and ticks for display.
/// A tick is 1/960th of a beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MusicalTime {
    pub bar: u32,  // 1-based
    pub beat: u32, // 1-based, within bar
    pub tick: u32, // 0-based, within beat
}

impl MusicalTime {
    pub const TICKS_PER_BEAT: u32 = 960;

    pub fn new(bar: u32, beat: u32, tick: u32) -> Self {
        Self { bar, beat, tick }
    }

    /// Bar 1, beat 1, tick 0
    pub fn zero() -> Self {
        Self::new(1, 1, 0)
    }

    /// Convert a fractional beat position into bar:beat:tick display form
    pub fn from_beats(beats: f64, time_signature: &TimeSignature) -> Self {
        let beats = beats.max(0.0);
        let total_ticks = (beats * Self::TICKS_PER_BEAT as f64).round() as u64;
        let ticks_per_beat = Self::TICKS_PER_BEAT as u64;
        let ticks_per_bar = ticks_per_beat * time_signature.numerator as u64;

        let bar = total_ticks / ticks_per_bar + 1;
        let rest = total_ticks % ticks_per_bar;
        let beat = rest / ticks_per_beat + 1;
        let tick = rest % ticks_per_beat;

        Self::new(bar as u32, beat as u32, tick as u32)
    }

    /// Convert back to a fractional beat position
    pub fn to_beats(&self, time_signature: &TimeSignature) -> f64 {
        let bar_beats = (self.bar.saturating_sub(1)) as f64 * time_signature.beats_per_bar();
        let beat_beats = (self.beat.saturating_sub(1)) as f64;
        bar_beats + beat_beats + self.tick as f64 / Self::TICKS_PER_BEAT as f64
    }
}

impl Default for MusicalTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for MusicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{:03}", self.bar, self.beat, self.tick)
    }
}

/// Loop region in beats. `[start, end)` with `start < end` enforced at
/// every mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopRegion {
    start: f64,
    end: f64,
    pub enabled: bool,
}

impl LoopRegion {
    pub fn new(start: f64, end: f64, enabled: bool) -> Self {
        let start = start.max(0.0);
        Self {
            start,
            end: end.max(start + 1.0),
            enabled,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    pub fn set(&mut self, start: f64, end: f64, enabled: bool) {
        *self = Self::new(start, end, enabled);
    }

    /// Apply loop wraparound to a beat position. Positions past the end
    /// fold back into `[start, end)`; everything else passes through.
    pub fn wrap(&self, beat: f64) -> f64 {
        if self.enabled && beat >= self.end {
            self.start + (beat - self.start) % self.length()
        } else {
            beat
        }
    }
}

impl Default for LoopRegion {
    fn default() -> Self {
        Self::new(0.0, 4.0, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_clamps() {
        assert_eq!(Tempo::new(10.0).bpm(), 20.0);
        assert_eq!(Tempo::new(500.0).bpm(), 300.0);
        assert_eq!(Tempo::new(140.0).bpm(), 140.0);

        let mut tempo = Tempo::default();
        tempo.set_bpm(-5.0);
        assert_eq!(tempo.bpm(), 20.0);
    }

    #[test]
    fn test_tempo_conversions() {
        let tempo = Tempo::new(120.0);
        assert_eq!(tempo.beats_per_second(), 2.0);
        assert_eq!(tempo.seconds_per_beat(), 0.5);
        assert_eq!(tempo.beats_to_seconds(4.0), 2.0);
        assert_eq!(tempo.seconds_to_beats(2.0), 4.0);
    }

    #[test]
    fn test_time_signature_clamps() {
        let ts = TimeSignature::new(0, 0);
        assert_eq!(ts.numerator, 1);
        assert_eq!(ts.denominator, 1);
        assert_eq!(TimeSignature::four_four().to_string(), "4/4");
    }

    #[test]
    fn test_musical_time_round_trip() {
        let ts = TimeSignature::four_four();

        let t = MusicalTime::from_beats(0.0, &ts);
        assert_eq!(t, MusicalTime::zero());

        // Beat 5.5 in 4/4 = bar 2, beat 2, tick 480
        let t = MusicalTime::from_beats(5.5, &ts);
        assert_eq!(t, MusicalTime::new(2, 2, 480));
        assert_eq!(t.to_beats(&ts), 5.5);
        assert_eq!(t.to_string(), "2.2.480");
    }

    #[test]
    fn test_musical_time_other_signature() {
        let ts = TimeSignature::three_four();
        let t = MusicalTime::from_beats(3.0, &ts);
        assert_eq!(t, MusicalTime::new(2, 1, 0));
    }

    #[test]
    fn test_loop_region_normalizes() {
        // end <= start is pushed out to start + 1
        let region = LoopRegion::new(4.0, 2.0, true);
        assert_eq!(region.start(), 4.0);
        assert_eq!(region.end(), 5.0);

        let region = LoopRegion::new(-2.0, 8.0, false);
        assert_eq!(region.start(), 0.0);
        assert_eq!(region.end(), 8.0);
    }

    #[test]
    fn test_loop_wrap() {
        let region = LoopRegion::new(0.0, 4.0, true);
        assert_eq!(region.wrap(9.0), 1.0);
        assert_eq!(region.wrap(3.5), 3.5);
        assert_eq!(region.wrap(4.0), 0.0);

        let disabled = LoopRegion::new(0.0, 4.0, false);
        assert_eq!(disabled.wrap(9.0), 9.0);
    }

    #[test]
    fn test_loop_wrap_nonzero_start() {
        let region = LoopRegion::new(2.0, 6.0, true);
        assert_eq!(region.wrap(7.0), 3.0);
        // Positions before the region are left alone
        assert_eq!(region.wrap(1.0), 1.0);
    }
}
