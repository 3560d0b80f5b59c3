// Transport - play-state machine and lookahead scheduler
// Converts wall-clock time into musical position and dispatches
// non-overlapping beat windows to registered listeners

use crate::audio::{AudioBackend, EngineError};
use crate::playback::metronome::Metronome;
use crate::playback::timeline::{LoopRegion, MusicalTime, Tempo, TimeSignature};
use std::cell::RefCell;
use std::rc::Rc;

/// Scheduler tick period in seconds
pub const SCHEDULER_INTERVAL: f64 = 0.025;
/// Lookahead horizon in seconds
pub const SCHEDULE_AHEAD: f64 = 0.1;

/// Transport state (play/stop/pause/record)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
    Recording,
}

impl TransportState {
    /// Playing or Recording: the clock is advancing
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing | TransportState::Recording)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, TransportState::Recording)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, TransportState::Stopped | TransportState::Paused)
    }
}

/// One half-open scheduling window `[from, to)` in beats.
///
/// Carries the transport anchor so listeners can convert any beat in the
/// window to an absolute clock time themselves. Event times must come from
/// `time_at`, never from the moment the tick happened to fire; that is what
/// keeps playback steady despite timer jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatWindow {
    pub from: f64,
    pub to: f64,
    pub bpm: f64,
    /// Beat position at the transport anchor
    pub origin_beat: f64,
    /// Clock time of the transport anchor, in seconds
    pub origin_time: f64,
}

impl BeatWindow {
    /// Absolute clock time at which `beat` plays
    pub fn time_at(&self, beat: f64) -> f64 {
        self.origin_time + (beat - self.origin_beat) * 60.0 / self.bpm
    }

    pub fn contains(&self, beat: f64) -> bool {
        beat >= self.from && beat < self.to
    }
}

/// Handle returned by listener registration; pass back to remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle(u64);

type BeatListener = Box<dyn FnMut(&BeatWindow) -> Result<(), EngineError>>;
type TickListener = Box<dyn FnMut(f64)>;

/// Timing authority for a session. Owns the play-state machine, tempo and
/// time signature, the loop region, the metronome, and the lookahead
/// scheduling loop.
///
/// Single-threaded and cooperative: the host calls `pump()` at its own
/// cadence (typically once per rendered frame) and the transport runs
/// scheduler ticks on its fixed internal period.
pub struct Transport {
    backend: Rc<RefCell<dyn AudioBackend>>,

    state: TransportState,
    tempo: Tempo,
    time_signature: TimeSignature,
    loop_region: LoopRegion,
    metronome: Metronome,

    /// Beat position at the anchor (play start, seek, tempo change)
    start_beat: f64,
    /// Clock time of the anchor
    start_time: f64,
    /// Frozen position while paused
    held_beat: f64,
    /// End bound of the last dispatched window
    last_scheduled_beat: f64,
    /// Next scheduler tick deadline; None while the scheduler is cancelled
    next_tick_due: Option<f64>,

    beat_listeners: Vec<(u64, BeatListener)>,
    tick_listeners: Vec<(u64, TickListener)>,
    next_listener_id: u64,

    disposed: bool,
}

impl Transport {
    pub fn new(backend: Rc<RefCell<dyn AudioBackend>>) -> Self {
        Self {
            backend,
            state: TransportState::Stopped,
            tempo: Tempo::default(),
            time_signature: TimeSignature::default(),
            loop_region: LoopRegion::default(),
            metronome: Metronome::default(),
            start_beat: 0.0,
            start_time: 0.0,
            held_beat: 0.0,
            last_scheduled_beat: 0.0,
            next_tick_due: None,
            beat_listeners: Vec::new(),
            tick_listeners: Vec::new(),
            next_listener_id: 0,
            disposed: false,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn tempo(&self) -> &Tempo {
        &self.tempo
    }

    pub fn bpm(&self) -> f64 {
        self.tempo.bpm()
    }

    /// Set the tempo, clamped to the valid range. While playing, the
    /// position is re-anchored first so the playhead does not jump.
    pub fn set_bpm(&mut self, bpm: f64) {
        if self.state.is_playing() {
            let now = self.backend.borrow().current_time();
            let beat = self.current_beat_at(now);
            self.anchor(beat, now);
        }
        self.tempo.set_bpm(bpm);
    }

    pub fn time_signature(&self) -> &TimeSignature {
        &self.time_signature
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
    }

    pub fn loop_region(&self) -> &LoopRegion {
        &self.loop_region
    }

    /// Set the loop region; bounds are normalized so start < end always holds
    pub fn set_loop(&mut self, start: f64, end: f64, enabled: bool) {
        self.loop_region.set(start, end, enabled);
    }

    pub fn metronome(&self) -> &Metronome {
        &self.metronome
    }

    pub fn metronome_mut(&mut self) -> &mut Metronome {
        &mut self.metronome
    }

    /// Current musical position in beats
    pub fn current_beat(&self) -> f64 {
        match self.state {
            TransportState::Playing | TransportState::Recording => {
                let now = self.backend.borrow().current_time();
                self.current_beat_at(now)
            }
            TransportState::Paused => self.held_beat,
            TransportState::Stopped => self.start_beat,
        }
    }

    /// Current position in bar:beat:tick display form
    pub fn position(&self) -> MusicalTime {
        MusicalTime::from_beats(self.current_beat(), &self.time_signature)
    }

    /// Start playback. No-op when already playing or recording. Makes sure
    /// the audio backend is running before the clock starts.
    pub fn play(&mut self) -> Result<(), EngineError> {
        if self.disposed || self.state.is_playing() {
            return Ok(());
        }
        self.backend.borrow_mut().ensure_running()?;
        let now = self.backend.borrow().current_time();

        let resume_beat = match self.state {
            TransportState::Paused => self.held_beat,
            _ => self.start_beat,
        };
        self.anchor(resume_beat, now);
        self.last_scheduled_beat = resume_beat;
        self.state = TransportState::Playing;
        self.next_tick_due = Some(now);
        Ok(())
    }

    /// Pause, freezing the current position. Cancels the scheduling loop
    /// synchronously.
    pub fn pause(&mut self) {
        if !self.state.is_playing() {
            return;
        }
        let now = self.backend.borrow().current_time();
        self.held_beat = self.current_beat_at(now);
        self.state = TransportState::Paused;
        self.next_tick_due = None;
    }

    /// Stop playback. The position reverts to the beat playback started
    /// from.
    pub fn stop(&mut self) {
        if self.state == TransportState::Stopped {
            return;
        }
        self.state = TransportState::Stopped;
        self.next_tick_due = None;
    }

    /// Enter record mode; re-enters `play()` when not already rolling
    pub fn record(&mut self) -> Result<(), EngineError> {
        if self.state == TransportState::Recording {
            return Ok(());
        }
        self.play()?;
        self.state = TransportState::Recording;
        Ok(())
    }

    pub fn toggle_play(&mut self) -> Result<(), EngineError> {
        if self.state.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Seek to a beat position. Negative values clamp to zero and the loop
    /// region wrap applies, so seeking past the loop end lands inside the
    /// loop. Play state is preserved.
    pub fn set_position(&mut self, beat: f64) {
        let target = self.loop_region.wrap(beat.max(0.0));
        match self.state {
            TransportState::Playing | TransportState::Recording => {
                let now = self.backend.borrow().current_time();
                self.anchor(target, now);
                self.last_scheduled_beat = target;
            }
            TransportState::Paused => {
                self.held_beat = target;
                self.start_beat = target;
            }
            TransportState::Stopped => {
                self.start_beat = target;
            }
        }
    }

    /// Register a beat-window listener. Called once per scheduler tick
    /// while playing; windows tile without gaps or overlap. A listener
    /// returning an error is logged and never stops the scheduler or the
    /// other listeners.
    pub fn add_beat_listener<F>(&mut self, listener: F) -> ListenerHandle
    where
        F: FnMut(&BeatWindow) -> Result<(), EngineError> + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.beat_listeners.push((id, Box::new(listener)));
        ListenerHandle(id)
    }

    pub fn remove_beat_listener(&mut self, handle: ListenerHandle) {
        self.beat_listeners.retain(|(id, _)| *id != handle.0);
    }

    /// Register a UI position listener. Fired once per `pump()` while
    /// playing, at whatever cadence the host pumps; cosmetic only and never
    /// a timing source.
    pub fn add_tick_listener<F>(&mut self, listener: F) -> ListenerHandle
    where
        F: FnMut(f64) + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.tick_listeners.push((id, Box::new(listener)));
        ListenerHandle(id)
    }

    pub fn remove_tick_listener(&mut self, handle: ListenerHandle) {
        self.tick_listeners.retain(|(id, _)| *id != handle.0);
    }

    /// Drive both periodic loops. The host calls this at its rendering
    /// cadence; scheduler ticks run on their own fixed period inside. Does
    /// nothing unless playing or recording.
    pub fn pump(&mut self) {
        if self.disposed || !self.state.is_playing() {
            return;
        }
        let now = self.backend.borrow().current_time();

        if let Some(due) = self.next_tick_due {
            if now >= due {
                self.scheduler_tick(now);
                self.next_tick_due = Some(now + SCHEDULER_INTERVAL);
            }
        }

        let beat = self.current_beat_at(now);
        for (_, listener) in self.tick_listeners.iter_mut() {
            listener(beat);
        }
    }

    /// Tear down the transport: cancel both loops and drop every listener.
    /// Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.state = TransportState::Stopped;
        self.next_tick_due = None;
        self.beat_listeners.clear();
        self.tick_listeners.clear();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn anchor(&mut self, beat: f64, now: f64) {
        self.start_beat = beat;
        self.start_time = now;
    }

    fn current_beat_at(&self, now: f64) -> f64 {
        let raw = self.start_beat + (now - self.start_time) * self.tempo.beats_per_second();
        self.loop_region.wrap(raw)
    }

    /// One lookahead tick: dispatch the next window and handle loop
    /// wraparound.
    fn scheduler_tick(&mut self, now: f64) {
        let raw = self.start_beat + (now - self.start_time) * self.tempo.beats_per_second();

        // Loop wraparound: seek to the loop start before building the
        // window, so the window carries the fresh anchor and the next pass
        // restarts from the start beat itself, not from wherever inside the
        // loop this tick happened to land.
        if self.loop_region.enabled && raw >= self.loop_region.end() {
            self.anchor(self.loop_region.start(), now);
        }

        let current = self.start_beat + (now - self.start_time) * self.tempo.beats_per_second();
        let mut until = current + self.tempo.seconds_to_beats(SCHEDULE_AHEAD);

        // While looping, never schedule past the loop end: those beats
        // belong to the next pass and get their times from the next anchor.
        if self.loop_region.enabled {
            until = until.min(self.loop_region.end());
        }

        // After a seek or loop wrap the playhead sits behind the last
        // window; restart the chain from the current position.
        if self.last_scheduled_beat > until {
            self.last_scheduled_beat = current;
        }

        let window = BeatWindow {
            from: self.last_scheduled_beat,
            to: until,
            bpm: self.tempo.bpm(),
            origin_beat: self.start_beat,
            origin_time: self.start_time,
        };

        if window.to > window.from {
            {
                let mut backend = self.backend.borrow_mut();
                if let Err(e) =
                    self.metronome
                        .schedule_clicks(&window, &self.time_signature, &mut *backend)
                {
                    log::warn!("metronome scheduling failed: {}", e);
                }
            }
            for (id, listener) in self.beat_listeners.iter_mut() {
                if let Err(e) = listener(&window) {
                    log::warn!("beat listener {} failed: {}", id, e);
                }
            }
            self.last_scheduled_beat = window.to;
        }
    }
}
