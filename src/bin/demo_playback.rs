// Quick demonstration of the playback engine
// Run with: cargo run --bin demo_playback

use loopdeck::audio::OfflineBackend;
use loopdeck::project::Note;
use loopdeck::session::Session;
use std::cell::RefCell;
use std::rc::Rc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🎵 LoopDeck - Playback Engine Demo");
    println!("==================================");

    // Offline backend: a manual clock we drive ourselves, so the demo is
    // deterministic and needs no audio device
    let backend = Rc::new(RefCell::new(OfflineBackend::new()));
    let mut session = Session::new(backend.clone());

    // Build a small project: two clips across two tracks
    {
        let mut project = session.project_mut();
        project.set_name("Demo Song");
        project.set_bpm(120.0);

        let riff = project.create_clip("Riff", 4.0);
        project.add_note_to_clip(riff, Note::new(60, 100, 0.0, 1.0))?;
        project.add_note_to_clip(riff, Note::new(64, 90, 1.0, 1.0))?;
        project.add_note_to_clip(riff, Note::new(67, 90, 2.0, 1.0))?;

        let bass = project.create_clip("Bass", 4.0);
        project.add_note_to_clip(bass, Note::new(36, 110, 0.0, 2.0))?;
        project.add_note_to_clip(bass, Note::new(43, 110, 2.0, 2.0))?;

        let lead_track = project.create_midi_track("Lead");
        let bass_track = project.create_midi_track("Bass");
        project.add_clip_to_track(lead_track, riff, 0.0)?;
        project.add_clip_to_track(lead_track, riff, 4.0)?;
        project.add_clip_to_track(bass_track, bass, 0.0)?;

        println!("✅ Created project: {}", project.name());
        println!("   - Tempo: {:.0} BPM", project.bpm());
        println!("   - Tracks: {}", project.tracks().len());
        println!("   - Clips: {}", project.clips().len());
    }

    // Metronome on, loop the first two bars
    session.transport_mut().metronome_mut().set_enabled(true);
    session.transport_mut().set_loop(0.0, 8.0, true);

    println!("\n▶️  Playing 5 seconds of the loop...");
    session.transport_mut().play()?;

    let mut total_notes = 0;
    for _ in 0..200 {
        session.pump();
        for note in session.drain_notes() {
            println!(
                "   note {:3} vel {:3} at {:.3}s..{:.3}s",
                note.pitch, note.velocity, note.start_time, note.stop_time
            );
            total_notes += 1;
        }
        backend.borrow_mut().advance(0.025);
    }

    let clicks = backend.borrow().scheduled().len();
    println!("\n📊 Scheduled {} notes and {} metronome clicks", total_notes, clicks);
    println!(
        "   Transport position: {} ({:?})",
        session.transport().position(),
        session.transport().state()
    );

    // Save and reload through JSON
    let path = std::env::temp_dir().join("loopdeck_demo.json");
    session.save_project(&path)?;
    println!("\n💾 Saved project to: {}", path.display());

    session.load_project(&path)?;
    println!(
        "📂 Reloaded: {} ({} tracks)",
        session.project().name(),
        session.project().tracks().len()
    );

    session.dispose();
    println!("\n✨ Done");
    Ok(())
}
