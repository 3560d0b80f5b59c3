// Session - wires a project to a transport over one audio backend
// Owns the beat-listener subscription and the pending-note queue

use crate::audio::AudioBackend;
use crate::playback::transport::Transport;
use crate::project::{Project, ProjectError, ScheduledNote};
use std::cell::{Ref, RefCell, RefMut};
use std::path::Path;
use std::rc::Rc;

/// A live editing/playback session: one transport, one project, and the
/// subscription between them. The transport hands beat windows to the
/// project; the notes the project schedules are queued here for the host
/// (a synth, a renderer, a test) to drain.
pub struct Session {
    transport: Transport,
    project: Rc<RefCell<Project>>,
    pending_notes: Rc<RefCell<Vec<ScheduledNote>>>,
}

impl Session {
    pub fn new(backend: Rc<RefCell<dyn AudioBackend>>) -> Self {
        Self::with_project(backend, Project::new("Untitled"))
    }

    pub fn with_project(backend: Rc<RefCell<dyn AudioBackend>>, project: Project) -> Self {
        let mut transport = Transport::new(backend);
        transport.set_bpm(project.bpm());
        transport.set_time_signature(*project.time_signature());

        let project = Rc::new(RefCell::new(project));
        let pending_notes = Rc::new(RefCell::new(Vec::new()));

        let listener_project = project.clone();
        let listener_notes = pending_notes.clone();
        transport.add_beat_listener(move |window| {
            let notes = listener_project.borrow_mut().schedule_playback(window);
            listener_notes.borrow_mut().extend(notes);
            Ok(())
        });

        Self {
            transport,
            project,
            pending_notes,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    pub fn project(&self) -> Ref<'_, Project> {
        self.project.borrow()
    }

    pub fn project_mut(&self) -> RefMut<'_, Project> {
        self.project.borrow_mut()
    }

    /// Drive the transport one host cycle
    pub fn pump(&mut self) {
        self.transport.pump();
    }

    /// Take the notes scheduled since the last drain
    pub fn drain_notes(&mut self) -> Vec<ScheduledNote> {
        std::mem::take(&mut *self.pending_notes.borrow_mut())
    }

    /// Stop the transport, silence every in-flight voice, and discard
    /// anything still queued.
    pub fn stop(&mut self) {
        self.transport.stop();
        self.project.borrow_mut().stop_all_voices();
        self.pending_notes.borrow_mut().clear();
    }

    pub fn save_project(&self, path: &Path) -> Result<(), ProjectError> {
        self.project.borrow().save_to_path(path)
    }

    /// Replace the current project with one loaded from disk. Playback
    /// stops first; the transport picks up the loaded tempo and meter.
    pub fn load_project(&mut self, path: &Path) -> Result<(), ProjectError> {
        let loaded = Project::load_from_path(path)?;
        self.install_project(loaded);
        Ok(())
    }

    pub fn load_project_json(&mut self, json: &str) -> Result<(), ProjectError> {
        let loaded = Project::from_json(json)?;
        self.install_project(loaded);
        Ok(())
    }

    fn install_project(&mut self, loaded: Project) {
        self.stop();
        self.transport.set_bpm(loaded.bpm());
        self.transport.set_time_signature(*loaded.time_signature());
        *self.project.borrow_mut() = loaded;
    }

    pub fn dispose(&mut self) {
        self.stop();
        self.transport.dispose();
    }
}
