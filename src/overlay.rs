//! The overlay controller: the one object a host adapter talks to.
//!
//! All methods run on the UI thread. The host forwards events as they
//! happen, calls [`Overlay::end_of_task`] once it has finished dispatching a
//! batch, reports the popover's measured size every frame, and hands over
//! gateway replies as they arrive.

use crate::gateway::{RequestSink, TranslationReply, TranslationRequest};
use crate::geometry::Size;
use crate::host::{HostEvent, IsolationHost, Key};
use crate::languages::AUTO;
use crate::logger;
use crate::popover::TriggerPopover;
use crate::selection::{HostDocument, SelectionRange, SelectionSnapshot, SelectionTracker, SelectionUpdate};
use crate::session::{Applied, SessionId, SessionStack};

pub struct Overlay<S: RequestSink> {
    host: IsolationHost,
    tracker: SelectionTracker,
    popover: TriggerPopover,
    sessions: SessionStack,
    sink: S,
    default_target: String,
    /// Range the user dismissed the popover on; it stays hidden until the
    /// selection moves to another range.
    dismissed: Option<SelectionRange>,
}

impl<S: RequestSink> Overlay<S> {
    /// Attaches the isolation host. `default_target` is the target language
    /// every new session starts with.
    pub fn new(sink: S, default_target: &str) -> Self {
        Self {
            host: IsolationHost::attach(),
            tracker: SelectionTracker::default(),
            popover: TriggerPopover::default(),
            sessions: SessionStack::default(),
            sink,
            default_target: default_target.to_string(),
            dismissed: None,
        }
    }

    pub fn host(&self) -> &IsolationHost {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut IsolationHost {
        &mut self.host
    }

    pub fn popover(&self) -> &TriggerPopover {
        &self.popover
    }

    pub fn sessions(&self) -> &SessionStack {
        &self.sessions
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn handle_event<D: HostDocument + ?Sized>(&mut self, event: HostEvent, doc: &D) {
        if !self.host.routes(&event) {
            return;
        }
        match event {
            HostEvent::PointerDown(at) => {
                if !self.host.contains(at) {
                    self.dismiss();
                }
            }
            HostEvent::PointerUp(at) => {
                if !self.host.contains(at) {
                    let update = self.tracker.observe(doc);
                    self.on_selection_gesture(update);
                }
            }
            HostEvent::KeyUp => {
                let update = self.tracker.observe(doc);
                self.on_selection_gesture(update);
            }
            HostEvent::KeyDown(Key::Escape) => {
                self.dismiss();
                self.tracker.clear();
            }
            HostEvent::KeyDown(Key::Other) => {}
            HostEvent::SelectionChange => self.tracker.note_change(),
            HostEvent::Scroll | HostEvent::Resize => self.reposition(doc),
        }
    }

    /// Flushes selection changes coalesced during the task that just ended.
    pub fn end_of_task<D: HostDocument + ?Sized>(&mut self, doc: &D) {
        match self.tracker.flush(doc) {
            Some(SelectionUpdate::Changed(snapshot)) => {
                if self.popover.is_visible() && self.popover.bound().is_some_and(|b| b.range() == snapshot.range()) {
                    self.popover.reposition(snapshot, doc.viewport());
                } else {
                    self.arm(snapshot);
                }
            }
            Some(SelectionUpdate::Cleared) => {
                self.dismissed = None;
                self.popover.hide();
            }
            Some(SelectionUpdate::Unchanged) | None => {}
        }
    }

    /// Reports the popover's measured size for this frame.
    pub fn on_frame<D: HostDocument + ?Sized>(&mut self, measured: Size, doc: &D) -> bool {
        self.popover.on_frame(measured, doc.viewport())
    }

    /// Pointer-up and key-up re-arm the popover on a valid selection the
    /// user has not dismissed.
    fn on_selection_gesture(&mut self, update: SelectionUpdate) {
        match update {
            SelectionUpdate::Changed(snapshot) => self.arm(snapshot),
            SelectionUpdate::Unchanged => {
                if let (false, Some(current)) = (self.popover.is_visible(), self.tracker.current()) {
                    self.arm(current.clone());
                }
            }
            SelectionUpdate::Cleared => {
                self.dismissed = None;
                self.popover.hide();
            }
        }
    }

    /// Shows the popover unless the user dismissed it on this same range.
    fn arm(&mut self, snapshot: SelectionSnapshot) {
        if self.dismissed == Some(snapshot.range()) {
            return;
        }
        self.dismissed = None;
        self.popover.show(snapshot);
    }

    fn dismiss(&mut self) {
        let range = self.tracker.current().or(self.popover.bound()).map(|s| s.range());
        if range.is_some() {
            self.dismissed = range;
        }
        self.popover.hide();
    }

    fn reposition<D: HostDocument + ?Sized>(&mut self, doc: &D) {
        if !self.popover.is_visible() {
            return;
        }
        match self.tracker.observe(doc) {
            SelectionUpdate::Changed(snapshot) => self.popover.reposition(snapshot, doc.viewport()),
            SelectionUpdate::Unchanged => {}
            SelectionUpdate::Cleared => self.popover.hide(),
        }
    }

    /// The popover was clicked: restore the selection the click may have
    /// collapsed, open a session bound to its text and hide the popover.
    pub fn activate<D: HostDocument + ?Sized>(&mut self, doc: &mut D) -> Option<SessionId> {
        let snapshot = self.popover.take_binding()?;
        doc.restore_selection(snapshot.range());
        let (id, request) = self.sessions.open(snapshot.text(), AUTO, &self.default_target);
        self.submit(request);
        self.popover.hide();
        Some(id)
    }

    pub fn set_source_lang(&mut self, id: SessionId, lang: &str) {
        if let Some(request) = self.sessions.set_source_lang(id, lang) {
            self.submit(request);
        }
    }

    pub fn set_target_lang(&mut self, id: SessionId, lang: &str) {
        if let Some(request) = self.sessions.set_target_lang(id, lang) {
            self.submit(request);
        }
    }

    pub fn close_session(&mut self, id: SessionId) -> bool {
        self.sessions.close(id)
    }

    pub fn apply_reply(&mut self, reply: TranslationReply) -> Applied {
        self.sessions.apply(reply)
    }

    fn submit(&self, request: TranslationRequest) {
        logger::debug(&format!(
            "Submitting session {} generation {} ({} -> {})",
            request.session, request.generation, request.from, request.to
        ));
        self.sink.submit(request);
    }
}
