//! Selection tracking: turns the host's live selection into immutable
//! snapshots and keeps the single current one.

use crate::geometry::{Rect, Viewport};

/// Opaque handle the host can re-apply to restore a selection.
///
/// The overlay never interprets the offsets; they mean whatever the host
/// document that produced them says they mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionRange {
    start: usize,
    end: usize,
}

impl SelectionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }
}

/// What the host reports when asked for its current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSelection {
    pub text: String,
    pub rect: Option<Rect>,
    pub range: SelectionRange,
}

/// The host document as the overlay sees it.
pub trait HostDocument {
    /// The selection as it is right now, if there is one at all.
    fn live_selection(&self) -> Option<LiveSelection>;

    /// Re-applies a previously captured range.
    fn restore_selection(&mut self, range: SelectionRange);

    fn viewport(&self) -> Viewport;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSnapshot {
    text: String,
    rect: Rect,
    range: SelectionRange,
}

impl SelectionSnapshot {
    /// `None` for blank text or a rectangle with no area.
    pub fn capture(live: &LiveSelection) -> Option<Self> {
        let text = live.text.trim();
        if text.is_empty() {
            return None;
        }
        let rect = live.rect.filter(|r| !r.is_degenerate())?;
        Some(Self { text: text.to_string(), rect, range: live.range })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn range(&self) -> SelectionRange {
        self.range
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionUpdate {
    /// A new selection, or the same one with a different rectangle.
    Changed(SelectionSnapshot),
    /// Identical to the current snapshot.
    Unchanged,
    Cleared,
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    current: Option<SelectionSnapshot>,
    change_pending: bool,
}

impl SelectionTracker {
    pub fn current(&self) -> Option<&SelectionSnapshot> {
        self.current.as_ref()
    }

    /// Reads the live selection and supersedes the current snapshot.
    pub fn observe<D: HostDocument + ?Sized>(&mut self, doc: &D) -> SelectionUpdate {
        let next = doc.live_selection().as_ref().and_then(SelectionSnapshot::capture);
        match next {
            None => {
                self.current = None;
                SelectionUpdate::Cleared
            }
            Some(snapshot) if self.current.as_ref() == Some(&snapshot) => SelectionUpdate::Unchanged,
            Some(snapshot) => {
                self.current = Some(snapshot.clone());
                SelectionUpdate::Changed(snapshot)
            }
        }
    }

    /// Records a selection-change signal; the read happens in [`flush`](Self::flush).
    pub fn note_change(&mut self) {
        self.change_pending = true;
    }

    /// Handles all selection changes noted during the task, once.
    pub fn flush<D: HostDocument + ?Sized>(&mut self, doc: &D) -> Option<SelectionUpdate> {
        if !std::mem::take(&mut self.change_pending) {
            return None;
        }
        Some(self.observe(doc))
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.change_pending = false;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    pub(crate) struct FakeDocument {
        pub selection: Option<LiveSelection>,
        pub restored: Vec<SelectionRange>,
        pub viewport: Viewport,
        pub reads: Cell<usize>,
    }

    impl FakeDocument {
        pub(crate) fn new() -> Self {
            Self { viewport: Viewport::new(1024.0, 768.0), ..Default::default() }
        }

        pub(crate) fn select(&mut self, text: &str, rect: Rect, start: usize) {
            self.selection = Some(LiveSelection {
                text: text.to_string(),
                rect: Some(rect),
                range: SelectionRange::new(start, start + text.chars().count()),
            });
        }

        pub(crate) fn clear(&mut self) {
            self.selection = None;
        }
    }

    impl HostDocument for FakeDocument {
        fn live_selection(&self) -> Option<LiveSelection> {
            self.reads.set(self.reads.get() + 1);
            self.selection.clone()
        }

        fn restore_selection(&mut self, range: SelectionRange) {
            self.restored.push(range);
        }

        fn viewport(&self) -> Viewport {
            self.viewport
        }
    }

    fn rect() -> Rect {
        Rect::new(100.0, 50.0, 60.0, 18.0)
    }

    #[test]
    fn capture_trims_text() {
        let live = LiveSelection {
            text: "  Bonjour \n".into(),
            rect: Some(rect()),
            range: SelectionRange::new(0, 11),
        };
        let snap = SelectionSnapshot::capture(&live).unwrap();
        assert_eq!(snap.text(), "Bonjour");
        assert_eq!(snap.range(), SelectionRange::new(0, 11));
    }

    #[test]
    fn blank_text_or_flat_rect_is_no_snapshot() {
        let blank = LiveSelection { text: " \t ".into(), rect: Some(rect()), range: SelectionRange::new(0, 3) };
        assert!(SelectionSnapshot::capture(&blank).is_none());

        let flat = LiveSelection {
            text: "word".into(),
            rect: Some(Rect::new(10.0, 10.0, 0.0, 0.0)),
            range: SelectionRange::new(0, 4),
        };
        assert!(SelectionSnapshot::capture(&flat).is_none());

        let no_rect = LiveSelection { text: "word".into(), rect: None, range: SelectionRange::new(0, 4) };
        assert!(SelectionSnapshot::capture(&no_rect).is_none());
    }

    #[test]
    fn observe_supersedes_and_clears() {
        let mut doc = FakeDocument::new();
        let mut tracker = SelectionTracker::default();

        doc.select("Hello", rect(), 0);
        assert!(matches!(tracker.observe(&doc), SelectionUpdate::Changed(_)));
        assert_eq!(tracker.observe(&doc), SelectionUpdate::Unchanged);

        doc.select("world", rect(), 6);
        match tracker.observe(&doc) {
            SelectionUpdate::Changed(s) => assert_eq!(s.text(), "world"),
            other => panic!("expected change, got {other:?}"),
        }

        doc.clear();
        assert_eq!(tracker.observe(&doc), SelectionUpdate::Cleared);
        assert!(tracker.current().is_none());
    }

    #[test]
    fn moved_rect_is_a_change_of_the_same_selection() {
        let mut doc = FakeDocument::new();
        let mut tracker = SelectionTracker::default();
        doc.select("Hello", rect(), 0);
        tracker.observe(&doc);

        doc.select("Hello", Rect::new(40.0, 50.0, 60.0, 18.0), 0);
        let SelectionUpdate::Changed(moved) = tracker.observe(&doc) else {
            panic!("expected a change");
        };
        assert_eq!(moved.range(), SelectionRange::new(0, 5));
        assert_eq!(tracker.current(), Some(&moved));
    }

    #[test]
    fn selection_changes_are_coalesced_until_flush() {
        let mut doc = FakeDocument::new();
        let mut tracker = SelectionTracker::default();
        doc.select("Hello", rect(), 0);

        tracker.note_change();
        tracker.note_change();
        tracker.note_change();
        assert_eq!(doc.reads.get(), 0);

        assert!(matches!(tracker.flush(&doc), Some(SelectionUpdate::Changed(_))));
        assert_eq!(doc.reads.get(), 1);
        assert_eq!(tracker.flush(&doc), None);
        assert_eq!(doc.reads.get(), 1);
    }
}
