//! The trigger popover: the small control shown next to an active selection.

use crate::geometry::{self, Placement, Rect, Size, Viewport};
use crate::selection::SelectionSnapshot;

/// Derived, never patched: rebuilt from the bound snapshot on every show or
/// reposition.
#[derive(Debug, Clone, PartialEq)]
pub struct PopoverVisualState {
    pub anchor_rect: Option<Rect>,
    pub placement: Option<Placement>,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct TriggerPopover {
    visible: bool,
    bound: Option<SelectionSnapshot>,
    placement: Option<Placement>,
    placement_pending: bool,
    measured: Option<Size>,
}

impl TriggerPopover {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn bound(&self) -> Option<&SelectionSnapshot> {
        self.bound.as_ref()
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    pub fn visual_state(&self) -> PopoverVisualState {
        PopoverVisualState {
            anchor_rect: self.bound.as_ref().map(SelectionSnapshot::rect),
            placement: self.placement,
            visible: self.visible,
        }
    }

    /// Binds `snapshot` and shows the box. Placement waits for the next
    /// frame so it can use the box's measured size.
    pub fn show(&mut self, snapshot: SelectionSnapshot) {
        self.visible = true;
        self.bound = Some(snapshot);
        self.placement_pending = true;
    }

    /// Moves the anchor of an already visible popover. Places immediately
    /// when the box size is known, otherwise on the next frame.
    pub fn reposition(&mut self, snapshot: SelectionSnapshot, viewport: Viewport) {
        if !self.visible {
            return;
        }
        let anchor = snapshot.rect();
        self.bound = Some(snapshot);
        match self.measured {
            Some(size) => {
                self.placement = Some(geometry::place(anchor, size, viewport));
                self.placement_pending = false;
            }
            None => self.placement_pending = true,
        }
    }

    /// Called once per rendered frame with the box's measured size. Returns
    /// true when a new placement was computed.
    pub fn on_frame(&mut self, measured: Size, viewport: Viewport) -> bool {
        if !self.visible {
            return false;
        }
        let resized = self.measured != Some(measured);
        self.measured = Some(measured);
        if !(self.placement_pending || resized) {
            return false;
        }
        let Some(anchor) = self.bound.as_ref().map(SelectionSnapshot::rect) else {
            return false;
        };
        self.placement = Some(geometry::place(anchor, measured, viewport));
        self.placement_pending = false;
        true
    }

    /// Hides the box and forgets the selection it was bound to. Idempotent.
    pub fn hide(&mut self) {
        if !self.visible {
            return;
        }
        self.visible = false;
        self.bound = None;
        self.placement = None;
        self.placement_pending = false;
    }

    /// Hands over the bound snapshot for activation. `None` while hidden.
    pub fn take_binding(&mut self) -> Option<SelectionSnapshot> {
        if !self.visible {
            return None;
        }
        self.bound.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Side;
    use crate::selection::{LiveSelection, SelectionRange};

    fn snapshot(top: f32) -> SelectionSnapshot {
        SelectionSnapshot::capture(&LiveSelection {
            text: "Bonjour".into(),
            rect: Some(Rect::new(top, 100.0, 70.0, 18.0)),
            range: SelectionRange::new(0, 7),
        })
        .unwrap()
    }

    const VIEW: Viewport = Viewport { width: 800.0, height: 600.0 };

    #[test]
    fn placement_is_deferred_until_the_box_is_measured() {
        let mut popover = TriggerPopover::default();
        popover.show(snapshot(200.0));
        assert!(popover.is_visible());
        assert!(popover.placement().is_none());

        assert!(popover.on_frame(Size::new(36.0, 28.0), VIEW));
        let placed = popover.placement().unwrap();
        assert_eq!(placed.side, Side::Above);
        assert_eq!(placed.top, 200.0 - 28.0 - 8.0);

        // nothing changed since: no recomputation
        assert!(!popover.on_frame(Size::new(36.0, 28.0), VIEW));
    }

    #[test]
    fn visibility_follows_the_side_rule() {
        let mut popover = TriggerPopover::default();
        popover.show(snapshot(10.0));
        popover.on_frame(Size::new(36.0, 28.0), VIEW);
        assert_eq!(popover.placement().unwrap().side, Side::Below);
    }

    #[test]
    fn reposition_uses_the_last_measured_size() {
        let mut popover = TriggerPopover::default();
        popover.show(snapshot(200.0));
        popover.on_frame(Size::new(36.0, 28.0), VIEW);

        popover.reposition(snapshot(300.0), VIEW);
        assert_eq!(popover.placement().unwrap().top, 300.0 - 28.0 - 8.0);
        assert_eq!(popover.visual_state().anchor_rect.unwrap().top, 300.0);
    }

    #[test]
    fn reposition_is_ignored_while_hidden() {
        let mut popover = TriggerPopover::default();
        popover.reposition(snapshot(300.0), VIEW);
        assert!(!popover.is_visible());
        assert!(popover.bound().is_none());
    }

    #[test]
    fn hide_forgets_rect_and_binding() {
        let mut popover = TriggerPopover::default();
        popover.show(snapshot(200.0));
        popover.on_frame(Size::new(36.0, 28.0), VIEW);
        popover.hide();
        popover.hide();

        let state = popover.visual_state();
        assert!(!state.visible);
        assert!(state.anchor_rect.is_none());
        assert!(state.placement.is_none());
        assert!(popover.take_binding().is_none());
    }

    #[test]
    fn binding_can_only_be_taken_while_visible() {
        let mut popover = TriggerPopover::default();
        popover.show(snapshot(200.0));
        let taken = popover.take_binding().unwrap();
        assert_eq!(taken.text(), "Bonjour");
        assert!(popover.take_binding().is_none());
    }
}
