//! The isolation host: the one rendering scope every overlay surface lives in,
//! and the input router that decides which host events reach the overlay.

use crate::geometry::{Point, Rect};
use crate::logger;

/// Name of the overlay's root scope. Host adapters key their layers and
/// style scope on it so nothing leaks into the page or out of it.
pub const ROOT_NAME: &str = "--noctis-root";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

/// Events observed on the host document. Observation only: the overlay never
/// prevents the host's default handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    PointerDown(Point),
    PointerUp(Point),
    KeyDown(Key),
    KeyUp,
    SelectionChange,
    Scroll,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerUp,
    KeyDown,
    KeyUp,
    SelectionChange,
    Scroll,
    Resize,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::PointerDown,
        EventKind::PointerUp,
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::SelectionChange,
        EventKind::Scroll,
        EventKind::Resize,
    ];
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::PointerDown(_) => EventKind::PointerDown,
            HostEvent::PointerUp(_) => EventKind::PointerUp,
            HostEvent::KeyDown(_) => EventKind::KeyDown,
            HostEvent::KeyUp => EventKind::KeyUp,
            HostEvent::SelectionChange => EventKind::SelectionChange,
            HostEvent::Scroll => EventKind::Scroll,
            HostEvent::Resize => EventKind::Resize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Explicit subscribe/unsubscribe registry for host events.
#[derive(Debug, Default)]
pub struct InputRouter {
    next_id: u64,
    subscriptions: Vec<(SubscriptionId, EventKind)>,
}

impl InputRouter {
    pub fn subscribe(&mut self, kind: EventKind) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.push((id, kind));
        id
    }

    /// Returns false when the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|(sub, _)| *sub != id);
        self.subscriptions.len() != before
    }

    pub fn is_routed(&self, kind: EventKind) -> bool {
        self.subscriptions.iter().any(|(_, k)| *k == kind)
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Popover,
    Sessions,
}

/// The single isolated container for all overlay UI.
///
/// It owns the input router (its subscriptions live exactly as long as the
/// host is attached) and the screen regions currently covered by overlay
/// surfaces, which is how outside clicks are told apart from inside ones.
#[derive(Debug)]
pub struct IsolationHost {
    router: InputRouter,
    subscriptions: Vec<SubscriptionId>,
    regions: Vec<(Region, Rect)>,
    attached: bool,
}

impl IsolationHost {
    /// Creates the host and subscribes to every event kind the overlay consumes.
    pub fn attach() -> Self {
        let mut router = InputRouter::default();
        let subscriptions = EventKind::ALL.iter().map(|k| router.subscribe(*k)).collect();
        logger::debug(&format!("{ROOT_NAME} attached"));
        Self { router, subscriptions, regions: Vec::new(), attached: true }
    }

    /// Drops every subscription and region. Idempotent.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        for id in self.subscriptions.drain(..) {
            self.router.unsubscribe(id);
        }
        self.regions.clear();
        self.attached = false;
        logger::debug(&format!("{ROOT_NAME} detached"));
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    pub fn routes(&self, event: &HostEvent) -> bool {
        self.attached && self.router.is_routed(event.kind())
    }

    /// Replaces the rectangle covered by `region`; `None` removes it.
    pub fn set_region(&mut self, region: Region, rect: Option<Rect>) {
        self.regions.retain(|(r, _)| *r != region);
        if let (true, Some(rect)) = (self.attached, rect) {
            self.regions.push((region, rect));
        }
    }

    /// Whether `point` falls on any overlay surface.
    pub fn contains(&self, point: Point) -> bool {
        self.regions.iter().any(|(_, rect)| rect.contains(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_routes_every_kind() {
        let host = IsolationHost::attach();
        for kind in EventKind::ALL {
            assert!(host.router().is_routed(kind));
        }
        assert!(host.routes(&HostEvent::Scroll));
    }

    #[test]
    fn detach_unsubscribes_and_is_idempotent() {
        let mut host = IsolationHost::attach();
        host.set_region(Region::Popover, Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        host.detach();
        host.detach();
        assert!(!host.is_attached());
        assert!(host.router().is_empty());
        assert!(!host.routes(&HostEvent::KeyUp));
        assert!(!host.contains(Point::new(5.0, 5.0)));
    }

    #[test]
    fn router_unsubscribe_only_removes_its_own_entry() {
        let mut router = InputRouter::default();
        let a = router.subscribe(EventKind::Scroll);
        let _b = router.subscribe(EventKind::Scroll);
        assert!(router.unsubscribe(a));
        assert!(!router.unsubscribe(a));
        assert!(router.is_routed(EventKind::Scroll));
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn regions_hit_test() {
        let mut host = IsolationHost::attach();
        host.set_region(Region::Popover, Some(Rect::new(10.0, 10.0, 20.0, 20.0)));
        host.set_region(Region::Sessions, Some(Rect::new(100.0, 100.0, 50.0, 50.0)));
        assert!(host.contains(Point::new(15.0, 15.0)));
        assert!(host.contains(Point::new(120.0, 130.0)));
        assert!(!host.contains(Point::new(60.0, 60.0)));

        host.set_region(Region::Popover, None);
        assert!(!host.contains(Point::new(15.0, 15.0)));
    }
}
