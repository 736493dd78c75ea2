//! Viewport geometry and popover placement.
//!
//! All coordinates are viewport-relative pixels with the origin at the
//! top-left corner, the same space the host reports selection rectangles in.

/// Gap between the selection and the popover box.
pub const GAP: f32 = 8.0;
/// Minimum distance kept between the popover box and the viewport edges.
pub const MARGIN: f32 = 8.0;
/// Width of the caret triangle drawn between the box and the selection.
pub const CARET_WIDTH: f32 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self { top, left, width, height }
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn center_x(&self) -> f32 {
        self.left + self.width / 2.0
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// A selection rectangle with no area cannot anchor anything.
    pub fn is_degenerate(&self) -> bool {
        !(self.area() > 0.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Caret {
    pub left: f32,
    pub top: f32,
    /// 0 when the box sits above the selection, 180 when it is flipped below.
    pub rotation_degrees: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub side: Side,
    pub top: f32,
    pub left: f32,
    pub caret: Caret,
}

impl Placement {
    pub fn caret_above(&self) -> bool {
        self.side == Side::Above
    }
}

/// Places a box of `box_size` next to `anchor`, preferring above.
///
/// Falls back to below when the preferred top would cross the top margin,
/// centres horizontally on the anchor and clamps into the viewport. The lower
/// clamp bound wins when the box is too wide to fit between the margins.
pub fn place(anchor: Rect, box_size: Size, viewport: Viewport) -> Placement {
    let preferred_top = anchor.top - box_size.height - GAP;
    let side = if preferred_top >= MARGIN { Side::Above } else { Side::Below };
    let top = match side {
        Side::Above => preferred_top,
        Side::Below => anchor.bottom() + GAP,
    };

    let centered = anchor.center_x() - box_size.width / 2.0;
    let left = centered.min(viewport.width - box_size.width - MARGIN).max(MARGIN);

    let caret = match side {
        Side::Above => Caret {
            left: anchor.center_x() - CARET_WIDTH / 2.0,
            top: anchor.top - 1.0,
            rotation_degrees: 0.0,
        },
        Side::Below => Caret {
            left: anchor.center_x() - CARET_WIDTH / 2.0,
            top: anchor.bottom() + 1.0,
            rotation_degrees: 180.0,
        },
    };

    Placement { side, top, left, caret }
}
