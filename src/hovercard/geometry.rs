use std::fmt::{Display, Formatter};

/// Vertical distance between the card and its target, leaving room for the caret.
pub const CARET_HEIGHT: f64 = 12.0;
/// Horizontal offset from the target's center to the caret tip.
pub const CARET_PADDING: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn contains_x(&self, x: f64) -> bool {
        self.left <= x && x <= self.right()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
}

impl Quadrant {
    /// Picks the caret corner for a card placed above or below its target,
    /// with or without room to extend rightwards.
    pub fn from_placement(above: bool, room_to_right: bool) -> Self {
        match (above, room_to_right) {
            (true, true) => Self::TopLeft,
            (true, false) => Self::TopRight,
            (false, true) => Self::BottomLeft,
            (false, false) => Self::BottomRight,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
        }
    }
}

impl Display for Quadrant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Viewport-relative placement for one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub top: f64,
    pub left: f64,
    pub quadrant: Quadrant,
}

pub struct PlacementInput<'a> {
    pub client_rects: &'a [Rect],
    pub bounding_rect: Rect,
    pub card_width: f64,
    pub card_height: f64,
    pub viewport_width: f64,
    pub mouse_x: f64,
}

/// For a target wrapped over several lines, prefer the line box under the pointer.
pub fn select_rect_nearest_mouse(client_rects: &[Rect], bounding_rect: Rect, mouse_x: f64) -> Rect {
    client_rects
        .iter()
        .find(|rect| rect.contains_x(mouse_x))
        .or_else(|| client_rects.first())
        .copied()
        .unwrap_or(bounding_rect)
}

pub fn compute_position(input: PlacementInput<'_>) -> Position {
    let target =
        select_rect_nearest_mouse(input.client_rects, input.bounding_rect, input.mouse_x);

    let above = target.top > input.card_height;
    let room_to_right = input.viewport_width - target.left > input.card_width;
    let center_x = target.left + target.width / 2.0;

    let top = if above {
        target.top - input.card_height - CARET_HEIGHT
    } else {
        target.bottom() + CARET_HEIGHT
    };
    let left = if room_to_right {
        center_x - CARET_PADDING
    } else {
        center_x - input.card_width + CARET_PADDING
    };

    Position {
        top,
        left,
        quadrant: Quadrant::from_placement(above, room_to_right),
    }
}
