/// Pixel-space geometry: float vectors for positions, integer rects for hitboxes.

use std::ops::Add;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Axis-aligned integer rectangle. `(x, y)` is the top-left corner.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    /// Build from a float position. Coordinates truncate toward zero.
    pub fn from_pos(pos: Vec2, w: i32, h: i32) -> Self {
        Rect::new(pos.x as i32, pos.y as i32, w, h)
    }

    pub fn left(&self) -> i32 { self.x }
    pub fn right(&self) -> i32 { self.x + self.w }
    pub fn top(&self) -> i32 { self.y }
    pub fn bottom(&self) -> i32 { self.y + self.h }

    pub fn set_left(&mut self, v: i32) { self.x = v; }
    pub fn set_right(&mut self, v: i32) { self.x = v - self.w; }
    pub fn set_top(&mut self, v: i32) { self.y = v; }
    pub fn set_bottom(&mut self, v: i32) { self.y = v - self.h; }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Strict overlap: rects that only share an edge do not collide.
    /// Empty rects never collide.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.w > 0 && self.h > 0 && other.w > 0 && other.h > 0
            && self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    #[allow(dead_code)]
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        px >= self.x as f64 && px < self.right() as f64
            && py >= self.y as f64 && py < self.bottom() as f64
    }

    /// Grow by `dx` on the left and right and by `dy` on the top and bottom.
    pub fn inflate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x - dx, self.y - dy, self.w + 2 * dx, self.h + 2 * dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::new(0, 0, 16, 16);
        assert!(!a.overlaps(&Rect::new(16, 0, 16, 16)));
        assert!(!a.overlaps(&Rect::new(0, 16, 16, 16)));
        assert!(a.overlaps(&Rect::new(15, 15, 16, 16)));
    }

    #[test]
    fn empty_rect_never_overlaps() {
        assert!(!Rect::new(0, 0, 0, 10).overlaps(&Rect::new(0, 0, 10, 10)));
    }

    #[test]
    fn edge_setters_keep_size() {
        let mut r = Rect::new(10, 10, 16, 28);
        r.set_right(20);
        assert_eq!((r.x, r.w), (4, 16));
        r.set_bottom(40);
        assert_eq!((r.y, r.h), (12, 28));
    }

    #[test]
    fn from_pos_truncates() {
        let r = Rect::from_pos(Vec2::new(3.9, -0.5), 4, 4);
        assert_eq!((r.x, r.y), (3, 0));
    }
}
