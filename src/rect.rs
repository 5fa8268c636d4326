//! Rectangles.

use cgmath::{Point2, Vector2};
use std::ops;

/// A rectangle in screen coordinates.
///
/// The origin is inclusive and the far edge (`origin + size`) is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Rectangle origin (top left corner).
    pub origin: Point2<i32>,

    /// Rectangle size.
    pub size: Vector2<i32>,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(origin: Point2<i32>, size: Vector2<i32>) -> Rect {
        Rect { origin, size }
    }

    /// Creates a rectangle from its top left and (exclusive) bottom right corners.
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Rect {
        Rect {
            origin: Point2::new(x1, y1),
            size: Vector2::new(x2 - x1, y2 - y1),
        }
    }

    pub fn x1(&self) -> i32 {
        self.origin.x
    }

    pub fn y1(&self) -> i32 {
        self.origin.y
    }

    pub fn x2(&self) -> i32 {
        self.origin.x + self.size.x
    }

    pub fn y2(&self) -> i32 {
        self.origin.y + self.size.y
    }

    /// Returns true if the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        self.size.x <= 0 || self.size.y <= 0
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            i64::from(self.size.x) * i64::from(self.size.y)
        }
    }

    /// Returns true if the point is inside the rectangle.
    pub fn contains(&self, point: Point2<i32>) -> bool {
        point.x >= self.x1() && point.y >= self.y1() && point.x < self.x2() && point.y < self.y2()
    }

    /// Returns true if `rect` lies entirely inside this rectangle.
    pub fn contains_rect(&self, rect: Rect) -> bool {
        rect.x1() >= self.x1()
            && rect.y1() >= self.y1()
            && rect.x2() <= self.x2()
            && rect.y2() <= self.y2()
    }

    /// Returns true if the two rectangles share any area.
    pub fn intersects(&self, rect: Rect) -> bool {
        !self.is_empty()
            && !rect.is_empty()
            && self.x1() < rect.x2()
            && self.y1() < rect.y2()
            && rect.x1() < self.x2()
            && rect.y1() < self.y2()
    }

    /// Returns the intersection rectangle.
    pub fn intersect(&self, rect: Rect) -> Option<Rect> {
        if !self.intersects(rect) {
            return None;
        }

        Some(Rect::from_corners(
            self.x1().max(rect.x1()),
            self.y1().max(rect.y1()),
            self.x2().min(rect.x2()),
            self.y2().min(rect.y2()),
        ))
    }

    /// Returns the smallest rectangle covering both rectangles.
    pub fn bounding_union(&self, rect: Rect) -> Rect {
        if self.is_empty() {
            return rect;
        }
        if rect.is_empty() {
            return *self;
        }
        Rect::from_corners(
            self.x1().min(rect.x1()),
            self.y1().min(rect.y1()),
            self.x2().max(rect.x2()),
            self.y2().max(rect.y2()),
        )
    }

    /// Returns a new rectangle grown by `amount` on every side.
    pub fn inflate(&self, amount: i32) -> Rect {
        Rect::from_corners(
            self.x1() - amount,
            self.y1() - amount,
            self.x2() + amount,
            self.y2() + amount,
        )
    }

    /// Returns true if the rectangle, grown by `margin` on every side, has all of its edges
    /// inside the `i32` coordinate space.
    pub fn fits(&self, margin: i32) -> bool {
        let axis = |origin: i32, size: i32| {
            size >= 0
                && origin.checked_sub(margin).is_some()
                && origin
                    .checked_add(size)
                    .and_then(|edge| edge.checked_add(margin))
                    .is_some()
        };
        margin >= 0 && axis(self.origin.x, self.size.x) && axis(self.origin.y, self.size.y)
    }

    /// Translates the rectangle, or returns None if the result would not fit.
    pub fn checked_translate(&self, delta: Vector2<i32>) -> Option<Rect> {
        let rect = Rect {
            origin: Point2::new(
                self.origin.x.checked_add(delta.x)?,
                self.origin.y.checked_add(delta.y)?,
            ),
            size: self.size,
        };
        if rect.fits(0) {
            Some(rect)
        } else {
            None
        }
    }

    /// Returns a new rectangle with the given origin.
    pub fn with_origin(&self, origin: Point2<i32>) -> Rect {
        Rect {
            origin,
            size: self.size,
        }
    }
}

impl ops::Add<Vector2<i32>> for Rect {
    type Output = Rect;
    fn add(self, delta: Vector2<i32>) -> Rect {
        Rect {
            origin: self.origin + delta,
            size: self.size,
        }
    }
}

impl ops::AddAssign<Vector2<i32>> for Rect {
    fn add_assign(&mut self, delta: Vector2<i32>) {
        self.origin += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_edges_are_exclusive() {
        let rect = Rect::from_corners(100, 100, 300, 200);
        assert!(rect.contains(Point2::new(100, 100)));
        assert!(rect.contains(Point2::new(299, 199)));
        assert!(!rect.contains(Point2::new(300, 150)));
        assert!(!rect.contains(Point2::new(150, 200)));
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = Rect::from_corners(0, 0, 10, 10);
        let b = Rect::from_corners(10, 0, 20, 10);
        assert!(!a.intersects(b));
        assert_eq!(a.intersect(b), None);

        let c = Rect::from_corners(5, 5, 15, 15);
        assert_eq!(a.intersect(c), Some(Rect::from_corners(5, 5, 10, 10)));
    }

    #[test]
    fn inflate_and_translate() {
        let rect = Rect::from_corners(10, 20, 30, 40).inflate(2);
        assert_eq!(rect, Rect::from_corners(8, 18, 32, 42));

        let moved = rect + Vector2::new(-8, 2);
        assert_eq!(moved.origin, Point2::new(0, 20));
        assert_eq!(moved.size, rect.size);
    }

    #[test]
    fn edges_must_stay_representable() {
        let rect = Rect::from_corners(0, 0, 100, 50);
        assert!(rect.fits(22));
        assert!(!rect.with_origin(Point2::new(i32::MAX - 10, 0)).fits(0));
        assert!(!rect.with_origin(Point2::new(i32::MIN + 5, 0)).fits(10));

        assert_eq!(rect.checked_translate(Vector2::new(i32::MAX - 10, 0)), None);
        assert_eq!(
            rect.checked_translate(Vector2::new(5, 5)),
            Some(Rect::from_corners(5, 5, 105, 55))
        );
    }
}
