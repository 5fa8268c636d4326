//! Regions: sets of pixels described by disjoint rectangles.
//!
//! All operations are exact set operations; the rectangles making up a region never overlap, so
//! the area of a region is the sum of its rectangles’ areas.

use crate::rect::Rect;
use cgmath::Point2;

/// A set of disjoint rectangles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// Creates an empty region.
    pub fn new() -> Region {
        Region { rects: Vec::new() }
    }

    /// Creates a region covering exactly `rect`.
    pub fn from_rect(rect: Rect) -> Region {
        let mut region = Region::new();
        region.reset(rect);
        region
    }

    /// Replaces the contents of this region with `rect`.
    pub fn reset(&mut self, rect: Rect) {
        self.rects.clear();
        if !rect.is_empty() {
            self.rects.push(rect);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// The disjoint rectangles making up this region, in no particular order.
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Number of covered pixels.
    pub fn area(&self) -> i64 {
        self.rects.iter().map(Rect::area).sum()
    }

    pub fn contains(&self, point: Point2<i32>) -> bool {
        self.rects.iter().any(|rect| rect.contains(point))
    }

    /// Returns true if this region and `rect` share any pixel.
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        self.rects.iter().any(|r| r.intersects(rect))
    }

    /// Returns true if the two regions share any pixel.
    pub fn intersects(&self, other: &Region) -> bool {
        other.rects.iter().any(|rect| self.intersects_rect(*rect))
    }

    /// Bounding rectangle of the region, or None if it’s empty.
    pub fn extents(&self) -> Option<Rect> {
        let mut rects = self.rects.iter();
        let first = *rects.next()?;
        Some(rects.fold(first, |acc, rect| acc.bounding_union(*rect)))
    }

    /// Adds `rect` to the region.
    pub fn union_rect(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        // punch a hole for the new rect first so the pieces stay disjoint
        self.subtract_rect(rect);
        self.rects.push(rect);
    }

    /// Removes `rect` from the region.
    pub fn subtract_rect(&mut self, rect: Rect) {
        if rect.is_empty() || !self.intersects_rect(rect) {
            return;
        }

        let mut pieces = Vec::with_capacity(self.rects.len() + 4);
        for current in self.rects.drain(..) {
            split_around(current, rect, &mut pieces);
        }
        self.rects = pieces;
    }

    /// Restricts the region to `rect`.
    pub fn intersect_rect(&mut self, rect: Rect) {
        self.rects = self
            .rects
            .iter()
            .filter_map(|current| current.intersect(rect))
            .collect();
    }
}

/// Pushes the parts of `rect` that lie outside `hole` (at most four bands).
fn split_around(rect: Rect, hole: Rect, out: &mut Vec<Rect>) {
    let overlap = match rect.intersect(hole) {
        Some(overlap) => overlap,
        None => {
            out.push(rect);
            return;
        }
    };

    let bands = [
        // above
        Rect::from_corners(rect.x1(), rect.y1(), rect.x2(), overlap.y1()),
        // below
        Rect::from_corners(rect.x1(), overlap.y2(), rect.x2(), rect.y2()),
        // left
        Rect::from_corners(rect.x1(), overlap.y1(), overlap.x1(), overlap.y2()),
        // right
        Rect::from_corners(overlap.x2(), overlap.y1(), rect.x2(), overlap.y2()),
    ];
    out.extend(bands.iter().filter(|band| !band.is_empty()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtract_punches_a_hole() {
        let mut region = Region::from_rect(Rect::from_corners(0, 0, 100, 100));
        region.subtract_rect(Rect::from_corners(25, 25, 75, 75));

        assert_eq!(region.area(), 100 * 100 - 50 * 50);
        assert!(!region.contains(Point2::new(50, 50)));
        assert!(region.contains(Point2::new(10, 50)));
        assert!(region.contains(Point2::new(80, 80)));
        assert_eq!(region.extents(), Some(Rect::from_corners(0, 0, 100, 100)));
    }

    #[test]
    fn union_keeps_pieces_disjoint() {
        let mut region = Region::from_rect(Rect::from_corners(0, 0, 10, 10));
        region.union_rect(Rect::from_corners(5, 5, 15, 15));
        region.union_rect(Rect::from_corners(0, 0, 10, 10));

        assert_eq!(region.area(), 100 + 100 - 25);
        for (i, a) in region.rects().iter().enumerate() {
            for b in &region.rects()[i + 1..] {
                assert!(!a.intersects(*b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn intersect_keeps_only_shared_pixels() {
        let mut region = Region::from_rect(Rect::from_corners(0, 0, 10, 10));
        region.union_rect(Rect::from_corners(20, 0, 30, 10));
        region.intersect_rect(Rect::from_corners(5, 0, 25, 5));
        assert_eq!(region.area(), 5 * 5 * 2);

        region.intersect_rect(Rect::from_corners(0, 0, 8, 8));
        assert_eq!(region.rects(), &[Rect::from_corners(5, 0, 8, 5)]);
    }

    #[test]
    fn subtracting_everything_empties_the_region() {
        let mut region = Region::from_rect(Rect::from_corners(10, 10, 20, 20));
        region.subtract_rect(Rect::from_corners(0, 0, 50, 50));
        assert!(region.is_empty());
        assert_eq!(region.extents(), None);
    }
}
