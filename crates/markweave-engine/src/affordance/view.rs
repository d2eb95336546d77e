//! Screen geometry the host reports after each render.
//!
//! The binding only maps screen to document. It is rebuilt by the host after
//! every render and never outlives the document it was measured against.

use crate::models::Element;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    fn distance_y(&self, y: f64) -> f64 {
        if y < self.y {
            self.y - y
        } else if y >= self.bottom() {
            y - self.bottom()
        } else {
            0.0
        }
    }
}

/// The rendered box of the block node starting at `pos`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBox {
    pub pos: usize,
    pub rect: Rect,
}

/// The scroll container around the document.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Visible area in screen coordinates.
    pub rect: Rect,
    pub scroll_top: f64,
    /// Full height of the scrolled content.
    pub content_height: f64,
}

impl Viewport {
    pub fn max_scroll(&self) -> f64 {
        (self.content_height - self.rect.height).max(0.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewBinding {
    boxes: Vec<NodeBox>,
    viewport: Viewport,
}

impl ViewBinding {
    pub fn new(mut boxes: Vec<NodeBox>, viewport: Viewport) -> Self {
        boxes.sort_by_key(|b| b.pos);
        Self { boxes, viewport }
    }

    pub fn boxes(&self) -> &[NodeBox] {
        &self.boxes
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Position of the innermost block under `point`, probing `probe` pixels
    /// to the right first so hovering the gutter finds the block beside it.
    pub fn hit(&self, point: Point, probe: f64) -> Option<usize> {
        self.innermost(Point::new(point.x + probe, point.y))
            .or_else(|| self.innermost(point))
    }

    /// Nested boxes start after their ancestors, so the containing box with
    /// the greatest position is the innermost.
    fn innermost(&self, point: Point) -> Option<usize> {
        self.boxes
            .iter()
            .filter(|b| b.rect.contains(point))
            .map(|b| b.pos)
            .max()
    }

    pub fn rect(&self, pos: usize) -> Option<Rect> {
        self.boxes
            .binary_search_by_key(&pos, |b| b.pos)
            .ok()
            .map(|i| self.boxes[i].rect)
    }

    /// The block vertically closest to `point`, for drops in the gaps
    /// between blocks.
    pub fn nearest(&self, point: Point, probe: f64) -> Option<usize> {
        self.hit(point, probe).or_else(|| {
            self.boxes
                .iter()
                .min_by(|a, b| a.rect.distance_y(point.y).total_cmp(&b.rect.distance_y(point.y)))
                .map(|b| b.pos)
        })
    }

    /// The block boundary a drop at `point` lands on: before the nearest
    /// block when the point is in its upper half, after it otherwise.
    pub fn pos_at(&self, doc: &Element, point: Point, probe: f64) -> Option<usize> {
        let pos = self.nearest(point, probe)?;
        let size = doc.resolve(pos).ok()?.node_after()?.node_size();
        let rect = self.rect(pos)?;
        Some(if point.y < rect.center_y() { pos } else { pos + size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn binding() -> ViewBinding {
        ViewBinding::new(
            vec![
                NodeBox { pos: 5, rect: Rect::new(20.0, 40.0, 200.0, 60.0) },
                NodeBox { pos: 0, rect: Rect::new(0.0, 0.0, 220.0, 30.0) },
                NodeBox { pos: 6, rect: Rect::new(40.0, 40.0, 180.0, 20.0) },
            ],
            Viewport::default(),
        )
    }

    #[test]
    fn hit_prefers_the_innermost_box() {
        assert_eq!(binding().hit(Point::new(50.0, 45.0), 0.0), Some(6));
        assert_eq!(binding().hit(Point::new(50.0, 80.0), 0.0), Some(5));
    }

    #[test]
    fn gutter_hover_probes_to_the_right() {
        assert_eq!(binding().hit(Point::new(-40.0, 10.0), 70.0), Some(0));
        assert_eq!(binding().hit(Point::new(-40.0, 10.0), 0.0), None);
    }

    #[test]
    fn nearest_falls_back_to_vertical_distance() {
        assert_eq!(binding().nearest(Point::new(10.0, 33.0), 0.0), Some(0));
        assert_eq!(binding().nearest(Point::new(10.0, 200.0), 0.0), Some(5));
    }

    #[test]
    fn drops_land_on_the_nearer_edge() {
        let b = crate::test_support::builder();
        let doc = b.doc(vec![b.p(vec![b.text("abc")]), b.hr()]);
        let binding = ViewBinding::new(
            vec![
                NodeBox { pos: 0, rect: Rect::new(0.0, 0.0, 200.0, 20.0) },
                NodeBox { pos: 5, rect: Rect::new(0.0, 20.0, 200.0, 10.0) },
            ],
            Viewport::default(),
        );
        assert_eq!(binding.pos_at(&doc, Point::new(10.0, 4.0), 0.0), Some(0));
        assert_eq!(binding.pos_at(&doc, Point::new(10.0, 15.0), 0.0), Some(5));
        assert_eq!(binding.pos_at(&doc, Point::new(10.0, 90.0), 0.0), Some(6));
    }

    #[test]
    fn rect_lookup() {
        assert_eq!(binding().rect(6), Some(Rect::new(40.0, 40.0, 180.0, 20.0)));
        assert_eq!(binding().rect(1), None);
    }
}
