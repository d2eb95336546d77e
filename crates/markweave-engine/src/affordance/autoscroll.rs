use super::view::{Point, Viewport};

/// How far to scroll this frame while dragging at `point`: negative near the
/// top edge, positive near the bottom edge, zero elsewhere or when the
/// container cannot scroll that way.
pub fn scroll_delta(viewport: &Viewport, point: Point, edge: f64, step: f64) -> f64 {
    if viewport.max_scroll() <= 0.0 {
        return 0.0;
    }
    let rect = viewport.rect;
    if viewport.scroll_top > 0.0 && (point.y - rect.y).abs() < edge {
        return -step.min(viewport.scroll_top);
    }
    let remaining = viewport.max_scroll() - viewport.scroll_top;
    if remaining > 0.0 && (point.y - rect.bottom()).abs() < edge {
        return step.min(remaining);
    }
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affordance::view::Rect;
    use rstest::rstest;

    fn viewport(scroll_top: f64) -> Viewport {
        Viewport {
            rect: Rect::new(0.0, 100.0, 400.0, 300.0),
            scroll_top,
            content_height: 1000.0,
        }
    }

    #[rstest]
    #[case::top_edge(50.0, 105.0, -10.0)]
    #[case::top_edge_near_start(4.0, 105.0, -4.0)]
    #[case::top_edge_at_start(0.0, 105.0, 0.0)]
    #[case::middle(50.0, 250.0, 0.0)]
    #[case::bottom_edge(50.0, 395.0, 10.0)]
    #[case::bottom_edge_near_end(695.0, 395.0, 5.0)]
    #[case::bottom_edge_at_end(700.0, 395.0, 0.0)]
    fn edges_scroll_by_a_fixed_step(#[case] scroll_top: f64, #[case] y: f64, #[case] expected: f64) {
        let delta = scroll_delta(&viewport(scroll_top), Point::new(10.0, y), 20.0, 10.0);
        assert_eq!(delta, expected);
    }

    #[test]
    fn short_content_never_scrolls() {
        let short = Viewport {
            rect: Rect::new(0.0, 0.0, 400.0, 300.0),
            scroll_top: 0.0,
            content_height: 200.0,
        };
        assert_eq!(scroll_delta(&short, Point::new(0.0, 295.0), 20.0, 10.0), 0.0);
    }
}
