use proptest::prelude::*;
use summits_geometry::{circular_arrow, Circle, Vec2, Viewport};

fn viewport(width: f64, height: f64, scale: f64, offset: Vec2) -> Viewport {
    let mut v = Viewport::new(1000.0).unwrap();
    v.fit(Vec2::new(width, height)).unwrap();
    v.set_scale(scale).unwrap();
    v.set_offset(offset);
    v
}

fn close(a: Vec2, b: Vec2) -> bool {
    let tolerance = 1e-6 * (1.0 + a.len().max(b.len()));
    a.approx_eq(b, tolerance)
}

proptest! {
    #[test]
    fn prop_physical_logical_round_trip(
        width in 100.0..4000.0f64,
        height in 100.0..4000.0f64,
        scale in 0.01..100.0f64,
        ox in -5000.0..5000.0f64,
        oy in -5000.0..5000.0f64,
        px in -2000.0..6000.0f64,
        py in -2000.0..6000.0f64,
    ) {
        let v = viewport(width, height, scale, Vec2::new(ox, oy));
        let p = Vec2::new(px, py);
        prop_assert!(close(v.to_physical(v.to_logical(p)), p));
    }

    #[test]
    fn prop_zoom_preserves_anchor(
        scale in 0.05..20.0f64,
        factor in 0.05..20.0f64,
        ox in -500.0..500.0f64,
        oy in -500.0..500.0f64,
        ax in 0.0..1920.0f64,
        ay in 0.0..1080.0f64,
    ) {
        let mut v = viewport(1920.0, 1080.0, scale, Vec2::new(ox, oy));
        let anchor = Vec2::new(ax, ay);
        let before = v.to_logical(anchor);
        v.zoom(factor, anchor);
        prop_assert!(close(v.to_logical(anchor), before));
    }

    #[test]
    fn prop_arrow_closed_or_empty(
        fx in -500.0..500.0f64,
        fy in -500.0..500.0f64,
        ix in -500.0..500.0f64,
        iy in -500.0..500.0f64,
        fr in 1.0..60.0f64,
        ir in 1.0..60.0f64,
        thickness in 0.0..1.0f64,
    ) {
        let from = Circle::new(Vec2::new(fx, fy), fr);
        let into = Circle::new(Vec2::new(ix, iy), ir);
        let path = circular_arrow(from, into, thickness);

        if from.pos.dist(into.pos) < from.r {
            prop_assert!(path.is_empty());
        }
        if !path.is_empty() {
            prop_assert!(path.is_closed());
            prop_assert!(path.vertices().all(Vec2::is_finite));
        }
    }
}

#[test]
fn spec_example_arrow() {
    let from = Circle::new(Vec2::new(0.0, 0.0), 10.0);
    let into = Circle::new(Vec2::new(100.0, 0.0), 10.0);
    let path = circular_arrow(from, into, 0.5);
    let svg = path.to_svg();

    assert!(svg.starts_with("M "));
    assert!(svg.ends_with(" Z"));
    assert_eq!(svg.matches('C').count(), 2);
    assert_eq!(svg.matches('L').count(), 4);
}

#[test]
fn target_inside_source_radius_yields_empty_svg() {
    let from = Circle::new(Vec2::new(0.0, 0.0), 10.0);
    let into = Circle::new(Vec2::new(5.0, 0.0), 10.0);
    assert_eq!(circular_arrow(from, into, 0.5).to_svg(), "");
}
