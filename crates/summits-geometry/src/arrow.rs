//! Curved flow arrows between two circles
//!
//! The arrow body follows an arc of radius `R = |into - from|` around a
//! construction point `M`, placed so that the arc always subtends the same
//! angle. The head is a triangle whose size scales with the body width.

use crate::path::Path;
use crate::vec2::{Circle, Vec2};

/// `sqrt(3/4)`: offset of the arc center from the chord midpoint, in units of `R`
const SQRT_3_4: f64 = 0.866_025_403_784_438_6;

/// Bézier handle length as a fraction of the side it bends
const CONTROL_FRACTION: f64 = 0.34;

/// Derived construction of one arrow, kept for inspection and tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowGeometry {
    /// Arc center
    pub center: Vec2,
    /// Arc radius (distance between the two circle centers)
    pub radius: f64,
    /// Body width
    pub width: f64,
    /// Arrowhead tip, on the boundary of `into`
    pub tip: Vec2,
    /// Arc point the wings are built around
    pub wing_base: Vec2,
    /// Body start, inner side
    pub start_inner: Vec2,
    /// Body start, outer side
    pub start_outer: Vec2,
}

/// Construct the arrow geometry, or `None` when no arrow can be drawn
///
/// Returns `None` when `into` sits closer to `from` than `from.r`, or when the
/// construction leaves the finite plane (coincident centers, a head larger
/// than the arc can carry).
#[must_use]
pub fn arrow_geometry(from: Circle, into: Circle, thickness: f64) -> Option<ArrowGeometry> {
    let delta = into.pos - from.pos;
    let radius = delta.len();

    if radius < from.r {
        return None;
    }

    let center = (from.pos + into.pos) * 0.5 + delta.rot_cw() * SQRT_3_4;
    let width = 2.0 * from.r * thickness;

    let tip = arc_point(center, radius, into.pos, into.r);
    let wing_base = arc_point(center, radius, into.pos, into.r + 2.0 * width);

    let across = (from.pos - center).normalize() * (width * 0.5);
    let geometry = ArrowGeometry {
        center,
        radius,
        width,
        tip,
        wing_base,
        start_inner: from.pos - across,
        start_outer: from.pos + across,
    };

    let finite = [
        geometry.center,
        geometry.tip,
        geometry.wing_base,
        geometry.start_inner,
        geometry.start_outer,
    ]
    .iter()
    .all(|p| p.is_finite());

    finite.then_some(geometry)
}

/// Closed outline of a curved arrow from `from` into `into`
///
/// `thickness` is the fraction of `from`'s diameter used as body width,
/// typically the flow's share. An empty path means nothing should be drawn.
#[must_use]
pub fn circular_arrow(from: Circle, into: Circle, thickness: f64) -> Path {
    let Some(g) = arrow_geometry(from, into, thickness) else {
        return Path::new();
    };

    let wing_normal = (g.wing_base - g.center).normalize();
    let wing_tangent = wing_normal.rot_cw();
    let to_far = wing_normal * g.width;
    let to_near = wing_normal * (g.width * 0.5);

    let wing_outer_far = g.wing_base + to_far;
    let wing_outer_near = g.wing_base + to_near;
    let wing_inner_far = g.wing_base - to_far;
    let wing_inner_near = g.wing_base - to_near;

    let start_tangent = (from.pos - g.center).normalize().rot_cw();

    let outer_distance = wing_outer_near.dist(g.start_outer) * CONTROL_FRACTION;
    let outer_wing_control = wing_outer_near - wing_tangent * outer_distance;
    let outer_start_control = g.start_outer + start_tangent * outer_distance;

    let inner_distance = wing_inner_near.dist(g.start_inner) * CONTROL_FRACTION;
    let inner_wing_control = wing_inner_near - wing_tangent * inner_distance;
    let inner_start_control = g.start_inner + start_tangent * inner_distance;

    Path::new()
        .move_to(g.start_inner)
        .cubic_to(inner_start_control, inner_wing_control, wing_inner_near)
        .line_to(wing_inner_far)
        .line_to(g.tip)
        .line_to(wing_outer_far)
        .line_to(wing_outer_near)
        .cubic_to(outer_wing_control, outer_start_control, g.start_outer)
        .close()
}

/// Point at distance `rho` from `target` on the circle of `radius` around `center`
///
/// Chord-offset construction: step `a = rho²/(2R)` from `target` toward the
/// center, then `h = sqrt(rho² - a²)` sideways.
fn arc_point(center: Vec2, radius: f64, target: Vec2, rho: f64) -> Vec2 {
    let a = rho * rho / (2.0 * radius);
    let h = (rho * rho - a * a).sqrt();

    let outward = (target - center).normalize();
    target - outward * a - outward.rot_cw() * h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathCommand;

    fn circles() -> (Circle, Circle) {
        (
            Circle::new(Vec2::new(0.0, 0.0), 10.0),
            Circle::new(Vec2::new(100.0, 0.0), 10.0),
        )
    }

    #[test]
    fn arrow_is_closed_outline() {
        let (from, into) = circles();
        let path = circular_arrow(from, into, 0.5);

        assert!(!path.is_empty());
        assert!(path.is_closed());
        assert!(matches!(path.commands()[0], PathCommand::MoveTo(_)));
        assert_eq!(path.len(), 8);
        assert!(path.vertices().all(Vec2::is_finite));
    }

    #[test]
    fn overlapping_circles_produce_no_path() {
        let from = Circle::new(Vec2::new(0.0, 0.0), 10.0);
        let into = Circle::new(Vec2::new(5.0, 0.0), 10.0);
        let path = circular_arrow(from, into, 0.5);
        assert!(path.is_empty());
        assert_eq!(path.to_svg(), "");
    }

    #[test]
    fn arc_center_is_equidistant() {
        let (from, into) = circles();
        let g = arrow_geometry(from, into, 0.5).unwrap();
        assert!((g.center.dist(from.pos) - g.radius).abs() < 1e-9);
        assert!((g.center.dist(into.pos) - g.radius).abs() < 1e-9);
        assert!((g.radius - 100.0).abs() < 1e-12);
    }

    #[test]
    fn tip_touches_target_boundary_on_arc() {
        let (from, into) = circles();
        let g = arrow_geometry(from, into, 0.5).unwrap();
        assert!((g.tip.dist(into.pos) - into.r).abs() < 1e-9);
        assert!((g.tip.dist(g.center) - g.radius).abs() < 1e-9);
    }

    #[test]
    fn wing_base_sits_two_widths_behind_tip() {
        let (from, into) = circles();
        let g = arrow_geometry(from, into, 0.5).unwrap();
        assert!((g.width - 10.0).abs() < 1e-12);
        assert!((g.wing_base.dist(into.pos) - (into.r + 2.0 * g.width)).abs() < 1e-9);
    }

    #[test]
    fn start_points_straddle_source_center() {
        let (from, into) = circles();
        let g = arrow_geometry(from, into, 0.25).unwrap();
        assert!((g.start_inner.dist(from.pos) - g.width / 2.0).abs() < 1e-9);
        assert!((g.start_outer.dist(from.pos) - g.width / 2.0).abs() < 1e-9);
        assert!(((g.start_inner + g.start_outer) * 0.5).approx_eq(from.pos, 1e-9));
    }

    #[test]
    fn zero_thickness_is_degenerate_but_valid() {
        let (from, into) = circles();
        let path = circular_arrow(from, into, 0.0);
        assert!(path.is_closed());
        assert!(path.vertices().all(Vec2::is_finite));
    }

    #[test]
    fn coincident_zero_radius_circles_produce_no_path() {
        let c = Circle::new(Vec2::new(3.0, 3.0), 0.0);
        assert!(circular_arrow(c, c, 0.5).is_empty());
    }
}
