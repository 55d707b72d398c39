//! Pan/zoom mapping between screen pixels and logical map space
//!
//! The screen-side square (`client_offset`, `half_side`) maps onto the logical
//! square of half side `logical_half_side / scale`, shifted by `offset`:
//!
//! ```text
//! logical = ((p - client_offset) / half_side - (1, 1)) * (logical_half_side / scale) - offset
//! ```

use crate::vec2::Vec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::{Duration, Instant};

/// Errors constructing or resizing a viewport
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// Extent must be positive and finite
    #[error("invalid extent: {0}")]
    InvalidExtent(f64),

    /// Scale must be positive and finite
    #[error("invalid scale: {0}")]
    InvalidScale(f64),
}

/// Screen ↔ logical coordinate transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    client_offset: Vec2,
    half_side: f64,
    logical_half_side: f64,
    scale: f64,
    offset: Vec2,
}

impl Viewport {
    /// Viewport over a logical square of half side `logical_half_side`
    ///
    /// Starts as a 2×2 pixel screen at the origin; call [`Viewport::fit`]
    /// once the real screen size is known.
    ///
    /// # Errors
    /// Returns error if `logical_half_side` is not positive and finite
    pub fn new(logical_half_side: f64) -> Result<Self, GeometryError> {
        check_extent(logical_half_side)?;
        Ok(Self {
            client_offset: Vec2::ZERO,
            half_side: 1.0,
            logical_half_side,
            scale: 1.0,
            offset: Vec2::ZERO,
        })
    }

    /// Fit to a screen of `size` pixels using the largest centered square
    ///
    /// # Errors
    /// Returns error if the smaller side is not positive and finite
    pub fn fit(&mut self, size: Vec2) -> Result<(), GeometryError> {
        let side = size.x.min(size.y);
        check_extent(side)?;
        self.half_side = side / 2.0;
        self.client_offset = Vec2::new((size.x - side) / 2.0, (size.y - side) / 2.0);
        Ok(())
    }

    /// Current zoom
    #[inline]
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Current pan offset in logical units
    #[inline]
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Top-left corner of the mapped screen square
    #[inline]
    #[must_use]
    pub fn client_offset(&self) -> Vec2 {
        self.client_offset
    }

    /// Half side of the mapped screen square, in pixels
    #[inline]
    #[must_use]
    pub fn half_side(&self) -> f64 {
        self.half_side
    }

    /// Half side of the logical square at scale 1
    #[inline]
    #[must_use]
    pub fn logical_half_side(&self) -> f64 {
        self.logical_half_side
    }

    /// Set offset directly
    #[inline]
    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    /// Set scale directly
    ///
    /// # Errors
    /// Returns error if `scale` is not positive and finite
    pub fn set_scale(&mut self, scale: f64) -> Result<(), GeometryError> {
        check_scale(scale)?;
        self.scale = scale;
        Ok(())
    }

    /// Logical units per pixel
    #[inline]
    #[must_use]
    pub fn units_per_pixel(&self) -> f64 {
        self.logical_half_side / (self.scale * self.half_side)
    }

    /// Screen pixel to logical point
    #[must_use]
    pub fn to_logical(&self, p: Vec2) -> Vec2 {
        ((p - self.client_offset) / self.half_side - Vec2::ONE)
            * (self.logical_half_side / self.scale)
            - self.offset
    }

    /// Logical point to screen pixel
    #[must_use]
    pub fn to_physical(&self, l: Vec2) -> Vec2 {
        ((l + self.offset) * (self.scale / self.logical_half_side) + Vec2::ONE) * self.half_side
            + self.client_offset
    }

    /// Screen center in logical space
    #[must_use]
    pub fn logical_center(&self) -> Vec2 {
        -self.offset
    }

    /// Drag the map by `screen_delta` pixels
    ///
    /// The logical point under the cursor follows the cursor.
    pub fn pan(&mut self, screen_delta: Vec2) {
        self.offset += screen_delta * self.units_per_pixel();
    }

    /// Multiply scale by `factor`, keeping `anchor` on the same logical point
    ///
    /// Non-positive or non-finite factors are ignored.
    pub fn zoom(&mut self, factor: f64, anchor: Vec2) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        // scale first, then correct offset by the anchor's drift
        let before = self.to_logical(anchor);
        self.scale *= factor;
        let after = self.to_logical(anchor);
        self.offset += after - before;
    }

    /// Offset that puts `target` at the screen center
    #[inline]
    #[must_use]
    pub fn offset_centering(target: Vec2) -> Vec2 {
        -target
    }

    /// Start animating toward `target` at `target_scale`
    ///
    /// # Errors
    /// Returns error if `target_scale` is not positive and finite
    pub fn center_on(
        &self,
        target: Vec2,
        target_scale: f64,
        duration: Duration,
        now: Instant,
    ) -> Result<CenterAnimation, GeometryError> {
        check_scale(target_scale)?;
        Ok(CenterAnimation {
            started: now,
            duration,
            from_offset: self.offset,
            to_offset: Self::offset_centering(target),
            from_scale: self.scale,
            to_scale: target_scale,
        })
    }
}

fn check_scale(scale: f64) -> Result<(), GeometryError> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidScale(scale))
    }
}

fn check_extent(value: f64) -> Result<(), GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidExtent(value))
    }
}

/// Cosine ease-in-out over `[0, 1]`
#[inline]
#[must_use]
pub fn ease_in_out(t: f64) -> f64 {
    (1.0 - (PI * t.clamp(0.0, 1.0)).cos()) / 2.0
}

/// Time-driven interpolation of offset and scale
///
/// Driven by external ticks; each tick computes the elapsed time since the
/// start and writes the interpolated state into the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterAnimation {
    started: Instant,
    duration: Duration,
    from_offset: Vec2,
    to_offset: Vec2,
    from_scale: f64,
    to_scale: f64,
}

impl CenterAnimation {
    /// Linear progress in `[0, 1]` at `now`
    #[must_use]
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Apply the state at `now`; returns `true` once the animation has finished
    pub fn tick(&self, viewport: &mut Viewport, now: Instant) -> bool {
        let progress = self.progress(now);
        let eased = ease_in_out(progress);

        viewport.offset = self.to_offset.mix(self.from_offset, eased);
        viewport.scale = self.to_scale * eased + self.from_scale * (1.0 - eased);

        progress >= 1.0
    }

    /// Final offset
    #[inline]
    #[must_use]
    pub fn target_offset(&self) -> Vec2 {
        self.to_offset
    }

    /// Final scale
    #[inline]
    #[must_use]
    pub fn target_scale(&self) -> f64 {
        self.to_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        let mut v = Viewport::new(500.0).unwrap();
        v.fit(Vec2::new(800.0, 600.0)).unwrap();
        v
    }

    #[test]
    fn fit_centers_square() {
        let v = viewport();
        assert_eq!(v.half_side(), 300.0);
        assert_eq!(v.client_offset(), Vec2::new(100.0, 0.0));
    }

    #[test]
    fn screen_center_maps_to_negated_offset() {
        let mut v = viewport();
        v.set_offset(Vec2::new(12.0, -4.0));
        let center = Vec2::new(400.0, 300.0);
        assert!(v.to_logical(center).approx_eq(Vec2::new(-12.0, 4.0), 1e-9));
        assert!(v.logical_center().approx_eq(Vec2::new(-12.0, 4.0), 1e-12));
    }

    #[test]
    fn square_corners_map_to_logical_extent() {
        let v = viewport();
        assert!(v.to_logical(Vec2::new(100.0, 0.0)).approx_eq(Vec2::new(-500.0, -500.0), 1e-9));
        assert!(v.to_logical(Vec2::new(700.0, 600.0)).approx_eq(Vec2::new(500.0, 500.0), 1e-9));
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut v = viewport();
        let anchor = Vec2::new(250.0, 410.0);
        let before = v.to_logical(anchor);
        v.zoom(1.7, anchor);
        assert!((v.scale() - 1.7).abs() < 1e-12);
        assert!(v.to_logical(anchor).approx_eq(before, 1e-9));
    }

    #[test]
    fn zoom_ignores_invalid_factor() {
        let mut v = viewport();
        v.zoom(0.0, Vec2::ZERO);
        v.zoom(-2.0, Vec2::ZERO);
        v.zoom(f64::NAN, Vec2::ZERO);
        assert_eq!(v.scale(), 1.0);
    }

    #[test]
    fn pan_keeps_point_under_cursor() {
        let mut v = viewport();
        let grab = Vec2::new(300.0, 200.0);
        let grabbed = v.to_logical(grab);
        let delta = Vec2::new(35.0, -20.0);
        v.pan(delta);
        assert!(v.to_logical(grab + delta).approx_eq(grabbed, 1e-9));
    }

    #[test]
    fn invalid_extents_rejected() {
        assert_eq!(Viewport::new(0.0), Err(GeometryError::InvalidExtent(0.0)));
        let mut v = viewport();
        assert!(v.fit(Vec2::new(0.0, 100.0)).is_err());
        assert!(v.set_scale(-1.0).is_err());
    }

    #[test]
    fn ease_curve_endpoints() {
        assert!(ease_in_out(0.0).abs() < 1e-12);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-12);
        assert!((ease_in_out(1.0) - 1.0).abs() < 1e-12);
        assert!((ease_in_out(2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn center_animation_reaches_target() {
        let mut v = viewport();
        let start = Instant::now();
        let animation = v
            .center_on(Vec2::new(40.0, 60.0), 2.0, Duration::from_millis(400), start)
            .unwrap();

        assert!(!animation.tick(&mut v, start));
        assert_eq!(v.offset(), Vec2::ZERO);
        assert_eq!(v.scale(), 1.0);

        assert!(!animation.tick(&mut v, start + Duration::from_millis(200)));
        assert!(v.offset().approx_eq(Vec2::new(-20.0, -30.0), 1e-9));
        assert!((v.scale() - 1.5).abs() < 1e-9);

        assert!(animation.tick(&mut v, start + Duration::from_millis(450)));
        assert!(v.offset().approx_eq(Vec2::new(-40.0, -60.0), 1e-12));
        assert!((v.scale() - 2.0).abs() < 1e-12);
        assert!(v.logical_center().approx_eq(Vec2::new(40.0, 60.0), 1e-12));
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let mut v = viewport();
        let now = Instant::now();
        let animation = v
            .center_on(Vec2::new(1.0, 1.0), 1.0, Duration::ZERO, now)
            .unwrap();
        assert!(animation.tick(&mut v, now));
        assert!(v.offset().approx_eq(Vec2::new(-1.0, -1.0), 1e-12));
    }

    #[test]
    fn centering_rejects_degenerate_scale() {
        let v = viewport();
        let now = Instant::now();
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = v
                .center_on(Vec2::ZERO, scale, Duration::from_millis(10), now)
                .unwrap_err();
            assert!(matches!(err, GeometryError::InvalidScale(_)));
        }
    }
}
