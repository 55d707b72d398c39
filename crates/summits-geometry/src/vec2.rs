//! Minimal `f64` 2D vector
//!
//! Provides [`Vec2`] with the handful of operations the map needs. Operators
//! return new values; there are no in-place variants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// 2D point or direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component
    pub x: f64,
    /// Vertical component
    pub y: f64,
}

impl Vec2 {
    /// Origin
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// `(1, 1)`
    pub const ONE: Self = Self { x: 1.0, y: 1.0 };

    /// Create vector from components
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared length
    #[inline]
    #[must_use]
    pub fn len2(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Euclidean length
    #[inline]
    #[must_use]
    pub fn len(self) -> f64 {
        self.len2().sqrt()
    }

    /// Squared distance to `other`
    #[inline]
    #[must_use]
    pub fn dist2(self, other: Self) -> f64 {
        (self - other).len2()
    }

    /// Distance to `other`
    #[inline]
    #[must_use]
    pub fn dist(self, other: Self) -> f64 {
        self.dist2(other).sqrt()
    }

    /// Unit vector in the same direction
    ///
    /// A zero vector normalizes to NaN components, same as the division it is.
    #[inline]
    #[must_use]
    pub fn normalize(self) -> Self {
        self / self.len()
    }

    /// Both components exactly zero
    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Both components finite
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Rotate by 90° clockwise (screen coordinates, y down)
    #[inline]
    #[must_use]
    pub fn rot_cw(self) -> Self {
        Self::new(self.y, -self.x)
    }

    /// `self * weight + other * (1 - weight)`
    #[inline]
    #[must_use]
    pub fn mix(self, other: Self, weight: f64) -> Self {
        self * weight + other * (1.0 - weight)
    }

    /// Component-wise division
    #[inline]
    #[must_use]
    pub fn div_elem(self, other: Self) -> Self {
        Self::new(self.x / other.x, self.y / other.y)
    }

    /// Approximate equality with absolute tolerance per component
    #[inline]
    #[must_use]
    pub fn approx_eq(self, other: Self, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s)
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;

    fn div(self, n: f64) -> Self {
        Self::new(self.x / n, self.y / n)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Circle used for nodes on the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center
    pub pos: Vec2,
    /// Radius
    pub r: f64,
}

impl Circle {
    /// Create circle
    #[inline]
    #[must_use]
    pub const fn new(pos: Vec2, r: f64) -> Self {
        Self { pos, r }
    }

    /// Whether `point` lies inside or on the circle
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.pos.dist2(point) <= self.r * self.r
    }
}
