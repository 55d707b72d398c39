//! SVG-style outline paths
//!
//! A [`Path`] is a list of absolute [`PathCommand`]s that renders to the
//! `d` attribute of an SVG `<path>` element.

use crate::vec2::Vec2;
use std::fmt;

/// Single absolute path command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Start a new sub-path
    MoveTo(Vec2),
    /// Straight segment to point
    LineTo(Vec2),
    /// Cubic Bézier: two control points, then the end point
    CubicTo(Vec2, Vec2, Vec2),
    /// Close the current sub-path
    Close,
}

impl PathCommand {
    /// Point the pen ends at after this command, if it moves the pen
    #[inline]
    #[must_use]
    pub fn end_point(&self) -> Option<Vec2> {
        match self {
            Self::MoveTo(p) | Self::LineTo(p) | Self::CubicTo(_, _, p) => Some(*p),
            Self::Close => None,
        }
    }
}

impl fmt::Display for PathCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoveTo(p) => write!(f, "M {p}"),
            Self::LineTo(p) => write!(f, "L {p}"),
            Self::CubicTo(c1, c2, p) => write!(f, "C {c1} {c2} {p}"),
            Self::Close => f.write_str("Z"),
        }
    }
}

/// Ordered list of path commands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    /// Empty path
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `MoveTo`
    #[must_use]
    pub fn move_to(mut self, p: Vec2) -> Self {
        self.commands.push(PathCommand::MoveTo(p));
        self
    }

    /// Append `LineTo`
    #[must_use]
    pub fn line_to(mut self, p: Vec2) -> Self {
        self.commands.push(PathCommand::LineTo(p));
        self
    }

    /// Append `CubicTo`
    #[must_use]
    pub fn cubic_to(mut self, c1: Vec2, c2: Vec2, p: Vec2) -> Self {
        self.commands.push(PathCommand::CubicTo(c1, c2, p));
        self
    }

    /// Append `Close`
    #[must_use]
    pub fn close(mut self) -> Self {
        self.commands.push(PathCommand::Close);
        self
    }

    /// Commands in order
    #[inline]
    #[must_use]
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// No commands
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of commands
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Point of the first `MoveTo`
    #[must_use]
    pub fn start(&self) -> Option<Vec2> {
        self.commands.iter().find_map(|c| match c {
            PathCommand::MoveTo(p) => Some(*p),
            _ => None,
        })
    }

    /// Ends with `Close`, so the outline returns to its start
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self.commands.last(), Some(PathCommand::Close))
    }

    /// Every point the pen visits, control points excluded
    pub fn vertices(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.commands.iter().filter_map(PathCommand::end_point)
    }

    /// SVG `d` attribute
    #[must_use]
    pub fn to_svg(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{command}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_renders_empty_string() {
        assert_eq!(Path::new().to_svg(), "");
        assert!(!Path::new().is_closed());
    }

    #[test]
    fn renders_svg_commands() {
        let path = Path::new()
            .move_to(Vec2::new(0.0, 0.0))
            .cubic_to(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0), Vec2::new(2.0, 2.0))
            .line_to(Vec2::new(0.5, 2.0))
            .close();

        assert_eq!(path.to_svg(), "M 0 0 C 1 0 2 1 2 2 L 0.5 2 Z");
        assert_eq!(path.len(), 4);
        assert!(path.is_closed());
        assert_eq!(path.start(), Some(Vec2::ZERO));
    }

    #[test]
    fn vertices_skip_control_points() {
        let path = Path::new()
            .move_to(Vec2::new(0.0, 0.0))
            .cubic_to(Vec2::new(9.0, 9.0), Vec2::new(8.0, 8.0), Vec2::new(1.0, 1.0))
            .close();
        let points: Vec<_> = path.vertices().collect();
        assert_eq!(points, vec![Vec2::ZERO, Vec2::new(1.0, 1.0)]);
    }
}
