//! SVG rendering of an aim graph
//!
//! Draws the graph in logical coordinates: flows first as curved arrows whose
//! width follows their share, then aims as circles with their titles.

use crate::network::Selection;
use std::fmt::Write;
use summits_geometry::{circular_arrow, Circle};
use summits_model::{Aim, Graph};

/// Rendering knobs
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Smallest radius drawn, so aims without tokens stay visible
    pub min_radius: f64,
    /// Space around the bounding box of the graph
    pub margin: f64,
    /// Stroke colour of the selected aim or flow
    pub highlight: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            min_radius: 10.0,
            margin: 20.0,
            highlight: "#ffb000".to_string(),
        }
    }
}

impl RenderOptions {
    /// Default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum drawn radius
    #[inline]
    #[must_use]
    pub fn with_min_radius(mut self, min_radius: f64) -> Self {
        self.min_radius = min_radius;
        self
    }

    /// Set the margin
    #[inline]
    #[must_use]
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }
}

fn display_circle(aim: &Aim, min_radius: f64) -> Circle {
    let circle = aim.circle();
    Circle::new(circle.pos, circle.r.max(min_radius))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render `graph` as a standalone SVG document
#[must_use]
pub fn render_svg(graph: &Graph, selection: Selection, options: &RenderOptions) -> String {
    let circles: Vec<(&Aim, Circle)> = graph
        .aims()
        .map(|aim| (aim, display_circle(aim, options.min_radius)))
        .collect();

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    if let Some((_, first)) = circles.first() {
        (min_x, min_y, max_x, max_y) = (first.pos.x, first.pos.y, first.pos.x, first.pos.y);
    }
    for (_, c) in &circles {
        min_x = min_x.min(c.pos.x - c.r);
        min_y = min_y.min(c.pos.y - c.r);
        max_x = max_x.max(c.pos.x + c.r);
        max_y = max_y.max(c.pos.y + c.r);
    }
    let m = options.margin;

    // Writing into a String cannot fail.
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
        min_x - m,
        min_y - m,
        max_x - min_x + 2.0 * m,
        max_y - min_y + 2.0 * m
    );

    for flow in graph.flows() {
        let key = flow.key();
        let (Ok(from), Ok(into)) = (graph.aim(key.from), graph.aim(key.into)) else {
            continue;
        };
        let path = circular_arrow(
            display_circle(from, options.min_radius),
            display_circle(into, options.min_radius),
            flow.share(),
        );
        if path.is_empty() {
            continue;
        }
        let stroke = if selection == Selection::Flow(key) {
            format!(r#" stroke="{}" stroke-width="2""#, options.highlight)
        } else {
            String::new()
        };
        let opacity = if flow.is_published() { "0.8" } else { "0.4" };
        let _ = writeln!(
            svg,
            r##"  <path d="{}" fill="#888888" fill-opacity="{opacity}"{stroke}/>"##,
            path.to_svg()
        );
    }

    for (aim, circle) in &circles {
        let stroke = if selection == Selection::Aim(aim.id()) {
            format!(r#" stroke="{}" stroke-width="3""#, options.highlight)
        } else {
            String::new()
        };
        let dash = if aim.is_published() {
            ""
        } else {
            r#" stroke-dasharray="4 2""#
        };
        let _ = writeln!(
            svg,
            r#"  <circle cx="{}" cy="{}" r="{}" fill="{}"{stroke}{dash}/>"#,
            circle.pos.x,
            circle.pos.y,
            circle.r,
            aim.color()
        );
        if !aim.title().is_empty() {
            let _ = writeln!(
                svg,
                r#"  <text x="{}" y="{}" text-anchor="middle">{}</text>"#,
                circle.pos.x,
                circle.pos.y,
                escape(aim.title())
            );
        }
    }

    svg.push_str("</svg>\n");
    svg
}
