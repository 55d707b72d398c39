//! Map UI state: screen, side menu, pointer interaction and view transform

use std::time::{Duration, Instant};
use summits_geometry::{CenterAnimation, GeometryError, Vec2, Viewport};
use summits_model::AimId;

/// What the pointer is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Interaction {
    /// Nothing
    #[default]
    Idle,
    /// Moving an aim; `grab` is the aim position minus the pointer, in logical units
    Dragging {
        /// Aim being moved
        aim: AimId,
        /// Pointer-to-center offset
        grab: Vec2,
    },
    /// Drawing a new flow out of `from`
    Connecting {
        /// Source aim
        from: AimId,
        /// Pointer in logical units
        cursor: Vec2,
    },
    /// Dragging the map; `last` is the previous pointer in pixels
    Panning {
        /// Previous pointer position
        last: Vec2,
    },
}

/// Effect of a pointer move
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEffect {
    /// Nothing to apply
    None,
    /// Move `aim` to `pos`
    MoveAim {
        /// Aim being dragged
        aim: AimId,
        /// New logical position
        pos: Vec2,
    },
    /// The view was panned
    Panned,
}

/// Everything the map view needs besides the graph
#[derive(Debug, Clone)]
pub struct UiState {
    screen_size: Vec2,
    side_menu_open: bool,
    interaction: Interaction,
    viewport: Viewport,
    animation: Option<CenterAnimation>,
}

impl UiState {
    /// UI over a logical square of half side `logical_half_side`
    ///
    /// # Errors
    /// Returns error if `logical_half_side` is not positive and finite
    pub fn new(logical_half_side: f64) -> Result<Self, GeometryError> {
        Ok(Self {
            screen_size: Vec2::ZERO,
            side_menu_open: true,
            interaction: Interaction::Idle,
            viewport: Viewport::new(logical_half_side)?,
            animation: None,
        })
    }

    /// Screen size in pixels
    #[must_use]
    pub fn screen_size(&self) -> Vec2 {
        self.screen_size
    }

    /// Record a new screen size and refit the view
    ///
    /// # Errors
    /// Returns error if either side is not positive
    pub fn set_screen_size(&mut self, x: f64, y: f64) -> Result<(), GeometryError> {
        let size = Vec2::new(x, y);
        self.viewport.fit(size)?;
        self.screen_size = size;
        Ok(())
    }

    /// Whether the side menu is shown
    #[must_use]
    pub fn side_menu_open(&self) -> bool {
        self.side_menu_open
    }

    /// Show or hide the side menu
    pub fn toggle_side_menu(&mut self) {
        self.side_menu_open = !self.side_menu_open;
    }

    /// Current interaction
    #[must_use]
    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    /// View transform
    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutable view transform
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Start moving `aim`, grabbed at screen point `at`
    pub fn begin_drag(&mut self, aim: AimId, aim_pos: Vec2, at: Vec2) {
        self.animation = None;
        self.interaction = Interaction::Dragging {
            aim,
            grab: aim_pos - self.viewport.to_logical(at),
        };
    }

    /// Start drawing a flow out of `from`
    pub fn begin_connect(&mut self, from: AimId, at: Vec2) {
        self.interaction = Interaction::Connecting {
            from,
            cursor: self.viewport.to_logical(at),
        };
    }

    /// Start dragging the map at screen point `at`
    pub fn begin_pan(&mut self, at: Vec2) {
        self.animation = None;
        self.interaction = Interaction::Panning { last: at };
    }

    /// Zoom by `factor` around screen point `anchor`
    pub fn zoom(&mut self, factor: f64, anchor: Vec2) {
        self.animation = None;
        self.viewport.zoom(factor, anchor);
    }

    /// Pointer moved to screen point `at`
    pub fn move_pointer(&mut self, at: Vec2) -> PointerEffect {
        match &mut self.interaction {
            Interaction::Idle => PointerEffect::None,
            Interaction::Dragging { aim, grab } => PointerEffect::MoveAim {
                aim: *aim,
                pos: self.viewport.to_logical(at) + *grab,
            },
            Interaction::Connecting { cursor, .. } => {
                *cursor = self.viewport.to_logical(at);
                PointerEffect::None
            }
            Interaction::Panning { last } => {
                let delta = at - *last;
                *last = at;
                self.viewport.pan(delta);
                PointerEffect::Panned
            }
        }
    }

    /// End the current interaction, returning it
    pub fn end_interaction(&mut self) -> Interaction {
        std::mem::take(&mut self.interaction)
    }

    /// Start centering the view on `target` at `scale`
    ///
    /// # Errors
    /// Returns error if `scale` is not positive and finite; a running
    /// animation is kept
    pub fn center_on(
        &mut self,
        target: Vec2,
        scale: f64,
        duration: Duration,
        now: Instant,
    ) -> Result<(), GeometryError> {
        self.animation = Some(self.viewport.center_on(target, scale, duration, now)?);
        Ok(())
    }

    /// Whether a centering animation is running
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Advance the centering animation; returns `true` while it keeps running
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };
        if animation.tick(&mut self.viewport, now) {
            self.animation = None;
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui() -> UiState {
        let mut ui = UiState::new(500.0).unwrap();
        ui.set_screen_size(1000.0, 1000.0).unwrap();
        ui
    }

    #[test]
    fn side_menu_toggles() {
        let mut ui = ui();
        assert!(ui.side_menu_open());
        ui.toggle_side_menu();
        assert!(!ui.side_menu_open());
    }

    #[test]
    fn drag_keeps_grab_offset() {
        let mut ui = ui();
        let aim = AimId::next();
        // screen center is the logical origin; aim sits 10 units right of it
        ui.begin_drag(aim, Vec2::new(10.0, 0.0), Vec2::new(500.0, 500.0));
        let effect = ui.move_pointer(Vec2::new(600.0, 500.0));
        let PointerEffect::MoveAim { aim: moved, pos } = effect else {
            panic!("expected a move, got {effect:?}");
        };
        assert_eq!(moved, aim);
        assert!(pos.approx_eq(Vec2::new(110.0, 0.0), 1e-9));
    }

    #[test]
    fn pan_moves_view() {
        let mut ui = ui();
        ui.begin_pan(Vec2::new(500.0, 500.0));
        assert_eq!(ui.move_pointer(Vec2::new(520.0, 500.0)), PointerEffect::Panned);
        assert!(ui.viewport().offset().approx_eq(Vec2::new(20.0, 0.0), 1e-9));
        assert!(matches!(ui.end_interaction(), Interaction::Panning { .. }));
        assert_eq!(ui.interaction(), Interaction::Idle);
    }

    #[test]
    fn connect_tracks_cursor() {
        let mut ui = ui();
        let from = AimId::next();
        ui.begin_connect(from, Vec2::new(500.0, 500.0));
        ui.move_pointer(Vec2::new(500.0, 700.0));
        let Interaction::Connecting { cursor, .. } = ui.end_interaction() else {
            panic!("expected connecting");
        };
        assert!(cursor.approx_eq(Vec2::new(0.0, 200.0), 1e-9));
    }

    #[test]
    fn centering_runs_until_done() {
        let mut ui = ui();
        let start = Instant::now();
        ui.center_on(Vec2::new(30.0, 40.0), 2.0, Duration::from_millis(100), start)
            .unwrap();
        assert!(ui.tick(start + Duration::from_millis(50)));
        assert!(!ui.tick(start + Duration::from_millis(100)));
        assert!(!ui.is_animating());
        assert!(ui.viewport().logical_center().approx_eq(Vec2::new(30.0, 40.0), 1e-9));
    }

    #[test]
    fn zero_centering_scale_is_rejected() {
        let mut ui = ui();
        let start = Instant::now();
        let err = ui
            .center_on(Vec2::new(30.0, 40.0), 0.0, Duration::from_millis(10), start)
            .unwrap_err();
        assert!(matches!(err, GeometryError::InvalidScale(_)));
        assert!(!ui.is_animating());

        assert!(!ui.tick(start + Duration::from_millis(20)));
        assert_eq!(ui.viewport().scale(), 1.0);
        let p = ui.viewport().to_logical(Vec2::new(500.0, 500.0));
        assert!(p.x.is_finite() && p.y.is_finite());
    }
}
