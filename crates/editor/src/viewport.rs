use crate::ViewportOptions;
use egui::emath::TSTransform;
use egui::{Pos2, Rect, Vec2};
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::debug;

/// Transform that centers `bounds` on a screen of the given size, as large as
/// the zoom range and padding allow
pub fn transform_for_bounds(
    bounds: Rect,
    size: Vec2,
    zoom_range: RangeInclusive<f32>,
    padding: f32,
) -> TSTransform {
    let zoom_x = size.x / (bounds.width() * (1.0 + padding));
    let zoom_y = size.y / (bounds.height() * (1.0 + padding));
    // Not `clamp`, which panics on an inverted or NaN range
    let zoom = zoom_x
        .min(zoom_y)
        .max(*zoom_range.start())
        .min(*zoom_range.end());

    TSTransform::new(size / 2.0 - bounds.center().to_vec2() * zoom, zoom)
}

#[derive(Debug, Clone)]
struct Transition {
    from: TSTransform,
    to: TSTransform,
    duration: Duration,
    elapsed: Duration,
}

impl Transition {
    fn step(&mut self, dt: Duration) -> (TSTransform, bool) {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        if self.elapsed >= self.duration {
            return (self.to, true);
        }

        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        let translation = self.from.translation + (self.to.translation - self.from.translation) * t;
        let scaling = self.from.scaling + (self.to.scaling - self.from.scaling) * t;
        (TSTransform::new(translation, scaling), false)
    }
}

/// Camera over the graph: maps graph coordinates to screen coordinates
#[derive(Debug, Clone)]
pub struct Viewport {
    options: ViewportOptions,
    transform: TSTransform,
    transition: Option<Transition>,
}

impl Viewport {
    pub fn new(options: ViewportOptions) -> Self {
        Self {
            options,
            transform: TSTransform::default(),
            transition: None,
        }
    }

    pub fn options(&self) -> &ViewportOptions {
        &self.options
    }

    pub fn size(&self) -> Vec2 {
        self.options.size
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.options.size = size;
    }

    pub fn transform(&self) -> TSTransform {
        self.transform
    }

    /// Jump to a transform, dropping any transition in flight
    pub fn set_transform(&mut self, transform: TSTransform) {
        self.transition = None;
        self.transform = transform;
    }

    pub fn zoom(&self) -> f32 {
        self.transform.scaling
    }

    /// Part of the graph currently on screen
    pub fn visible_rect(&self) -> Rect {
        self.transform.inverse() * Rect::from_min_size(Pos2::ZERO, self.options.size)
    }

    /// Frame `bounds`, over `duration` or at once when it is zero
    ///
    /// Returns false, leaving the viewport alone, for empty or infinite bounds.
    pub fn fit_bounds(&mut self, bounds: Rect, duration: Duration) -> bool {
        if !bounds.is_finite() || bounds.is_negative() {
            debug!("Not fitting invalid bounds {bounds:?}");
            return false;
        }

        let target = transform_for_bounds(
            bounds,
            self.options.size,
            self.options.zoom_range(),
            self.options.padding,
        );
        if !target.translation.is_finite() || !target.scaling.is_finite() {
            debug!("Not fitting {bounds:?}, no finite transform");
            return false;
        }

        debug!("Fitting {bounds:?} with {target:?} over {duration:?}");
        if duration.is_zero() {
            self.set_transform(target);
        } else {
            self.transition = Some(Transition {
                from: self.transform,
                to: target,
                duration,
                elapsed: Duration::ZERO,
            });
        }
        true
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Returns whether a transition is still running
    pub fn advance(&mut self, dt: Duration) -> bool {
        let Some(transition) = self.transition.as_mut() else {
            return false;
        };

        let (transform, finished) = transition.step(dt);
        self.transform = transform;
        if finished {
            self.transition = None;
        }
        !finished
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(width: f32, height: f32) -> ViewportOptions {
        ViewportOptions {
            size: Vec2::new(width, height),
            ..Default::default()
        }
    }

    #[test]
    fn small_content_is_capped_at_max_zoom() {
        let bounds = Rect::from_min_size(Pos2::ZERO, Vec2::new(200.0, 100.0));
        let transform = transform_for_bounds(bounds, Vec2::new(1000.0, 500.0), 0.5..=2.0, 0.1);

        assert_eq!(transform.scaling, 2.0);
        assert_eq!(transform.translation, Vec2::new(300.0, 150.0));
        assert_eq!(transform * bounds.center(), Pos2::new(500.0, 250.0));
    }

    #[test]
    fn large_content_is_scaled_down_with_padding() {
        let bounds = Rect::from_min_size(Pos2::new(-100.0, 0.0), Vec2::new(2200.0, 110.0));
        let transform = transform_for_bounds(bounds, Vec2::new(1210.0, 600.0), 0.1..=2.0, 0.1);

        // 1210 / (2200 * 1.1)
        assert!((transform.scaling - 0.5).abs() < 1e-6);
        assert_eq!(transform * bounds.center(), Pos2::new(605.0, 300.0));
    }

    #[test]
    fn fit_bounds_snaps_without_duration() {
        let mut viewport = Viewport::new(options(1000.0, 500.0));
        let bounds = Rect::from_min_size(Pos2::ZERO, Vec2::new(200.0, 100.0));

        assert!(viewport.fit_bounds(bounds, Duration::ZERO));
        assert!(!viewport.is_animating());
        assert_eq!(viewport.zoom(), 2.0);
        assert!(viewport.visible_rect().contains_rect(bounds));
    }

    #[test]
    fn fit_bounds_transitions_linearly() {
        let mut viewport = Viewport::new(options(1000.0, 500.0));
        let bounds = Rect::from_min_size(Pos2::ZERO, Vec2::new(200.0, 100.0));

        assert!(viewport.fit_bounds(bounds, Duration::from_secs(1)));
        assert_eq!(viewport.zoom(), 1.0);

        assert!(viewport.advance(Duration::from_millis(500)));
        assert_eq!(viewport.zoom(), 1.5);
        assert_eq!(viewport.transform().translation, Vec2::new(150.0, 75.0));

        assert!(!viewport.advance(Duration::from_millis(500)));
        assert_eq!(viewport.zoom(), 2.0);
        assert!(!viewport.is_animating());
    }

    #[test]
    fn inverted_zoom_range_still_fits() {
        let mut viewport = Viewport::new(ViewportOptions {
            min_zoom: 3.0,
            max_zoom: 2.0,
            ..options(1000.0, 500.0)
        });
        let bounds = Rect::from_min_size(Pos2::ZERO, Vec2::new(200.0, 100.0));

        assert!(viewport.fit_bounds(bounds, Duration::ZERO));
        assert_eq!(viewport.zoom(), 3.0);

        // Used directly, the upper bound wins
        let transform = transform_for_bounds(bounds, Vec2::new(1000.0, 500.0), 3.0..=2.0, 0.1);
        assert_eq!(transform.scaling, 2.0);
    }

    #[test]
    fn invalid_bounds_are_ignored() {
        let mut viewport = Viewport::default();
        assert!(!viewport.fit_bounds(Rect::NOTHING, Duration::ZERO));
        assert_eq!(viewport.transform(), TSTransform::default());
    }

    #[test]
    fn point_bounds_use_max_zoom() {
        let mut viewport = Viewport::new(options(100.0, 100.0));
        let bounds = Rect::from_min_max(Pos2::new(10.0, 10.0), Pos2::new(10.0, 10.0));

        assert!(viewport.fit_bounds(bounds, Duration::ZERO));
        assert_eq!(viewport.zoom(), 2.0);
        assert_eq!(viewport.transform() * Pos2::new(10.0, 10.0), Pos2::new(50.0, 50.0));
    }
}
