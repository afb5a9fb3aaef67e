use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 5.0;

/// Pan/zoom affine map between simulation space and canvas-local screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    k: f32,
    translate: Vec2,
    locked: bool,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        k: 1.0,
        translate: Vec2::ZERO,
        locked: false,
    };

    pub fn new(k: f32, translate: Vec2) -> Self {
        Self {
            k: k.clamp(MIN_SCALE, MAX_SCALE),
            translate,
            locked: false,
        }
    }

    pub fn scale(&self) -> f32 {
        self.k
    }

    pub fn translation(&self) -> Vec2 {
        self.translate
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Disables gestures while keeping the current transform.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn to_screen(&self, sim: Vec2) -> Pos2 {
        pos2(
            sim.x * self.k + self.translate.x,
            sim.y * self.k + self.translate.y,
        )
    }

    pub fn to_sim(&self, screen: Pos2) -> Vec2 {
        vec2(
            (screen.x - self.translate.x) / self.k,
            (screen.y - self.translate.y) / self.k,
        )
    }

    pub fn screen_delta_to_sim(&self, delta: Vec2) -> Vec2 {
        delta / self.k
    }

    /// Simulation-space rectangle covered by a screen-space rectangle,
    /// converting each corner independently.
    pub fn rect_to_sim(&self, screen: Rect) -> (Vec2, Vec2) {
        let a = self.to_sim(screen.min);
        let b = self.to_sim(screen.max);
        (a.min(b), a.max(b))
    }

    pub fn pan(&mut self, delta: Vec2) -> bool {
        if self.locked {
            return false;
        }
        self.translate += delta;
        true
    }

    /// Zooms by `factor` keeping the simulation point under `anchor` in place.
    pub fn zoom_about(&mut self, anchor: Pos2, factor: f32) -> bool {
        if self.locked || !factor.is_finite() || factor <= 0.0 {
            return false;
        }

        let sim_anchor = self.to_sim(anchor);
        let next = (self.k * factor).clamp(MIN_SCALE, MAX_SCALE);
        if (next - self.k).abs() <= f32::EPSILON {
            return false;
        }
        self.k = next;
        self.translate = anchor.to_vec2() - sim_anchor * self.k;
        true
    }

    /// Places the simulation origin at `center` without changing the scale.
    pub fn center_on(&mut self, center: Pos2) {
        self.translate = center.to_vec2();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn screen_and_sim_are_inverse() {
        let view = ViewTransform::new(2.5, vec2(40.0, -12.0));
        let sim = vec2(13.0, -7.5);

        let screen = view.to_screen(sim);
        assert_relative_eq!(screen.x, 13.0 * 2.5 + 40.0);
        let back = view.to_sim(screen);
        assert_relative_eq!(back.x, sim.x, epsilon = 1e-4);
        assert_relative_eq!(back.y, sim.y, epsilon = 1e-4);
    }

    #[test]
    fn scale_is_bounded() {
        let mut view = ViewTransform::default();
        for _ in 0..100 {
            view.zoom_about(pos2(10.0, 10.0), 1.5);
        }
        assert_eq!(view.scale(), MAX_SCALE);
        for _ in 0..100 {
            view.zoom_about(pos2(10.0, 10.0), 0.5);
        }
        assert_eq!(view.scale(), MIN_SCALE);
        assert_eq!(ViewTransform::new(100.0, Vec2::ZERO).scale(), MAX_SCALE);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut view = ViewTransform::new(1.0, vec2(100.0, 50.0));
        let anchor = pos2(180.0, 90.0);
        let under_anchor = view.to_sim(anchor);

        assert!(view.zoom_about(anchor, 2.0));

        let screen = view.to_screen(under_anchor);
        assert_relative_eq!(screen.x, anchor.x, epsilon = 1e-3);
        assert_relative_eq!(screen.y, anchor.y, epsilon = 1e-3);
    }

    #[test]
    fn locked_view_ignores_gestures_but_keeps_value() {
        let mut view = ViewTransform::new(2.0, vec2(5.0, 5.0));
        view.set_locked(true);

        assert!(!view.pan(vec2(10.0, 0.0)));
        assert!(!view.zoom_about(pos2(0.0, 0.0), 2.0));
        assert_eq!(view.scale(), 2.0);
        assert_eq!(view.translation(), vec2(5.0, 5.0));
    }

    #[test]
    fn screen_rect_maps_per_corner() {
        let view = ViewTransform::new(2.0, vec2(10.0, 10.0));
        let (min, max) = view.rect_to_sim(Rect::from_two_pos(pos2(50.0, 10.0), pos2(10.0, 30.0)));
        assert_eq!(min, vec2(0.0, 0.0));
        assert_eq!(max, vec2(20.0, 10.0));
    }
}
