//! Pan/zoom transform between canvas (screen) pixels and image pixels.
//!
//! Screen coordinates are relative to the canvas' top-left corner. A screen
//! point maps to the image as `(screen - origin) / scale`.

use eframe::egui;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub scale: f32,
    pub origin_x: f32,
    pub origin_y: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::identity()
    }
}

/// Allowed scale range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBounds {
    pub min: f32,
    pub max: f32,
}

impl ScaleBounds {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// egui reports wheel-up as a positive delta.
    pub fn from_wheel(delta_y: f32) -> Option<Self> {
        if delta_y > 0.0 {
            Some(ZoomDirection::In)
        } else if delta_y < 0.0 {
            Some(ZoomDirection::Out)
        } else {
            None
        }
    }

    fn factor(self, step: f32) -> f32 {
        match self {
            ZoomDirection::In => 1.0 + step,
            ZoomDirection::Out => 1.0 - step,
        }
    }
}

/// Offset between the pointer and the view origin captured when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanAnchor(egui::Vec2);

impl ViewState {
    pub const fn new(scale: f32, origin_x: f32, origin_y: f32) -> Self {
        Self {
            scale,
            origin_x,
            origin_y,
        }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    fn origin(&self) -> egui::Vec2 {
        egui::vec2(self.origin_x, self.origin_y)
    }

    pub fn to_image_space(&self, screen: egui::Pos2) -> egui::Pos2 {
        egui::pos2(
            (screen.x - self.origin_x) / self.scale,
            (screen.y - self.origin_y) / self.scale,
        )
    }

    pub fn to_screen_space(&self, image: egui::Pos2) -> egui::Pos2 {
        egui::pos2(
            image.x * self.scale + self.origin_x,
            image.y * self.scale + self.origin_y,
        )
    }

    /// Zooms one step around `screen`, keeping the image point under it fixed.
    ///
    /// The new scale is clamped to `bounds`; the anchor stays fixed for the
    /// clamped scale as well.
    pub fn apply_zoom(
        &self,
        screen: egui::Pos2,
        direction: ZoomDirection,
        step: f32,
        bounds: ScaleBounds,
    ) -> ViewState {
        let anchor = self.to_image_space(screen);
        let scale = (self.scale * direction.factor(step)).clamp(bounds.min, bounds.max);
        ViewState::new(scale, screen.x - anchor.x * scale, screen.y - anchor.y * scale)
    }

    pub fn begin_pan(&self, screen: egui::Pos2) -> PanAnchor {
        PanAnchor(screen.to_vec2() - self.origin())
    }

    /// Moves the origin so the dragged point stays under the pointer.
    pub fn apply_pan(&self, screen: egui::Pos2, anchor: PanAnchor) -> ViewState {
        let origin = screen.to_vec2() - anchor.0;
        ViewState::new(self.scale, origin.x, origin.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    fn approx_eq(a: egui::Pos2, b: egui::Pos2) -> bool {
        (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
    }

    fn wide_bounds() -> ScaleBounds {
        ScaleBounds::new(0.05, 50.0)
    }

    #[test]
    fn identity_maps_points_unchanged() {
        let view = ViewState::identity();
        let p = egui::pos2(12.5, -3.0);
        assert_eq!(view.to_image_space(p), p);
        assert_eq!(view.to_screen_space(p), p);
    }

    #[test]
    fn screen_image_roundtrip() {
        let views = [
            ViewState::new(1.0, 0.0, 0.0),
            ViewState::new(2.5, -140.0, 33.0),
            ViewState::new(0.3, 17.25, -900.0),
        ];
        let points = [egui::pos2(0.0, 0.0), egui::pos2(640.0, 480.0), egui::pos2(-12.0, 7.5)];
        for view in views {
            for p in points {
                assert!(approx_eq(view.to_image_space(view.to_screen_space(p)), p));
                assert!(approx_eq(view.to_screen_space(view.to_image_space(p)), p));
            }
        }
    }

    #[test]
    fn image_space_subtracts_origin_then_divides() {
        let view = ViewState::new(2.0, 10.0, 20.0);
        assert_eq!(view.to_image_space(egui::pos2(30.0, 40.0)), egui::pos2(10.0, 10.0));
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let cursor = egui::pos2(320.0, 180.0);
        let mut view = ViewState::new(1.3, -40.0, 25.0);
        let before = view.to_image_space(cursor);
        for direction in [ZoomDirection::In, ZoomDirection::In, ZoomDirection::Out] {
            view = view.apply_zoom(cursor, direction, 0.1, wide_bounds());
            assert!(approx_eq(view.to_image_space(cursor), before));
        }
    }

    #[test]
    fn zoom_in_and_out_use_step() {
        let view = ViewState::identity();
        let zoomed = view.apply_zoom(egui::Pos2::ZERO, ZoomDirection::In, 0.1, wide_bounds());
        assert!((zoomed.scale - 1.1).abs() < EPSILON);
        let zoomed = view.apply_zoom(egui::Pos2::ZERO, ZoomDirection::Out, 0.1, wide_bounds());
        assert!((zoomed.scale - 0.9).abs() < EPSILON);
    }

    #[test]
    fn zoom_is_clamped_and_stays_positive() {
        let bounds = ScaleBounds::new(0.5, 2.0);
        let cursor = egui::pos2(100.0, 100.0);
        let mut view = ViewState::new(1.0, 5.0, 5.0);
        let before = view.to_image_space(cursor);
        for _ in 0..200 {
            view = view.apply_zoom(cursor, ZoomDirection::Out, 0.1, bounds);
        }
        assert_eq!(view.scale, 0.5);
        assert!(approx_eq(view.to_image_space(cursor), before));

        for _ in 0..200 {
            view = view.apply_zoom(cursor, ZoomDirection::In, 0.1, bounds);
        }
        assert_eq!(view.scale, 2.0);
        assert!(approx_eq(view.to_image_space(cursor), before));
    }

    #[test]
    fn pan_keeps_dragged_point_under_pointer() {
        let view = ViewState::new(2.0, 10.0, 10.0);
        let press = egui::pos2(100.0, 50.0);
        let grabbed = view.to_image_space(press);
        let anchor = view.begin_pan(press);

        let release = egui::pos2(160.0, 20.0);
        let panned = view.apply_pan(release, anchor);
        assert_eq!(panned.scale, 2.0);
        assert_eq!(panned.origin_x, 70.0);
        assert_eq!(panned.origin_y, -20.0);
        assert!(approx_eq(panned.to_image_space(release), grabbed));
    }

    #[test]
    fn wheel_direction() {
        assert_eq!(ZoomDirection::from_wheel(3.0), Some(ZoomDirection::In));
        assert_eq!(ZoomDirection::from_wheel(-1.0), Some(ZoomDirection::Out));
        assert_eq!(ZoomDirection::from_wheel(0.0), None);
    }
}
