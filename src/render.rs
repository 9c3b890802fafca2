//! Draws the base image and pin markers onto a [`Surface`].
//!
//! The same pipeline feeds the live canvas ([`ScreenSurface`]) and the export
//! compositor (`export::RasterSurface`); only the [`RenderStyle`] differs.

use eframe::egui;

use crate::config::AppConfig;
use crate::pin::{Pin, PinColor};
use crate::view::ViewState;

/// Drawing target. Coordinates and sizes are given in image space; the
/// surface maps them through the transform set by [`Surface::set_transform`].
pub trait Surface {
    fn clear(&mut self);
    fn set_transform(&mut self, view: ViewState);
    /// Draws the loaded image with its top-left corner at the image origin.
    fn draw_image(&mut self, size: [u32; 2]);
    fn fill_circle(&mut self, center: egui::Pos2, radius: f32, color: PinColor);
    fn stroke_circle(&mut self, center: egui::Pos2, radius: f32, width: f32, color: PinColor);
    /// `baseline` is the left end of the text baseline.
    fn draw_text(&mut self, baseline: egui::Pos2, text: &str, size: f32, color: PinColor);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    pub pin_radius: f32,
    pub outline_width: f32,
    pub label_offset: f32,
    pub label_size: f32,
    pub show_labels: bool,
    /// When false every pin is drawn in its tag color whatever the query.
    pub honor_search: bool,
}

impl RenderStyle {
    pub fn live(config: &AppConfig, show_labels: bool) -> Self {
        Self {
            pin_radius: config.pin_radius,
            outline_width: 1.0,
            label_offset: 10.0,
            label_size: config.live_label_size,
            show_labels,
            honor_search: true,
        }
    }

    /// Exports always show labels and ignore the search query.
    pub fn export(config: &AppConfig, label_size: f32) -> Self {
        Self {
            pin_radius: config.pin_radius,
            outline_width: 1.0,
            label_offset: 12.0,
            label_size,
            show_labels: true,
            honor_search: false,
        }
    }
}

/// Fill color for `pin` under `query` (lowercase).
pub fn pin_fill(pin: &Pin, query: &str, style: &RenderStyle) -> PinColor {
    if !style.honor_search || pin.matches(query) {
        pin.tag.color()
    } else {
        PinColor::DIMMED
    }
}

pub fn render<'a, S, I>(
    surface: &mut S,
    image_size: Option<[u32; 2]>,
    pins: I,
    view: ViewState,
    query: &str,
    style: &RenderStyle,
) where
    S: Surface + ?Sized,
    I: IntoIterator<Item = &'a Pin>,
{
    surface.clear();
    surface.set_transform(view);
    if let Some(size) = image_size {
        surface.draw_image(size);
    }

    for pin in pins {
        let center = pin.pos();
        surface.fill_circle(center, style.pin_radius, pin_fill(pin, query, style));
        surface.stroke_circle(center, style.pin_radius, style.outline_width, PinColor::BLACK);

        if style.show_labels && !pin.title.is_empty() {
            let baseline = center + egui::vec2(style.label_offset, -style.label_offset);
            surface.draw_text(baseline, &pin.title, style.label_size, PinColor::BLACK);
        }
    }
}

// ── Live canvas ─────────────────────────────────────────────────────────────

/// Surface over an egui painter covering the canvas rect.
pub struct ScreenSurface<'a> {
    painter: &'a egui::Painter,
    canvas_rect: egui::Rect,
    texture: Option<egui::TextureId>,
    view: ViewState,
}

impl<'a> ScreenSurface<'a> {
    pub fn new(
        painter: &'a egui::Painter,
        canvas_rect: egui::Rect,
        texture: Option<egui::TextureId>,
    ) -> Self {
        Self {
            painter,
            canvas_rect,
            texture,
            view: ViewState::identity(),
        }
    }

    fn to_screen(&self, image_pos: egui::Pos2) -> egui::Pos2 {
        self.canvas_rect.min + self.view.to_screen_space(image_pos).to_vec2()
    }
}

impl Surface for ScreenSurface<'_> {
    fn clear(&mut self) {
        self.painter
            .rect_filled(self.canvas_rect, 0.0, egui::Color32::from_gray(40));
    }

    fn set_transform(&mut self, view: ViewState) {
        self.view = view;
    }

    fn draw_image(&mut self, size: [u32; 2]) {
        let Some(texture) = self.texture else {
            return;
        };
        let rect = egui::Rect::from_min_max(
            self.to_screen(egui::Pos2::ZERO),
            self.to_screen(egui::pos2(size[0] as f32, size[1] as f32)),
        );
        self.painter.image(
            texture,
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }

    fn fill_circle(&mut self, center: egui::Pos2, radius: f32, color: PinColor) {
        self.painter
            .circle_filled(self.to_screen(center), radius * self.view.scale, color.to_egui());
    }

    fn stroke_circle(&mut self, center: egui::Pos2, radius: f32, width: f32, color: PinColor) {
        self.painter.circle_stroke(
            self.to_screen(center),
            radius * self.view.scale,
            egui::Stroke::new(width * self.view.scale, color.to_egui()),
        );
    }

    fn draw_text(&mut self, baseline: egui::Pos2, text: &str, size: f32, color: PinColor) {
        let color = color.to_egui();
        let galley = self.painter.layout_no_wrap(
            text.to_string(),
            egui::FontId::proportional(size * self.view.scale),
            color,
        );
        let top_left = self.to_screen(baseline) - egui::vec2(0.0, galley_baseline(&galley));
        self.painter.galley(top_left, galley, color);
    }
}

/// Distance from the top of `galley` to its first baseline.
fn galley_baseline(galley: &egui::Galley) -> f32 {
    galley
        .rows
        .first()
        .and_then(|row| row.glyphs.first())
        .map_or(galley.size().y, |glyph| glyph.pos.y)
}
