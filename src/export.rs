//! Full-resolution compositing for PNG and PDF export.
//!
//! Exports never use the live pan/zoom: the image is drawn at native size and
//! every pin is drawn in its tag color with its label.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use eframe::egui;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use std::io::Cursor;
use tiny_skia::{
    Color, ColorU8, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::pin::{Pin, PinColor};
use crate::render::{self, RenderStyle, Surface};
use crate::view::ViewState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Raster,
    Document,
}

// ── Raster surface ──────────────────────────────────────────────────────────

struct QueuedLabel {
    baseline: egui::Pos2,
    text: String,
    size: f32,
    color: PinColor,
}

/// Off-screen surface. Shapes are rasterized with tiny-skia; labels are
/// drawn on top with imageproc once the shapes are done.
pub struct RasterSurface<'a> {
    source: Pixmap,
    target: Pixmap,
    view: ViewState,
    font: &'a FontArc,
    labels: Vec<QueuedLabel>,
}

impl<'a> RasterSurface<'a> {
    pub fn new(image: &RgbaImage, font: &'a FontArc) -> Result<Self> {
        let source = pixmap_from_rgba(image)?;
        let target = Pixmap::new(image.width(), image.height())
            .ok_or_else(|| AppError::Render("cannot allocate pixmap".into()))?;
        Ok(Self {
            source,
            target,
            view: ViewState::identity(),
            font,
            labels: Vec::new(),
        })
    }

    fn transform(&self) -> Transform {
        Transform::from_row(
            self.view.scale,
            0.0,
            0.0,
            self.view.scale,
            self.view.origin_x,
            self.view.origin_y,
        )
    }

    fn paint(color: PinColor) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = true;
        paint
    }

    pub fn finish(self) -> RgbaImage {
        let mut output = RgbaImage::new(self.target.width(), self.target.height());
        for (dst, src) in output.pixels_mut().zip(self.target.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }

        for label in &self.labels {
            let scale = PxScale::from(label.size);
            let ascent = self.font.as_scaled(scale).ascent();
            draw_text_mut(
                &mut output,
                Rgba(label.color.to_array()),
                label.baseline.x.round() as i32,
                (label.baseline.y - ascent).round() as i32,
                scale,
                self.font,
                &label.text,
            );
        }
        output
    }
}

impl Surface for RasterSurface<'_> {
    fn clear(&mut self) {
        self.target.fill(Color::TRANSPARENT);
        self.labels.clear();
    }

    fn set_transform(&mut self, view: ViewState) {
        self.view = view;
    }

    fn draw_image(&mut self, _size: [u32; 2]) {
        let transform = self.transform();
        self.target.draw_pixmap(
            0,
            0,
            self.source.as_ref(),
            &PixmapPaint::default(),
            transform,
            None,
        );
    }

    fn fill_circle(&mut self, center: egui::Pos2, radius: f32, color: PinColor) {
        let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) else {
            return;
        };
        let transform = self.transform();
        self.target
            .fill_path(&path, &Self::paint(color), FillRule::Winding, transform, None);
    }

    fn stroke_circle(&mut self, center: egui::Pos2, radius: f32, width: f32, color: PinColor) {
        let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) else {
            return;
        };
        let stroke = Stroke {
            width,
            ..Default::default()
        };
        let transform = self.transform();
        self.target
            .stroke_path(&path, &Self::paint(color), &stroke, transform, None);
    }

    fn draw_text(&mut self, baseline: egui::Pos2, text: &str, size: f32, color: PinColor) {
        self.labels.push(QueuedLabel {
            baseline: self.view.to_screen_space(baseline),
            text: text.to_string(),
            size: size * self.view.scale,
            color,
        });
    }
}

fn pixmap_from_rgba(image: &RgbaImage) -> Result<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())
        .ok_or_else(|| AppError::Render("cannot allocate pixmap".into()))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Loads the proportional font bundled with egui for export labels.
pub fn label_font() -> Result<FontArc> {
    let definitions = egui::FontDefinitions::default();
    let data = definitions
        .families
        .get(&egui::FontFamily::Proportional)
        .and_then(|names| names.first())
        .and_then(|name| definitions.font_data.get(name))
        .ok_or_else(|| AppError::Render("no proportional font available".into()))?;
    FontArc::try_from_vec(data.font.to_vec())
        .map_err(|e| AppError::Render(format!("cannot load label font: {e}")))
}

// ── Compositing ─────────────────────────────────────────────────────────────

/// Draws `pins` over `image` at native resolution with labels of `label_size`.
pub fn compose(
    image: &RgbaImage,
    pins: &[Pin],
    config: &AppConfig,
    label_size: f32,
    font: &FontArc,
) -> Result<RgbaImage> {
    let mut surface = RasterSurface::new(image, font)?;
    let style = RenderStyle::export(config, label_size);
    render::render(
        &mut surface,
        Some([image.width(), image.height()]),
        pins,
        ViewState::identity(),
        "",
        &style,
    );
    Ok(surface.finish())
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

// ── Document image ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageEncoding {
    Png,
    Jpeg,
}

/// Encoded image handed to the document collaborator.
#[derive(Clone, Debug)]
pub struct DocumentImage {
    pub bytes: Vec<u8>,
    pub encoding: ImageEncoding,
    pub width: u32,
    pub height: u32,
    pub original_width: u32,
    pub original_height: u32,
}

/// Uniformly shrinks `(width, height)` so neither side exceeds `max`.
/// Sizes already within the limit are returned unchanged.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let ratio = (max as f64 / width as f64).min(max as f64 / height as f64);
    let scaled = |side: u32| ((side as f64 * ratio).floor() as u32).max(1);
    (scaled(width), scaled(height))
}

/// Blends every pixel over opaque white.
pub fn flatten_on_white(image: &RgbaImage) -> RgbaImage {
    let mut flat = image.clone();
    for pixel in flat.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let blend = |c: u8| ((c as u32 * a as u32 + 255 * (255 - a as u32) + 127) / 255) as u8;
        *pixel = Rgba([blend(r), blend(g), blend(b), 255]);
    }
    flat
}

/// Downscales oversized composites and encodes them for the document.
///
/// Downscaled images are JPEG-encoded to bound the payload; images within
/// the limit stay lossless PNG at native size.
pub fn prepare_document_image(
    composite: &RgbaImage,
    max_dimension: u32,
    jpeg_quality: u8,
) -> Result<DocumentImage> {
    // The page is white and the embedded image carries no alpha.
    let composite = &flatten_on_white(composite);
    let (original_width, original_height) = composite.dimensions();
    let (width, height) = fit_within(original_width, original_height, max_dimension);

    let (bytes, encoding) = if (width, height) != (original_width, original_height) {
        log::info!(
            "Downscaling {}x{} to {}x{} for document export",
            original_width,
            original_height,
            width,
            height
        );
        let resized = image::imageops::resize(
            composite,
            width,
            height,
            image::imageops::FilterType::Lanczos3,
        );
        let rgb = DynamicImage::ImageRgba8(resized).to_rgb8();
        let mut buffer = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, jpeg_quality)
            .encode_image(&rgb)?;
        (buffer, ImageEncoding::Jpeg)
    } else {
        (encode_png(composite)?, ImageEncoding::Png)
    };

    Ok(DocumentImage {
        bytes,
        encoding,
        width,
        height,
        original_width,
        original_height,
    })
}
