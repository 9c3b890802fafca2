//! Single-page PDF assembly for document export.

use printpdf::{
    ColorBits, ColorSpace, Image, ImageFilter, ImageTransform, ImageXObject, Mm, PdfDocument, Pt,
    Px,
};

use crate::error::Result;
use crate::export::{DocumentImage, ImageEncoding};

/// A4 in points.
const A4_SHORT_SIDE: f32 = 595.28;
const A4_LONG_SIDE: f32 = 841.89;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Placement of the image on the page, in points from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageLayout {
    pub orientation: Orientation,
    pub page_width: f32,
    pub page_height: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageLayout {
    /// Fits a `width` × `height` image inside the page minus `margin`,
    /// preserving aspect ratio and centering it.
    pub fn fit(width: u32, height: u32, margin: f32) -> Self {
        let orientation = if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        let (page_width, page_height) = match orientation {
            Orientation::Landscape => (A4_LONG_SIDE, A4_SHORT_SIDE),
            Orientation::Portrait => (A4_SHORT_SIDE, A4_LONG_SIDE),
        };

        let max_width = page_width - margin * 2.0;
        let max_height = page_height - margin * 2.0;
        let scale = (max_width / width as f32).min(max_height / height as f32);
        let scaled_width = width as f32 * scale;
        let scaled_height = height as f32 * scale;

        Self {
            orientation,
            page_width,
            page_height,
            x: (page_width - scaled_width) / 2.0,
            y: (page_height - scaled_height) / 2.0,
            width: scaled_width,
            height: scaled_height,
        }
    }
}

/// Builds the whole PDF in memory.
pub fn build_pdf(image: &DocumentImage, layout: &PageLayout) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        "Annotated image",
        Mm::from(Pt(layout.page_width)),
        Mm::from(Pt(layout.page_height)),
        "Image",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let (image_data, image_filter) = match image.encoding {
        ImageEncoding::Jpeg => (image.bytes.clone(), Some(ImageFilter::DCT)),
        ImageEncoding::Png => (
            image::load_from_memory(&image.bytes)?.to_rgb8().into_raw(),
            None,
        ),
    };
    let xobject = ImageXObject {
        width: Px(image.width as usize),
        height: Px(image.height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data,
        image_filter,
        smask: None,
        clipping_bbox: None,
    };

    // At 72 dpi one pixel is one point; scale from there to the fitted size.
    // PDF space starts at the bottom-left, so flip the vertical offset.
    let scale = layout.width / image.width as f32;
    let bottom = layout.page_height - layout.y - layout.height;
    Image::from(xobject).add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm::from(Pt(layout.x))),
            translate_y: Some(Mm::from(Pt(bottom))),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(72.0),
            ..Default::default()
        },
    );

    Ok(doc.save_to_bytes()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::prepare_document_image;
    use image::{Rgba, RgbaImage};

    const EPSILON: f32 = 0.01;

    #[test]
    fn wide_images_get_landscape_pages() {
        let layout = PageLayout::fit(1600, 900, 20.0);
        assert_eq!(layout.orientation, Orientation::Landscape);
        assert_eq!((layout.page_width, layout.page_height), (A4_LONG_SIDE, A4_SHORT_SIDE));
    }

    #[test]
    fn square_and_tall_images_get_portrait_pages() {
        assert_eq!(PageLayout::fit(500, 500, 20.0).orientation, Orientation::Portrait);
        assert_eq!(PageLayout::fit(300, 900, 20.0).orientation, Orientation::Portrait);
    }

    #[test]
    fn layout_fits_inside_margins_and_centers() {
        let layout = PageLayout::fit(2000, 1000, 20.0);
        assert!((layout.width / layout.height - 2.0).abs() < EPSILON);
        assert!(layout.x >= 20.0 - EPSILON && layout.y >= 20.0 - EPSILON);
        assert!(layout.x + layout.width <= layout.page_width - 20.0 + EPSILON);
        assert!(layout.y + layout.height <= layout.page_height - 20.0 + EPSILON);
        assert!((layout.x * 2.0 + layout.width - layout.page_width).abs() < EPSILON);
        assert!((layout.y * 2.0 + layout.height - layout.page_height).abs() < EPSILON);
    }

    #[test]
    fn builds_pdf_from_png_and_jpeg() {
        let composite = RgbaImage::from_pixel(64, 32, Rgba([200, 10, 10, 255]));

        let png = prepare_document_image(&composite, 14_000, 95).unwrap();
        let bytes = build_pdf(&png, &PageLayout::fit(png.width, png.height, 20.0)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let jpeg = prepare_document_image(&composite, 16, 95).unwrap();
        assert_eq!(jpeg.encoding, ImageEncoding::Jpeg);
        let bytes = build_pdf(&jpeg, &PageLayout::fit(jpeg.width, jpeg.height, 20.0)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
