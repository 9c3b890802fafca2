//! Collaborators the canvas model calls out to: dialogs and file output.
//!
//! Every call is a single request answered by exactly one result. `Ok(false)`
//! and `None` mean the user dismissed the dialog.

use std::path::PathBuf;

use crate::document::{self, PageLayout};
use crate::error::Result;
use crate::export::DocumentImage;
use crate::session::SessionRecord;

pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

pub trait Host {
    fn open_image_dialog(&mut self) -> Option<PathBuf>;
    fn show_error_dialog(&mut self, title: &str, message: &str);
    fn save_session_file(&mut self, record: &SessionRecord) -> Result<bool>;
    fn load_session_file(&mut self) -> Result<Option<SessionRecord>>;
    fn save_raster_file(&mut self, png: &[u8]) -> Result<bool>;
    fn export_document_file(&mut self, image: &DocumentImage) -> Result<bool>;
}

/// Native dialogs via rfd, files via `std::fs`.
pub struct NativeHost {
    page_margin: f32,
}

impl NativeHost {
    pub fn new(page_margin: f32) -> Self {
        Self { page_margin }
    }
}

impl Host for NativeHost {
    fn open_image_dialog(&mut self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file()
    }

    fn show_error_dialog(&mut self, title: &str, message: &str) {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }

    fn save_session_file(&mut self, record: &SessionRecord) -> Result<bool> {
        let Some(path) = rfd::FileDialog::new()
            .set_title("Save Session")
            .set_file_name("saved_session.json")
            .add_filter("JSON Files", &["json"])
            .save_file()
        else {
            return Ok(false);
        };
        record.save(&path)?;
        log::info!("Saved session to {}", path.display());
        Ok(true)
    }

    fn load_session_file(&mut self) -> Result<Option<SessionRecord>> {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON Files", &["json"])
            .pick_file()
        else {
            return Ok(None);
        };
        let record = SessionRecord::load(&path)?;
        log::info!("Loaded session from {}", path.display());
        Ok(Some(record))
    }

    fn save_raster_file(&mut self, png: &[u8]) -> Result<bool> {
        let Some(path) = rfd::FileDialog::new()
            .set_title("Export as PNG")
            .set_file_name("annotated_image.png")
            .add_filter("PNG Files", &["png"])
            .save_file()
        else {
            return Ok(false);
        };
        std::fs::write(&path, png)?;
        log::info!("Exported image to {}", path.display());
        Ok(true)
    }

    fn export_document_file(&mut self, image: &DocumentImage) -> Result<bool> {
        let Some(path) = rfd::FileDialog::new()
            .set_title("Export as PDF")
            .set_file_name("annotated_image.pdf")
            .add_filter("PDF Files", &["pdf"])
            .save_file()
        else {
            return Ok(false);
        };
        // Nothing touches the disk until the document is complete.
        let layout = PageLayout::fit(image.width, image.height, self.page_margin);
        let bytes = document::build_pdf(image, &layout)?;
        std::fs::write(&path, bytes)?;
        log::info!(
            "Exported PDF to {} ({}x{} from {}x{})",
            path.display(),
            image.width,
            image.height,
            image.original_width,
            image.original_height
        );
        Ok(true)
    }
}
