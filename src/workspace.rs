//! The canvas context: loaded image, pins, view and interaction state.
//!
//! All pointer, keyboard and collaborator flows go through [`Workspace`], so
//! several independent canvases can coexist and the flows can be tested
//! without a window.

use eframe::egui;
use image::RgbaImage;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::export::{self, ExportKind};
use crate::hit::find_pin_at;
use crate::host::{Host, IMAGE_EXTENSIONS};
use crate::pin::{Pin, PinId, SearchQuery, Tag};
use crate::render::{self, RenderStyle, Surface};
use crate::session::{self, SessionRecord};
use crate::store::{PinEdit, PinStore};
use crate::view::{PanAnchor, ScaleBounds, ViewState, ZoomDirection};

pub struct LoadedImage {
    pub path: PathBuf,
    pub pixels: RgbaImage,
}

impl LoadedImage {
    pub fn size(&self) -> [u32; 2] {
        [self.pixels.width(), self.pixels.height()]
    }

    /// Copy that fits in one GPU texture of at most `max_side` per side.
    /// Full-resolution `pixels` stay untouched for export.
    pub fn display_pixels(&self, max_side: usize) -> Cow<'_, RgbaImage> {
        let max_side = u32::try_from(max_side).unwrap_or(u32::MAX);
        let (width, height) = self.pixels.dimensions();
        let (fit_width, fit_height) = export::fit_within(width, height, max_side);
        if (fit_width, fit_height) == (width, height) {
            return Cow::Borrowed(&self.pixels);
        }
        log::info!(
            "Displaying {}x{} image as a {}x{} texture",
            width,
            height,
            fit_width,
            fit_height
        );
        Cow::Owned(image::imageops::resize(
            &self.pixels,
            fit_width,
            fit_height,
            image::imageops::FilterType::Triangle,
        ))
    }
}

/// Modal editor state for a pin. `is_new` drafts are not in the store yet.
#[derive(Clone, Debug)]
pub struct PinEditor {
    pub pin_id: PinId,
    pub draft: Option<Pin>,
    pub title: String,
    pub description: String,
    pub tag: Tag,
}

impl PinEditor {
    fn for_pin(pin: &Pin, draft: bool) -> Self {
        Self {
            pin_id: pin.id,
            draft: draft.then(|| pin.clone()),
            title: pin.title.clone(),
            description: pin.description.clone(),
            tag: pin.tag,
        }
    }

    pub fn is_new(&self) -> bool {
        self.draft.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContextMenu {
    pub pin_id: PinId,
    /// Where the menu opens, in canvas coordinates.
    pub at: egui::Pos2,
}

#[derive(Clone, Copy, Debug)]
enum PointerState {
    Idle,
    Pressed {
        at: egui::Pos2,
        anchor: PanAnchor,
        dragged: bool,
    },
}

#[derive(Debug, Default)]
struct ExportState {
    pending: Option<ExportKind>,
    busy: bool,
}

pub struct Workspace {
    config: AppConfig,
    image: Option<LoadedImage>,
    /// Bumped on every image change so the UI knows to re-upload its texture.
    image_generation: u64,
    store: PinStore,
    view: ViewState,
    search: SearchQuery,
    pub show_labels: bool,
    pub editor: Option<PinEditor>,
    pending_delete: Option<PinId>,
    context_menu: Option<ContextMenu>,
    hovered: Option<PinId>,
    pointer: PointerState,
    export: ExportState,
}

impl Workspace {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            image: None,
            image_generation: 0,
            store: PinStore::new(),
            view: ViewState::identity(),
            search: SearchQuery::default(),
            show_labels: false,
            editor: None,
            pending_delete: None,
            context_menu: None,
            hovered: None,
            pointer: PointerState::Idle,
            export: ExportState::default(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    pub fn image_size(&self) -> Option<[u32; 2]> {
        self.image.as_ref().map(LoadedImage::size)
    }

    pub fn image_generation(&self) -> u64 {
        self.image_generation
    }

    pub fn pins(&self) -> &[Pin] {
        self.store.all()
    }

    pub fn group_by_tag(&self) -> Vec<(Tag, Vec<&Pin>)> {
        self.store.group_by_tag()
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn search(&self) -> &SearchQuery {
        &self.search
    }

    pub fn set_search(&mut self, raw: &str) {
        self.search = SearchQuery::new(raw);
    }

    pub fn hovered_pin(&self) -> Option<&Pin> {
        self.hovered.and_then(|id| self.store.get(id))
    }

    pub fn context_menu(&self) -> Option<ContextMenu> {
        self.context_menu
    }

    pub fn pending_delete(&self) -> Option<&Pin> {
        self.pending_delete.and_then(|id| self.store.get(id))
    }

    pub fn is_busy(&self) -> bool {
        self.export.busy
    }

    /// True while a modal (editor or delete confirmation) owns the input.
    pub fn is_modal_open(&self) -> bool {
        self.editor.is_some() || self.pending_delete.is_some()
    }

    fn hit(&self, screen: egui::Pos2) -> Option<&Pin> {
        let point = self.view.to_image_space(screen);
        find_pin_at(point, self.store.all(), self.config.hit_radius)
    }

    // ── Image ───────────────────────────────────────────────────────────────

    pub fn open_image(&mut self, host: &mut dyn Host) {
        let Some(path) = host.open_image_dialog() else {
            log::debug!("Image selection cancelled");
            return;
        };
        if let Err(e) = self.load_image_path(&path) {
            log::warn!("Failed to open {}: {}", path.display(), e);
            host.show_error_dialog("Invalid File", &e.to_string());
        }
    }

    /// Loads a new image, dropping all pins and resetting the view.
    /// On error nothing changes.
    pub fn load_image_path(&mut self, path: &Path) -> Result<()> {
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !supported {
            return Err(AppError::UnsupportedImage {
                path: path.to_path_buf(),
            });
        }
        let pixels = image::open(path)?.to_rgba8();
        log::info!(
            "Loaded {} ({}x{})",
            path.display(),
            pixels.width(),
            pixels.height()
        );

        self.image = Some(LoadedImage {
            path: path.to_path_buf(),
            pixels,
        });
        self.image_generation += 1;
        self.store.clear();
        self.view = ViewState::identity();
        self.editor = None;
        self.pending_delete = None;
        self.context_menu = None;
        self.hovered = None;
        self.pointer = PointerState::Idle;
        Ok(())
    }

    // ── Pointer ─────────────────────────────────────────────────────────────

    pub fn pointer_pressed(&mut self, screen: egui::Pos2) {
        self.context_menu = None;
        if self.is_modal_open() {
            return;
        }
        self.pointer = PointerState::Pressed {
            at: screen,
            anchor: self.view.begin_pan(screen),
            dragged: false,
        };
    }

    pub fn pointer_moved(&mut self, screen: egui::Pos2) {
        match self.pointer {
            PointerState::Pressed {
                at,
                anchor,
                dragged,
            } => {
                let slop = self.config.click_slop;
                let past_slop = (screen.x - at.x).abs() > slop || (screen.y - at.y).abs() > slop;
                self.pointer = PointerState::Pressed {
                    at,
                    anchor,
                    dragged: dragged || past_slop,
                };
                self.view = self.view.apply_pan(screen, anchor);
            }
            PointerState::Idle => self.hover(screen),
        }
    }

    /// Tracks the pin under the pointer for the tooltip.
    pub fn hover(&mut self, screen: egui::Pos2) {
        self.hovered = self.hit(screen).map(|pin| pin.id);
    }

    pub fn clear_hover(&mut self) {
        self.hovered = None;
    }

    pub fn pointer_released(&mut self, screen: egui::Pos2) {
        let PointerState::Pressed { at, dragged, .. } = self.pointer else {
            return;
        };
        self.pointer = PointerState::Idle;
        if !dragged && at.distance(screen) < self.config.click_slop {
            self.click(screen);
        }
    }

    fn click(&mut self, screen: egui::Pos2) {
        if let Some(editor) = self.hit(screen).map(|pin| PinEditor::for_pin(pin, false)) {
            self.editor = Some(editor);
        } else if self.image.is_some() {
            let point = self.view.to_image_space(screen);
            let draft = self.store.draft(point.x, point.y);
            self.editor = Some(PinEditor::for_pin(&draft, true));
        }
    }

    pub fn secondary_click(&mut self, screen: egui::Pos2) {
        self.pointer = PointerState::Idle;
        if self.is_modal_open() {
            return;
        }
        self.context_menu = self.hit(screen).map(|pin| ContextMenu {
            pin_id: pin.id,
            at: screen,
        });
    }

    pub fn scroll(&mut self, screen: egui::Pos2, delta_y: f32) {
        let Some(direction) = ZoomDirection::from_wheel(delta_y) else {
            return;
        };
        let bounds = ScaleBounds::new(self.config.min_scale, self.config.max_scale);
        self.view = self
            .view
            .apply_zoom(screen, direction, self.config.zoom_step, bounds);
    }

    /// Closes whatever transient UI is open, innermost first.
    pub fn escape(&mut self) {
        if self.context_menu.take().is_some() {
            return;
        }
        if self.pending_delete.take().is_some() {
            return;
        }
        self.editor = None;
    }

    // ── Editor ──────────────────────────────────────────────────────────────

    /// Commits the editor. Drafts are only promoted into the store when they
    /// end up with a title or a description.
    pub fn save_editor(&mut self) {
        let Some(editor) = self.editor.take() else {
            return;
        };
        let title = editor.title.trim().to_string();
        let description = editor.description.trim().to_string();

        match editor.draft {
            Some(mut draft) => {
                draft.title = title;
                draft.description = description;
                draft.tag = editor.tag;
                if draft.has_content() {
                    log::debug!("Added pin {:?}", draft.id);
                    self.store.add(draft);
                }
            }
            None => {
                self.store.update(
                    editor.pin_id,
                    PinEdit {
                        title: Some(title),
                        description: Some(description),
                        tag: Some(editor.tag),
                    },
                );
            }
        }
    }

    /// Opens the editor on an existing pin, e.g. from the sidebar.
    pub fn edit_pin(&mut self, id: PinId) {
        if let Some(pin) = self.store.get(id) {
            self.editor = Some(PinEditor::for_pin(pin, false));
        }
    }

    pub fn cancel_editor(&mut self) {
        self.editor = None;
    }

    // ── Delete ──────────────────────────────────────────────────────────────

    /// Moves the context-menu pin into delete confirmation.
    pub fn request_delete(&mut self) {
        if let Some(menu) = self.context_menu.take() {
            self.pending_delete = Some(menu.pin_id);
        }
    }

    pub fn confirm_delete(&mut self) {
        if let Some(id) = self.pending_delete.take() {
            if self.store.remove(id).is_some() {
                log::debug!("Deleted pin {:?}", id);
            }
            if self.hovered == Some(id) {
                self.hovered = None;
            }
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    // ── Session ─────────────────────────────────────────────────────────────

    pub fn session_record(&self) -> Option<SessionRecord> {
        self.image
            .as_ref()
            .map(|image| session::to_record(&image.path, self.store.all()))
    }

    pub fn save_session(&mut self, host: &mut dyn Host) {
        let Some(record) = self.session_record() else {
            host.show_error_dialog("Save Session", "No image loaded to save.");
            return;
        };
        if self.store.is_empty() {
            log::debug!("Saving session without pins");
        }
        match host.save_session_file(&record) {
            Ok(true) => log::info!("Session saved ({} pins)", record.pins.len()),
            Ok(false) => log::info!("Session save cancelled"),
            Err(e) => {
                log::warn!("Session save failed: {}", e);
                host.show_error_dialog("Save Session", &format!("Error saving session: {e}"));
            }
        }
    }

    pub fn load_session(&mut self, host: &mut dyn Host) {
        let result = host
            .load_session_file()
            .and_then(|record| match record {
                Some(record) => self.apply_session(&record).map(|_| true),
                None => Ok(false),
            });
        match result {
            Ok(true) => log::info!("Session loaded ({} pins)", self.store.len()),
            Ok(false) => log::info!("Session load cancelled"),
            Err(e) => {
                log::warn!("Session load failed: {}", e);
                host.show_error_dialog("Load Session", &format!("Error loading session: {e}"));
            }
        }
    }

    /// Replaces the image, view and every pin with the record's contents.
    pub fn apply_session(&mut self, record: &SessionRecord) -> Result<()> {
        let (path, pins) = session::from_record(record, &mut self.store);
        self.load_image_path(&path)?;
        self.store.replace(pins);
        Ok(())
    }

    // ── Export ──────────────────────────────────────────────────────────────

    /// Queues an export. The work runs on the next [`Self::run_pending_export`]
    /// so the busy indicator can be drawn first.
    pub fn request_export(&mut self, kind: ExportKind, host: &mut dyn Host) -> Result<()> {
        if self.export.busy {
            log::warn!("Ignoring {:?} export request, another export is running", kind);
            return Err(AppError::ExportInProgress);
        }
        if self.image.is_none() {
            host.show_error_dialog("Export", &AppError::NoImage.to_string());
            return Err(AppError::NoImage);
        }
        log::info!("{:?} export requested", kind);
        self.export.pending = Some(kind);
        self.export.busy = true;
        Ok(())
    }

    pub fn has_pending_export(&self) -> bool {
        self.export.pending.is_some()
    }

    /// Runs a queued export. Busy is cleared on every outcome.
    pub fn run_pending_export(&mut self, host: &mut dyn Host) {
        let Some(kind) = self.export.pending.take() else {
            return;
        };
        let result = self.perform_export(kind, host);
        self.export.busy = false;

        match result {
            Ok(true) => log::info!("{:?} export finished", kind),
            Ok(false) => log::info!("{:?} export cancelled", kind),
            Err(e) => {
                log::error!("{:?} export failed: {}", kind, e);
                let (title, message) = match kind {
                    ExportKind::Raster => ("Export Failed", format!("Error exporting image: {e}")),
                    ExportKind::Document => (
                        "PDF Export Failed",
                        format!("Error creating PDF: {e}"),
                    ),
                };
                host.show_error_dialog(title, &message);
            }
        }
    }

    fn perform_export(&self, kind: ExportKind, host: &mut dyn Host) -> Result<bool> {
        let image = self.image.as_ref().ok_or(AppError::NoImage)?;
        let font = export::label_font()?;
        match kind {
            ExportKind::Raster => {
                let composite = export::compose(
                    &image.pixels,
                    self.store.all(),
                    &self.config,
                    self.config.raster_label_size,
                    &font,
                )?;
                let png = export::encode_png(&composite)?;
                host.save_raster_file(&png)
            }
            ExportKind::Document => {
                let composite = export::compose(
                    &image.pixels,
                    self.store.all(),
                    &self.config,
                    self.config.document_label_size,
                    &font,
                )?;
                let document = export::prepare_document_image(
                    &composite,
                    self.config.document_max_dimension,
                    self.config.jpeg_quality,
                )?;
                host.export_document_file(&document)
            }
        }
    }

    // ── Rendering ───────────────────────────────────────────────────────────

    pub fn render(&self, surface: &mut dyn Surface) {
        let style = RenderStyle::live(&self.config, self.show_labels);
        render::render(
            surface,
            self.image_size(),
            self.store.all(),
            self.view,
            self.search.as_str(),
            &style,
        );
    }
}
