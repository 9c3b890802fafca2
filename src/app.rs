use eframe::egui;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::export::ExportKind;
use crate::host::NativeHost;
use crate::pin::{Pin, Tag};
use crate::render::ScreenSurface;
use crate::workspace::Workspace;

const APP_NAME: &str = "pin-annotate";

fn display_title(pin: &Pin) -> &str {
    if pin.title.is_empty() {
        "Untitled Note"
    } else {
        &pin.title
    }
}

enum EditorAction {
    Save,
    Cancel,
}

enum DeleteAction {
    Confirm,
    Cancel,
}

// ── App ─────────────────────────────────────────────────────────────────────

pub struct PinAnnotateApp {
    workspace: Workspace,
    host: NativeHost,

    texture: Option<egui::TextureHandle>,
    texture_generation: u64,

    search_text: String,
    show_sidebar: bool,

    // set once the busy overlay has been painted for a queued export
    export_armed: bool,
}

impl PinAnnotateApp {
    pub fn new(config: AppConfig, image_path: Option<PathBuf>) -> Self {
        let host = NativeHost::new(config.page_margin);
        let mut workspace = Workspace::new(config);
        if let Some(path) = image_path {
            if let Err(e) = workspace.load_image_path(&path) {
                log::error!("Cannot open {}: {}", path.display(), e);
            }
        }

        Self {
            workspace,
            host,
            texture: None,
            texture_generation: 0,
            search_text: String::new(),
            show_sidebar: true,
            export_armed: false,
        }
    }

    /// Uploads the current image whenever the workspace swaps it.
    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture_generation == self.workspace.image_generation() {
            return;
        }
        self.texture_generation = self.workspace.image_generation();
        let max_side = ctx.input(|i| i.max_texture_side);
        self.texture = self.workspace.image().map(|image| {
            // The canvas sizes the texture in image units, so a reduced copy
            // still lines up with the pins.
            let pixels = image.display_pixels(max_side);
            let size = [pixels.width() as usize, pixels.height() as usize];
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_raw());
            ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR)
        });

        let title = match self.workspace.image().and_then(|image| image.path.file_name()) {
            Some(name) => format!("{APP_NAME} - {}", name.to_string_lossy()),
            None => APP_NAME.to_string(),
        };
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(title));
    }

    fn request_export(&mut self, kind: ExportKind) {
        if let Err(e) = self.workspace.request_export(kind, &mut self.host) {
            log::debug!("Export not started: {}", e);
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open Image").clicked() {
                self.workspace.open_image(&mut self.host);
            }
            ui.separator();
            if ui.button("Save Session").clicked() {
                self.workspace.save_session(&mut self.host);
            }
            if ui.button("Load Session").clicked() {
                self.workspace.load_session(&mut self.host);
            }
            ui.separator();
            let idle = !self.workspace.is_busy();
            if ui.add_enabled(idle, egui::Button::new("Export PNG")).clicked() {
                self.request_export(ExportKind::Raster);
            }
            if ui.add_enabled(idle, egui::Button::new("Export PDF")).clicked() {
                self.request_export(ExportKind::Document);
            }
            ui.separator();
            let search = ui.add(
                egui::TextEdit::singleline(&mut self.search_text)
                    .hint_text("Search notes")
                    .desired_width(160.0),
            );
            if search.changed() {
                self.workspace.set_search(&self.search_text);
            }
            ui.checkbox(&mut self.workspace.show_labels, "Labels");
            ui.checkbox(&mut self.show_sidebar, "Notes");
            ui.separator();
            ui.label(format!("Zoom: {:.0}%", self.workspace.view().scale * 100.0));
        });
    }

    fn sidebar(&mut self, ui: &mut egui::Ui) {
        ui.heading("Notes");
        ui.separator();

        let mut clicked = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            if self.workspace.pins().is_empty() {
                ui.weak("Click the image to add a note.");
            }
            for (tag, pins) in self.workspace.group_by_tag() {
                ui.colored_label(tag.color().to_egui(), tag.label());
                for pin in pins {
                    let matches = pin.matches(self.workspace.search().as_str());
                    let text = egui::RichText::new(display_title(pin));
                    let text = if matches { text } else { text.weak() };
                    if ui.selectable_label(false, text).clicked() {
                        clicked = Some(pin.id);
                    }
                }
                ui.add_space(6.0);
            }
        });

        if let Some(id) = clicked {
            self.workspace.edit_pin(id);
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas_rect = response.rect;

        let texture = self.texture.as_ref().map(|t| t.id());
        self.workspace
            .render(&mut ScreenSurface::new(&painter, canvas_rect, texture));

        if self.workspace.image().is_none() {
            painter.text(
                canvas_rect.center(),
                egui::Align2::CENTER_CENTER,
                "Open an image to start annotating",
                egui::FontId::proportional(18.0),
                egui::Color32::from_gray(160),
            );
        }

        // Workspace coordinates are relative to the canvas corner.
        let to_canvas = |pos: egui::Pos2| (pos - canvas_rect.min).to_pos2();

        let (pressed, released, primary_down, delta, latest, scroll) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.primary_down(),
                i.pointer.delta(),
                i.pointer.latest_pos(),
                i.raw_scroll_delta.y,
            )
        });

        if let Some(pos) = latest {
            if pressed && response.hovered() {
                self.workspace.pointer_pressed(to_canvas(pos));
            }
            if delta != egui::Vec2::ZERO && (response.hovered() || primary_down) {
                self.workspace.pointer_moved(to_canvas(pos));
            }
            if released {
                self.workspace.pointer_released(to_canvas(pos));
            }
        }
        if !response.hovered() && !primary_down {
            self.workspace.clear_hover();
        }

        if scroll != 0.0 {
            if let Some(pos) = response.hover_pos() {
                self.workspace.scroll(to_canvas(pos), scroll);
            }
        }

        if response.secondary_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.workspace.secondary_click(to_canvas(pos));
            }
        }

        if let Some(menu) = self.workspace.context_menu() {
            let mut delete = false;
            egui::Area::new(egui::Id::new("pin_context_menu"))
                .fixed_pos(canvas_rect.min + menu.at.to_vec2())
                .order(egui::Order::Foreground)
                .show(ui.ctx(), |ui| {
                    egui::Frame::menu(ui.style()).show(ui, |ui| {
                        delete = ui.button("Delete").clicked();
                    });
                });
            if delete {
                self.workspace.request_delete();
            }
        }

        if let Some(pin) = self.workspace.hovered_pin() {
            response.on_hover_text_at_pointer(display_title(pin));
        }
    }

    fn editor_window(&mut self, ctx: &egui::Context) {
        let Some(editor) = self.workspace.editor.as_mut() else {
            return;
        };
        let heading = if editor.is_new() { "New Note" } else { "Edit Note" };

        let mut action = None;
        egui::Window::new(heading)
            .id(egui::Id::new("pin_editor"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Title");
                ui.text_edit_singleline(&mut editor.title);
                ui.label("Description");
                ui.text_edit_multiline(&mut editor.description);
                ui.horizontal(|ui| {
                    ui.label("Tag");
                    egui::ComboBox::from_id_salt("pin_tag")
                        .selected_text(editor.tag.label())
                        .show_ui(ui, |ui| {
                            for tag in Tag::ALL {
                                ui.selectable_value(&mut editor.tag, tag, tag.label());
                            }
                        });
                });
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        action = Some(EditorAction::Save);
                    }
                    if ui.button("Cancel").clicked() {
                        action = Some(EditorAction::Cancel);
                    }
                });
            });

        match action {
            Some(EditorAction::Save) => self.workspace.save_editor(),
            Some(EditorAction::Cancel) => self.workspace.cancel_editor(),
            None => {}
        }
    }

    fn delete_window(&mut self, ctx: &egui::Context) {
        let Some(pin) = self.workspace.pending_delete() else {
            return;
        };
        let prompt = format!("Delete \"{}\"?", display_title(pin));

        let mut action = None;
        egui::Window::new("Delete Note")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(prompt);
                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        action = Some(DeleteAction::Confirm);
                    }
                    if ui.button("Cancel").clicked() {
                        action = Some(DeleteAction::Cancel);
                    }
                });
            });

        match action {
            Some(DeleteAction::Confirm) => self.workspace.confirm_delete(),
            Some(DeleteAction::Cancel) => self.workspace.cancel_delete(),
            None => {}
        }
    }

    fn busy_overlay(&self, ctx: &egui::Context) {
        if !self.workspace.is_busy() {
            return;
        }
        egui::Area::new(egui::Id::new("export_busy"))
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.add(egui::Spinner::new());
                        ui.label("Exporting...");
                    });
                });
            });
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for PinAnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // The overlay went out last frame; do the heavy part now.
        if self.export_armed {
            self.export_armed = false;
            self.workspace.run_pending_export(&mut self.host);
        }

        self.ensure_texture(ctx);

        // Keyboard shortcuts
        let (open, save, escape) = ctx.input(|i| {
            (
                i.modifiers.command && i.key_pressed(egui::Key::O),
                i.modifiers.command && i.key_pressed(egui::Key::S),
                i.key_pressed(egui::Key::Escape),
            )
        });
        if escape {
            self.workspace.escape();
        }
        if !self.workspace.is_modal_open() {
            if open {
                self.workspace.open_image(&mut self.host);
            }
            if save {
                self.workspace.save_session(&mut self.host);
            }
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));

        if self.show_sidebar {
            egui::SidePanel::left("notes")
                .resizable(true)
                .default_width(220.0)
                .show(ctx, |ui| self.sidebar(ui));
        }

        egui::CentralPanel::default().show(ctx, |ui| self.canvas(ui));

        self.editor_window(ctx);
        self.delete_window(ctx);
        self.busy_overlay(ctx);

        if self.workspace.has_pending_export() {
            self.export_armed = true;
            ctx.request_repaint();
        }

        // A new image may have arrived through a dialog this frame.
        if self.texture_generation != self.workspace.image_generation() {
            ctx.request_repaint();
        }
    }
}
