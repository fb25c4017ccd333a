use chrono::NaiveDate;
use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, Sense, TextureHandle, TextureOptions};

use crate::canvas::LayerMove;
use crate::components::tools::{to_hex_color, Tool, MAX_WIDTH, MIN_WIDTH, SIZE_PRESETS};
use crate::controller::CanvasUpdate;
use crate::ops::shapes::ShapeKind;
use crate::ops::Point;
use crate::session::DrawingSession;
use crate::settings::DrawSettings;

/// Pointer state sampled from egui for one frame, in canvas coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerFrame {
    pub pressed: bool,
    pub down: bool,
    pub released: bool,
    /// `None` when egui has no pointer position this frame.
    pub pos: Option<Point>,
    /// Whether `pos` lies over the canvas.
    pub over_canvas: bool,
}

/// Turns per-frame pointer samples into press / drag / release / hover
/// events.  A gesture that started on the canvas always ends with a release,
/// even when the button-up event itself never arrives (focus lost
/// mid-drag, pointer gone in the release frame).
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerCapture {
    captured: bool,
    last_pos: Option<Point>,
}

impl PointerCapture {
    pub fn route(&mut self, session: &mut DrawingSession, frame: PointerFrame) -> CanvasUpdate {
        if self.captured && (frame.released || !frame.down) {
            self.captured = false;
            let at = frame.pos.or(self.last_pos).unwrap_or_default();
            self.last_pos = None;
            return session.release(at);
        }

        let Some(pos) = frame.pos else { return session.leave() };
        if frame.pressed && frame.over_canvas {
            self.captured = true;
            self.last_pos = Some(pos);
            return session.press(pos);
        }
        if self.captured {
            if self.last_pos == Some(pos) {
                return CanvasUpdate::None;
            }
            self.last_pos = Some(pos);
            return session.drag(pos);
        }
        if frame.over_canvas {
            session.hover(pos)
        } else {
            session.leave()
        }
    }
}

/// Drawing window for one diary day.
pub struct DiaryDrawApp {
    session: DrawingSession,
    date: NaiveDate,
    texture: Option<TextureHandle>,
    needs_upload: bool,
    /// Window size seen last frame; a change resizes the canvas to fill
    /// the central panel.
    last_screen_size: Option<egui::Vec2>,
    pointer: PointerCapture,
    /// Persisted tool preferences; rewritten when the toolbar changes them.
    settings: DrawSettings,
    last_title: String,
    hex_input: String,
    status: Option<String>,
    pending_exit: bool,
    force_exit: bool,
}

impl DiaryDrawApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        session: DrawingSession,
        date: NaiveDate,
        settings: DrawSettings,
    ) -> Self {
        let hex_input = to_hex_color(session.tools.color());
        Self {
            session,
            date,
            texture: None,
            needs_upload: true,
            last_screen_size: None,
            pointer: PointerCapture::default(),
            settings,
            last_title: String::new(),
            hex_input,
            status: None,
            pending_exit: false,
            force_exit: false,
        }
    }

    fn note(&mut self, update: CanvasUpdate) {
        if update != CanvasUpdate::None {
            self.needs_upload = true;
        }
    }

    fn save(&mut self) -> bool {
        match self.session.save() {
            Ok(()) => {
                self.status = Some(format!("Saved {}", self.session.path().display()));
                true
            }
            Err(e) => {
                self.status = Some(format!("Save failed: {}", e));
                false
            }
        }
    }

    /// Write tool preferences back to the settings file once they differ
    /// from what was last saved.
    fn persist_tool_settings(&mut self) {
        let updated = self.settings.with_tools(&self.session.tools);
        if updated != self.settings {
            updated.save();
            self.settings = updated;
        }
    }

    fn undo(&mut self) {
        if self.session.undo() {
            self.needs_upload = true;
        }
    }

    fn redo(&mut self) {
        if self.session.redo() {
            self.needs_upload = true;
        }
    }

    // ---- panels -------------------------------------------------------------

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            let current = self.session.tools.tool;
            for tool in [Tool::Brush, Tool::Eraser, Tool::Fill] {
                if ui.selectable_label(current == tool, tool.label()).clicked() {
                    self.session.tools.select(tool);
                }
            }
            ui.separator();
            for &kind in ShapeKind::all() {
                let tool = Tool::Shape(kind);
                if ui.selectable_label(current == tool, kind.label()).clicked() {
                    self.session.tools.select(tool);
                }
            }
        });

        ui.horizontal_wrapped(|ui| {
            let mut rgb = self.session.tools.color();
            if ui.color_edit_button_srgb(&mut rgb).changed() {
                self.session.tools.set_color(rgb);
                self.hex_input = to_hex_color(rgb);
            }
            let hex = ui.add(egui::TextEdit::singleline(&mut self.hex_input).desired_width(70.0));
            if hex.lost_focus() {
                self.session.tools.set_color_hex(&self.hex_input);
                self.hex_input = to_hex_color(self.session.tools.color());
            }

            ui.separator();
            ui.label("Opacity");
            let mut opacity = self.session.tools.opacity();
            if ui.add(egui::Slider::new(&mut opacity, 0..=255)).changed() {
                self.session.tools.set_opacity(opacity);
            }

            if let Some(mut width) = self.session.tools.active_width() {
                ui.separator();
                ui.label("Size");
                for &preset in SIZE_PRESETS {
                    if ui.selectable_label(width == preset, preset.to_string()).clicked() {
                        self.session.tools.set_active_width(preset);
                    }
                }
                if ui.add(egui::Slider::new(&mut width, MIN_WIDTH..=MAX_WIDTH)).changed() {
                    self.session.tools.set_active_width(width);
                }
            }
        });

        ui.horizontal(|ui| {
            if ui.add_enabled(self.session.history().can_undo(), egui::Button::new("Undo")).clicked() {
                self.undo();
            }
            if ui.add_enabled(self.session.history().can_redo(), egui::Button::new("Redo")).clicked() {
                self.redo();
            }
            if ui.button("Clear").clicked() {
                self.session.clear();
                self.needs_upload = true;
            }
            if ui.button("Save").clicked() {
                self.save();
            }
        });
    }

    fn layer_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Layers");
        ui.horizontal(|ui| {
            if ui.button("+").on_hover_text("Add layer").clicked() {
                self.session.add_layer(None, None);
                self.needs_upload = true;
            }
            if ui.button("-").on_hover_text("Remove layer").clicked() {
                self.session.remove_layer();
                self.needs_upload = true;
            }
            if ui.button("↑").on_hover_text("Move up").clicked() && self.session.move_layer(LayerMove::Up) {
                self.needs_upload = true;
            }
            if ui.button("↓").on_hover_text("Move down").clicked() && self.session.move_layer(LayerMove::Down) {
                self.needs_upload = true;
            }
        });
        ui.separator();

        let active = self.session.active_index();
        let mut clicked = None;
        for (i, name) in self.session.layer_names().into_iter().enumerate() {
            if ui.selectable_label(i == active, name).clicked() {
                clicked = Some(i);
            }
        }
        if let Some(i) = clicked {
            self.session.select_layer(i);
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let screen = ctx.input(|i| i.screen_rect().size());
        match self.last_screen_size {
            Some(prev) if prev != screen && self.session.controller().is_idle() => {
                let avail = ui.available_size();
                self.session.resize(avail.x.max(1.0) as u32, avail.y.max(1.0) as u32);
                self.last_screen_size = Some(screen);
                self.needs_upload = true;
            }
            None => self.last_screen_size = Some(screen),
            _ => {}
        }

        let (w, h) = (self.session.layers().width(), self.session.layers().height());
        let (response, painter) = ui.allocate_painter(egui::vec2(w as f32, h as f32), Sense::click_and_drag());
        let rect = response.rect;
        let to_canvas = |p: Pos2| -> Point { (p.x - rect.min.x, p.y - rect.min.y) };

        let frame = ui.input(|i| {
            let raw = i.pointer.interact_pos().or(i.pointer.hover_pos());
            PointerFrame {
                pressed: i.pointer.primary_pressed(),
                down: i.pointer.primary_down(),
                released: i.pointer.primary_released(),
                pos: raw.map(to_canvas),
                over_canvas: raw.is_some_and(|p| rect.contains(p)),
            }
        });
        let update = self.pointer.route(&mut self.session, frame);
        self.note(update);

        if self.needs_upload || self.texture.is_none() {
            self.needs_upload = false;
            let shown = self.session.display_image();
            let size = [shown.width() as usize, shown.height() as usize];
            let image = ColorImage::from_rgba_unmultiplied(size, shown.as_raw());
            match &mut self.texture {
                Some(texture) => texture.set(image, TextureOptions::NEAREST),
                None => self.texture = Some(ctx.load_texture("diary_canvas", image, TextureOptions::NEAREST)),
            }
        }

        if let Some(texture) = &self.texture {
            let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            painter.image(texture.id(), rect, uv, Color32::WHITE);
        }
    }

    fn exit_dialog(&mut self, ctx: &egui::Context) {
        egui::Window::new("Unsaved drawing")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("Save today's drawing before closing?");
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() && self.save() {
                        self.force_exit = true;
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                    if ui.button("Discard").clicked() {
                        self.force_exit = true;
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                    if ui.button("Cancel").clicked() {
                        self.pending_exit = false;
                    }
                });
            });
    }
}

/// The new window title, or `None` when it matches what was last sent.
fn title_change(last: &mut String, title: String) -> Option<String> {
    if *last == title {
        return None;
    }
    last.clone_from(&title);
    Some(title)
}

impl eframe::App for DiaryDrawApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let title = format!("Drawing of the Day - {} - {}", self.date, self.session.display_title());
        if let Some(title) = title_change(&mut self.last_title, title) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title));
        }

        if ctx.input(|i| i.viewport().close_requested()) && !self.force_exit && self.session.is_dirty() {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.pending_exit = true;
        }

        let (undo, redo, save) = ctx.input(|i| {
            let cmd = i.modifiers.command;
            (
                cmd && !i.modifiers.shift && i.key_pressed(egui::Key::Z),
                cmd && (i.key_pressed(egui::Key::Y) || (i.modifiers.shift && i.key_pressed(egui::Key::Z))),
                cmd && i.key_pressed(egui::Key::S),
            )
        });
        if self.session.controller().is_idle() {
            if undo {
                self.undo();
            }
            if redo {
                self.redo();
            }
        }
        if save {
            self.save();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let history = self.session.history();
                ui.label(format!(
                    "{}  |  undo {}  redo {}  ({:.1} MB)",
                    self.session.tools.tool.label(),
                    history.undo_count(),
                    history.redo_count(),
                    history.memory_usage() as f64 / (1024.0 * 1024.0)
                ));
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });

        egui::SidePanel::right("layers").resizable(false).show(ctx, |ui| self.layer_panel(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::from_gray(200)))
            .show(ctx, |ui| self.canvas(ui, ctx));

        if !ctx.input(|i| i.pointer.any_down()) {
            self.persist_tool_settings();
        }

        if self.pending_exit {
            self.exit_dialog(ctx);
        }
    }
}
