use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use image::RgbaImage;
use uuid::Uuid;

use crate::canvas::{LayerMove, LayerStack, LOADED_LAYER_NAME};
use crate::components::history::HistoryManager;
use crate::components::tools::ToolState;
use crate::controller::{CanvasUpdate, InteractionController};
use crate::io::{self, DrawingError};
use crate::ops::Point;

/// One open drawing: the layer stack, its history, the current tool and the
/// file it saves to.
pub struct DrawingSession {
    pub id: Uuid,
    pub tools: ToolState,
    path: PathBuf,
    layers: LayerStack,
    history: HistoryManager,
    controller: InteractionController,
    /// Composite of `layers` over white, rebuilt whenever pixels change.
    composite: RgbaImage,
    is_dirty: bool,
}

impl DrawingSession {
    /// Open the drawing stored at `path`.  When the file exists it becomes a
    /// single "Loaded Drawing" layer and the canvas takes its size; otherwise
    /// the session starts with a blank `width × height` Background layer.
    pub fn open(
        path: impl Into<PathBuf>,
        width: u32,
        height: u32,
        tools: ToolState,
    ) -> Result<Self, DrawingError> {
        if width == 0 || height == 0 {
            return Err(DrawingError::InvalidCanvas { width, height });
        }
        let path = path.into();

        let layers = match io::load_drawing(&path) {
            Ok(Some(image)) => LayerStack::from_image(LOADED_LAYER_NAME, image),
            Ok(None) => LayerStack::new(width, height),
            Err(e) => {
                crate::log_err!("Failed to load {}: {}", path.display(), e);
                return Err(e);
            }
        };

        let id = Uuid::new_v4();
        crate::log_info!(
            "Opened session {} for {} ({}, {}x{})",
            id,
            path.display(),
            if layers.layers()[0].name == LOADED_LAYER_NAME { "existing drawing" } else { "new drawing" },
            layers.width(),
            layers.height()
        );

        let composite = layers.composite();
        Ok(Self {
            id,
            tools,
            path,
            layers,
            history: HistoryManager::new(),
            controller: InteractionController::new(),
            composite,
            is_dirty: false,
        })
    }

    /// Open the drawing for `date` inside `data_dir`.
    pub fn open_for_date(
        data_dir: &Path,
        date: NaiveDate,
        width: u32,
        height: u32,
        tools: ToolState,
    ) -> Result<Self, DrawingError> {
        Self::open(io::drawing_path_for_date(data_dir, date), width, height, tools)
    }

    // ---- pointer events -----------------------------------------------------

    pub fn press(&mut self, pos: Point) -> CanvasUpdate {
        let update = self.controller.press(pos, &mut self.layers, &mut self.history, &self.tools);
        self.after_update(update)
    }

    pub fn drag(&mut self, pos: Point) -> CanvasUpdate {
        let update = self.controller.drag(pos, &mut self.layers, &self.tools);
        self.after_update(update)
    }

    pub fn release(&mut self, pos: Point) -> CanvasUpdate {
        let update = self.controller.release(pos, &mut self.layers);
        self.after_update(update)
    }

    pub fn hover(&mut self, pos: Point) -> CanvasUpdate {
        self.controller.hover(pos, &self.tools)
    }

    pub fn leave(&mut self) -> CanvasUpdate {
        self.controller.leave()
    }

    fn after_update(&mut self, update: CanvasUpdate) -> CanvasUpdate {
        if update == CanvasUpdate::Raster {
            self.mark_dirty();
            self.recomposite();
        }
        update
    }

    fn recomposite(&mut self) {
        self.composite = self.layers.composite();
    }

    // ---- edit commands ------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.layers);
        if changed {
            self.mark_dirty();
            self.recomposite();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.layers);
        if changed {
            self.mark_dirty();
            self.recomposite();
        }
        changed
    }

    /// Erase the active layer (undoable).
    pub fn clear(&mut self) {
        self.history.snapshot_before_edit(&self.layers);
        self.layers.clear_active();
        self.mark_dirty();
        self.recomposite();
    }

    /// Resample every layer to a new canvas size.  Only an actual size
    /// change dirties the drawing.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.layers.resize_all(width, height);
        if self.composite.dimensions() != (self.layers.width(), self.layers.height()) {
            self.mark_dirty();
            self.recomposite();
        }
    }

    // ---- layers -------------------------------------------------------------

    pub fn add_layer(&mut self, name: Option<String>, image: Option<RgbaImage>) {
        self.layers.add_layer(name, image);
        self.mark_dirty();
        self.recomposite();
    }

    pub fn remove_layer(&mut self) {
        self.layers.remove_layer();
        self.mark_dirty();
        self.recomposite();
    }

    pub fn move_layer(&mut self, direction: LayerMove) -> bool {
        let moved = self.layers.move_active(direction);
        if moved {
            self.mark_dirty();
            self.recomposite();
        }
        moved
    }

    pub fn select_layer(&mut self, index: usize) -> bool {
        self.layers.set_active(index)
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.layer_names()
    }

    pub fn active_index(&self) -> usize {
        self.layers.active_index()
    }

    // ---- display ------------------------------------------------------------

    /// Cached composite of all layers over white.
    pub fn composite(&self) -> &RgbaImage {
        &self.composite
    }

    /// Composite plus the transient overlay (shape preview, cursor ring).
    pub fn display_image(&self) -> RgbaImage {
        self.controller.render_overlay(&self.composite)
    }

    // ---- persistence --------------------------------------------------------

    /// Flatten the stack and write it to the session's file.
    pub fn save(&mut self) -> Result<(), DrawingError> {
        let flat = self.layers.flatten();
        match io::save_drawing(&self.path, &flat) {
            Ok(()) => {
                crate::log_info!("Saved {} ({}x{})", self.path.display(), flat.width(), flat.height());
                self.mark_clean();
                Ok(())
            }
            Err(e) => {
                crate::log_err!("Save failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn has_saved_file(&self) -> bool {
        self.path.is_file()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    /// File name with a trailing `*` when there are unsaved changes.
    pub fn display_title(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string());
        if self.is_dirty {
            format!("{}*", name)
        } else {
            name
        }
    }
}
