use image::RgbaImage;

use crate::canvas::LayerStack;

// ============================================================================
// LAYER SNAPSHOT
// ============================================================================

/// Owned copy of one layer's pixels.  Never aliases the live buffer, so later
/// painting cannot change a stored snapshot.
#[derive(Clone, Debug)]
pub struct LayerSnapshot {
    pixels: RgbaImage,
}

impl LayerSnapshot {
    pub fn capture(layers: &LayerStack) -> Self {
        Self { pixels: layers.active_layer().pixels.clone() }
    }

    fn memory_bytes(&self) -> usize {
        self.pixels.as_raw().len()
    }
}

// ============================================================================
// HISTORY MANAGER - snapshot undo/redo of the active layer
// ============================================================================

/// Undo/redo stacks of full active-layer snapshots for one drawing session.
///
/// History is shared across layers: undo and redo always act on whichever
/// layer is active at the time they run.  There is no capacity bound.
#[derive(Default)]
pub struct HistoryManager {
    undo_stack: Vec<LayerSnapshot>,
    redo_stack: Vec<LayerSnapshot>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the active layer before a gesture mutates it.  Any new edit
    /// invalidates the redo stack.
    pub fn snapshot_before_edit(&mut self, layers: &LayerStack) {
        self.undo_stack.push(LayerSnapshot::capture(layers));
        self.redo_stack.clear();
    }

    /// Restore the most recent snapshot into the active layer.  Returns false
    /// (and does nothing) when there is nothing to undo.
    pub fn undo(&mut self, layers: &mut LayerStack) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else { return false };
        let current = layers.replace_active_pixels(snapshot.pixels);
        self.redo_stack.push(LayerSnapshot { pixels: current });
        true
    }

    /// Re-apply the most recently undone state.  Returns false when there is
    /// nothing to redo.
    pub fn redo(&mut self, layers: &mut LayerStack) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else { return false };
        let current = layers.replace_active_pixels(snapshot.pixels);
        self.undo_stack.push(LayerSnapshot { pixels: current });
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Bytes held by both stacks.
    pub fn memory_usage(&self) -> usize {
        self.undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .map(LayerSnapshot::memory_bytes)
            .sum()
    }
}
