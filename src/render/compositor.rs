//! Per-widget layers composited into one screen buffer, plus frame diffing.
//!
//! The `Compositor` keeps one [`Canvas`] per registered widget together with
//! the region it occupies on screen. `composite` stacks the listed layers
//! into the screen buffer; `take_updates` compares that buffer against the
//! last presented frame and returns only the cells that changed.

use slotmap::SecondaryMap;

use super::cell::StyledCell;
use super::surface::{Canvas, Painter, Surface};
use crate::dom::WidgetId;
use crate::geometry::Region;

// ---------------------------------------------------------------------------
// CellUpdate
// ---------------------------------------------------------------------------

/// A single cell that changed between frames.
///
/// Used by the driver to emit minimal terminal escape sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellUpdate {
    pub x: u16,
    pub y: u16,
    pub cell: StyledCell,
}

#[derive(Debug, Clone, Default)]
struct Layer {
    region: Region,
    canvas: Canvas,
}

// ---------------------------------------------------------------------------
// Compositor
// ---------------------------------------------------------------------------

/// The in-memory [`Surface`] implementation.
#[derive(Debug, Clone)]
pub struct Compositor {
    layers: SecondaryMap<WidgetId, Layer>,
    /// `screen[y][x]` is the cell at column x, row y.
    screen: Vec<Vec<StyledCell>>,
    /// The last frame handed out by `take_updates`.
    presented: Vec<Vec<StyledCell>>,
    pub width: u16,
    pub height: u16,
}

impl Compositor {
    /// A compositor with a blank screen of the given dimensions.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            layers: SecondaryMap::new(),
            screen: Self::blank_screen(width, height),
            presented: Vec::new(),
            width,
            height,
        }
    }

    /// Resize the screen. The next `take_updates` repaints everything.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.screen = Self::blank_screen(width, height);
        self.presented.clear();
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Drop the layers of widgets that no longer exist.
    pub fn retain_layers(&mut self, keep: impl Fn(WidgetId) -> bool) {
        self.layers.retain(|id, _| keep(id));
    }

    /// The on-screen region of a widget's layer.
    pub fn layer_region(&self, id: WidgetId) -> Option<Region> {
        self.layers.get(id).map(|l| l.region)
    }

    /// Cells that differ from the last presented frame. Every cell counts
    /// as changed after construction or a resize.
    pub fn take_updates(&mut self) -> Vec<CellUpdate> {
        let mut updates = Vec::new();
        for (y, row) in self.screen.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                let before = self.presented.get(y).and_then(|r| r.get(x));
                if before != Some(cell) {
                    updates.push(CellUpdate { x: x as u16, y: y as u16, cell: *cell });
                }
            }
        }
        self.presented = self.screen.clone();
        updates
    }

    /// The screen cell at (x, y). `None` out of bounds.
    pub fn get_cell(&self, x: u16, y: u16) -> Option<&StyledCell> {
        self.screen.get(y as usize).and_then(|row| row.get(x as usize))
    }

    /// The screen as text, one line per row with trailing blanks trimmed.
    pub fn to_text(&self) -> String {
        let lines: Vec<String> = self
            .screen
            .iter()
            .map(|row| row.iter().map(|c| c.ch).collect::<String>().trim_end().to_owned())
            .collect();
        lines.join("\n")
    }

    fn blank_screen(width: u16, height: u16) -> Vec<Vec<StyledCell>> {
        vec![vec![StyledCell::blank(); width as usize]; height as usize]
    }

    fn blit(&mut self, layer: &Layer) {
        let screen = Region::new(0, 0, i32::from(self.width), i32::from(self.height));
        let clip = layer.region.intersection(screen);
        for y in clip.y..clip.bottom() {
            for x in clip.x..clip.right() {
                let Some(cell) = layer.canvas.get(x - layer.region.x, y - layer.region.y) else {
                    continue;
                };
                let target = &mut self.screen[y as usize][x as usize];
                *target = StyledCell::new(cell.ch, cell.style.over(target.style));
            }
        }
    }
}

impl Surface for Compositor {
    fn register(&mut self, id: WidgetId) {
        if !self.layers.contains_key(id) {
            self.layers.insert(id, Layer::default());
        }
    }

    fn unregister(&mut self, id: WidgetId) {
        self.layers.remove(id);
    }

    fn configure(&mut self, id: WidgetId, region: Region) {
        self.register(id);
        if let Some(layer) = self.layers.get_mut(id) {
            layer.region = region;
            layer.canvas.resize(region.size());
        }
    }

    fn painter(&mut self, id: WidgetId) -> Option<Painter<'_>> {
        self.layers.get_mut(id).map(|l| Painter::new(&mut l.canvas))
    }

    fn composite(&mut self, order: &[WidgetId]) {
        self.screen = Self::blank_screen(self.width, self.height);
        for &id in order {
            if let Some(layer) = self.layers.get(id).cloned() {
                self.blit(&layer);
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;
    use crate::object::Color;
    use crate::render::cell::CellStyle;

    fn ids(n: usize) -> Vec<WidgetId> {
        let mut map: SlotMap<WidgetId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    // ── Layers ───────────────────────────────────────────────────────

    #[test]
    fn later_layers_draw_on_top() {
        let ids = ids(2);
        let mut comp = Compositor::new(6, 2);
        comp.configure(ids[0], Region::new(0, 0, 6, 2));
        comp.configure(ids[1], Region::new(2, 1, 2, 1));
        comp.painter(ids[0]).unwrap().put_str(0, 1, "aaaaaa", CellStyle::new());
        comp.painter(ids[1]).unwrap().put_str(0, 0, "bb", CellStyle::new());
        comp.composite(&ids);
        assert_eq!(comp.to_text(), "\naabbaa");
    }

    #[test]
    fn unset_colors_show_lower_layer() {
        let ids = ids(2);
        let mut comp = Compositor::new(2, 1);
        comp.configure(ids[0], Region::new(0, 0, 2, 1));
        comp.configure(ids[1], Region::new(0, 0, 1, 1));
        comp.fill(ids[0], CellStyle::new().bg(Color::Blue));
        comp.painter(ids[1]).unwrap().put_char(0, 0, 'x', CellStyle::new().fg(Color::Red));
        comp.composite(&ids);
        let cell = comp.get_cell(0, 0).unwrap();
        assert_eq!(cell.ch, 'x');
        assert_eq!(cell.style.fg, Some(Color::Red));
        assert_eq!(cell.style.bg, Some(Color::Blue));
    }

    #[test]
    fn layers_are_clipped_to_screen() {
        let ids = ids(1);
        let mut comp = Compositor::new(3, 1);
        comp.configure(ids[0], Region::new(-1, 0, 5, 1));
        comp.painter(ids[0]).unwrap().put_str(0, 0, "abcde", CellStyle::new());
        comp.composite(&ids);
        assert_eq!(comp.to_text(), "bcd");
    }

    #[test]
    fn unregistered_layer_is_skipped() {
        let ids = ids(1);
        let mut comp = Compositor::new(2, 1);
        assert!(comp.painter(ids[0]).is_none());
        comp.composite(&ids);
        comp.configure(ids[0], Region::new(0, 0, 1, 1));
        comp.unregister(ids[0]);
        assert_eq!(comp.layer_count(), 0);
    }

    // ── Diff ─────────────────────────────────────────────────────────

    #[test]
    fn updates_only_report_changes() {
        let ids = ids(1);
        let mut comp = Compositor::new(4, 1);
        assert_eq!(comp.take_updates().len(), 4);
        assert!(comp.take_updates().is_empty());

        comp.configure(ids[0], Region::new(1, 0, 1, 1));
        comp.painter(ids[0]).unwrap().put_char(0, 0, 'z', CellStyle::new());
        comp.composite(&ids);
        let updates = comp.take_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!((updates[0].x, updates[0].y, updates[0].cell.ch), (1, 0, 'z'));
    }

    #[test]
    fn resize_repaints_everything() {
        let mut comp = Compositor::new(2, 2);
        comp.take_updates();
        comp.resize(3, 1);
        assert_eq!(comp.take_updates().len(), 3);
    }
}
