//! The drawing surface capability and the per-widget cell canvas.
//!
//! Every widget owns one canvas sized to its allocation. Widgets paint into
//! it through a [`Painter`] in widget-local coordinates; a [`Surface`]
//! implementation later composites the canvases in tree order.

use super::cell::{CellStyle, StyledCell};
use crate::dom::{WidgetId, WidgetTree};
use crate::geometry::{Region, Size};

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// A rectangular grid of styled cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Canvas {
    width: i32,
    height: i32,
    cells: Vec<StyledCell>,
}

impl Canvas {
    pub fn new(size: Size) -> Self {
        let width = size.width.max(0);
        let height = size.height.max(0);
        Self {
            width,
            height,
            cells: vec![StyledCell::blank(); (width * height) as usize],
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Resize, clearing every cell. No-op when the size is unchanged.
    pub fn resize(&mut self, size: Size) {
        if size != self.size() {
            *self = Canvas::new(size);
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(StyledCell::blank());
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&StyledCell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Write one cell. Out-of-bounds writes are clipped.
    pub fn set(&mut self, x: i32, y: i32, cell: StyledCell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// The characters of row `y`, trailing blanks included.
    pub fn row_text(&self, y: i32) -> String {
        (0..self.width)
            .filter_map(|x| self.get(x, y))
            .map(|c| c.ch)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Painter
// ---------------------------------------------------------------------------

/// Drawing helper over one widget's canvas. All coordinates are local to
/// the widget and clipped to its allocation.
pub struct Painter<'a> {
    canvas: &'a mut Canvas,
}

impl<'a> Painter<'a> {
    pub fn new(canvas: &'a mut Canvas) -> Self {
        Self { canvas }
    }

    pub fn size(&self) -> Size {
        self.canvas.size()
    }

    /// Paint every cell blank in `style`.
    pub fn fill(&mut self, style: CellStyle) {
        self.canvas.cells.fill(StyledCell::blank_styled(style));
    }

    pub fn put_char(&mut self, x: i32, y: i32, ch: char, style: CellStyle) {
        self.canvas.set(x, y, StyledCell::new(ch, style));
    }

    /// Write `text` starting at `(x, y)`. Returns the number of cells written
    /// before clipping.
    pub fn put_str(&mut self, x: i32, y: i32, text: &str, style: CellStyle) -> i32 {
        let mut written = 0;
        for (i, ch) in text.chars().enumerate() {
            self.put_char(x + i as i32, y, ch, style);
            written += 1;
        }
        written
    }

    /// Write `text` horizontally centered on row `y`.
    pub fn put_centered(&mut self, y: i32, text: &str, style: CellStyle) {
        let len = text.chars().count() as i32;
        let x = ((self.canvas.width - len) / 2).max(0);
        self.put_str(x, y, text, style);
    }

    /// A single-line box around the edge of the canvas.
    pub fn draw_border(&mut self, style: CellStyle) {
        let (w, h) = (self.canvas.width, self.canvas.height);
        if w < 2 || h < 2 {
            return;
        }
        for x in 1..w - 1 {
            self.put_char(x, 0, '─', style);
            self.put_char(x, h - 1, '─', style);
        }
        for y in 1..h - 1 {
            self.put_char(0, y, '│', style);
            self.put_char(w - 1, y, '│', style);
        }
        self.put_char(0, 0, '┌', style);
        self.put_char(w - 1, 0, '┐', style);
        self.put_char(0, h - 1, '└', style);
        self.put_char(w - 1, h - 1, '┘', style);
    }
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// An opaque character-cell drawing backend keyed by widget identity.
///
/// Each widget has exactly one surface sized to its allocation. The core
/// only configures, paints and composites; what happens to the composited
/// frame is the implementation's business.
pub trait Surface {
    /// Create the widget's surface. No-op if it exists.
    fn register(&mut self, id: WidgetId);

    fn unregister(&mut self, id: WidgetId);

    /// Position and size the widget's surface. Registers it if needed.
    fn configure(&mut self, id: WidgetId, region: Region);

    /// A painter over the widget's surface. `None` if never registered.
    fn painter(&mut self, id: WidgetId) -> Option<Painter<'_>>;

    /// Paint the whole surface blank in `style`.
    fn fill(&mut self, id: WidgetId, style: CellStyle) {
        if let Some(mut painter) = self.painter(id) {
            painter.fill(style);
        }
    }

    /// Stack the listed surfaces, first at the bottom, into one frame.
    fn composite(&mut self, order: &[WidgetId]);
}

/// Configure and paint every visible widget under `root`, then composite
/// them in tree order. Returns the painted widgets.
pub fn paint_subtree(tree: &WidgetTree, root: WidgetId, surface: &mut dyn Surface) -> Vec<WidgetId> {
    paint_stack(tree, &[root], surface)
}

/// [`paint_subtree`] for several roots stacked bottom to top, e.g. a main
/// window under a dialog.
pub fn paint_stack(tree: &WidgetTree, roots: &[WidgetId], surface: &mut dyn Surface) -> Vec<WidgetId> {
    let order: Vec<WidgetId> = roots
        .iter()
        .flat_map(|&root| tree.walk_depth_first(root))
        .filter(|&id| tree.is_visible(id))
        .collect();

    for &id in &order {
        let Some(node) = tree.get(id) else {
            continue;
        };
        surface.configure(id, node.region());
        let widget = node.widget();
        let theme = tree.current_theme(id);
        let Some(mut painter) = surface.painter(id) else {
            continue;
        };
        painter.fill(theme.text);
        if theme.border {
            let border = CellStyle { fg: theme.border_color.or(theme.text.fg), ..theme.text };
            painter.draw_border(border);
        }
        if let Some(drawable) = widget.as_drawable() {
            drawable.draw(tree, id, &mut painter);
        }
    }
    surface.composite(&order);
    order
}
