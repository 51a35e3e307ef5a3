//! Snapshot rendering helpers.
//!
//! Functions for turning a widget tree, or part of a composited screen, into
//! plain-text strings suitable for snapshot testing and assertions.

use crate::dom::{WidgetId, WidgetTree};
use crate::error::Result;
use crate::geometry::Region;
use crate::layout::LayoutEngine;
use crate::render::compositor::Compositor;
use crate::render::paint_subtree;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lay out the subtree at `root` into a `width` x `height` area at the
/// origin, paint it into a fresh compositor and return the screen as text.
///
/// Each row becomes one line, right-trimmed of spaces. Lines are separated
/// by `'\n'` and the final line has no trailing newline.
///
/// # Examples
///
/// ```ignore
/// use std::rc::Rc;
/// use tessel::dom::WidgetTree;
/// use tessel::testing::render_to_string;
/// use tessel::widgets::{Label, Window};
///
/// let mut tree = WidgetTree::default();
/// let window = tree.create_widget(Rc::new(Window::new("Hi")), None)?;
/// tree.create_widget(Rc::new(Label::new("Hello")), Some(window))?;
/// let output = render_to_string(&mut tree, window, 12, 3)?;
/// assert!(output.contains("Hello"));
/// ```
pub fn render_to_string(tree: &mut WidgetTree, root: WidgetId, width: u16, height: u16) -> Result<String> {
    let mut engine = LayoutEngine::new();
    engine.layout(tree, root, Region::new(0, 0, i32::from(width), i32::from(height)))?;
    let mut compositor = Compositor::new(width, height);
    paint_subtree(tree, root, &mut compositor);
    Ok(compositor.to_text())
}

/// The text inside `region` of a composited screen, one right-trimmed line
/// per row. Cells outside the screen read as spaces.
pub fn region_to_string(compositor: &Compositor, region: Region) -> String {
    let mut lines = Vec::with_capacity(region.height.max(0) as usize);
    for y in region.y..region.bottom() {
        let row: String = (region.x..region.right())
            .map(|x| {
                let cell = match (u16::try_from(x), u16::try_from(y)) {
                    (Ok(x), Ok(y)) => compositor.get_cell(x, y),
                    _ => None,
                };
                cell.map_or(' ', |c| c.ch)
            })
            .collect();
        lines.push(row.trim_end().to_owned());
    }
    lines.join("\n")
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::widgets::{Button, Container, Label, Window};

    // ── render_to_string ─────────────────────────────────────────────

    #[test]
    fn render_window_with_label() {
        let mut tree = WidgetTree::default();
        let window = tree.create_widget(Rc::new(Window::new("Hi")), None).unwrap();
        tree.create_widget(Rc::new(Label::new("Hello")), Some(window)).unwrap();
        let output = render_to_string(&mut tree, window, 12, 3).unwrap();
        let lines: Vec<&str> = output.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "│Hello     │");
        assert_eq!(lines[2], "└──────────┘");
    }

    #[test]
    fn render_undecorated_row() {
        let mut tree = WidgetTree::default();
        let window = tree.create_widget(Rc::new(Window::new("")), None).unwrap();
        tree.set_property(window, "decorated", false.into()).unwrap();
        let row = tree
            .create_widget(Rc::new(Container::horizontal().with_spacing(1)), Some(window))
            .unwrap();
        tree.create_widget(Rc::new(Button::new("A")), Some(row)).unwrap();
        tree.create_widget(Rc::new(Button::new("B")), Some(row)).unwrap();
        let output = render_to_string(&mut tree, window, 12, 1).unwrap();
        assert_eq!(output, "[ A ] [ B ]");
    }

    // ── region_to_string ─────────────────────────────────────────────

    #[test]
    fn region_crops_and_pads() {
        let mut tree = WidgetTree::default();
        let window = tree.create_widget(Rc::new(Window::new("")), None).unwrap();
        tree.set_property(window, "decorated", false.into()).unwrap();
        tree.create_widget(Rc::new(Label::new("abc\ndef")), Some(window)).unwrap();

        let mut engine = LayoutEngine::new();
        engine.layout(&mut tree, window, Region::new(0, 0, 4, 2)).unwrap();
        let mut compositor = Compositor::new(4, 2);
        paint_subtree(&tree, window, &mut compositor);

        assert_eq!(region_to_string(&compositor, Region::new(1, 0, 2, 2)), "bc\nef");
        assert_eq!(region_to_string(&compositor, Region::new(3, 1, 3, 2)), "\n");
        assert_eq!(region_to_string(&compositor, Region::new(0, 0, 0, 0)), "");
    }
}
