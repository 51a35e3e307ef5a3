//! Pilot: programmatic interaction with a headless App.
//!
//! The `Pilot` wraps an [`App`](crate::app::App) in headless mode and provides
//! methods to simulate user input (key presses, mouse gestures, resize), run
//! frames, and read the composited screen back as text.

use std::rc::Rc;

use crate::app::{App, AppConfig};
use crate::dom::{WidgetId, WidgetTree};
use crate::error::Result;
use crate::event::input::{InputEvent, Key, KeyEvent, Modifiers, MouseAction, MouseBtn, MouseEvent};
use crate::object::Propagation;
use crate::widget::Widget;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless app driver for testing.
///
/// The Pilot creates an [`App`] without a terminal driver, then provides a
/// high-level API for simulating user interaction and inspecting rendered output.
///
/// # Examples
///
/// ```ignore
/// use std::rc::Rc;
/// use tessel::event::Key;
/// use tessel::testing::Pilot;
/// use tessel::widgets::{Button, Window};
///
/// let mut pilot = Pilot::new(20, 5);
/// let window = pilot.add_window(Rc::new(Window::new("Demo")))?;
/// pilot.tree_mut().create_widget(Rc::new(Button::new("OK")), Some(window))?;
/// pilot.press_key(Key::Tab);
/// assert!(pilot.screen_text()?.contains("[ OK ]"));
/// ```
pub struct Pilot {
    app: App,
}

impl Pilot {
    /// Create a headless app with the given terminal size.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            app: App::new_headless(width, height),
        }
    }

    /// Create a Pilot from an [`AppConfig`], forcing headless mode.
    ///
    /// The stylesheet and accelerator file are loaded as [`App::new`] would.
    pub fn with_config(config: AppConfig, width: u16, height: u16) -> Result<Self> {
        Ok(Self {
            app: App::headless_with(config, width, height)?,
        })
    }

    /// Wrap an existing app.
    pub fn from_app(app: App) -> Self {
        Self { app }
    }

    /// Add and show a toplevel.
    pub fn add_window(&mut self, widget: Rc<dyn Widget>) -> Result<WidgetId> {
        self.app.add_window(widget)
    }

    // ── Input simulation ─────────────────────────────────────────────

    /// Simulate a key press with no modifiers.
    pub fn press_key(&mut self, key: Key) -> Propagation {
        self.press(key, Modifiers::NONE)
    }

    /// Simulate a key press with the given modifiers.
    pub fn press(&mut self, key: Key, modifiers: Modifiers) -> Propagation {
        self.app.handle_input(InputEvent::Key(KeyEvent::new(key, modifiers)))
    }

    /// Simulate typing each character of `text` as individual key presses.
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.press_key(Key::Char(ch));
        }
    }

    fn mouse(&mut self, kind: MouseAction, x: u16, y: u16) -> Propagation {
        self.app.handle_input(InputEvent::Mouse(MouseEvent::new(kind, x, y)))
    }

    pub fn mouse_down(&mut self, x: u16, y: u16) -> Propagation {
        self.mouse(MouseAction::Down(MouseBtn::Left), x, y)
    }

    pub fn mouse_up(&mut self, x: u16, y: u16) -> Propagation {
        self.mouse(MouseAction::Up(MouseBtn::Left), x, y)
    }

    /// Move the pointer without buttons held.
    pub fn hover(&mut self, x: u16, y: u16) -> Propagation {
        self.mouse(MouseAction::Moved, x, y)
    }

    /// Simulate a left-button click (press then release) at (x, y).
    pub fn click(&mut self, x: u16, y: u16) {
        self.mouse_down(x, y);
        self.mouse_up(x, y);
    }

    /// Press at `from`, drag to `to`, release there.
    pub fn drag(&mut self, from: (u16, u16), to: (u16, u16)) {
        self.mouse_down(from.0, from.1);
        self.mouse(MouseAction::Drag(MouseBtn::Left), to.0, to.1);
        self.mouse_up(to.0, to.1);
    }

    /// Simulate a terminal resize to the given dimensions.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.app.handle_input(InputEvent::Resize { width, height });
    }

    /// Simulate the terminal losing focus.
    pub fn focus_lost(&mut self) -> Propagation {
        self.app.handle_input(InputEvent::FocusLost)
    }

    // ── Processing ───────────────────────────────────────────────────

    /// Run one frame. Returns whether anything was repainted.
    pub fn tick(&mut self) -> Result<bool> {
        self.app.tick()
    }

    // ── Query ────────────────────────────────────────────────────────

    /// Borrow the underlying app immutably.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Borrow the underlying app mutably.
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn tree(&self) -> &WidgetTree {
        &self.app.tree
    }

    pub fn tree_mut(&mut self) -> &mut WidgetTree {
        &mut self.app.tree
    }

    /// Whether the app is still running (has not quit).
    pub fn is_running(&self) -> bool {
        !self.app.should_quit()
    }

    /// Run a frame, then return the whole screen as text.
    pub fn screen_text(&mut self) -> Result<String> {
        self.tick()?;
        Ok(self.app.compositor.to_text())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
