//! App struct: lifecycle, event loop, frame pipeline.
//!
//! [`App`] ties together the widget tree, the stylesheet, per-window layout
//! engines, the compositor, named actions and the terminal driver. The
//! `new_headless` constructor allows testing without a real terminal.

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use slotmap::SecondaryMap;
use tokio::sync::mpsc;

use crate::context::Context;
use crate::css::{MediaContext, StyleSheet};
use crate::dom::{WidgetId, WidgetTree};
use crate::error::Result;
use crate::event::input::{from_crossterm, InputEvent, Key, Modifiers};
use crate::event::Accelerator;
use crate::geometry::{Region, Size};
use crate::layout::LayoutEngine;
use crate::logging::{self, targets, LogConfig};
use crate::object::{Propagation, PropertyValue};
use crate::render::compositor::Compositor;
use crate::render::driver::Driver;
use crate::render::paint_stack;
use crate::widget::Widget;

/// Accelerator path of the built-in quit action.
pub const QUIT_ACTION: &str = "<App>/quit";

/// A named application command, run when its accelerator fires.
pub type Action = Box<dyn FnMut(&mut App)>;

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Optional app title, used for the first window added with
    /// [`App::add_window_titled`].
    pub title: Option<String>,
    /// Optional stylesheet source, applied after the built-in look.
    pub css: Option<String>,
    /// Target frames per second for the render loop.
    pub fps: u32,
    /// Modifier that fires mnemonics in every window.
    pub mnemonic_modifier: Modifiers,
    /// Accelerator map file loaded at startup when it exists.
    pub accel_file: Option<PathBuf>,
    /// Fixed size for `@media` evaluation. Defaults to the screen size.
    pub media_size: Option<Size>,
    /// Logging setup, installed by [`App::new`].
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: None,
            css: None,
            fps: 60,
            mnemonic_modifier: Modifiers::ALT,
            accel_file: None,
            media_size: None,
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title (builder).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the stylesheet source (builder).
    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    /// Set the target FPS (builder).
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_mnemonic_modifier(mut self, modifiers: Modifiers) -> Self {
        self.mnemonic_modifier = modifiers;
        self
    }

    pub fn with_accel_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.accel_file = Some(path.into());
        self
    }

    pub fn with_media_size(mut self, size: Size) -> Self {
        self.media_size = Some(size);
        self
    }

    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.fps.max(1)))
    }
}

// ---------------------------------------------------------------------------
// Redraw requests
// ---------------------------------------------------------------------------

/// A repaint request posted from outside the UI thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    /// Relayout and repaint every window.
    Full,
    /// Repaint one widget.
    Widget(WidgetId),
}

/// Cloneable, `Send` handle for requesting repaints. Requests are picked up
/// by the next [`App::tick`].
#[derive(Debug, Clone)]
pub struct RedrawHandle {
    tx: mpsc::UnboundedSender<Redraw>,
}

impl RedrawHandle {
    /// Returns `false` once the app is gone.
    pub fn request(&self, redraw: Redraw) -> bool {
        self.tx.send(redraw).is_ok()
    }

    pub fn request_full(&self) -> bool {
        self.request(Redraw::Full)
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// The main application struct.
///
/// Owns the widget tree, layout, compositor, driver, actions and config.
/// The driver is optional to support headless testing.
pub struct App {
    /// The widget tree, with its shared context.
    pub tree: WidgetTree,
    /// In-memory screen the windows are composited into.
    pub compositor: Compositor,
    /// Terminal output driver. `None` in headless mode.
    pub driver: Option<Driver>,
    /// Application configuration.
    pub config: AppConfig,
    stylesheet: StyleSheet,
    media: MediaContext,
    layouts: SecondaryMap<WidgetId, LayoutEngine>,
    styled: SecondaryMap<WidgetId, ()>,
    actions: HashMap<String, Action>,
    redraw_tx: mpsc::UnboundedSender<Redraw>,
    redraw_rx: mpsc::UnboundedReceiver<Redraw>,
    needs_layout: bool,
    /// Whether the app is still running.
    running: bool,
}

impl App {
    /// Create a new app with a real terminal driver.
    ///
    /// Installs logging, queries the terminal size, then loads the
    /// configured stylesheet and accelerator file.
    pub fn new(config: AppConfig) -> Result<Self> {
        logging::init(&config.log)?;
        let (width, height) = Driver::terminal_size()?;
        let driver = Driver::new()?;
        let mut app = Self::assemble(config, width, height, Some(driver));
        app.load_resources()?;
        Ok(app)
    }

    /// Create a headless app for testing (no terminal driver).
    ///
    /// Uses the given dimensions for the screen size.
    pub fn new_headless(width: u16, height: u16) -> Self {
        Self::assemble(AppConfig::default(), width, height, None)
    }

    /// A headless app with a custom config. Fails like [`App::new`] when the
    /// stylesheet or the accelerator file is invalid; logging is left alone.
    pub fn headless_with(config: AppConfig, width: u16, height: u16) -> Result<Self> {
        let mut app = Self::assemble(config, width, height, None);
        app.load_resources()?;
        Ok(app)
    }

    fn assemble(config: AppConfig, width: u16, height: u16, driver: Option<Driver>) -> Self {
        let context = Context::new().with_mnemonic_modifier(config.mnemonic_modifier);
        let stylesheet = context.stylesheet().clone();
        let media = MediaContext::new(
            config
                .media_size
                .unwrap_or_else(|| Size::new(i32::from(width), i32::from(height))),
        );
        let (redraw_tx, redraw_rx) = mpsc::unbounded_channel();
        let mut app = Self {
            tree: WidgetTree::new(context),
            compositor: Compositor::new(width, height),
            driver,
            config,
            stylesheet,
            media,
            layouts: SecondaryMap::new(),
            styled: SecondaryMap::new(),
            actions: HashMap::new(),
            redraw_tx,
            redraw_rx,
            needs_layout: true,
            running: true,
        };
        let quit = Accelerator::new(Key::Char('c'), Modifiers::CTRL);
        if let Err(err) = app.add_action(QUIT_ACTION, quit, App::request_quit) {
            tracing::warn!(target: targets::APP, %err, "built-in quit action unavailable");
        }
        app
    }

    fn load_resources(&mut self) -> Result<()> {
        if let Some(css) = &self.config.css {
            let user = StyleSheet::parse(css)?;
            tracing::debug!(target: targets::STYLE, rules = user.rule_count(), "application stylesheet loaded");
            self.stylesheet.extend(user);
            self.styled.clear();
        }
        if let Some(path) = &self.config.accel_file {
            if path.exists() {
                let loaded = self.tree.context().accel_map().load(path)?;
                tracing::debug!(target: targets::ACCEL, loaded, path = %path.display(), "accelerator file loaded");
            }
        }
        Ok(())
    }

    // ── Windows ──────────────────────────────────────────────────────

    /// Create a toplevel from `widget` (a window or dialog) and show it.
    pub fn add_window(&mut self, widget: Rc<dyn Widget>) -> Result<WidgetId> {
        let id = self.tree.create_widget(widget, None)?;
        if self.tree.window_state(id).is_none() {
            tracing::warn!(target: targets::APP, widget = ?id, "added toplevel is not a window");
        }
        self.tree.show(id)?;
        self.needs_layout = true;
        Ok(id)
    }

    /// Like [`add_window`](Self::add_window), then sets the window title from
    /// the config when one is configured.
    pub fn add_window_titled(&mut self, widget: Rc<dyn Widget>) -> Result<WidgetId> {
        let id = self.add_window(widget)?;
        if let Some(title) = self.config.title.clone() {
            self.tree.set_property(id, "title", PropertyValue::Str(title))?;
        }
        Ok(id)
    }

    /// Visible toplevels, bottom to top.
    pub fn visible_windows(&self) -> Vec<WidgetId> {
        self.tree
            .windows()
            .into_iter()
            .filter(|&w| self.tree.is_visible(w))
            .collect()
    }

    /// The window receiving input: the topmost visible one.
    pub fn active_window(&self) -> Option<WidgetId> {
        self.visible_windows().last().copied()
    }

    /// Where `window` is placed: its size requests (clamped to the screen)
    /// centered on screen, or the whole screen without requests.
    pub fn window_area(&self, window: WidgetId) -> Region {
        let screen = Size::new(i32::from(self.compositor.width), i32::from(self.compositor.height));
        let request = |name: &str, fallback: i32| match self.tree.property(window, name) {
            Ok(PropertyValue::Int(n)) if n >= 0 => i32::try_from(n).unwrap_or(i32::MAX).min(fallback),
            _ => fallback,
        };
        let width = request("width-request", screen.width);
        let height = request("height-request", screen.height);
        Region::new((screen.width - width) / 2, (screen.height - height) / 2, width, height)
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Register `action` under an accelerator path. `accel` becomes the
    /// binding unless the map already has one for `path` (e.g. loaded from
    /// the accelerator file).
    pub fn add_action<F>(&mut self, path: &str, accel: Accelerator, action: F) -> Result<()>
    where
        F: FnMut(&mut App) + 'static,
    {
        let added = self.tree.context().accel_map().add_entry(path, accel)?;
        tracing::debug!(target: targets::ACCEL, path, %accel, added, "action registered");
        self.actions.insert(path.to_owned(), Box::new(action));
        Ok(())
    }

    pub fn remove_action(&mut self, path: &str) -> bool {
        self.actions.remove(path).is_some()
    }

    /// Run the action at `path`. Returns `false` when none is registered.
    pub fn run_action(&mut self, path: &str) -> bool {
        let Some(mut action) = self.actions.remove(path) else {
            return false;
        };
        tracing::debug!(target: targets::APP, path, "running action");
        action(self);
        self.actions.entry(path.to_owned()).or_insert(action);
        true
    }

    // ── Input ────────────────────────────────────────────────────────

    /// Handle one input event.
    ///
    /// Keys bound in the accelerator map run their action first. Resizes
    /// restyle and relayout everything, then reach every window. Anything
    /// else is routed into the active window.
    pub fn handle_input(&mut self, event: InputEvent) -> Propagation {
        tracing::trace!(target: targets::EVENT, ?event, "input");
        match &event {
            InputEvent::Resize { width, height } => {
                self.resize(*width, *height);
                for window in self.tree.windows() {
                    self.tree.dispatch(window, &event);
                }
                return Propagation::Pass;
            }
            InputEvent::Key(key) => {
                let bound = self.tree.context().accel_map().lookup_path(key);
                if let Some(path) = bound {
                    if self.run_action(&path) {
                        return Propagation::Stop;
                    }
                }
            }
            _ => {}
        }
        let Some(window) = self.active_window() else {
            return Propagation::Pass;
        };
        self.tree.dispatch(window, &event)
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.compositor.resize(width, height);
        if self.config.media_size.is_none() {
            self.media = MediaContext::new(Size::new(i32::from(width), i32::from(height)));
        }
        self.styled.clear();
        self.needs_layout = true;
    }

    /// A `Send` handle other threads can use to request repaints.
    pub fn redraw_handle(&self) -> RedrawHandle {
        RedrawHandle {
            tx: self.redraw_tx.clone(),
        }
    }

    // ── Frame ────────────────────────────────────────────────────────

    /// Run one frame: take redraw requests, style new widgets, lay out and
    /// paint the visible windows, and present the result when a driver is
    /// attached. Returns whether anything was painted.
    pub fn tick(&mut self) -> Result<bool> {
        while let Ok(redraw) = self.redraw_rx.try_recv() {
            match redraw {
                Redraw::Full => self.needs_layout = true,
                Redraw::Widget(id) => {
                    self.tree.invalidate(id);
                }
            }
        }

        self.style_pending();

        if !self.needs_layout && !self.tree.is_dirty() {
            return Ok(false);
        }

        let windows = self.visible_windows();
        self.layouts.retain(|id, _| windows.contains(&id));
        for &window in &windows {
            let area = self.window_area(window);
            let engine = match self.layouts.entry(window) {
                Some(entry) => entry.or_default(),
                None => continue,
            };
            let changed = engine.layout(&mut self.tree, window, area)?;
            tracing::trace!(target: targets::LAYOUT, ?window, ?area, changed, "window laid out");
        }

        self.tree.take_dirty();
        let tree = &self.tree;
        self.compositor.retain_layers(|id| tree.contains(id));
        paint_stack(&self.tree, &windows, &mut self.compositor);
        self.needs_layout = false;

        if let Some(driver) = self.driver.as_mut() {
            let updates = self.compositor.take_updates();
            driver.apply_updates(&updates)?;
            driver.flush()?;
        }
        Ok(true)
    }

    /// Apply the stylesheet to every widget that has not been styled since
    /// it was created or since the last resize.
    fn style_pending(&mut self) {
        let tree = &self.tree;
        self.styled.retain(|id, _| tree.contains(id));
        for window in self.tree.windows() {
            for id in self.tree.walk_depth_first(window) {
                if self.styled.contains_key(id) {
                    continue;
                }
                self.tree.apply_styles_to(id, &self.stylesheet, &self.media);
                self.styled.insert(id, ());
            }
        }
    }

    /// Restyle a widget on the next tick, e.g. after changing its classes.
    pub fn restyle(&mut self, id: WidgetId) {
        for widget in self.tree.walk_depth_first(id) {
            self.styled.remove(widget);
        }
    }

    /// Drive the terminal until [`request_quit`](Self::request_quit).
    ///
    /// Switches to the alternate screen, then alternates between polling
    /// crossterm for input (up to one frame interval) and [`tick`](Self::tick).
    /// The terminal is restored even when a frame fails.
    pub fn run(&mut self) -> Result<()> {
        let Some(driver) = self.driver.as_mut() else {
            tracing::warn!(target: targets::APP, "run called on a headless app");
            return Ok(());
        };
        driver.enter_alt_screen()?;
        driver.hide_cursor()?;
        tracing::info!(target: targets::APP, fps = self.config.fps, "event loop started");

        let result = self.event_loop();

        if let Some(driver) = self.driver.as_mut() {
            driver.show_cursor()?;
            driver.leave_alt_screen()?;
        }
        tracing::info!(target: targets::APP, ok = result.is_ok(), "event loop finished");
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let interval = self.config.frame_interval();
        self.tick()?;
        while self.running {
            if crossterm::event::poll(interval)? {
                if let Some(event) = from_crossterm(crossterm::event::read()?) {
                    self.handle_input(event);
                }
            }
            self.tick()?;
        }
        Ok(())
    }

    /// Whether the app has been asked to quit.
    pub fn should_quit(&self) -> bool {
        !self.running
    }

    /// Ask the app to quit.
    pub fn request_quit(&mut self) {
        tracing::debug!(target: targets::APP, "quit requested");
        self.running = false;
    }

    /// Whether a terminal driver is attached (false in headless mode).
    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// The stylesheet in effect: built-in look plus the configured one.
    pub fn stylesheet(&self) -> &StyleSheet {
        &self.stylesheet
    }
}

// ===========================================================================
// Tests
// ===========================================================================
