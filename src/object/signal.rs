//! Signal bus: named handlers per signal with a pass/stop veto.
//!
//! Every stateful operation in the toolkit emits a signal first and only
//! applies its change when emission returns [`Propagation::Pass`]. Handlers
//! run in connection order; the first one returning [`Propagation::Stop`]
//! ends the emission and suppresses the default action.
//!
//! The bus is generic over the context handlers receive mutably. Widgets use
//! `SignalBus<WidgetTree>` so a handler can mutate any part of the tree,
//! including re-entering emission on other widgets.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use super::value::PropertyValue;
use crate::dom::WidgetId;
use crate::event::input::InputEvent;
use crate::logging::targets;

// ---------------------------------------------------------------------------
// Propagation
// ---------------------------------------------------------------------------

/// The control value returned by handlers and by emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Propagation {
    /// Continue with the next handler and allow the default action.
    #[default]
    Pass,
    /// Halt remaining handlers and suppress the default action.
    Stop,
}

impl Propagation {
    pub fn is_stop(self) -> bool {
        self == Propagation::Stop
    }

    pub fn is_pass(self) -> bool {
        self == Propagation::Pass
    }
}

// ---------------------------------------------------------------------------
// SignalKind
// ---------------------------------------------------------------------------

/// The toolkit's signal catalogue.
///
/// Each built-in kind has a canonical kebab-case name, so string-driven
/// callers (markup loaders, scripts) can resolve them with [`FromStr`].
/// Unknown names become [`SignalKind::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignalKind {
    SetFlags,
    UnsetFlags,
    SetProperty,
    PropertyChanged,
    GrabFocus,
    LostFocus,
    GainedFocus,
    GrabEventFocus,
    LostEventFocus,
    Enter,
    Leave,
    ProcessEvent,
    ButtonPress,
    ButtonRelease,
    Clicked,
    Activate,
    MnemonicActivate,
    Invalidate,
    Resize,
    Show,
    Hide,
    Response,
    Custom(String),
}

const BUILTIN_SIGNALS: &[SignalKind] = &[
    SignalKind::SetFlags,
    SignalKind::UnsetFlags,
    SignalKind::SetProperty,
    SignalKind::PropertyChanged,
    SignalKind::GrabFocus,
    SignalKind::LostFocus,
    SignalKind::GainedFocus,
    SignalKind::GrabEventFocus,
    SignalKind::LostEventFocus,
    SignalKind::Enter,
    SignalKind::Leave,
    SignalKind::ProcessEvent,
    SignalKind::ButtonPress,
    SignalKind::ButtonRelease,
    SignalKind::Clicked,
    SignalKind::Activate,
    SignalKind::MnemonicActivate,
    SignalKind::Invalidate,
    SignalKind::Resize,
    SignalKind::Show,
    SignalKind::Hide,
    SignalKind::Response,
];

impl SignalKind {
    pub fn as_str(&self) -> &str {
        match self {
            SignalKind::SetFlags => "set-flags",
            SignalKind::UnsetFlags => "unset-flags",
            SignalKind::SetProperty => "set-property",
            SignalKind::PropertyChanged => "property-changed",
            SignalKind::GrabFocus => "grab-focus",
            SignalKind::LostFocus => "lost-focus",
            SignalKind::GainedFocus => "gained-focus",
            SignalKind::GrabEventFocus => "grab-event-focus",
            SignalKind::LostEventFocus => "lost-event-focus",
            SignalKind::Enter => "enter",
            SignalKind::Leave => "leave",
            SignalKind::ProcessEvent => "process-event",
            SignalKind::ButtonPress => "button-press",
            SignalKind::ButtonRelease => "button-release",
            SignalKind::Clicked => "clicked",
            SignalKind::Activate => "activate",
            SignalKind::MnemonicActivate => "mnemonic-activate",
            SignalKind::Invalidate => "invalidate",
            SignalKind::Resize => "resize",
            SignalKind::Show => "show",
            SignalKind::Hide => "hide",
            SignalKind::Response => "response",
            SignalKind::Custom(name) => name,
        }
    }
}

impl FromStr for SignalKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('_', "-");
        Ok(BUILTIN_SIGNALS
            .iter()
            .find(|k| k.as_str() == normalized)
            .cloned()
            .unwrap_or_else(|| SignalKind::Custom(s.to_owned())))
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// Everything a handler sees about one emission.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// The object the signal was emitted on.
    pub source: WidgetId,
    pub signal: &'a SignalKind,
    /// Emission arguments.
    pub args: &'a [PropertyValue],
    /// The input event, for `process-event` and friends.
    pub event: Option<&'a InputEvent>,
    /// Extra data bound at connect time.
    pub data: &'a [PropertyValue],
}

impl<'a> Invocation<'a> {
    pub fn new(source: WidgetId, signal: &'a SignalKind, args: &'a [PropertyValue]) -> Self {
        Self {
            source,
            signal,
            args,
            event: None,
            data: &[],
        }
    }

    pub fn with_event(mut self, event: &'a InputEvent) -> Self {
        self.event = Some(event);
        self
    }

    pub fn arg(&self, index: usize) -> Option<&'a PropertyValue> {
        self.args.get(index)
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// A connected handler function.
pub type HandlerFn<C> = Rc<dyn Fn(&mut C, &Invocation<'_>) -> Propagation>;

/// Errors from connecting and disconnecting handlers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    #[error("handler '{handler}' is already connected to '{signal}'")]
    DuplicateHandler { signal: String, handler: String },
    #[error("no handler '{handler}' connected to '{signal}'")]
    NotFound { signal: String, handler: String },
}

/// One registration, snapshotted out of the bus before invocation so that
/// handlers may reconnect or disconnect while the emission runs.
pub struct Connection<C> {
    name: Rc<str>,
    func: HandlerFn<C>,
    data: Rc<[PropertyValue]>,
}

impl<C> Clone for Connection<C> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            func: Rc::clone(&self.func),
            data: Rc::clone(&self.data),
        }
    }
}

impl<C> fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

impl<C> Connection<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self, ctx: &mut C, inv: &Invocation<'_>) -> Propagation {
        let bound = Invocation {
            source: inv.source,
            signal: inv.signal,
            args: inv.args,
            event: inv.event,
            data: &self.data,
        };
        (self.func)(ctx, &bound)
    }
}

/// Run a snapshot of handlers in order, stopping at the first `Stop`.
pub fn run_handlers<C>(
    handlers: &[Connection<C>],
    ctx: &mut C,
    inv: &Invocation<'_>,
) -> Propagation {
    for conn in handlers {
        if conn.invoke(ctx, inv).is_stop() {
            tracing::trace!(
                target: targets::SIGNAL,
                signal = %inv.signal,
                handler = conn.name(),
                "emission stopped"
            );
            return Propagation::Stop;
        }
    }
    Propagation::Pass
}

// ---------------------------------------------------------------------------
// SignalBus
// ---------------------------------------------------------------------------

/// Per-object signal registry.
pub struct SignalBus<C> {
    handlers: HashMap<SignalKind, Vec<Connection<C>>>,
    blocked: HashMap<SignalKind, usize>,
}

impl<C> Default for SignalBus<C> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
            blocked: HashMap::new(),
        }
    }
}

impl<C> fmt::Debug for SignalBus<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(&str, usize)> = self
            .handlers
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        counts.sort();
        f.debug_struct("SignalBus").field("handlers", &counts).finish()
    }
}

impl<C> SignalBus<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `handler` for `signal`.
    pub fn connect<F>(&mut self, signal: SignalKind, handler: &str, f: F) -> Result<(), SignalError>
    where
        F: Fn(&mut C, &Invocation<'_>) -> Propagation + 'static,
    {
        self.connect_with_data(signal, handler, Vec::new(), f)
    }

    /// Register `f` with extra data passed back on every invocation.
    pub fn connect_with_data<F>(
        &mut self,
        signal: SignalKind,
        handler: &str,
        data: Vec<PropertyValue>,
        f: F,
    ) -> Result<(), SignalError>
    where
        F: Fn(&mut C, &Invocation<'_>) -> Propagation + 'static,
    {
        if self.is_connected(&signal, handler) {
            tracing::warn!(
                target: targets::SIGNAL,
                signal = %signal,
                handler,
                "duplicate handler ignored"
            );
            return Err(SignalError::DuplicateHandler {
                signal: signal.to_string(),
                handler: handler.to_owned(),
            });
        }
        self.handlers.entry(signal).or_default().push(Connection {
            name: Rc::from(handler),
            func: Rc::new(f),
            data: Rc::from(data),
        });
        Ok(())
    }

    /// Remove a registration.
    pub fn disconnect(&mut self, signal: &SignalKind, handler: &str) -> Result<(), SignalError> {
        let list = self.handlers.get_mut(signal);
        let pos = list
            .as_ref()
            .and_then(|l| l.iter().position(|c| c.name() == handler));
        match (list, pos) {
            (Some(list), Some(pos)) => {
                list.remove(pos);
                if list.is_empty() {
                    self.handlers.remove(signal);
                }
                Ok(())
            }
            _ => Err(SignalError::NotFound {
                signal: signal.to_string(),
                handler: handler.to_owned(),
            }),
        }
    }

    /// Drop every registration.
    pub fn disconnect_all(&mut self) {
        self.handlers.clear();
    }

    pub fn is_connected(&self, signal: &SignalKind, handler: &str) -> bool {
        self.handlers
            .get(signal)
            .is_some_and(|l| l.iter().any(|c| c.name() == handler))
    }

    pub fn handler_count(&self, signal: &SignalKind) -> usize {
        self.handlers.get(signal).map_or(0, Vec::len)
    }

    /// Total registrations across all signals.
    pub fn total_handlers(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Suppress emission of `signal` until a matching [`unblock`](Self::unblock).
    /// Blocks nest.
    pub fn block(&mut self, signal: SignalKind) {
        *self.blocked.entry(signal).or_insert(0) += 1;
    }

    pub fn unblock(&mut self, signal: &SignalKind) {
        if let Some(depth) = self.blocked.get_mut(signal) {
            *depth -= 1;
            if *depth == 0 {
                self.blocked.remove(signal);
            }
        }
    }

    pub fn is_blocked(&self, signal: &SignalKind) -> bool {
        self.blocked.contains_key(signal)
    }

    /// Clone out the handler list for `signal`, in connection order. Empty
    /// while the signal is blocked.
    pub fn snapshot(&self, signal: &SignalKind) -> Vec<Connection<C>> {
        if self.is_blocked(signal) {
            tracing::trace!(target: targets::SIGNAL, signal = %signal, "emission blocked");
            return Vec::new();
        }
        self.handlers.get(signal).cloned().unwrap_or_default()
    }

    /// Emit on a bus that is not itself part of `ctx`.
    pub fn emit(&self, ctx: &mut C, inv: &Invocation<'_>) -> Propagation {
        let handlers = self.snapshot(inv.signal);
        run_handlers(&handlers, ctx, inv)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<&'static str>;

    fn recorder(name: &'static str, result: Propagation) -> impl Fn(&mut Log, &Invocation<'_>) -> Propagation {
        move |log: &mut Log, _: &Invocation<'_>| {
            log.push(name);
            result
        }
    }

    fn emit(bus: &SignalBus<Log>, log: &mut Log, kind: &SignalKind) -> Propagation {
        bus.emit(log, &Invocation::new(WidgetId::default(), kind, &[]))
    }

    // ── Ordering and veto ────────────────────────────────────────────

    #[test]
    fn handlers_run_in_connection_order() {
        let mut bus = SignalBus::new();
        bus.connect(SignalKind::Clicked, "a", recorder("a", Propagation::Pass)).unwrap();
        bus.connect(SignalKind::Clicked, "b", recorder("b", Propagation::Pass)).unwrap();
        bus.connect(SignalKind::Clicked, "c", recorder("c", Propagation::Pass)).unwrap();

        let mut log = Log::new();
        assert_eq!(emit(&bus, &mut log, &SignalKind::Clicked), Propagation::Pass);
        assert_eq!(log, vec!["a", "b", "c"]);
    }

    #[test]
    fn stop_halts_later_handlers() {
        let mut bus = SignalBus::new();
        bus.connect(SignalKind::Clicked, "h1", recorder("h1", Propagation::Pass)).unwrap();
        bus.connect(SignalKind::Clicked, "h2", recorder("h2", Propagation::Stop)).unwrap();
        bus.connect(SignalKind::Clicked, "h3", recorder("h3", Propagation::Pass)).unwrap();

        let mut log = Log::new();
        assert_eq!(emit(&bus, &mut log, &SignalKind::Clicked), Propagation::Stop);
        assert_eq!(log, vec!["h1", "h2"]);
    }

    #[test]
    fn no_handlers_is_pass() {
        let bus: SignalBus<Log> = SignalBus::new();
        let mut log = Log::new();
        assert_eq!(emit(&bus, &mut log, &SignalKind::Activate), Propagation::Pass);
    }

    // ── Connect / disconnect ─────────────────────────────────────────

    #[test]
    fn duplicate_handler_is_rejected_and_not_doubled() {
        let mut bus = SignalBus::new();
        bus.connect(SignalKind::Clicked, "once", recorder("once", Propagation::Pass)).unwrap();
        let err = bus
            .connect(SignalKind::Clicked, "once", recorder("twice", Propagation::Pass))
            .unwrap_err();
        assert!(matches!(err, SignalError::DuplicateHandler { .. }));

        let mut log = Log::new();
        emit(&bus, &mut log, &SignalKind::Clicked);
        assert_eq!(log, vec!["once"]);
    }

    #[test]
    fn same_name_on_different_signals_is_fine() {
        let mut bus: SignalBus<Log> = SignalBus::new();
        bus.connect(SignalKind::Enter, "hover", recorder("enter", Propagation::Pass)).unwrap();
        bus.connect(SignalKind::Leave, "hover", recorder("leave", Propagation::Pass)).unwrap();
        assert_eq!(bus.total_handlers(), 2);
    }

    #[test]
    fn disconnect_removes_and_reports_missing() {
        let mut bus = SignalBus::new();
        bus.connect(SignalKind::Clicked, "a", recorder("a", Propagation::Pass)).unwrap();
        bus.disconnect(&SignalKind::Clicked, "a").unwrap();
        assert_eq!(bus.handler_count(&SignalKind::Clicked), 0);
        assert_eq!(
            bus.disconnect(&SignalKind::Clicked, "a"),
            Err(SignalError::NotFound {
                signal: "clicked".into(),
                handler: "a".into()
            })
        );
    }

    // ── Bound data ───────────────────────────────────────────────────

    #[test]
    fn bound_data_reaches_handler() {
        let mut bus: SignalBus<Vec<i64>> = SignalBus::new();
        bus.connect_with_data(SignalKind::Clicked, "d", vec![PropertyValue::Int(42)], |seen, inv| {
            seen.extend(inv.data.iter().filter_map(PropertyValue::as_int));
            seen.extend(inv.args.iter().filter_map(PropertyValue::as_int));
            Propagation::Pass
        })
        .unwrap();

        let mut seen = Vec::new();
        let args = [PropertyValue::Int(7)];
        bus.emit(&mut seen, &Invocation::new(WidgetId::default(), &SignalKind::Clicked, &args));
        assert_eq!(seen, vec![42, 7]);
    }

    // ── Blocking ─────────────────────────────────────────────────────

    #[test]
    fn blocked_signal_skips_handlers() {
        let mut bus = SignalBus::new();
        bus.connect(SignalKind::Clicked, "a", recorder("a", Propagation::Stop)).unwrap();
        bus.block(SignalKind::Clicked);
        bus.block(SignalKind::Clicked);
        bus.unblock(&SignalKind::Clicked);

        let mut log = Log::new();
        assert_eq!(emit(&bus, &mut log, &SignalKind::Clicked), Propagation::Pass);
        assert!(log.is_empty());

        bus.unblock(&SignalKind::Clicked);
        assert_eq!(emit(&bus, &mut log, &SignalKind::Clicked), Propagation::Stop);
    }

    // ── Names ────────────────────────────────────────────────────────

    #[test]
    fn signal_names_round_trip() {
        for kind in BUILTIN_SIGNALS {
            assert_eq!(&kind.as_str().parse::<SignalKind>().unwrap(), kind);
        }
        assert_eq!("grab_focus".parse::<SignalKind>().unwrap(), SignalKind::GrabFocus);
        assert_eq!(
            "row-selected".parse::<SignalKind>().unwrap(),
            SignalKind::Custom("row-selected".into())
        );
    }
}
