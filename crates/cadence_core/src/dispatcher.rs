//! Listener registries and capture/bubble dispatch
//!
//! [`EventDispatcher`] is the owned registry. [`Dispatchable`] is the
//! capability trait: anything that owns a dispatcher (and optionally knows
//! its parent) gets the full add/remove/dispatch surface by delegation.
//!
//! Listener panics are not caught. A panicking listener unwinds through
//! `dispatch` and aborts the rest of the cycle.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::events::{Event, EventPhase};

/// A registered listener. Identity is the `Rc` allocation, so keep the
/// returned handle around to remove it later.
pub type Listener = Rc<dyn Fn(&mut Event)>;

/// Wrap a closure as a [`Listener`]
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&mut Event) + 'static,
{
    Rc::new(f)
}

static NEXT_DISPATCHER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies the dispatcher an event was dispatched from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DispatcherId(u64);

impl DispatcherId {
    fn next() -> Self {
        Self(NEXT_DISPATCHER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

type ListenerList = SmallVec<[Listener; 2]>;

#[derive(Default)]
struct ListenerTable {
    bubble: FxHashMap<String, ListenerList>,
    capture: FxHashMap<String, ListenerList>,
}

impl ListenerTable {
    fn phase(&self, use_capture: bool) -> &FxHashMap<String, ListenerList> {
        if use_capture {
            &self.capture
        } else {
            &self.bubble
        }
    }

    fn phase_mut(&mut self, use_capture: bool) -> &mut FxHashMap<String, ListenerList> {
        if use_capture {
            &mut self.capture
        } else {
            &mut self.bubble
        }
    }
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Per-object listener registry, split into capture and bubble/target tables
pub struct EventDispatcher {
    id: DispatcherId,
    table: RefCell<ListenerTable>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            id: DispatcherId::next(),
            table: RefCell::new(ListenerTable::default()),
        }
    }

    pub fn id(&self) -> DispatcherId {
        self.id
    }

    /// Register a listener. Registering the same listener twice for the same
    /// phase moves it to the end instead of duplicating it.
    pub fn add_listener(&self, event_type: &str, listener: Listener, use_capture: bool) -> Listener {
        self.remove_listener(event_type, &listener, use_capture);
        self.table
            .borrow_mut()
            .phase_mut(use_capture)
            .entry(event_type.to_string())
            .or_default()
            .push(listener.clone());
        listener
    }

    pub fn remove_listener(&self, event_type: &str, listener: &Listener, use_capture: bool) {
        let mut table = self.table.borrow_mut();
        let listeners = table.phase_mut(use_capture);
        let Some(list) = listeners.get_mut(event_type) else {
            return;
        };
        if let Some(index) = list.iter().position(|l| same_listener(l, listener)) {
            list.remove(index);
        }
        if list.is_empty() {
            listeners.remove(event_type);
        }
    }

    /// Remove every listener for `event_type`, or every listener at all
    pub fn remove_all_listeners(&self, event_type: Option<&str>) {
        let mut table = self.table.borrow_mut();
        match event_type {
            Some(event_type) => {
                table.bubble.remove(event_type);
                table.capture.remove(event_type);
            }
            None => {
                table.bubble.clear();
                table.capture.clear();
            }
        }
    }

    /// Whether any capture or bubble listener is registered for `event_type`
    pub fn has_listener(&self, event_type: &str) -> bool {
        let table = self.table.borrow();
        table.bubble.contains_key(event_type) || table.capture.contains_key(event_type)
    }

    /// Whether this exact listener handle is registered for `event_type`
    pub fn contains_listener(&self, event_type: &str, listener: &Listener, use_capture: bool) -> bool {
        self.table
            .borrow()
            .phase(use_capture)
            .get(event_type)
            .is_some_and(|list| list.iter().any(|l| same_listener(l, listener)))
    }

    /// Number of listeners registered for `event_type` in one phase table
    pub fn listener_count(&self, event_type: &str, use_capture: bool) -> usize {
        self.table
            .borrow()
            .phase(use_capture)
            .get(event_type)
            .map_or(0, |list| list.len())
    }

    /// Run this node's listeners for one propagation phase.
    ///
    /// At-target runs capture listeners first, then bubble listeners.
    pub fn dispatch_phase(&self, event: &mut Event, phase: EventPhase) {
        match phase {
            EventPhase::Capture => self.run_listeners(event, phase, true),
            EventPhase::AtTarget => {
                self.run_listeners(event, phase, true);
                self.run_listeners(event, phase, false);
            }
            EventPhase::Bubble => self.run_listeners(event, phase, false),
            EventPhase::None => {}
        }
    }

    fn run_listeners(&self, event: &mut Event, phase: EventPhase, use_capture: bool) {
        // Snapshot so listeners added or removed mid-dispatch only take effect next time.
        let snapshot: ListenerList = match self.table.borrow().phase(use_capture).get(&event.event_type) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => return,
        };

        event.current_target = Some(self.id);
        event.phase = phase;
        event.removed = false;

        for listener in snapshot {
            if event.immediate_propagation_stopped {
                break;
            }
            listener(event);
            if event.removed {
                tracing::trace!("listener for {:?} removed itself", event.event_type);
                let event_type = event.event_type.clone();
                self.remove_listener(&event_type, &listener, use_capture);
                event.removed = false;
            }
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Event capability by composition: own an [`EventDispatcher`], optionally
/// expose a parent, and inherit the whole listener/dispatch surface.
pub trait Dispatchable {
    fn dispatcher(&self) -> &EventDispatcher;

    /// The next node up the bubbling chain
    fn parent(&self) -> Option<Rc<dyn Dispatchable>> {
        None
    }

    fn add_listener(&self, event_type: &str, listener: Listener, use_capture: bool) -> Listener {
        self.dispatcher().add_listener(event_type, listener, use_capture)
    }

    /// Register a wrapper around `listener`. With `once`, the wrapper removes
    /// itself after its first invocation. The wrapper is the removable handle.
    fn on(&self, event_type: &str, listener: Listener, once: bool) -> Listener {
        let wrapper: Listener = Rc::new(move |event: &mut Event| {
            listener(event);
            if once {
                event.remove();
            }
        });
        self.add_listener(event_type, wrapper, false)
    }

    /// Like [`Dispatchable::on`], handing `data` to the listener on every call
    fn on_with_data<D, F>(&self, event_type: &str, data: D, listener: F, once: bool) -> Listener
    where
        Self: Sized,
        D: 'static,
        F: Fn(&mut Event, &D) + 'static,
    {
        let wrapper: Listener = Rc::new(move |event: &mut Event| {
            listener(event, &data);
            if once {
                event.remove();
            }
        });
        self.add_listener(event_type, wrapper, false)
    }

    fn remove_listener(&self, event_type: &str, listener: &Listener, use_capture: bool) {
        self.dispatcher().remove_listener(event_type, listener, use_capture);
    }

    /// Alias for [`Dispatchable::remove_listener`] on the bubble table
    fn off(&self, event_type: &str, listener: &Listener) {
        self.remove_listener(event_type, listener, false);
    }

    fn remove_all_listeners(&self, event_type: Option<&str>) {
        self.dispatcher().remove_all_listeners(event_type);
    }

    fn has_listener(&self, event_type: &str) -> bool {
        self.dispatcher().has_listener(event_type)
    }

    /// Whether dispatching `event_type` here could reach any listener on
    /// this node or an ancestor
    fn will_trigger(&self, event_type: &str) -> bool {
        if self.has_listener(event_type) {
            return true;
        }
        let mut node = self.parent();
        while let Some(current) = node {
            if current.has_listener(event_type) {
                return true;
            }
            node = current.parent();
        }
        false
    }

    /// Dispatch a plain non-bubbling event by type name.
    ///
    /// Returns immediately, without building an event, if nobody listens.
    fn dispatch(&self, event_type: &str) -> bool {
        self.dispatch_with(event_type, false, false)
    }

    fn dispatch_with(&self, event_type: &str, bubbles: bool, cancelable: bool) -> bool {
        if !bubbles && !self.has_listener(event_type) {
            return true;
        }
        self.dispatch_event(
            Event::new(event_type)
                .with_bubbles(bubbles)
                .with_cancelable(cancelable),
        )
    }

    /// Dispatch a prepared event. Returns `false` iff a cancelable event had
    /// its default prevented.
    fn dispatch_event(&self, event: Event) -> bool {
        // An event that already went through a cycle is re-issued fresh.
        let mut event = if event.target.is_some() {
            event.reissue()
        } else {
            event
        };
        event.target = Some(self.dispatcher().id());

        let first_parent = if event.bubbles { self.parent() } else { None };
        let Some(first_parent) = first_parent else {
            self.dispatcher().dispatch_phase(&mut event, EventPhase::AtTarget);
            return !event.default_prevented;
        };

        let mut ancestors = vec![first_parent];
        while let Some(next) = ancestors.last().and_then(|node| node.parent()) {
            ancestors.push(next);
        }

        for node in ancestors.iter().rev() {
            if event.propagation_stopped {
                break;
            }
            node.dispatcher().dispatch_phase(&mut event, EventPhase::Capture);
        }
        if !event.propagation_stopped {
            self.dispatcher().dispatch_phase(&mut event, EventPhase::AtTarget);
        }
        for node in &ancestors {
            if event.propagation_stopped {
                break;
            }
            node.dispatcher().dispatch_phase(&mut event, EventPhase::Bubble);
        }

        !event.default_prevented
    }
}

impl Dispatchable for EventDispatcher {
    fn dispatcher(&self) -> &EventDispatcher {
        self
    }
}
