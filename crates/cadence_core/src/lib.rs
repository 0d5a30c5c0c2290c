//! Cadence Core Runtime
//!
//! Foundational primitives shared by the Cadence crates:
//!
//! - **Events**: a single-cycle [`Event`] object with cancel/stop/remove flags
//! - **Dispatch**: an owned [`EventDispatcher`] plus the [`Dispatchable`]
//!   capability trait, with capture and bubble phases along a parent chain
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{listener, Dispatchable, EventDispatcher};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let dispatcher = EventDispatcher::new();
//! let hits = Rc::new(Cell::new(0));
//! let h = hits.clone();
//! dispatcher.add_listener("change", listener(move |_| h.set(h.get() + 1)), false);
//!
//! dispatcher.dispatch("change");
//! assert_eq!(hits.get(), 1);
//! ```

pub mod dispatcher;
pub mod events;

pub use dispatcher::{listener, Dispatchable, DispatcherId, EventDispatcher, Listener};
pub use events::{event_types, Event, EventData, EventPhase, TickData};
