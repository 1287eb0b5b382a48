//! Signals and slots.
//!
//! A [`Signal`] keeps an ordered list of connections to [`Slot`]s. Both
//! are usually fields of a reflected object and are registered on its
//! class, which makes them reachable by name through
//! [`DynEvent`](crate::object::DynEvent) and
//! [`DynEventHandler`](crate::object::DynEventHandler).

mod args;
mod dynamic;
mod signal;
mod slot;

pub use args::EventArgs;
pub use dynamic::{DynSignal, DynSlot, EventError};
pub use signal::{ConnectionId, Signal};
pub use slot::Slot;
