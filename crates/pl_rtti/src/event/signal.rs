use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::event::slot::SlotInner;
use crate::event::{EventArgs, Slot};

// -----------------------------------------------------------------------------
// ConnectionId

/// Identifies one connection between a signal and a slot.
///
/// Ids are unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// -----------------------------------------------------------------------------
// Connection

pub(crate) struct Connection<A: EventArgs> {
    pub(crate) id: ConnectionId,
    slot: Weak<SlotInner<A>>,
    active: AtomicBool,
}

impl<A: EventArgs> Connection<A> {
    #[inline]
    fn targets(&self, slot: &Arc<SlotInner<A>>) -> bool {
        core::ptr::eq(self.slot.as_ptr(), Arc::as_ptr(slot))
    }

    #[inline]
    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

pub(crate) struct SignalInner<A: EventArgs> {
    connections: Mutex<Vec<Arc<Connection<A>>>>,
}

impl<A: EventArgs> SignalInner<A> {
    /// Removes one connection without touching the slot side.
    pub(crate) fn detach(&self, id: ConnectionId) {
        let mut connections = self
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        connections.retain(|conn| {
            if conn.id == id {
                conn.deactivate();
                false
            } else {
                true
            }
        });
    }
}

// -----------------------------------------------------------------------------
// Signal

/// An ordered list of slots that are invoked when the signal is emitted.
///
/// - Emission is synchronous, on the calling thread, in connection order.
/// - Connecting the same slot twice delivers every emission twice.
/// - Connections only hold weak references to slots. Dropping a [`Slot`]
///   disconnects it from every signal.
/// - Callbacks may connect and disconnect freely while the signal is
///   being emitted. A connection removed during emission is skipped.
///
/// Cloning a signal yields another handle to the same connection list.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicI32, Ordering};
///
/// use pl_rtti::event::{Signal, Slot};
///
/// let sum = Arc::new(AtomicI32::new(0));
/// let sink = sum.clone();
///
/// let signal = Signal::<(i32,)>::new();
/// let slot = Slot::new(move |(v,): &(i32,)| {
///     sink.fetch_add(*v, Ordering::Relaxed);
/// });
///
/// signal.connect(&slot);
/// signal.emit((5,));
/// assert_eq!(sum.load(Ordering::Relaxed), 5);
///
/// drop(slot);
/// signal.emit((5,));
/// assert_eq!(sum.load(Ordering::Relaxed), 5);
/// assert_eq!(signal.connection_count(), 0);
/// ```
pub struct Signal<A: EventArgs = ()> {
    inner: Arc<SignalInner<A>>,
}

impl<A: EventArgs> Signal<A> {
    /// Creates a signal without connections.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                connections: Mutex::new(Vec::new()),
            }),
        }
    }

    #[inline]
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<Connection<A>>>> {
        self.inner
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Connects a slot and returns the id of the new connection.
    pub fn connect(&self, slot: &Slot<A>) -> ConnectionId {
        let id = ConnectionId::next();
        let conn = Arc::new(Connection {
            id,
            slot: Arc::downgrade(slot.inner()),
            active: AtomicBool::new(true),
        });
        self.lock().push(conn);
        slot.inner().attach(id, Arc::downgrade(&self.inner));
        id
    }

    /// Removes every connection to `slot`.
    ///
    /// Returns `false` if the slot was not connected, which is not an error.
    pub fn disconnect(&self, slot: &Slot<A>) -> bool {
        let target = slot.inner();
        let mut removed = Vec::new();
        self.lock().retain(|conn| {
            if conn.targets(target) {
                conn.deactivate();
                removed.push(conn.id);
                false
            } else {
                true
            }
        });
        target.forget(&removed);
        !removed.is_empty()
    }

    /// Removes one connection by id.
    pub fn disconnect_id(&self, id: ConnectionId) -> bool {
        let mut found = None;
        self.lock().retain(|conn| {
            if conn.id == id {
                conn.deactivate();
                found = Some(conn.slot.clone());
                false
            } else {
                true
            }
        });
        match found {
            Some(slot) => {
                if let Some(slot) = slot.upgrade() {
                    slot.forget(&[id]);
                }
                true
            }
            None => false,
        }
    }

    /// Removes every connection.
    pub fn disconnect_all(&self) {
        let connections = core::mem::take(&mut *self.lock());
        for conn in connections {
            conn.deactivate();
            if let Some(slot) = conn.slot.upgrade() {
                slot.forget(&[conn.id]);
            }
        }
    }

    /// Returns the number of connections.
    pub fn connection_count(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if `slot` has at least one connection to this signal.
    pub fn is_connected(&self, slot: &Slot<A>) -> bool {
        let target = slot.inner();
        self.lock().iter().any(|conn| conn.targets(target))
    }

    /// Invokes every connected slot with `args`.
    pub fn emit(&self, args: A) {
        let snapshot: Vec<Arc<Connection<A>>> = self.lock().clone();
        for conn in snapshot {
            if !conn.active.load(Ordering::Acquire) {
                continue;
            }
            if let Some(slot) = conn.slot.upgrade() {
                slot.invoke(&args);
            }
        }
    }

    /// Returns a second handle sharing this signal's connections.
    #[inline]
    pub(crate) fn share(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: EventArgs> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: EventArgs> Clone for Signal<A> {
    fn clone(&self) -> Self {
        self.share()
    }
}

impl<A: EventArgs> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::event::{Signal, Slot};

    fn counter() -> (Arc<AtomicUsize>, Slot<(i32,)>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = hits.clone();
        let slot = Slot::new(move |_: &(i32,)| {
            sink.fetch_add(1, Ordering::Relaxed);
        });
        (hits, slot)
    }

    #[test]
    fn n_connections_n_invocations() {
        let signal = Signal::<(i32,)>::new();
        let (hits, slot) = counter();

        signal.connect(&slot);
        signal.connect(&slot);
        signal.connect(&slot);
        signal.emit((1,));
        assert_eq!(hits.load(Ordering::Relaxed), 3);

        assert!(signal.disconnect(&slot));
        signal.emit((1,));
        assert_eq!(hits.load(Ordering::Relaxed), 3);
        assert!(!signal.disconnect(&slot));
    }

    #[test]
    fn emission_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let signal = Signal::<(i32,)>::new();

        let first_log = log.clone();
        let first = Slot::new(move |(v,): &(i32,)| first_log.lock().unwrap().push(("first", *v)));
        let second_log = log.clone();
        let second = Slot::new(move |(v,): &(i32,)| second_log.lock().unwrap().push(("second", *v)));

        signal.connect(&first);
        signal.connect(&second);
        signal.emit((9,));

        assert_eq!(*log.lock().unwrap(), [("first", 9), ("second", 9)]);
    }

    #[test]
    fn dropped_slot_is_never_invoked() {
        let signal = Signal::<(i32,)>::new();
        let (hits, slot) = counter();
        signal.connect(&slot);
        assert_eq!(signal.connection_count(), 1);

        drop(slot);
        assert_eq!(signal.connection_count(), 0);
        signal.emit((1,));
        assert_eq!(hits.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn dropped_signal_releases_slot() {
        let (_, slot) = counter();
        {
            let signal = Signal::<(i32,)>::new();
            signal.connect(&slot);
            assert_eq!(slot.connection_count(), 1);
        }
        assert_eq!(slot.connection_count(), 0);
    }

    #[test]
    fn disconnect_by_id() {
        let signal = Signal::<(i32,)>::new();
        let (hits, slot) = counter();
        let a = signal.connect(&slot);
        let _b = signal.connect(&slot);

        assert!(signal.disconnect_id(a));
        assert!(!signal.disconnect_id(a));
        signal.emit((0,));
        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert!(signal.is_connected(&slot));

        signal.disconnect_all();
        assert!(!signal.is_connected(&slot));
        assert_eq!(slot.connection_count(), 0);
    }

    #[test]
    fn disconnect_during_emission_skips() {
        let signal = Signal::<()>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let victim_hits = hits.clone();
        let victim = Arc::new(Slot::new(move |_: &()| {
            victim_hits.fetch_add(1, Ordering::Relaxed);
        }));

        let handle = signal.clone();
        let target = victim.clone();
        let killer = Slot::new(move |_: &()| {
            handle.disconnect(&target);
        });

        signal.connect(&killer);
        signal.connect(&victim);
        signal.emit(());
        assert_eq!(hits.load(Ordering::Relaxed), 0);
        assert_eq!(signal.connection_count(), 1);
    }

    #[test]
    fn connect_during_emission() {
        let signal = Signal::<()>::new();
        let (hits, late) = {
            let hits = Arc::new(AtomicUsize::new(0));
            let sink = hits.clone();
            (hits, Arc::new(Slot::new(move |_: &()| {
                sink.fetch_add(1, Ordering::Relaxed);
            })))
        };

        let handle = signal.clone();
        let target = late.clone();
        let connector = Slot::new(move |_: &()| {
            handle.connect(&target);
        });
        signal.connect(&connector);

        // The snapshot taken for this emission does not include the new slot.
        signal.emit(());
        assert_eq!(hits.load(Ordering::Relaxed), 0);
        signal.emit(());
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }
}
