use alloc::boxed::Box;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::fmt;
use std::sync::{Mutex, PoisonError};

use crate::class::ClassType;
use crate::event::EventArgs;
use crate::event::signal::{ConnectionId, SignalInner};
use crate::object::{ObjectError, ObjectRef, resolve_mut};

type Callback<A> = Box<dyn Fn(&A) + Send + Sync>;

pub(crate) struct SlotInner<A: EventArgs> {
    callback: Callback<A>,
    signals: Mutex<Vec<(ConnectionId, Weak<SignalInner<A>>)>>,
}

impl<A: EventArgs> SlotInner<A> {
    #[inline]
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ConnectionId, Weak<SignalInner<A>>)>> {
        self.signals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub(crate) fn invoke(&self, args: &A) {
        (self.callback)(args);
    }

    pub(crate) fn attach(&self, id: ConnectionId, signal: Weak<SignalInner<A>>) {
        self.lock().push((id, signal));
    }

    pub(crate) fn forget(&self, ids: &[ConnectionId]) {
        if ids.is_empty() {
            return;
        }
        self.lock().retain(|(id, _)| !ids.contains(id));
    }
}

impl<A: EventArgs> Drop for SlotInner<A> {
    fn drop(&mut self) {
        let signals = core::mem::take(self.signals.get_mut().unwrap_or_else(PoisonError::into_inner));
        for (id, signal) in signals {
            if let Some(signal) = signal.upgrade() {
                signal.detach(id);
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Slot

/// A callback that can be connected to any number of [`Signal`]s.
///
/// A slot is owned by its receiver. Signals only keep weak references,
/// so dropping the slot disconnects it everywhere and it is never
/// invoked again.
///
/// [`Signal`]: crate::event::Signal
pub struct Slot<A: EventArgs = ()> {
    inner: Arc<SlotInner<A>>,
}

impl<A: EventArgs> Slot<A> {
    /// Creates a slot from a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(SlotInner {
                callback: Box::new(callback),
                signals: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Creates a slot that invokes `method` on a receiver object.
    ///
    /// The slot holds a weak object handle. Once the receiver is destroyed
    /// the slot does nothing. If the receiver is locked when the slot fires,
    /// for example because it emitted the signal itself, the invocation is
    /// deferred until that access ends.
    pub fn for_object<C: ClassType>(receiver: &ObjectRef, method: fn(&mut C, &A)) -> Self {
        let weak = receiver.downgrade();
        Self::new(move |args: &A| {
            let Some(receiver) = weak.upgrade() else {
                return;
            };
            let result = receiver.try_with_mut(|object| {
                if let Some(target) = resolve_mut::<C>(object) {
                    method(target, args);
                }
            });
            if let Err(ObjectError::Busy(id)) = result {
                log::trace!("Slot on `{}` deferred for object {id}", C::static_class().name());
                let params = args.to_params();
                receiver.defer_mut(move |object| {
                    if let (Some(args), Some(target)) =
                        (A::from_params(&params), resolve_mut::<C>(object))
                    {
                        method(target, &args);
                    }
                });
            }
        })
    }

    #[inline]
    pub(crate) fn inner(&self) -> &Arc<SlotInner<A>> {
        &self.inner
    }

    /// Invokes the callback directly.
    #[inline]
    pub fn invoke(&self, args: &A) {
        self.inner.invoke(args);
    }

    /// Returns the number of live signals this slot is connected to,
    /// counting repeated connections.
    pub fn connection_count(&self) -> usize {
        self.inner
            .lock()
            .iter()
            .filter(|(_, signal)| signal.strong_count() > 0)
            .count()
    }

    /// Disconnects this slot from every signal.
    pub fn disconnect_all(&self) {
        let signals = core::mem::take(&mut *self.inner.lock());
        for (id, signal) in signals {
            if let Some(signal) = signal.upgrade() {
                signal.detach(id);
            }
        }
    }
}

impl<A: EventArgs> Default for Slot<A> {
    /// A slot that does nothing when invoked.
    fn default() -> Self {
        Self::new(|_: &A| {})
    }
}

impl<A: EventArgs> fmt::Debug for Slot<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("connections", &self.connection_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};

    use crate::event::{Signal, Slot};

    #[test]
    fn slot_disconnects_everywhere() {
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = hits.clone();
        let slot = Slot::new(move |_: &()| {
            sink.fetch_add(1, Ordering::Relaxed);
        });

        let a = Signal::<()>::new();
        let b = Signal::<()>::new();
        a.connect(&slot);
        b.connect(&slot);
        assert_eq!(slot.connection_count(), 2);

        slot.disconnect_all();
        a.emit(());
        b.emit(());
        assert_eq!(hits.load(Ordering::Relaxed), 0);
        assert_eq!(a.connection_count(), 0);
        assert_eq!(b.connection_count(), 0);
    }

    #[test]
    fn direct_invoke() {
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = hits.clone();
        let slot = Slot::new(move |(n,): &(u64,)| {
            sink.fetch_add(*n as usize, Ordering::Relaxed);
        });
        slot.invoke(&(4,));
        assert_eq!(hits.load(Ordering::Relaxed), 4);
    }
}
