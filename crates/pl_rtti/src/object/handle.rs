use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock, TryLockError};

use crate::class::{ClassRef, ClassType};
use crate::event::{ConnectionId, DynSignal, DynSlot, Signal};
use crate::object::{Object, ObjectError, resolve, resolve_mut};
use crate::types::{RttiType, TypeInfo, TypeKind, Value};

// -----------------------------------------------------------------------------
// ObjectId

/// Process-unique id of an object instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// -----------------------------------------------------------------------------
// ObjectCell

const LIVE: u8 = 0;
const FOREIGN: u8 = 1;
const DESTROYED: u8 = 2;

/// A call queued while the instance was locked.
type DeferredCall = Box<dyn FnOnce(&mut dyn Object) + Send>;

struct ObjectCell {
    id: ObjectId,
    refs: AtomicU32,
    state: AtomicU8,
    class: ClassRef,
    object: RwLock<Option<Box<dyn Object>>>,
    deferred: Mutex<Vec<DeferredCall>>,
    destroyed: Signal<()>,
}

impl ObjectCell {
    #[inline]
    fn is_destroyed(&self) -> bool {
        self.state.load(Ordering::Acquire) == DESTROYED
    }

    /// Drops the instance if it has been marked destroyed and is still stored.
    fn finalize(&self) {
        let taken = match self.object.try_write() {
            Ok(mut guard) => guard.take(),
            Err(TryLockError::Poisoned(err)) => err.into_inner().take(),
            // Another access is running, it finalizes when it finishes.
            Err(TryLockError::WouldBlock) => return,
        };
        if let Some(object) = taken {
            drop(object);
            log::debug!("Destroyed object {} of `{}`", self.id, self.class.full_name());
            self.destroyed.emit(());
            self.destroyed.disconnect_all();
        }
    }

    fn take_deferred(&self) -> Vec<DeferredCall> {
        core::mem::take(&mut *self.deferred.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Runs the queued calls. If the instance is still locked they stay
    /// queued for the end of the next access.
    fn run_deferred(&self) {
        loop {
            let calls = self.take_deferred();
            if calls.is_empty() {
                return;
            }
            let mut guard = match self.object.try_write() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(err)) => err.into_inner(),
                Err(TryLockError::WouldBlock) => {
                    let mut queue = self.deferred.lock().unwrap_or_else(PoisonError::into_inner);
                    let newer = core::mem::replace(&mut *queue, calls);
                    queue.extend(newer);
                    return;
                }
            };
            let Some(object) = guard.as_deref_mut() else {
                return;
            };
            if self.is_destroyed() {
                return;
            }
            for call in calls {
                call(object);
            }
        }
    }
}

// -----------------------------------------------------------------------------
// ObjectRef

/// A reference-counted handle to a reflected object.
///
/// The handle carries an explicit reference count that starts at 1:
///
/// - [`add_reference`](Self::add_reference) increments it.
/// - [`release`](Self::release) decrements it and destroys the instance at 0.
/// - [`soft_release`](Self::soft_release) decrements it but never destroys.
///   At 0 the instance stays alive, owned by whoever holds it now.
/// - [`destroy`](Self::destroy) destroys immediately.
///
/// Cloning the handle copies the pointer and leaves the count alone, so
/// clones are observers. Every access after destruction fails with
/// [`ObjectError::Destroyed`] instead of touching freed memory.
///
/// The instance sits behind a reader-writer lock. [`with`](Self::with) and
/// [`with_mut`](Self::with_mut) run a closure on it.
///
/// # Examples
///
/// ```
/// use pl_rtti::object::{ObjectError, ObjectRef};
/// # use pl_rtti::class::{Class, ClassBuilder, ClassCell, ClassRef, ClassType};
/// # use pl_rtti::object::Object;
/// # #[derive(Default)]
/// # struct Node;
/// # impl Object for Node {
/// #     fn class(&self) -> ClassRef { Self::static_class() }
/// # }
/// # impl ClassType for Node {
/// #     fn build_class() -> Class { ClassBuilder::<Self>::new("Node").build() }
/// #     fn static_class() -> ClassRef {
/// #         static CELL: ClassCell = ClassCell::new();
/// #         CELL.get_or_build::<Self>()
/// #     }
/// # }
///
/// let node = ObjectRef::new(Node);
/// assert_eq!(node.add_reference(), 2);
/// assert_eq!(node.release(), 1);
/// assert_eq!(node.release(), 0);
///
/// assert!(node.is_destroyed());
/// assert_eq!(node.with(|_| ()), Err(ObjectError::Destroyed(node.id())));
/// ```
#[derive(Clone)]
pub struct ObjectRef {
    cell: Arc<ObjectCell>,
}

impl ObjectRef {
    /// Moves `object` into a new handle with a reference count of 1.
    pub fn new<C: Object>(object: C) -> Self {
        Self::from_box(Box::new(object))
    }

    /// Moves a boxed object into a new handle with a reference count of 1.
    ///
    /// Calls [`Object::on_attach`] before the handle is returned.
    pub fn from_box(mut object: Box<dyn Object>) -> Self {
        let this = Self {
            cell: Arc::new(ObjectCell {
                id: ObjectId::next(),
                refs: AtomicU32::new(1),
                state: AtomicU8::new(LIVE),
                class: object.class(),
                object: RwLock::new(None),
                deferred: Mutex::new(Vec::new()),
                destroyed: Signal::new(),
            }),
        };
        object.on_attach(&this);
        *this.cell.object.write().unwrap_or_else(PoisonError::into_inner) = Some(object);
        this
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.cell.id
    }

    /// Returns `true` if both handles point to the same instance.
    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Returns a handle that does not keep the instance's storage alive.
    #[inline]
    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef {
            cell: Arc::downgrade(&self.cell),
        }
    }

    /// Returns the class the object was created with.
    ///
    /// Fails if the object has been destroyed or its class has been removed
    /// from every registry.
    pub fn class(&self) -> Result<ClassRef, ObjectError> {
        if self.cell.is_destroyed() {
            return Err(ObjectError::Destroyed(self.cell.id));
        }
        if self.cell.class.is_unloaded() {
            return Err(ObjectError::ClassUnregistered(String::from(
                self.cell.class.full_name(),
            )));
        }
        Ok(Arc::clone(&self.cell.class))
    }

    /// Returns `true` if the instance's class is `name` or derives from it.
    pub fn is_instance_of(&self, name: &str) -> bool {
        self.class().is_ok_and(|class| class.is_derived_from(name))
    }

    // ----- Reference counting

    /// Returns the current reference count.
    #[inline]
    pub fn reference_count(&self) -> u32 {
        self.cell.refs.load(Ordering::Acquire)
    }

    /// Increments the reference count and returns the new value.
    ///
    /// Returns 0 without effect after destruction.
    pub fn add_reference(&self) -> u32 {
        if self.cell.is_destroyed() {
            log::warn!("add_reference on destroyed object {}", self.cell.id);
            return 0;
        }
        self.cell.refs.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn decrement(&self) -> Option<u32> {
        self.cell
            .refs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .ok()
            .map(|prev| prev - 1)
    }

    /// Decrements the reference count and destroys the instance at 0.
    ///
    /// Returns the new count. A foreign instance is never destroyed here.
    /// After destruction this is a logged no-op returning 0.
    pub fn release(&self) -> u32 {
        if self.cell.is_destroyed() {
            log::warn!("release on destroyed object {}", self.cell.id);
            return 0;
        }
        match self.decrement() {
            Some(0) if self.is_foreign() => 0,
            Some(0) => {
                self.destroy();
                0
            }
            Some(count) => count,
            None => 0,
        }
    }

    /// Decrements the reference count without ever destroying the instance.
    ///
    /// At 0 the instance becomes foreign: it stays alive and
    /// [`release`](Self::release) can no longer destroy it, even after
    /// further [`add_reference`](Self::add_reference) calls. Only
    /// [`ForeignObject::reclaim`] makes it reference counted again.
    pub fn soft_release(&self) -> u32 {
        if self.cell.is_destroyed() {
            log::warn!("soft_release on destroyed object {}", self.cell.id);
            return 0;
        }
        match self.decrement() {
            Some(0) | None => {
                let _ = self.cell.state.compare_exchange(
                    LIVE,
                    FOREIGN,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                0
            }
            Some(count) => count,
        }
    }

    /// Soft-releases this reference and hands the instance to a foreign owner.
    ///
    /// Dropping the returned token destroys the instance unless it has been
    /// reclaimed.
    pub fn into_foreign(self) -> ForeignObject {
        self.soft_release();
        ForeignObject { object: Some(self) }
    }

    /// Returns `true` if the reference count dropped to 0 through a soft release.
    #[inline]
    pub fn is_foreign(&self) -> bool {
        self.cell.state.load(Ordering::Acquire) == FOREIGN
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.cell.is_destroyed()
    }

    /// Destroys the instance now, regardless of the reference count.
    ///
    /// Returns `false` if it was already destroyed. If the instance is being
    /// accessed, it is dropped as soon as that access ends.
    pub fn destroy(&self) -> bool {
        let prev = self.cell.state.swap(DESTROYED, Ordering::AcqRel);
        if prev == DESTROYED {
            return false;
        }
        self.cell.refs.store(0, Ordering::Release);
        self.cell.finalize();
        true
    }

    /// Returns the signal emitted once when the instance is destroyed.
    #[inline]
    pub fn on_destroyed(&self) -> &Signal<()> {
        &self.cell.destroyed
    }

    // ----- Access

    fn end_access(&self) {
        if !self.cell.is_destroyed() {
            self.cell.run_deferred();
        }
        if self.cell.is_destroyed() {
            self.cell.finalize();
        }
    }

    /// Queues `f` to run under an exclusive lock as soon as no other access
    /// holds the instance. Runs it now if the instance is free.
    ///
    /// Dropped without running if the instance is destroyed first.
    pub fn defer_mut(&self, f: impl FnOnce(&mut dyn Object) + Send + 'static) {
        if self.cell.is_destroyed() {
            return;
        }
        self.cell
            .deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(f));
        self.end_access();
    }

    /// Runs `f` on the instance under a shared lock.
    ///
    /// Calls deferred with [`defer_mut`](Self::defer_mut) during the access
    /// run once it ends.
    pub fn with<R>(&self, f: impl FnOnce(&dyn Object) -> R) -> Result<R, ObjectError> {
        if self.cell.is_destroyed() {
            return Err(ObjectError::Destroyed(self.cell.id));
        }
        let result = {
            let guard = self.cell.object.read().unwrap_or_else(PoisonError::into_inner);
            match guard.as_deref() {
                Some(object) => Ok(f(object)),
                None => Err(ObjectError::Destroyed(self.cell.id)),
            }
        };
        self.end_access();
        result
    }

    /// Runs `f` on the instance under an exclusive lock.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut dyn Object) -> R) -> Result<R, ObjectError> {
        if self.cell.is_destroyed() {
            return Err(ObjectError::Destroyed(self.cell.id));
        }
        let result = {
            let mut guard = self.cell.object.write().unwrap_or_else(PoisonError::into_inner);
            match guard.as_deref_mut() {
                Some(object) => Ok(f(object)),
                None => Err(ObjectError::Destroyed(self.cell.id)),
            }
        };
        self.end_access();
        result
    }

    /// Like [`with_mut`](Self::with_mut), but fails with
    /// [`ObjectError::Busy`] instead of waiting for the lock.
    pub fn try_with_mut<R>(&self, f: impl FnOnce(&mut dyn Object) -> R) -> Result<R, ObjectError> {
        if self.cell.is_destroyed() {
            return Err(ObjectError::Destroyed(self.cell.id));
        }
        let result = {
            let mut guard = match self.cell.object.try_write() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(err)) => err.into_inner(),
                Err(TryLockError::WouldBlock) => return Err(ObjectError::Busy(self.cell.id)),
            };
            match guard.as_deref_mut() {
                Some(object) => Ok(f(object)),
                None => Err(ObjectError::Destroyed(self.cell.id)),
            }
        };
        self.end_access();
        result
    }

    /// Runs `f` on the `C` part of the instance.
    ///
    /// Returns `Ok(None)` if the instance does not contain a `C`.
    pub fn with_as<C: Object, R>(&self, f: impl FnOnce(&C) -> R) -> Result<Option<R>, ObjectError> {
        self.with(|object| resolve::<C>(object).map(f))
    }

    /// Mutable variant of [`with_as`](Self::with_as).
    pub fn with_as_mut<C: Object, R>(
        &self,
        f: impl FnOnce(&mut C) -> R,
    ) -> Result<Option<R>, ObjectError> {
        self.with_mut(|object| resolve_mut::<C>(object).map(f))
    }

    /// Returns `true` if the instance contains a `C`.
    pub fn is<C: ClassType>(&self) -> bool {
        self.with(|object| resolve::<C>(object).is_some())
            .unwrap_or(false)
    }

    // ----- Events

    /// Connects the signal `signal` of this object to the slot `slot` of
    /// `receiver`.
    pub fn connect(
        &self,
        signal: &str,
        receiver: &ObjectRef,
        slot: &str,
    ) -> Result<ConnectionId, ObjectError> {
        let source = self.with(|object| share_signal(object, signal))??;
        receiver.with(|object| {
            let handler = find_slot(object, slot)?;
            source.connect_dyn(handler).map_err(ObjectError::from)
        })?
    }

    /// Disconnects the slot `slot` of `receiver` from the signal `signal`
    /// of this object. Returns `false` if they were not connected.
    pub fn disconnect(
        &self,
        signal: &str,
        receiver: &ObjectRef,
        slot: &str,
    ) -> Result<bool, ObjectError> {
        let source = self.with(|object| share_signal(object, signal))??;
        receiver.with(|object| {
            let handler = find_slot(object, slot)?;
            Ok(source.disconnect_dyn(handler))
        })?
    }
}

fn share_signal(object: &dyn Object, name: &str) -> Result<Box<dyn DynSignal>, ObjectError> {
    object
        .class()
        .signal(name)
        .and_then(|desc| desc.get(object).map(DynSignal::share))
        .ok_or_else(|| ObjectError::UnknownSignal(String::from(name)))
}

fn find_slot<'a>(object: &'a dyn Object, name: &str) -> Result<&'a dyn DynSlot, ObjectError> {
    object
        .class()
        .slot(name)
        .and_then(|desc| desc.get(object))
        .ok_or_else(|| ObjectError::UnknownSlot(String::from(name)))
}

impl PartialEq for ObjectRef {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("id", &self.cell.id)
            .field("class", &self.cell.class.full_name())
            .field("refs", &self.reference_count())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl RttiType for Option<ObjectRef> {
    fn type_info() -> &'static TypeInfo {
        static INFO: TypeInfo = TypeInfo::new("Object", TypeKind::ObjectRef);
        &INFO
    }

    /// Writes the object id, or an empty string.
    fn to_rtti_string(&self) -> String {
        match self {
            Some(object) => object.id().to_string(),
            None => String::new(),
        }
    }

    /// Object references can not be restored from text.
    fn from_rtti_string(_: &str) -> Self {
        None
    }

    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }

    fn from_value(value: &Value) -> Self {
        value.to_object()
    }
}

// -----------------------------------------------------------------------------
// WeakObjectRef

/// A weak handle, see [`ObjectRef::downgrade`].
#[derive(Clone, Default)]
pub struct WeakObjectRef {
    cell: Weak<ObjectCell>,
}

impl WeakObjectRef {
    /// Creates a handle that never upgrades.
    #[inline]
    pub const fn new() -> Self {
        Self { cell: Weak::new() }
    }

    /// Returns a strong handle unless the instance has been destroyed.
    pub fn upgrade(&self) -> Option<ObjectRef> {
        let cell = self.cell.upgrade()?;
        if cell.is_destroyed() {
            return None;
        }
        Some(ObjectRef { cell })
    }
}

impl fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObjectRef").finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ForeignObject

/// An object handed over to a foreign owner, see [`ObjectRef::into_foreign`].
///
/// The reference count no longer destroys the instance. The token does:
/// either explicitly with [`destroy`](Self::destroy) or when dropped.
pub struct ForeignObject {
    object: Option<ObjectRef>,
}

impl ForeignObject {
    /// Returns a handle to the instance.
    ///
    /// The handle does not add a reference.
    pub fn get(&self) -> Option<&ObjectRef> {
        self.object.as_ref()
    }

    /// Destroys the instance now.
    pub fn destroy(mut self) -> bool {
        match self.object.take() {
            Some(object) => object.destroy(),
            None => false,
        }
    }

    /// Takes the instance back into reference counting and adds a reference.
    ///
    /// Returns `None` if the instance has been destroyed.
    pub fn reclaim(mut self) -> Option<ObjectRef> {
        let object = self.object.take()?;
        let _ = object.cell.state.compare_exchange(
            FOREIGN,
            LIVE,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if object.add_reference() == 0 {
            return None;
        }
        Some(object)
    }
}

impl Drop for ForeignObject {
    fn drop(&mut self) {
        if let Some(object) = self.object.take()
            && object.is_foreign()
        {
            object.destroy();
        }
    }
}

impl fmt::Debug for ForeignObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ForeignObject").field(&self.object).finish()
    }
}
