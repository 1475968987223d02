//! The registry owning every WindowActor, and the opaque protocol
//! handles attached to them.

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use super::types::ActorId;
use super::window::WindowActor;

/// An opaque, owned handle to the protocol object behind an actor.
///
/// The registry does not know the concrete type of the handle;
/// backends store whatever they need (an X window id, a Wayland
/// proxy) and get it back with [`downcast_ref`](Self::downcast_ref).
///
/// A handle may carry a release closure. It is called exactly once,
/// when the actor is destroyed or the handle is dropped, whichever
/// comes first.
pub struct ProtocolHandle {
    inner: Option<Box<dyn Any>>,
    release: Option<Box<dyn FnOnce(Box<dyn Any>)>>,
}

impl ProtocolHandle {
    /// Wraps a handle that needs no cleanup.
    pub fn new<H: Any>(handle: H) -> Self {
        Self {
            inner: Some(Box::new(handle)),
            release: None,
        }
    }

    /// Wraps a handle that is passed to `release` when the actor
    /// is destroyed.
    pub fn with_release<H, F>(handle: H, release: F) -> Self
    where
        H: Any,
        F: FnOnce(H) + 'static,
    {
        Self {
            inner: Some(Box::new(handle)),
            release: Some(Box::new(move |inner: Box<dyn Any>| {
                if let Ok(handle) = inner.downcast::<H>() {
                    release(*handle)
                }
            })),
        }
    }

    /// Returns a reference to the handle if it is of type `H`.
    ///
    /// Returns `None` once the handle has been released.
    pub fn downcast_ref<H: Any>(&self) -> Option<&H> {
        self.inner.as_ref()?.downcast_ref::<H>()
    }

    /// Whether the handle is of type `H`.
    pub fn is<H: Any>(&self) -> bool {
        self.downcast_ref::<H>().is_some()
    }

    /// Whether the handle has already been released.
    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }

    pub(crate) fn release(&mut self) {
        if let Some(inner) = self.inner.take() {
            if let Some(release) = self.release.take() {
                release(inner)
            }
        }
    }
}

impl Drop for ProtocolHandle {
    fn drop(&mut self) {
        self.release()
    }
}

impl fmt::Debug for ProtocolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolHandle")
            .field("released", &self.is_released())
            .field("has_release", &self.release.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct Entry {
    actor: WindowActor,
    handle: ProtocolHandle,
}

/// The order the registry is currently sorted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortOrder {
    ByZ,
    ByAge,
}

/// Owns all [`WindowActor`]s and their protocol handles.
///
/// Enumeration can be ordered by z-order or by age. The sort is
/// memoized: it is only redone after the z-order was invalidated
/// (on every z-order change notification) or an actor was added.
#[derive(Debug)]
pub struct ActorRegistry {
    actors: IndexMap<ActorId, Entry>,
    next_id: u64,
    next_age: i32,
    sorted: Option<SortOrder>,
    sort_count: usize,
}

impl Default for ActorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            actors: IndexMap::new(),
            next_id: 1,
            next_age: 1,
            sorted: None,
            sort_count: 0,
        }
    }

    /// Creates a new actor owning `handle`.
    ///
    /// `init` is run on the new actor before it is added to the
    /// registry, and is where backends fill in its initial state.
    pub fn create<F>(&mut self, handle: ProtocolHandle, init: F) -> ActorId
    where
        F: FnOnce(&mut WindowActor),
    {
        let id = ActorId(self.next_id);
        self.next_id += 1;

        let age = self.next_age;
        self.next_age = if self.next_age == i32::MAX { 1 } else { self.next_age + 1 };

        let mut actor = WindowActor::new(id, age);
        init(&mut actor);

        debug!("Created actor {} (age {})", id, age);
        self.actors.insert(id, Entry { actor, handle });
        self.sorted = None;
        id
    }

    /// Removes an actor from the registry and releases its handle.
    pub fn destroy(&mut self, id: ActorId) -> Option<WindowActor> {
        let mut entry = self.actors.shift_remove(&id)?;
        debug!("Destroying actor {}", id);
        entry.handle.release();
        Some(entry.actor)
    }

    /// Returns a reference to the actor with the given id.
    pub fn get(&self, id: ActorId) -> Option<&WindowActor> {
        self.actors.get(&id).map(|e| &e.actor)
    }

    /// Returns a mutable reference to the actor with the given id.
    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut WindowActor> {
        self.actors.get_mut(&id).map(|e| &mut e.actor)
    }

    /// Returns the protocol handle of the actor with the given id.
    pub fn handle(&self, id: ActorId) -> Option<&ProtocolHandle> {
        self.actors.get(&id).map(|e| &e.handle)
    }

    /// Returns the actor and its handle together.
    pub fn entry(&self, id: ActorId) -> Option<(&WindowActor, &ProtocolHandle)> {
        self.actors.get(&id).map(|e| (&e.actor, &e.handle))
    }

    /// Whether an actor with the given id exists.
    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// The number of actors in the registry.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Returns the first actor matching `pred`.
    pub fn find<P>(&self, mut pred: P) -> Option<&WindowActor>
    where
        P: FnMut(&WindowActor) -> bool,
    {
        self.actors.values().map(|e| &e.actor).find(|a| pred(a))
    }

    /// Returns the actor whose handle is of type `H` and equal to `handle`.
    pub fn find_by_handle<H: Any + PartialEq>(&self, handle: &H) -> Option<ActorId> {
        self.actors
            .iter()
            .find(|(_, e)| e.handle.downcast_ref::<H>() == Some(handle))
            .map(|(id, _)| *id)
    }

    /// Calls `f` on every actor, ordered by z-order (bottom first)
    /// if `ordered_by_z` is set, or by age (oldest first) otherwise.
    pub fn for_each<F>(&mut self, ordered_by_z: bool, mut f: F)
    where
        F: FnMut(&WindowActor),
    {
        self.sort(if ordered_by_z { SortOrder::ByZ } else { SortOrder::ByAge });
        for entry in self.actors.values() {
            f(&entry.actor)
        }
    }

    /// Calls `f` on every actor, in no particular order.
    pub fn for_each_unordered<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut WindowActor),
    {
        for entry in self.actors.values_mut() {
            f(&mut entry.actor)
        }
    }

    /// Returns the ids of all actors, ordered as in [`for_each`](Self::for_each).
    pub fn ids(&mut self, ordered_by_z: bool) -> Vec<ActorId> {
        self.sort(if ordered_by_z { SortOrder::ByZ } else { SortOrder::ByAge });
        self.actors.keys().copied().collect()
    }

    /// Marks the z-order as changed, so the next ordered enumeration
    /// sorts again.
    pub fn invalidate_z_order(&mut self) {
        if self.sorted == Some(SortOrder::ByZ) {
            self.sorted = None;
        }
    }

    /// How many times the registry has been sorted.
    pub fn sort_count(&self) -> usize {
        self.sort_count
    }

    fn sort(&mut self, order: SortOrder) {
        if self.sorted == Some(order) {
            return;
        }
        match order {
            SortOrder::ByZ => self
                .actors
                .sort_by(|_, a, _, b| a.actor.stack_order.cmp(&b.actor.stack_order)),
            SortOrder::ByAge => self
                .actors
                .sort_by(|_, a, _, b| a.actor.age.cmp(&b.actor.age)),
        }
        self.sorted = Some(order);
        self.sort_count += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_handle_released_once() {
        let released = Rc::new(Cell::new(0));
        let r = released.clone();

        let mut reg = ActorRegistry::new();
        let id = reg.create(
            ProtocolHandle::with_release(42u32, move |h| {
                assert_eq!(h, 42);
                r.set(r.get() + 1);
            }),
            |_| {},
        );

        assert_eq!(reg.handle(id).and_then(|h| h.downcast_ref::<u32>()), Some(&42));
        assert!(reg.destroy(id).is_some());
        assert!(reg.destroy(id).is_none());
        drop(reg);

        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_handle_released_on_drop() {
        let released = Rc::new(Cell::new(false));
        let r = released.clone();

        let mut reg = ActorRegistry::new();
        reg.create(ProtocolHandle::with_release("toplevel", move |_| r.set(true)), |_| {});
        drop(reg);

        assert!(released.get());
    }

    #[test]
    fn test_z_order_memoized() {
        let mut reg = ActorRegistry::new();
        for order in [3, 1, 2] {
            reg.create(ProtocolHandle::new(order), |a| a.stack_order = order);
        }

        let mut seen = Vec::new();
        reg.for_each(true, |a| seen.push(a.stack_order()));
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(reg.sort_count(), 1);

        reg.for_each(true, |_| {});
        assert_eq!(reg.sort_count(), 1);

        reg.invalidate_z_order();
        reg.for_each(true, |_| {});
        assert_eq!(reg.sort_count(), 2);
    }

    #[test]
    fn test_age_order_and_lookup() {
        let mut reg = ActorRegistry::new();
        let a = reg.create(ProtocolHandle::new(10u32), |a| a.stack_order = 5);
        let b = reg.create(ProtocolHandle::new(20u32), |a| a.stack_order = 1);

        assert_eq!(reg.ids(true), vec![b, a]);
        assert_eq!(reg.ids(false), vec![a, b]);
        assert_eq!(reg.find_by_handle(&20u32), Some(b));
        assert_eq!(reg.find_by_handle(&30u32), None);
        assert_eq!(reg.find(|w| w.stack_order() == 5).map(|w| w.id()), Some(a));
    }
}
