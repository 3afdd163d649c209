//! Generational handle tables.
//!
//! A handle packs `(index: u32, generation: u32)` into one `u64`. A slot's
//! generation is bumped every time it is released, so a stale copy of a
//! handle never resolves to the slot's next occupant. Raw id `0` is the
//! null handle and never refers to a live value.

use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::marker::PhantomData;

/// Marker types naming the handle kinds.
pub mod kind {
    /// Database handles.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Database {}
    /// Connection handles.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Connection {}
    /// Result handles.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Result {}
}

/// Names a handle kind in error messages.
pub trait HandleKind {
    /// Lower-case kind name.
    const NAME: &'static str;
}

impl HandleKind for kind::Database {
    const NAME: &'static str = "database";
}

impl HandleKind for kind::Connection {
    const NAME: &'static str = "connection";
}

impl HandleKind for kind::Result {
    const NAME: &'static str = "result";
}

/// A typed handle into a [`HandleTable`].
#[derive(PartialEq, Eq, Hash)]
pub struct Handle<K> {
    id: u64,
    _kind: PhantomData<K>,
}

impl<K> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Handle<K> {}

impl<K> Handle<K> {
    /// The null handle.
    pub const NULL: Self = Self::from_raw(0);

    /// Rebuilds a handle from its raw id.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self {
            id,
            _kind: PhantomData,
        }
    }

    /// The raw id.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.id
    }

    /// Returns true for the null handle.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.id == 0
    }

    // Index is stored +1 so that slot 0, generation 0 is not the null id
    fn pack(index: usize, generation: u32) -> Option<Self> {
        let index = u32::try_from(index).ok()?.checked_add(1)?;
        Some(Self::from_raw((u64::from(generation) << 32) | u64::from(index)))
    }

    fn unpack(self) -> Option<(usize, u32)> {
        let index = (self.id & 0xFFFF_FFFF) as u32;
        let generation = (self.id >> 32) as u32;
        let index = usize::try_from(index.checked_sub(1)?).ok()?;
        Some((index, generation))
    }
}

impl<K> Default for Handle<K> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<K: HandleKind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:#x}", K::NAME, self.id)
    }
}

/// Database handle.
pub type DatabaseHandle = Handle<kind::Database>;
/// Connection handle.
pub type ConnectionHandle = Handle<kind::Connection>;
/// Result handle.
pub type ResultHandle = Handle<kind::Result>;

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena addressed by [`Handle`]s.
#[derive(Debug)]
pub struct HandleTable<K, T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    len: usize,
    _kind: PhantomData<K>,
}

impl<K: HandleKind, T> Default for HandleTable<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: HandleKind, T> HandleTable<K, T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            _kind: PhantomData,
        }
    }

    fn invalid(handle: Handle<K>) -> CoreError {
        CoreError::invalid_handle(K::NAME, handle.raw())
    }

    /// Stores `value` and returns its handle.
    pub fn insert(&mut self, value: T) -> CoreResult<Handle<K>> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        let handle = Handle::pack(index, slot.generation)
            .ok_or_else(|| CoreError::query(format!("too many open {} handles", K::NAME)))?;
        slot.value = Some(value);
        self.len += 1;
        Ok(handle)
    }

    fn slot(&self, handle: Handle<K>) -> Option<&Slot<T>> {
        let (index, generation) = handle.unpack()?;
        self.slots
            .get(index)
            .filter(|slot| slot.generation == generation && slot.value.is_some())
    }

    /// Borrows the value behind `handle`.
    pub fn get(&self, handle: Handle<K>) -> CoreResult<&T> {
        self.slot(handle)
            .and_then(|slot| slot.value.as_ref())
            .ok_or_else(|| Self::invalid(handle))
    }

    /// Mutably borrows the value behind `handle`.
    pub fn get_mut(&mut self, handle: Handle<K>) -> CoreResult<&mut T> {
        if self.slot(handle).is_none() {
            return Err(Self::invalid(handle));
        }
        let (index, _) = handle.unpack().ok_or_else(|| Self::invalid(handle))?;
        self.slots[index]
            .value
            .as_mut()
            .ok_or_else(|| Self::invalid(handle))
    }

    /// Returns true when `handle` refers to a live value.
    #[must_use]
    pub fn contains(&self, handle: Handle<K>) -> bool {
        self.slot(handle).is_some()
    }

    /// Removes and returns the value behind `handle`, invalidating it.
    pub fn remove(&mut self, handle: Handle<K>) -> CoreResult<T> {
        if self.slot(handle).is_none() {
            return Err(Self::invalid(handle));
        }
        let (index, _) = handle.unpack().ok_or_else(|| Self::invalid(handle))?;
        let slot = &mut self.slots[index];
        let value = slot.value.take().ok_or_else(|| Self::invalid(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.len -= 1;
        Ok(value)
    }

    /// Live handles and their values.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<K>, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let value = slot.value.as_ref()?;
            Some((Handle::pack(index, slot.generation)?, value))
        })
    }

    /// Number of live values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when no values are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    type Table = HandleTable<kind::Result, &'static str>;

    #[test]
    fn insert_get_remove() {
        let mut table = Table::new();
        let a = table.insert("a").unwrap();
        let b = table.insert("b").unwrap();
        assert!(!a.is_null());
        assert_ne!(a, b);
        assert_eq!(*table.get(a).unwrap(), "a");
        assert_eq!(table.len(), 2);

        *table.get_mut(b).unwrap() = "b2";
        assert_eq!(*table.get(b).unwrap(), "b2");

        assert_eq!(table.remove(a).unwrap(), "a");
        assert!(!table.contains(a));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn stale_handles_are_rejected() {
        let mut table = Table::new();
        let first = table.insert("first").unwrap();
        table.remove(first).unwrap();

        // The slot is reused with a new generation
        let second = table.insert("second").unwrap();
        assert_ne!(first, second);

        let err = table.get(first).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert!(table.remove(first).is_err());
        assert_eq!(*table.get(second).unwrap(), "second");
    }

    #[test]
    fn double_remove_fails() {
        let mut table = Table::new();
        let h = table.insert("x").unwrap();
        table.remove(h).unwrap();
        let err = table.remove(h).unwrap_err();
        assert!(matches!(err, CoreError::InvalidHandle { kind: "result", .. }));
    }

    #[test]
    fn null_and_garbage_handles() {
        let table = Table::new();
        assert!(Handle::<kind::Result>::NULL.is_null());
        assert!(table.get(Handle::NULL).is_err());
        assert!(table.get(Handle::from_raw(0xDEAD_BEEF)).is_err());
        assert_eq!(ResultHandle::default(), ResultHandle::NULL);
    }

    #[test]
    fn iter_yields_live_values() {
        let mut table = Table::new();
        let a = table.insert("a").unwrap();
        let b = table.insert("b").unwrap();
        table.remove(a).unwrap();
        let live: Vec<_> = table.iter().collect();
        assert_eq!(live, vec![(b, &"b")]);
        assert!(!table.is_empty());
    }
}
