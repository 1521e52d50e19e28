//! Opaque-handle tables for host-owned engine objects.
//!
//! A `HandleTable<T>` is the sole owner of every `T` it holds. The guest
//! only ever sees the `u32` value of a [`Handle`]. Lookups are strict map
//! lookups: an unknown or released handle is a guest error, never an
//! indexed dereference.
//!
//! Handle values come from a per-table monotonic counter and are never
//! reissued, so a stale handle cannot alias a newer object.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use wasi_llm_primitives::{RawHandle, ResourceKind};

use crate::error::{EngineError, HostError};
use crate::traits::TrainingEngine;
use crate::types::BridgeLimits;

/// Typed handle to an object of type `T` in a [`HandleTable<T>`].
///
/// The type parameter only exists on the host side; a handle for a
/// tokenizer cannot be passed where a model handle is expected.
pub struct Handle<T> {
    raw: RawHandle,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Wrap a guest-supplied value. The result is unverified until looked up.
    pub fn from_raw(raw: RawHandle) -> Self {
        Self {
            raw,
            _kind: PhantomData,
        }
    }

    /// The value written into guest memory.
    pub fn raw(self) -> RawHandle {
        self.raw
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.raw)
    }
}

struct TableInner<T> {
    next: RawHandle,
    entries: BTreeMap<RawHandle, Arc<Mutex<T>>>,
}

/// Mapping from handle to an exclusively host-owned object of one kind.
///
/// A single mutex guards insert, lookup and removal. Each object sits
/// behind its own mutex so a long training run does not hold the table.
pub struct HandleTable<T> {
    kind: ResourceKind,
    max_entries: usize,
    inner: Mutex<TableInner<T>>,
}

impl<T> HandleTable<T> {
    /// Create an empty table holding at most `max_entries` live objects.
    pub fn new(kind: ResourceKind, max_entries: usize) -> Self {
        Self {
            kind,
            max_entries,
            inner: Mutex::new(TableInner {
                next: 0,
                entries: BTreeMap::new(),
            }),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Construct an object with `factory` and register it under a fresh handle.
    ///
    /// The factory runs without the table lock held. If it fails, nothing
    /// is registered and the failure is reported as an engine error.
    pub fn create<F>(&self, factory: F) -> Result<Handle<T>, HostError>
    where
        F: FnOnce() -> Result<T, EngineError>,
    {
        self.check_room(&self.inner.lock())?;

        let object = factory()?;

        let mut inner = self.inner.lock();
        // Another creator may have filled the table while the factory ran.
        self.check_room(&inner)?;
        let raw = inner.next;
        inner.next += 1;
        inner.entries.insert(raw, Arc::new(Mutex::new(object)));
        Ok(Handle::from_raw(raw))
    }

    fn check_room(&self, inner: &TableInner<T>) -> Result<(), HostError> {
        if inner.entries.len() >= self.max_entries {
            return Err(HostError::TableFull {
                kind: self.kind,
                limit: self.max_entries,
            });
        }
        if inner.next == RawHandle::MAX {
            return Err(HostError::HandlesExhausted(self.kind));
        }
        Ok(())
    }

    /// Look up a live object.
    pub fn get(&self, handle: Handle<T>) -> Result<Arc<Mutex<T>>, HostError> {
        self.inner
            .lock()
            .entries
            .get(&handle.raw)
            .cloned()
            .ok_or(HostError::UnknownHandle {
                kind: self.kind,
                handle: handle.raw,
            })
    }

    /// Remove an object from the table.
    ///
    /// The object is dropped once the last in-flight user releases it.
    /// The handle value is never issued again.
    pub fn release(&self, handle: Handle<T>) -> Result<(), HostError> {
        let removed = self.inner.lock().entries.remove(&handle.raw);
        // The table lock is released here; the object drops outside it.
        match removed {
            Some(object) => {
                drop(object);
                Ok(())
            }
            None => Err(HostError::UnknownHandle {
                kind: self.kind,
                handle: handle.raw,
            }),
        }
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.inner.lock().entries.contains_key(&handle.raw)
    }

    /// Returns the number of live objects.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if the table holds no objects.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl<T> fmt::Debug for HandleTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleTable")
            .field("kind", &self.kind)
            .field("len", &self.len())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

/// The three tables holding the objects of one training engine.
pub struct HandleTables<E: TrainingEngine> {
    pub models: HandleTable<E::Model>,
    pub data_loaders: HandleTable<E::DataLoader>,
    pub tokenizers: HandleTable<E::Tokenizer>,
}

impl<E: TrainingEngine> HandleTables<E> {
    pub fn new(limits: &BridgeLimits) -> Self {
        Self {
            models: HandleTable::new(ResourceKind::Model, limits.max_handles_per_kind),
            data_loaders: HandleTable::new(ResourceKind::DataLoader, limits.max_handles_per_kind),
            tokenizers: HandleTable::new(ResourceKind::Tokenizer, limits.max_handles_per_kind),
        }
    }
}

impl<E: TrainingEngine> fmt::Debug for HandleTables<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleTables")
            .field("models", &self.models)
            .field("data_loaders", &self.data_loaders)
            .field("tokenizers", &self.tokenizers)
            .finish()
    }
}
