use crate::args::ArgValue;
use crate::error::ListenerError;
use crate::event_kind::{EventKind, EventMask};
use crate::listener::{AnyCollection, Callback, EventPayload, KindCollection};
use crate::pool::PoolHandle;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use tracing::{trace, warn};

/// The listener table of a single owner: event kind to its ordered listeners.
///
/// Records and collections come from the shared [`PoolHandle`] and go back to it
/// when removed, cleared, or when the registry itself is dropped.
pub struct EventListener {
    pool: PoolHandle,
    collections: HashMap<EventKind, AnyCollection>,
}

impl EventListener {
    pub fn new(pool: PoolHandle) -> Self {
        Self { pool, collections: HashMap::new() }
    }

    pub fn pool(&self) -> &PoolHandle {
        &self.pool
    }

    /// Appends a listener for `kind`. The same callback may be added any number of
    /// times; every record fires.
    pub fn add_listener<P: EventPayload>(
        &mut self,
        kind: EventKind,
        callback: &Callback<P>,
        args: impl IntoIterator<Item = ArgValue>,
    ) -> Result<(), ListenerError> {
        check_payload::<P>(kind)?;
        self.push_record(kind, callback, args);
        Ok(())
    }

    /// Caller guarantees `P` is the payload of `kind`.
    pub(crate) fn push_record<P: EventPayload>(
        &mut self,
        kind: EventKind,
        callback: &Callback<P>,
        args: impl IntoIterator<Item = ArgValue>,
    ) {
        let mut pool = self.pool.borrow_mut();
        let mut record = pool.acquire_record::<P>();
        record.init(callback.clone(), args);
        let collection = match self.collections.entry(kind) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(P::wrap(pool.acquire_collection::<P>())),
        };
        match P::project_mut(collection) {
            Some(collection) => collection.push(record),
            None => {
                warn!(%kind, payload = %P::KIND, "listener collection holds another payload; dropping record");
                pool.release_record(record);
            }
        }
    }

    /// Removes the first listener that uses `callback` and, when `check_args` is set
    /// and `args` is non-empty, was bound with exactly `args`. Returns whether one was removed.
    pub fn remove_listener<P: EventPayload>(
        &mut self,
        kind: EventKind,
        callback: &Callback<P>,
        check_args: bool,
        args: &[ArgValue],
    ) -> Result<bool, ListenerError> {
        check_payload::<P>(kind)?;
        Ok(self.take_record(kind, callback, check_args, args))
    }

    pub(crate) fn take_record<P: EventPayload>(
        &mut self,
        kind: EventKind,
        callback: &Callback<P>,
        check_args: bool,
        args: &[ArgValue],
    ) -> bool {
        let Some(collection) = self.collections.get_mut(&kind).and_then(P::project_mut) else {
            return false;
        };
        let Some(index) = collection.position(callback, check_args, args) else {
            return false;
        };
        let record = collection.remove(index);
        self.pool.borrow_mut().release_record(record);
        true
    }

    /// Drops every listener for `kind` along with its collection. Returns how many were removed.
    pub fn remove_all_listeners_of(&mut self, kind: EventKind) -> usize {
        match self.collections.remove(&kind) {
            Some(collection) => {
                let removed = collection.len();
                collection.release_into(&mut self.pool.borrow_mut());
                removed
            }
            None => 0,
        }
    }

    /// Drops every listener for every kind whose category is in `mask`.
    pub fn remove_all_in(&mut self, mask: EventMask) -> usize {
        let kinds: Vec<EventKind> =
            self.collections.keys().copied().filter(|kind| mask.contains_kind(*kind)).collect();
        kinds.into_iter().map(|kind| self.remove_all_listeners_of(kind)).sum()
    }

    pub fn remove_all_listeners(&mut self) -> usize {
        let mut removed = 0;
        let mut pool = self.pool.borrow_mut();
        for (_, collection) in self.collections.drain() {
            removed += collection.len();
            collection.release_into(&mut pool);
        }
        removed
    }

    /// Invokes every listener for `kind` in registration order and returns how many ran.
    ///
    /// Stops at the first callback error; later listeners are not invoked for this call.
    pub fn trigger<P: EventPayload>(&self, kind: EventKind, payload: &P) -> Result<usize, ListenerError> {
        check_payload::<P>(kind)?;
        let Some(collection) = self.collections.get(&kind).and_then(P::project) else {
            return Ok(0);
        };
        let invoked = invoke_all(kind, collection, payload)?;
        trace!(%kind, invoked, "triggered listeners");
        Ok(invoked)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.collections.get(&kind).map_or(0, AnyCollection::len)
    }

    pub fn total_listeners(&self) -> usize {
        self.collections.values().map(AnyCollection::len).sum()
    }

    /// Whether `kind` has a collection, even an empty one.
    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.collections.contains_key(&kind)
    }

    pub fn registered_kinds(&self) -> Vec<EventKind> {
        let mut kinds: Vec<EventKind> = self.collections.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn registered_mask(&self) -> EventMask {
        self.collections.keys().fold(EventMask::empty(), |mask, kind| mask | kind.mask())
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// The bound arguments of every listener for `kind`, in dispatch order.
    pub fn bound_args<P: EventPayload>(&self, kind: EventKind) -> Vec<Vec<ArgValue>> {
        self.collections
            .get(&kind)
            .and_then(P::project)
            .map(|collection| collection.records().iter().map(|record| record.args().to_vec()).collect())
            .unwrap_or_default()
    }
}

fn invoke_all<P>(kind: EventKind, collection: &KindCollection<P>, payload: &P) -> Result<usize, ListenerError> {
    let mut invoked = 0;
    for (index, record) in collection.records().iter().enumerate() {
        match record.invoke(payload) {
            Ok(true) => invoked += 1,
            Ok(false) => {}
            Err(error) => return Err(ListenerError::Callback { kind, index, error }),
        }
    }
    Ok(invoked)
}

pub(crate) fn check_payload<P: EventPayload>(kind: EventKind) -> Result<(), ListenerError> {
    let expected = kind.payload_kind();
    if expected == P::KIND {
        Ok(())
    } else {
        warn!(%kind, %expected, found = %P::KIND, "payload mismatch");
        Err(ListenerError::PayloadMismatch { kind, expected, found: P::KIND })
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        if self.collections.is_empty() {
            return;
        }
        if let Some(mut pool) = self.pool.try_borrow_mut() {
            for (_, collection) in self.collections.drain() {
                collection.release_into(&mut pool);
            }
        }
    }
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("kinds", &self.registered_kinds())
            .field("listeners", &self.total_listeners())
            .finish()
    }
}
