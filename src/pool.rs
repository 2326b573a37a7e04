use crate::config::PoolConfig;
use crate::event_kind::PayloadKind;
use crate::listener::{EventPayload, KindCollection, ListenerRecord};
use crate::payload::{Collider, Collider2D, Collision, Collision2D, PointerEventData};
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

const DEFAULT_COLLECTION_CAPACITY: usize = 4;

/// Reuse counters for one payload shape, or summed over all of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub records_created: u64,
    pub records_reused: u64,
    pub records_idle: usize,
    pub collections_created: u64,
    pub collections_reused: u64,
    pub collections_idle: usize,
}

impl PoolStats {
    fn accumulate(&mut self, other: PoolStats) {
        self.records_created += other.records_created;
        self.records_reused += other.records_reused;
        self.records_idle += other.records_idle;
        self.collections_created += other.collections_created;
        self.collections_reused += other.collections_reused;
        self.collections_idle += other.collections_idle;
    }
}

/// Idle records and collections of one payload shape.
pub struct PoolShelf<P> {
    records: Vec<ListenerRecord<P>>,
    collections: Vec<KindCollection<P>>,
    records_created: u64,
    records_reused: u64,
    collections_created: u64,
    collections_reused: u64,
}

impl<P> PoolShelf<P> {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            collections: Vec::new(),
            records_created: 0,
            records_reused: 0,
            collections_created: 0,
            collections_reused: 0,
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            records_created: self.records_created,
            records_reused: self.records_reused,
            records_idle: self.records.len(),
            collections_created: self.collections_created,
            collections_reused: self.collections_reused,
            collections_idle: self.collections.len(),
        }
    }
}

/// Recycles listener records and per-kind collections, one shelf per payload shape.
///
/// The pool never shrinks; everything released stays available until the pool is dropped.
pub struct ListenerPool {
    pub(crate) pointer: PoolShelf<PointerEventData>,
    pub(crate) collision: PoolShelf<Collision>,
    pub(crate) collision_2d: PoolShelf<Collision2D>,
    pub(crate) collider: PoolShelf<Collider>,
    pub(crate) collider_2d: PoolShelf<Collider2D>,
    collection_capacity: usize,
}

impl ListenerPool {
    pub fn new() -> Self {
        Self {
            pointer: PoolShelf::new(),
            collision: PoolShelf::new(),
            collision_2d: PoolShelf::new(),
            collider: PoolShelf::new(),
            collider_2d: PoolShelf::new(),
            collection_capacity: DEFAULT_COLLECTION_CAPACITY,
        }
    }

    pub fn with_config(config: &PoolConfig) -> Self {
        let mut pool = Self::new();
        pool.collection_capacity = config.collection_capacity;
        if config.prewarm_records > 0 || config.prewarm_collections > 0 {
            pool.prewarm::<PointerEventData>(config.prewarm_records, config.prewarm_collections);
            pool.prewarm::<Collision>(config.prewarm_records, config.prewarm_collections);
            pool.prewarm::<Collision2D>(config.prewarm_records, config.prewarm_collections);
            pool.prewarm::<Collider>(config.prewarm_records, config.prewarm_collections);
            pool.prewarm::<Collider2D>(config.prewarm_records, config.prewarm_collections);
            tracing::debug!(
                records = config.prewarm_records,
                collections = config.prewarm_collections,
                "prewarmed listener pool"
            );
        }
        pool
    }

    /// Fills the `P` shelf up to the requested number of idle instances.
    pub fn prewarm<P: EventPayload>(&mut self, records: usize, collections: usize) {
        let capacity = self.collection_capacity;
        let shelf = P::shelf(self);
        while shelf.records.len() < records {
            shelf.records.push(ListenerRecord::empty());
            shelf.records_created += 1;
        }
        while shelf.collections.len() < collections {
            shelf.collections.push(KindCollection::with_capacity(capacity));
            shelf.collections_created += 1;
        }
    }

    pub fn acquire_record<P: EventPayload>(&mut self) -> ListenerRecord<P> {
        let shelf = P::shelf(self);
        match shelf.records.pop() {
            Some(record) => {
                shelf.records_reused += 1;
                record
            }
            None => {
                shelf.records_created += 1;
                ListenerRecord::empty()
            }
        }
    }

    pub fn release_record<P: EventPayload>(&mut self, mut record: ListenerRecord<P>) {
        record.reset();
        P::shelf(self).records.push(record);
    }

    pub fn acquire_collection<P: EventPayload>(&mut self) -> KindCollection<P> {
        let capacity = self.collection_capacity;
        let shelf = P::shelf(self);
        match shelf.collections.pop() {
            Some(collection) => {
                shelf.collections_reused += 1;
                collection
            }
            None => {
                shelf.collections_created += 1;
                KindCollection::with_capacity(capacity)
            }
        }
    }

    /// Releases every record still held by `collection`, then shelves the collection itself.
    pub fn release_collection<P: EventPayload>(&mut self, mut collection: KindCollection<P>) {
        let shelf = P::shelf(self);
        for mut record in collection.drain() {
            record.reset();
            shelf.records.push(record);
        }
        shelf.collections.push(collection);
    }

    pub fn stats_for(&self, kind: PayloadKind) -> PoolStats {
        match kind {
            PayloadKind::Pointer => self.shelf_stats::<PointerEventData>(),
            PayloadKind::Collision => self.shelf_stats::<Collision>(),
            PayloadKind::Collision2D => self.shelf_stats::<Collision2D>(),
            PayloadKind::Collider => self.shelf_stats::<Collider>(),
            PayloadKind::Collider2D => self.shelf_stats::<Collider2D>(),
        }
    }

    pub fn stats(&self) -> PoolStats {
        let mut total = PoolStats::default();
        for kind in PayloadKind::ALL {
            total.accumulate(self.stats_for(kind));
        }
        total
    }

    fn shelf_stats<P: EventPayload>(&self) -> PoolStats {
        P::shelf_ref(self).stats()
    }
}

impl Default for ListenerPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to the application's listener pool.
///
/// Created once at startup and cloned into every registry and host that needs it.
#[derive(Clone)]
pub struct PoolHandle(Rc<RefCell<ListenerPool>>);

impl PoolHandle {
    pub fn new(pool: ListenerPool) -> Self {
        Self(Rc::new(RefCell::new(pool)))
    }

    pub fn from_config(config: &PoolConfig) -> Self {
        Self::new(ListenerPool::with_config(config))
    }

    pub fn borrow(&self) -> Ref<'_, ListenerPool> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ListenerPool> {
        self.0.borrow_mut()
    }

    pub(crate) fn try_borrow_mut(&self) -> Option<RefMut<'_, ListenerPool>> {
        self.0.try_borrow_mut().ok()
    }

    pub fn stats(&self) -> PoolStats {
        self.0.borrow().stats()
    }
}

impl Default for PoolHandle {
    fn default() -> Self {
        Self::new(ListenerPool::new())
    }
}

impl std::fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.try_borrow() {
            Ok(pool) => f.debug_tuple("PoolHandle").field(&pool.stats()).finish(),
            Err(_) => f.write_str("PoolHandle(<borrowed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::listener::Callback;

    #[test]
    fn released_records_are_handed_out_again() {
        let mut pool = ListenerPool::new();
        let mut record = pool.acquire_record::<Collision>();
        record.init(Callback::new(|_: &Collision, _| Ok(())), args![7]);
        pool.release_record(record);

        let again = pool.acquire_record::<Collision>();
        assert!(again.callback().is_none(), "released records come back cleared");
        assert!(again.args().is_empty());
        let stats = pool.stats_for(PayloadKind::Collision);
        assert_eq!((stats.records_created, stats.records_reused), (1, 1));
    }

    #[test]
    fn shelves_are_separate_per_payload() {
        let mut pool = ListenerPool::new();
        let record = pool.acquire_record::<PointerEventData>();
        pool.release_record(record);
        let _ = pool.acquire_record::<Collider2D>();
        assert_eq!(pool.stats_for(PayloadKind::Pointer).records_idle, 1);
        assert_eq!(pool.stats_for(PayloadKind::Collider2D).records_created, 1);
        assert_eq!(pool.stats_for(PayloadKind::Collider2D).records_reused, 0);
    }

    #[test]
    fn releasing_a_collection_recycles_its_records() {
        let mut pool = ListenerPool::new();
        let mut collection = pool.acquire_collection::<PointerEventData>();
        for i in 0..3 {
            let mut record = pool.acquire_record::<PointerEventData>();
            record.init(Callback::new(|_: &PointerEventData, _| Ok(())), args![i]);
            collection.push(record);
        }
        pool.release_collection(collection);
        let stats = pool.stats();
        assert_eq!(stats.records_idle, 3);
        assert_eq!(stats.collections_idle, 1);
    }

    #[test]
    fn prewarm_uses_config_counts() {
        let config = PoolConfig { prewarm_records: 2, prewarm_collections: 1, collection_capacity: 8 };
        let pool = ListenerPool::with_config(&config);
        for kind in PayloadKind::ALL {
            let stats = pool.stats_for(kind);
            assert_eq!(stats.records_idle, 2, "{kind} records");
            assert_eq!(stats.collections_idle, 1, "{kind} collections");
        }
        assert_eq!(pool.stats().records_created, 10);
    }
}
