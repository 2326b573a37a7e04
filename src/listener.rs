//! Listener records, per-kind collections and the payload trait that ties a
//! payload type to its collection variant and pool shelf.

use crate::args::{args_equal, ArgValue, BoundArgs};
use crate::event_kind::PayloadKind;
use crate::payload::{Collider, Collider2D, Collision, Collision2D, PointerEventData};
use crate::pool::{ListenerPool, PoolShelf};
use anyhow::Result;
use std::fmt;
use std::rc::Rc;

pub type CallbackFn<P> = dyn Fn(&P, &[ArgValue]) -> Result<()>;

/// Shared handle to a listener callback.
///
/// Removal matches on identity: clones of one handle are the same callback,
/// two handles built from separate closures never are.
pub struct Callback<P>(Rc<CallbackFn<P>>);

impl<P> Callback<P> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&P, &[ArgValue]) -> Result<()> + 'static,
    {
        Self(Rc::new(callback))
    }

    pub fn same_as(&self, other: &Callback<P>) -> bool {
        std::ptr::eq(Rc::as_ptr(&self.0).cast::<()>(), Rc::as_ptr(&other.0).cast::<()>())
    }

    fn call(&self, payload: &P, args: &[ArgValue]) -> Result<()> {
        (self.0)(payload, args)
    }
}

impl<P> Clone for Callback<P> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<P> PartialEq for Callback<P> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<P> fmt::Debug for Callback<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// One registered callback plus the arguments bound to it.
pub struct ListenerRecord<P> {
    callback: Option<Callback<P>>,
    args: BoundArgs,
}

impl<P> ListenerRecord<P> {
    pub(crate) fn empty() -> Self {
        Self { callback: None, args: BoundArgs::new() }
    }

    pub(crate) fn init(&mut self, callback: Callback<P>, args: impl IntoIterator<Item = ArgValue>) {
        self.callback = Some(callback);
        self.args.clear();
        self.args.extend(args);
    }

    pub(crate) fn reset(&mut self) {
        self.callback = None;
        self.args.clear();
    }

    pub fn callback(&self) -> Option<&Callback<P>> {
        self.callback.as_ref()
    }

    pub fn args(&self) -> &[ArgValue] {
        &self.args
    }

    /// Argument checking only applies when it is requested and `args` is non-empty.
    fn matches(&self, callback: &Callback<P>, check_args: bool, args: &[ArgValue]) -> bool {
        match &self.callback {
            Some(own) if own.same_as(callback) => {
                !check_args || args.is_empty() || args_equal(args, &self.args)
            }
            _ => false,
        }
    }

    /// Returns `Ok(false)` when the record holds no callback.
    pub(crate) fn invoke(&self, payload: &P) -> Result<bool> {
        match &self.callback {
            Some(callback) => {
                callback.call(payload, &self.args)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<P> fmt::Debug for ListenerRecord<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRecord").field("callback", &self.callback).field("args", &self.args).finish()
    }
}

/// Listeners for one event kind on one owner, in dispatch order.
pub struct KindCollection<P> {
    records: Vec<ListenerRecord<P>>,
}

impl<P> KindCollection<P> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self { records: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ListenerRecord<P>] {
        &self.records
    }

    pub(crate) fn push(&mut self, record: ListenerRecord<P>) {
        self.records.push(record);
    }

    pub(crate) fn position(&self, callback: &Callback<P>, check_args: bool, args: &[ArgValue]) -> Option<usize> {
        self.records.iter().position(|record| record.matches(callback, check_args, args))
    }

    pub(crate) fn remove(&mut self, index: usize) -> ListenerRecord<P> {
        self.records.remove(index)
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, ListenerRecord<P>> {
        self.records.drain(..)
    }
}

impl<P> fmt::Debug for KindCollection<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.records).finish()
    }
}

/// A collection of any payload shape, as stored in an owner's registry.
#[derive(Debug)]
pub enum AnyCollection {
    Pointer(KindCollection<PointerEventData>),
    Collision(KindCollection<Collision>),
    Collision2D(KindCollection<Collision2D>),
    Collider(KindCollection<Collider>),
    Collider2D(KindCollection<Collider2D>),
}

impl AnyCollection {
    pub fn len(&self) -> usize {
        match self {
            AnyCollection::Pointer(c) => c.len(),
            AnyCollection::Collision(c) => c.len(),
            AnyCollection::Collision2D(c) => c.len(),
            AnyCollection::Collider(c) => c.len(),
            AnyCollection::Collider2D(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn payload_kind(&self) -> PayloadKind {
        match self {
            AnyCollection::Pointer(_) => PayloadKind::Pointer,
            AnyCollection::Collision(_) => PayloadKind::Collision,
            AnyCollection::Collision2D(_) => PayloadKind::Collision2D,
            AnyCollection::Collider(_) => PayloadKind::Collider,
            AnyCollection::Collider2D(_) => PayloadKind::Collider2D,
        }
    }

    /// Hands the collection and every record in it back to the pool.
    pub(crate) fn release_into(self, pool: &mut ListenerPool) {
        match self {
            AnyCollection::Pointer(c) => pool.release_collection(c),
            AnyCollection::Collision(c) => pool.release_collection(c),
            AnyCollection::Collision2D(c) => pool.release_collection(c),
            AnyCollection::Collider(c) => pool.release_collection(c),
            AnyCollection::Collider2D(c) => pool.release_collection(c),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Implemented by the five payload types the host can deliver.
pub trait EventPayload: sealed::Sealed + Sized + 'static {
    const KIND: PayloadKind;

    #[doc(hidden)]
    fn wrap(collection: KindCollection<Self>) -> AnyCollection;

    #[doc(hidden)]
    fn project(collection: &AnyCollection) -> Option<&KindCollection<Self>>;

    #[doc(hidden)]
    fn project_mut(collection: &mut AnyCollection) -> Option<&mut KindCollection<Self>>;

    #[doc(hidden)]
    fn shelf(pool: &mut ListenerPool) -> &mut PoolShelf<Self>;

    #[doc(hidden)]
    fn shelf_ref(pool: &ListenerPool) -> &PoolShelf<Self>;
}

macro_rules! event_payload {
    ($ty:ty, $variant:ident, $shelf:ident) => {
        impl sealed::Sealed for $ty {}

        impl EventPayload for $ty {
            const KIND: PayloadKind = PayloadKind::$variant;

            fn wrap(collection: KindCollection<Self>) -> AnyCollection {
                AnyCollection::$variant(collection)
            }

            fn project(collection: &AnyCollection) -> Option<&KindCollection<Self>> {
                match collection {
                    AnyCollection::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn project_mut(collection: &mut AnyCollection) -> Option<&mut KindCollection<Self>> {
                match collection {
                    AnyCollection::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn shelf(pool: &mut ListenerPool) -> &mut PoolShelf<Self> {
                &mut pool.$shelf
            }

            fn shelf_ref(pool: &ListenerPool) -> &PoolShelf<Self> {
                &pool.$shelf
            }
        }
    };
}

event_payload!(PointerEventData, Pointer, pointer);
event_payload!(Collision, Collision, collision);
event_payload!(Collision2D, Collision2D, collision_2d);
event_payload!(Collider, Collider, collider);
event_payload!(Collider2D, Collider2D, collider_2d);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    fn noop() -> Callback<PointerEventData> {
        Callback::new(|_, _| Ok(()))
    }

    #[test]
    fn callback_identity_follows_the_shared_handle() {
        let a = noop();
        let b = noop();
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn unchecked_match_ignores_arguments() {
        let a = noop();
        let mut record = ListenerRecord::empty();
        record.init(a.clone(), args![1]);
        assert!(record.matches(&a, false, &args![2]));
        assert!(record.matches(&a, true, &[]));
        assert!(!record.matches(&a, true, &args![2]));
        assert!(record.matches(&a, true, &args![1]));
        assert!(!record.matches(&noop(), false, &[]));
    }

    #[test]
    fn reset_record_is_skipped_on_invoke() {
        let mut record = ListenerRecord::empty();
        record.init(noop(), args!["x"]);
        assert!(record.invoke(&PointerEventData::default()).expect("invoke"));
        record.reset();
        assert!(record.args().is_empty());
        assert!(!record.invoke(&PointerEventData::default()).expect("invoke empty"));
    }

    #[test]
    fn projection_only_matches_own_variant() {
        let collection = PointerEventData::wrap(KindCollection::with_capacity(2));
        assert!(PointerEventData::project(&collection).is_some());
        assert!(Collision::project(&collection).is_none());
        assert_eq!(collection.payload_kind(), PayloadKind::Pointer);
        assert!(collection.is_empty());
    }
}
