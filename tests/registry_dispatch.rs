use std::cell::RefCell;
use std::rc::Rc;

use scene_listener::args;
use scene_listener::args::format_args_list;
use scene_listener::{
    ArgValue, Callback, Collider, Collider2D, EventKind, EventListener, EventMask, ListenerError, PayloadKind,
    PointerEventData, PoolHandle,
};

type Log = Rc<RefCell<Vec<String>>>;

fn recording(log: &Log, name: &'static str) -> Callback<PointerEventData> {
    let log = Rc::clone(log);
    Callback::new(move |_, args| {
        log.borrow_mut().push(format!("{name}{}", format_args_list(args)));
        Ok(())
    })
}

fn click(listener: &EventListener) -> usize {
    listener.trigger(EventKind::Click, &PointerEventData::default()).expect("click dispatch")
}

#[test]
fn checked_removal_picks_the_matching_arguments() {
    let log: Log = Rc::default();
    let mut listener = EventListener::new(PoolHandle::default());
    let a = recording(&log, "A");
    listener.add_listener(EventKind::Click, &a, args![1]).expect("add A[1]");
    listener.add_listener(EventKind::Click, &a, args![2]).expect("add A[2]");

    assert!(listener.remove_listener(EventKind::Click, &a, true, &[ArgValue::Int(2)]).expect("remove"));
    click(&listener);
    assert_eq!(*log.borrow(), vec!["A[1]"]);
}

#[test]
fn unchecked_removal_takes_the_first_registration() {
    let log: Log = Rc::default();
    let mut listener = EventListener::new(PoolHandle::default());
    let a = recording(&log, "A");
    listener.add_listener(EventKind::Click, &a, args![1]).expect("add A[1]");
    listener.add_listener(EventKind::Click, &a, args![2]).expect("add A[2]");

    assert!(listener.remove_listener(EventKind::Click, &a, false, &[ArgValue::Int(2)]).expect("remove"));
    click(&listener);
    assert_eq!(*log.borrow(), vec!["A[2]"]);
}

#[test]
fn checked_removal_with_no_arguments_matches_on_callback_alone() {
    let log: Log = Rc::default();
    let mut listener = EventListener::new(PoolHandle::default());
    let a = recording(&log, "A");
    listener.add_listener(EventKind::Click, &a, args![7, "x"]).expect("add");
    assert!(listener.remove_listener(EventKind::Click, &a, true, &[]).expect("remove"));
    assert_eq!(listener.listener_count(EventKind::Click), 0);
}

#[test]
fn removal_of_unknown_callback_or_arguments_is_a_no_op() {
    let log: Log = Rc::default();
    let mut listener = EventListener::new(PoolHandle::default());
    let a = recording(&log, "A");
    let b = recording(&log, "B");
    listener.add_listener(EventKind::Click, &a, args![1]).expect("add");

    assert!(!listener.remove_listener(EventKind::Click, &b, false, &[]).expect("remove b"));
    assert!(!listener.remove_listener(EventKind::Click, &a, true, &[ArgValue::Int(3)]).expect("remove a[3]"));
    assert!(!listener.remove_listener(EventKind::ClickUp, &a, false, &[]).expect("remove other kind"));
    assert_eq!(click(&listener), 1);
}

#[test]
fn clones_of_a_callback_share_identity() {
    let log: Log = Rc::default();
    let mut listener = EventListener::new(PoolHandle::default());
    let a = recording(&log, "A");
    let same = a.clone();
    let lookalike = recording(&log, "A");
    listener.add_listener(EventKind::Click, &a, args![]).expect("add");

    assert!(a.same_as(&same));
    assert!(!a.same_as(&lookalike));
    assert!(!listener.remove_listener(EventKind::Click, &lookalike, false, &[]).expect("remove lookalike"));
    assert!(listener.remove_listener(EventKind::Click, &same, false, &[]).expect("remove clone"));
}

#[test]
fn kinds_never_leak_into_each_other() {
    let log: Log = Rc::default();
    let mut listener = EventListener::new(PoolHandle::default());
    let a = recording(&log, "A");
    listener.add_listener(EventKind::DragBegin, &a, args![]).expect("add");

    for kind in EventKind::ALL.into_iter().filter(|kind| kind.payload_kind() == PayloadKind::Pointer) {
        if kind != EventKind::DragBegin {
            assert_eq!(listener.trigger(kind, &PointerEventData::default()).expect("dispatch"), 0);
        }
    }
    assert!(log.borrow().is_empty());
    assert_eq!(listener.trigger(EventKind::DragBegin, &PointerEventData::default()).expect("dispatch"), 1);
}

#[test]
fn failing_callback_stops_the_dispatch() {
    let log: Log = Rc::default();
    let mut listener = EventListener::new(PoolHandle::default());
    let first = recording(&log, "first");
    let broken = Callback::new(|_: &PointerEventData, _: &[ArgValue]| anyhow::bail!("boom"));
    let last = recording(&log, "last");
    listener.add_listener(EventKind::Click, &first, args![]).expect("add first");
    listener.add_listener(EventKind::Click, &broken, args![]).expect("add broken");
    listener.add_listener(EventKind::Click, &last, args![]).expect("add last");

    let err = listener.trigger(EventKind::Click, &PointerEventData::default()).unwrap_err();
    match &err {
        ListenerError::Callback { kind, index, .. } => {
            assert_eq!(*kind, EventKind::Click);
            assert_eq!(*index, 1);
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(err.callback_error().map(ToString::to_string).as_deref(), Some("boom"));
    assert_eq!(*log.borrow(), vec!["first[]"]);
}

#[test]
fn remove_all_variants_report_counts() {
    let log: Log = Rc::default();
    let mut listener = EventListener::new(PoolHandle::default());
    let a = recording(&log, "A");
    let hit = Callback::new(|_: &Collider2D, _: &[ArgValue]| Ok(()));
    listener.add_listener(EventKind::Click, &a, args![]).expect("add");
    listener.add_listener(EventKind::Click, &a, args![1]).expect("add");
    listener.add_listener(EventKind::PointerEnter, &a, args![]).expect("add");
    listener.add_listener(EventKind::TriggerStay2D, &hit, args![]).expect("add");

    assert_eq!(listener.total_listeners(), 4);
    assert_eq!(listener.remove_all_in(EventMask::TRIGGER_2D), 1);
    assert_eq!(listener.remove_all_listeners_of(EventKind::Click), 2);
    assert_eq!(listener.remove_all_listeners_of(EventKind::Click), 0);
    assert_eq!(listener.remove_all_listeners(), 1);
    assert!(listener.is_empty());
    assert_eq!(click(&listener), 0);
}

#[test]
fn bound_args_are_reported_in_dispatch_order() {
    let log: Log = Rc::default();
    let mut listener = EventListener::new(PoolHandle::default());
    let a = recording(&log, "A");
    listener.add_listener(EventKind::Drag, &a, args!["x", 1.5]).expect("add");
    listener.add_listener(EventKind::Drag, &a, args![true]).expect("add");
    assert_eq!(
        listener.bound_args::<PointerEventData>(EventKind::Drag),
        vec![vec![ArgValue::from("x"), ArgValue::Float(1.5)], vec![ArgValue::Bool(true)]]
    );
    assert!(listener.bound_args::<Collider2D>(EventKind::Drag).is_empty());
}

#[test]
fn clearing_an_owner_recycles_storage_for_later_adds() {
    let log: Log = Rc::default();
    let pool = PoolHandle::default();
    let mut listener = EventListener::new(pool.clone());
    let a = recording(&log, "A");
    let hit = Callback::new(|_: &Collider, _: &[ArgValue]| Ok(()));
    listener.add_listener(EventKind::Click, &a, args![1]).expect("add click");
    listener.add_listener(EventKind::Drag, &a, args![]).expect("add drag");
    listener.add_listener(EventKind::TriggerEnter, &hit, args![]).expect("add trigger");

    let before = pool.stats();
    assert_eq!((before.records_created, before.collections_created), (3, 3));
    assert_eq!(listener.remove_all_listeners(), 3);

    listener.add_listener(EventKind::Click, &a, args![2]).expect("add click again");
    let after = pool.stats();
    assert_eq!(after.records_created, before.records_created, "no new record after clearing");
    assert_eq!(after.collections_created, before.collections_created, "no new collection after clearing");
    assert_eq!(after.records_reused, before.records_reused + 1);
    assert_eq!(after.collections_reused, before.collections_reused + 1);

    assert_eq!(listener.listener_count(EventKind::Click), 1);
    assert!(!listener.is_registered(EventKind::Drag));
    assert!(!listener.is_registered(EventKind::TriggerEnter));
    assert_eq!(listener.bound_args::<PointerEventData>(EventKind::Click), vec![vec![ArgValue::Int(2)]]);
    assert_eq!(click(&listener), 1);
    assert_eq!(*log.borrow(), vec!["A[2]"]);
}
