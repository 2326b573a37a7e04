use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scene_listener::{ArgValue, BoundArgs, Callback, EventKind, EventListener, PointerEventData, PoolHandle};

const KINDS: [EventKind; 3] = [EventKind::Click, EventKind::Drag, EventKind::PointerExit];
const CALLBACKS: usize = 3;

/// Reference behaviour: one ordered list of (callback, args) per kind.
#[derive(Default)]
struct Model {
    kinds: HashMap<EventKind, Vec<(usize, Vec<ArgValue>)>>,
}

impl Model {
    fn add(&mut self, kind: EventKind, callback: usize, args: Vec<ArgValue>) {
        self.kinds.entry(kind).or_default().push((callback, args));
    }

    fn remove(&mut self, kind: EventKind, callback: usize, check_args: bool, args: &[ArgValue]) -> bool {
        let Some(records) = self.kinds.get_mut(&kind) else {
            return false;
        };
        let found = records
            .iter()
            .position(|(id, bound)| *id == callback && (!check_args || args.is_empty() || bound.as_slice() == args));
        match found {
            Some(index) => {
                records.remove(index);
                true
            }
            None => false,
        }
    }

    fn dispatch(&self, kind: EventKind) -> Vec<(usize, Vec<ArgValue>)> {
        self.kinds.get(&kind).cloned().unwrap_or_default()
    }

    fn total(&self) -> usize {
        self.kinds.values().map(Vec::len).sum()
    }
}

fn random_args(rng: &mut StdRng) -> Vec<ArgValue> {
    (0..rng.gen_range(0..3)).map(|_| ArgValue::Int(rng.gen_range(0..3))).collect()
}

#[test]
fn random_operations_match_the_reference_model() {
    for seed in 0..16u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let pool = PoolHandle::default();
        let mut listener = EventListener::new(pool.clone());
        let mut model = Model::default();
        let seen: Rc<RefCell<Vec<(usize, Vec<ArgValue>)>>> = Rc::default();
        let callbacks: Vec<Callback<PointerEventData>> = (0..CALLBACKS)
            .map(|id| {
                let seen = Rc::clone(&seen);
                Callback::new(move |_: &PointerEventData, args: &[ArgValue]| {
                    seen.borrow_mut().push((id, args.to_vec()));
                    Ok(())
                })
            })
            .collect();

        for step in 0..200 {
            let kind = KINDS[rng.gen_range(0..KINDS.len())];
            let id = rng.gen_range(0..CALLBACKS);
            match rng.gen_range(0..10) {
                0..=3 => {
                    let args = random_args(&mut rng);
                    let bound: BoundArgs = args.iter().cloned().collect();
                    listener.add_listener(kind, &callbacks[id], bound).expect("add");
                    model.add(kind, id, args);
                }
                4..=6 => {
                    let check_args = rng.gen_bool(0.5);
                    let args = random_args(&mut rng);
                    let removed = listener.remove_listener(kind, &callbacks[id], check_args, &args).expect("remove");
                    assert_eq!(removed, model.remove(kind, id, check_args, &args), "seed {seed} step {step}");
                }
                7 => {
                    listener.remove_all_listeners_of(kind);
                    model.kinds.remove(&kind);
                }
                _ => {
                    seen.borrow_mut().clear();
                    let invoked = listener.trigger(kind, &PointerEventData::default()).expect("trigger");
                    let expected = model.dispatch(kind);
                    assert_eq!(invoked, expected.len(), "seed {seed} step {step}");
                    assert_eq!(*seen.borrow(), expected, "seed {seed} step {step}");
                }
            }

            assert_eq!(listener.total_listeners(), model.total(), "seed {seed} step {step}");
            let stats = pool.stats();
            assert_eq!(
                stats.records_created as usize,
                stats.records_idle + listener.total_listeners(),
                "every record is either live or idle (seed {seed} step {step})"
            );
        }
    }
}
