//! Deterministic fixture runner: replays listener registrations and host events
//! from JSON and records every callback invocation.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;
use std::rc::Rc;

use anyhow::{anyhow, bail, Context, Result};
use bevy_ecs::prelude::Entity;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::args::{ArgValue, BoundArgs};
use crate::config::ListenerConfig;
use crate::cursor::{CursorManager, CursorState};
use crate::event_kind::{EventKind, PayloadKind};
use crate::events::{EventBus, HostEvent};
use crate::host::ListenerHost;
use crate::listener::{Callback, EventPayload};
use crate::payload::{Collider, Collider2D, Collision, Collision2D, PointerEventData};
use crate::pool::{PoolHandle, PoolStats};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessFixture {
    pub owners: Vec<String>,
    pub steps: Vec<FixtureStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FixtureStep {
    Add(FixtureListener),
    Remove(FixtureRemoval),
    RemoveAll {
        owner: String,
        #[serde(default)]
        kind: Option<EventKind>,
    },
    Event(FixtureEvent),
    Despawn {
        owner: String,
    },
    Cursor {
        state: CursorState,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixtureListener {
    pub owner: String,
    pub kind: EventKind,
    pub listener: String,
    #[serde(default)]
    pub args: Vec<Value>,
    /// The callback returns an error every time it runs.
    #[serde(default)]
    pub fails: bool,
    /// After running, the callback queues removal of every listener of its kind on its owner.
    #[serde(default)]
    pub clear_after: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixtureRemoval {
    pub owner: String,
    pub kind: EventKind,
    pub listener: String,
    #[serde(default)]
    pub check_args: bool,
    #[serde(default)]
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixtureEvent {
    pub owner: String,
    pub kind: EventKind,
    /// The other party of a collision or trigger event.
    #[serde(default)]
    pub other: Option<String>,
    #[serde(default)]
    pub position: Option<[f32; 2]>,
    /// Deliver 2D collision/trigger events to both parties.
    #[serde(default)]
    pub both_sides: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessOutput {
    pub initial_cursor: String,
    pub steps: Vec<StepResult>,
    pub owners: BTreeMap<String, BTreeMap<String, usize>>,
    pub pool: PoolStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepResult {
    pub step: usize,
    pub action: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invocations: Vec<Invocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invocation {
    pub listener: String,
    pub owner: String,
    pub kind: EventKind,
    pub args: Vec<String>,
    pub detail: String,
}

pub fn load_fixture(path: impl AsRef<Path>) -> Result<HarnessFixture> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening fixture '{}'", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("parsing fixture '{}'", path.display()))
}

pub fn run_fixture(fixture: &HarnessFixture) -> Result<HarnessOutput> {
    run_fixture_with_config(fixture, &ListenerConfig::default())
}

pub fn run_fixture_with_config(fixture: &HarnessFixture, config: &ListenerConfig) -> Result<HarnessOutput> {
    let mut run = HarnessRun::new(fixture, config)?;
    let mut steps = Vec::with_capacity(fixture.steps.len());
    for (index, step) in fixture.steps.iter().enumerate() {
        let result = run.step(index + 1, step).with_context(|| format!("fixture step {}", index + 1))?;
        steps.push(result);
    }
    Ok(HarnessOutput {
        initial_cursor: run.initial_cursor.clone(),
        steps,
        owners: run.owner_summary(),
        pool: run.host.pool().stats(),
    })
}

type CallbackKey = (String, String, EventKind);

#[derive(Default)]
struct CallbackSet {
    pointer: HashMap<CallbackKey, Callback<PointerEventData>>,
    collision: HashMap<CallbackKey, Callback<Collision>>,
    collision_2d: HashMap<CallbackKey, Callback<Collision2D>>,
    collider: HashMap<CallbackKey, Callback<Collider>>,
    collider_2d: HashMap<CallbackKey, Callback<Collider2D>>,
}

trait HarnessPayload: EventPayload {
    fn callbacks(set: &mut CallbackSet) -> &mut HashMap<CallbackKey, Callback<Self>>;
    fn describe(&self, names: &[String]) -> String;
}

impl HarnessPayload for PointerEventData {
    fn callbacks(set: &mut CallbackSet) -> &mut HashMap<CallbackKey, Callback<Self>> {
        &mut set.pointer
    }

    fn describe(&self, _names: &[String]) -> String {
        format!("pos=({}, {})", self.position.x, self.position.y)
    }
}

impl HarnessPayload for Collision {
    fn callbacks(set: &mut CallbackSet) -> &mut HashMap<CallbackKey, Callback<Self>> {
        &mut set.collision
    }

    fn describe(&self, names: &[String]) -> String {
        format!("other={}", name_of(names, self.other))
    }
}

impl HarnessPayload for Collision2D {
    fn callbacks(set: &mut CallbackSet) -> &mut HashMap<CallbackKey, Callback<Self>> {
        &mut set.collision_2d
    }

    fn describe(&self, names: &[String]) -> String {
        format!("other={}", name_of(names, self.other))
    }
}

impl HarnessPayload for Collider {
    fn callbacks(set: &mut CallbackSet) -> &mut HashMap<CallbackKey, Callback<Self>> {
        &mut set.collider
    }

    fn describe(&self, names: &[String]) -> String {
        format!("other={}", name_of(names, self.entity))
    }
}

impl HarnessPayload for Collider2D {
    fn callbacks(set: &mut CallbackSet) -> &mut HashMap<CallbackKey, Callback<Self>> {
        &mut set.collider_2d
    }

    fn describe(&self, names: &[String]) -> String {
        format!("other={}", name_of(names, self.entity))
    }
}

fn name_of(names: &[String], entity: Entity) -> String {
    names.get(entity.index() as usize).cloned().unwrap_or_else(|| format!("#{}", entity.index()))
}

struct HarnessRun {
    host: ListenerHost<Entity>,
    bus: EventBus<Entity>,
    names: Rc<Vec<String>>,
    owners: HashMap<String, Entity>,
    callbacks: CallbackSet,
    behaviours: HashMap<CallbackKey, (bool, bool)>,
    log: Rc<RefCell<Vec<Invocation>>>,
    cursor: CursorManager<String>,
    initial_cursor: String,
}

impl HarnessRun {
    fn new(fixture: &HarnessFixture, config: &ListenerConfig) -> Result<Self> {
        let mut owners = HashMap::new();
        for (index, name) in fixture.owners.iter().enumerate() {
            if owners.insert(name.clone(), Entity::from_raw(index as u32)).is_some() {
                bail!("owner '{name}' is declared twice");
            }
        }
        let (cursor, initial_cursor) = CursorManager::from_config(&config.cursor)?;
        let pool = PoolHandle::from_config(&config.pool);
        Ok(Self {
            host: ListenerHost::with_config(pool, &config.dispatch),
            bus: EventBus::new(),
            names: Rc::new(fixture.owners.clone()),
            owners,
            callbacks: CallbackSet::default(),
            behaviours: HashMap::new(),
            log: Rc::new(RefCell::new(Vec::new())),
            cursor,
            initial_cursor,
        })
    }

    fn owner(&self, name: &str) -> Result<Entity> {
        self.owners.get(name).copied().ok_or_else(|| anyhow!("unknown owner '{name}'"))
    }

    fn step(&mut self, index: usize, step: &FixtureStep) -> Result<StepResult> {
        self.log.borrow_mut().clear();
        let mut result = StepResult {
            step: index,
            action: String::new(),
            invocations: Vec::new(),
            removed: None,
            cursor: None,
            error: None,
        };
        match step {
            FixtureStep::Add(entry) => {
                result.action = format!("add {} {} on {}", entry.listener, entry.kind, entry.owner);
                match entry.kind.payload_kind() {
                    PayloadKind::Pointer => self.add::<PointerEventData>(entry)?,
                    PayloadKind::Collision => self.add::<Collision>(entry)?,
                    PayloadKind::Collision2D => self.add::<Collision2D>(entry)?,
                    PayloadKind::Collider => self.add::<Collider>(entry)?,
                    PayloadKind::Collider2D => self.add::<Collider2D>(entry)?,
                }
            }
            FixtureStep::Remove(entry) => {
                result.action = format!("remove {} {} on {}", entry.listener, entry.kind, entry.owner);
                let removed = match entry.kind.payload_kind() {
                    PayloadKind::Pointer => self.remove::<PointerEventData>(entry)?,
                    PayloadKind::Collision => self.remove::<Collision>(entry)?,
                    PayloadKind::Collision2D => self.remove::<Collision2D>(entry)?,
                    PayloadKind::Collider => self.remove::<Collider>(entry)?,
                    PayloadKind::Collider2D => self.remove::<Collider2D>(entry)?,
                };
                result.removed = Some(usize::from(removed));
            }
            FixtureStep::RemoveAll { owner, kind } => {
                let entity = self.owner(owner)?;
                let removed = match kind {
                    Some(kind) => {
                        result.action = format!("remove all {kind} on {owner}");
                        self.host.remove_all_listeners_of(entity, *kind)
                    }
                    None => {
                        result.action = format!("remove all on {owner}");
                        self.host.remove_all_listeners(entity)
                    }
                };
                result.removed = Some(removed);
            }
            FixtureStep::Event(event) => {
                result.action = format!("event {} on {}", event.kind, event.owner);
                let events = self.build_events(event)?;
                self.bus.extend(events);
                if let Err(err) = self.host.pump(&mut self.bus) {
                    result.error = Some(err.to_string());
                    // undelivered events are not retried by the harness
                    self.bus.drain();
                }
            }
            FixtureStep::Despawn { owner } => {
                result.action = format!("despawn {owner}");
                let entity = self.owner(owner)?;
                result.removed = Some(self.host.despawn(entity));
            }
            FixtureStep::Cursor { state } => {
                result.action = format!("cursor {}", state.label());
                result.cursor = self.cursor.set_state(*state).cloned();
            }
        }
        result.invocations = self.log.borrow_mut().drain(..).collect();
        Ok(result)
    }

    fn add<P: HarnessPayload>(&mut self, entry: &FixtureListener) -> Result<()> {
        let owner = self.owner(&entry.owner)?;
        let args = self.bound_args(&entry.args)?;
        let callback = self.callback_for::<P>(entry, owner)?;
        self.host.add_listener(owner, entry.kind, &callback, args)?;
        Ok(())
    }

    fn remove<P: HarnessPayload>(&mut self, entry: &FixtureRemoval) -> Result<bool> {
        let owner = self.owner(&entry.owner)?;
        let args = self.bound_args(&entry.args)?;
        let key = (entry.listener.clone(), entry.owner.clone(), entry.kind);
        let Some(callback) = P::callbacks(&mut self.callbacks).get(&key).cloned() else {
            return Ok(false);
        };
        Ok(self.host.remove_listener(owner, entry.kind, &callback, entry.check_args, &args)?)
    }

    /// One callback per (listener, owner, kind); re-adding reuses it, so its flags must not change.
    fn callback_for<P: HarnessPayload>(&mut self, entry: &FixtureListener, owner: Entity) -> Result<Callback<P>> {
        let key = (entry.listener.clone(), entry.owner.clone(), entry.kind);
        if let Some(existing) = P::callbacks(&mut self.callbacks).get(&key) {
            let (fails, clear_after) = self.behaviours.get(&key).copied().unwrap_or_default();
            if (fails, clear_after) != (entry.fails, entry.clear_after) {
                bail!(
                    "listener '{}' for {} on '{}' was declared with fails={fails}, clear_after={clear_after}",
                    entry.listener,
                    entry.kind,
                    entry.owner
                );
            }
            return Ok(existing.clone());
        }
        let log = Rc::clone(&self.log);
        let names = Rc::clone(&self.names);
        let commands = self.host.commands();
        let listener = entry.listener.clone();
        let owner_name = entry.owner.clone();
        let kind = entry.kind;
        let fails = entry.fails;
        let clear_after = entry.clear_after;
        let callback = Callback::new(move |payload: &P, args: &[ArgValue]| {
            log.borrow_mut().push(Invocation {
                listener: listener.clone(),
                owner: owner_name.clone(),
                kind,
                args: args.iter().map(ToString::to_string).collect(),
                detail: payload.describe(&names),
            });
            if clear_after {
                commands.remove_all_listeners_of(owner, kind);
            }
            if fails {
                bail!("listener '{listener}' failed");
            }
            Ok(())
        });
        self.behaviours.insert(key.clone(), (entry.fails, entry.clear_after));
        P::callbacks(&mut self.callbacks).insert(key, callback.clone());
        Ok(callback)
    }

    fn bound_args(&self, values: &[Value]) -> Result<BoundArgs> {
        values.iter().map(|value| self.arg_value(value)).collect()
    }

    fn arg_value(&self, value: &Value) -> Result<ArgValue> {
        match value {
            Value::Bool(flag) => Ok(ArgValue::Bool(*flag)),
            Value::Number(number) => match number.as_i64() {
                Some(int) => Ok(ArgValue::Int(int)),
                None => number.as_f64().map(ArgValue::Float).ok_or_else(|| anyhow!("unsupported number {number}")),
            },
            Value::String(text) => Ok(ArgValue::Str(text.clone())),
            Value::Array(items) => {
                let components: Option<Vec<f32>> = items.iter().map(|v| v.as_f64().map(|f| f as f32)).collect();
                match components.as_deref() {
                    Some([x, y]) => Ok(ArgValue::Vec2(Vec2::new(*x, *y))),
                    Some([x, y, z]) => Ok(ArgValue::Vec3(Vec3::new(*x, *y, *z))),
                    _ => bail!("array arguments must hold 2 or 3 numbers, got {value}"),
                }
            }
            Value::Object(map) => match map.get("entity").and_then(Value::as_str) {
                Some(name) => Ok(ArgValue::Entity(self.owner(name)?)),
                None => bail!("object arguments must look like {{\"entity\": \"<owner>\"}}, got {value}"),
            },
            Value::Null => bail!("null is not a valid bound argument"),
        }
    }

    fn build_events(&self, event: &FixtureEvent) -> Result<Vec<HostEvent>> {
        let owner = self.owner(&event.owner)?;
        let other = event.other.as_deref().map(|name| self.owner(name)).transpose()?;
        let kind = event.kind;
        let require_other = || other.ok_or_else(|| anyhow!("{kind} events need an 'other' owner"));
        let events = match kind.payload_kind() {
            PayloadKind::Pointer => {
                let position = event.position.map(Vec2::from).unwrap_or(Vec2::ZERO);
                let mut data = PointerEventData::at(position);
                data.click_count = u32::from(matches!(kind, EventKind::Click | EventKind::ClickUp));
                data.dragging = matches!(kind, EventKind::Drag | EventKind::DragBegin);
                vec![HostEvent::Pointer { owner, kind, data }]
            }
            PayloadKind::Collision => {
                vec![HostEvent::Collision { owner, kind, data: Collision::new(require_other()?) }]
            }
            PayloadKind::Collision2D => {
                let other = require_other()?;
                let data = Collision2D::new(other);
                if event.both_sides {
                    Vec::from(HostEvent::collision_2d_pair(kind, owner, other, data))
                } else {
                    vec![HostEvent::Collision2D { owner, kind, data }]
                }
            }
            PayloadKind::Collider => {
                vec![HostEvent::Trigger { owner, kind, data: Collider::new(require_other()?) }]
            }
            PayloadKind::Collider2D => {
                let other = Collider2D::new(require_other()?);
                if event.both_sides {
                    Vec::from(HostEvent::trigger_2d_pair(kind, Collider2D::new(owner), other))
                } else {
                    vec![HostEvent::Trigger2D { owner, kind, data: other }]
                }
            }
        };
        Ok(events)
    }

    fn owner_summary(&self) -> BTreeMap<String, BTreeMap<String, usize>> {
        let mut summary = BTreeMap::new();
        for (name, entity) in &self.owners {
            let Some(listener) = self.host.listener(*entity) else {
                continue;
            };
            let kinds: BTreeMap<String, usize> = listener
                .registered_kinds()
                .into_iter()
                .map(|kind| (kind.label().to_string(), listener.listener_count(kind)))
                .collect();
            summary.insert(name.clone(), kinds);
        }
        summary
    }
}
