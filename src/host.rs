use crate::args::ArgValue;
use crate::commands::ListenerCommands;
use crate::config::DispatchConfig;
use crate::error::ListenerError;
use crate::event_kind::EventKind;
use crate::events::{EventBus, HostEvent};
use crate::listener::{Callback, EventPayload};
use crate::payload::{Collider, Collider2D, Collision, Collision2D, PointerEventData};
use crate::pool::PoolHandle;
use crate::registry::{check_payload, EventListener};
use bevy_ecs::prelude::Entity;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use tracing::debug;

/// Anything that can own a listener registry: entity handles, ids, names.
pub trait ListenerOwner: Copy + Eq + Hash + fmt::Debug + 'static {}

impl<T: Copy + Eq + Hash + fmt::Debug + 'static> ListenerOwner for T {}

/// Binds owners to lazily created registries and turns host callbacks into dispatches.
pub struct ListenerHost<O: ListenerOwner = Entity> {
    pool: PoolHandle,
    listeners: HashMap<O, EventListener>,
    commands: ListenerCommands<O>,
    log_dispatch: bool,
}

impl<O: ListenerOwner> ListenerHost<O> {
    pub fn new(pool: PoolHandle) -> Self {
        Self { pool, listeners: HashMap::new(), commands: ListenerCommands::new(), log_dispatch: false }
    }

    pub fn with_config(pool: PoolHandle, config: &DispatchConfig) -> Self {
        let mut host = Self::new(pool);
        host.log_dispatch = config.log_dispatch;
        host
    }

    pub fn pool(&self) -> &PoolHandle {
        &self.pool
    }

    /// A handle callbacks can capture to queue listener changes during dispatch.
    pub fn commands(&self) -> ListenerCommands<O> {
        self.commands.clone()
    }

    /// The owner's registry, created on first use.
    pub fn listener_mut(&mut self, owner: O) -> &mut EventListener {
        let pool = &self.pool;
        self.listeners.entry(owner).or_insert_with(|| {
            debug!(?owner, "created listener registry");
            EventListener::new(pool.clone())
        })
    }

    pub fn listener(&self, owner: O) -> Option<&EventListener> {
        self.listeners.get(&owner)
    }

    pub fn contains(&self, owner: O) -> bool {
        self.listeners.contains_key(&owner)
    }

    pub fn owners(&self) -> impl Iterator<Item = O> + '_ {
        self.listeners.keys().copied()
    }

    pub fn owner_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn listener_count(&self, owner: O, kind: EventKind) -> usize {
        self.listeners.get(&owner).map_or(0, |listener| listener.listener_count(kind))
    }

    /// Destroys the owner's registry, recycling all of its listeners. Returns how many there were.
    pub fn despawn(&mut self, owner: O) -> usize {
        match self.listeners.remove(&owner) {
            Some(mut listener) => {
                let removed = listener.remove_all_listeners();
                debug!(?owner, removed, "despawned listener registry");
                removed
            }
            None => 0,
        }
    }

    pub fn add_listener<P: EventPayload>(
        &mut self,
        owner: O,
        kind: EventKind,
        callback: &Callback<P>,
        args: impl IntoIterator<Item = ArgValue>,
    ) -> Result<(), ListenerError> {
        check_payload::<P>(kind)?;
        self.register(owner, kind, callback, args);
        Ok(())
    }

    pub fn remove_listener<P: EventPayload>(
        &mut self,
        owner: O,
        kind: EventKind,
        callback: &Callback<P>,
        check_args: bool,
        args: &[ArgValue],
    ) -> Result<bool, ListenerError> {
        check_payload::<P>(kind)?;
        Ok(self.unregister(owner, kind, callback, check_args, args))
    }

    pub fn remove_all_listeners_of(&mut self, owner: O, kind: EventKind) -> usize {
        let removed = self.listeners.get_mut(&owner).map_or(0, |listener| listener.remove_all_listeners_of(kind));
        debug!(?owner, %kind, removed, "removed all listeners of kind");
        removed
    }

    pub fn remove_all_listeners(&mut self, owner: O) -> usize {
        let removed = self.listeners.get_mut(&owner).map_or(0, EventListener::remove_all_listeners);
        debug!(?owner, removed, "removed all listeners");
        removed
    }

    /// Dispatches `payload` to the owner's `kind` listeners, then applies any
    /// commands the callbacks queued.
    ///
    /// Owners without a registry have nothing to invoke. A callback error is
    /// returned after the queued commands have been applied.
    pub fn trigger<P: EventPayload>(&mut self, owner: O, kind: EventKind, payload: &P) -> Result<usize, ListenerError> {
        let result = match self.listeners.get(&owner) {
            Some(listener) => listener.trigger(kind, payload),
            None => check_payload::<P>(kind).map(|_| 0),
        };
        if self.log_dispatch {
            match &result {
                Ok(invoked) => debug!(?owner, %kind, invoked, "dispatched"),
                Err(err) => debug!(?owner, %kind, %err, "dispatch failed"),
            }
        }
        let applied = self.apply_commands();
        let invoked = result?;
        applied?;
        Ok(invoked)
    }

    /// Applies queued commands in order. Every command runs; the first error is returned.
    pub fn apply_commands(&mut self) -> Result<usize, ListenerError> {
        let mut applied = 0;
        let mut first_error = None;
        while let Some(command) = self.commands.pop() {
            match command(self) {
                Ok(()) => applied += 1,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        if applied > 0 {
            debug!(applied, "applied queued listener commands");
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(applied),
        }
    }

    pub fn dispatch(&mut self, event: &HostEvent<O>) -> Result<usize, ListenerError> {
        match event {
            HostEvent::Pointer { owner, kind, data } => self.trigger(*owner, *kind, data),
            HostEvent::Collision { owner, kind, data } => self.trigger(*owner, *kind, data),
            HostEvent::Collision2D { owner, kind, data } => self.trigger(*owner, *kind, data),
            HostEvent::Trigger { owner, kind, data } => self.trigger(*owner, *kind, data),
            HostEvent::Trigger2D { owner, kind, data } => self.trigger(*owner, *kind, data),
        }
    }

    /// Delivers every queued event in order. On the first failure the undelivered
    /// events go back to the front of the bus and the error is returned.
    pub fn pump(&mut self, bus: &mut EventBus<O>) -> Result<usize, ListenerError> {
        let mut events = bus.drain().into_iter();
        let mut invoked = 0;
        while let Some(event) = events.next() {
            match self.dispatch(&event) {
                Ok(count) => invoked += count,
                Err(err) => {
                    bus.requeue_front(events.collect());
                    return Err(err);
                }
            }
        }
        Ok(invoked)
    }

    fn register<P: EventPayload>(
        &mut self,
        owner: O,
        kind: EventKind,
        callback: &Callback<P>,
        args: impl IntoIterator<Item = ArgValue>,
    ) {
        let listener = self.listener_mut(owner);
        listener.push_record(kind, callback, args);
        debug!(?owner, %kind, listeners = listener.listener_count(kind), "added listener");
    }

    fn unregister<P: EventPayload>(
        &mut self,
        owner: O,
        kind: EventKind,
        callback: &Callback<P>,
        check_args: bool,
        args: &[ArgValue],
    ) -> bool {
        let removed = match self.listeners.get_mut(&owner) {
            Some(listener) => listener.take_record(kind, callback, check_args, args),
            None => false,
        };
        if removed {
            debug!(?owner, %kind, "removed listener");
        }
        removed
    }
}

impl<O: ListenerOwner> fmt::Debug for ListenerHost<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHost")
            .field("owners", &self.listeners.len())
            .field("queued_commands", &self.commands.len())
            .finish()
    }
}

macro_rules! per_kind_facade {
    ($($kind:ident: $payload:ty => $on:ident, $remove:ident, $inbound:ident;)+) => {
        impl<O: ListenerOwner> ListenerHost<O> {
            $(
                #[doc = concat!("Registers `callback` for [`EventKind::", stringify!($kind), "`] on `owner`.")]
                pub fn $on(
                    &mut self,
                    owner: O,
                    callback: &Callback<$payload>,
                    args: impl IntoIterator<Item = ArgValue>,
                ) {
                    self.register(owner, EventKind::$kind, callback, args);
                }

                #[doc = concat!("Removes one [`EventKind::", stringify!($kind), "`] listener from `owner`.")]
                pub fn $remove(
                    &mut self,
                    owner: O,
                    callback: &Callback<$payload>,
                    check_args: bool,
                    args: &[ArgValue],
                ) -> bool {
                    self.unregister(owner, EventKind::$kind, callback, check_args, args)
                }

                #[doc = concat!("Host entry point for [`EventKind::", stringify!($kind), "`].")]
                pub fn $inbound(&mut self, owner: O, payload: &$payload) -> Result<usize, ListenerError> {
                    self.trigger(owner, EventKind::$kind, payload)
                }
            )+
        }
    };
}

per_kind_facade! {
    PointerEnter: PointerEventData => on_pointer_enter, remove_pointer_enter, pointer_enter;
    PointerExit: PointerEventData => on_pointer_exit, remove_pointer_exit, pointer_exit;
    Click: PointerEventData => on_click, remove_click, click;
    ClickDown: PointerEventData => on_click_down, remove_click_down, click_down;
    ClickUp: PointerEventData => on_click_up, remove_click_up, click_up;
    Drag: PointerEventData => on_drag, remove_drag, drag;
    DragBegin: PointerEventData => on_drag_begin, remove_drag_begin, drag_begin;
    DragEnd: PointerEventData => on_drag_end, remove_drag_end, drag_end;
    CollisionEnter: Collision => on_collision_enter, remove_collision_enter, collision_enter;
    CollisionStay: Collision => on_collision_stay, remove_collision_stay, collision_stay;
    CollisionExit: Collision => on_collision_exit, remove_collision_exit, collision_exit;
    CollisionEnter2D: Collision2D => on_collision_enter_2d, remove_collision_enter_2d, collision_enter_2d;
    CollisionStay2D: Collision2D => on_collision_stay_2d, remove_collision_stay_2d, collision_stay_2d;
    CollisionExit2D: Collision2D => on_collision_exit_2d, remove_collision_exit_2d, collision_exit_2d;
    TriggerEnter: Collider => on_trigger_enter, remove_trigger_enter, trigger_enter;
    TriggerStay: Collider => on_trigger_stay, remove_trigger_stay, trigger_stay;
    TriggerExit: Collider => on_trigger_exit, remove_trigger_exit, trigger_exit;
    TriggerEnter2D: Collider2D => on_trigger_enter_2d, remove_trigger_enter_2d, trigger_enter_2d;
    TriggerStay2D: Collider2D => on_trigger_stay_2d, remove_trigger_stay_2d, trigger_stay_2d;
    TriggerExit2D: Collider2D => on_trigger_exit_2d, remove_trigger_exit_2d, trigger_exit_2d;
}
