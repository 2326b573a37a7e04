use crate::event_kind::{EventKind, PayloadKind};
use crate::payload::{Collider, Collider2D, Collision, Collision2D, PointerEventData};
use bevy_ecs::prelude::{Entity, Resource};
use std::fmt;

/// A host-originated event waiting to be dispatched to one owner's listeners.
#[derive(Debug, Clone)]
pub enum HostEvent<O = Entity> {
    Pointer { owner: O, kind: EventKind, data: PointerEventData },
    Collision { owner: O, kind: EventKind, data: Collision },
    Collision2D { owner: O, kind: EventKind, data: Collision2D },
    Trigger { owner: O, kind: EventKind, data: Collider },
    Trigger2D { owner: O, kind: EventKind, data: Collider2D },
}

impl<O: Copy> HostEvent<O> {
    pub fn owner(&self) -> O {
        match self {
            HostEvent::Pointer { owner, .. }
            | HostEvent::Collision { owner, .. }
            | HostEvent::Collision2D { owner, .. }
            | HostEvent::Trigger { owner, .. }
            | HostEvent::Trigger2D { owner, .. } => *owner,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Pointer { kind, .. }
            | HostEvent::Collision { kind, .. }
            | HostEvent::Collision2D { kind, .. }
            | HostEvent::Trigger { kind, .. }
            | HostEvent::Trigger2D { kind, .. } => *kind,
        }
    }

    pub fn payload_kind(&self) -> PayloadKind {
        match self {
            HostEvent::Pointer { .. } => PayloadKind::Pointer,
            HostEvent::Collision { .. } => PayloadKind::Collision,
            HostEvent::Collision2D { .. } => PayloadKind::Collision2D,
            HostEvent::Trigger { .. } => PayloadKind::Collider,
            HostEvent::Trigger2D { .. } => PayloadKind::Collider2D,
        }
    }
}

impl HostEvent<Entity> {
    /// Splits one 2D contact into an event for each side. `data` is seen from `a`,
    /// so `data.other` should be `b`.
    pub fn collision_2d_pair(kind: EventKind, a: Entity, b: Entity, data: Collision2D) -> [Self; 2] {
        let mirrored = data.mirrored(a);
        [
            HostEvent::Collision2D { owner: a, kind, data },
            HostEvent::Collision2D { owner: b, kind, data: mirrored },
        ]
    }

    /// Splits one 2D trigger overlap into an event for each collider's entity.
    pub fn trigger_2d_pair(kind: EventKind, a: Collider2D, b: Collider2D) -> [Self; 2] {
        [
            HostEvent::Trigger2D { owner: a.entity, kind, data: b.clone() },
            HostEvent::Trigger2D { owner: b.entity, kind, data: a },
        ]
    }
}

impl<O: fmt::Debug> fmt::Display for HostEvent<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::Pointer { owner, kind, data } => {
                write!(f, "{kind} owner={owner:?} pos=({:.1}, {:.1})", data.position.x, data.position.y)
            }
            HostEvent::Collision { owner, kind, data } => {
                write!(f, "{kind} owner={owner:?} other={} contacts={}", data.other.index(), data.contacts.len())
            }
            HostEvent::Collision2D { owner, kind, data } => {
                write!(f, "{kind} owner={owner:?} other={} contacts={}", data.other.index(), data.contacts.len())
            }
            HostEvent::Trigger { owner, kind, data } => {
                write!(f, "{kind} owner={owner:?} other={}", data.entity.index())
            }
            HostEvent::Trigger2D { owner, kind, data } => {
                write!(f, "{kind} owner={owner:?} other={}", data.entity.index())
            }
        }
    }
}

/// Host events collected during a frame, delivered later by `ListenerHost::pump`.
#[derive(Resource)]
pub struct EventBus<O = Entity> {
    events: Vec<HostEvent<O>>,
}

impl<O> EventBus<O> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: HostEvent<O>) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = HostEvent<O>>) {
        self.events.extend(events);
    }

    pub fn drain(&mut self) -> Vec<HostEvent<O>> {
        self.events.drain(..).collect()
    }

    /// Puts undelivered events back ahead of anything queued since the drain.
    pub fn requeue_front(&mut self, mut events: Vec<HostEvent<O>>) {
        events.append(&mut self.events);
        self.events = events;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<O> Default for EventBus<O> {
    fn default() -> Self {
        Self::new()
    }
}
