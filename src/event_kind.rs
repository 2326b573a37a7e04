use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every host event a scene object can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PointerEnter,
    PointerExit,
    Click,
    ClickDown,
    ClickUp,
    Drag,
    DragBegin,
    DragEnd,
    CollisionEnter,
    CollisionStay,
    CollisionExit,
    #[serde(rename = "collision_enter_2d")]
    CollisionEnter2D,
    #[serde(rename = "collision_stay_2d")]
    CollisionStay2D,
    #[serde(rename = "collision_exit_2d")]
    CollisionExit2D,
    TriggerEnter,
    TriggerStay,
    TriggerExit,
    #[serde(rename = "trigger_enter_2d")]
    TriggerEnter2D,
    #[serde(rename = "trigger_stay_2d")]
    TriggerStay2D,
    #[serde(rename = "trigger_exit_2d")]
    TriggerExit2D,
}

impl EventKind {
    pub const ALL: [EventKind; 20] = [
        EventKind::PointerEnter,
        EventKind::PointerExit,
        EventKind::Click,
        EventKind::ClickDown,
        EventKind::ClickUp,
        EventKind::Drag,
        EventKind::DragBegin,
        EventKind::DragEnd,
        EventKind::CollisionEnter,
        EventKind::CollisionStay,
        EventKind::CollisionExit,
        EventKind::CollisionEnter2D,
        EventKind::CollisionStay2D,
        EventKind::CollisionExit2D,
        EventKind::TriggerEnter,
        EventKind::TriggerStay,
        EventKind::TriggerExit,
        EventKind::TriggerEnter2D,
        EventKind::TriggerStay2D,
        EventKind::TriggerExit2D,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EventKind::PointerEnter => "pointer_enter",
            EventKind::PointerExit => "pointer_exit",
            EventKind::Click => "click",
            EventKind::ClickDown => "click_down",
            EventKind::ClickUp => "click_up",
            EventKind::Drag => "drag",
            EventKind::DragBegin => "drag_begin",
            EventKind::DragEnd => "drag_end",
            EventKind::CollisionEnter => "collision_enter",
            EventKind::CollisionStay => "collision_stay",
            EventKind::CollisionExit => "collision_exit",
            EventKind::CollisionEnter2D => "collision_enter_2d",
            EventKind::CollisionStay2D => "collision_stay_2d",
            EventKind::CollisionExit2D => "collision_exit_2d",
            EventKind::TriggerEnter => "trigger_enter",
            EventKind::TriggerStay => "trigger_stay",
            EventKind::TriggerExit => "trigger_exit",
            EventKind::TriggerEnter2D => "trigger_enter_2d",
            EventKind::TriggerStay2D => "trigger_stay_2d",
            EventKind::TriggerExit2D => "trigger_exit_2d",
        }
    }

    pub fn category(self) -> EventCategory {
        use EventKind::*;
        match self {
            PointerEnter | PointerExit | Click | ClickDown | ClickUp | Drag | DragBegin | DragEnd => {
                EventCategory::Pointer
            }
            CollisionEnter | CollisionStay | CollisionExit => EventCategory::Collision,
            CollisionEnter2D | CollisionStay2D | CollisionExit2D => EventCategory::Collision2D,
            TriggerEnter | TriggerStay | TriggerExit => EventCategory::Trigger,
            TriggerEnter2D | TriggerStay2D | TriggerExit2D => EventCategory::Trigger2D,
        }
    }

    /// Payload shape the host hands over for this kind.
    pub fn payload_kind(self) -> PayloadKind {
        match self.category() {
            EventCategory::Pointer => PayloadKind::Pointer,
            EventCategory::Collision => PayloadKind::Collision,
            EventCategory::Collision2D => PayloadKind::Collision2D,
            EventCategory::Trigger => PayloadKind::Collider,
            EventCategory::Trigger2D => PayloadKind::Collider2D,
        }
    }

    pub fn mask(self) -> EventMask {
        self.category().mask()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event kind '{0}'")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.label() == normalized)
            .ok_or_else(|| UnknownEventKind(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Pointer,
    Collision,
    Collision2D,
    Trigger,
    Trigger2D,
}

impl EventCategory {
    pub fn mask(self) -> EventMask {
        match self {
            EventCategory::Pointer => EventMask::POINTER,
            EventCategory::Collision => EventMask::COLLISION,
            EventCategory::Collision2D => EventMask::COLLISION_2D,
            EventCategory::Trigger => EventMask::TRIGGER,
            EventCategory::Trigger2D => EventMask::TRIGGER_2D,
        }
    }
}

bitflags! {
    /// Set of event categories, used to query or clear groups of kinds at once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventMask: u8 {
        const POINTER = 1 << 0;
        const COLLISION = 1 << 1;
        const COLLISION_2D = 1 << 2;
        const TRIGGER = 1 << 3;
        const TRIGGER_2D = 1 << 4;
        const PHYSICS = Self::COLLISION.bits()
            | Self::COLLISION_2D.bits()
            | Self::TRIGGER.bits()
            | Self::TRIGGER_2D.bits();
    }
}

impl EventMask {
    pub fn contains_kind(self, kind: EventKind) -> bool {
        self.contains(kind.mask())
    }
}

/// The five payload shapes a listener collection can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Pointer,
    Collision,
    #[serde(rename = "collision_2d")]
    Collision2D,
    Collider,
    #[serde(rename = "collider_2d")]
    Collider2D,
}

impl PayloadKind {
    pub const ALL: [PayloadKind; 5] = [
        PayloadKind::Pointer,
        PayloadKind::Collision,
        PayloadKind::Collision2D,
        PayloadKind::Collider,
        PayloadKind::Collider2D,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PayloadKind::Pointer => "pointer",
            PayloadKind::Collision => "collision",
            PayloadKind::Collision2D => "collision_2d",
            PayloadKind::Collider => "collider",
            PayloadKind::Collider2D => "collider_2d",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
