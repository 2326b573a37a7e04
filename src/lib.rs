pub mod args;
pub mod commands;
pub mod config;
pub mod cursor;
pub mod error;
pub mod event_kind;
pub mod events;
pub mod harness;
pub mod host;
pub mod listener;
pub mod payload;
pub mod pool;
pub mod registry;

pub use args::{ArgValue, BoundArgs};
pub use commands::ListenerCommands;
pub use config::ListenerConfig;
pub use cursor::{CursorManager, CursorState};
pub use error::{CursorError, ListenerError};
pub use event_kind::{EventCategory, EventKind, EventMask, PayloadKind};
pub use events::{EventBus, HostEvent};
pub use host::{ListenerHost, ListenerOwner};
pub use listener::{Callback, EventPayload};
pub use payload::{Collider, Collider2D, Collision, Collision2D, PointerEventData};
pub use pool::{ListenerPool, PoolHandle, PoolStats};
pub use registry::EventListener;
