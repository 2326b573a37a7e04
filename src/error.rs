use crate::cursor::CursorState;
use crate::event_kind::{EventKind, PayloadKind};

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("{kind} listeners take {expected} payloads, not {found}")]
    PayloadMismatch { kind: EventKind, expected: PayloadKind, found: PayloadKind },
    #[error("listener #{index} for {kind} failed: {error:#}")]
    Callback { kind: EventKind, index: usize, error: anyhow::Error },
}

impl ListenerError {
    pub fn kind(&self) -> EventKind {
        match self {
            ListenerError::PayloadMismatch { kind, .. } | ListenerError::Callback { kind, .. } => *kind,
        }
    }

    /// The error raised by the callback, if this is a callback failure.
    pub fn callback_error(&self) -> Option<&anyhow::Error> {
        match self {
            ListenerError::Callback { error, .. } => Some(error),
            ListenerError::PayloadMismatch { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    #[error("no cursor texture for state {state:?} ({available} texture(s) configured)")]
    MissingTexture { state: CursorState, available: usize },
}
