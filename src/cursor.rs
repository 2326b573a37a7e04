use crate::config::CursorConfig;
use crate::error::CursorError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorState {
    #[default]
    Normal = 0,
    Handle = 1,
}

impl CursorState {
    pub const ALL: [CursorState; 2] = [CursorState::Normal, CursorState::Handle];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            CursorState::Normal => "normal",
            CursorState::Handle => "handle",
        }
    }
}

/// Tracks the active cursor and hands back the texture to apply when it changes.
///
/// The host owns the actual cursor; this only decides *when* to swap it.
#[derive(Debug, Clone)]
pub struct CursorManager<T> {
    textures: Vec<T>,
    current: CursorState,
    applied: bool,
}

impl<T> CursorManager<T> {
    /// `textures` is indexed by [`CursorState::index`] and must cover every state.
    pub fn new(textures: Vec<T>) -> Result<Self, CursorError> {
        if let Some(state) = CursorState::ALL.into_iter().find(|state| state.index() >= textures.len()) {
            return Err(CursorError::MissingTexture { state, available: textures.len() });
        }
        Ok(Self { textures, current: CursorState::default(), applied: false })
    }

    pub fn current(&self) -> CursorState {
        self.current
    }

    pub fn texture_for(&self, state: CursorState) -> &T {
        &self.textures[state.index()]
    }

    /// Returns the texture to apply, or `None` if `state` is already showing.
    pub fn set_state(&mut self, state: CursorState) -> Option<&T> {
        if self.applied && state == self.current {
            return None;
        }
        self.current = state;
        self.applied = true;
        tracing::debug!(state = state.label(), "cursor changed");
        Some(&self.textures[state.index()])
    }
}

impl CursorManager<String> {
    /// Builds the manager and applies the configured initial state.
    pub fn from_config(config: &CursorConfig) -> Result<(Self, String), CursorError> {
        let mut manager = Self::new(config.textures.clone())?;
        let initial = manager.set_state(config.initial).cloned().unwrap_or_default();
        Ok((manager, initial))
    }
}
