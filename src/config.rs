use crate::cursor::CursorState;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoolConfig {
    /// Idle records created up front for each payload shape.
    #[serde(default)]
    pub prewarm_records: usize,
    /// Idle per-kind collections created up front for each payload shape.
    #[serde(default)]
    pub prewarm_collections: usize,
    #[serde(default = "PoolConfig::default_collection_capacity")]
    pub collection_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct DispatchConfig {
    /// Emit a debug line for every host dispatch, with owner, kind and listener count.
    #[serde(default)]
    pub log_dispatch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CursorConfig {
    /// One texture per cursor state, indexed by the state's ordinal.
    #[serde(default = "CursorConfig::default_textures")]
    pub textures: Vec<String>,
    #[serde(default)]
    pub initial: CursorState,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct ListenerConfig {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub cursor: CursorConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerConfigOverrides {
    pub prewarm_records: Option<usize>,
    pub prewarm_collections: Option<usize>,
    pub log_dispatch: Option<bool>,
}

impl PoolConfig {
    const fn default_collection_capacity() -> usize {
        4
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { prewarm_records: 0, prewarm_collections: 0, collection_capacity: Self::default_collection_capacity() }
    }
}

impl CursorConfig {
    fn default_textures() -> Vec<String> {
        vec!["cursor/normal.png".to_string(), "cursor/handle.png".to_string()]
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self { textures: Self::default_textures(), initial: CursorState::default() }
    }
}

impl ListenerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ListenerConfigOverrides) {
        if let Some(records) = overrides.prewarm_records {
            self.pool.prewarm_records = records;
        }
        if let Some(collections) = overrides.prewarm_collections {
            self.pool.prewarm_collections = collections;
        }
        if let Some(log_dispatch) = overrides.log_dispatch {
            self.dispatch.log_dispatch = log_dispatch;
        }
    }
}

impl ListenerConfigOverrides {
    /// Command-line flags accepted by [`ListenerConfigOverrides::apply_flag`].
    pub const FLAGS: [&'static str; 3] = ["--prewarm-records", "--prewarm-collections", "--log-dispatch"];

    /// Records one `--flag value` pair from the command line. Repeating a flag replaces the earlier value.
    pub fn apply_flag(&mut self, flag: &str, value: &str) -> Result<()> {
        match flag {
            "--prewarm-records" => self.prewarm_records = Some(parse_count(flag, value)?),
            "--prewarm-collections" => self.prewarm_collections = Some(parse_count(flag, value)?),
            "--log-dispatch" => self.log_dispatch = Some(parse_switch(flag, value)?),
            _ => bail!("'{flag}' is not a config override; expected one of {}", Self::FLAGS.join(", ")),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.prewarm_records.is_none() && self.prewarm_collections.is_none() && self.log_dispatch.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.prewarm_records.is_some() {
            fields.push("prewarm_records");
        }
        if self.prewarm_collections.is_some() {
            fields.push("prewarm_collections");
        }
        if self.log_dispatch.is_some() {
            fields.push("log_dispatch");
        }
        fields
    }
}

fn parse_count(flag: &str, value: &str) -> Result<usize> {
    value.trim().parse::<usize>().with_context(|| format!("{flag} expects a count, got '{value}'"))
}

fn parse_switch(flag: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => bail!("{flag} expects on or off, got '{value}'"),
    }
}
