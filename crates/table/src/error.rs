use thiserror::Error;

use crate::table::EntityId;

/// Rejected stack mutation. Recoverable: retry after the next tick.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum StackError {
    #[error("stack is locked until update request #{generation} settles")]
    Locked { generation: u64 },
    #[error("stack is empty")]
    Empty,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("no entity {0:?} on the table")]
    UnknownEntity(EntityId),
    #[error("cannot move a card from {0:?} onto itself")]
    SameEntity(EntityId),
    #[error(transparent)]
    Stack(#[from] StackError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse table config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config field `{field}` has invalid value {value}")]
    Invalid { field: &'static str, value: f32 },
}
