#![forbid(unsafe_code)]

use std::fmt;

use reorder_core::IdError;
use reorder_widgets::OrderError;

use crate::config::ConfigError;
use crate::dispatcher::DispatchError;

/// Errors surfaced by a [`crate::ReorderSession`].
#[derive(Debug)]
pub enum RuntimeError {
    /// The commit worker thread could not be spawned.
    Spawn(std::io::Error),
    /// The commit worker stopped before a commit could be sent.
    Dispatch(DispatchError),
    /// An authoritative order did not match the displayed rows.
    Order(OrderError),
    /// A handle element id could not be resolved.
    Id(IdError),
    Config(ConfigError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "failed to start commit worker: {e}"),
            Self::Dispatch(e) => write!(f, "{e}"),
            Self::Order(e) => write!(f, "order rejected: {e}"),
            Self::Id(e) => write!(f, "bad handle id: {e}"),
            Self::Config(e) => write!(f, "configuration error: {e}"),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(e) => Some(e),
            Self::Dispatch(e) => Some(e),
            Self::Order(e) => Some(e),
            Self::Id(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<DispatchError> for RuntimeError {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

impl From<OrderError> for RuntimeError {
    fn from(e: OrderError) -> Self {
        Self::Order(e)
    }
}

impl From<IdError> for RuntimeError {
    fn from(e: IdError) -> Self {
        Self::Id(e)
    }
}

impl From<ConfigError> for RuntimeError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
