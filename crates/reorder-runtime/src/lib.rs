#![forbid(unsafe_code)]

//! Runtime for the reorder engine: the commit service seam, a background
//! commit worker, the session driver that performs controller effects,
//! configuration, an in-memory authority and a deterministic simulator.

pub mod authority;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod service;
pub mod session;
pub mod simulator;

pub use authority::MemoryAuthority;
pub use config::{ConfigError, ReorderConfig};
pub use dispatcher::{CommitCompletion, CommitDispatcher, DispatchError};
pub use error::{Result, RuntimeError};
pub use service::{
    NoticeSink, PositionCommitService, RecordingSink, ServiceError, TracingSink, decode_response,
};
pub use session::ReorderSession;
pub use simulator::SessionSimulator;
