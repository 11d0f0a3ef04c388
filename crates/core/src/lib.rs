// crates/core/src/lib.rs
//! loadburst core: the lifecycle machinery for a single synthetic
//! resource-consumption job.
//!
//! Provides:
//! - [`JobController`] — the start/stop/auto-expire state machine
//! - [`worker`] — cancellable CPU-burn threads
//! - [`memory::MemoryPool`] — the retained 1 MiB ballast blocks
//! - [`publisher::publish_status`] — per-subscriber status streaming
//!
//! The HTTP/WebSocket shell lives in `loadburst-server`; everything here is
//! transport-agnostic.

pub mod controller;
pub mod memory;
pub mod publisher;
pub mod types;
pub mod worker;

pub use controller::JobController;
pub use memory::{AllocError, MemoryPool, BLOCK_BYTES};
pub use publisher::{publish_status, PUBLISH_PERIOD};
pub use types::{StartOutcome, StatusView, WorkerId};
